use serde::Deserialize;
use stayhub_core::TransitionPolicy;
use std::env;
use std::net::{IpAddr, SocketAddr};

pub use config::ConfigError;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub image_host: ImageHostConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }
fn default_true() -> bool { true }

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Credentials for the Cloudinary-compatible image host.
#[derive(Debug, Deserialize, Clone)]
pub struct ImageHostConfig {
    #[serde(default = "default_image_host_url")]
    pub base_url: String,
    #[serde(default)]
    pub cloud_name: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    pub folder: Option<String>,
    #[serde(default = "default_image_host_timeout")]
    pub timeout_seconds: u64,
}

impl ImageHostConfig {
    pub fn has_credentials(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl Default for ImageHostConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_host_url(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: None,
            timeout_seconds: default_image_host_timeout(),
        }
    }
}

fn default_image_host_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_image_host_timeout() -> u64 { 30 }

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BusinessRules {
    #[serde(default)]
    pub transition_policy: TransitionPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "stayhub_api=debug,stayhub_core=info,stayhub_store=info,tower_http=info".to_string()
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        config::Config::builder()
            // Checked-in defaults
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `STAYHUB__SERVER__PORT=8080` sets `server.port`
            .add_source(
                config::Environment::with_prefix("STAYHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    const DEFAULTS: &str = include_str!("../../config/default.toml");

    fn from_toml(sources: &[&str]) -> Result<Config, config::ConfigError> {
        let mut builder = config::Config::builder();
        for source in sources {
            builder = builder.add_source(File::from_str(source, FileFormat::Toml));
        }
        builder.build()?.try_deserialize()
    }

    #[test]
    fn checked_in_defaults_deserialize() {
        let config = from_toml(&[DEFAULTS]).expect("default.toml is valid");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(
            config.business_rules.transition_policy,
            TransitionPolicy::Permissive
        );
        assert_eq!(config.database.max_connections, 5);
        assert!(config.database.run_migrations);
    }

    #[test]
    fn later_sources_override_earlier_ones() {
        let overrides = r#"
            [storage]
            backend = "memory"

            [business_rules]
            transition_policy = "strict"

            [image_host]
            cloud_name = "stayhub"
            api_key = "key"
            api_secret = "secret"
        "#;

        let config = from_toml(&[DEFAULTS, overrides]).expect("overrides apply");

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.business_rules.transition_policy, TransitionPolicy::Strict);
        assert!(config.image_host.has_credentials());
        assert_eq!(config.image_host.base_url, "https://api.cloudinary.com");
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let minimal = r#"
            [server]
            port = 8080

            [database]
            url = "postgres://localhost/stayhub"
        "#;

        let config = from_toml(&[minimal]).expect("minimal config loads");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upload.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.image_host.timeout_seconds, 30);
        assert!(!config.image_host.has_credentials());
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 4000,
        };
        assert_eq!(
            server.socket_addr().unwrap(),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 4000)
        );

        let bad = ServerConfig {
            host: "not an ip".to_string(),
            port: 4000,
        };
        assert!(bad.socket_addr().is_err());
    }
}
