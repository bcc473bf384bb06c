use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use stayhub_core::CoreError;
use stayhub_store::app_config::ConfigError;
use stayhub_store::ImageHostSetupError;

const DEFAULT_SERVER_MESSAGE: &str = "Internal Server Error";

#[derive(Debug)]
pub enum AppError {
    /// A failed core operation. `server_message` replaces the detail of 5xx
    /// answers so internals never reach the client.
    Core {
        source: CoreError,
        server_message: &'static str,
    },
    Multipart(MultipartError),
}

impl AppError {
    /// Use a route-specific body for server-side failures.
    pub fn server_message(self, message: &'static str) -> Self {
        match self {
            AppError::Core { source, .. } => AppError::Core {
                source,
                server_message: message,
            },
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Core { source, .. } => match source {
                CoreError::InvalidArgument(_) | CoreError::InsufficientFunds { .. } => {
                    StatusCode::BAD_REQUEST
                }
                CoreError::NotFound(_) => StatusCode::NOT_FOUND,
                CoreError::Upstream(_) => StatusCode::BAD_GATEWAY,
                CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Multipart(err) => err.status(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::Core {
                source: CoreError::InsufficientFunds { .. },
                ..
            } => "User has insufficient balance".to_string(),
            AppError::Core {
                source,
                server_message,
            } => {
                if status.is_server_error() {
                    tracing::error!(%status, "request failed: {source}");
                    server_message.to_string()
                } else {
                    source.to_string()
                }
            }
            AppError::Multipart(err) => err.body_text(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(source: CoreError) -> Self {
        AppError::Core {
            source,
            server_message: DEFAULT_SERVER_MESSAGE,
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Multipart(err)
    }
}

/// Anything that stops the server before it starts accepting requests.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    ImageHost(#[from] ImageHostSetupError),
    #[error("server I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_http_statuses() {
        let cases = [
            (CoreError::InvalidArgument("Invalid status".into()), StatusCode::BAD_REQUEST),
            (
                CoreError::InsufficientFunds {
                    balance: 1,
                    required: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NotFound("Booking not found".into()), StatusCode::NOT_FOUND),
            (CoreError::Upstream("timeout".into()), StatusCode::BAD_GATEWAY),
            (CoreError::Internal("pool closed".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (source, expected) in cases {
            assert_eq!(AppError::from(source).status(), expected);
        }
    }

    #[test]
    fn server_message_only_applies_to_core_errors() {
        let err = AppError::from(CoreError::Internal("pool closed".into()))
            .server_message("Failed to update status");
        assert!(matches!(
            err,
            AppError::Core {
                server_message: "Failed to update status",
                ..
            }
        ));
    }
}
