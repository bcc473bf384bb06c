//! Reqwest-backed adapter for a Cloudinary-compatible image host.
//!
//! Uploads are signed with the account secret, so the secret never leaves the
//! server and clients only ever see the resulting public URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use stayhub_core::upload::{HostedImage, ImageHost, ImageHostError, ImageUpload};
use tracing::debug;

use crate::app_config::ImageHostConfig;

const DEFAULT_FILE_NAME: &str = "upload";

#[derive(Debug, thiserror::Error)]
pub enum ImageHostSetupError {
    #[error("invalid image host base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to build image host client: {0}")]
    Client(#[from] reqwest::Error),
}

pub struct CloudinaryClient {
    client: Client,
    upload_url: Url,
    api_key: String,
    api_secret: String,
    folder: Option<String>,
}

impl CloudinaryClient {
    pub fn new(config: &ImageHostConfig) -> Result<Self, ImageHostSetupError> {
        let raw = format!(
            "{}/v1_1/{}/image/upload",
            config.base_url.trim_end_matches('/'),
            config.cloud_name
        );
        let upload_url = Url::parse(&raw).map_err(|err| ImageHostSetupError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: err.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            upload_url,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone().filter(|folder| !folder.is_empty()),
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    fn signed_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![("timestamp", timestamp.to_string())];
        if let Some(folder) = &self.folder {
            params.push(("folder", folder.clone()));
        }
        params
    }
}

#[async_trait]
impl ImageHost for CloudinaryClient {
    async fn upload_image(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError> {
        let timestamp = chrono::Utc::now().timestamp();
        let params = self.signed_params(timestamp);
        let signature = sign(&params, &self.api_secret);

        let file_name = upload
            .file_name
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let mut file = Part::bytes(upload.bytes).file_name(file_name);
        if let Some(content_type) = upload.content_type.as_deref() {
            file = file.mime_str(content_type).map_err(|err| {
                ImageHostError::Transport(format!("cannot attach file: {err}"))
            })?;
        }

        let mut form = Form::new()
            .part("file", file)
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(%status, bytes = body.len(), "image host responded");
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_hosted_image(body.as_ref())
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Hex SHA-256 of the alphabetically sorted `key=value` pairs joined with
/// `&`, immediately followed by the secret.
fn sign(params: &[(&str, String)], secret: &str) -> String {
    let mut digest = Sha256::new();
    digest.update(signing_payload(params).as_bytes());
    digest.update(secret.as_bytes());
    hex::encode(digest.finalize())
}

fn signing_payload(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn parse_hosted_image(body: &[u8]) -> Result<HostedImage, ImageHostError> {
    let decoded: UploadResponse = serde_json::from_slice(body).map_err(|err| {
        ImageHostError::MalformedResponse(format!("invalid upload JSON payload: {err}"))
    })?;

    match decoded.secure_url {
        Some(url) if url.starts_with("https://") => Ok(HostedImage { url }),
        Some(url) => Err(ImageHostError::MalformedResponse(format!(
            "upload URL is not https: {url}"
        ))),
        None => Err(ImageHostError::MalformedResponse(
            "upload response has no secure_url".to_string(),
        )),
    }
}

fn map_transport_error(err: reqwest::Error) -> ImageHostError {
    if err.is_timeout() {
        ImageHostError::Transport(format!("request timed out: {err}"))
    } else {
        ImageHostError::Transport(err.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ImageHostError {
    let message = serde_json::from_slice::<ErrorResponse>(body)
        .map(|decoded| decoded.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).chars().take(200).collect());

    ImageHostError::Rejected {
        status: status.as_u16(),
        message,
    }
}
