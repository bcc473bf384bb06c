use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use crate::{CoreError, CoreResult};

/// Image bytes received from a client, plus whatever the client said about them.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostedImage {
    pub url: String,
}

/// External service that stores images and serves them from a public URL.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload_image(&self, upload: ImageUpload) -> Result<HostedImage, ImageHostError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ImageHostError {
    #[error("image host unreachable: {0}")]
    Transport(String),
    #[error("image host rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("image host returned an unexpected response: {0}")]
    MalformedResponse(String),
}

/// Passes uploaded files through to the configured [`ImageHost`].
pub struct UploadRelay {
    host: Arc<dyn ImageHost>,
}

impl UploadRelay {
    pub fn new(host: Arc<dyn ImageHost>) -> Self {
        Self { host }
    }

    pub async fn upload(&self, upload: Option<ImageUpload>) -> CoreResult<HostedImage> {
        let upload = upload
            .filter(|upload| !upload.bytes.is_empty())
            .ok_or_else(|| CoreError::InvalidArgument("No file provided".to_string()))?;

        let size = upload.bytes.len();
        let hosted = self.host.upload_image(upload).await.map_err(|err| {
            error!("image upload failed: {err}");
            CoreError::from(err)
        })?;

        info!(size, url = %hosted.url, "image uploaded");
        Ok(hosted)
    }
}
