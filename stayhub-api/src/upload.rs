use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use stayhub_core::upload::{HostedImage, ImageUpload};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<HostedImage>, AppError> {
    let upload = match multipart {
        Ok(multipart) => read_file_field(multipart).await?,
        Err(rejection) => {
            debug!("upload is not multipart: {rejection}");
            None
        }
    };

    let hosted = state
        .uploads
        .upload(upload)
        .await
        .map_err(|err| AppError::from(err).server_message("Upload failed"))?;

    Ok(Json(hosted))
}

/// The first `file` field, other fields are ignored.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<ImageUpload>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;

        return Ok(Some(ImageUpload {
            bytes: bytes.to_vec(),
            file_name,
            content_type,
        }));
    }

    Ok(None)
}
