use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use stayhub_domain::{Contact, ContactFilter, ContactSubmission};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/contacts", get(list_contacts).post(create_contact))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    pub email: Option<String>,
    pub subject: Option<String>,
    #[serde(rename = "isRead")]
    pub is_read: Option<String>,
}

impl From<ContactListQuery> for ContactFilter {
    /// `isRead` only filters when it is exactly `true` or `false`.
    fn from(query: ContactListQuery) -> Self {
        let is_read = match query.is_read.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        };

        ContactFilter {
            email: query.email,
            subject: query.subject,
            is_read,
        }
    }
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ContactListQuery>,
) -> Result<Json<Value>, AppError> {
    let contacts = state.contacts.list(&query.into()).await?;

    Ok(Json(json!({
        "message": "Contacts fetched successfully",
        "data": contacts,
    })))
}

async fn create_contact(
    State(state): State<AppState>,
    body: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    // An unreadable body is reported the same way as an empty form.
    let submission = match body {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            debug!("unreadable contact body: {rejection}");
            ContactSubmission::default()
        }
    };

    let contact = state
        .contacts
        .create(submission)
        .await
        .map_err(|err| AppError::from(err).server_message("Failed to create contact."))?;

    Ok((StatusCode::CREATED, Json(contact)))
}
