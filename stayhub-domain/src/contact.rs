use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message left through the storefront contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw contact form payload. Every field is optional here so that missing
/// fields surface as a validation error instead of a deserialization one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Contact fields after validation, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub full_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub email: Option<String>,
    pub subject: Option<String>,
    pub is_read: Option<bool>,
}

impl ContactFilter {
    pub fn matches(&self, contact: &Contact) -> bool {
        self.email.as_ref().map_or(true, |email| &contact.email == email)
            && self
                .subject
                .as_ref()
                .map_or(true, |subject| &contact.subject == subject)
            && self.is_read.map_or(true, |is_read| contact.is_read == is_read)
    }
}
