use std::sync::Arc;

use stayhub_domain::{Contact, ContactFilter, ContactSubmission, NewContact};
use tracing::info;

use crate::repository::ContactRepository;
use crate::{CoreError, CoreResult};

pub struct ContactIntake {
    repository: Arc<dyn ContactRepository>,
}

impl ContactIntake {
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// Store a contact form submission as an unread message.
    pub async fn create(&self, submission: ContactSubmission) -> CoreResult<Contact> {
        let contact = validate_submission(submission)?;
        let stored = self.repository.insert(contact).await?;
        info!(contact_id = %stored.id, "contact message received");
        Ok(stored)
    }

    pub async fn list(&self, filter: &ContactFilter) -> CoreResult<Vec<Contact>> {
        Ok(self.repository.list(filter).await?)
    }
}

/// All four fields must be present and non-blank.
pub fn validate_submission(submission: ContactSubmission) -> CoreResult<NewContact> {
    let ContactSubmission {
        full_name,
        email,
        subject,
        message,
    } = submission;

    match (
        required(full_name),
        required(email),
        required(subject),
        required(message),
    ) {
        (Some(full_name), Some(email), Some(subject), Some(message)) => Ok(NewContact {
            full_name,
            email,
            subject,
            message,
        }),
        _ => Err(CoreError::InvalidArgument(
            "All fields are required.".to_string(),
        )),
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
