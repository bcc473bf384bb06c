use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use stayhub_core::repository::{ContactRepository, RepositoryError};
use stayhub_domain::{Contact, ContactFilter, NewContact};
use uuid::Uuid;

use crate::booking_repo::unavailable;

pub struct PgContactRepository {
    pool: PgPool,
}

impl PgContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    full_name: String,
    email: String,
    subject: String,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Contact {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ContactRepository for PgContactRepository {
    async fn insert(&self, contact: NewContact) -> Result<Contact, RepositoryError> {
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            INSERT INTO contacts (id, full_name, email, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, full_name, email, subject, message, is_read, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(contact.full_name)
        .bind(contact.email)
        .bind(contact.subject)
        .bind(contact.message)
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(row.into())
    }

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, RepositoryError> {
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, full_name, email, subject, message, is_read, created_at
            FROM contacts
            WHERE ($1::text IS NULL OR email = $1)
              AND ($2::text IS NULL OR subject = $2)
              AND ($3::boolean IS NULL OR is_read = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.email.as_deref())
        .bind(filter.subject.as_deref())
        .bind(filter.is_read)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.into_iter().map(Contact::from).collect())
    }
}
