use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use stayhub_core::repository::{BookingStore, BookingUnitOfWork, RepositoryError};
use stayhub_domain::{
    ApartmentSummary, Booking, BookingDetails, BookingFilter, BookingStatus, UserSummary,
};
use uuid::Uuid;

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const DETAILS_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.apartment_id, b.start_date, b.end_date, b.status,
           b.total_price, b.created_at,
           u.username, u.balance,
           a.title, a.price_per_night
    FROM bookings b
    JOIN users u ON u.id = b.user_id
    JOIN apartments a ON a.id = b.apartment_id
"#;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    apartment_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    total_price: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = RepositoryError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            apartment_id: row.apartment_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: parse_status(&row.status)?,
            total_price: row.total_price,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BookingDetailsRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    username: String,
    balance: i64,
    title: String,
    price_per_night: i64,
}

impl TryFrom<BookingDetailsRow> for BookingDetails {
    type Error = RepositoryError;

    fn try_from(row: BookingDetailsRow) -> Result<Self, Self::Error> {
        let booking = Booking::try_from(row.booking)?;
        Ok(BookingDetails {
            user: UserSummary {
                id: booking.user_id,
                username: row.username,
                balance: row.balance,
            },
            apartment: ApartmentSummary {
                id: booking.apartment_id,
                title: row.title,
                price_per_night: row.price_per_night,
            },
            booking,
        })
    }
}

fn parse_status(raw: &str) -> Result<BookingStatus, RepositoryError> {
    raw.parse()
        .map_err(|err| RepositoryError::Unavailable(format!("corrupt booking row: {err}")))
}

pub(crate) fn unavailable(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

/// Escape LIKE wildcards so user input only ever matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingUnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await.map_err(unavailable)?;
        Ok(Box::new(PgBookingUnit { tx }))
    }

    async fn find_booking_details(
        &self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError> {
        let query = format!("{DETAILS_SELECT} WHERE b.id = $1");
        let row = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.map(BookingDetails::try_from).transpose()
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingDetails>, RepositoryError> {
        let query = format!(
            r#"{DETAILS_SELECT}
            WHERE ($1::text IS NULL OR b.status = $1)
              AND ($2::text IS NULL OR u.username ILIKE $2 OR a.title ILIKE $2)
            ORDER BY b.created_at DESC"#
        );
        let status = filter.status.map(|status| status.as_str());
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(like_pattern);

        let rows = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(status)
            .bind(search)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.into_iter().map(BookingDetails::try_from).collect()
    }
}

/// One Postgres transaction. Rows read through it are held with
/// `FOR UPDATE` until commit or rollback.
pub struct PgBookingUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnitOfWork for PgBookingUnit {
    async fn booking_with_relations(
        &mut self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError> {
        let query = format!("{DETAILS_SELECT} WHERE b.id = $1 FOR UPDATE OF b, u");
        let row = sqlx::query_as::<_, BookingDetailsRow>(&query)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(unavailable)?;

        row.map(BookingDetails::try_from).transpose()
    }

    async fn update_user_balance(
        &mut self,
        user_id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        let balance: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = balance + $1 WHERE id = $2 RETURNING balance",
        )
        .bind(delta)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(unavailable)?;

        balance.ok_or(RepositoryError::NotFound)
    }

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            UPDATE bookings SET status = $1
            WHERE id = $2
            RETURNING id, user_id, apartment_id, start_date, end_date, status, total_price, created_at
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(unavailable)?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("loft"), "%loft%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn unknown_status_in_row_is_reported() {
        assert!(parse_status("CONFIRMED").is_ok());
        assert!(matches!(
            parse_status("ARCHIVED"),
            Err(RepositoryError::Unavailable(message)) if message.contains("ARCHIVED")
        ));
    }
}
