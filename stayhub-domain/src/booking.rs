use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::apartment::ApartmentSummary;
use crate::user::UserSummary;

/// A reservation of an apartment by a user for a date range.
///
/// `total_price` is fixed when the reservation flow creates the booking;
/// only `status` changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub apartment_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0:?}")]
pub struct UnknownStatus(pub String);

/// Parsing is exact: `"confirmed"` is not a status.
impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Booking joined with the summaries the dashboards render next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub user: UserSummary,
    pub apartment: ApartmentSummary,
}

/// Filter for the admin bookings listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    /// Case-insensitive substring of the username or the apartment title.
    pub search: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, details: &BookingDetails) -> bool {
        if let Some(status) = self.status {
            if details.booking.status != status {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                details.user.username.to_lowercase().contains(&term)
                    || details.apartment.title.to_lowercase().contains(&term)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn details(username: &str, title: &str, status: BookingStatus) -> BookingDetails {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let user_id = Uuid::new_v4();
        let apartment_id = Uuid::new_v4();
        BookingDetails {
            booking: Booking {
                id: Uuid::new_v4(),
                user_id,
                apartment_id,
                start_date: at,
                end_date: at + chrono::Duration::days(3),
                status,
                total_price: 300,
                created_at: at,
            },
            user: UserSummary {
                id: user_id,
                username: username.to_string(),
                balance: 500,
            },
            apartment: ApartmentSummary {
                id: apartment_id,
                title: title.to_string(),
                price_per_night: 100,
            },
        }
    }

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!("PENDING".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert_eq!("CONFIRMED".parse::<BookingStatus>(), Ok(BookingStatus::Confirmed));
        assert_eq!("CANCELLED".parse::<BookingStatus>(), Ok(BookingStatus::Cancelled));
        assert!("FOO".parse::<BookingStatus>().is_err());
        assert!("confirmed".parse::<BookingStatus>().is_err());
        assert!("".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_screaming_case() {
        let json = serde_json::to_string(&BookingStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn details_flatten_booking_fields() {
        let value = serde_json::to_value(details("ana", "Loft", BookingStatus::Pending)).unwrap();
        assert_eq!(value["status"], "PENDING");
        assert_eq!(value["totalPrice"], 300);
        assert_eq!(value["user"]["username"], "ana");
        assert_eq!(value["apartment"]["pricePerNight"], 100);
        assert!(value.get("booking").is_none());
    }

    #[test]
    fn filter_matches_status_and_search() {
        let booking = details("Marta", "Sea View Loft", BookingStatus::Confirmed);

        assert!(BookingFilter::default().matches(&booking));
        assert!(BookingFilter {
            status: Some(BookingStatus::Confirmed),
            search: Some("sea view".to_string()),
        }
        .matches(&booking));
        assert!(BookingFilter {
            status: None,
            search: Some("MAR".to_string()),
        }
        .matches(&booking));
        assert!(!BookingFilter {
            status: Some(BookingStatus::Pending),
            search: None,
        }
        .matches(&booking));
        assert!(!BookingFilter {
            status: None,
            search: Some("cabin".to_string()),
        }
        .matches(&booking));
    }
}
