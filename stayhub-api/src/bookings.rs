use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use stayhub_core::bookings::parse_requested_status;
use stayhub_core::CoreError;
use stayhub_domain::BookingFilter;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings))
        .route(
            "/bookings/{id}",
            get(get_booking).patch(update_booking_status),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

impl BookingListQuery {
    /// `ALL` and an empty value both mean "any status", as the admin page sends them.
    pub fn into_filter(self) -> Result<BookingFilter, CoreError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("ALL") => None,
            Some(raw) => Some(parse_requested_status(Some(raw))?),
        };
        let search = self.search.filter(|term| !term.trim().is_empty());

        Ok(BookingFilter { status, search })
    }
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: Option<String>,
}

fn parse_booking_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::from(CoreError::InvalidArgument("Invalid booking id".to_string())))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = query.into_filter()?;
    let bookings = state.bookings.list(&filter).await?;

    Ok(Json(json!({
        "message": "Bookings fetched successfully",
        "data": bookings,
    })))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking_id = parse_booking_id(&id)?;
    let booking = state.bookings.get(booking_id).await?;

    Ok(Json(json!({ "data": booking })))
}

async fn update_booking_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let requested = match body {
        Ok(Json(update)) => update.status,
        Err(rejection) => {
            debug!("unreadable status update body: {rejection}");
            None
        }
    };

    let booking_id = parse_booking_id(&id)?;

    let booking = state
        .bookings
        .transition(booking_id, requested.as_deref())
        .await
        .map_err(|err| AppError::from(err).server_message("Failed to update status"))?;

    Ok(Json(json!({
        "message": "Booking status updated",
        "data": booking,
    })))
}
