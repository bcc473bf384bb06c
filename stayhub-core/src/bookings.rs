use std::sync::Arc;

use stayhub_domain::{Booking, BookingDetails, BookingFilter, BookingStatus};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::repository::BookingStore;
use crate::transition::{plan_transition, TransitionPolicy};
use crate::{CoreError, CoreResult};

/// Booking reads and the status workflow that keeps user balances in step
/// with confirmations and cancellations.
pub struct BookingService {
    store: Arc<dyn BookingStore>,
    policy: TransitionPolicy,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn get(&self, booking_id: Uuid) -> CoreResult<BookingDetails> {
        self.store
            .find_booking_details(booking_id)
            .await?
            .ok_or_else(booking_not_found)
    }

    pub async fn list(&self, filter: &BookingFilter) -> CoreResult<Vec<BookingDetails>> {
        Ok(self.store.list_bookings(filter).await?)
    }

    /// Apply a status given as its wire name (`"CONFIRMED"`).
    pub async fn transition(
        &self,
        booking_id: Uuid,
        requested: Option<&str>,
    ) -> CoreResult<Booking> {
        let requested = parse_requested_status(requested)?;
        self.transition_to(booking_id, requested).await
    }

    /// Move a booking to `requested`, debiting or crediting its user.
    ///
    /// The booking and user rows are read and written inside one unit of
    /// work, so the check runs against locked state and a failure leaves
    /// both untouched.
    pub async fn transition_to(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
    ) -> CoreResult<Booking> {
        let mut unit = self.store.begin().await?;

        let details = unit
            .booking_with_relations(booking_id)
            .await?
            .ok_or_else(booking_not_found)?;
        let current = details.booking.status;

        self.policy.check(current, requested).inspect_err(|err| {
            warn!(%booking_id, %current, %requested, "status change refused: {err}");
        })?;

        let effect = plan_transition(
            current,
            requested,
            details.user.balance,
            details.booking.total_price,
        )
        .inspect_err(|err| {
            warn!(%booking_id, %current, %requested, "status change refused: {err}");
        })?;

        if let Some(delta) = effect.delta() {
            let user_id = details.user.id;
            let expected = details.user.balance.checked_add(delta).ok_or_else(|| {
                CoreError::Internal(format!("balance overflow for user {user_id}"))
            })?;
            let balance = unit.update_user_balance(user_id, delta).await?;
            // The user row is locked, so anything else means the lock did not hold.
            if balance != expected {
                error!(%user_id, expected, balance, "balance changed under the transition lock");
                return Err(CoreError::Internal(format!(
                    "balance of user {user_id} is {balance}, expected {expected}"
                )));
            }
            info!(%user_id, delta, balance, "user balance adjusted");
        }

        let updated = unit.update_booking_status(booking_id, requested).await?;
        unit.commit().await?;

        info!(%booking_id, %current, %requested, ?effect, "booking status updated");
        Ok(updated)
    }
}

pub fn parse_requested_status(raw: Option<&str>) -> CoreResult<BookingStatus> {
    raw.and_then(|value| value.parse().ok())
        .ok_or_else(|| CoreError::InvalidArgument("Invalid status".to_string()))
}

fn booking_not_found() -> CoreError {
    CoreError::NotFound("Booking not found".to_string())
}
