use serde::Deserialize;
use stayhub_domain::BookingStatus;

use crate::{CoreError, CoreResult};

/// Balance adjustment implied by a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceEffect {
    None,
    Debit(i64),
    Credit(i64),
}

impl BalanceEffect {
    /// Signed amount to add to the user's balance, if any.
    pub fn delta(&self) -> Option<i64> {
        match *self {
            BalanceEffect::None => None,
            BalanceEffect::Debit(amount) => Some(-amount),
            BalanceEffect::Credit(amount) => Some(amount),
        }
    }
}

/// Which status changes are accepted at all.
///
/// `Permissive` overwrites the status for every pair outside the two
/// financial ones. `Strict` refuses the pairs that would resurrect or
/// rewind a booking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn check(&self, current: BookingStatus, requested: BookingStatus) -> CoreResult<()> {
        use BookingStatus::*;

        if *self == TransitionPolicy::Permissive || current == requested {
            return Ok(());
        }

        match (current, requested) {
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) => Ok(()),
            _ => Err(CoreError::InvalidArgument(format!(
                "Cannot change booking status from {current} to {requested}"
            ))),
        }
    }
}

/// Decide the balance effect of moving a booking from `current` to
/// `requested` for a user holding `balance`.
///
/// Only PENDING→CONFIRMED (debit) and CONFIRMED→CANCELLED (credit) touch the
/// balance. Every other pair is a plain overwrite.
pub fn plan_transition(
    current: BookingStatus,
    requested: BookingStatus,
    balance: i64,
    total_price: i64,
) -> CoreResult<BalanceEffect> {
    if total_price < 0 {
        return Err(CoreError::Internal(format!(
            "booking total price is negative: {total_price}"
        )));
    }

    match (current, requested) {
        (BookingStatus::Pending, BookingStatus::Confirmed) => {
            if balance < total_price {
                Err(CoreError::InsufficientFunds {
                    balance,
                    required: total_price,
                })
            } else {
                Ok(BalanceEffect::Debit(total_price))
            }
        }
        (BookingStatus::Confirmed, BookingStatus::Cancelled) => {
            Ok(BalanceEffect::Credit(total_price))
        }
        _ => Ok(BalanceEffect::None),
    }
}
