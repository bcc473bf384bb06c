pub mod bookings;
pub mod contacts;
pub mod repository;
pub mod transition;
pub mod upload;

pub use bookings::BookingService;
pub use contacts::ContactIntake;
pub use repository::{BookingStore, BookingUnitOfWork, ContactRepository, RepositoryError};
pub use transition::{plan_transition, BalanceEffect, TransitionPolicy};
pub use upload::{HostedImage, ImageHost, ImageHostError, ImageUpload, UploadRelay};

/// Failure taxonomy shared by every operation in the service.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("insufficient funds: balance {balance} is below {required}")]
    InsufficientFunds { balance: i64, required: i64 },
    #[error("upstream service failed: {0}")]
    Upstream(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for CoreError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => CoreError::NotFound(err.to_string()),
            RepositoryError::Unavailable(_) => CoreError::Internal(err.to_string()),
        }
    }
}

impl From<ImageHostError> for CoreError {
    fn from(err: ImageHostError) -> Self {
        CoreError::Upstream(err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
