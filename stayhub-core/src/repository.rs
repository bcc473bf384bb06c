use async_trait::async_trait;
use stayhub_domain::{
    Booking, BookingDetails, BookingFilter, BookingStatus, Contact, ContactFilter, NewContact,
};
use uuid::Uuid;

/// Storage for bookings and the balances of the users who made them.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Open a unit of work. Rows read through it stay locked until it is
    /// committed or dropped; dropping it discards every staged write.
    async fn begin(&self) -> Result<Box<dyn BookingUnitOfWork>, RepositoryError>;

    async fn find_booking_details(
        &self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError>;

    /// Newest bookings first.
    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingDetails>, RepositoryError>;
}

/// Transactional scope over the booking and user rows of one transition.
#[async_trait]
pub trait BookingUnitOfWork: Send {
    async fn booking_with_relations(
        &mut self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError>;

    /// Adds `delta` to the balance and returns the new balance.
    async fn update_user_balance(
        &mut self,
        user_id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError>;

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn insert(&self, contact: NewContact) -> Result<Contact, RepositoryError>;

    /// Newest contacts first.
    async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
