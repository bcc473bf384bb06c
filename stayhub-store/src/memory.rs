use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use stayhub_core::repository::{
    BookingStore, BookingUnitOfWork, ContactRepository, RepositoryError,
};
use stayhub_domain::{
    Apartment, Booking, BookingDetails, BookingFilter, BookingStatus, Contact, ContactFilter,
    NewContact, User,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    apartments: HashMap<Uuid, Apartment>,
    bookings: HashMap<Uuid, Booking>,
    contacts: Vec<Contact>,
}

impl MemoryState {
    fn details(&self, booking: &Booking) -> Result<BookingDetails, RepositoryError> {
        let user = self.users.get(&booking.user_id).ok_or_else(|| {
            RepositoryError::Unavailable(format!("booking {} has no user", booking.id))
        })?;
        let apartment = self.apartments.get(&booking.apartment_id).ok_or_else(|| {
            RepositoryError::Unavailable(format!("booking {} has no apartment", booking.id))
        })?;

        Ok(BookingDetails {
            booking: booking.clone(),
            user: user.summary(),
            apartment: apartment.summary(),
        })
    }
}

/// Process-local store used for development and tests.
///
/// A single async mutex guards all state. A unit of work keeps that mutex
/// for its whole lifetime, which serializes transitions the same way row
/// locks do in Postgres.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, username: &str, balance: i64) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            balance,
        };
        self.state.lock().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn insert_apartment(&self, title: &str, price_per_night: i64) -> Apartment {
        let apartment = Apartment {
            id: Uuid::new_v4(),
            title: title.to_string(),
            price_per_night,
        };
        self.state
            .lock()
            .await
            .apartments
            .insert(apartment.id, apartment.clone());
        apartment
    }

    /// Book `apartment` for `user` over `nights` nights starting at `start_date`.
    pub async fn insert_booking(
        &self,
        user: &User,
        apartment: &Apartment,
        start_date: DateTime<Utc>,
        nights: i64,
        status: BookingStatus,
    ) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: user.id,
            apartment_id: apartment.id,
            start_date,
            end_date: start_date + Duration::days(nights),
            status,
            total_price: apartment.price_per_night * nights,
            created_at: Utc::now(),
        };
        self.state
            .lock()
            .await
            .bookings
            .insert(booking.id, booking.clone());
        booking
    }

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.state.lock().await.users.get(&id).cloned()
    }

    pub async fn booking(&self, id: Uuid) -> Option<Booking> {
        self.state.lock().await.bookings.get(&id).cloned()
    }

    /// A small data set so a memory-backed server has something to show.
    pub async fn seed_demo(&self) {
        let start = Utc::now() + Duration::days(14);

        let mira = self.insert_user("mira", 1_500).await;
        let jonas = self.insert_user("jonas", 200).await;
        let loft = self.insert_apartment("Canal-side loft", 120).await;
        let cabin = self.insert_apartment("Pine cabin", 85).await;

        self.insert_booking(&mira, &loft, start, 3, BookingStatus::Pending)
            .await;
        self.insert_booking(&jonas, &cabin, start, 4, BookingStatus::Pending)
            .await;
        self.insert_booking(&mira, &cabin, start + Duration::days(30), 2, BookingStatus::Confirmed)
            .await;
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn BookingUnitOfWork>, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryUnit {
            state: guard,
            balances: HashMap::new(),
            statuses: HashMap::new(),
        }))
    }

    async fn find_booking_details(
        &self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError> {
        let state = self.state.lock().await;
        state
            .bookings
            .get(&id)
            .map(|booking| state.details(booking))
            .transpose()
    }

    async fn list_bookings(
        &self,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingDetails>, RepositoryError> {
        let state = self.state.lock().await;
        let mut found = Vec::new();
        for booking in state.bookings.values() {
            let details = state.details(booking)?;
            if filter.matches(&details) {
                found.push(details);
            }
        }
        found.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(found)
    }
}

/// Holds the store lock and keeps writes aside until commit.
pub struct MemoryUnit {
    state: OwnedMutexGuard<MemoryState>,
    balances: HashMap<Uuid, i64>,
    statuses: HashMap<Uuid, BookingStatus>,
}

impl MemoryUnit {
    fn balance_of(&self, user_id: Uuid) -> Option<i64> {
        self.balances
            .get(&user_id)
            .copied()
            .or_else(|| self.state.users.get(&user_id).map(|user| user.balance))
    }
}

#[async_trait]
impl BookingUnitOfWork for MemoryUnit {
    async fn booking_with_relations(
        &mut self,
        id: Uuid,
    ) -> Result<Option<BookingDetails>, RepositoryError> {
        let Some(booking) = self.state.bookings.get(&id) else {
            return Ok(None);
        };

        let mut details = self.state.details(booking)?;
        if let Some(status) = self.statuses.get(&id) {
            details.booking.status = *status;
        }
        if let Some(balance) = self.balances.get(&details.user.id) {
            details.user.balance = *balance;
        }
        Ok(Some(details))
    }

    async fn update_user_balance(
        &mut self,
        user_id: Uuid,
        delta: i64,
    ) -> Result<i64, RepositoryError> {
        let current = self.balance_of(user_id).ok_or(RepositoryError::NotFound)?;
        let balance = current
            .checked_add(delta)
            .filter(|balance| *balance >= 0)
            .ok_or_else(|| {
                RepositoryError::Unavailable(format!(
                    "balance of user {user_id} would become invalid"
                ))
            })?;

        self.balances.insert(user_id, balance);
        Ok(balance)
    }

    async fn update_booking_status(
        &mut self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, RepositoryError> {
        let mut booking = self
            .state
            .bookings
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        self.statuses.insert(id, status);
        booking.status = status;
        Ok(booking)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let MemoryUnit {
            mut state,
            balances,
            statuses,
        } = *self;

        for (user_id, balance) in balances {
            if let Some(user) = state.users.get_mut(&user_id) {
                user.balance = balance;
            }
        }
        for (booking_id, status) in statuses {
            if let Some(booking) = state.bookings.get_mut(&booking_id) {
                booking.status = status;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ContactRepository for MemoryStore {
    async fn insert(&self, contact: NewContact) -> Result<Contact, RepositoryError> {
        let stored = Contact {
            id: Uuid::new_v4(),
            full_name: contact.full_name,
            email: contact.email,
            subject: contact.subject,
            message: contact.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.state.lock().await.contacts.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<Contact>, RepositoryError> {
        let state = self.state.lock().await;
        let mut found: Vec<Contact> = state
            .contacts
            .iter()
            .rev()
            .filter(|contact| filter.matches(contact))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }
}
