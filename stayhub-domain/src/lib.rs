pub mod apartment;
pub mod booking;
pub mod contact;
pub mod user;

pub use apartment::{Apartment, ApartmentSummary};
pub use booking::{Booking, BookingDetails, BookingFilter, BookingStatus, UnknownStatus};
pub use contact::{Contact, ContactFilter, ContactSubmission, NewContact};
pub use user::{User, UserSummary};
