use std::sync::Arc;

use stayhub_core::{BookingService, ContactIntake, UploadRelay};

#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
    pub contacts: Arc<ContactIntake>,
    pub uploads: Arc<UploadRelay>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        bookings: BookingService,
        contacts: ContactIntake,
        uploads: UploadRelay,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            bookings: Arc::new(bookings),
            contacts: Arc::new(contacts),
            uploads: Arc::new(uploads),
            max_upload_bytes,
        }
    }
}
