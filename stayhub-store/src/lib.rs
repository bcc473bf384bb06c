pub mod app_config;
pub mod booking_repo;
pub mod contact_repo;
pub mod database;
pub mod image_host;
pub mod memory;

pub use booking_repo::PgBookingStore;
pub use contact_repo::PgContactRepository;
pub use database::DbClient;
pub use image_host::{CloudinaryClient, ImageHostSetupError};
pub use memory::MemoryStore;
