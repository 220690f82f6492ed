// libs/booking-cell/src/store/mod.rs
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::{AppConfig, BackendKind};

use crate::models::{
    Booking, BookingError, BookingFilter, BookingStatus, Review, ReviewError, Service, Specialist,
};

pub mod catalog;
pub mod local;
pub mod supabase;

pub use local::LocalBookingStore;
pub use supabase::SupabaseBookingStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking not found")]
    NotFound,

    #[error("booking is no longer pending (currently {0})")]
    NotPending(BookingStatus),

    #[error("slot is already taken")]
    SlotTaken,

    #[error("record is still referenced by bookings")]
    InUse,

    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Persistence(format!("record decode failed: {}", err))
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => BookingError::NotFound,
            StoreError::NotPending(status) => BookingError::AlreadyDecided(status),
            StoreError::SlotTaken => BookingError::SlotConflict,
            StoreError::InUse => BookingError::SpecialistInUse,
            StoreError::Persistence(detail) => BookingError::Persistence(detail),
        }
    }
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        ReviewError::Persistence(err.to_string())
    }
}

/// Storage for the catalog and bookings.
///
/// Implementations must behave identically for the same sequence of calls;
/// callers never know which backend they talk to.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError>;

    async fn list_specialists(&self) -> Result<Vec<Specialist>, StoreError>;

    async fn save_specialist(&self, specialist: Specialist) -> Result<Specialist, StoreError>;

    /// Fails with `InUse` while any booking, whatever its status, still
    /// references the specialist.
    async fn remove_specialist(&self, id: &str) -> Result<(), StoreError>;

    /// Plain insert, no slot check.
    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError>;

    /// Newest first.
    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;

    async fn get_booking(&self, id: Uuid) -> Result<Booking, StoreError>;

    async fn find_booking_by_token(&self, token: &str) -> Result<Booking, StoreError>;

    /// Moves a pending booking to `status`. Fails with `NotPending` when the
    /// booking was already decided, leaving it untouched.
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, StoreError>;

    /// Newest first.
    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError>;

    async fn create_review(&self, review: Review) -> Result<Review, StoreError>;

    /// Inserts `booking` only if its slot is still free.
    ///
    /// The default is a list-then-insert and leaves a window between the two
    /// calls; backends override it with whatever atomicity they have.
    async fn reserve_slot(&self, booking: Booking) -> Result<Booking, StoreError> {
        let filter = BookingFilter::occupying(booking.date, booking.specialist_id.as_deref());
        let taken = self
            .list_bookings(&filter)
            .await?
            .iter()
            .any(|existing| existing.blocks(booking.date, booking.time, booking.specialist_id.as_deref()));

        if taken {
            return Err(StoreError::SlotTaken);
        }

        self.create_booking(booking).await
    }
}

/// Picks the backend named by the configuration.
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn BookingStore>, StoreError> {
    match config.resolved_backend() {
        BackendKind::Supabase => {
            if !config.is_configured() {
                warn!("Supabase backend requested without SUPABASE_URL/SUPABASE_ANON_PUBLIC_KEY");
            }
            info!("Using Supabase booking backend at {}", config.supabase_url);
            Ok(Arc::new(SupabaseBookingStore::new(config)))
        }
        BackendKind::Local | BackendKind::Auto => {
            info!("Using local record booking backend in {}", config.local_data_dir.display());
            let store = LocalBookingStore::open(&config.local_data_dir).await?;
            Ok(Arc::new(store))
        }
    }
}
