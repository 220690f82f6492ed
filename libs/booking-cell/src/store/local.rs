// libs/booking-cell/src/store/local.rs
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Booking, BookingFilter, BookingStatus, Review, Service, Specialist};
use crate::store::catalog::{default_reviews, default_services, default_specialists};
use crate::store::{BookingStore, StoreError};

const SPECIALISTS_FILE: &str = "specialists.json";
const BOOKINGS_FILE: &str = "bookings.json";
const REVIEWS_FILE: &str = "reviews.json";

/// Flat-record backend: one JSON array per collection, rewritten whole on
/// every mutation.
///
/// The mutex only serializes writers inside this process. Two processes
/// sharing a data directory can still lose updates.
pub struct LocalBookingStore {
    specialists_path: PathBuf,
    bookings_path: PathBuf,
    reviews_path: PathBuf,
    services: Vec<Service>,
    write_lock: Mutex<()>,
}

impl LocalBookingStore {
    /// Opens `dir`, creating it and seeding missing collections.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await?;

        let store = Self {
            specialists_path: dir.join(SPECIALISTS_FILE),
            bookings_path: dir.join(BOOKINGS_FILE),
            reviews_path: dir.join(REVIEWS_FILE),
            services: default_services(),
            write_lock: Mutex::new(()),
        };

        if !fs::try_exists(&store.specialists_path).await? {
            info!("Seeding {} with default specialists", store.specialists_path.display());
            write_records(&store.specialists_path, &default_specialists()).await?;
        }
        if !fs::try_exists(&store.bookings_path).await? {
            write_records::<Booking>(&store.bookings_path, &[]).await?;
        }
        if !fs::try_exists(&store.reviews_path).await? {
            info!("Seeding {} with sample reviews", store.reviews_path.display());
            write_records(&store.reviews_path, &default_reviews()).await?;
        }

        Ok(store)
    }

    async fn load_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        read_records(&self.bookings_path).await
    }

    async fn load_specialists(&self) -> Result<Vec<Specialist>, StoreError> {
        read_records(&self.specialists_path).await
    }

    async fn load_reviews(&self) -> Result<Vec<Review>, StoreError> {
        read_records(&self.reviews_path).await
    }
}

async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    match fs::read_to_string(path).await {
        Ok(raw) if raw.trim().is_empty() => Ok(Vec::new()),
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("{} disappeared, treating as empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

// Write-then-rename so a crash mid-write never leaves a truncated collection.
async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let payload = serde_json::to_string_pretty(records)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, payload).await?;
    fs::rename(&tmp_path, path).await?;

    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[async_trait]
impl BookingStore for LocalBookingStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        Ok(self.services.clone())
    }

    async fn list_specialists(&self) -> Result<Vec<Specialist>, StoreError> {
        self.load_specialists().await
    }

    async fn save_specialist(&self, specialist: Specialist) -> Result<Specialist, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut specialists = self.load_specialists().await?;

        match specialists.iter_mut().find(|existing| existing.id == specialist.id) {
            Some(existing) => *existing = specialist.clone(),
            None => specialists.push(specialist.clone()),
        }

        write_records(&self.specialists_path, &specialists).await?;
        Ok(specialist)
    }

    async fn remove_specialist(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut specialists = self.load_specialists().await?;

        if !specialists.iter().any(|specialist| specialist.id == id) {
            return Err(StoreError::NotFound);
        }
        if self
            .load_bookings()
            .await?
            .iter()
            .any(|booking| booking.specialist_id.as_deref() == Some(id))
        {
            return Err(StoreError::InUse);
        }

        specialists.retain(|specialist| specialist.id != id);
        write_records(&self.specialists_path, &specialists).await
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bookings = self.load_bookings().await?;

        if bookings.iter().any(|existing| existing.id == booking.id) {
            return Err(StoreError::Persistence(format!("duplicate booking id {}", booking.id)));
        }

        bookings.push(booking.clone());
        write_records(&self.bookings_path, &bookings).await?;
        Ok(booking)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .load_bookings()
            .await?
            .into_iter()
            .filter(|booking| filter.matches(booking))
            .collect();

        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn get_booking(&self, id: Uuid) -> Result<Booking, StoreError> {
        self.load_bookings()
            .await?
            .into_iter()
            .find(|booking| booking.id == id)
            .ok_or(StoreError::NotFound)
    }

    async fn find_booking_by_token(&self, token: &str) -> Result<Booking, StoreError> {
        self.load_bookings()
            .await?
            .into_iter()
            .find(|booking| !token.is_empty() && booking.approval_token == token)
            .ok_or(StoreError::NotFound)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bookings = self.load_bookings().await?;

        let booking = bookings
            .iter_mut()
            .find(|booking| booking.id == id)
            .ok_or(StoreError::NotFound)?;

        if booking.status != BookingStatus::Pending {
            return Err(StoreError::NotPending(booking.status));
        }

        booking.status = status;
        let updated = booking.clone();

        write_records(&self.bookings_path, &bookings).await?;
        Ok(updated)
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let mut reviews = self.load_reviews().await?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    async fn create_review(&self, review: Review) -> Result<Review, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut reviews = self.load_reviews().await?;

        reviews.push(review.clone());
        write_records(&self.reviews_path, &reviews).await?;
        Ok(review)
    }

    async fn reserve_slot(&self, booking: Booking) -> Result<Booking, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut bookings = self.load_bookings().await?;

        if bookings
            .iter()
            .any(|existing| existing.blocks(booking.date, booking.time, booking.specialist_id.as_deref()))
        {
            return Err(StoreError::SlotTaken);
        }

        bookings.push(booking.clone());
        write_records(&self.bookings_path, &bookings).await?;
        Ok(booking)
    }
}
