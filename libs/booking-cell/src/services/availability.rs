// libs/booking-cell/src/services/availability.rs
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{BookingError, BookingFilter, BookingRules, SlotAvailability, SlotTime};
use crate::store::BookingStore;

/// Answers which slots of a day are taken.
///
/// Pending requests hold their slot just like approved ones, so two clients
/// cannot both be waiting on the same time while the admin decides.
pub struct AvailabilityService {
    store: Arc<dyn BookingStore>,
    rules: BookingRules,
}

impl AvailabilityService {
    pub fn new(store: Arc<dyn BookingStore>, rules: BookingRules) -> Self {
        Self { store, rules }
    }

    pub async fn get_booked_slots(
        &self,
        date: NaiveDate,
        specialist_id: Option<&str>,
    ) -> Result<BTreeSet<SlotTime>, BookingError> {
        debug!("Computing booked slots for {} (specialist {:?})", date, specialist_id);

        let bookings = self
            .store
            .list_bookings(&BookingFilter::occupying(date, specialist_id))
            .await
            .map_err(BookingError::from)?;

        Ok(bookings
            .into_iter()
            .filter(|booking| booking.status.occupies_slot())
            .map(|booking| booking.time)
            .collect())
    }

    pub async fn get_availability(
        &self,
        date: NaiveDate,
        specialist_id: Option<&str>,
    ) -> Result<SlotAvailability, BookingError> {
        let booked_slots = self.get_booked_slots(date, specialist_id).await?;
        let free_slots = self
            .rules
            .slot_grid()
            .into_iter()
            .filter(|slot| !booked_slots.contains(slot))
            .collect();

        Ok(SlotAvailability {
            date,
            booked_slots,
            free_slots,
        })
    }

    pub async fn is_slot_free(
        &self,
        date: NaiveDate,
        time: SlotTime,
        specialist_id: Option<&str>,
    ) -> Result<bool, BookingError> {
        Ok(!self.get_booked_slots(date, specialist_id).await?.contains(&time))
    }
}
