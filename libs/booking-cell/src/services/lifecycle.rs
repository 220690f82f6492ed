// libs/booking-cell/src/services/lifecycle.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use rand::RngCore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{
    Booking, BookingError, BookingFilter, BookingNotice, BookingRules, BookingStatus,
    BookingSummary, CreateBookingRequest,
};
use crate::services::availability::AvailabilityService;
use crate::services::notification::{NotificationError, Notifier};
use crate::services::validation::BookingValidator;
use crate::store::BookingStore;

const APPROVAL_TOKEN_BYTES: usize = 32;

/// Opaque, URL-safe approval token with 256 bits of randomness.
pub fn generate_approval_token() -> String {
    let mut bytes = [0u8; APPROVAL_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Owns every booking state change: submission, admin decisions and the
/// one-click approval link. Notifications go out only after the write is durable.
pub struct BookingLifecycleService {
    store: Arc<dyn BookingStore>,
    availability: AvailabilityService,
    validator: BookingValidator,
    notifier: Arc<dyn Notifier>,
    public_base_url: String,
    notification_timeout: Duration,
}

impl BookingLifecycleService {
    pub fn new(config: &AppConfig, store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        let rules = BookingRules::from_config(config);

        Self {
            availability: AvailabilityService::new(store.clone(), rules.clone()),
            validator: BookingValidator::new(rules),
            store,
            notifier,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            notification_timeout: Duration::from_secs(config.notification_timeout_secs.max(1)),
        }
    }

    pub fn availability(&self) -> &AvailabilityService {
        &self.availability
    }

    pub fn approval_link(&self, token: &str) -> String {
        format!(
            "{}/bookings/approve?token={}",
            self.public_base_url,
            urlencoding::encode(token)
        )
    }

    /// Validates and records a new `pending` booking, then alerts the admin.
    pub async fn submit(
        &self,
        request: &CreateBookingRequest,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let today = self.validator.rules().local_today(now);
        let validated = self.validator.validate(request, today)?;
        let service_name = self
            .resolve_catalog(&validated.service_id, validated.specialist_id.as_deref())
            .await?;

        let specialist_id = validated.specialist_id.as_deref();
        if !self.availability.is_slot_free(validated.date, validated.time, specialist_id).await? {
            info!("Slot {} {} already taken", validated.date, validated.time);
            return Err(BookingError::SlotConflict);
        }

        let booking = Booking {
            id: Uuid::new_v4(),
            service_id: validated.service_id,
            specialist_id: validated.specialist_id,
            date: validated.date,
            time: validated.time,
            client_name: validated.client_name,
            client_email: validated.client_email,
            client_phone: validated.client_phone,
            status: BookingStatus::Pending,
            approval_token: generate_approval_token(),
            created_at: now,
        };

        let booking = self.store.reserve_slot(booking).await.map_err(|e| {
            let err = BookingError::from(e);
            if let BookingError::Persistence(detail) = &err {
                error!("Failed to store booking: {}", detail);
            }
            err
        })?;

        info!("Booking {} created for {} {}", booking.id, booking.date, booking.time);

        let notice = BookingNotice::new(&booking, Some(service_name));
        let link = self.approval_link(&booking.approval_token);
        self.deliver("admin approval request", self.notifier.notify_admin(&notice, &link))
            .await;

        Ok(booking)
    }

    /// Admin decision on a pending booking.
    pub async fn set_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking, BookingError> {
        if !status.is_terminal() {
            return Err(BookingError::InvalidTransition);
        }

        let booking = self
            .store
            .update_booking_status(id, status)
            .await
            .map_err(BookingError::from)?;

        info!("Booking {} set to {}", booking.id, booking.status);

        if booking.status == BookingStatus::Approved {
            self.send_confirmation(&booking).await;
        }

        Ok(booking)
    }

    /// Approval through the emailed link. Repeat clicks yield `AlreadyDecided`
    /// and send nothing.
    pub async fn approve_by_token(&self, token: &str) -> Result<Booking, BookingError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(BookingError::NotFound);
        }

        let booking = self
            .store
            .find_booking_by_token(token)
            .await
            .map_err(BookingError::from)?;

        if booking.status.is_terminal() {
            debug!("Approval link reused for booking {} ({})", booking.id, booking.status);
            return Err(BookingError::AlreadyDecided(booking.status));
        }

        self.set_status(booking.id, BookingStatus::Approved).await
    }

    /// Newest first, joined with catalog display fields.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingSummary>, BookingError> {
        let bookings = self.store.list_bookings(filter).await.map_err(BookingError::from)?;
        let services: HashMap<_, _> = self
            .store
            .list_services()
            .await
            .map_err(BookingError::from)?
            .into_iter()
            .map(|service| (service.id.clone(), service))
            .collect();
        let specialists: HashMap<_, _> = self
            .store
            .list_specialists()
            .await
            .map_err(BookingError::from)?
            .into_iter()
            .map(|specialist| (specialist.id.clone(), specialist.name))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let service = services.get(&booking.service_id);
                let specialist_name = booking
                    .specialist_id
                    .as_ref()
                    .and_then(|id| specialists.get(id))
                    .cloned();

                BookingSummary {
                    service_name: service.map(|s| s.name.clone()),
                    service_price: service.map(|s| s.price),
                    service_duration: service.map(|s| s.duration),
                    specialist_name,
                    booking,
                }
            })
            .collect())
    }

    /// Checks the requested service exists and, when a specialist is named,
    /// that the specialist exists and performs it. Returns the service name.
    async fn resolve_catalog(
        &self,
        service_id: &str,
        specialist_id: Option<&str>,
    ) -> Result<String, BookingError> {
        let services = self.store.list_services().await.map_err(BookingError::from)?;
        let service = services
            .into_iter()
            .find(|service| service.id == service_id)
            .ok_or_else(|| {
                info!("Booking request for unknown service {}", service_id);
                BookingError::UnknownService
            })?;

        if let Some(specialist_id) = specialist_id {
            let known = self
                .store
                .list_specialists()
                .await
                .map_err(BookingError::from)?
                .iter()
                .any(|specialist| specialist.id == specialist_id);
            let qualified = service.specialist_ids.is_empty()
                || service.specialist_ids.iter().any(|id| id == specialist_id);

            if !known || !qualified {
                info!("Specialist {} cannot take service {}", specialist_id, service_id);
                return Err(BookingError::UnknownSpecialist);
            }
        }

        Ok(service.name)
    }

    async fn send_confirmation(&self, booking: &Booking) {
        let send = async {
            let notice = self.notice_for(booking).await;
            self.notifier.notify_client_approved(&notice).await
        };
        self.deliver("client confirmation", send).await;
    }

    async fn notice_for(&self, booking: &Booking) -> BookingNotice {
        let service_name = match self.store.list_services().await {
            Ok(services) => services
                .into_iter()
                .find(|service| service.id == booking.service_id)
                .map(|service| service.name),
            Err(e) => {
                warn!("Could not load service name for booking {}: {}", booking.id, e);
                None
            }
        };

        BookingNotice::new(booking, service_name)
    }

    async fn deliver<F>(&self, label: &str, send: F)
    where
        F: Future<Output = Result<(), NotificationError>>,
    {
        match tokio::time::timeout(self.notification_timeout, send).await {
            Ok(Ok(())) => debug!("Sent {}", label),
            Ok(Err(e)) => error!("Failed to send {}: {}", label, e),
            Err(_) => error!("Sending {} timed out after {:?}", label, self.notification_timeout),
        }
    }
}
