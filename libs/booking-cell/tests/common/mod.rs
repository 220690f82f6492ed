// Shared fixtures for booking-cell integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use booking_cell::models::{
    Booking, BookingFilter, BookingNotice, BookingStatus, CreateBookingRequest, SlotTime,
};
use booking_cell::services::lifecycle::BookingLifecycleService;
use booking_cell::services::notification::{NotificationError, Notifier};
use booking_cell::store::{BookingStore, LocalBookingStore, StoreError};
use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Admin { notice: BookingNotice, link: String },
    Client(BookingNotice),
}

/// Notifier that keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn admin_count(&self) -> usize {
        self.sent().iter().filter(|s| matches!(s, Sent::Admin { .. })).count()
    }

    pub fn client_count(&self) -> usize {
        self.sent().iter().filter(|s| matches!(s, Sent::Client(_))).count()
    }

    pub fn last_link(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|s| match s {
            Sent::Admin { link, .. } => Some(link),
            Sent::Client(_) => None,
        })
    }

    fn record(&self, message: Sent) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(message);
        if self.fail {
            return Err(NotificationError::Provider("HTTP 500: mailbox on fire".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_admin(&self, notice: &BookingNotice, approval_link: &str) -> Result<(), NotificationError> {
        self.record(Sent::Admin {
            notice: notice.clone(),
            link: approval_link.to_string(),
        })
    }

    async fn notify_client_approved(&self, notice: &BookingNotice) -> Result<(), NotificationError> {
        self.record(Sent::Client(notice.clone()))
    }
}

/// 2025-11-20 09:00 UTC, a Thursday.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 9, 0, 0).unwrap()
}

/// A request that passes every check relative to `now()`.
pub fn valid_request() -> CreateBookingRequest {
    CreateBookingRequest {
        service_id: Some("11".to_string()),
        specialist_id: Some("3".to_string()),
        date: Some("2025-12-01".to_string()),
        time: Some("14:00".to_string()),
        first_name: Some("Ana".to_string()),
        last_name: Some("Petrova".to_string()),
        email: Some("ana@example.com".to_string()),
        phone: Some("+359 88 123 4567".to_string()),
    }
}

pub struct LocalHarness {
    pub dir: TempDir,
    pub config: AppConfig,
    pub store: Arc<dyn BookingStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub lifecycle: BookingLifecycleService,
}

pub async fn local_harness() -> LocalHarness {
    local_harness_with(RecordingNotifier::default()).await
}

pub async fn local_harness_with(notifier: RecordingNotifier) -> LocalHarness {
    let dir = TempDir::new().unwrap();
    let config = TestConfig::default().to_local_app_config(dir.path());
    let store: Arc<dyn BookingStore> = Arc::new(LocalBookingStore::open(dir.path()).await.unwrap());
    let notifier = Arc::new(notifier);
    let lifecycle = BookingLifecycleService::new(&config, store.clone(), notifier.clone());

    LocalHarness { dir, config, store, notifier, lifecycle }
}

// ==============================================================================
// STORE CONTRACT
// ==============================================================================

/// The pending booking a store must hold before `assert_store_contract` runs.
pub fn contract_booking() -> Booking {
    Booking {
        id: Uuid::from_u128(0x5a10_0001),
        service_id: "11".to_string(),
        specialist_id: Some("3".to_string()),
        date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        time: SlotTime::from_hm(14, 0).unwrap(),
        client_name: "Ana Petrova".to_string(),
        client_email: "ana@example.com".to_string(),
        client_phone: "+359 88 123 4567".to_string(),
        status: BookingStatus::Pending,
        approval_token: "tok-contract".to_string(),
        created_at: now(),
    }
}

/// Behaviour every backend shares, checked against a store seeded with the
/// default catalog and `contract_booking()`. Leaves the store unchanged.
pub async fn assert_store_contract(store: &dyn BookingStore) {
    let seeded = contract_booking();

    let services = store.list_services().await.unwrap();
    let gel = services.iter().find(|s| s.id == "11").unwrap();
    assert_eq!(gel.name, "Gel Manicure");
    assert_eq!(gel.specialist_ids, vec!["3".to_string()]);

    let occupying = store
        .list_bookings(&BookingFilter::occupying(seeded.date, Some("3")))
        .await
        .unwrap();
    assert_eq!(occupying, vec![seeded.clone()]);

    assert_eq!(store.get_booking(seeded.id).await.unwrap(), seeded);
    assert_eq!(store.find_booking_by_token("tok-contract").await.unwrap().id, seeded.id);

    assert_matches!(store.get_booking(Uuid::from_u128(404)).await, Err(StoreError::NotFound));
    assert_matches!(store.find_booking_by_token("").await, Err(StoreError::NotFound));
    assert_matches!(store.find_booking_by_token("tok-unknown").await, Err(StoreError::NotFound));

    let clash = Booking {
        id: Uuid::from_u128(0x5a10_0002),
        approval_token: "tok-clash".to_string(),
        client_email: "boris@example.com".to_string(),
        ..seeded.clone()
    };
    assert_matches!(store.reserve_slot(clash).await, Err(StoreError::SlotTaken));

    assert_matches!(store.remove_specialist("3").await, Err(StoreError::InUse));
}
