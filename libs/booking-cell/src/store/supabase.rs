// libs/booking-cell/src/store/supabase.rs
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{merge_duplicates, return_representation, SupabaseClient};

use crate::models::{Booking, BookingFilter, BookingStatus, Review, Service, Specialist};
use crate::store::{BookingStore, StoreError};

const RESERVE_SLOT_FUNCTION: &str = "reserve_booking_slot";

/// Durable backend on Supabase (PostgREST over Postgres).
///
/// Slot reservation runs inside the `reserve_booking_slot` database function,
/// which holds a transaction-scoped advisory lock on the (date, time) key
/// while it rechecks and inserts. See `sql/001_bookings.sql`.
pub struct SupabaseBookingStore {
    supabase: SupabaseClient,
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn token(&self) -> Option<&str> {
        Some(self.supabase.api_key())
    }

    async fn fetch_bookings(&self, query: &str) -> Result<Vec<Booking>, StoreError> {
        let path = format!("/rest/v1/bookings?{}", query);
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, &path, self.token(), None)
            .await?;

        parse_rows(rows)
    }

    async fn first_booking(&self, query: &str) -> Result<Booking, StoreError> {
        self.fetch_bookings(&format!("{}&limit=1", query))
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }
}

fn parse_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| {
            error!("Failed to parse Supabase rows: {}", e);
            StoreError::from(e)
        })
}

fn booking_query(filter: &BookingFilter) -> String {
    let mut query_parts = vec!["select=*".to_string()];

    if let Some(date) = filter.date {
        query_parts.push(format!("booking_date=eq.{}", date));
    }
    if let Some(specialist_id) = &filter.specialist_id {
        query_parts.push(format!("specialist_id=eq.{}", urlencoding::encode(specialist_id)));
    }
    if !filter.exclude_statuses.is_empty() {
        let statuses: Vec<&str> = filter.exclude_statuses.iter().map(BookingStatus::as_str).collect();
        query_parts.push(format!("status=not.in.({})", statuses.join(",")));
    }

    query_parts.push("order=created_at.desc".to_string());
    query_parts.join("&")
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, "/rest/v1/services?select=*&order=id.asc", self.token(), None)
            .await?;

        parse_rows(rows)
    }

    async fn list_specialists(&self) -> Result<Vec<Specialist>, StoreError> {
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, "/rest/v1/specialists?select=*&order=id.asc", self.token(), None)
            .await?;

        parse_rows(rows)
    }

    async fn save_specialist(&self, specialist: Specialist) -> Result<Specialist, StoreError> {
        let body = serde_json::to_value(&specialist)?;

        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/specialists",
                self.token(),
                Some(body),
                Some(merge_duplicates()),
            )
            .await?;

        parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Persistence("upsert returned no specialist".to_string()))
    }

    async fn remove_specialist(&self, id: &str) -> Result<(), StoreError> {
        let id = urlencoding::encode(id);

        // Report references up front instead of surfacing the foreign key violation.
        let referencing: Vec<Value> = self.supabase
            .request(
                Method::GET,
                &format!("/rest/v1/bookings?select=id&specialist_id=eq.{}&limit=1", id),
                self.token(),
                None,
            )
            .await?;
        if !referencing.is_empty() {
            return Err(StoreError::InUse);
        }

        let path = format!("/rest/v1/specialists?id=eq.{}", id);

        let rows: Vec<Value> = self.supabase
            .request_with_headers(Method::DELETE, &path, self.token(), None, Some(return_representation()))
            .await?;

        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let body = serde_json::to_value(&booking)?;

        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/bookings",
                self.token(),
                Some(body),
                Some(return_representation()),
            )
            .await?;

        parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Persistence("insert returned no booking".to_string()))
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        debug!("Listing bookings with filter {:?}", filter);
        self.fetch_bookings(&booking_query(filter)).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Booking, StoreError> {
        self.first_booking(&format!("select=*&id=eq.{}", id)).await
    }

    async fn find_booking_by_token(&self, token: &str) -> Result<Booking, StoreError> {
        if token.is_empty() {
            return Err(StoreError::NotFound);
        }
        self.first_booking(&format!("select=*&approval_token=eq.{}", urlencoding::encode(token)))
            .await
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Booking, StoreError> {
        // The status filter makes the PATCH a compare-and-set on `pending`.
        let path = format!("/rest/v1/bookings?id=eq.{}&status=eq.pending", id);

        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                self.token(),
                Some(json!({ "status": status })),
                Some(return_representation()),
            )
            .await?;

        if let Some(updated) = parse_rows::<Booking>(rows)?.into_iter().next() {
            info!("Booking {} moved to {}", id, status);
            return Ok(updated);
        }

        let current = self.get_booking(id).await?;
        if current.status == BookingStatus::Pending {
            return Err(StoreError::Persistence(format!(
                "status update for booking {} matched no rows",
                id
            )));
        }
        Err(StoreError::NotPending(current.status))
    }

    async fn list_reviews(&self) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<Value> = self.supabase
            .request(Method::GET, "/rest/v1/reviews?select=*&order=created_at.desc", self.token(), None)
            .await?;

        parse_rows(rows)
    }

    async fn create_review(&self, review: Review) -> Result<Review, StoreError> {
        let body = serde_json::to_value(&review)?;

        let rows: Vec<Value> = self.supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/reviews",
                self.token(),
                Some(body),
                Some(return_representation()),
            )
            .await?;

        parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Persistence("insert returned no review".to_string()))
    }

    async fn reserve_slot(&self, booking: Booking) -> Result<Booking, StoreError> {
        let args = json!({ "p_booking": serde_json::to_value(&booking)? });

        let rows: Vec<Value> = self.supabase
            .rpc(RESERVE_SLOT_FUNCTION, self.token(), args)
            .await?;

        parse_rows::<Booking>(rows)?
            .into_iter()
            .next()
            .ok_or(StoreError::SlotTaken)
    }
}
