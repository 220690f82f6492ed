// libs/booking-cell/src/handlers.rs
use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    ActionResponse, BookingError, BookingFilter, BookingStatus, BookingSummary,
    CreateBookingRequest, CreateReviewRequest, Review, ReviewError, Service, SlotAvailability,
    Specialist, UpdateStatusRequest, GENERIC_FAILURE_MESSAGE,
};
use crate::services::lifecycle::BookingLifecycleService;
use crate::services::notification::Notifier;
use crate::services::reviews::ReviewService;
use crate::store::BookingStore;

/// Everything the booking routes need, built once at startup.
pub struct BookingState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn BookingStore>,
    pub lifecycle: BookingLifecycleService,
    pub reviews: ReviewService,
}

impl BookingState {
    pub fn new(config: Arc<AppConfig>, store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        let lifecycle = BookingLifecycleService::new(&config, store.clone(), notifier);
        let reviews = ReviewService::new(store.clone());
        Self { config, store, lifecycle, reviews }
    }
}

type ActionResult = (StatusCode, Json<ActionResponse>);

const INVALID_REQUEST_MESSAGE: &str = "Invalid request. Please check your input and try again.";

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
    pub specialist_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApproveQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminBookingsQuery {
    pub date: Option<NaiveDate>,
    pub specialist_id: Option<String>,
    pub status: Option<BookingStatus>,
}

fn error_status(err: &BookingError) -> StatusCode {
    if err.is_client_error() {
        return StatusCode::BAD_REQUEST;
    }
    match err {
        BookingError::SlotConflict
        | BookingError::AlreadyDecided(_)
        | BookingError::SpecialistInUse => StatusCode::CONFLICT,
        BookingError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Extractor failures (bad JSON, wrong content type, malformed ids) keep the
/// `{success, message}` shape and never echo the parser's detail.
fn rejected(what: &str, rejection: impl Display) -> ActionResult {
    warn!("Rejected {}: {}", what, rejection);
    (StatusCode::BAD_REQUEST, Json(ActionResponse::failed(INVALID_REQUEST_MESSAGE)))
}

fn failure(err: BookingError) -> ActionResult {
    if let BookingError::Persistence(detail) = &err {
        error!("Booking backend failure: {}", detail);
    }
    (error_status(&err), Json(ActionResponse::failed(err.user_message())))
}

fn internal(err: BookingError) -> AppError {
    error!("Booking backend failure: {}", err);
    AppError::Internal(GENERIC_FAILURE_MESSAGE.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

pub async fn list_services(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = state.store.list_services().await
        .map_err(|e| internal(e.into()))?;

    Ok(Json(services))
}

pub async fn list_specialists(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Vec<Specialist>>, AppError> {
    let specialists = state.store.list_specialists().await
        .map_err(|e| internal(e.into()))?;

    Ok(Json(specialists))
}

pub async fn get_slots(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotAvailability>, AppError> {
    let raw_date = non_empty(query.date)
        .ok_or_else(|| AppError::BadRequest("date is required".to_string()))?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw_date)))?;
    let specialist_id = non_empty(query.specialist_id);

    let availability = state.lifecycle.availability()
        .get_availability(date, specialist_id.as_deref())
        .await
        .map_err(internal)?;

    Ok(Json(availability))
}

pub async fn create_booking(
    State(state): State<Arc<BookingState>>,
    body: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ActionResult {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected("booking request body", rejection),
    };

    match state.lifecycle.submit(&request, Utc::now()).await {
        Ok(booking) => {
            info!("Booking request {} accepted", booking.id);
            (
                StatusCode::CREATED,
                Json(ActionResponse::ok("Booking request sent! We will contact you shortly.")),
            )
        }
        Err(err) => failure(err),
    }
}

/// One-click approval from the admin email.
pub async fn approve_booking(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<ApproveQuery>,
) -> Response {
    let Some(token) = non_empty(query.token) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::failed("Missing approval token")),
        )
            .into_response();
    };

    let confirmed_url = format!(
        "{}/booking/confirmed",
        state.config.site_base_url.trim_end_matches('/')
    );

    match state.lifecycle.approve_by_token(&token).await {
        Ok(booking) => {
            info!("Booking {} approved via link", booking.id);
            Redirect::to(&confirmed_url).into_response()
        }
        Err(BookingError::AlreadyDecided(status)) => {
            info!("Approval link reused, booking already {}", status);
            Redirect::to(&format!("{}?already=true", confirmed_url)).into_response()
        }
        Err(err) => failure(err).into_response(),
    }
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

pub async fn list_bookings(
    State(state): State<Arc<BookingState>>,
    query: Result<Query<AdminBookingsQuery>, QueryRejection>,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    let Query(query) = query.map_err(|rejection| {
        warn!("Rejected admin booking filter: {}", rejection);
        AppError::BadRequest(INVALID_REQUEST_MESSAGE.to_string())
    })?;

    let mut filter = BookingFilter {
        date: query.date,
        specialist_id: non_empty(query.specialist_id),
        exclude_statuses: Vec::new(),
    };
    if let Some(status) = query.status {
        filter.exclude_statuses = [BookingStatus::Pending, BookingStatus::Approved, BookingStatus::Rejected]
            .into_iter()
            .filter(|s| *s != status)
            .collect();
    }

    let bookings = state.lifecycle.list_bookings(&filter).await.map_err(internal)?;

    Ok(Json(bookings))
}

pub async fn update_booking_status(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    booking_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ActionResult {
    let Path(booking_id) = match booking_id {
        Ok(path) => path,
        Err(rejection) => return rejected("booking id", rejection),
    };
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected("status update body", rejection),
    };

    info!("Admin {} setting booking {} to {}", user.id, booking_id, request.status);

    match state.lifecycle.set_status(booking_id, request.status).await {
        Ok(booking) => (
            StatusCode::OK,
            Json(ActionResponse::ok(format!("Booking {}", booking.status))),
        ),
        Err(BookingError::AlreadyDecided(status)) => (
            StatusCode::OK,
            Json(ActionResponse::ok(format!("Booking was already {}", status))),
        ),
        Err(err) => failure(err),
    }
}

pub async fn save_specialist(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    body: Result<Json<Specialist>, JsonRejection>,
) -> ActionResult {
    let Json(specialist) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected("specialist body", rejection),
    };

    if specialist.id.trim().is_empty() || specialist.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ActionResponse::failed("Specialist id and name are required")),
        );
    }

    match state.store.save_specialist(specialist).await {
        Ok(saved) => {
            info!("Admin {} saved specialist {}", user.id, saved.id);
            (StatusCode::OK, Json(ActionResponse::ok("Specialist saved successfully")))
        }
        Err(e) => failure(e.into()),
    }
}

pub async fn remove_specialist(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Path(specialist_id): Path<String>,
) -> ActionResult {
    match state.store.remove_specialist(&specialist_id).await {
        Ok(()) => {
            info!("Admin {} removed specialist {}", user.id, specialist_id);
            (StatusCode::OK, Json(ActionResponse::ok("Specialist removed")))
        }
        Err(e) => {
            let err = BookingError::from(e);
            if err == BookingError::NotFound {
                warn!("Specialist {} not found for removal", specialist_id);
                return (StatusCode::NOT_FOUND, Json(ActionResponse::failed("Specialist not found")));
            }
            failure(err)
        }
    }
}

// ==============================================================================
// REVIEW HANDLERS
// ==============================================================================

pub async fn list_reviews(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = state.reviews.list_published().await
        .map_err(|_| AppError::Internal(GENERIC_FAILURE_MESSAGE.to_string()))?;

    Ok(Json(reviews))
}

pub async fn create_review(
    State(state): State<Arc<BookingState>>,
    body: Result<Json<CreateReviewRequest>, JsonRejection>,
) -> ActionResult {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejected("review body", rejection),
    };

    match state.reviews.submit(&request, Utc::now()).await {
        Ok(_) => (StatusCode::CREATED, Json(ActionResponse::ok("Review submitted successfully!"))),
        Err(err) => {
            let status = match err {
                ReviewError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            };
            (status, Json(ActionResponse::failed(err.user_message())))
        }
    }
}
