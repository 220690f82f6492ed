use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_utils::extractor::admin_middleware;

use crate::handlers::{self, BookingState};

pub fn booking_routes(state: Arc<BookingState>) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/", post(handlers::create_booking))
        .route("/services", get(handlers::list_services))
        .route("/specialists", get(handlers::list_specialists))
        .route("/slots", get(handlers::get_slots))
        .route("/approve", get(handlers::approve_booking));

    // Admin routes (admin JWT required)
    let admin_routes = Router::new()
        .route("/admin", get(handlers::list_bookings))
        .route("/admin/{booking_id}/status", patch(handlers::update_booking_status))
        .route("/admin/specialists", put(handlers::save_specialist))
        .route("/admin/specialists/{specialist_id}", delete(handlers::remove_specialist))
        .layer(middleware::from_fn_with_state(state.config.clone(), admin_middleware));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state)
}

pub fn review_routes(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", get(handlers::list_reviews).post(handlers::create_review))
        .with_state(state)
}
