use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use booking_cell::router::{booking_routes, review_routes};
use booking_cell::BookingState;

pub fn create_router(state: Arc<BookingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Luxe Salon booking API is running!" }))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/reviews", review_routes(state))
}
