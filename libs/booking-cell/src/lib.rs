pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use handlers::BookingState;
pub use models::*;
pub use router::{booking_routes, review_routes};
pub use store::{build_store, BookingStore, StoreError};
