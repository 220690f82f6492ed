pub mod availability;
pub mod lifecycle;
pub mod notification;
pub mod reviews;
pub mod validation;
