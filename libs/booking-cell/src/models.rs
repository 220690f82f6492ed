// libs/booking-cell/src/models.rs
use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use shared_config::AppConfig;

// ==============================================================================
// CATALOG MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialist {
    pub id: String,
    pub name: String,
    pub role: String,
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    /// Minutes.
    pub duration: i32,
    #[serde(default)]
    pub specialist_ids: Vec<String>,
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Approved => "approved",
            BookingStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }

    /// Whether a booking in this status keeps its slot occupied.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, BookingStatus::Rejected)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of a bookable slot, serialized as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses `HH:MM`, also accepting the `HH:MM:SS` form Postgres returns.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
            .map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SlotTime::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid slot time '{}'", raw)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub service_id: String,
    #[serde(default)]
    pub specialist_id: Option<String>,
    #[serde(rename = "booking_date")]
    pub date: NaiveDate,
    #[serde(rename = "booking_time")]
    pub time: SlotTime,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub status: BookingStatus,
    pub approval_token: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking blocks `time` on `date` for the given specialist filter.
    pub fn blocks(&self, date: NaiveDate, time: SlotTime, specialist_id: Option<&str>) -> bool {
        self.date == date
            && self.time == time
            && self.status.occupies_slot()
            && specialist_id.map_or(true, |id| self.specialist_id.as_deref() == Some(id))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingFilter {
    pub date: Option<NaiveDate>,
    pub specialist_id: Option<String>,
    #[serde(default)]
    pub exclude_statuses: Vec<BookingStatus>,
}

impl BookingFilter {
    /// Every booking that still holds a slot on `date`.
    pub fn occupying(date: NaiveDate, specialist_id: Option<&str>) -> Self {
        Self {
            date: Some(date),
            specialist_id: specialist_id.map(str::to_string),
            exclude_statuses: vec![BookingStatus::Rejected],
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        self.date.map_or(true, |date| booking.date == date)
            && self
                .specialist_id
                .as_deref()
                .map_or(true, |id| booking.specialist_id.as_deref() == Some(id))
            && !self.exclude_statuses.contains(&booking.status)
    }
}

/// Booking joined with the catalog fields the admin list shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSummary {
    #[serde(flatten)]
    pub booking: Booking,
    pub service_name: Option<String>,
    pub service_price: Option<f64>,
    pub service_duration: Option<i32>,
    pub specialist_name: Option<String>,
}

// ==============================================================================
// REVIEW MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
}

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub client_name: String,
    pub rating: i64,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Raw form submission; every field is optional so missing input surfaces as
/// an incomplete request rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateBookingRequest {
    pub service_id: Option<String>,
    pub specialist_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateReviewRequest {
    pub name: Option<String>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBooking {
    pub service_id: String,
    pub specialist_id: Option<String>,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub date: NaiveDate,
    pub booked_slots: BTreeSet<SlotTime>,
    pub free_slots: Vec<SlotTime>,
}

/// Booking details handed to the notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingNotice {
    pub booking_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_name: Option<String>,
    pub date: NaiveDate,
    pub time: SlotTime,
}

impl BookingNotice {
    pub fn new(booking: &Booking, service_name: Option<String>) -> Self {
        Self {
            booking_id: booking.id,
            client_name: booking.client_name.clone(),
            client_email: booking.client_email.clone(),
            client_phone: booking.client_phone.clone(),
            service_name,
            date: booking.date,
            time: booking.time,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Please fill in all fields")]
    IncompleteRequest,

    #[error("Please select a time between {open} and {close}")]
    OutOfHoursRequest { open: SlotTime, close: SlotTime },

    #[error("We are closed on {}. Please choose another day", weekday_name(.0))]
    ClosedDayRequest(Weekday),

    #[error("Please choose a date between today and one month ahead")]
    OutOfWindowRequest,

    #[error("Please enter a valid email address and phone number")]
    MalformedContact,

    #[error("Please choose a valid service")]
    UnknownService,

    #[error("Please choose a specialist who offers this service")]
    UnknownSpecialist,

    #[error("This time slot is already taken. Please choose another time")]
    SlotConflict,

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Booking not found")]
    NotFound,

    #[error("Booking was already {0}")]
    AlreadyDecided(BookingStatus),

    #[error("Bookings can only be approved or rejected")]
    InvalidTransition,

    #[error("This specialist has bookings and cannot be removed")]
    SpecialistInUse,
}

impl BookingError {
    /// Text safe to show the submitter; backend detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Persistence(_) => GENERIC_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Errors caused by the request itself rather than the booking's state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BookingError::IncompleteRequest
                | BookingError::OutOfHoursRequest { .. }
                | BookingError::ClosedDayRequest(_)
                | BookingError::OutOfWindowRequest
                | BookingError::MalformedContact
                | BookingError::UnknownService
                | BookingError::UnknownSpecialist
                | BookingError::InvalidTransition
        )
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReviewError {
    #[error("Please fill in all fields")]
    IncompleteReview,

    #[error("Please choose a rating between 1 and 5")]
    InvalidRating,

    #[error("Persistence failure: {0}")]
    Persistence(String),
}

impl ReviewError {
    pub fn user_message(&self) -> String {
        match self {
            ReviewError::Persistence(_) => "Failed to submit review".to_string(),
            other => other.to_string(),
        }
    }
}

pub fn weekday_name(day: &Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mondays",
        Weekday::Tue => "Tuesdays",
        Weekday::Wed => "Wednesdays",
        Weekday::Thu => "Thursdays",
        Weekday::Fri => "Fridays",
        Weekday::Sat => "Saturdays",
        Weekday::Sun => "Sundays",
    }
}

// ==============================================================================
// BUSINESS RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub opening_time: SlotTime,
    pub closing_time: SlotTime,
    pub slot_minutes: i64,
    pub closed_weekday: Weekday,
    pub max_advance_months: u32,
    pub utc_offset_minutes: i32,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            opening_time: SlotTime(NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN)),
            closing_time: SlotTime(NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)),
            slot_minutes: 30,
            closed_weekday: Weekday::Sun,
            max_advance_months: 1,
            utc_offset_minutes: 120,
        }
    }
}

impl BookingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            closed_weekday: config.business_closed_weekday,
            utc_offset_minutes: config.business_utc_offset_minutes,
            ..Self::default()
        }
    }

    /// Every slot start from opening up to, but excluding, closing time.
    pub fn slot_grid(&self) -> Vec<SlotTime> {
        let step = Duration::minutes(self.slot_minutes.max(1));
        let mut slots = Vec::new();
        let mut current = self.opening_time.0;

        while current < self.closing_time.0 {
            slots.push(SlotTime(current));
            let (next, wrapped) = current.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            current = next;
        }

        slots
    }

    pub fn is_on_grid(&self, time: SlotTime) -> bool {
        self.slot_grid().contains(&time)
    }

    /// The business's local calendar day at `now`.
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        (now + Duration::minutes(self.utc_offset_minutes as i64)).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_grid_covers_business_hours() {
        let grid = BookingRules::default().slot_grid();

        assert_eq!(grid.len(), 16);
        assert_eq!(grid.first().map(ToString::to_string).as_deref(), Some("10:00"));
        assert_eq!(grid.last().map(ToString::to_string).as_deref(), Some("17:30"));
    }

    #[test]
    fn slot_time_accepts_postgres_seconds() {
        assert_eq!(SlotTime::parse("14:00:00"), SlotTime::from_hm(14, 0));
        assert_eq!(SlotTime::parse(" 09:30 "), SlotTime::from_hm(9, 30));
        assert_eq!(SlotTime::parse("2pm"), None);

        let json = serde_json::to_string(&SlotTime::from_hm(14, 30).unwrap()).unwrap();
        assert_eq!(json, "\"14:30\"");
    }

    #[test]
    fn rejected_bookings_release_their_slot() {
        assert!(BookingStatus::Pending.occupies_slot());
        assert!(BookingStatus::Approved.occupies_slot());
        assert!(!BookingStatus::Rejected.occupies_slot());
        assert!(!BookingStatus::Pending.is_terminal());
    }

    #[test]
    fn state_errors_are_not_client_errors() {
        assert!(BookingError::UnknownService.is_client_error());
        assert!(BookingError::UnknownSpecialist.is_client_error());
        assert!(!BookingError::SlotConflict.is_client_error());
        assert!(!BookingError::AlreadyDecided(BookingStatus::Approved).is_client_error());
        assert!(!BookingError::SpecialistInUse.is_client_error());
    }

    #[test]
    fn local_today_applies_business_offset() {
        let rules = BookingRules::default();
        let late_utc = Utc.with_ymd_and_hms(2025, 11, 30, 23, 0, 0).unwrap();

        assert_eq!(rules.local_today(late_utc), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn persistence_detail_is_hidden_from_users() {
        let err = BookingError::Persistence("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        assert_eq!(
            BookingError::ClosedDayRequest(Weekday::Sun).user_message(),
            "We are closed on Sundays. Please choose another day"
        );
    }
}
