// libs/booking-cell/src/services/validation.rs
use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use tracing::debug;

use crate::models::{
    BookingError, BookingRules, CreateBookingRequest, SlotTime, ValidatedBooking,
};

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";
// Country-code prefix or trunk zero, then at least eight digits or separators.
const PHONE_PATTERN: &str = r"^(\+\d{1,3}|0)[\d\s\-]{8,}$";
const MAX_EMAIL_LENGTH: usize = 254;

/// Shape and business-rule checks run before anything touches storage.
///
/// Validation is pure: the caller supplies the business-local `today`, so the
/// same checks give the same answer wherever they run.
pub struct BookingValidator {
    rules: BookingRules,
    email_regex: Regex,
    phone_regex: Regex,
}

impl BookingValidator {
    pub fn new(rules: BookingRules) -> Self {
        Self {
            rules,
            email_regex: Regex::new(EMAIL_PATTERN).expect("email pattern compiles"),
            phone_regex: Regex::new(PHONE_PATTERN).expect("phone pattern compiles"),
        }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub fn validate(
        &self,
        request: &CreateBookingRequest,
        today: NaiveDate,
    ) -> Result<ValidatedBooking, BookingError> {
        let service_id = required(&request.service_id)?;
        let date_raw = required(&request.date)?;
        let time_raw = required(&request.time)?;
        let first_name = required(&request.first_name)?;
        let last_name = required(&request.last_name)?;
        let email = required(&request.email)?;
        let phone = required(&request.phone)?;

        let time = self.validate_time(time_raw)?;
        let date = self.validate_date(date_raw, today)?;

        if !self.is_valid_email(email) || !self.is_valid_phone(phone) {
            debug!("Rejecting booking request with malformed contact details");
            return Err(BookingError::MalformedContact);
        }

        let specialist_id = request
            .specialist_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(ValidatedBooking {
            service_id: service_id.to_string(),
            specialist_id,
            date,
            time,
            client_name: format!("{} {}", first_name, last_name),
            client_email: email.to_string(),
            client_phone: phone.to_string(),
        })
    }

    pub fn validate_time(&self, raw: &str) -> Result<SlotTime, BookingError> {
        let out_of_hours = BookingError::OutOfHoursRequest {
            open: self.rules.opening_time,
            close: self.rules.closing_time,
        };

        match SlotTime::parse(raw) {
            Some(time) if self.rules.is_on_grid(time) => Ok(time),
            _ => Err(out_of_hours),
        }
    }

    /// Closed-day check first, then the look-ahead window.
    pub fn validate_date(&self, raw: &str, today: NaiveDate) -> Result<NaiveDate, BookingError> {
        let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| BookingError::OutOfWindowRequest)?;

        if date.weekday() == self.rules.closed_weekday {
            return Err(BookingError::ClosedDayRequest(self.rules.closed_weekday));
        }

        let last_bookable = today
            .checked_add_months(Months::new(self.rules.max_advance_months))
            .unwrap_or(NaiveDate::MAX);

        if date < today || date > last_bookable {
            return Err(BookingError::OutOfWindowRequest);
        }

        Ok(date)
    }

    pub fn is_valid_email(&self, email: &str) -> bool {
        email.len() <= MAX_EMAIL_LENGTH && self.email_regex.is_match(email)
    }

    pub fn is_valid_phone(&self, phone: &str) -> bool {
        self.phone_regex.is_match(phone)
    }
}

impl Default for BookingValidator {
    fn default() -> Self {
        Self::new(BookingRules::default())
    }
}

fn required(field: &Option<String>) -> Result<&str, BookingError> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(BookingError::IncompleteRequest)
}
