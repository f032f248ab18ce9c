use crate::types::ResourceKind;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref TIME_FORMAT: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingField {
    StartDate,
    StartTime,
    EndDate,
    EndTime,
    Purpose,
    Terms,
}

/// Field-keyed validation errors. Submission is blocked while non-empty.
pub type ErrorMap = HashMap<BookingField, String>;

/// Raw form values as entered, one per submission attempt. Dates are
/// `YYYY-MM-DD`, times `HH:MM`; date and time are concatenated and
/// parsed as a single timestamp when combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingForm {
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub purpose: String,
    pub agreed_to_terms: bool,
}

/// Which rules apply for a resource kind. Lab bookings carry no
/// user-entered time window; they book a fixed slot on a date.
#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    pub requires_time_window: bool,
    pub min_days_ahead: i64,
    pub max_days_ahead: i64,
}

pub fn rules_for(kind: ResourceKind) -> BookingRules {
    BookingRules {
        requires_time_window: !matches!(kind, ResourceKind::Lab),
        min_days_ahead: 1,
        max_days_ahead: 30,
    }
}

pub fn combine_date_time(date: &str, time: &str) -> Option<DateTime<Local>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time, "%H:%M").ok()?;
    Local.from_local_datetime(&date.and_time(time)).earliest()
}

fn check_date(field: &str, today: NaiveDate, rules: &BookingRules) -> Result<NaiveDate, String> {
    if field.is_empty() {
        return Err("Booking date is required".into());
    }
    let date = NaiveDate::parse_from_str(field, "%Y-%m-%d").map_err(|_| "Enter a valid date")?;
    if date < today + Duration::days(rules.min_days_ahead) {
        return Err("Bookings must be made at least one day in advance".into());
    }
    if date > today + Duration::days(rules.max_days_ahead) {
        return Err(format!(
            "Bookings can be made at most {} days in advance",
            rules.max_days_ahead
        ));
    }
    Ok(date)
}

/// Shared validation for all three booking variants. Every rule must
/// pass before a request may leave the client.
pub fn validate_booking(rules: &BookingRules, form: &BookingForm, today: NaiveDate) -> ErrorMap {
    let mut errors = ErrorMap::new();

    if let Err(message) = check_date(&form.start_date, today, rules) {
        errors.insert(BookingField::StartDate, message);
    }

    if rules.requires_time_window {
        if form.start_time.is_empty() {
            errors.insert(BookingField::StartTime, "Start time is required".into());
        } else if !TIME_FORMAT.is_match(&form.start_time) {
            errors.insert(BookingField::StartTime, "Enter a valid time".into());
        }

        if form.end_date.is_empty() {
            errors.insert(BookingField::EndDate, "End date is required".into());
        } else if NaiveDate::parse_from_str(&form.end_date, "%Y-%m-%d").is_err() {
            errors.insert(BookingField::EndDate, "Enter a valid date".into());
        }

        if form.end_time.is_empty() {
            errors.insert(BookingField::EndTime, "End time is required".into());
        } else if !TIME_FORMAT.is_match(&form.end_time) {
            errors.insert(BookingField::EndTime, "Enter a valid time".into());
        }

        // Cross-field check only once both sides parse on their own.
        if !errors.contains_key(&BookingField::StartDate)
            && !errors.contains_key(&BookingField::StartTime)
            && !errors.contains_key(&BookingField::EndDate)
            && !errors.contains_key(&BookingField::EndTime)
        {
            match (
                combine_date_time(&form.start_date, &form.start_time),
                combine_date_time(&form.end_date, &form.end_time),
            ) {
                (Some(start), Some(end)) if end <= start => {
                    errors.insert(
                        BookingField::EndTime,
                        "End time must be after start time.".into(),
                    );
                }
                (Some(_), Some(_)) => {}
                _ => {
                    errors.insert(BookingField::EndTime, "Enter a valid time".into());
                }
            }
        }
    }

    if form.purpose.trim().is_empty() {
        errors.insert(BookingField::Purpose, "Purpose is required".into());
    }

    if !form.agreed_to_terms {
        errors.insert(BookingField::Terms, "You must agree to the usage terms".into());
    }

    errors
}
