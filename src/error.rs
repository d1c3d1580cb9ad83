use crate::booking::error::BookingError;
use crate::booking::ledger::LedgerError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Booking(BookingError),
    Ledger(LedgerError),
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Booking(err) => write!(f, "booking error: {}", err),
            AppError::Ledger(err) => write!(f, "ledger error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Booking(err) => Some(err),
            AppError::Ledger(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(err) => match err {
                BookingError::DateRangeUnavailable { .. }
                | BookingError::IllegalStatusTransition { .. } => StatusCode::CONFLICT,
                BookingError::UnknownListing(_) | BookingError::UnknownBooking(_) => {
                    StatusCode::NOT_FOUND
                }
                BookingError::InvalidDateRange { .. }
                | BookingError::StayTooShort { .. }
                | BookingError::StayTooLong { .. }
                | BookingError::GuestCountExceedsCapacity { .. }
                | BookingError::InvalidListing { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Ledger(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<BookingError> for AppError {
    fn from(value: BookingError) -> Self {
        Self::Booking(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn taken_dates_map_to_conflict() {
        let err = AppError::from(BookingError::DateRangeUnavailable {
            start: date(2024, 6, 7),
            end: date(2024, 6, 10),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_ids_map_to_not_found() {
        let err = AppError::from(BookingError::UnknownListing(ulid::Ulid::new()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_failures_map_to_unprocessable() {
        let err = AppError::from(BookingError::StayTooShort {
            nights: 1,
            minimum: 2,
        });
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn infrastructure_failures_map_to_internal_error() {
        let err = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_names_the_failing_subsystem() {
        let err = AppError::from(BookingError::StayTooShort {
            nights: 1,
            minimum: 2,
        });
        assert!(err.to_string().starts_with("booking error: "));
    }
}
