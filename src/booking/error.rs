use chrono::NaiveDate;
use std::fmt;
use ulid::Ulid;

use crate::booking::model::BookingStatus;

/// Validation failure surfaced to the caller with a human-readable reason.
///
/// Every variant is recoverable: the request was wrong or the slot was taken,
/// never a broken process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// The checkout date is on or before the check-in date.
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    /// The stay is shorter than the listing's minimum.
    StayTooShort { nights: i64, minimum: i64 },
    /// The stay is longer than the listing's maximum.
    StayTooLong { nights: i64, maximum: i64 },
    /// The party does not fit the listing.
    GuestCountExceedsCapacity { guests: u32, accommodates: u32 },
    /// An active booking already covers part of the requested range.
    DateRangeUnavailable { start: NaiveDate, end: NaiveDate },
    /// The requested status change is not legal for this booking and actor.
    IllegalStatusTransition {
        from: BookingStatus,
        attempted: BookingStatus,
        reason: String,
    },
    /// A listing draft that cannot be registered as-is.
    InvalidListing { reason: String },
    UnknownListing(Ulid),
    UnknownBooking(Ulid),
}

impl fmt::Display for BookingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingError::InvalidDateRange { start, end } => {
                write!(f, "invalid date range: checkout {end} must be after check-in {start}")
            }
            BookingError::StayTooShort { nights, minimum } => {
                write!(f, "a {nights}-night stay is below this listing's minimum of {minimum}")
            }
            BookingError::StayTooLong { nights, maximum } => {
                write!(f, "a {nights}-night stay is above this listing's maximum of {maximum}")
            }
            BookingError::GuestCountExceedsCapacity { guests, accommodates } => {
                write!(f, "a party of {guests} exceeds this listing's capacity of {accommodates}")
            }
            BookingError::DateRangeUnavailable { start, end } => {
                write!(f, "the dates {start} to {end} are no longer available")
            }
            BookingError::IllegalStatusTransition { from, attempted, reason } => {
                write!(f, "cannot move a {from} booking to {attempted}: {reason}")
            }
            BookingError::InvalidListing { reason } => {
                write!(f, "listing cannot be registered: {reason}")
            }
            BookingError::UnknownListing(id) => write!(f, "no listing with id {id}"),
            BookingError::UnknownBooking(reference) => {
                write!(f, "no booking with reference {reference}")
            }
        }
    }
}

impl std::error::Error for BookingError {}
