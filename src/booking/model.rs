use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

use crate::booking::error::BookingError;

/// Half-open stay interval `[start, end)` in whole days.
///
/// The checkout day is excluded, so one guest's checkout day can be another
/// guest's check-in day without the two stays conflicting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a validated range; `end` must be strictly after `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of nights; at least 1 for any constructed range.
    pub fn nights(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Half-open overlap: `a.start < b.end && b.start < a.end`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Reservation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
}

impl BookingStatus {
    /// Active bookings are the ones that count toward availability.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Canceled | BookingStatus::Completed)
    }

    /// Stable lowercase wire form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Completed => "completed",
        }
    }

    /// Human label for rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Canceled => "Canceled",
            BookingStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    /// Parses the wire form; "cancelled" is tolerated in imported data.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "canceled" | "cancelled" => Ok(BookingStatus::Canceled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

/// A bookable property. Money is `Decimal` end to end; identities are opaque
/// strings resolved by the surrounding application.
#[derive(Debug, Clone)]
pub struct Listing {
    pub id: Ulid,
    pub name: String,
    pub host: String,
    pub nightly_price: Decimal,
    pub cleaning_fee: Decimal,
    pub service_fee: Decimal,
    pub minimum_nights: i64,
    pub maximum_nights: i64,
    pub accommodates: u32,
}

/// Ceiling on each listing money field. Any stay a calendar can express then
/// prices inside `Decimal` range, so the arithmetic cannot overflow.
pub const MAX_LISTING_PRICE: u32 = 1_000_000_000;

/// Registration input for a listing; the engine assigns the id.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub name: String,
    pub host: String,
    pub nightly_price: Decimal,
    pub cleaning_fee: Decimal,
    pub service_fee: Decimal,
    pub minimum_nights: i64,
    pub maximum_nights: i64,
    pub accommodates: u32,
}

impl ListingDraft {
    /// Validate the draft and materialize it under the given id.
    pub fn into_listing(self, id: Ulid) -> Result<Listing, BookingError> {
        let invalid = |reason: &str| BookingError::InvalidListing { reason: reason.to_string() };

        if self.minimum_nights < 1 {
            return Err(invalid("minimum stay must be at least 1 night"));
        }
        if self.maximum_nights < self.minimum_nights {
            return Err(invalid("maximum stay must not be below the minimum stay"));
        }
        if self.accommodates < 1 {
            return Err(invalid("listing must accommodate at least 1 guest"));
        }
        if self.nightly_price < Decimal::ZERO
            || self.cleaning_fee < Decimal::ZERO
            || self.service_fee < Decimal::ZERO
        {
            return Err(invalid("prices and fees must not be negative"));
        }
        let price_cap = Decimal::from(MAX_LISTING_PRICE);
        if self.nightly_price > price_cap
            || self.cleaning_fee > price_cap
            || self.service_fee > price_cap
        {
            return Err(invalid(&format!(
                "prices and fees must not exceed {MAX_LISTING_PRICE}"
            )));
        }

        Ok(Listing {
            id,
            name: self.name,
            host: self.host,
            nightly_price: self.nightly_price,
            cleaning_fee: self.cleaning_fee,
            service_fee: self.service_fee,
            minimum_nights: self.minimum_nights,
            maximum_nights: self.maximum_nights,
            accommodates: self.accommodates,
        })
    }
}

/// Price of a stay, itemized. `total = base_price + cleaning_fee + service_fee`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceBreakdown {
    pub nights: i64,
    pub base_price: Decimal,
    pub cleaning_fee: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
}

/// A reservation of a listing for a date range by a guest.
///
/// The range and price are fixed at creation; only the status moves, and only
/// through the lifecycle rules.
#[derive(Debug, Clone)]
pub struct Booking {
    pub reference: Ulid,
    pub listing_id: Ulid,
    pub guest: String,
    pub guests: u32,
    pub range: DateRange,
    pub status: BookingStatus,
    pub price: PriceBreakdown,
}
