//! Stay pricing. All arithmetic stays in `Decimal`; floats never touch money.

use rust_decimal::Decimal;

use crate::booking::error::BookingError;
use crate::booking::model::{DateRange, Listing, PriceBreakdown};

/// Itemized quote for a stay on a listing.
///
/// Validates the listing's stay-length bounds first, so a too-short or
/// too-long request is rejected before anyone looks at the calendar. Flat
/// fees are charged once per stay, not per night.
pub fn quote(listing: &Listing, range: &DateRange) -> Result<PriceBreakdown, BookingError> {
    let nights = range.nights();
    if nights < listing.minimum_nights {
        return Err(BookingError::StayTooShort {
            nights,
            minimum: listing.minimum_nights,
        });
    }
    if nights > listing.maximum_nights {
        return Err(BookingError::StayTooLong {
            nights,
            maximum: listing.maximum_nights,
        });
    }
    Ok(breakdown(listing, nights))
}

/// Price a stay of the given length without stay-bound validation.
///
/// Used by `quote` after validation and when materializing ledger rows whose
/// stay predates the listing's current bounds.
pub(crate) fn breakdown(listing: &Listing, nights: i64) -> PriceBreakdown {
    let base_price = listing.nightly_price * Decimal::from(nights);
    PriceBreakdown {
        nights,
        base_price,
        cleaning_fee: listing.cleaning_fee,
        service_fee: listing.service_fee,
        total: base_price + listing.cleaning_fee + listing.service_fee,
    }
}
