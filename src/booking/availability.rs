//! Conflict detection over a listing's bookings.
//!
//! A listing rarely carries more than a few dozen reservations, so this is a
//! plain linear scan over the half-open overlap predicate, with no index
//! structure behind it.

use crate::booking::model::{Booking, DateRange};

/// True when no active booking overlaps the proposed range.
///
/// Canceled and completed bookings never block. Adjacent ranges (a checkout
/// on another stay's check-in day) do not conflict.
pub fn is_range_available(existing: &[Booking], proposed: &DateRange) -> bool {
    first_conflict(existing, proposed).is_none()
}

/// The first active booking whose range overlaps the proposed one, if any.
pub fn first_conflict<'a>(existing: &'a [Booking], proposed: &DateRange) -> Option<&'a Booking> {
    existing
        .iter()
        .find(|booking| booking.status.is_active() && booking.range.overlaps(proposed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::model::{BookingStatus, PriceBreakdown};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use ulid::Ulid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(date(start.0, start.1, start.2), date(end.0, end.1, end.2))
            .expect("valid range")
    }

    fn booking(range: DateRange, status: BookingStatus) -> Booking {
        Booking {
            reference: Ulid::new(),
            listing_id: Ulid::new(),
            guest: "guest-sam".into(),
            guests: 2,
            range,
            status,
            price: PriceBreakdown {
                nights: range.nights(),
                base_price: dec!(100) * rust_decimal::Decimal::from(range.nights()),
                cleaning_fee: dec!(0),
                service_fee: dec!(0),
                total: dec!(100) * rust_decimal::Decimal::from(range.nights()),
            },
        }
    }

    #[test]
    fn empty_listing_is_available() {
        let proposed = range((2024, 6, 7), (2024, 6, 10));
        assert!(is_range_available(&[], &proposed));
    }

    #[test]
    fn active_overlap_blocks() {
        let existing = vec![booking(
            range((2024, 6, 7), (2024, 6, 10)),
            BookingStatus::Confirmed,
        )];
        let proposed = range((2024, 6, 9), (2024, 6, 12));

        assert!(!is_range_available(&existing, &proposed));
        let conflict = first_conflict(&existing, &proposed).expect("conflict reported");
        assert_eq!(conflict.reference, existing[0].reference);
    }

    #[test]
    fn pending_bookings_block_too() {
        let existing = vec![booking(
            range((2024, 6, 7), (2024, 6, 10)),
            BookingStatus::Pending,
        )];
        assert!(!is_range_available(&existing, &range((2024, 6, 8), (2024, 6, 9))));
    }

    #[test]
    fn adjacent_checkout_and_checkin_coexist() {
        let existing = vec![booking(
            range((2024, 6, 7), (2024, 6, 10)),
            BookingStatus::Confirmed,
        )];
        // New stay starts on the existing checkout day.
        assert!(is_range_available(&existing, &range((2024, 6, 10), (2024, 6, 13))));
        // And one ending on the existing check-in day.
        assert!(is_range_available(&existing, &range((2024, 6, 4), (2024, 6, 7))));
    }

    #[test]
    fn canceled_and_completed_do_not_block() {
        let existing = vec![
            booking(range((2024, 6, 7), (2024, 6, 10)), BookingStatus::Canceled),
            booking(range((2024, 6, 8), (2024, 6, 11)), BookingStatus::Completed),
        ];
        assert!(is_range_available(&existing, &range((2024, 6, 7), (2024, 6, 11))));
        assert!(first_conflict(&existing, &range((2024, 6, 7), (2024, 6, 11))).is_none());
    }
}
