//! The booking status state machine.
//!
//! `pending → confirmed | canceled`, `confirmed → canceled | completed`;
//! `canceled` and `completed` are terminal. Transitions are validated against
//! the acting party and the cancellation policy; persistence and side effects
//! belong to the caller.

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;

use crate::booking::error::BookingError;
use crate::booking::model::{Booking, BookingStatus};

/// Who is asking for a transition. The role is asserted by the caller;
/// resolving identities to roles is the surrounding application's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Host,
    Guest,
    System,
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Actor::Host => "host",
            Actor::Guest => "guest",
            Actor::System => "system",
        })
    }
}

/// How close to check-in a guest may still cancel a confirmed booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    /// Check-in must be strictly more than this many days away.
    pub window_days: i64,
}

impl CancellationPolicy {
    pub const DEFAULT_WINDOW_DAYS: i64 = 2;

    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    /// True when a guest may still cancel a confirmed booking today.
    pub fn permits_guest_cancellation(&self, check_in: NaiveDate, today: NaiveDate) -> bool {
        (check_in - today).num_days() > self.window_days
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_DAYS)
    }
}

/// Validate a status transition without applying it.
///
/// Returns the new status when the edge is legal for the acting party, or an
/// `IllegalStatusTransition` naming the rule that blocked it. `today` anchors
/// the time-dependent guards (cancellation window, stay end).
pub fn transition(
    booking: &Booking,
    target: BookingStatus,
    actor: Actor,
    today: NaiveDate,
    policy: &CancellationPolicy,
) -> Result<BookingStatus, BookingError> {
    use BookingStatus::{Canceled, Completed, Confirmed, Pending};

    let from = booking.status;
    let illegal = |reason: String| BookingError::IllegalStatusTransition {
        from,
        attempted: target,
        reason,
    };

    match (from, target) {
        (Pending, Confirmed) => match actor {
            Actor::Host => Ok(Confirmed),
            other => Err(illegal(format!(
                "only the listing host may confirm a booking, not the {other}"
            ))),
        },
        (Pending, Canceled) => match actor {
            Actor::Host | Actor::Guest => Ok(Canceled),
            Actor::System => Err(illegal(
                "a pending booking is withdrawn by the guest or declined by the host".into(),
            )),
        },
        (Confirmed, Canceled) => match actor {
            Actor::Host => Ok(Canceled),
            Actor::Guest => {
                let check_in = booking.range.start();
                if policy.permits_guest_cancellation(check_in, today) {
                    Ok(Canceled)
                } else {
                    Err(illegal(format!(
                        "check-in on {check_in} is {} day(s) away; guests may cancel only \
                         more than {} days before check-in",
                        (check_in - today).num_days(),
                        policy.window_days,
                    )))
                }
            }
            Actor::System => Err(illegal(
                "a confirmed booking is canceled by the host or the guest".into(),
            )),
        },
        (Confirmed, Completed) => match actor {
            Actor::System => {
                if today < booking.range.end() {
                    Err(illegal("the stay has not ended yet".into()))
                } else {
                    Ok(Completed)
                }
            }
            other => Err(illegal(format!(
                "completion is recorded by the system after checkout, not by the {other}"
            ))),
        },
        (from, target) if from == target => {
            Err(illegal("the booking is already in that state".into()))
        }
        (Canceled, _) | (Completed, _) => {
            Err(illegal("the booking is in a terminal state".into()))
        }
        _ => Err(illegal("no such transition exists".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::model::{DateRange, PriceBreakdown};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use ulid::Ulid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn booking_with(status: BookingStatus, check_in: NaiveDate, nights: i64) -> Booking {
        let range =
            DateRange::new(check_in, check_in + Duration::days(nights)).expect("valid range");
        Booking {
            reference: Ulid::new(),
            listing_id: Ulid::new(),
            guest: "guest-sam".into(),
            guests: 2,
            range,
            status,
            price: PriceBreakdown {
                nights,
                base_price: dec!(100),
                cleaning_fee: dec!(0),
                service_fee: dec!(0),
                total: dec!(100),
            },
        }
    }

    fn policy() -> CancellationPolicy {
        CancellationPolicy::default()
    }

    #[test]
    fn host_confirms_a_pending_booking() {
        let today = date(2024, 6, 1);
        let booking = booking_with(BookingStatus::Pending, date(2024, 6, 10), 3);

        assert_eq!(
            transition(&booking, BookingStatus::Confirmed, Actor::Host, today, &policy()),
            Ok(BookingStatus::Confirmed)
        );
        assert!(matches!(
            transition(&booking, BookingStatus::Confirmed, Actor::Guest, today, &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
        assert!(matches!(
            transition(&booking, BookingStatus::Confirmed, Actor::System, today, &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
    }

    #[test]
    fn either_party_cancels_a_pending_booking_freely() {
        // Check-in tomorrow: inside the confirmed-cancellation window, but a
        // pending request can still be withdrawn or declined.
        let today = date(2024, 6, 9);
        let booking = booking_with(BookingStatus::Pending, date(2024, 6, 10), 3);

        for actor in [Actor::Host, Actor::Guest] {
            assert_eq!(
                transition(&booking, BookingStatus::Canceled, actor, today, &policy()),
                Ok(BookingStatus::Canceled)
            );
        }
        assert!(matches!(
            transition(&booking, BookingStatus::Canceled, Actor::System, today, &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
    }

    #[test]
    fn guest_cancellation_respects_the_window() {
        let policy = policy();
        let today = date(2024, 6, 9);

        // Check-in 1 day away: rejected.
        let close = booking_with(BookingStatus::Confirmed, date(2024, 6, 10), 3);
        let err = transition(&close, BookingStatus::Canceled, Actor::Guest, today, &policy)
            .expect_err("inside the window");
        assert!(matches!(err, BookingError::IllegalStatusTransition { .. }));
        assert!(err.to_string().contains("more than 2 days"));

        // Check-in 5 days away: allowed.
        let far = booking_with(BookingStatus::Confirmed, date(2024, 6, 14), 3);
        assert_eq!(
            transition(&far, BookingStatus::Canceled, Actor::Guest, today, &policy),
            Ok(BookingStatus::Canceled)
        );

        // Exactly at the window boundary counts as inside.
        let boundary = booking_with(BookingStatus::Confirmed, date(2024, 6, 11), 3);
        assert!(transition(&boundary, BookingStatus::Canceled, Actor::Guest, today, &policy)
            .is_err());
    }

    #[test]
    fn host_cancels_a_confirmed_booking_even_late() {
        let today = date(2024, 6, 9);
        let booking = booking_with(BookingStatus::Confirmed, date(2024, 6, 10), 3);

        assert_eq!(
            transition(&booking, BookingStatus::Canceled, Actor::Host, today, &policy()),
            Ok(BookingStatus::Canceled)
        );
    }

    #[test]
    fn completion_is_system_only_and_after_checkout() {
        let booking = booking_with(BookingStatus::Confirmed, date(2024, 6, 10), 3);

        // Stay ends on the 13th; the 12th is still mid-stay.
        assert!(matches!(
            transition(&booking, BookingStatus::Completed, Actor::System, date(2024, 6, 12), &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
        assert_eq!(
            transition(&booking, BookingStatus::Completed, Actor::System, date(2024, 6, 13), &policy()),
            Ok(BookingStatus::Completed)
        );
        assert!(matches!(
            transition(&booking, BookingStatus::Completed, Actor::Host, date(2024, 6, 14), &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        let today = date(2024, 6, 20);
        for status in [BookingStatus::Canceled, BookingStatus::Completed] {
            let booking = booking_with(status, date(2024, 6, 10), 3);
            for target in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Canceled,
                BookingStatus::Completed,
            ] {
                for actor in [Actor::Host, Actor::Guest, Actor::System] {
                    assert!(matches!(
                        transition(&booking, target, actor, today, &policy()),
                        Err(BookingError::IllegalStatusTransition { .. })
                    ));
                }
            }
        }
    }

    #[test]
    fn pending_cannot_jump_to_completed() {
        let booking = booking_with(BookingStatus::Pending, date(2024, 6, 10), 3);
        assert!(matches!(
            transition(&booking, BookingStatus::Completed, Actor::System, date(2024, 6, 20), &policy()),
            Err(BookingError::IllegalStatusTransition { .. })
        ));
    }

    #[test]
    fn self_transitions_are_rejected() {
        let booking = booking_with(BookingStatus::Confirmed, date(2024, 6, 10), 3);
        let err = transition(
            &booking,
            BookingStatus::Confirmed,
            Actor::Host,
            date(2024, 6, 1),
            &policy(),
        )
        .expect_err("no-op transition");
        assert!(err.to_string().contains("already in that state"));
    }
}
