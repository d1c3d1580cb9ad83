//! The stateful registry around the availability, pricing, and lifecycle
//! rules.
//!
//! Every mutation runs under one write lock, so checking availability and
//! inserting the booking happen in the same critical section: of two
//! concurrent attempts to book overlapping ranges, exactly one wins and the
//! other sees `DateRangeUnavailable`. There is no public path that checks
//! first and inserts later.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use ulid::Ulid;

use crate::booking::availability;
use crate::booking::error::BookingError;
use crate::booking::lifecycle::{self, Actor, CancellationPolicy};
use crate::booking::model::{
    Booking, BookingStatus, DateRange, Listing, ListingDraft, PriceBreakdown,
};
use crate::booking::notify::{BookingEvent, NotificationPort, NullNotifier};
use crate::booking::pricing;

/// Input for creating a booking.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub guest: String,
    pub guests: u32,
    pub range: DateRange,
}

/// A listing together with every booking taken against it.
#[derive(Debug, Clone)]
struct ListingRecord {
    listing: Listing,
    bookings: Vec<Booking>,
}

#[derive(Default)]
struct EngineState {
    listings: HashMap<Ulid, ListingRecord>,
    /// Listing ids in registration order. Ids minted in the same millisecond
    /// do not sort chronologically, so enumeration cannot lean on id order.
    registration_order: Vec<Ulid>,
    /// Booking reference → owning listing.
    references: HashMap<Ulid, Ulid>,
}

pub struct BookingEngine {
    state: RwLock<EngineState>,
    policy: CancellationPolicy,
    notifier: Arc<dyn NotificationPort>,
}

impl Default for BookingEngine {
    /// Default policy, notifications dropped.
    fn default() -> Self {
        Self::new(CancellationPolicy::default(), Arc::new(NullNotifier))
    }
}

impl BookingEngine {
    pub fn new(policy: CancellationPolicy, notifier: Arc<dyn NotificationPort>) -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            policy,
            notifier,
        }
    }

    /// Validate a draft and register it under a fresh id.
    pub fn register_listing(&self, draft: ListingDraft) -> Result<Listing, BookingError> {
        let listing = draft.into_listing(Ulid::new())?;

        let mut state = self.state.write().expect("engine lock poisoned");
        state.registration_order.push(listing.id);
        state.listings.insert(
            listing.id,
            ListingRecord {
                listing: listing.clone(),
                bookings: Vec::new(),
            },
        );
        drop(state);

        tracing::info!(listing_id = %listing.id, name = %listing.name, "listing registered");
        Ok(listing)
    }

    pub fn listing(&self, id: Ulid) -> Result<Listing, BookingError> {
        let state = self.state.read().expect("engine lock poisoned");
        state
            .listings
            .get(&id)
            .map(|record| record.listing.clone())
            .ok_or(BookingError::UnknownListing(id))
    }

    /// All registered listings, oldest first.
    pub fn listings(&self) -> Vec<Listing> {
        let state = self.state.read().expect("engine lock poisoned");
        state
            .registration_order
            .iter()
            .filter_map(|id| state.listings.get(id))
            .map(|record| record.listing.clone())
            .collect()
    }

    /// Whether the range is free of active bookings on this listing.
    pub fn is_available(&self, listing_id: Ulid, range: &DateRange) -> Result<bool, BookingError> {
        let state = self.state.read().expect("engine lock poisoned");
        let record = state
            .listings
            .get(&listing_id)
            .ok_or(BookingError::UnknownListing(listing_id))?;
        Ok(availability::is_range_available(&record.bookings, range))
    }

    /// Price the stay against the listing's current rates and stay bounds.
    pub fn quote(&self, listing_id: Ulid, range: &DateRange) -> Result<PriceBreakdown, BookingError> {
        let state = self.state.read().expect("engine lock poisoned");
        let record = state
            .listings
            .get(&listing_id)
            .ok_or(BookingError::UnknownListing(listing_id))?;
        pricing::quote(&record.listing, range)
    }

    /// Create a booking, holding the write lock across the availability
    /// check and the insert.
    ///
    /// Stay bounds and party size are checked before the availability scan,
    /// so a too-short stay is reported as such even when the dates are also
    /// taken. The new booking starts `pending`.
    pub fn reserve(
        &self,
        listing_id: Ulid,
        request: ReservationRequest,
    ) -> Result<Booking, BookingError> {
        let booking = {
            let mut state = self.state.write().expect("engine lock poisoned");
            let record = state
                .listings
                .get_mut(&listing_id)
                .ok_or(BookingError::UnknownListing(listing_id))?;

            let price = pricing::quote(&record.listing, &request.range)?;
            if request.guests > record.listing.accommodates {
                return Err(BookingError::GuestCountExceedsCapacity {
                    guests: request.guests,
                    accommodates: record.listing.accommodates,
                });
            }
            if let Some(conflict) =
                availability::first_conflict(&record.bookings, &request.range)
            {
                tracing::debug!(
                    %listing_id,
                    conflict = %conflict.reference,
                    requested = %request.range,
                    "reservation rejected: dates taken"
                );
                return Err(BookingError::DateRangeUnavailable {
                    start: request.range.start(),
                    end: request.range.end(),
                });
            }

            let booking = Booking {
                reference: Ulid::new(),
                listing_id,
                guest: request.guest,
                guests: request.guests,
                range: request.range,
                status: BookingStatus::Pending,
                price,
            };
            record.bookings.push(booking.clone());
            state.references.insert(booking.reference, listing_id);
            booking
        };

        self.notifier.publish(&BookingEvent::Requested {
            reference: booking.reference,
            listing_id,
            range: booking.range,
            total: booking.price.total,
        });
        Ok(booking)
    }

    /// Move a booking to `target`, enforcing the lifecycle rules, then report
    /// the change to the notification port.
    ///
    /// `today` anchors the time-dependent guards; callers pass it explicitly
    /// rather than the engine reading a clock.
    pub fn transition(
        &self,
        reference: Ulid,
        target: BookingStatus,
        actor: Actor,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        let (booking, from) = {
            let mut state = self.state.write().expect("engine lock poisoned");
            let listing_id = *state
                .references
                .get(&reference)
                .ok_or(BookingError::UnknownBooking(reference))?;
            let record = state
                .listings
                .get_mut(&listing_id)
                .ok_or(BookingError::UnknownListing(listing_id))?;
            let booking = record
                .bookings
                .iter_mut()
                .find(|booking| booking.reference == reference)
                .ok_or(BookingError::UnknownBooking(reference))?;

            let from = booking.status;
            booking.status = lifecycle::transition(booking, target, actor, today, &self.policy)?;
            (booking.clone(), from)
        };

        self.notifier.publish(&BookingEvent::StatusChanged {
            reference,
            listing_id: booking.listing_id,
            from,
            to: booking.status,
            by: actor,
        });
        Ok(booking)
    }

    /// Host acceptance of a pending booking.
    pub fn confirm(
        &self,
        reference: Ulid,
        actor: Actor,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        self.transition(reference, BookingStatus::Confirmed, actor, today)
    }

    /// Cancellation by either party, window permitting.
    pub fn cancel(
        &self,
        reference: Ulid,
        actor: Actor,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        self.transition(reference, BookingStatus::Canceled, actor, today)
    }

    /// Close out a confirmed stay once it has ended. Driven by an external
    /// batch job, hence a system-actor call.
    pub fn complete(
        &self,
        reference: Ulid,
        actor: Actor,
        today: NaiveDate,
    ) -> Result<Booking, BookingError> {
        self.transition(reference, BookingStatus::Completed, actor, today)
    }

    pub fn booking(&self, reference: Ulid) -> Result<Booking, BookingError> {
        let state = self.state.read().expect("engine lock poisoned");
        let listing_id = state
            .references
            .get(&reference)
            .ok_or(BookingError::UnknownBooking(reference))?;
        state
            .listings
            .get(listing_id)
            .and_then(|record| {
                record
                    .bookings
                    .iter()
                    .find(|booking| booking.reference == reference)
            })
            .cloned()
            .ok_or(BookingError::UnknownBooking(reference))
    }

    /// Every booking ever taken against the listing, oldest first.
    pub fn bookings_for_listing(&self, listing_id: Ulid) -> Result<Vec<Booking>, BookingError> {
        let state = self.state.read().expect("engine lock poisoned");
        state
            .listings
            .get(&listing_id)
            .map(|record| record.bookings.clone())
            .ok_or(BookingError::UnknownListing(listing_id))
    }
}
