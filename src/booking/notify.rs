//! Outbound notification seam.
//!
//! The engine reports every successful mutation to an injected port; what
//! happens next (emails, in-app feeds) lives entirely outside this crate.
//! The engine's calls are the only publish path, so a recording port in
//! tests sees the complete event stream.

use rust_decimal::Decimal;
use ulid::Ulid;

use crate::booking::lifecycle::Actor;
use crate::booking::model::{BookingStatus, DateRange};

/// Something the surrounding application may want to tell people about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingEvent {
    /// A guest asked for a stay; the booking is pending host review.
    Requested {
        reference: Ulid,
        listing_id: Ulid,
        range: DateRange,
        total: Decimal,
    },
    /// A booking moved between lifecycle states.
    StatusChanged {
        reference: Ulid,
        listing_id: Ulid,
        from: BookingStatus,
        to: BookingStatus,
        by: Actor,
    },
}

/// Receives booking events. Implementations must tolerate being called from
/// whatever thread took the booking; publishing is fire-and-forget.
pub trait NotificationPort: Send + Sync {
    fn publish(&self, event: &BookingEvent);
}

/// Swallows every event, for callers that dispatch notifications themselves.
#[derive(Debug, Default)]
pub struct NullNotifier;

impl NotificationPort for NullNotifier {
    fn publish(&self, _event: &BookingEvent) {}
}

/// Emits one structured tracing record per event; what the HTTP service wires
/// in so operators can follow booking traffic in the logs.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl NotificationPort for LogNotifier {
    fn publish(&self, event: &BookingEvent) {
        match event {
            BookingEvent::Requested {
                reference,
                listing_id,
                range,
                total,
            } => {
                tracing::info!(%reference, %listing_id, %range, %total, "booking requested");
            }
            BookingEvent::StatusChanged {
                reference,
                listing_id,
                from,
                to,
                by,
            } => {
                tracing::info!(
                    %reference,
                    %listing_id,
                    from = from.as_str(),
                    to = to.as_str(),
                    by = %by,
                    "booking status changed"
                );
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;
    use std::sync::Arc;

    #[test]
    fn port_is_object_safe_and_records() {
        let recorder = Arc::new(RecordingNotifier::default());
        let port: Arc<dyn NotificationPort> = recorder.clone();

        let event = BookingEvent::StatusChanged {
            reference: Ulid::new(),
            listing_id: Ulid::new(),
            from: BookingStatus::Pending,
            to: BookingStatus::Confirmed,
            by: Actor::Host,
        };
        port.publish(&event);

        assert_eq!(recorder.events(), vec![event]);
    }

    #[test]
    fn null_notifier_drops_everything() {
        let port = NullNotifier;
        port.publish(&BookingEvent::StatusChanged {
            reference: Ulid::new(),
            listing_id: Ulid::new(),
            from: BookingStatus::Pending,
            to: BookingStatus::Canceled,
            by: Actor::Guest,
        });
    }
}
