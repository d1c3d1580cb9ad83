//! Booking availability, pricing, and lifecycle engine for a rental
//! marketplace.
//!
//! The engine is invoked as a library: callers hand it listings and
//! reservation requests and persist what comes back. The companion binary
//! fronts it with a CLI and a small JSON service for the endpoints the
//! marketplace exposes.

pub mod booking;
pub mod config;
pub mod error;
pub mod telemetry;
