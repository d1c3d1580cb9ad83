//! Availability, pricing, and booking lifecycle for rental listings.

pub mod availability;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod pricing;
