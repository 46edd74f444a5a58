//! Amber Electric price API integration
//!
//! The price API answers one request per location with the recent and
//! forecast intervals for both tariff directions. This module owns the
//! typed view of that answer and the HTTP client that fetches it.

pub mod client;
pub mod time;
pub mod types;

// Re-exports for the public API surface
pub use client::AmberClient;
pub use time::{NEM_TIMEZONE, parse_nem_time};
pub use types::{Descriptor, Direction, Interval, PriceGroup, PricesResponse, Snapshot};
