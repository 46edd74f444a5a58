//! # amberwatch - Amber Electric price sensors
//!
//! Polls the Amber Electric price API for one postcode and exposes the
//! current and next interval of both tariff directions as sensors.
//!
//! ## Architecture
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `amber`: Price API types, timestamp handling and HTTP client
//! - `selector`: Current/next interval selection
//! - `poller`: Periodic refresh and shared poll state
//! - `sensors`: Sensor definitions and readings
//! - `web`: HTTP read API

pub mod amber;
pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod selector;
pub mod sensors;
pub mod web;

// Re-export commonly used types
pub use amber::{AmberClient, Direction, Snapshot};
pub use config::Config;
pub use error::{AmberError, Result};
pub use poller::{PollState, PriceSource, PricePoller};
pub use selector::{Selection, select, select_at};
