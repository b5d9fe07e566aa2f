//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are
//! prohibited.
//!
//! ## Time Model
//! - `Sample.timestamp` is the capture instant recorded when a telemetry line
//!   is parsed, not when the device emitted it.

mod config;
mod error;
mod sample;
mod sink;

pub use config::*;
pub use error::*;
pub use sample::Sample;
pub use sink::{DeactivateReceiver, DeactivateSender, OutputSink, SinkContext};
