//! # Dispatcher
//!
//! Sample fan-out module.
//!
//! Responsibilities:
//! - Consume `Sample`s and deactivation notices
//! - Fan-out to the active sink set, which shrinks at runtime
//! - Coordinate the once-only shutdown sequence

pub mod dispatch;
pub mod registry;
pub mod shutdown;
pub mod sinks;

pub use contracts::{OutputSink, Sample};
pub use dispatch::Dispatcher;
pub use registry::SinkRegistry;
pub use shutdown::{ShutdownCoordinator, EXIT_NO_DEVICE_RESPONSE};
pub use sinks::{available_sinks, MqttSink, PrometheusSink, StdoutSink};
