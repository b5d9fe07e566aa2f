//! Sink implementations
//!
//! Contains StdoutSink, MqttSink, and PrometheusSink.

mod mqtt;
mod prometheus;
mod stdout;

pub use self::mqtt::MqttSink;
pub use self::prometheus::PrometheusSink;
pub use self::stdout::StdoutSink;

use contracts::{BridgeConfig, OutputSink};

/// The available set: every sink compiled into the program, constructed from
/// its configuration section. An explicit table, fixed for the process
/// lifetime; activation picks the subset named in `config.outputs`.
pub fn available_sinks(config: &BridgeConfig) -> Vec<Box<dyn OutputSink>> {
    vec![
        Box::new(StdoutSink::new(&config.stdout)),
        Box::new(MqttSink::new(&config.mqtt)),
        Box::new(PrometheusSink::new(&config.prometheus)),
    ]
}
