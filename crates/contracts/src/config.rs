//! BridgeConfig - Config Loader output
//!
//! Describes a complete run: device settings, tags, and the ordered list of
//! sinks to activate together with each sink's own section.

use serde::{Deserialize, Serialize};

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Free-form tags copied into every Sample of the run.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Ordered list of sink names to activate. Names not matching an
    /// available sink are silently ignored.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Serial device settings.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Stdout sink settings.
    #[serde(default)]
    pub stdout: StdoutConfig,

    /// MQTT sink settings.
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Prometheus sink settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// Serial device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial port path. `None` selects the device by USB vendor/product
    /// identifiers.
    #[serde(default)]
    pub port: Option<String>,

    /// Baud rate.
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Read timeout during steady-state streaming, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud: default_baud(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

fn default_baud() -> u32 {
    115200
}

fn default_read_timeout_secs() -> u64 {
    10
}

/// Stdout sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StdoutConfig {
    /// Minimum interval between emitted samples, in seconds. 0 emits every
    /// sample.
    #[serde(default)]
    pub interval_secs: u64,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self { interval_secs: 0 }
    }
}

/// MQTT sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host.
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    /// Broker port.
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Publish topic.
    #[serde(default = "default_mqtt_topic")]
    pub topic: String,

    /// Client identifier.
    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,

    /// Quality of service (0, 1 or 2).
    #[serde(default)]
    pub qos: u8,

    /// Publish with the retain flag.
    #[serde(default)]
    pub retain: bool,

    /// Optional broker credentials.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            topic: default_mqtt_topic(),
            client_id: default_mqtt_client_id(),
            qos: 0,
            retain: false,
            username: None,
            password: None,
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    "sensor/udco2s".to_string()
}

fn default_mqtt_client_id() -> String {
    "co2-bridge".to_string()
}

/// Prometheus sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Port for the metrics HTTP listener.
    #[serde(default = "default_prometheus_port")]
    pub port: u16,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            port: default_prometheus_port(),
        }
    }
}

fn default_prometheus_port() -> u16 {
    9090
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.device.baud, 115200);
        assert_eq!(config.device.read_timeout_secs, 10);
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.prometheus.port, 9090);
        assert!(config.outputs.is_empty());
    }
}
