//! Configuration validation
//!
//! Rules:
//! - outputs non-empty
//! - baud > 0, read_timeout_secs > 0
//! - mqtt.qos <= 2, mqtt.topic non-empty when mqtt is selected

use contracts::{BridgeConfig, BridgeError};

/// Validate a BridgeConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &BridgeConfig) -> Result<(), BridgeError> {
    validate_outputs(config)?;
    validate_device(config)?;
    validate_mqtt(config)?;
    Ok(())
}

fn validate_outputs(config: &BridgeConfig) -> Result<(), BridgeError> {
    if config.outputs.is_empty() {
        return Err(BridgeError::config_validation(
            "outputs",
            "at least one output sink must be configured",
        ));
    }
    Ok(())
}

fn validate_device(config: &BridgeConfig) -> Result<(), BridgeError> {
    if config.device.baud == 0 {
        return Err(BridgeError::config_validation(
            "device.baud",
            "baud rate must be > 0",
        ));
    }
    if config.device.read_timeout_secs == 0 {
        return Err(BridgeError::config_validation(
            "device.read_timeout_secs",
            "read timeout must be > 0",
        ));
    }
    Ok(())
}

fn validate_mqtt(config: &BridgeConfig) -> Result<(), BridgeError> {
    // Only enforced when the mqtt sink is actually selected.
    if !config.outputs.iter().any(|o| o.eq_ignore_ascii_case("mqtt")) {
        return Ok(());
    }
    if config.mqtt.topic.is_empty() {
        return Err(BridgeError::config_validation(
            "mqtt.topic",
            "topic must not be empty",
        ));
    }
    if config.mqtt.qos > 2 {
        return Err(BridgeError::config_validation(
            "mqtt.qos",
            format!("qos must be 0, 1 or 2, got {}", config.mqtt.qos),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::BridgeConfig;

    fn base_config() -> BridgeConfig {
        BridgeConfig {
            outputs: vec!["stdout".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_empty_outputs_rejected() {
        let mut config = base_config();
        config.outputs.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("outputs"));
    }

    #[test]
    fn test_zero_baud_rejected() {
        let mut config = base_config();
        config.device.baud = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_mqtt_rules_only_when_selected() {
        let mut config = base_config();
        config.mqtt.qos = 7;
        // mqtt not in outputs: invalid qos is tolerated
        assert!(validate(&config).is_ok());

        config.outputs.push("mqtt".to_string());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("qos"));
    }

    #[test]
    fn test_mqtt_empty_topic_rejected() {
        let mut config = base_config();
        config.outputs.push("MQTT".to_string());
        config.mqtt.topic.clear();
        assert!(validate(&config).is_err());
    }
}
