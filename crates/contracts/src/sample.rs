//! Sample - one telemetry reading from the device.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped CO2/humidity/temperature reading.
///
/// Constructed by the telemetry reader only from a line that matched the
/// telemetry pattern; partially-matched or malformed lines never produce a
/// `Sample`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Capture instant, recorded when the line was parsed (RFC 3339 on the
    /// wire).
    pub timestamp: DateTime<Utc>,

    /// CO2 concentration in parts per million.
    pub co2: u64,

    /// Relative humidity in percent.
    pub humidity: f64,

    /// Temperature in degrees Celsius, may be negative.
    pub temperature: f64,

    /// Free-form tags attached at process configuration time, shared by
    /// reference across all samples of a run.
    #[serde(default = "empty_tags", skip_serializing_if = "no_tags")]
    pub tags: Arc<[String]>,
}

impl Sample {
    /// Build a sample stamped with the current instant.
    pub fn now(co2: u64, humidity: f64, temperature: f64, tags: Arc<[String]>) -> Self {
        Self {
            timestamp: Utc::now(),
            co2,
            humidity,
            temperature,
            tags,
        }
    }
}

fn empty_tags() -> Arc<[String]> {
    Arc::from(Vec::new())
}

fn no_tags(tags: &Arc<[String]>) -> bool {
    tags.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_serializes_rfc3339_timestamp() {
        let sample = Sample::now(450, 41.2, 22.5, Arc::from(vec!["office".to_string()]));
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"co2\":450"));
        assert!(json.contains("\"tags\":[\"office\"]"));
        // RFC 3339 'T' separator in timestamp
        assert!(json.contains('T'));
    }

    #[test]
    fn test_sample_omits_empty_tags() {
        let sample = Sample::now(400, 40.0, 20.0, Arc::from(Vec::new()));
        let json = serde_json::to_string(&sample).unwrap();
        assert!(!json.contains("tags"));
    }

    #[test]
    fn test_sample_tags_shared_by_reference() {
        let tags: Arc<[String]> = Arc::from(vec!["a".to_string()]);
        let s1 = Sample::now(1, 0.0, 0.0, Arc::clone(&tags));
        let s2 = Sample::now(2, 0.0, 0.0, Arc::clone(&tags));
        assert!(Arc::ptr_eq(&s1.tags, &s2.tags));
    }
}
