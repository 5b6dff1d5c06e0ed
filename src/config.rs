//! # Driver Configuration
//!
//! `DriverParams` holds everything a device instance is created with. It is
//! plain data, serializable with serde so a deployment can keep it in a
//! JSON file:
//!
//! ```json
//! {
//!   "band": "ghz2p4",
//!   "channel": 15,
//!   "pan_id": 35,
//!   "tx_power_dbm": 3,
//!   "csma": { "tries": 4 },
//!   "tx_wait": { "mode": "spin", "max_spins": 5000 }
//! }
//! ```
//!
//! Missing fields take their defaults.

use crate::constants::{
    DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_TX_SPIN_LIMIT, IEEE802154_DEFAULT_PANID, MAX_LBT_TRIES,
};
use crate::radio::hal::{Band, CsmaConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid parameter: {0}")]
    Invalid(String),
}

/// How `send` waits for the radio
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TxWait {
    /// Return after submission; completion arrives as an event
    #[default]
    Async,
    /// Spin while the radio reports tx, at most `max_spins` times
    Spin { max_spins: u32 },
}

impl TxWait {
    pub fn spin() -> Self {
        TxWait::Spin {
            max_spins: DEFAULT_TX_SPIN_LIMIT,
        }
    }
}

/// Parameters of one driver instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverParams {
    /// Frequency band the radio is configured for
    pub band: Band,
    /// Channel override; the band default when absent
    pub channel: Option<u8>,
    pub pan_id: u16,
    /// Output power in dBm
    pub tx_power_dbm: i16,
    pub csma: CsmaConfig,
    /// Depth of the event queue in records
    pub queue_capacity: usize,
    pub tx_wait: TxWait,
    pub auto_ack: bool,
    pub promiscuous: bool,
    /// Replaces the radio's factory identity when set
    pub eui64: Option<[u8; 8]>,
}

impl Default for DriverParams {
    fn default() -> Self {
        Self {
            band: Band::Ghz2p4,
            channel: None,
            pan_id: IEEE802154_DEFAULT_PANID,
            tx_power_dbm: 0,
            csma: CsmaConfig::default(),
            queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            tx_wait: TxWait::Async,
            auto_ack: true,
            promiscuous: false,
            eui64: None,
        }
    }
}

impl DriverParams {
    /// Defaults for another band
    pub fn for_band(band: Band) -> Self {
        Self {
            band,
            ..Self::default()
        }
    }

    /// Channel the device starts on
    pub fn channel(&self) -> u8 {
        self.channel.unwrap_or_else(|| self.band.default_channel())
    }

    /// Check the parameters for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.csma.tries > MAX_LBT_TRIES {
            return Err(ConfigError::Invalid(format!(
                "csma tries {} exceeds {}",
                self.csma.tries, MAX_LBT_TRIES
            )));
        }
        if self.csma.min_backoff_exp > self.csma.max_backoff_exp {
            return Err(ConfigError::Invalid(format!(
                "csma backoff exponents inverted ({} > {})",
                self.csma.min_backoff_exp, self.csma.max_backoff_exp
            )));
        }
        if let Some(channel) = self.channel {
            if !self.band.is_valid_channel(channel) {
                return Err(ConfigError::Invalid(format!(
                    "channel {} not in {} band {:?}",
                    channel,
                    self.band,
                    self.band.channels()
                )));
            }
        }
        Ok(())
    }

    /// Load and validate parameters from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let params: DriverParams = serde_json::from_str(&json)?;
        params.validate()?;
        Ok(params)
    }

    /// Save parameters as pretty-printed JSON
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DriverParams::default();
        assert_eq!(params.channel(), 26);
        assert_eq!(params.pan_id, 0x0023);
        assert_eq!(params.queue_capacity, 16);
        assert_eq!(params.csma.tries, 5);
        assert!(params.validate().is_ok());

        assert_eq!(DriverParams::for_band(Band::Mhz868).channel(), 0);
        assert_eq!(DriverParams::for_band(Band::Mhz915).channel(), 1);
    }

    #[test]
    fn test_validate_rejects() {
        let params = DriverParams {
            queue_capacity: 0,
            ..DriverParams::default()
        };
        assert!(matches!(params.validate(), Err(ConfigError::Invalid(_))));

        let params = DriverParams {
            channel: Some(5),
            ..DriverParams::default()
        };
        assert!(params.validate().is_err());

        let mut params = DriverParams::default();
        params.csma.tries = 16;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{ "band": "mhz915", "channel": 7, "csma": { "tries": 2 },
                        "tx_wait": { "mode": "spin", "max_spins": 10 } }"#;
        let params: DriverParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.band, Band::Mhz915);
        assert_eq!(params.channel(), 7);
        assert_eq!(params.csma.tries, 2);
        assert_eq!(params.csma.max_backoff_exp, 5);
        assert_eq!(params.tx_wait, TxWait::Spin { max_spins: 10 });
        assert!(params.auto_ack);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rail.json");

        let params = DriverParams {
            channel: Some(15),
            eui64: Some([1, 2, 3, 4, 5, 6, 7, 8]),
            tx_wait: TxWait::spin(),
            ..DriverParams::default()
        };
        params.to_json_file(&path).unwrap();
        assert_eq!(DriverParams::from_json_file(&path).unwrap(), params);
    }

    #[test]
    fn test_invalid_file_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "channel": 40 }"#).unwrap();
        assert!(matches!(
            DriverParams::from_json_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            DriverParams::from_json_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
