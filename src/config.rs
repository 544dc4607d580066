//! Manager configuration.
//!
//! Which indicators exist and the safe defaults used when the hardware
//! cannot be read.  Normally built into the image; can also be loaded
//! from a JSON document supplied by the platform, or from the compact
//! `postcard` blob produced by [`ManagerConfig::to_bytes`].

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Longest indicator name the manager accepts.
pub const MAX_NAME_LEN: usize = 24;

/// Maximum number of indicators one manager drives.
pub const MAX_INDICATORS: usize = 8;

pub type IndicatorName = String<MAX_NAME_LEN>;

const DEFAULT_INDICATORS: &[&str] = &["Power"];

/// Core manager configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Indicators to bind at startup, by platform name.
    pub indicators: Vec<IndicatorName, MAX_INDICATORS>,
    /// Brightness (0-100%) assumed when a HAL read fails.
    pub fallback_brightness: u8,
    /// Power flag before the power manager reports in.
    pub initial_power_state: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_INDICATORS
                .iter()
                .filter_map(|name| IndicatorName::try_from(*name).ok())
                .collect(),
            fallback_brightness: crate::indicator::DEFAULT_FALLBACK_BRIGHTNESS,
            initial_power_state: false,
        }
    }
}

impl ManagerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Decode and validate a stored binary blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let config: Self =
            postcard::from_bytes(bytes).map_err(|_| Error::Config("malformed config blob"))?;
        config.validate()?;
        Ok(config)
    }

    /// Compact binary form for persistent storage.
    pub fn to_bytes(&self) -> Result<std::vec::Vec<u8>, Error> {
        postcard::to_allocvec(self).map_err(|_| Error::Config("config does not serialize"))
    }

    /// Reject configurations the manager cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.indicators.is_empty() {
            return Err(Error::Config("no indicators configured"));
        }
        if self.indicators.iter().any(|n| n.is_empty()) {
            return Err(Error::Config("empty indicator name"));
        }
        for (i, name) in self.indicators.iter().enumerate() {
            if self.indicators[i + 1..].contains(name) {
                return Err(Error::Config("duplicate indicator name"));
            }
        }
        if self.fallback_brightness > 100 {
            return Err(Error::Config("fallback_brightness above 100"));
        }
        Ok(())
    }
}
