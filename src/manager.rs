//! Indicator manager.
//!
//! Owns the indicators, the pattern catalog, the device power flag and the
//! aggregate error bitmask.  The power flag and the error mask each sit
//! behind their own lock, and neither lock is held while calling into an
//! indicator, so manager and indicator locks never nest.
//!
//! ## Error aggregation
//!
//! Independent error conditions (gateway lost, tuner failure, ...) each own
//! one bit.  [`LedManager::set_error`] reports a transition only when the
//! mask crosses between zero and non-zero:
//!
//! ```text
//! 0b00 ──set(0)──▶ 0b01   transition (entered error state)
//! 0b01 ──set(1)──▶ 0b11   no transition
//! 0b11 ─clear(0)─▶ 0b10   no transition
//! 0b10 ─clear(1)─▶ 0b00   transition (left error state)
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use heapless::Vec;
use log::{debug, error, info};

use crate::app::ports::{IndicatorHal, TimerService};
use crate::config::{MAX_INDICATORS, ManagerConfig};
use crate::error::{ManagerError, Result};
use crate::indicator::Indicator;
use crate::patterns::{BlinkPattern, PatternCatalog, PatternKind};

/// Width of the error bitmask.
pub const MAX_ERROR_POSITIONS: u32 = u32::BITS;

/// Device-wide indicator controller.
pub struct LedManager {
    indicators: Vec<Arc<Indicator>, MAX_INDICATORS>,
    catalog: PatternCatalog,
    timer: Arc<dyn TimerService>,
    fallback_brightness: u8,
    powered_on: Mutex<bool>,
    error_flags: Mutex<u32>,
}

impl LedManager {
    /// Empty manager with a populated pattern catalog.
    pub fn new(timer: Arc<dyn TimerService>, config: &ManagerConfig) -> Self {
        Self {
            indicators: Vec::new(),
            catalog: PatternCatalog::new(),
            timer,
            fallback_brightness: config.fallback_brightness,
            powered_on: Mutex::new(config.initial_power_state),
            error_flags: Mutex::new(0),
        }
    }

    /// Build a manager and bind one indicator per configured name.
    ///
    /// `open` maps a configured name to the platform HAL for it.
    pub fn from_config<F>(
        timer: Arc<dyn TimerService>,
        config: &ManagerConfig,
        mut open: F,
    ) -> Result<Self>
    where
        F: FnMut(&str) -> Result<Box<dyn IndicatorHal>>,
    {
        config.validate()?;
        let mut manager = Self::new(timer, config);
        for name in &config.indicators {
            let hal = open(name.as_str())?;
            manager.add_indicator(hal)?;
        }
        info!("LedManager: {} indicator(s) ready", manager.indicators.len());
        Ok(manager)
    }

    /// Bind an additional indicator.
    pub fn add_indicator(&mut self, hal: Box<dyn IndicatorHal>) -> Result<Arc<Indicator>> {
        let indicator = Indicator::new(hal, Arc::clone(&self.timer), self.fallback_brightness);
        self.indicators
            .push(Arc::clone(&indicator))
            .map_err(|_| ManagerError::TooManyIndicators)?;
        Ok(indicator)
    }

    // ── Indicators & patterns ─────────────────────────────────

    /// Look up an indicator by name.  A miss is a configuration error.
    pub fn get_indicator(&self, name: &str) -> Result<&Arc<Indicator>> {
        self.indicators
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| {
                error!("No matching indicator found for '{}'", name);
                ManagerError::IndicatorNotFound.into()
            })
    }

    pub fn indicators(&self) -> &[Arc<Indicator>] {
        &self.indicators
    }

    /// Rebuild the catalog with the canonical patterns.
    pub fn create_patterns(&mut self) {
        self.catalog.create_patterns();
    }

    pub fn get_pattern(&self, kind: PatternKind) -> Arc<BlinkPattern> {
        self.catalog.get_pattern(kind)
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Dump the catalog to the log.
    pub fn diagnostics(&self) {
        info!("Size of the pattern list is {}", self.catalog.len());
        for pattern in self.catalog.iter() {
            info!(
                "  {:?} -- {} steps -- {} ms period",
                pattern.id(),
                pattern.len(),
                pattern.period_ms()
            );
        }
        for indicator in &self.indicators {
            debug!("  {} -- {:?}", indicator.name(), indicator.status());
        }
    }

    // ── Power state ───────────────────────────────────────────

    pub fn set_power_state(&self, on: bool) {
        *self.powered_on.lock().unwrap_or_else(PoisonError::into_inner) = on;
        info!("LedManager: power state -> {}", if on { "ON" } else { "OFF" });
    }

    pub fn power_state(&self) -> bool {
        *self.powered_on.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Error aggregation ─────────────────────────────────────

    /// Set or clear error bit `position`.
    ///
    /// Returns `Ok(true)` only when the aggregate mask crosses between zero
    /// and non-zero.  Callers use this to switch between the error
    /// indication and the normal one.
    pub fn set_error(&self, position: u32, value: bool) -> Result<bool> {
        if position >= MAX_ERROR_POSITIONS {
            error!("Position marker {} too large!", position);
            return Err(ManagerError::ErrorPositionOutOfRange(position).into());
        }
        let bit = 1u32 << position;
        let mut flags = self.error_flags.lock().unwrap_or_else(PoisonError::into_inner);
        let previous = *flags;
        let transitioned = if value {
            *flags |= bit;
            previous == 0
        } else {
            *flags &= !bit;
            previous != 0 && *flags == 0
        };
        if transitioned {
            info!(
                "LedManager: {} error state (flags=0x{:08x})",
                if value { "entering" } else { "leaving" },
                *flags
            );
        }
        Ok(transitioned)
    }

    /// Current error bitmask.
    pub fn error_flags(&self) -> u32 {
        *self.error_flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `true` while any error bit is set.
    pub fn in_error(&self) -> bool {
        self.error_flags() != 0
    }
}
