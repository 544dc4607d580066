//! Front-panel indicator manager.
//!
//! Turns high-level device events into LED output: steady on/off, timed
//! blink patterns with finite or infinite repetition, single-use
//! save/restore for pre-emption, and short brightness flares.  The
//! manager additionally folds independent error conditions into a single
//! edge-triggered error signal.
//!
//! All ESP-IDF-specific code is behind the `espidf` feature on an ESP-IDF target
//! so the core builds and tests on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod indicator;
pub mod manager;
pub mod patterns;

pub use error::{Error, Result};
pub use indicator::{Indicator, IndicatorState, REPEAT_FOREVER};
pub use manager::LedManager;
pub use patterns::{BlinkPattern, BlinkStep, PatternKind};
