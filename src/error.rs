//! Unified error types for the indicator manager.
//!
//! A single `Error` enum that every subsystem converts into, so callers at
//! the event-dispatch boundary handle failures uniformly.  All variants are
//! `Copy` so they can be returned from inside a held indicator lock without
//! allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An indicator operation was rejected (caller misuse or stale state).
    Indicator(IndicatorError),
    /// A one-shot timer could not be registered.
    Schedule(ScheduleError),
    /// A manager-level request was invalid.
    Manager(ManagerError),
    /// A blink pattern could not be constructed.
    Pattern(PatternError),
    /// The hardware layer reported a fault.
    Hal(HalError),
    /// Configuration is invalid or could not be parsed.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicator(e) => write!(f, "indicator: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
            Self::Manager(e) => write!(f, "manager: {e}"),
            Self::Pattern(e) => write!(f, "pattern: {e}"),
            Self::Hal(e) => write!(f, "hal: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Indicator errors
// ---------------------------------------------------------------------------

/// Rejections from the indicator state machine.  None of these mutate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorError {
    /// `set_state` was asked for something other than steady on/off.
    UnsupportedState,
    /// `set_blink` was called with zero repetitions.
    ZeroRepetitions,
    /// The pattern has fewer than two steps.
    PatternTooShort,
    /// `restore_state` without a prior, unconsumed `save_state`.
    StaleRestore,
    /// A zero-length delay cannot be scheduled.
    ZeroDuration,
}

impl fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedState => write!(f, "unsupported state"),
            Self::ZeroRepetitions => write!(f, "zero repetitions"),
            Self::PatternTooShort => write!(f, "pattern has fewer than two steps"),
            Self::StaleRestore => write!(f, "no valid saved state to restore"),
            Self::ZeroDuration => write!(f, "zero-wait timer"),
        }
    }
}

impl From<IndicatorError> for Error {
    fn from(e: IndicatorError) -> Self {
        Self::Indicator(e)
    }
}

// ---------------------------------------------------------------------------
// Scheduling errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// The timer service refused the registration.
    RegistrationFailed,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistrationFailed => write!(f, "could not register callback"),
        }
    }
}

impl From<ScheduleError> for Error {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}

// ---------------------------------------------------------------------------
// Manager errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerError {
    /// Error bit position must be below 32.
    ErrorPositionOutOfRange(u32),
    /// No indicator registered under the requested name.
    IndicatorNotFound,
    /// The fixed-capacity indicator table is full.
    TooManyIndicators,
}

impl fmt::Display for ManagerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ErrorPositionOutOfRange(pos) => write!(f, "position marker {pos} too large"),
            Self::IndicatorNotFound => write!(f, "no matching indicator found"),
            Self::TooManyIndicators => write!(f, "indicator table full"),
        }
    }
}

impl From<ManagerError> for Error {
    fn from(e: ManagerError) -> Self {
        Self::Manager(e)
    }
}

// ---------------------------------------------------------------------------
// Pattern errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    /// More steps than a pattern can hold.
    TooManySteps,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManySteps => write!(f, "too many steps"),
        }
    }
}

impl From<PatternError> for Error {
    fn from(e: PatternError) -> Self {
        Self::Pattern(e)
    }
}

// ---------------------------------------------------------------------------
// HAL faults
// ---------------------------------------------------------------------------

/// Faults surfaced by an [`IndicatorHal`](crate::app::ports::IndicatorHal).
/// The indicator logs these and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// A write to the device failed.
    WriteFailed,
    /// A read from the device failed.
    ReadFailed,
    /// The device has no such capability (e.g. colour on a mono LED).
    Unsupported,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteFailed => write!(f, "write failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl From<HalError> for Error {
    fn from(e: HalError) -> Self {
        Self::Hal(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
