//! Port traits: the boundary between the indicator core and the platform.
//!
//! ```text
//!   IndicatorHal ◀── Indicator ──▶ TimerService
//! ```
//!
//! The device HAL and the timer subsystem are driven adapters: the core
//! calls into them and never touches hardware or a reactor directly.
//! Both are object-safe so an indicator can own a `Box<dyn IndicatorHal>`
//! and share an `Arc<dyn TimerService>` with its siblings.

use core::num::NonZeroU32;

use crate::error::HalError;

/// Packed `0x00RRGGBB` colour value as understood by the front panel.
pub type Color = u32;

// ───────────────────────────────────────────────────────────────
// Indicator HAL (driven adapter: core → hardware)
// ───────────────────────────────────────────────────────────────

/// One physical indicator.
///
/// Every call may fail with a [`HalError`].  The indicator treats those
/// as non-fatal: it logs and keeps its own bookkeeping consistent.
pub trait IndicatorHal: Send {
    /// Name the platform knows this indicator by (e.g. `"Power"`).
    fn name(&self) -> &str;

    /// Switch the output on or off.
    fn set_state(&mut self, on: bool) -> Result<(), HalError>;

    /// Set brightness (0–100 %).  `persist` asks the platform to remember it.
    fn set_brightness(&mut self, percent: u8, persist: bool) -> Result<(), HalError>;

    /// Set colour.  `persist` asks the platform to remember it.
    fn set_color(&mut self, color: Color, persist: bool) -> Result<(), HalError>;

    /// Current brightness (0–100 %).
    fn brightness(&self) -> Result<u8, HalError>;

    /// Current colour.
    fn color(&self) -> Result<Color, HalError>;

    /// Current on/off state.
    fn state(&self) -> Result<bool, HalError>;
}

// ───────────────────────────────────────────────────────────────
// Timer service (driven adapter: core → event loop)
// ───────────────────────────────────────────────────────────────

/// Opaque handle to a registered one-shot callback.  Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(NonZeroU32);

impl TimerHandle {
    pub const fn new(raw: NonZeroU32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

/// Callback run once when its delay elapses.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot timer registration on the platform's event loop.
pub trait TimerService: Send + Sync {
    /// Schedule `callback` to run once after `delay_ms`.
    ///
    /// Returns `None` if the registration was refused.  Implementations
    /// must refuse `delay_ms == 0`.
    fn register_one_shot(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerHandle>;

    /// Remove a pending callback.  Returns `false` if it had already run or
    /// was never registered.  Must not wait for a callback that is running.
    fn cancel(&self, handle: TimerHandle) -> bool;
}
