//! Per-indicator blink state machine.
//!
//! ```text
//! Unknown ──▶ SteadyOff ◀──▶ SteadyOn
//!                 │              │
//!                 └──▶ Blinking ◀┘   (set_blink; set_state leaves it)
//!                       │  ▲
//!                       └──┘  step() on every timer fire
//! ```
//!
//! Each indicator owns its HAL handle, its pattern cursor, at most one
//! pending blink callback and at most one pending flare restore, all
//! behind a single mutex.  Public operations
//! take the lock once and run every internal helper (`step`, cancellation,
//! HAL writes) on the locked state, so a synchronous step started from
//! `set_blink` or `restore_state` never has to re-acquire it.
//!
//! Timer callbacks carry a generation tag.  A callback that fires after
//! it was cancelled (it was already blocked on the lock when `cancel`
//! ran) finds a different generation and does nothing, so there is never
//! more than one live timer chain per indicator.  Flare restores are
//! tagged the same way.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, error, info, warn};

use crate::app::ports::{Color, IndicatorHal, TimerHandle, TimerService};
use crate::error::{IndicatorError, Result, ScheduleError};
use crate::patterns::{BlinkPattern, PatternKind};

/// Repetition count meaning "blink until told otherwise".
pub const REPEAT_FOREVER: i32 = -1;

/// Brightness assumed when the HAL cannot report one.
pub const DEFAULT_FALLBACK_BRIGHTNESS: u8 = 20;

/// Indicator output state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    SteadyOn,
    SteadyOff,
    Blinking,
    /// Only before the first state is applied.
    Unknown,
}

/// Where an active blink currently is.
#[derive(Debug, Clone)]
struct BlinkCursor {
    pattern: Arc<BlinkPattern>,
    /// `-1` forever, `0` finished, `>0` full loops remaining.
    repetitions: i32,
    /// Index of the next step to execute.  Always `< pattern.len()`.
    offset: usize,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    handle: TimerHandle,
    generation: u64,
}

/// An armed flare restore.  `baseline` is the brightness from before the
/// first of any overlapping flares.
#[derive(Debug, Clone, Copy)]
struct Flare {
    baseline: u8,
    handle: TimerHandle,
    generation: u64,
}

/// Single-use snapshot taken by [`Indicator::save_state`].
#[derive(Debug, Clone)]
pub struct SavedProperties {
    pub state: IndicatorState,
    pub pattern: Option<Arc<BlinkPattern>>,
    pub repetitions: i32,
    pub cursor: usize,
    pub brightness: u8,
    /// `None` when the colour could not be read.
    pub color: Option<Color>,
}

/// Point-in-time view of an indicator, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorStatus {
    pub state: IndicatorState,
    pub pattern: Option<PatternKind>,
    pub repetitions: i32,
    pub cursor: usize,
    pub callback_pending: bool,
    pub flare_pending: bool,
}

struct Inner {
    hal: Box<dyn IndicatorHal>,
    state: IndicatorState,
    blink: Option<BlinkCursor>,
    pending: Option<Pending>,
    flare: Option<Flare>,
    next_generation: u64,
    saved: Option<SavedProperties>,
}

/// One physical status light.
pub struct Indicator {
    name: String,
    timer: Arc<dyn TimerService>,
    fallback_brightness: u8,
    this: Weak<Indicator>,
    inner: Mutex<Inner>,
}

impl Indicator {
    /// Bind to `hal` and apply the safe default of `SteadyOff`.
    ///
    /// The HAL's own state query is not trusted at boot, so the output is
    /// assumed off rather than read back.
    pub fn new(
        hal: Box<dyn IndicatorHal>,
        timer: Arc<dyn TimerService>,
        fallback_brightness: u8,
    ) -> Arc<Self> {
        let name = hal.name().to_owned();
        let indicator = Arc::new_cyclic(|this| Self {
            name,
            timer,
            fallback_brightness,
            this: this.clone(),
            inner: Mutex::new(Inner {
                hal,
                state: IndicatorState::Unknown,
                blink: None,
                pending: None,
                flare: None,
                next_generation: 0,
                saved: None,
            }),
        });
        {
            let mut inner = indicator.lock();
            inner.state = IndicatorState::SteadyOff;
            info!("Indicator {} initialized to state {:?}", indicator.name, inner.state);
        }
        indicator
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Steady state ──────────────────────────────────────────

    /// Switch to steady on or off, cancelling any blink in progress.
    pub fn set_state(&self, state: IndicatorState) -> Result<()> {
        info!("{}: set_state {:?}", self.name, state);
        let on = match state {
            IndicatorState::SteadyOn => true,
            IndicatorState::SteadyOff => false,
            IndicatorState::Blinking | IndicatorState::Unknown => {
                error!("{}: unsupported state {:?}", self.name, state);
                return Err(IndicatorError::UnsupportedState.into());
            }
        };
        let mut inner = self.lock();
        self.apply_steady(&mut inner, on);
        Ok(())
    }

    /// Write a colour straight through to the HAL.
    pub fn set_color(&self, color: Color) {
        self.lock().write_color(color);
    }

    // ── Blinking ──────────────────────────────────────────────

    /// Start `pattern`, looping `repetitions` times ([`REPEAT_FOREVER`] for
    /// no limit; any negative count is treated the same way).
    ///
    /// Executes the first step immediately.
    pub fn set_blink(&self, pattern: Arc<BlinkPattern>, repetitions: i32) -> Result<()> {
        if repetitions == 0 {
            error!("{}: bad inputs, zero repetitions", self.name);
            return Err(IndicatorError::ZeroRepetitions.into());
        }
        if pattern.len() < 2 {
            error!("{}: bad inputs, pattern has {} steps", self.name, pattern.len());
            return Err(IndicatorError::PatternTooShort.into());
        }
        let repetitions = if repetitions < 0 { REPEAT_FOREVER } else { repetitions };
        info!(
            "{}: blink {:?} x{}",
            self.name,
            pattern.id(),
            repetitions
        );

        let mut inner = self.lock();
        if inner.pending.is_some() {
            self.cancel_pending(&mut inner);
        } else if inner.state == IndicatorState::SteadyOff {
            debug!("{}: indicator is off, turning it back on", self.name);
            inner.enable(true);
        }

        inner.state = IndicatorState::Blinking;
        inner.blink = Some(BlinkCursor {
            pattern,
            repetitions,
            offset: 0,
        });
        self.step(&mut inner);
        Ok(())
    }

    /// Execute the step under the cursor and decide whether to re-arm.
    fn step(&self, inner: &mut Inner) {
        let Some(blink) = inner.blink.as_mut() else {
            warn!("{}: step without an active pattern", self.name);
            return;
        };
        let current = blink.pattern.steps()[blink.offset];
        blink.offset = (blink.offset + 1) % blink.pattern.len();

        let rearm = if blink.repetitions < 0 {
            true
        } else if blink.offset == 0 {
            blink.repetitions -= 1;
            if blink.repetitions > 0 {
                debug!("{}: end iteration, {} left", self.name, blink.repetitions);
                true
            } else {
                debug!("{}: final iteration complete", self.name);
                false
            }
        } else {
            true
        };

        inner.enable(current.is_on);
        if rearm {
            // Failure is logged inside; the pattern stalls on this step.
            let _ = self.register_callback(inner, current.duration_ms);
        }
    }

    /// Arm the single blink callback.  Zero delays stall the pattern
    /// instead of spinning.
    fn register_callback(&self, inner: &mut Inner, duration_ms: u32) -> Result<()> {
        if duration_ms == 0 {
            error!("{}: zero-wait timer", self.name);
            return Err(IndicatorError::ZeroDuration.into());
        }
        let generation = inner.next_generation();

        let this = self.this.clone();
        let registered = self.timer.register_one_shot(
            duration_ms,
            Box::new(move || {
                if let Some(indicator) = this.upgrade() {
                    indicator.timer_callback(generation);
                }
            }),
        );
        match registered {
            Some(handle) => {
                inner.pending = Some(Pending { handle, generation });
                Ok(())
            }
            None => {
                error!("{}: could not register callback", self.name);
                Err(ScheduleError::RegistrationFailed.into())
            }
        }
    }

    /// Entry point from the timer service.
    fn timer_callback(&self, generation: u64) {
        let mut inner = self.lock();
        match inner.pending {
            Some(p) if p.generation == generation => {}
            _ => {
                debug!("{}: ignoring stale callback #{}", self.name, generation);
                return;
            }
        }
        inner.pending = None;
        if inner.state == IndicatorState::Blinking {
            self.step(&mut inner);
        }
    }

    // ── Save / restore ────────────────────────────────────────

    /// Snapshot the current state without disturbing it.
    pub fn save_state(&self) {
        let mut inner = self.lock();
        let (pattern, repetitions, cursor) = match (&inner.state, &inner.blink) {
            (IndicatorState::Blinking, Some(b)) => (Some(Arc::clone(&b.pattern)), b.repetitions, b.offset),
            _ => (None, 0, 0),
        };
        let brightness = inner.read_brightness(self.fallback_brightness);
        let color = inner.read_color();
        inner.saved = Some(SavedProperties {
            state: inner.state,
            pattern,
            repetitions,
            cursor,
            brightness,
            color,
        });
        info!("{}: saved state {:?}", self.name, inner.state);
    }

    /// Re-apply the last snapshot and consume it.
    pub fn restore_state(&self) -> Result<()> {
        let mut inner = self.lock();
        let Some(saved) = inner.saved.take() else {
            error!("{}: won't restore stale settings", self.name);
            return Err(IndicatorError::StaleRestore.into());
        };

        self.apply_steady(&mut inner, false);
        if let Some(color) = saved.color {
            inner.write_color(color);
        }

        match (saved.state, saved.pattern) {
            (IndicatorState::SteadyOn, _) => {
                inner.state = IndicatorState::SteadyOn;
                inner.enable(true);
                info!("{}: restored to steady on", self.name);
            }
            (IndicatorState::Blinking, Some(pattern)) => {
                let terminal = pattern.last_step().map(|s| s.is_on);
                inner.state = IndicatorState::Blinking;
                inner.blink = Some(BlinkCursor {
                    pattern,
                    repetitions: saved.repetitions,
                    offset: saved.cursor,
                });
                if saved.repetitions == 0 {
                    inner.enable(terminal.unwrap_or(false));
                    info!("{}: restored to final holding state of blink pattern", self.name);
                } else {
                    info!("{}: restored blink pattern", self.name);
                    self.step(&mut inner);
                }
            }
            _ => info!("{}: restored to steady off", self.name),
        }
        Ok(())
    }

    // ── Flare ─────────────────────────────────────────────────

    /// Boost brightness by `percent_increase` for `duration_ms`, then
    /// drop back to the pre-flare level.
    ///
    /// The boost is only applied once the restore is scheduled.  A flare
    /// started while another is still armed replaces it: the boost and the
    /// eventual restore both use the level from before the first one.
    pub fn execute_flare(&self, percent_increase: u32, duration_ms: u32) -> Result<()> {
        if duration_ms == 0 {
            error!("{}: zero-wait flare", self.name);
            return Err(IndicatorError::ZeroDuration.into());
        }
        let mut inner = self.lock();
        let baseline = match inner.flare {
            Some(active) => active.baseline,
            None => inner.read_brightness(self.fallback_brightness),
        };
        let generation = inner.next_generation();

        let this = self.this.clone();
        let registered = self.timer.register_one_shot(
            duration_ms,
            Box::new(move || {
                if let Some(indicator) = this.upgrade() {
                    indicator.flare_callback(generation);
                }
            }),
        );
        let Some(handle) = registered else {
            error!("{}: could not register flare callback", self.name);
            return Err(ScheduleError::RegistrationFailed.into());
        };

        if let Some(previous) = inner.flare.take() {
            if !self.timer.cancel(previous.handle) {
                debug!("{}: superseded flare restore already firing", self.name);
            }
        }
        inner.flare = Some(Flare {
            baseline,
            handle,
            generation,
        });

        let level = flare_level(baseline, percent_increase);
        debug!("{}: flare {}% -> {}% for {}ms", self.name, baseline, level, duration_ms);
        inner.write_brightness(level);
        Ok(())
    }

    fn flare_callback(&self, generation: u64) {
        let mut inner = self.lock();
        match inner.flare {
            Some(active) if active.generation == generation => {
                inner.flare = None;
                inner.write_brightness(active.baseline);
            }
            _ => debug!("{}: ignoring stale flare restore #{}", self.name, generation),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> IndicatorState {
        self.lock().state
    }

    pub fn status(&self) -> IndicatorStatus {
        let inner = self.lock();
        let (pattern, repetitions, cursor) = inner
            .blink
            .as_ref()
            .map_or((None, 0, 0), |b| (Some(b.pattern.id()), b.repetitions, b.offset));
        IndicatorStatus {
            state: inner.state,
            pattern,
            repetitions,
            cursor,
            callback_pending: inner.pending.is_some(),
            flare_pending: inner.flare.is_some(),
        }
    }

    /// The unconsumed snapshot, if any.
    pub fn saved_state(&self) -> Option<SavedProperties> {
        self.lock().saved.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_steady(&self, inner: &mut Inner, on: bool) {
        if inner.state == IndicatorState::Blinking && inner.pending.is_some() {
            self.cancel_pending(inner);
            info!("{}: cancelled previously started blink", self.name);
        }
        inner.state = if on {
            IndicatorState::SteadyOn
        } else {
            IndicatorState::SteadyOff
        };
        inner.blink = None;
        inner.enable(on);
    }

    fn cancel_pending(&self, inner: &mut Inner) {
        if let Some(p) = inner.pending.take() {
            if !self.timer.cancel(p.handle) {
                warn!("{}: callback {} was not pending at cancel", self.name, p.handle.get());
            }
        }
    }
}

impl Drop for Indicator {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(p) = inner.pending.take() {
            let _ = self.timer.cancel(p.handle);
        }
        if let Some(f) = inner.flare.take() {
            let _ = self.timer.cancel(f.handle);
        }
    }
}

impl core::fmt::Debug for Indicator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Indicator")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Boosted level, capped at full brightness.
pub fn flare_level(current: u8, percent_increase: u32) -> u8 {
    let boosted = u64::from(current) * (100 + u64::from(percent_increase)) / 100;
    boosted.min(100) as u8
}

// HAL calls never fail an operation: log and move on.
impl Inner {
    fn next_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }

    fn enable(&mut self, on: bool) {
        if let Err(e) = self.hal.set_state(on) {
            error!("{}: could not change indicator state: {e}", self.hal.name());
        }
    }

    fn write_brightness(&mut self, percent: u8) {
        if let Err(e) = self.hal.set_brightness(percent, false) {
            error!("{}: error setting brightness: {e}", self.hal.name());
        }
    }

    fn write_color(&mut self, color: Color) {
        if let Err(e) = self.hal.set_color(color, false) {
            error!("{}: error setting color: {e}", self.hal.name());
        }
    }

    fn read_brightness(&self, fallback: u8) -> u8 {
        self.hal.brightness().unwrap_or_else(|e| {
            error!("{}: could not read brightness ({e}), using {fallback}%", self.hal.name());
            fallback
        })
    }

    fn read_color(&self) -> Option<Color> {
        self.hal
            .color()
            .inspect_err(|e| error!("{}: could not read color: {e}", self.hal.name()))
            .ok()
    }
}
