//! Mock adapters for host-side integration tests.
//!
//! `MockHal` records every successful write and can be told to fail reads
//! or writes.  The recording lives behind an `Arc` so the test keeps a
//! [`HalProbe`] after the HAL itself is boxed into an indicator.
//!
//! `ManualTimer` never fires on its own: the test decides when each
//! callback runs.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, PoisonError};
use std::num::NonZeroU32;

use ledmgr::app::ports::{Color, IndicatorHal, TimerCallback, TimerHandle, TimerService};
use ledmgr::error::HalError;

// ── IndicatorHal ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalCall {
    SetState(bool),
    SetBrightness(u8),
    SetColor(Color),
}

#[derive(Debug, Default)]
struct HalLog {
    calls: Vec<HalCall>,
    on: bool,
    brightness: u8,
    color: Color,
    fail_reads: bool,
    fail_writes: bool,
}

pub struct MockHal {
    name: String,
    log: Arc<Mutex<HalLog>>,
}

/// Test-side view of a [`MockHal`].
#[derive(Clone)]
pub struct HalProbe {
    log: Arc<Mutex<HalLog>>,
}

impl MockHal {
    pub fn new(name: &str) -> (Self, HalProbe) {
        let log = Arc::new(Mutex::new(HalLog {
            brightness: 50,
            color: 0x00ff_ffff,
            ..HalLog::default()
        }));
        (
            Self {
                name: name.to_owned(),
                log: Arc::clone(&log),
            },
            HalProbe { log },
        )
    }

    pub fn boxed(name: &str) -> (Box<dyn IndicatorHal>, HalProbe) {
        let (hal, probe) = Self::new(name);
        (Box::new(hal), probe)
    }

    fn log(&self) -> std::sync::MutexGuard<'_, HalLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IndicatorHal for MockHal {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_state(&mut self, on: bool) -> Result<(), HalError> {
        let mut log = self.log();
        if log.fail_writes {
            return Err(HalError::WriteFailed);
        }
        log.on = on;
        log.calls.push(HalCall::SetState(on));
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8, _persist: bool) -> Result<(), HalError> {
        let mut log = self.log();
        if log.fail_writes {
            return Err(HalError::WriteFailed);
        }
        log.brightness = percent;
        log.calls.push(HalCall::SetBrightness(percent));
        Ok(())
    }

    fn set_color(&mut self, color: Color, _persist: bool) -> Result<(), HalError> {
        let mut log = self.log();
        if log.fail_writes {
            return Err(HalError::WriteFailed);
        }
        log.color = color;
        log.calls.push(HalCall::SetColor(color));
        Ok(())
    }

    fn brightness(&self) -> Result<u8, HalError> {
        let log = self.log();
        if log.fail_reads { Err(HalError::ReadFailed) } else { Ok(log.brightness) }
    }

    fn color(&self) -> Result<Color, HalError> {
        let log = self.log();
        if log.fail_reads { Err(HalError::ReadFailed) } else { Ok(log.color) }
    }

    fn state(&self) -> Result<bool, HalError> {
        let log = self.log();
        if log.fail_reads { Err(HalError::ReadFailed) } else { Ok(log.on) }
    }
}

impl HalProbe {
    fn log(&self) -> std::sync::MutexGuard<'_, HalLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<HalCall> {
        self.log().calls.clone()
    }

    /// Only the on/off writes, in order.
    pub fn states(&self) -> Vec<bool> {
        self.log()
            .calls
            .iter()
            .filter_map(|c| match c {
                HalCall::SetState(on) => Some(*on),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log().calls.clear();
    }

    pub fn is_on(&self) -> bool {
        self.log().on
    }

    pub fn brightness(&self) -> u8 {
        self.log().brightness
    }

    pub fn color(&self) -> Color {
        self.log().color
    }

    pub fn preset_brightness(&self, percent: u8) {
        self.log().brightness = percent;
    }

    pub fn preset_color(&self, color: Color) {
        self.log().color = color;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.log().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.log().fail_writes = fail;
    }
}

// ── TimerService ─────────────────────────────────────────────

struct Armed {
    handle: TimerHandle,
    delay_ms: u32,
    callback: TimerCallback,
}

#[derive(Default)]
struct ManualQueue {
    next_id: u32,
    armed: Vec<Armed>,
    refuse: bool,
    lose_cancels: bool,
}

/// Timer that only fires when the test says so.
#[derive(Default)]
pub struct ManualTimer {
    queue: Mutex<ManualQueue>,
}

impl ManualTimer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn queue(&self) -> std::sync::MutexGuard<'_, ManualQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pending(&self) -> usize {
        self.queue().armed.len()
    }

    /// Delays of the armed callbacks, oldest first.
    pub fn delays(&self) -> Vec<u32> {
        self.queue().armed.iter().map(|a| a.delay_ms).collect()
    }

    /// Refuse every registration from now on.
    pub fn refuse(&self, refuse: bool) {
        self.queue().refuse = refuse;
    }

    /// Make `cancel` report failure and leave the callback armed, as if it
    /// had already been dequeued by the timer thread.
    pub fn lose_cancels(&self, lose: bool) {
        self.queue().lose_cancels = lose;
    }

    /// Run the oldest armed callback.  Returns its delay.
    pub fn fire_next(&self) -> Option<u32> {
        let armed = {
            let mut q = self.queue();
            if q.armed.is_empty() {
                return None;
            }
            q.armed.remove(0)
        };
        (armed.callback)();
        Some(armed.delay_ms)
    }

    /// Fire until nothing is armed or `limit` callbacks have run.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut fired = 0;
        while fired < limit && self.fire_next().is_some() {
            fired += 1;
        }
        fired
    }
}

impl TimerService for ManualTimer {
    fn register_one_shot(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerHandle> {
        let mut q = self.queue();
        if q.refuse || delay_ms == 0 {
            return None;
        }
        q.next_id += 1;
        let handle = TimerHandle::new(NonZeroU32::new(q.next_id)?);
        q.armed.push(Armed {
            handle,
            delay_ms,
            callback,
        });
        Some(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut q = self.queue();
        if q.lose_cancels {
            return false;
        }
        let before = q.armed.len();
        q.armed.retain(|a| a.handle != handle);
        q.armed.len() != before
    }
}
