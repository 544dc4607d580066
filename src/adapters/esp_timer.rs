//! One-shot timer service on ESP-IDF's `esp_timer`.
//!
//! Callbacks are dispatched from the esp_timer task, one at a time, so
//! every blink step and flare restore is serialised the same way as on the
//! host event loop.
//!
//! `esp_timer` handles are created lazily and recycled: a slot whose
//! callback has fired or been cancelled goes back to the pool and is
//! re-armed by the next registration.  Timers are never deleted from
//! their own callback.  The pool grows to the peak number of concurrently
//! armed callbacks (one blink step plus one flare restore per indicator).

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};
use log::{error, info, warn};

use crate::app::ports::{TimerCallback, TimerHandle, TimerService};

struct Slot {
    timer: EspTimer<'static>,
    /// Set while armed, and until the fire path has claimed the callback.
    handle: Option<TimerHandle>,
    callback: Option<TimerCallback>,
}

struct Pool {
    service: EspTaskTimerService,
    slots: Vec<Slot>,
    next_id: u32,
}

impl Pool {
    fn allocate(&mut self) -> TimerHandle {
        loop {
            self.next_id = self.next_id.wrapping_add(1);
            if let Some(raw) = NonZeroU32::new(self.next_id) {
                let handle = TimerHandle::new(raw);
                if !self.slots.iter().any(|s| s.handle == Some(handle)) {
                    return handle;
                }
            }
        }
    }
}

/// `TimerService` backed by the esp_timer task.
pub struct EspOneShotTimer {
    pool: Arc<Mutex<Pool>>,
}

impl EspOneShotTimer {
    pub fn new() -> Result<Self, EspError> {
        let service = EspTaskTimerService::new()?;
        info!("esp_timer: one-shot service ready");
        Ok(Self {
            pool: Arc::new(Mutex::new(Pool {
                service,
                slots: Vec::new(),
                next_id: 0,
            })),
        })
    }

    /// Number of `esp_timer` handles created so far.
    pub fn slots(&self) -> usize {
        self.lock().slots.len()
    }

    fn lock(&self) -> MutexGuard<'_, Pool> {
        self.pool.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TimerService for EspOneShotTimer {
    fn register_one_shot(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerHandle> {
        if delay_ms == 0 {
            return None;
        }
        let mut pool = self.lock();
        let index = match pool.slots.iter().position(|s| s.handle.is_none()) {
            Some(index) => index,
            None => {
                let index = pool.slots.len();
                let weak = Arc::downgrade(&self.pool);
                let timer = pool
                    .service
                    .timer(move || fire(&weak, index))
                    .inspect_err(|e| error!("esp_timer: create failed: {e}"))
                    .ok()?;
                pool.slots.push(Slot {
                    timer,
                    handle: None,
                    callback: None,
                });
                index
            }
        };

        let handle = pool.allocate();
        let slot = pool.slots.get_mut(index)?;
        if let Err(e) = slot.timer.after(Duration::from_millis(u64::from(delay_ms))) {
            error!("esp_timer: start_once({delay_ms} ms) failed: {e}");
            return None;
        }
        slot.handle = Some(handle);
        slot.callback = Some(callback);
        Some(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut pool = self.lock();
        let Some(slot) = pool.slots.iter_mut().find(|s| s.handle == Some(handle)) else {
            return false;
        };
        match slot.timer.cancel() {
            Ok(true) => {
                slot.handle = None;
                slot.callback = None;
                true
            }
            // Already dispatched; `fire` releases the slot.
            Ok(false) => false,
            Err(e) => {
                warn!("esp_timer: stop failed for #{}: {e}", handle.get());
                false
            }
        }
    }
}

/// Runs on the esp_timer task.
fn fire(pool: &Weak<Mutex<Pool>>, index: usize) {
    let Some(pool) = pool.upgrade() else {
        return;
    };
    let callback = {
        let mut pool = pool.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = pool.slots.get_mut(index) else {
            return;
        };
        slot.handle = None;
        slot.callback.take()
    };
    if let Some(callback) = callback {
        callback();
    }
}
