//! One-shot timer service backed by a single event-loop thread.
//!
//! Every blink step and flare restore runs on this one thread, one at a
//! time, in deadline order.  Registration and cancellation may come from
//! any thread.  The queue lock is released before a callback runs, so a
//! callback can register or cancel timers and callers blocked in
//! [`TimerService::cancel`] never wait on a running callback.
//!
//! Host adapter; device builds use `adapters::esp_timer`
//! instead.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::app::ports::{TimerCallback, TimerHandle, TimerService};

struct Queue {
    entries: BTreeMap<(Instant, TimerHandle), TimerCallback>,
    deadlines: HashMap<TimerHandle, Instant>,
    next_id: u32,
    shutdown: bool,
}

impl Queue {
    fn allocate(&mut self) -> TimerHandle {
        loop {
            self.next_id = self.next_id.wrapping_add(1);
            if let Some(raw) = NonZeroU32::new(self.next_id) {
                let handle = TimerHandle::new(raw);
                if !self.deadlines.contains_key(&handle) {
                    return handle;
                }
            }
        }
    }
}

struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Timer service running callbacks on its own thread.
pub struct EventLoopTimer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl EventLoopTimer {
    /// Start the event-loop thread.
    pub fn new() -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                entries: BTreeMap::new(),
                deadlines: HashMap::new(),
                next_id: 0,
                shutdown: false,
            }),
            wake: Condvar::new(),
        });
        let loop_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("led-timer".into())
            .spawn(move || run(&loop_shared))?;
        info!("timer: event loop started");
        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Number of callbacks waiting to fire.
    pub fn pending(&self) -> usize {
        self.shared.lock().entries.len()
    }
}

impl TimerService for EventLoopTimer {
    fn register_one_shot(&self, delay_ms: u32, callback: TimerCallback) -> Option<TimerHandle> {
        if delay_ms == 0 {
            return None;
        }
        let mut queue = self.shared.lock();
        if queue.shutdown {
            return None;
        }
        let handle = queue.allocate();
        let deadline = Instant::now() + Duration::from_millis(u64::from(delay_ms));
        queue.entries.insert((deadline, handle), callback);
        queue.deadlines.insert(handle, deadline);
        drop(queue);
        self.shared.wake.notify_one();
        Some(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut queue = self.shared.lock();
        match queue.deadlines.remove(&handle) {
            Some(deadline) => queue.entries.remove(&(deadline, handle)).is_some(),
            None => false,
        }
    }
}

impl Drop for EventLoopTimer {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.wake.notify_one();
        if let Some(worker) = self.worker.take() {
            // The last owner can be a callback on the loop thread itself.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                warn!("timer: event loop panicked");
            }
        }
    }
}

fn run(shared: &Shared) {
    let mut queue = shared.lock();
    loop {
        if queue.shutdown {
            break;
        }
        let now = Instant::now();
        let next = queue.entries.keys().next().copied();
        match next {
            Some((deadline, handle)) if deadline <= now => {
                queue.deadlines.remove(&handle);
                let callback = queue.entries.remove(&(deadline, handle));
                drop(queue);
                if let Some(callback) = callback {
                    callback();
                }
                queue = shared.lock();
            }
            Some((deadline, _)) => {
                queue = shared
                    .wake
                    .wait_timeout(queue, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
            }
            None => {
                queue = shared.wake.wait(queue).unwrap_or_else(PoisonError::into_inner);
            }
        }
    }
    debug!("timer: event loop stopped");
}
