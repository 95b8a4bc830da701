//! Single-owner periodic task
//!
//! A [`TaskSlot`] owns at most one spawned ticker. Replacing or dropping the
//! slot aborts whatever was running, so a session never has two drivers.

use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `handle`, aborting the task it displaces
    pub fn replace(&self, handle: JoinHandle<()>) {
        if let Some(previous) = self.handle.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the current task. Returns false if the slot was empty.
    pub fn cancel(&self) -> bool {
        match self.handle.lock().take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

/// Call `on_tick` every `period` until it breaks.
///
/// The first call happens one full period after spawning.
pub fn spawn_ticker<F>(period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut(Instant) -> ControlFlow<()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            let at = ticker.tick().await;
            if on_tick(at).is_break() {
                break;
            }
        }
    })
}
