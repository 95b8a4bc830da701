//! Owns a live [`Session`] and drives it from a tokio ticker.
//!
//! Every mutation publishes the resulting snapshot on a broadcast channel
//! as a JSON string, which the WebSocket endpoints forward verbatim.

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::timer::{spawn_ticker, TaskSlot};
use crate::simulation::{
    ChargingAction, Session, SessionSnapshot, TickOutcome, WorkflowCatalog, WorkflowDefinition,
};

const CHANNEL_CAPACITY: usize = 32;

/// WebSocket message carrying a session snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent<'a> {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub timestamp: i64,
    pub session: &'a SessionSnapshot,
}

struct Inner {
    name: &'static str,
    session: Mutex<Session>,
    ticker: TaskSlot,
    events: broadcast::Sender<String>,
    tick_interval: Duration,
}

impl Inner {
    fn publish(&self, snapshot: &SessionSnapshot) {
        let event = SessionEvent {
            msg_type: "session",
            timestamp: Utc::now().timestamp_millis(),
            session: snapshot,
        };
        match serde_json::to_string(&event) {
            // No receivers is fine
            Ok(json) => {
                let _ = self.events.send(json);
            }
            Err(e) => tracing::warn!(manager = self.name, error = %e, "Failed to serialize snapshot"),
        }
    }

    fn on_tick(&self, generation: u64, elapsed: Duration) -> ControlFlow<()> {
        let mut session = self.session.lock();
        if session.generation() != generation {
            tracing::debug!(manager = self.name, generation, "Dropping stale tick");
            return ControlFlow::Break(());
        }

        // Published under the lock so a concurrent reset cannot be overtaken
        // by this frame
        match session.tick(elapsed, Utc::now()) {
            TickOutcome::Ignored => ControlFlow::Break(()),
            TickOutcome::Advanced => {
                self.publish(&session.snapshot());
                ControlFlow::Continue(())
            }
            TickOutcome::Finished => {
                self.publish(&session.snapshot());
                ControlFlow::Break(())
            }
        }
    }
}

/// Shared handle to one simulated session
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(name: &'static str, session: Session, tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                name,
                session: Mutex::new(session),
                ticker: TaskSlot::new(),
                events,
                tick_interval,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Start `workflow` from zero, replacing any run in progress
    pub fn start(&self, workflow: Arc<WorkflowDefinition>) -> SessionSnapshot {
        let mut session = self.inner.session.lock();
        let generation = session.start(workflow, Utc::now());

        // Spawned under the lock so a concurrent start cannot install its
        // ticker ahead of ours
        let started = Instant::now();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = spawn_ticker(self.inner.tick_interval, move |at| match weak.upgrade() {
            Some(inner) => inner.on_tick(generation, at.saturating_duration_since(started)),
            None => ControlFlow::Break(()),
        });
        self.inner.ticker.replace(handle);

        let snapshot = session.snapshot();
        self.inner.publish(&snapshot);
        snapshot
    }

    /// Halt the run, keeping its progress
    pub fn stop(&self) -> SessionSnapshot {
        let mut session = self.inner.session.lock();
        session.stop(Utc::now());
        self.inner.ticker.cancel();

        let snapshot = session.snapshot();
        self.inner.publish(&snapshot);
        snapshot
    }

    pub fn reset(&self) -> SessionSnapshot {
        let mut session = self.inner.session.lock();
        session.reset();
        self.inner.ticker.cancel();
        tracing::info!(manager = self.inner.name, "Session reset");

        let snapshot = session.snapshot();
        self.inner.publish(&snapshot);
        snapshot
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.session.lock().snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.events.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    pub fn is_ticking(&self) -> bool {
        self.inner.ticker.is_running()
    }

    pub fn dispatch_charging(
        &self,
        catalog: &WorkflowCatalog,
        action: ChargingAction,
    ) -> SessionSnapshot {
        tracing::debug!(manager = self.inner.name, action = action.as_str(), "Dispatching charging action");
        match action {
            ChargingAction::Start => self.start(catalog.charging()),
            ChargingAction::End => self.stop(),
            ChargingAction::Reset => self.reset(),
        }
    }

    /// Every certificate action restarts from a clean session
    pub fn dispatch_certificate(&self, catalog: &WorkflowCatalog, key: &str) -> SessionSnapshot {
        let workflow = catalog.certificate(key);
        tracing::debug!(
            manager = self.inner.name,
            requested = key,
            resolved = %workflow.key,
            "Dispatching certificate action"
        );
        self.reset();
        self.start(workflow)
    }
}
