//! Session state machine.
//!
//! [`Session`] holds the single progress value of a run and re-derives the
//! log from it on every mutation. It has no notion of timers: the caller feeds
//! it elapsed time, see `services::session` for the tokio driver.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::bundle::{
    derive_statuses, project_bundle, transfer_status, BundleItem, CertificateDescriptor,
    TransferStatus,
};
use super::log::{EventLog, LogEntry};
use super::status::{controller_status, eta_label, footer_note, percent, ControllerStatus};
use super::steps::{project_steps, Step, StepStatus};
use super::synthesizer::{seed, synthesize, Frame, SynthesizerState};
use super::workflow::{WorkflowDefinition, WorkflowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session was not running
    Ignored,
    Advanced,
    /// Progress reached 1 and the session went inactive
    Finished,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepView {
    #[serde(flatten)]
    pub step: Step,
    pub status: StepStatus,
}

/// Read model served to the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub workflow: String,
    pub workflow_label: String,
    pub kind: WorkflowKind,
    pub progress: f64,
    pub percent: u8,
    pub is_active: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub eta_seconds: Option<u64>,
    pub eta_label: String,
    pub token: i64,
    pub current_step_index: usize,
    pub step_progress: f64,
    pub steps: Vec<StepView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_status: Option<ControllerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_status: Option<TransferStatus>,
    pub bundle: Vec<BundleItem>,
    pub prompt: String,
    pub footer_note: String,
    pub logs: Vec<LogEntry>,
}

#[derive(Debug, Clone)]
pub struct Session {
    workflow: Arc<WorkflowDefinition>,
    bundle: Vec<CertificateDescriptor>,
    progress: f64,
    is_active: bool,
    started_at: Option<DateTime<Utc>>,
    eta_seconds: Option<u64>,
    token: i64,
    generation: u64,
    log: EventLog,
    synth: SynthesizerState,
}

fn ceil_seconds(duration: Duration) -> u64 {
    let nanos = duration.as_nanos();
    nanos.div_ceil(1_000_000_000) as u64
}

impl Session {
    pub fn new(workflow: Arc<WorkflowDefinition>) -> Self {
        Self {
            workflow,
            bundle: Vec::new(),
            progress: 0.0,
            is_active: false,
            started_at: None,
            eta_seconds: None,
            token: 0,
            generation: 0,
            log: EventLog::new(),
            synth: SynthesizerState::default(),
        }
    }

    /// Certificates tracked by workflows that transfer a bundle
    pub fn with_bundle(mut self, bundle: Vec<CertificateDescriptor>) -> Self {
        self.bundle = bundle;
        self
    }

    /// Begin a fresh run of `workflow`. Returns the new generation.
    pub fn start(&mut self, workflow: Arc<WorkflowDefinition>, now: DateTime<Utc>) -> u64 {
        self.reset();

        self.workflow = workflow;
        self.token = now.timestamp_millis().max(self.token + 1);
        self.is_active = true;
        self.started_at = Some(now);
        self.eta_seconds = Some(ceil_seconds(self.workflow.duration));

        seed(&self.workflow, &mut self.log, self.token, now);
        self.resynthesize(now);

        tracing::info!(
            workflow = %self.workflow.key,
            token = self.token,
            generation = self.generation,
            "Session started"
        );
        self.generation
    }

    /// Advance to `elapsed` time since start
    pub fn tick(&mut self, elapsed: Duration, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_active {
            return TickOutcome::Ignored;
        }

        let duration = self.workflow.duration;
        let ratio = if duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
        };

        self.progress = self.progress.max(ratio);
        self.eta_seconds = Some(ceil_seconds(duration.saturating_sub(elapsed)));

        let outcome = if ratio >= 1.0 {
            self.progress = 1.0;
            self.is_active = false;
            self.eta_seconds = Some(0);
            TickOutcome::Finished
        } else {
            TickOutcome::Advanced
        };

        self.resynthesize(now);

        if outcome == TickOutcome::Finished {
            tracing::info!(
                workflow = %self.workflow.key,
                token = self.token,
                entries = self.log.len(),
                "Session finished"
            );
        }
        outcome
    }

    /// Halt without forcing progress to completion
    pub fn stop(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.generation += 1;
        self.resynthesize(now);

        tracing::info!(
            workflow = %self.workflow.key,
            progress = self.progress,
            "Session stopped"
        );
        true
    }

    /// Return to idle: zero progress, empty log, fresh latches
    pub fn reset(&mut self) {
        self.generation += 1;
        self.progress = 0.0;
        self.is_active = false;
        self.started_at = None;
        self.eta_seconds = None;
        self.log.clear();
        self.synth = SynthesizerState::default();
    }

    fn resynthesize(&mut self, now: DateTime<Utc>) -> bool {
        let frame = Frame {
            progress: self.progress,
            is_active: self.is_active,
            token: self.token,
        };
        synthesize(
            &self.workflow,
            &self.bundle,
            &mut self.synth,
            &mut self.log,
            frame,
            now,
        )
    }

    pub fn workflow(&self) -> &Arc<WorkflowDefinition> {
        &self.workflow
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn eta_seconds(&self) -> Option<u64> {
        self.eta_seconds
    }

    pub fn token(&self) -> i64 {
        self.token
    }

    /// Bumped by every start, stop and reset; timer callbacks compare it to
    /// detect that they outlived their run
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let workflow = &self.workflow;
        let projection = project_steps(self.progress, workflow.steps.len(), self.is_active);

        let eta_seconds = if self.is_active {
            self.eta_seconds
        } else if self.progress >= 1.0 {
            Some(0)
        } else {
            None
        };

        let (controller, transfer) = match workflow.kind {
            WorkflowKind::Charging => (Some(controller_status(self.progress, self.is_active)), None),
            WorkflowKind::Certificate => {
                let statuses = derive_statuses(&self.bundle, self.progress, self.is_active);
                (
                    None,
                    Some(transfer_status(&statuses, self.progress, self.is_active)),
                )
            }
        };

        let steps = workflow
            .steps
            .iter()
            .cloned()
            .zip(projection.statuses.iter().copied())
            .map(|(step, status)| StepView { step, status })
            .collect();

        let running_label = self.started_at.map(|_| workflow.label.as_str());

        SessionSnapshot {
            workflow: workflow.key.clone(),
            workflow_label: workflow.label.clone(),
            kind: workflow.kind,
            progress: self.progress,
            percent: percent(self.progress),
            is_active: self.is_active,
            started_at: self.started_at,
            eta_seconds,
            eta_label: eta_label(eta_seconds, self.is_active),
            token: self.token,
            current_step_index: projection.active_index,
            step_progress: projection.step_progress,
            steps,
            controller_status: controller,
            transfer_status: transfer,
            bundle: project_bundle(&self.bundle, self.progress, self.is_active),
            prompt: workflow.prompt.clone(),
            footer_note: footer_note(running_label, self.progress, self.is_active),
            logs: self.log.entries().to_vec(),
        }
    }
}
