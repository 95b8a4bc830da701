//! Log synthesis.
//!
//! Turns `(progress, is_active, token)` into terminal log entries. Each stage
//! compares before writing, so calling [`synthesize`] again with unchanged
//! inputs leaves the log untouched.

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use super::bundle::{derive_statuses, CertificateDescriptor, CertificateStatus};
use super::log::{EventLog, LogEntry, LogStatus};
use super::milestones::{synth_detail, MilestoneTracker};
use super::steps::{active_index, clamp_progress, step_status, Step};
use super::workflow::{StepLogPolicy, WorkflowDefinition};

/// Inputs for one synthesis pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub progress: f64,
    pub is_active: bool,
    pub token: i64,
}

/// Session-scoped bookkeeping, cleared on start and reset
#[derive(Debug, Clone, Default)]
pub struct SynthesizerState {
    last_logged_index: Option<usize>,
    milestones: MilestoneTracker,
    bundle_statuses: Vec<CertificateStatus>,
    completion_logged: bool,
}

impl SynthesizerState {
    pub fn completion_logged(&self) -> bool {
        self.completion_logged
    }
}

pub fn tracked_step_id(workflow: &WorkflowDefinition, step: &Step, token: i64) -> String {
    format!("{}-{}-{}", workflow.key, step.id, token)
}

pub fn completed_step_id(step: &Step, token: i64) -> String {
    format!("{}-completed-{}", step.id, token)
}

pub fn certificate_entry_id(certificate: &CertificateDescriptor, status: &str, token: i64) -> String {
    format!("{}-{}-{}", certificate.id, status, token)
}

pub fn summary_id(workflow: &WorkflowDefinition, token: i64) -> String {
    format!("{}-summary-{}", workflow.key, token)
}

/// Seed the per-step entries of a tracked workflow at session start
pub fn seed(workflow: &WorkflowDefinition, log: &mut EventLog, token: i64, now: DateTime<Utc>) {
    if workflow.step_log != StepLogPolicy::Tracked {
        return;
    }

    for (index, step) in workflow.steps.iter().enumerate() {
        let status = if index == 0 {
            LogStatus::Running
        } else {
            LogStatus::Pending
        };
        let at = now + ChronoDuration::milliseconds(index as i64 * 120);
        let mut entry = LogEntry::new(tracked_step_id(workflow, step, token), &step.title, status, at)
            .with_detail(step.description.clone());
        if let Some(meta) = &step.meta {
            entry = entry.with_meta(meta);
        }
        log.push(entry);
    }
}

/// Run every synthesis stage once. Returns whether the log changed.
pub fn synthesize(
    workflow: &WorkflowDefinition,
    bundle: &[CertificateDescriptor],
    state: &mut SynthesizerState,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    let frame = Frame {
        progress: clamp_progress(frame.progress),
        ..frame
    };

    let mut changed = match workflow.step_log {
        StepLogPolicy::Completion => log_completed_steps(workflow, state, log, frame, now),
        StepLogPolicy::Tracked => track_step_statuses(workflow, log, frame, now),
    };
    changed |= log_milestones(workflow, state, log, frame, now);
    if workflow.track_bundle {
        changed |= log_bundle_transitions(bundle, state, log, frame, now);
    }
    changed |= log_completion(workflow, state, log, frame, now);
    changed
}

fn completion_label(step: &Step) -> (String, Option<String>) {
    let label = step.terminal_label.clone().unwrap_or_else(|| {
        [Some(step.title.as_str()), step.description.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    });

    let detail = match &step.description {
        Some(description) if label.to_lowercase().contains(&description.to_lowercase()) => None,
        other => other.clone(),
    };

    (label, detail)
}

fn log_completed_steps(
    workflow: &WorkflowDefinition,
    state: &mut SynthesizerState,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    let step_count = workflow.steps.len();
    if step_count == 0 {
        return false;
    }

    let target = if frame.progress >= 1.0 {
        Some(step_count - 1)
    } else {
        active_index(frame.progress, step_count).checked_sub(1)
    };

    let Some(target) = target else {
        return false;
    };
    let first = match state.last_logged_index {
        Some(last) if last >= target => return false,
        Some(last) => last + 1,
        None => 0,
    };

    let mut changed = false;
    for step in &workflow.steps[first..=target] {
        let (label, detail) = completion_label(step);
        changed |= log.push(
            LogEntry::new(completed_step_id(step, frame.token), label, LogStatus::Success, now)
                .with_detail(detail)
                .with_meta("DONE"),
        );
    }
    state.last_logged_index = Some(target);
    changed
}

fn track_step_statuses(
    workflow: &WorkflowDefinition,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    let step_count = workflow.steps.len();
    let active = active_index(frame.progress, step_count);

    let mut changed = false;
    for (index, step) in workflow.steps.iter().enumerate() {
        let status = step_status(index, active, frame.progress, frame.is_active);
        changed |= log.set_status(
            &tracked_step_id(workflow, step, frame.token),
            status.into(),
            now,
        );
    }
    changed
}

fn log_milestones(
    workflow: &WorkflowDefinition,
    state: &mut SynthesizerState,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    let set = &workflow.milestones;
    let Some(index) = state
        .milestones
        .advance(set.milestones, frame.progress, frame.token)
    else {
        return false;
    };

    let milestone = &set.milestones[index];
    tracing::debug!(
        workflow = %workflow.key,
        milestone = milestone.meta,
        "Milestone reached"
    );

    log.push(
        LogEntry::new(
            format!("{}-{}", milestone.meta, frame.token),
            milestone.label,
            LogStatus::Success,
            now,
        )
        .with_detail(synth_detail(set, frame.token, index))
        .with_meta(milestone.meta),
    )
}

fn log_bundle_transitions(
    bundle: &[CertificateDescriptor],
    state: &mut SynthesizerState,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    let derived = derive_statuses(bundle, frame.progress, frame.is_active);
    let mut changed = false;

    for (index, (certificate, status)) in bundle.iter().zip(derived.iter()).enumerate() {
        let previous = state
            .bundle_statuses
            .get(index)
            .copied()
            .unwrap_or_default();
        if previous == *status {
            continue;
        }

        let detail = certificate.issued_by.as_ref().map(|issuer| match &certificate.fingerprint {
            Some(fingerprint) => format!("{} · {}", issuer, fingerprint),
            None => issuer.clone(),
        });

        match status {
            CertificateStatus::Transferring => {
                changed |= log.push(
                    LogEntry::new(
                        certificate_entry_id(certificate, "transferring", frame.token),
                        format!("Transferring {}", certificate.name),
                        LogStatus::Running,
                        now,
                    )
                    .with_detail(detail)
                    .with_meta("CERT"),
                );
            }
            CertificateStatus::Verified => {
                let transferring = certificate_entry_id(certificate, "transferring", frame.token);
                if log.contains(&transferring) {
                    changed |= log.set_status(&transferring, LogStatus::Success, now);
                } else {
                    changed |= log.push(
                        LogEntry::new(
                            certificate_entry_id(certificate, "verified", frame.token),
                            format!("Verified {}", certificate.name),
                            LogStatus::Success,
                            now,
                        )
                        .with_detail(detail)
                        .with_meta("CERT"),
                    );
                }
            }
            CertificateStatus::Failed => {
                changed |= log.push(
                    LogEntry::new(
                        certificate_entry_id(certificate, "failed", frame.token),
                        format!("Transfer failed for {}", certificate.name),
                        LogStatus::Error,
                        now,
                    )
                    .with_detail(detail)
                    .with_meta("CERT"),
                );
            }
            CertificateStatus::Queued => {}
        }
    }

    state.bundle_statuses = derived;
    changed
}

fn log_completion(
    workflow: &WorkflowDefinition,
    state: &mut SynthesizerState,
    log: &mut EventLog,
    frame: Frame,
    now: DateTime<Utc>,
) -> bool {
    if frame.progress < 1.0 || state.completion_logged {
        return false;
    }
    state.completion_logged = true;

    log.settle_all(now);
    let summary = &workflow.completion;
    log.push(
        LogEntry::new(
            summary_id(workflow, frame.token),
            summary.label,
            LogStatus::Success,
            now,
        )
        .with_detail(Some(summary.detail.to_string()))
        .with_meta(summary.meta),
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::bundle::fallback_bundle;
    use crate::simulation::workflow::WorkflowCatalog;
    use std::collections::HashSet;
    use std::time::Duration;

    const TOKEN: i64 = 1_760_000_000_000;

    fn catalog() -> WorkflowCatalog {
        WorkflowCatalog::new(Duration::from_millis(8000), Duration::from_millis(10000))
    }

    fn frame(progress: f64, is_active: bool) -> Frame {
        Frame {
            progress,
            is_active,
            token: TOKEN,
        }
    }

    fn run(
        workflow: &WorkflowDefinition,
        bundle: &[CertificateDescriptor],
        state: &mut SynthesizerState,
        log: &mut EventLog,
        progress: f64,
        is_active: bool,
    ) -> bool {
        synthesize(workflow, bundle, state, log, frame(progress, is_active), Utc::now())
    }

    #[test]
    fn test_completed_steps_are_logged_in_order() {
        let workflow = catalog().charging();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();

        // 0.35 * 10 = 3.5, so steps 0..=2 are complete
        run(&workflow, &[], &mut state, &mut log, 0.35, true);
        let ids: Vec<&str> = log
            .entries()
            .iter()
            .filter(|e| e.meta.as_deref() == Some("DONE"))
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(
            ids,
            vec![
                format!("handshake-completed-{}", TOKEN),
                format!("authorization-completed-{}", TOKEN),
                format!("connector-lock-completed-{}", TOKEN),
            ]
        );

        let first = log.get(&format!("handshake-completed-{}", TOKEN)).unwrap();
        assert_eq!(first.label, "Handshake - Vehicle requests session");
        assert_eq!(first.detail, None);
        assert_eq!(first.status, LogStatus::Success);
    }

    #[test]
    fn test_terminal_label_keeps_detail() {
        let step = Step::new("lock", "Lock")
            .with_description("Plug secured")
            .with_terminal_label("Connector engaged");
        let (label, detail) = completion_label(&step);
        assert_eq!(label, "Connector engaged");
        assert_eq!(detail.as_deref(), Some("Plug secured"));
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let workflow = catalog().certificate("pre-install");
        let bundle = fallback_bundle();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();
        seed(&workflow, &mut log, TOKEN, Utc::now());

        for progress in [0.0, 0.12, 0.5, 0.77] {
            run(&workflow, &bundle, &mut state, &mut log, progress, true);
            let before = log.entries().to_vec();
            assert!(!run(&workflow, &bundle, &mut state, &mut log, progress, true));
            assert_eq!(log.entries(), before.as_slice());
        }
    }

    #[test]
    fn test_milestones_follow_crossing_order() {
        let workflow = catalog().charging();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();

        for progress in [0.0, 0.1, 0.3, 0.5, 0.9, 1.0] {
            run(&workflow, &[], &mut state, &mut log, progress, progress < 1.0);
        }

        let metas: Vec<&str> = log
            .entries()
            .iter()
            .filter_map(|e| e.meta.as_deref())
            .filter(|m| m.starts_with('M'))
            .collect();
        assert_eq!(metas, vec!["M05", "M20", "M40", "M80", "M95"]);
    }

    #[test]
    fn test_milestone_text_replays_identically() {
        let workflow = catalog().charging();
        let replay = || {
            let mut state = SynthesizerState::default();
            let mut log = EventLog::new();
            for i in 0..=50 {
                run(&workflow, &[], &mut state, &mut log, i as f64 / 50.0, true);
            }
            log.entries()
                .iter()
                .map(|e| (e.id.clone(), e.label.clone(), e.detail.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(replay(), replay());
    }

    #[test]
    fn test_bundle_transferring_entry_flips_to_success() {
        let workflow = catalog().certificate("distribute");
        let bundle = fallback_bundle();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();

        run(&workflow, &bundle, &mut state, &mut log, 0.1, true);
        let root = format!("root-ca-transferring-{}", TOKEN);
        assert_eq!(log.get(&root).unwrap().status, LogStatus::Running);

        run(&workflow, &bundle, &mut state, &mut log, 0.4, true);
        assert_eq!(log.get(&root).unwrap().status, LogStatus::Success);
        assert!(!log.contains(&format!("root-ca-verified-{}", TOKEN)));
        assert_eq!(
            log.get(&format!("intermediate-ca-transferring-{}", TOKEN))
                .unwrap()
                .status,
            LogStatus::Running
        );
    }

    #[test]
    fn test_bundle_item_verified_without_transfer_is_appended() {
        let workflow = catalog().certificate("distribute");
        let bundle = fallback_bundle();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();

        // Jump straight past the first item
        run(&workflow, &bundle, &mut state, &mut log, 0.5, true);
        assert!(log.contains(&format!("root-ca-verified-{}", TOKEN)));
        assert!(!log.contains(&format!("root-ca-transferring-{}", TOKEN)));
    }

    #[test]
    fn test_supplied_failure_is_logged_as_error() {
        let workflow = catalog().certificate("distribute");
        let mut bundle = fallback_bundle();
        bundle[2].status = Some(CertificateStatus::Failed);
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();

        run(&workflow, &bundle, &mut state, &mut log, 0.2, true);
        let failed = log.get(&format!("evcc-leaf-failed-{}", TOKEN)).unwrap();
        assert_eq!(failed.status, LogStatus::Error);
    }

    #[test]
    fn test_tracked_steps_follow_progress() {
        let workflow = catalog().certificate("reset");
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();
        seed(&workflow, &mut log, TOKEN, Utc::now());

        let statuses = |log: &EventLog| -> Vec<LogStatus> {
            workflow
                .steps
                .iter()
                .map(|s| log.get(&tracked_step_id(&workflow, s, TOKEN)).unwrap().status)
                .collect()
        };

        assert_eq!(
            statuses(&log),
            vec![
                LogStatus::Running,
                LogStatus::Pending,
                LogStatus::Pending,
                LogStatus::Pending,
            ]
        );

        run(&workflow, &[], &mut state, &mut log, 0.55, true);
        assert_eq!(
            statuses(&log),
            vec![
                LogStatus::Success,
                LogStatus::Success,
                LogStatus::Running,
                LogStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_completion_summary_once_and_settles() {
        let workflow = catalog().certificate("pre-install");
        let bundle = fallback_bundle();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();
        seed(&workflow, &mut log, TOKEN, Utc::now());

        run(&workflow, &bundle, &mut state, &mut log, 0.6, true);
        run(&workflow, &bundle, &mut state, &mut log, 1.0, false);
        run(&workflow, &bundle, &mut state, &mut log, 1.0, false);

        let summaries = log
            .entries()
            .iter()
            .filter(|e| e.id == summary_id(&workflow, TOKEN))
            .count();
        assert_eq!(summaries, 1);
        assert!(state.completion_logged());
        assert!(log.entries().iter().all(|e| e.status == LogStatus::Success));
        assert_eq!(log.entries().last().unwrap().label, "OEM bundle staged successfully");
    }

    #[test]
    fn test_log_ids_are_unique() {
        let workflow = catalog().certificate("distribute");
        let bundle = fallback_bundle();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();
        seed(&workflow, &mut log, TOKEN, Utc::now());

        for i in 0..=200 {
            run(&workflow, &bundle, &mut state, &mut log, i as f64 / 200.0, i < 200);
        }

        let ids: HashSet<&str> = log.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids.len(), log.len());
    }

    #[test]
    fn test_idle_frame_writes_nothing() {
        let workflow = catalog().charging();
        let mut state = SynthesizerState::default();
        let mut log = EventLog::new();
        assert!(!run(&workflow, &[], &mut state, &mut log, 0.0, false));
        assert!(log.is_empty());
    }
}
