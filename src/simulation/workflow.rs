//! Workflow catalog: step lists, prompts and completion messages keyed by
//! action identifier.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::milestones::{MilestoneSet, CERTIFICATE_MILESTONES, CHARGING_MILESTONES};
use super::steps::Step;

pub const CHARGING_KEY: &str = "charging";
pub const DEFAULT_KEY: &str = "default";
pub const CHARGING_PROMPT: &str = "evcc@backend";
pub const STANDBY_PROMPT: &str = "certd@standby";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Charging,
    Certificate,
}

/// How step transitions are written to the terminal log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepLogPolicy {
    /// One success entry is appended per completed step
    Completion,
    /// One entry per step is seeded on start and its status tracked in place
    Tracked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionMessage {
    pub label: &'static str,
    pub detail: &'static str,
    pub meta: &'static str,
}

#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub key: String,
    pub label: String,
    pub prompt: String,
    pub kind: WorkflowKind,
    pub steps: Vec<Step>,
    pub step_log: StepLogPolicy,
    pub track_bundle: bool,
    pub milestones: MilestoneSet,
    pub completion: CompletionMessage,
    pub duration: Duration,
}

/// Describes a certificate action for the info popover
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// User controls on the charging card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargingAction {
    Start,
    End,
    Reset,
}

impl ChargingAction {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
            Self::Reset => "reset",
        }
    }
}

// ============================================================================
// Static tables
// ============================================================================

type StepRow = (&'static str, &'static str, &'static str);

const CHARGING_STEPS: &[StepRow] = &[
    ("handshake", "Handshake", "Vehicle requests session"),
    ("authorization", "Authorization", "Driver profile verified"),
    ("connector-lock", "Connector Lock", "Plug secured"),
    ("precharge", "Pre-Charge", "Voltage aligned"),
    ("ramp-up", "Ramp Up", "Current increases"),
    ("steady", "Steady State", "Charging at target rate"),
    ("thermal-check", "Thermal Check", "Cooling system validation"),
    ("taper", "Taper", "Current reduces near full"),
    ("top-off", "Top Off", "Balancing individual cells"),
    ("complete", "Complete", "Ready to disconnect"),
];

const PRE_INSTALL_STEPS: &[StepRow] = &[
    ("diagnostics", "Establishing secure channel", "Negotiating TLS handshake with EVCC controller"),
    ("manifest-verify", "Validating OEM manifest", "Checking bundle signatures against OEM PKI"),
    ("upload", "Uploading certificate package", "Streaming PEM artifacts to controller storage"),
    ("attestation", "Attesting hardware secure module", "Verifying TPM nonce and key material"),
];

const DISTRIBUTE_STEPS: &[StepRow] = &[
    ("mesh-scan", "Scanning EVCC mesh", "Enumerating target modules for distribution"),
    ("push", "Pushing bundle to nodes", "Replicating credentials with delta compression"),
    ("integrity", "Integrity verification", "Cross-checking fingerprints across EVCC devices"),
    ("handover", "Issuing activation", "Restarting trust daemons with refreshed secrets"),
];

const RESET_STEPS: &[StepRow] = &[
    ("drain", "Draining active sessions", "Gracefully closing certificate consumers"),
    ("revoke", "Revoking bundle", "Revoking serials from controller trust store"),
    ("wipe", "Wiping secure storage", "Shredding persisted keys and cache entries"),
    ("baseline", "Restoring factory anchors", "Reloading OEM baseline certificate set"),
];

pub const CHARGING_ACTIONS: &[ActionDescriptor] = &[
    ActionDescriptor {
        key: "start",
        label: "Start",
        description: "Kick off a new charging session",
    },
    ActionDescriptor {
        key: "end",
        label: "End",
        description: "Stop the current charging session",
    },
    ActionDescriptor {
        key: "reset",
        label: "Reset",
        description: "Clear the session and return to idle",
    },
];

pub const CERTIFICATE_ACTIONS: &[ActionDescriptor] = &[
    ActionDescriptor {
        key: "pre-install",
        label: "Pre-Install Certificates",
        description: "Prepare the vehicle controller by uploading OEM certificates before the session starts.",
    },
    ActionDescriptor {
        key: "distribute",
        label: "Distribute Certificates",
        description: "Push the certificate bundle to all required EVCC modules and verify integrity.",
    },
    ActionDescriptor {
        key: "reset",
        label: "Reset Certificates",
        description: "Remove installed certificates and restore factory trust settings.",
    },
];

const CHARGING_COMPLETION: CompletionMessage = CompletionMessage {
    label: "Session complete",
    detail: "Vehicle confirmed full charge. Connector ready to release.",
    meta: "OK",
};

const DEFAULT_COMPLETION: CompletionMessage = CompletionMessage {
    label: "Workflow complete",
    detail: "All certificate operations finished without issues.",
    meta: "DONE",
};

fn certificate_completion(key: &str) -> CompletionMessage {
    match key {
        "pre-install" => CompletionMessage {
            label: "OEM bundle staged successfully",
            detail: "EVCC controller confirmed trust chain installation.",
            meta: "DONE",
        },
        "distribute" => CompletionMessage {
            label: "Distribution completed",
            detail: "All EVCC modules report synchronized certificates.",
            meta: "SYNC",
        },
        "reset" => CompletionMessage {
            label: "Certificate store reset",
            detail: "Device restored to OEM baseline anchor set.",
            meta: "RESET",
        },
        _ => DEFAULT_COMPLETION,
    }
}

fn certificate_prompt(key: &str) -> &'static str {
    match key {
        "pre-install" => "certd@oem-prep",
        "distribute" => "certd@mesh-sync",
        "reset" => "certd@factory-reset",
        _ => STANDBY_PROMPT,
    }
}

fn build_steps(rows: &[StepRow], numbered: bool) -> Vec<Step> {
    rows.iter()
        .enumerate()
        .map(|(index, (id, title, description))| {
            let step = Step::new(*id, *title).with_description(*description);
            if numbered {
                step.with_meta(format!("STEP {:02}", index + 1))
            } else {
                step
            }
        })
        .collect()
}

// ============================================================================
// Catalog
// ============================================================================

/// Lookup table of every workflow the dashboard can run
#[derive(Debug, Clone)]
pub struct WorkflowCatalog {
    charging: Arc<WorkflowDefinition>,
    certificates: HashMap<&'static str, Arc<WorkflowDefinition>>,
    fallback: Arc<WorkflowDefinition>,
}

impl WorkflowCatalog {
    pub fn new(charging_duration: Duration, certificate_duration: Duration) -> Self {
        let charging = Arc::new(WorkflowDefinition {
            key: CHARGING_KEY.to_string(),
            label: "Charging Session".to_string(),
            prompt: CHARGING_PROMPT.to_string(),
            kind: WorkflowKind::Charging,
            steps: build_steps(CHARGING_STEPS, false),
            step_log: StepLogPolicy::Completion,
            track_bundle: false,
            milestones: CHARGING_MILESTONES,
            completion: CHARGING_COMPLETION,
            duration: charging_duration,
        });

        let certificates = CERTIFICATE_ACTIONS
            .iter()
            .map(|action| {
                let rows = match action.key {
                    "pre-install" => PRE_INSTALL_STEPS,
                    "distribute" => DISTRIBUTE_STEPS,
                    _ => RESET_STEPS,
                };
                let definition = WorkflowDefinition {
                    key: action.key.to_string(),
                    label: action.label.to_string(),
                    prompt: certificate_prompt(action.key).to_string(),
                    kind: WorkflowKind::Certificate,
                    steps: build_steps(rows, true),
                    step_log: StepLogPolicy::Tracked,
                    track_bundle: true,
                    milestones: CERTIFICATE_MILESTONES,
                    completion: certificate_completion(action.key),
                    duration: certificate_duration,
                };
                (action.key, Arc::new(definition))
            })
            .collect();

        let fallback = Arc::new(WorkflowDefinition {
            key: DEFAULT_KEY.to_string(),
            label: "Certificate Workflow".to_string(),
            prompt: STANDBY_PROMPT.to_string(),
            kind: WorkflowKind::Certificate,
            steps: Vec::new(),
            step_log: StepLogPolicy::Tracked,
            track_bundle: true,
            milestones: CERTIFICATE_MILESTONES,
            completion: DEFAULT_COMPLETION,
            duration: certificate_duration,
        });

        Self {
            charging,
            certificates,
            fallback,
        }
    }

    pub fn charging(&self) -> Arc<WorkflowDefinition> {
        self.charging.clone()
    }

    /// Certificate workflow for `key`; unknown keys get the default entry
    pub fn certificate(&self, key: &str) -> Arc<WorkflowDefinition> {
        self.certificates
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// The idle certificate workflow
    pub fn certificate_fallback(&self) -> Arc<WorkflowDefinition> {
        self.fallback.clone()
    }

    pub fn certificate_actions(&self) -> &'static [ActionDescriptor] {
        CERTIFICATE_ACTIONS
    }

    pub fn charging_actions(&self) -> &'static [ActionDescriptor] {
        CHARGING_ACTIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> WorkflowCatalog {
        WorkflowCatalog::new(Duration::from_millis(8000), Duration::from_millis(10000))
    }

    #[test]
    fn test_charging_workflow() {
        let charging = catalog().charging();
        assert_eq!(charging.key, "charging");
        assert_eq!(charging.steps.len(), 10);
        assert_eq!(charging.steps[0].id, "handshake");
        assert_eq!(charging.steps[9].id, "complete");
        assert_eq!(charging.step_log, StepLogPolicy::Completion);
        assert!(!charging.track_bundle);
        assert_eq!(charging.duration, Duration::from_millis(8000));
    }

    #[test]
    fn test_certificate_workflows() {
        let catalog = catalog();
        for (key, prompt, first_step) in [
            ("pre-install", "certd@oem-prep", "diagnostics"),
            ("distribute", "certd@mesh-sync", "mesh-scan"),
            ("reset", "certd@factory-reset", "drain"),
        ] {
            let workflow = catalog.certificate(key);
            assert_eq!(workflow.key, key);
            assert_eq!(workflow.prompt, prompt);
            assert_eq!(workflow.steps.len(), 4);
            assert_eq!(workflow.steps[0].id, first_step);
            assert_eq!(workflow.steps[0].meta.as_deref(), Some("STEP 01"));
            assert_eq!(workflow.steps[3].meta.as_deref(), Some("STEP 04"));
        }
        assert_eq!(catalog.certificate("distribute").completion.meta, "SYNC");
    }

    #[test]
    fn test_unknown_key_falls_back_to_default() {
        let workflow = catalog().certificate("format-c");
        assert_eq!(workflow.key, "default");
        assert!(workflow.steps.is_empty());
        assert_eq!(workflow.completion.label, "Workflow complete");
        assert_eq!(workflow.prompt, STANDBY_PROMPT);
    }

    #[test]
    fn test_charging_action_keys() {
        for action in [ChargingAction::Start, ChargingAction::End, ChargingAction::Reset] {
            assert_eq!(ChargingAction::from_key(action.as_str()), Some(action));
        }
        assert_eq!(ChargingAction::from_key("pause"), None);
    }

    #[test]
    fn test_charging_descriptors_match_actions() {
        let keys: Vec<_> = catalog()
            .charging_actions()
            .iter()
            .map(|descriptor| ChargingAction::from_key(descriptor.key))
            .collect();
        assert_eq!(
            keys,
            vec![
                Some(ChargingAction::Start),
                Some(ChargingAction::End),
                Some(ChargingAction::Reset)
            ]
        );
    }
}
