//! Progress milestones and their deterministic log text.
//!
//! The detail text of a milestone is a pure function of the session token and
//! the milestone index, so replaying a session with the same token produces
//! byte-identical log lines.

use std::collections::HashSet;

/// A progress threshold that produces one log entry per session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Milestone {
    pub threshold: f64,
    pub meta: &'static str,
    pub label: &'static str,
}

/// Template for a synthesized telemetry reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub text: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Thresholds in ascending order plus the readings used for their detail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MilestoneSet {
    pub milestones: &'static [Milestone],
    pub readings: &'static [Reading],
}

impl MilestoneSet {
    pub const fn empty() -> Self {
        Self {
            milestones: &[],
            readings: &[],
        }
    }
}

pub const CHARGING_MILESTONES: MilestoneSet = MilestoneSet {
    milestones: &[
        Milestone { threshold: 0.05, meta: "M05", label: "Session telemetry online" },
        Milestone { threshold: 0.20, meta: "M20", label: "Power delivery negotiated" },
        Milestone { threshold: 0.40, meta: "M40", label: "Thermal envelope sampled" },
        Milestone { threshold: 0.60, meta: "M60", label: "Cell balance check" },
        Milestone { threshold: 0.80, meta: "M80", label: "Taper curve engaged" },
        Milestone { threshold: 0.95, meta: "M95", label: "Final insulation check" },
    ],
    readings: &[
        Reading { text: "Pack voltage", unit: "V", min: 380.0, max: 420.0 },
        Reading { text: "Charging current", unit: "A", min: 90.0, max: 180.0 },
        Reading { text: "Cell temperature", unit: "°C", min: 24.0, max: 38.0 },
        Reading { text: "Grid frequency", unit: "Hz", min: 49.9, max: 50.1 },
        Reading { text: "Isolation resistance", unit: "kΩ", min: 500.0, max: 1200.0 },
    ],
};

pub const CERTIFICATE_MILESTONES: MilestoneSet = MilestoneSet {
    milestones: &[
        Milestone { threshold: 0.05, meta: "M05", label: "Controller session opened" },
        Milestone { threshold: 0.20, meta: "M20", label: "Trust chain resolved" },
        Milestone { threshold: 0.40, meta: "M40", label: "Secure element responding" },
        Milestone { threshold: 0.60, meta: "M60", label: "Bundle checksum verified" },
        Milestone { threshold: 0.80, meta: "M80", label: "Revocation status fetched" },
        Milestone { threshold: 0.95, meta: "M95", label: "Audit record sealed" },
    ],
    readings: &[
        Reading { text: "Handshake round trip", unit: "ms", min: 12.0, max: 80.0 },
        Reading { text: "Transfer throughput", unit: "KB/s", min: 120.0, max: 900.0 },
        Reading { text: "Signature check latency", unit: "ms", min: 3.0, max: 25.0 },
        Reading { text: "HSM queue depth", unit: "jobs", min: 0.0, max: 6.0 },
    ],
};

/// SplitMix64 finalizer over the token and index
fn mix(token: i64, index: usize) -> u64 {
    let mut z = (token as u64) ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Deterministic sample in `[0, 1)` for a token and index
pub fn unit_sample(token: i64, index: usize) -> f64 {
    (mix(token, index) >> 11) as f64 / (1u64 << 53) as f64
}

/// Detail line for milestone `index` of a session
pub fn synth_detail(set: &MilestoneSet, token: i64, index: usize) -> Option<String> {
    if set.readings.is_empty() {
        return None;
    }
    let reading = &set.readings[(mix(token, index) % set.readings.len() as u64) as usize];
    let value = reading.min + (reading.max - reading.min) * unit_sample(token, index);
    Some(format!("{}: {:.1} {}", reading.text, value, reading.unit))
}

/// Key used to remember that a milestone was emitted for a session
pub fn dedup_key(meta: &str, token: i64) -> String {
    format!("{}-{}", meta, token)
}

/// Per-session record of which milestones have fired
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    emitted: HashSet<String>,
    last_index: Option<usize>,
}

impl MilestoneTracker {
    /// Returns the milestone to emit for `progress`, if any.
    ///
    /// Only the highest crossed threshold fires; thresholds it jumped over are
    /// consumed so emitted milestones stay in ascending order.
    pub fn advance(&mut self, milestones: &[Milestone], progress: f64, token: i64) -> Option<usize> {
        let crossed = milestones.iter().rposition(|m| progress >= m.threshold)?;
        if matches!(self.last_index, Some(last) if crossed <= last) {
            return None;
        }
        self.last_index = Some(crossed);

        if self.emitted.insert(dedup_key(milestones[crossed].meta, token)) {
            Some(crossed)
        } else {
            None
        }
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted.len()
    }
}
