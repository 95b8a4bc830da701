//! Step-status projection.
//!
//! Maps a normalized progress value onto an ordered list of steps. Every
//! consumer of progress goes through [`clamp_progress`] first.

use serde::{Deserialize, Serialize};

/// A named stage in an ordered workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Overrides the label written to the terminal log when the step completes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl Step {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            terminal_label: None,
            meta: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_terminal_label(mut self, label: impl Into<String>) -> Self {
        self.terminal_label = Some(label.into());
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Upcoming,
    Active,
    Completed,
}

/// Derived view of all steps for one progress value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProjection {
    pub active_index: usize,
    /// Fractional position inside the active step, used to fill the connector
    /// towards the next step
    pub step_progress: f64,
    pub statuses: Vec<StepStatus>,
}

/// Clamp a progress value into `[0, 1]`; non-finite values count as zero
pub fn clamp_progress(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Index of the active step, clamped to `[0, step_count - 1]`
pub fn active_index(progress: f64, step_count: usize) -> usize {
    if step_count == 0 {
        return 0;
    }
    let scaled = clamp_progress(progress) * step_count as f64;
    (scaled.floor() as usize).min(step_count - 1)
}

/// Project progress onto `step_count` steps
pub fn project_steps(progress: f64, step_count: usize, is_active: bool) -> StepProjection {
    if step_count == 0 {
        return StepProjection {
            active_index: 0,
            step_progress: 0.0,
            statuses: Vec::new(),
        };
    }

    let progress = clamp_progress(progress);
    let scaled = progress * step_count as f64;
    let active = active_index(progress, step_count);

    let step_progress = if progress >= 1.0 {
        1.0
    } else {
        scaled - scaled.floor()
    };

    let statuses = (0..step_count)
        .map(|index| step_status(index, active, progress, is_active))
        .collect();

    StepProjection {
        active_index: active,
        step_progress,
        statuses,
    }
}

/// Status of the step at `index` given the active index
pub fn step_status(index: usize, active: usize, progress: f64, is_active: bool) -> StepStatus {
    if progress >= 1.0 || index < active {
        StepStatus::Completed
    } else if index == active {
        if is_active {
            StepStatus::Active
        } else if progress > 0.0 {
            StepStatus::Completed
        } else {
            StepStatus::Upcoming
        }
    } else {
        StepStatus::Upcoming
    }
}
