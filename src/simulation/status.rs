//! Labels derived from session state for the controller card and terminal.

use serde::Serialize;

use super::steps::clamp_progress;

/// State shown on the EVCC controller card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControllerStatus {
    PluggedIn,
    ReadyToCharge,
    Charging,
    Completed,
}

pub fn controller_status(progress: f64, is_active: bool) -> ControllerStatus {
    let progress = clamp_progress(progress);
    if progress >= 1.0 {
        ControllerStatus::Completed
    } else if is_active {
        if progress > 0.0 {
            ControllerStatus::Charging
        } else {
            ControllerStatus::ReadyToCharge
        }
    } else if progress > 0.0 {
        ControllerStatus::ReadyToCharge
    } else {
        ControllerStatus::PluggedIn
    }
}

/// Whole percent, rounded down
pub fn percent(progress: f64) -> u8 {
    (clamp_progress(progress) * 100.0).floor() as u8
}

/// Footer line under the terminal. `workflow_label` is `None` while idle.
pub fn footer_note(workflow_label: Option<&str>, progress: f64, is_active: bool) -> String {
    match workflow_label {
        None => "Idle · Awaiting workflow".to_string(),
        Some(_) if clamp_progress(progress) >= 1.0 => {
            "Workflow complete · Audit log stored".to_string()
        }
        Some(label) if is_active => format!("Executing {} pipeline", label),
        Some(label) => format!("{} ready to run", label),
    }
}

/// Remaining time as shown on the transfer card
pub fn eta_label(eta_seconds: Option<u64>, is_active: bool) -> String {
    match eta_seconds {
        None if is_active => "Calculating".to_string(),
        None => "-".to_string(),
        Some(0) => "00s".to_string(),
        Some(seconds) if seconds < 60 => format!("{:02}s", seconds),
        Some(seconds) => format!("{}m {:02}s", seconds / 60, seconds % 60),
    }
}
