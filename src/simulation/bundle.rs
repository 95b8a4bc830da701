//! Certificate bundle projection.

use serde::{Deserialize, Serialize};

use super::steps::clamp_progress;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    #[default]
    Queued,
    Transferring,
    Verified,
    /// Only set by a caller that supplies explicit statuses; the simulation
    /// never produces it.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDescriptor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CertificateStatus>,
}

impl CertificateDescriptor {
    fn oem(id: &str, name: &str, issued_by: &str, size: &str, fingerprint: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            issued_by: Some(issued_by.to_string()),
            size: Some(size.to_string()),
            fingerprint: Some(fingerprint.to_string()),
            status: None,
        }
    }
}

/// Bundle item with its derived status filled in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleItem {
    #[serde(flatten)]
    pub certificate: CertificateDescriptor,
    pub derived_status: CertificateStatus,
}

/// Aggregate state shown on the transfer card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Idle,
    Transferring,
    Completed,
    Failed,
}

/// Default OEM bundle shipped to the vehicle controller
pub fn fallback_bundle() -> Vec<CertificateDescriptor> {
    vec![
        CertificateDescriptor::oem(
            "root-ca",
            "Root CA",
            "OEM Root Authority",
            "2.1 KB",
            "35:7F:1C:9A",
        ),
        CertificateDescriptor::oem(
            "intermediate-ca",
            "Intermediate CA",
            "OEM Trust Chain",
            "3.8 KB",
            "AB:49:7E:DD",
        ),
        CertificateDescriptor::oem(
            "evcc-leaf",
            "EVCC Client Certificate",
            "OEM PKI",
            "1.5 KB",
            "9C:11:3B:FA",
        ),
    ]
}

/// Index of the certificate currently in transfer
pub fn active_certificate_index(progress: f64, total: usize) -> usize {
    let total = total.max(1);
    let scaled = clamp_progress(progress) * total as f64;
    (scaled.floor() as usize).min(total - 1)
}

/// Derive the status of every certificate in the bundle.
///
/// Explicit statuses win: as soon as one item carries a status, the bundle is
/// taken as supplied and missing statuses read as `Queued`.
pub fn derive_statuses(
    items: &[CertificateDescriptor],
    progress: f64,
    is_active: bool,
) -> Vec<CertificateStatus> {
    if items.iter().any(|item| item.status.is_some()) {
        return items
            .iter()
            .map(|item| item.status.unwrap_or_default())
            .collect();
    }

    let progress = clamp_progress(progress);

    if progress >= 1.0 {
        return vec![CertificateStatus::Verified; items.len()];
    }
    if !is_active {
        return vec![CertificateStatus::Queued; items.len()];
    }

    let active = active_certificate_index(progress, items.len());
    (0..items.len())
        .map(|index| match index.cmp(&active) {
            std::cmp::Ordering::Less => CertificateStatus::Verified,
            std::cmp::Ordering::Equal => CertificateStatus::Transferring,
            std::cmp::Ordering::Greater => CertificateStatus::Queued,
        })
        .collect()
}

pub fn project_bundle(
    items: &[CertificateDescriptor],
    progress: f64,
    is_active: bool,
) -> Vec<BundleItem> {
    items
        .iter()
        .cloned()
        .zip(derive_statuses(items, progress, is_active))
        .map(|(certificate, derived_status)| BundleItem {
            certificate,
            derived_status,
        })
        .collect()
}

pub fn transfer_status(statuses: &[CertificateStatus], progress: f64, is_active: bool) -> TransferStatus {
    if statuses.contains(&CertificateStatus::Failed) {
        TransferStatus::Failed
    } else if clamp_progress(progress) >= 1.0 {
        TransferStatus::Completed
    } else if is_active {
        TransferStatus::Transferring
    } else {
        TransferStatus::Idle
    }
}
