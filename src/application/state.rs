use std::sync::Arc;

use crate::config::simulation::SimulationConfig;
use crate::services::{CertificateSource, SessionManager};
use crate::simulation::bundle::fallback_bundle;
use crate::simulation::{Session, WorkflowCatalog};

/// Shared certificate inventory client
pub type SharedCertificateSource = Arc<dyn CertificateSource>;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<WorkflowCatalog>,
    pub charging: SessionManager,
    pub certificates: SessionManager,
    pub certificate_source: SharedCertificateSource,
}

impl AppState {
    pub fn new(simulation: &SimulationConfig, certificate_source: SharedCertificateSource) -> Self {
        let catalog = Arc::new(WorkflowCatalog::new(
            simulation.charging_duration,
            simulation.certificate_duration,
        ));

        let charging = SessionManager::new(
            "charging",
            Session::new(catalog.charging()),
            simulation.tick_interval,
        );
        let certificates = SessionManager::new(
            "certificates",
            Session::new(catalog.certificate_fallback()).with_bundle(fallback_bundle()),
            simulation.tick_interval,
        );

        Self {
            catalog,
            charging,
            certificates,
            certificate_source,
        }
    }
}
