pub mod certificates;
pub mod remote;
pub mod session;
pub mod timer;

pub use certificates::{CertificateSource, HttpCertificateSource, PreinstalledCertificate};
pub use remote::{RemoteError, RemoteShell};
pub use session::SessionManager;
