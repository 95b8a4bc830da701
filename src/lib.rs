pub mod application;
pub mod endpoints;
pub mod services;
pub mod simulation;

// Re-export from application for convenience
pub use application::bootstrapper;
pub use application::config;
pub use application::error;
pub use application::state;
