//! Pieces shared by the server binary and embedders.

#[cfg(feature = "logging")]
pub mod logging;

#[cfg(feature = "logging")]
pub use logging::init_logging;
