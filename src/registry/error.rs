//! Registry error types
//!
//! Error types for application registry operations.

use thiserror::Error;

use super::envelope::AppId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No application was registered under this id
    #[error("Application not found: {0}")]
    ApplicationNotFound(AppId),
    /// The application's dispatcher task is no longer running
    #[error("Dispatcher for application {0} is not running")]
    DispatcherClosed(AppId),
}
