//! Crate-level error type

use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Malformed registration body: {0}")]
    MalformedRegistration(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
