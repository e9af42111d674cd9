//! CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// CLI errors.
///
/// Only startup errors reach `main`; errors inside the command loop are
/// printed and the loop continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid or credentials are missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred on the terminal.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
