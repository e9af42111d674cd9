use crate::model::ModelError;
use crate::session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not connected to any MCP server; use 'connect <path>' first")]
    SessionUnavailable,

    #[error("model call failed: {0}")]
    ModelCallFailed(#[from] ModelError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, Error>;
