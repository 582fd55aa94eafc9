//! Error taxonomy for the verified core boundary.
//!
//! Pure decision components never construct these: they are total and return
//! values. Only the runtime boundary converts transport and validation
//! failures into `CoreError`, and only genuine I/O failures are fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// A shell callback (`llm_call` / `execute_tool`) answered with an error.
    /// Recovered into data by the agent loop, never fatal.
    #[error("callback failed: {0}")]
    Callback(String),
    /// Framing or stdio failure. Fatal: the core exits nonzero.
    #[error("transport error: {0}")]
    Transport(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
