//! Errors surfaced by handles, materializers and the scheduler.

use jsonslice_core::{DocumentError, ParseError, PathError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The tape is corrupt at some node. Fatal to the traversal only.
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("invalid budget: {0} (must be a positive duration)")]
    InvalidBudget(String),

    /// The scheduler was dropped before the request completed.
    #[error("materialization abandoned before completion")]
    Abandoned,

    #[error("parse worker terminated unexpectedly")]
    WorkerLost,
}

pub type Result<T> = std::result::Result<T, Error>;
