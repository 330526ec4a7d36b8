//! Error types for the solver client, stores and dispatch cycles.

use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the route optimization service.
///
/// Every variant is recoverable while evaluating candidate vehicles: the
/// candidate is skipped and the cycle moves on.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("solver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("solver API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("malformed solver response: {0}")]
    MalformedResponse(String),
}

impl SolverError {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

#[derive(Debug, Error)]
pub enum PolylineError {
    #[error("encoded polyline ended in the middle of a value")]
    Truncated,

    #[error("invalid polyline character {character:?} at position {position}")]
    InvalidCharacter { position: usize, character: char },

    #[error("polyline value starting before position {position} overflows")]
    Overflow { position: usize },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access fleet state at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fleet state at {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a whole dispatch cycle. The caller's state is left untouched.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no vehicle can serve the request; provisioning vehicle {vehicle_id} failed: {source}")]
    NoFeasibleVehicle {
        vehicle_id: u32,
        #[source]
        source: SolverError,
    },

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("collection already requested for dustbin {dustbin_id}")]
    DuplicateRequest { dustbin_id: String },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
