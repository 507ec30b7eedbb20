//! Error types for the simulation engine.
//!
//! Only two things can go wrong in the engine: it can be configured badly, or
//! the breeding collaborator can fail. Everything else degrades to neutral
//! values locally.

use thiserror::Error;

/// Failures of the breeding collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BreedingError {
    /// Connection, DNS or other transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status
    #[error("Breeding service returned status {0}")]
    Status(u16),

    /// Request exceeded its deadline
    #[error("Breeding request timed out")]
    Timeout,

    /// Response body was not an array of offspring genomes
    #[error("Malformed breeding response: {0}")]
    Malformed(String),

    /// Response was a well-formed but empty array
    #[error("Breeding response contained no offspring")]
    EmptyResponse,

    /// The request itself could not be built
    #[error("Invalid breeding request: {0}")]
    InvalidRequest(String),
}

impl BreedingError {
    #[must_use]
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    #[must_use]
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::Malformed(msg.into())
    }

    #[must_use]
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Malformed(_) | Self::EmptyResponse | Self::InvalidRequest(_) => false,
        }
    }
}

/// Main error type of the engine.
#[derive(Error, Debug)]
pub enum SimError {
    /// Configuration rejected before start
    #[error("Invalid configuration: {0}")]
    Config(#[from] anyhow::Error),

    /// Operation not allowed in the current lifecycle state
    #[error("Cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: shoal_data::SimState,
    },

    /// Breeding collaborator failure
    #[error(transparent)]
    Breeding(#[from] BreedingError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, SimError>;

impl SimError {
    #[must_use]
    pub fn invalid_state(action: &'static str, state: shoal_data::SimState) -> Self {
        Self::InvalidState { action, state }
    }
}
