//! # Engine Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │    Registry     │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Core(..)       │  │  TicketNotFound │  │  InvalidConfig          │ │
//! │  │  (state machine,│  │  DuplicateTicket│  │  ConfigLoadFailed       │ │
//! │  │   billing,      │  │  VersionConflict│  │  ConfigSaveFailed       │ │
//! │  │   validation)   │  │  TicketStillOpen│  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rcreyes_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Rejected by the ticket state machine or billing calculator.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    #[error("Ticket already registered: {0}")]
    DuplicateTicket(String),

    /// The operator acted on a stale snapshot.
    #[error("Ticket {ticket_id} changed: expected version {expected}, found {actual}")]
    VersionConflict {
        ticket_id: String,
        expected: u64,
        actual: u64,
    },

    /// Only closed or cancelled tickets can leave the registry.
    #[error("Ticket {0} is still open")]
    TicketStillOpen(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Delivery Errors
    // =========================================================================
    /// The snapshot receiver has gone away.
    #[error("Snapshot sink closed")]
    SinkClosed,
}

impl EngineError {
    /// Returns true when re-reading the ticket and retrying may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::VersionConflict { .. })
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}
