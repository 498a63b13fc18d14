//! # Error Types
//!
//! Domain-specific error types for rcreyes-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rcreyes-core errors (this file)                                       │
//! │  ├── CoreError        - Transition, timing and tariff failures         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rcreyes-engine errors (separate crate)                                │
//! │  └── EngineError      - Lookup, version conflicts, config              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → hosting service     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Clock skew during billing is NOT an error. It is reported through
//! [`NegativeDurationAnomaly`](crate::interval::NegativeDurationAnomaly)
//! on the resulting charge so an operator can always close a ticket.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{TicketEvent, TicketState};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is a synchronous, typed rejection. None of them are retried
/// inside the core: the caller re-reads the ticket and decides.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A transition was attempted on a closed or cancelled ticket.
    #[error("Ticket {ticket_id} is {state}, cannot {event}")]
    TerminalState {
        ticket_id: String,
        state: TicketState,
        event: TicketEvent,
    },

    /// Pause requested while a pause interval is already open.
    #[error("Ticket is already paused")]
    AlreadyPaused,

    /// Resume requested while no pause interval is open.
    #[error("Ticket is not paused")]
    NotPaused,

    /// The supplied instant precedes a timestamp already recorded.
    ///
    /// ## When This Occurs
    /// - Resuming at a time before the pause started
    /// - Any transition dated before the ticket's entry time
    /// - A host clock jumping backwards between two operator actions
    #[error("Timestamp {at} precedes recorded timestamp {earliest}")]
    InvalidTimestamp {
        at: DateTime<Utc>,
        earliest: DateTime<Utc>,
    },

    /// Tariff or membership input is malformed.
    #[error("Invalid tariff: {reason}")]
    InvalidTariff { reason: String },

    /// Billing was attempted on a ticket that is already terminal.
    #[error("Ticket {ticket_id} is {state}; its charge can no longer change")]
    ClosedTicketImmutable {
        ticket_id: String,
        state: TicketState,
    },

    /// The tariff handed in is not the one referenced by the ticket.
    #[error("Ticket references tariff {expected}, got {actual}")]
    TariffMismatch { expected: String, actual: String },

    /// A persisted snapshot breaks a ticket invariant and cannot be restored.
    #[error("Inconsistent ticket snapshot: {reason}")]
    InconsistentSnapshot { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns true when the rejection came from the ticket's current state
    /// rather than from malformed input.
    ///
    /// Hosting services use this to decide between "re-read and show the
    /// operator the new state" and "reject the request outright".
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::TerminalState { .. }
                | CoreError::AlreadyPaused
                | CoreError::NotPaused
                | CoreError::ClosedTicketImmutable { .. }
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when check-in input doesn't meet requirements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed ticket code or QR payload).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state_message() {
        let err = CoreError::TerminalState {
            ticket_id: "RC-260114-7F3A".to_string(),
            state: TicketState::Closed,
            event: TicketEvent::Pause,
        };
        assert_eq!(err.to_string(), "Ticket RC-260114-7F3A is closed, cannot pause");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer name".to_string(),
        };
        assert_eq!(err.to_string(), "customer name is required");

        let err = ValidationError::OutOfRange {
            field: "person count".to_string(),
            min: 1,
            max: 50,
        };
        assert_eq!(err.to_string(), "person count must be between 1 and 50");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "tariff".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_state_conflict());
    }

    #[test]
    fn test_state_conflicts() {
        assert!(CoreError::AlreadyPaused.is_state_conflict());
        assert!(CoreError::NotPaused.is_state_conflict());
        assert!(!CoreError::InvalidTariff {
            reason: "negative".into()
        }
        .is_state_conflict());
    }
}
