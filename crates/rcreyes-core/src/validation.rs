//! # Validation Module
//!
//! Input validation for check-in and lookup.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard (TypeScript)                                       │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Person count bounds, names, codes                                 │
//! │  └── QR payload parsing                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ticket State Machine                                         │
//! │  └── Transition legality, timestamp ordering                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::TicketCode;
use crate::{MAX_CODE_LENGTH, MAX_CUSTOMER_NAME_LENGTH, QR_PAYLOAD_PREFIX};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a ticket code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Only letters, digits and hyphens
///
/// ```rust
/// use rcreyes_core::validation::validate_ticket_code;
///
/// assert!(validate_ticket_code("RC-260114-7F3A").is_ok());
/// assert!(validate_ticket_code("").is_err());
/// assert!(validate_ticket_code("RC 260114").is_err());
/// ```
pub fn validate_ticket_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "ticket code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "ticket code".to_string(),
            max: MAX_CODE_LENGTH,
        });
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "ticket code".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a desk prefix for generated ticket codes.
///
/// The full generated code (`{prefix}-{YYMMDD}-{XXXX}`) must itself pass
/// [`validate_ticket_code`], or the desk could never look its own tickets up.
pub fn validate_code_prefix(prefix: &str) -> ValidationResult<()> {
    let prefix = prefix.trim();
    let max = MAX_CODE_LENGTH - TicketCode::SUFFIX_LEN;

    validate_ticket_code(prefix).map_err(|e| match e {
        ValidationError::Required { .. } => ValidationError::Required {
            field: "code prefix".to_string(),
        },
        _ => ValidationError::InvalidFormat {
            field: "code prefix".to_string(),
            reason: "must contain only letters, numbers, and hyphens".to_string(),
        },
    })?;

    if prefix.len() > max {
        return Err(ValidationError::TooLong {
            field: "code prefix".to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional customer display name.
///
/// Returns the trimmed name, or `None` when it is blank.
pub fn validate_customer_name(name: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if name.chars().count() > MAX_CUSTOMER_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "customer name".to_string(),
            max: MAX_CUSTOMER_NAME_LENGTH,
        });
    }

    Ok(Some(name.to_string()))
}

/// Validates a tariff reference.
pub fn validate_tariff_id(tariff_id: &str) -> ValidationResult<()> {
    if tariff_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "tariff".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the number of people sharing a ticket.
///
/// ## Rules
/// - At least 1
/// - At most `max` (desk configuration)
pub fn validate_person_count(count: u32, max: u32) -> ValidationResult<()> {
    if count == 0 || count > max {
        return Err(ValidationError::OutOfRange {
            field: "person count".to_string(),
            min: 1,
            max: i64::from(max),
        });
    }

    Ok(())
}

// =============================================================================
// QR Payload
// =============================================================================

/// Extracts the ticket code from a scanned QR payload.
///
/// Printed tickets encode `RCREYES:{code}`. Hand-typed codes arrive without
/// the prefix; both are accepted and normalized to uppercase.
///
/// ```rust
/// use rcreyes_core::validation::parse_qr_payload;
///
/// assert_eq!(parse_qr_payload("RCREYES:RC-260114-7F3A").unwrap(), "RC-260114-7F3A");
/// assert_eq!(parse_qr_payload(" rc-260114-7f3a ").unwrap(), "RC-260114-7F3A");
/// assert!(parse_qr_payload("OTHERAPP:123").is_err());
/// ```
pub fn parse_qr_payload(payload: &str) -> ValidationResult<String> {
    parse_qr_payload_with_prefix(payload, QR_PAYLOAD_PREFIX)
}

/// Same as [`parse_qr_payload`] for desks that print their own scheme.
pub fn parse_qr_payload_with_prefix(payload: &str, scheme: &str) -> ValidationResult<String> {
    let payload = payload.trim();

    let code = match payload.split_once(':') {
        Some((prefix, code)) if prefix.eq_ignore_ascii_case(scheme) => code,
        Some((prefix, _)) => {
            return Err(ValidationError::InvalidFormat {
                field: "QR payload".to_string(),
                reason: format!("unknown prefix '{}'", prefix),
            })
        }
        None => payload,
    };

    validate_ticket_code(code)?;
    Ok(code.trim().to_uppercase())
}

// =============================================================================
// Unit Tests
// =============================================================================
