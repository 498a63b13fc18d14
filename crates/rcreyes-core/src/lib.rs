//! # rcreyes-core: Ticket and Billing Logic for the RC Reyes Track Desk
//!
//! Everything that decides how long a session ran and what it costs.
//! No I/O lives here: the caller supplies every timestamp.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       RC Reyes Desk Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard / Check-in Desk                    │   │
//! │  │    Check-in ──► Board ──► Pause/Resume ──► Close ──► Receipt   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               rcreyes-engine (per-ticket locking)               │   │
//! │  │    Clock, snapshot sink, config, tracing                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rcreyes-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐       │   │
//! │  │   │  ticket  │  │ interval │  │  tariff  │  │ billing  │       │   │
//! │  │   │  states  │  │  pauses  │  │  rates   │  │  charge  │       │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └──────────┘       │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK READS • INTEGER CENTS                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ticket`] - Ticket state machine and snapshots
//! - [`interval`] - Pause history and net active time
//! - [`tariff`] - Effective hourly rate from tariff and membership
//! - [`billing`] - Charge calculation and billing policy
//! - [`money`] - Integer-cent money with explicit rounding
//! - [`types`] - Identifiers, states, tariffs, memberships
//! - [`validation`] - Check-in and lookup input rules
//! - [`format`] - Display helpers
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use rcreyes_core::{BillingPolicy, CheckInRules, Membership, MembershipTier, NewTicket, Tariff, Ticket};
//!
//! let entry = Utc.with_ymd_and_hms(2026, 1, 14, 16, 0, 0).unwrap();
//! let request = NewTicket {
//!     customer_name: None,
//!     person_count: 1,
//!     print_individually: false,
//!     tariff_id: "general".to_string(),
//!     membership_id: None,
//! };
//!
//! let ticket = Ticket::check_in(request, &CheckInRules::default(), entry).unwrap();
//! let closed = ticket
//!     .close(
//!         entry + Duration::minutes(90),
//!         &Tariff::new("general", "Pista general", 10000),
//!         &Membership::from_tier(MembershipTier::Premium),
//!         &BillingPolicy::default(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(closed.charge().unwrap().amount_cents, 13500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod format;
pub mod interval;
pub mod money;
pub mod tariff;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use billing::{compute_charge, BillingPolicy, Charge, HeadcountPolicy, MinuteRounding};
pub use error::{CoreError, CoreResult, ValidationError};
pub use interval::{NegativeDurationAnomaly, NetDuration, PauseInterval, PauseLog};
pub use money::{Money, RoundingMode};
pub use tariff::resolve_rate;
pub use ticket::{CheckInRules, NewTicket, Ticket, TicketSnapshot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of generated ticket codes (`RC-260114-7F3A`).
pub const DEFAULT_CODE_PREFIX: &str = "RC";

/// Largest group a single ticket may cover.
pub const DEFAULT_MAX_PERSONS: u32 = 50;

/// Longest ticket code accepted from a scanner or keyboard.
pub const MAX_CODE_LENGTH: usize = 32;

pub const MAX_CUSTOMER_NAME_LENGTH: usize = 120;

/// Scheme printed in ticket QR codes: `RCREYES:{code}`.
pub const QR_PAYLOAD_PREFIX: &str = "RCREYES";
