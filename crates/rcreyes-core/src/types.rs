//! # Domain Types
//!
//! Core domain types used throughout the ticket engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TicketId     │   │   TicketCode    │   │   TicketState   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  UUID v4        │   │  RC-260114-7F3A │   │  Active         │       │
//! │  │  (internal)     │   │  (QR / humans)  │   │  Paused         │       │
//! │  └─────────────────┘   └─────────────────┘   │  Closed   ■     │       │
//! │                                              │  Cancelled ■    │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   └─────────────────┘       │
//! │  │     Tariff      │   │   Membership    │        ■ = terminal         │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  id, name       │   │  tier           │                             │
//! │  │  base_rate      │   │  discount %     │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every ticket has:
//! - `id`: UUID v4 - immutable, used by the engine and the store
//! - `code`: short human-presentable code printed on the receipt's QR

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Ticket Identity
// =============================================================================

/// Internal ticket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(Uuid);

impl TicketId {
    pub fn new() -> Self {
        TicketId(Uuid::new_v4())
    }

    pub const fn from_uuid(id: Uuid) -> Self {
        TicketId(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TicketId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(TicketId)
            .map_err(|_| ValidationError::InvalidFormat {
                field: "ticket id".to_string(),
                reason: "must be a valid UUID".to_string(),
            })
    }
}

/// Human-presentable ticket code.
///
/// ## Format
/// `{PREFIX}-{YYMMDD}-{XXXX}`
/// - PREFIX: Desk prefix (default `RC`)
/// - YYMMDD: Check-in date
/// - XXXX: Four uppercase hex characters taken from the ticket UUID
///
/// ## Example
/// `RC-260114-7F3A`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketCode(String);

impl TicketCode {
    /// Length of `-{YYMMDD}-{XXXX}` appended to the desk prefix.
    pub const SUFFIX_LEN: usize = 12;

    /// Builds the code for a ticket checked in at `entry_time`.
    ///
    /// The prefix is normalized the same way scanned codes are, so a
    /// generated code always matches its own lookup.
    pub fn generate(prefix: &str, id: &TicketId, entry_time: DateTime<Utc>) -> Self {
        let suffix: String = id
            .as_uuid()
            .simple()
            .to_string()
            .chars()
            .take(4)
            .collect::<String>()
            .to_uppercase();

        TicketCode(format!(
            "{}-{}-{}",
            prefix.trim().to_uppercase(),
            entry_time.format("%y%m%d"),
            suffix
        ))
    }

    /// Wraps an existing code (e.g. read back from the store).
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        crate::validation::validate_ticket_code(code)?;
        Ok(TicketCode(code.trim().to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Ticket State & Events
// =============================================================================

/// The lifecycle state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    /// On track, time is accruing.
    #[default]
    Active,
    /// On a break, time is not accruing.
    Paused,
    /// Checked out and billed.
    Closed,
    /// Discarded without billing (erroneous check-in).
    Cancelled,
}

impl TicketState {
    /// Closed and cancelled tickets never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, TicketState::Closed | TicketState::Cancelled)
    }

    /// Active or paused: shown on the dashboard board.
    pub const fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    /// Looks up the transition table.
    ///
    /// ```text
    /// ┌──────────┬─────────┬──────────┐
    /// │ From     │ Event   │ To       │
    /// ├──────────┼─────────┼──────────┤
    /// │ active   │ pause   │ paused   │
    /// │ paused   │ resume  │ active   │
    /// │ active   │ close   │ closed   │
    /// │ paused   │ close   │ closed   │
    /// │ active   │ cancel  │ cancelled│
    /// │ paused   │ cancel  │ cancelled│
    /// └──────────┴─────────┴──────────┘
    /// ```
    ///
    /// Returns `None` for every other combination.
    pub const fn next(&self, event: TicketEvent) -> Option<TicketState> {
        match (self, event) {
            (TicketState::Active, TicketEvent::Pause) => Some(TicketState::Paused),
            (TicketState::Paused, TicketEvent::Resume) => Some(TicketState::Active),
            (TicketState::Active | TicketState::Paused, TicketEvent::Close) => {
                Some(TicketState::Closed)
            }
            (TicketState::Active | TicketState::Paused, TicketEvent::Cancel) => {
                Some(TicketState::Cancelled)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketState::Active => write!(f, "active"),
            TicketState::Paused => write!(f, "paused"),
            TicketState::Closed => write!(f, "closed"),
            TicketState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Parses both the engine's names and the Spanish values the hosted store
/// keeps in its `estado` column.
impl std::str::FromStr for TicketState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" | "activo" => Ok(TicketState::Active),
            "paused" | "pausado" => Ok(TicketState::Paused),
            "closed" | "cerrado" => Ok(TicketState::Closed),
            "cancelled" | "canceled" | "cancelado" => Ok(TicketState::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "state".to_string(),
                allowed: vec![
                    "active".to_string(),
                    "paused".to_string(),
                    "closed".to_string(),
                    "cancelled".to_string(),
                ],
            }),
        }
    }
}

/// An operator action on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TicketEvent {
    Pause,
    Resume,
    Close,
    Cancel,
}

impl TicketEvent {
    pub const ALL: [TicketEvent; 4] = [
        TicketEvent::Pause,
        TicketEvent::Resume,
        TicketEvent::Close,
        TicketEvent::Cancel,
    ];
}

impl fmt::Display for TicketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketEvent::Pause => write!(f, "pause"),
            TicketEvent::Resume => write!(f, "resume"),
            TicketEvent::Close => write!(f, "close"),
            TicketEvent::Cancel => write!(f, "cancel"),
        }
    }
}

// =============================================================================
// Tariff
// =============================================================================

/// An hourly rate plan. Read-only input supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tariff {
    /// Tariff identifier as stored by the host.
    pub id: String,

    /// Display name (e.g. "Pista general").
    pub name: String,

    /// Base hourly rate in cents.
    pub base_rate_cents: i64,
}

impl Tariff {
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_rate_cents: i64) -> Self {
        Tariff {
            id: id.into(),
            name: name.into(),
            base_rate_cents,
        }
    }

    #[inline]
    pub fn base_rate(&self) -> Money {
        Money::from_cents(self.base_rate_cents)
    }
}

// =============================================================================
// Membership
// =============================================================================

/// Membership tier carried by a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MembershipTier {
    #[default]
    None,
    Basic,
    Premium,
    Vip,
}

impl MembershipTier {
    pub const ALL: [MembershipTier; 4] = [
        MembershipTier::None,
        MembershipTier::Basic,
        MembershipTier::Premium,
        MembershipTier::Vip,
    ];

    /// Discount percentage granted by the tier.
    pub const fn discount_percent(&self) -> u8 {
        match self {
            MembershipTier::None => 0,
            MembershipTier::Basic => 5,
            MembershipTier::Premium => 10,
            MembershipTier::Vip => 15,
        }
    }

    /// Label shown on the dashboard badge.
    pub const fn label(&self) -> &'static str {
        match self {
            MembershipTier::None => "No membership",
            MembershipTier::Basic => "Basic (5%)",
            MembershipTier::Premium => "Premium (10%)",
            MembershipTier::Vip => "VIP (15%)",
        }
    }
}

impl fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipTier::None => write!(f, "none"),
            MembershipTier::Basic => write!(f, "basic"),
            MembershipTier::Premium => write!(f, "premium"),
            MembershipTier::Vip => write!(f, "vip"),
        }
    }
}

/// Accepts the engine's names and the store's Spanish ones.
impl std::str::FromStr for MembershipTier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "ninguna" => Ok(MembershipTier::None),
            "basic" | "basica" | "básica" => Ok(MembershipTier::Basic),
            "premium" => Ok(MembershipTier::Premium),
            "vip" => Ok(MembershipTier::Vip),
            _ => Err(ValidationError::NotAllowed {
                field: "membership tier".to_string(),
                allowed: MembershipTier::ALL.iter().map(|t| t.to_string()).collect(),
            }),
        }
    }
}

/// A customer's membership as read from the store.
///
/// `discount_percent` is carried separately from the tier because it comes
/// from the store verbatim; [`resolve_rate`](crate::tariff::resolve_rate)
/// rejects anything outside the tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Membership {
    pub id: Option<String>,
    pub tier: MembershipTier,
    pub discount_percent: u8,
}

impl Membership {
    /// Walk-in customer, no discount.
    pub fn none() -> Self {
        Membership::from_tier(MembershipTier::None)
    }

    /// Membership with the tier's standard discount.
    pub fn from_tier(tier: MembershipTier) -> Self {
        Membership {
            id: None,
            tier,
            discount_percent: tier.discount_percent(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Default for Membership {
    fn default() -> Self {
        Membership::none()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
