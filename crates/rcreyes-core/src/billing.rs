//! # Billing Calculator
//!
//! Combines net active time with the resolved tariff into a [`Charge`].
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        compute_charge()                                 │
//! │                                                                         │
//! │  Ticket ──► PauseLog.net_active_duration(entry, now) ──► 90 min        │
//! │                                                      │                  │
//! │  Tariff + Membership ──► resolve_rate() ──► $90.00/h │                  │
//! │                                                      ▼                  │
//! │                               round(90 × 9000 / 60) = 13500 cents      │
//! │                                                      │                  │
//! │  HeadcountPolicy ──► × 1 (per session) or × persons  ▼                  │
//! │                                                   Charge $135.00        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::interval::NegativeDurationAnomaly;
use crate::money::{Money, RoundingMode};
use crate::tariff::resolve_rate_with;
use crate::ticket::Ticket;
use crate::types::{Membership, Tariff};

// =============================================================================
// Billing Policy
// =============================================================================

/// How partial minutes of net time are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinuteRounding {
    /// Only completed minutes are billed.
    #[default]
    Floor,
    /// Any started minute is billed.
    Ceil,
}

impl MinuteRounding {
    pub fn minutes(&self, duration: Duration) -> i64 {
        let seconds = duration.num_seconds().max(0);
        match self {
            MinuteRounding::Floor => seconds / 60,
            MinuteRounding::Ceil => (seconds + 59) / 60,
        }
    }
}

impl std::str::FromStr for MinuteRounding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "floor" => Ok(MinuteRounding::Floor),
            "ceil" | "ceiling" => Ok(MinuteRounding::Ceil),
            other => Err(format!(
                "Unknown minute rounding: '{}'. Valid options: floor, ceil",
                other
            )),
        }
    }
}

/// Whether the fare scales with the number of people on the ticket.
///
/// The desk has always billed the session, with person count only
/// deciding how many receipts are printed. `PerPerson` exists for desks
/// that rent per head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadcountPolicy {
    #[default]
    PerSession,
    PerPerson,
}

impl HeadcountPolicy {
    pub fn units(&self, person_count: u32) -> u32 {
        match self {
            HeadcountPolicy::PerSession => 1,
            HeadcountPolicy::PerPerson => person_count.max(1),
        }
    }
}

impl fmt::Display for HeadcountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadcountPolicy::PerSession => write!(f, "per_session"),
            HeadcountPolicy::PerPerson => write!(f, "per_person"),
        }
    }
}

impl std::str::FromStr for HeadcountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_session" | "session" => Ok(HeadcountPolicy::PerSession),
            "per_person" | "person" => Ok(HeadcountPolicy::PerPerson),
            other => Err(format!(
                "Unknown headcount policy: '{}'. Valid options: per_session, per_person",
                other
            )),
        }
    }
}

/// Business rules applied when turning time into money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingPolicy {
    #[serde(default)]
    pub rounding: RoundingMode,

    #[serde(default)]
    pub minute_rounding: MinuteRounding,

    #[serde(default)]
    pub headcount: HeadcountPolicy,
}

// =============================================================================
// Charge
// =============================================================================

/// The amount owed for a session.
///
/// Produced on close and frozen on the ticket. Live quotes use the same
/// shape but are never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Charge {
    /// Tariff the charge was computed against.
    pub tariff_id: String,

    /// Net active time, exact.
    pub net_active_seconds: i64,

    /// Net active time as billed (after minute rounding).
    pub net_active_minutes: i64,

    /// Tariff base rate per hour, in cents.
    pub base_rate_cents: i64,

    /// Membership discount applied to the rate.
    pub discount_percent: u8,

    /// Rate after discount, in cents per hour.
    pub effective_rate_cents: i64,

    /// 1 unless the headcount policy bills per person.
    pub persons_billed: u32,

    /// Fare at the undiscounted base rate.
    pub gross_cents: i64,

    /// `gross_cents - amount_cents`.
    pub discount_cents: i64,

    /// Final amount owed.
    pub amount_cents: i64,

    #[ts(as = "String")]
    pub computed_at: DateTime<Utc>,

    /// Set when clock skew forced the duration to be clamped.
    pub anomaly: Option<NegativeDurationAnomaly>,
}

impl Charge {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn effective_rate(&self) -> Money {
        Money::from_cents(self.effective_rate_cents)
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes the charge for an open ticket as of `now`.
///
/// The ticket's own pause history is used; a running pause is measured up
/// to `now`, so a quote on a paused ticket does not grow.
///
/// ## Errors
/// - `ClosedTicketImmutable` if the ticket is closed or cancelled
/// - `TariffMismatch` if `tariff` is not the ticket's tariff
/// - `InvalidTariff` from the rate resolver
pub fn compute_charge(
    ticket: &Ticket,
    tariff: &Tariff,
    membership: &Membership,
    now: DateTime<Utc>,
    policy: &BillingPolicy,
) -> CoreResult<Charge> {
    if ticket.state().is_terminal() {
        return Err(CoreError::ClosedTicketImmutable {
            ticket_id: ticket.code().to_string(),
            state: ticket.state(),
        });
    }

    if tariff.id != ticket.tariff_id() {
        return Err(CoreError::TariffMismatch {
            expected: ticket.tariff_id().to_string(),
            actual: tariff.id.clone(),
        });
    }

    let effective_rate = resolve_rate_with(tariff, membership, policy.rounding)?;
    let net = ticket
        .pauses()
        .net_active_duration(ticket.entry_time(), now);
    let minutes = policy.minute_rounding.minutes(net.active);
    let units = policy.headcount.units(ticket.person_count());

    let amount = effective_rate.mul_ratio(minutes, 60, policy.rounding) * units;
    let gross = tariff.base_rate().mul_ratio(minutes, 60, policy.rounding) * units;

    Ok(Charge {
        tariff_id: tariff.id.clone(),
        net_active_seconds: net.active.num_seconds(),
        net_active_minutes: minutes,
        base_rate_cents: tariff.base_rate_cents,
        discount_percent: membership.discount_percent,
        effective_rate_cents: effective_rate.cents(),
        persons_billed: units,
        gross_cents: gross.cents(),
        discount_cents: (gross - amount).cents(),
        amount_cents: amount.cents(),
        computed_at: now,
        anomaly: net.anomaly,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{CheckInRules, NewTicket};
    use crate::types::MembershipTier;
    use chrono::TimeZone;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 16, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn ticket(persons: u32) -> Ticket {
        let request = NewTicket {
            customer_name: Some("Carlos".to_string()),
            person_count: persons,
            print_individually: false,
            tariff_id: "general".to_string(),
            membership_id: None,
        };
        Ticket::check_in(request, &CheckInRules::default(), at(0)).unwrap()
    }

    #[test]
    fn test_ninety_minutes_with_premium_discount() {
        let tariff = Tariff::new("general", "Pista general", 10000);
        let membership = Membership::from_tier(MembershipTier::Premium);

        let charge = compute_charge(
            &ticket(1),
            &tariff,
            &membership,
            at(90),
            &BillingPolicy::default(),
        )
        .unwrap();

        assert_eq!(charge.net_active_minutes, 90);
        assert_eq!(charge.effective_rate_cents, 9000);
        assert_eq!(charge.amount_cents, 13500);
        assert_eq!(charge.gross_cents, 15000);
        assert_eq!(charge.discount_cents, 1500);
        assert_eq!(charge.amount().to_string(), "$135.00");
    }

    #[test]
    fn test_pause_is_not_billed() {
        let tariff = Tariff::new("general", "Pista general", 6000);
        let paused = ticket(1).pause(at(30)).unwrap();
        let resumed = paused.resume(at(60)).unwrap();

        let charge = compute_charge(
            &resumed,
            &tariff,
            &Membership::none(),
            at(120),
            &BillingPolicy::default(),
        )
        .unwrap();

        assert_eq!(charge.net_active_minutes, 90);
        assert_eq!(charge.amount_cents, 9000);
    }

    #[test]
    fn test_headcount_policy() {
        let tariff = Tariff::new("general", "Pista general", 6000);
        let group = ticket(4);

        let per_session =
            compute_charge(&group, &tariff, &Membership::none(), at(30), &BillingPolicy::default())
                .unwrap();
        assert_eq!(per_session.persons_billed, 1);
        assert_eq!(per_session.amount_cents, 3000);

        let policy = BillingPolicy {
            headcount: HeadcountPolicy::PerPerson,
            ..BillingPolicy::default()
        };
        let per_person =
            compute_charge(&group, &tariff, &Membership::none(), at(30), &policy).unwrap();
        assert_eq!(per_person.persons_billed, 4);
        assert_eq!(per_person.amount_cents, 12000);
    }

    #[test]
    fn test_minute_rounding() {
        let tariff = Tariff::new("general", "Pista general", 6000);
        let now = at(10) + Duration::seconds(20);

        let floor =
            compute_charge(&ticket(1), &tariff, &Membership::none(), now, &BillingPolicy::default())
                .unwrap();
        assert_eq!(floor.net_active_seconds, 620);
        assert_eq!(floor.net_active_minutes, 10);

        let policy = BillingPolicy {
            minute_rounding: MinuteRounding::Ceil,
            ..BillingPolicy::default()
        };
        let ceil = compute_charge(&ticket(1), &tariff, &Membership::none(), now, &policy).unwrap();
        assert_eq!(ceil.net_active_minutes, 11);
        assert_eq!(ceil.amount_cents, 1100);
    }

    #[test]
    fn test_clock_skew_still_bills() {
        let tariff = Tariff::new("general", "Pista general", 6000);
        let charge = compute_charge(
            &ticket(1),
            &tariff,
            &Membership::none(),
            at(-5),
            &BillingPolicy::default(),
        )
        .unwrap();

        assert_eq!(charge.amount_cents, 0);
        assert_eq!(charge.anomaly, Some(NegativeDurationAnomaly { raw_seconds: -300 }));
    }

    #[test]
    fn test_tariff_mismatch() {
        let other = Tariff::new("nocturna", "Tarifa nocturna", 8000);
        let err = compute_charge(
            &ticket(1),
            &other,
            &Membership::none(),
            at(10),
            &BillingPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::TariffMismatch { .. }));
    }

    #[test]
    fn test_terminal_ticket_rejected() {
        let tariff = Tariff::new("general", "Pista general", 6000);
        let cancelled = ticket(1).cancel(at(2)).unwrap();
        let err = compute_charge(
            &cancelled,
            &tariff,
            &Membership::none(),
            at(10),
            &BillingPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ClosedTicketImmutable { .. }));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("per_person".parse::<HeadcountPolicy>().unwrap(), HeadcountPolicy::PerPerson);
        assert_eq!("ceil".parse::<MinuteRounding>().unwrap(), MinuteRounding::Ceil);
        assert!("per_car".parse::<HeadcountPolicy>().is_err());
    }
}
