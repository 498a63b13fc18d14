//! # Ticket State Machine
//!
//! Owns a rental session and the only legal ways to change it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ticket Lifecycle                                  │
//! │                                                                         │
//! │   check_in()                                                           │
//! │       │                                                                 │
//! │       ▼          pause()                                                │
//! │   ┌────────┐ ───────────────► ┌────────┐                               │
//! │   │ ACTIVE │                  │ PAUSED │                               │
//! │   └────────┘ ◄─────────────── └────────┘                               │
//! │     │    │        resume()      │    │                                  │
//! │     │    │                      │    │                                  │
//! │     │    └──── cancel() ────────┼────┴──► ┌───────────┐                 │
//! │     │                           │         │ CANCELLED │ (no charge)     │
//! │     │                           │         └───────────┘                 │
//! │     └───────── close() ─────────┴───────► ┌───────────┐                 │
//! │                                           │  CLOSED   │ (Charge frozen) │
//! │                                           └───────────┘                 │
//! │                                                                         │
//! │   Closing a paused ticket ends the running pause at the close instant. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Model
//! Transitions take `&self` and return the next ticket. Nothing is mutated
//! until the caller swaps the returned value in, so a rejected transition
//! can never leave a half-applied ticket behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::billing::{compute_charge, BillingPolicy, Charge};
use crate::error::{CoreError, CoreResult};
use crate::interval::{NetDuration, PauseInterval, PauseLog};
use crate::types::{Membership, Tariff, TicketCode, TicketEvent, TicketId, TicketState};
use crate::validation::{
    validate_code_prefix, validate_customer_name, validate_person_count, validate_tariff_id,
};
use crate::{DEFAULT_CODE_PREFIX, DEFAULT_MAX_PERSONS};

// =============================================================================
// Check-in Input
// =============================================================================

/// Operator input at the check-in desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTicket {
    pub customer_name: Option<String>,
    pub person_count: u32,
    /// One receipt per person instead of a single group receipt.
    pub print_individually: bool,
    pub tariff_id: String,
    pub membership_id: Option<String>,
}

/// Desk rules applied at check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInRules {
    pub code_prefix: String,
    pub max_persons: u32,
}

impl Default for CheckInRules {
    fn default() -> Self {
        CheckInRules {
            code_prefix: DEFAULT_CODE_PREFIX.to_string(),
            max_persons: DEFAULT_MAX_PERSONS,
        }
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable copy of a ticket handed to persistence and the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TicketSnapshot {
    #[ts(as = "String")]
    pub id: TicketId,
    #[ts(as = "String")]
    pub code: TicketCode,
    pub customer_name: Option<String>,
    #[ts(as = "String")]
    pub entry_time: DateTime<Utc>,
    pub state: TicketState,
    pub person_count: u32,
    pub print_individually: bool,
    pub tariff_id: String,
    pub membership_id: Option<String>,
    pub pauses: Vec<PauseInterval>,
    pub charge: Option<Charge>,
    #[ts(as = "Option<String>")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Bumped on every committed transition.
    pub version: u64,
}

// =============================================================================
// Ticket
// =============================================================================

/// A rental session from check-in to close or cancel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    id: TicketId,
    code: TicketCode,
    customer_name: Option<String>,
    entry_time: DateTime<Utc>,
    state: TicketState,
    person_count: u32,
    print_individually: bool,
    tariff_id: String,
    membership_id: Option<String>,
    pauses: PauseLog,
    charge: Option<Charge>,
    ended_at: Option<DateTime<Utc>>,
    version: u64,
}

impl Ticket {
    /// Creates an `Active` ticket entering the track at `now`.
    pub fn check_in(request: NewTicket, rules: &CheckInRules, now: DateTime<Utc>) -> CoreResult<Self> {
        validate_code_prefix(&rules.code_prefix)?;
        validate_person_count(request.person_count, rules.max_persons)?;
        validate_tariff_id(&request.tariff_id)?;
        let customer_name = validate_customer_name(request.customer_name.as_deref())?;

        let id = TicketId::new();
        let code = TicketCode::generate(&rules.code_prefix, &id, now);

        Ok(Ticket {
            id,
            code,
            customer_name,
            entry_time: now,
            state: TicketState::Active,
            person_count: request.person_count,
            print_individually: request.print_individually,
            tariff_id: request.tariff_id.trim().to_string(),
            membership_id: request.membership_id,
            pauses: PauseLog::new(),
            charge: None,
            ended_at: None,
            version: 0,
        })
    }

    /// Rebuilds a ticket from a persisted snapshot.
    ///
    /// ## Checks
    /// - person count ≥ 1, valid code and tariff reference
    /// - pause history ordered, disjoint, at most one open pause
    /// - no pause starts before entry
    /// - state agrees with the pause log, charge and end time
    pub fn restore(snapshot: TicketSnapshot) -> CoreResult<Self> {
        if snapshot.person_count == 0 {
            return Err(inconsistent("person count must be at least 1"));
        }
        validate_tariff_id(&snapshot.tariff_id)?;
        let code = TicketCode::parse(snapshot.code.as_str())?;

        if snapshot
            .pauses
            .first()
            .is_some_and(|p| p.start < snapshot.entry_time)
        {
            return Err(inconsistent("pause starts before entry"));
        }
        let pauses = PauseLog::from_intervals(snapshot.pauses)?;

        let state = snapshot.state;
        match state {
            TicketState::Active if pauses.is_paused() => {
                return Err(inconsistent("active ticket has a running pause"));
            }
            TicketState::Paused if !pauses.is_paused() => {
                return Err(inconsistent("paused ticket has no running pause"));
            }
            TicketState::Closed if pauses.is_paused() => {
                return Err(inconsistent("closed ticket has a running pause"));
            }
            TicketState::Closed if snapshot.charge.is_none() => {
                return Err(inconsistent("closed ticket has no charge"));
            }
            TicketState::Cancelled if snapshot.charge.is_some() => {
                return Err(inconsistent("cancelled ticket carries a charge"));
            }
            TicketState::Active | TicketState::Paused
                if snapshot.charge.is_some() || snapshot.ended_at.is_some() =>
            {
                return Err(inconsistent("open ticket is already finalized"));
            }
            _ => {}
        }
        if state.is_terminal() && snapshot.ended_at.is_none() {
            return Err(inconsistent("terminal ticket has no end time"));
        }

        Ok(Ticket {
            id: snapshot.id,
            code,
            customer_name: snapshot.customer_name,
            entry_time: snapshot.entry_time,
            state,
            person_count: snapshot.person_count,
            print_individually: snapshot.print_individually,
            tariff_id: snapshot.tariff_id,
            membership_id: snapshot.membership_id,
            pauses,
            charge: snapshot.charge,
            ended_at: snapshot.ended_at,
            version: snapshot.version,
        })
    }

    pub fn snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            id: self.id,
            code: self.code.clone(),
            customer_name: self.customer_name.clone(),
            entry_time: self.entry_time,
            state: self.state,
            person_count: self.person_count,
            print_individually: self.print_individually,
            tariff_id: self.tariff_id.clone(),
            membership_id: self.membership_id.clone(),
            pauses: self.pauses.intervals().to_vec(),
            charge: self.charge.clone(),
            ended_at: self.ended_at,
            version: self.version,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> TicketId {
        self.id
    }

    pub fn code(&self) -> &TicketCode {
        &self.code
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    pub fn state(&self) -> TicketState {
        self.state
    }

    pub fn person_count(&self) -> u32 {
        self.person_count
    }

    pub fn print_individually(&self) -> bool {
        self.print_individually
    }

    pub fn tariff_id(&self) -> &str {
        &self.tariff_id
    }

    pub fn membership_id(&self) -> Option<&str> {
        self.membership_id.as_deref()
    }

    pub fn pauses(&self) -> &PauseLog {
        &self.pauses
    }

    pub fn charge(&self) -> Option<&Charge> {
        self.charge.as_ref()
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Net active time as the dashboard should show it: live for open
    /// tickets, frozen at the end time for terminal ones.
    pub fn net_active_duration(&self, now: DateTime<Utc>) -> NetDuration {
        let until = self.ended_at.unwrap_or(now);
        self.pauses.net_active_duration(self.entry_time, until)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `active → paused`. Opens a pause at `now`.
    pub fn pause(&self, now: DateTime<Utc>) -> CoreResult<Ticket> {
        let (mut next, target) = self.prepare(TicketEvent::Pause)?;
        self.check_not_before_history(now)?;
        next.pauses.open_pause(now)?;
        Ok(next.commit(target))
    }

    /// `paused → active`. Ends the running pause at `now`.
    pub fn resume(&self, now: DateTime<Utc>) -> CoreResult<Ticket> {
        let (mut next, target) = self.prepare(TicketEvent::Resume)?;
        self.check_not_before_history(now)?;
        next.pauses.close_pause(now)?;
        Ok(next.commit(target))
    }

    /// `active | paused → closed`. Freezes the charge computed at `now`.
    ///
    /// A running pause is ended first, so the tail of the pause is never
    /// billed. If the host clock reads earlier than that pause's start, the
    /// pause is ended at its own start and the charge absorbs the skew as a
    /// duration anomaly; closing is never blocked by the clock.
    pub fn close(
        &self,
        now: DateTime<Utc>,
        tariff: &Tariff,
        membership: &Membership,
        policy: &BillingPolicy,
    ) -> CoreResult<Ticket> {
        let (mut next, target) = self.prepare(TicketEvent::Close)?;

        if let Some(start) = next.pauses.open_interval().map(|p| p.start) {
            next.pauses.close_pause(start.max(now))?;
        }

        let charge = compute_charge(&next, tariff, membership, now, policy)?;
        next.charge = Some(charge);
        next.ended_at = Some(now);
        Ok(next.commit(target))
    }

    /// `active | paused → cancelled`. Discards the session without billing.
    pub fn cancel(&self, now: DateTime<Utc>) -> CoreResult<Ticket> {
        let (mut next, target) = self.prepare(TicketEvent::Cancel)?;
        next.ended_at = Some(now);
        Ok(next.commit(target))
    }

    /// Running charge for an open ticket. Nothing is recorded.
    pub fn quote(
        &self,
        now: DateTime<Utc>,
        tariff: &Tariff,
        membership: &Membership,
        policy: &BillingPolicy,
    ) -> CoreResult<Charge> {
        compute_charge(self, tariff, membership, now, policy)
    }

    /// Checks `event` against the transition table and returns the target
    /// state.
    ///
    /// ## Errors
    /// - `TerminalState` on a closed or cancelled ticket
    /// - `AlreadyPaused` for pause on a paused ticket
    /// - `NotPaused` for resume on an active ticket
    pub fn permits(&self, event: TicketEvent) -> CoreResult<TicketState> {
        if self.state.is_terminal() {
            return Err(CoreError::TerminalState {
                ticket_id: self.code.to_string(),
                state: self.state,
                event,
            });
        }

        match self.state.next(event) {
            Some(target) => Ok(target),
            None if event == TicketEvent::Pause => Err(CoreError::AlreadyPaused),
            None => Err(CoreError::NotPaused),
        }
    }

    /// A working copy plus the target state, if `event` is legal.
    fn prepare(&self, event: TicketEvent) -> CoreResult<(Ticket, TicketState)> {
        let target = self.permits(event)?;
        Ok((self.clone(), target))
    }

    /// Pause bookkeeping must move forward from entry and the last pause.
    fn check_not_before_history(&self, now: DateTime<Utc>) -> CoreResult<()> {
        let earliest = self
            .pauses
            .latest_timestamp()
            .map_or(self.entry_time, |t| t.max(self.entry_time));

        if now < earliest {
            return Err(CoreError::InvalidTimestamp { at: now, earliest });
        }
        Ok(())
    }

    fn commit(mut self, target: TicketState) -> Ticket {
        self.state = target;
        self.version += 1;
        self
    }
}

fn inconsistent(reason: &str) -> CoreError {
    CoreError::InconsistentSnapshot {
        reason: reason.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
