//! # Ticket Engine
//!
//! Resident registry of tickets with per-ticket serialization.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TicketEngine                                    │
//! │                                                                         │
//! │   tickets: DashMap<TicketId, Arc<Mutex<Ticket>>>   (sharded)            │
//! │   codes:   DashMap<code, TicketId>                                      │
//! │                                                                         │
//! │   pause(id, v) ──► clone Arc out of shard ──► lock ticket               │
//! │                                                   │                     │
//! │                        event legal in state ? ─── no ──► TerminalState, │
//! │                                │                    AlreadyPaused, ...  │
//! │                               yes                                       │
//! │                                ▼                                        │
//! │                          version == v ? ──── no ─────► VersionConflict  │
//! │                                │                                        │
//! │                               yes                                       │
//! │                                ▼                                        │
//! │              ticket.pause(clock.now()) on a copy                        │
//! │                                │                                        │
//! │                   *guard = next; sink.publish(snapshot)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The shard guard is dropped before the ticket lock is taken, so two
//! different tickets never wait on each other. State is only ever written
//! by replacing the whole ticket, which makes a poisoned lock safe to reuse.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use rcreyes_core::validation::parse_qr_payload_with_prefix;
use rcreyes_core::{
    BillingPolicy, Charge, CheckInRules, CoreError, CoreResult, Membership, NewTicket, Tariff,
    Ticket, TicketEvent, TicketId, TicketSnapshot, TicketState,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::sink::{NoOpSink, SnapshotSink};

type Slot = Arc<Mutex<Ticket>>;

/// Check-in draws at most this many codes before giving up.
const MAX_CODE_ATTEMPTS: usize = 8;

/// Counts shown on top of the desk board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSummary {
    pub active: usize,
    pub paused: usize,
    /// People currently on the track, paused tickets included.
    pub persons_on_track: u32,
    /// Open tickets, most recent check-in first.
    pub open: Vec<TicketSnapshot>,
}

pub struct TicketEngine {
    tickets: DashMap<TicketId, Slot>,
    codes: DashMap<String, TicketId>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn SnapshotSink>,
    billing: BillingPolicy,
    rules: CheckInRules,
    qr_prefix: String,
}

impl TicketEngine {
    /// Creates an engine on the system clock with no sink.
    pub fn new(config: &EngineConfig) -> Self {
        TicketEngine {
            tickets: DashMap::new(),
            codes: DashMap::new(),
            clock: Arc::new(SystemClock),
            sink: Arc::new(NoOpSink),
            billing: config.billing,
            rules: config.check_in_rules(),
            qr_prefix: config.tickets.qr_prefix.trim().to_string(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn billing_policy(&self) -> &BillingPolicy {
        &self.billing
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers a new `active` ticket entering now.
    ///
    /// The code suffix is drawn from the ticket id, so a collision with a
    /// resident code is retried with a fresh id.
    pub fn check_in(&self, request: NewTicket) -> EngineResult<TicketSnapshot> {
        let now = self.clock.now();
        self.check_in_with(|| Ticket::check_in(request.clone(), &self.rules, now))
    }

    fn check_in_with<F>(&self, mut make: F) -> EngineResult<TicketSnapshot>
    where
        F: FnMut() -> CoreResult<Ticket>,
    {
        let mut attempt = 1;
        let snapshot = loop {
            match self.register(make()?) {
                Err(EngineError::DuplicateTicket(code)) if attempt < MAX_CODE_ATTEMPTS => {
                    debug!(%code, attempt, "Ticket code collision, drawing a new id");
                    attempt += 1;
                }
                result => break result?,
            }
        };

        info!(
            ticket_id = %snapshot.id,
            code = %snapshot.code,
            persons = snapshot.person_count,
            tariff = %snapshot.tariff_id,
            "Ticket checked in"
        );
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Makes a persisted ticket resident again. The sink is not notified.
    pub fn restore(&self, snapshot: TicketSnapshot) -> EngineResult<TicketSnapshot> {
        let ticket = Ticket::restore(snapshot)?;
        let snapshot = self.register(ticket)?;
        debug!(ticket_id = %snapshot.id, version = snapshot.version, "Ticket restored");
        Ok(snapshot)
    }

    fn register(&self, ticket: Ticket) -> EngineResult<TicketSnapshot> {
        let id = ticket.id();
        let code = ticket.code().as_str().to_string();

        match self.codes.entry(code.clone()) {
            Entry::Occupied(_) => return Err(EngineError::DuplicateTicket(code)),
            Entry::Vacant(slot) => {
                if self.tickets.contains_key(&id) {
                    return Err(EngineError::DuplicateTicket(id.to_string()));
                }
                slot.insert(id);
            }
        }

        let snapshot = ticket.snapshot();
        self.tickets.insert(id, Arc::new(Mutex::new(ticket)));
        Ok(snapshot)
    }

    /// Drops a terminal ticket once the host has persisted it.
    pub fn evict(&self, id: TicketId) -> EngineResult<TicketSnapshot> {
        let slot = self.slot(id)?;
        let snapshot = lock(&slot).snapshot();

        if !snapshot.state.is_terminal() {
            return Err(EngineError::TicketStillOpen(snapshot.code.to_string()));
        }

        self.tickets.remove(&id);
        self.codes.remove(snapshot.code.as_str());
        debug!(ticket_id = %id, state = %snapshot.state, "Ticket evicted");
        Ok(snapshot)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn snapshot(&self, id: TicketId) -> EngineResult<TicketSnapshot> {
        let slot = self.slot(id)?;
        let snapshot = lock(&slot).snapshot();
        Ok(snapshot)
    }

    /// Looks a ticket up by its printed code or a scanned QR payload.
    pub fn find_by_code(&self, code_or_payload: &str) -> EngineResult<TicketSnapshot> {
        let code = parse_qr_payload_with_prefix(code_or_payload, &self.qr_prefix)?;
        let id = self
            .codes
            .get(&code)
            .map(|entry| *entry.value())
            .ok_or_else(|| EngineError::TicketNotFound(code.clone()))?;
        self.snapshot(id)
    }

    /// Looks up a ticket scanned at the exit desk.
    ///
    /// Scanning is a close intent, so a closed or cancelled ticket is
    /// reported as `TerminalState` for `close`.
    pub fn open_by_code(&self, code_or_payload: &str) -> EngineResult<TicketSnapshot> {
        let snapshot = self.find_by_code(code_or_payload)?;

        if snapshot.state.is_terminal() {
            return Err(CoreError::TerminalState {
                ticket_id: snapshot.code.to_string(),
                state: snapshot.state,
                event: TicketEvent::Close,
            }
            .into());
        }
        Ok(snapshot)
    }

    /// Open tickets, most recent check-in first.
    pub fn open_tickets(&self) -> Vec<TicketSnapshot> {
        let slots: Vec<Slot> = self.tickets.iter().map(|e| Arc::clone(e.value())).collect();

        let mut open: Vec<TicketSnapshot> = slots
            .iter()
            .map(|slot| lock(slot).snapshot())
            .filter(|s| s.state.is_open())
            .collect();
        open.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        open
    }

    pub fn board_summary(&self) -> BoardSummary {
        let open = self.open_tickets();
        let active = open
            .iter()
            .filter(|s| s.state == TicketState::Active)
            .count();

        BoardSummary {
            active,
            paused: open.len() - active,
            persons_on_track: open.iter().map(|s| s.person_count).sum(),
            open,
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    pub fn pause(&self, id: TicketId, expected_version: u64) -> EngineResult<TicketSnapshot> {
        self.transition(id, expected_version, TicketEvent::Pause, |t, now| t.pause(now))
    }

    pub fn resume(&self, id: TicketId, expected_version: u64) -> EngineResult<TicketSnapshot> {
        self.transition(id, expected_version, TicketEvent::Resume, |t, now| t.resume(now))
    }

    /// Closes the ticket and freezes its charge.
    pub fn close(
        &self,
        id: TicketId,
        expected_version: u64,
        tariff: &Tariff,
        membership: &Membership,
    ) -> EngineResult<TicketSnapshot> {
        let policy = self.billing;
        let snapshot = self.transition(id, expected_version, TicketEvent::Close, |t, now| {
            t.close(now, tariff, membership, &policy)
        })?;

        if let Some(charge) = &snapshot.charge {
            if let Some(anomaly) = charge.anomaly {
                warn!(
                    ticket_id = %id,
                    raw_seconds = anomaly.raw_seconds,
                    "Negative net duration clamped to zero at close"
                );
            }
            info!(
                ticket_id = %id,
                code = %snapshot.code,
                minutes = charge.net_active_minutes,
                amount = %charge.amount(),
                "Ticket closed"
            );
        }
        Ok(snapshot)
    }

    pub fn cancel(&self, id: TicketId, expected_version: u64) -> EngineResult<TicketSnapshot> {
        let snapshot =
            self.transition(id, expected_version, TicketEvent::Cancel, |t, now| t.cancel(now))?;
        info!(ticket_id = %id, code = %snapshot.code, "Ticket cancelled");
        Ok(snapshot)
    }

    /// Running charge of an open ticket. Nothing is committed.
    pub fn quote(
        &self,
        id: TicketId,
        tariff: &Tariff,
        membership: &Membership,
    ) -> EngineResult<Charge> {
        let slot = self.slot(id)?;
        let ticket = lock(&slot);
        let charge = ticket.quote(self.clock.now(), tariff, membership, &self.billing)?;

        if let Some(anomaly) = charge.anomaly {
            warn!(ticket_id = %id, raw_seconds = anomaly.raw_seconds, "Negative net duration in quote");
        }
        Ok(charge)
    }

    /// Runs one transition under the ticket lock.
    fn transition<F>(
        &self,
        id: TicketId,
        expected_version: u64,
        event: TicketEvent,
        apply: F,
    ) -> EngineResult<TicketSnapshot>
    where
        F: FnOnce(&Ticket, DateTime<Utc>) -> CoreResult<Ticket>,
    {
        let slot = self.slot(id)?;
        let mut ticket = lock(&slot);

        // An illegal event is reported as such even from a stale view.
        ticket.permits(event).map_err(|e| {
            debug!(ticket_id = %id, %event, error = %e, "Transition rejected");
            e
        })?;

        if ticket.version() != expected_version {
            warn!(
                ticket_id = %id,
                %event,
                expected = expected_version,
                actual = ticket.version(),
                "Rejected stale transition"
            );
            return Err(EngineError::VersionConflict {
                ticket_id: ticket.code().to_string(),
                expected: expected_version,
                actual: ticket.version(),
            });
        }

        let next = apply(&*ticket, self.clock.now()).map_err(|e| {
            debug!(ticket_id = %id, %event, error = %e, "Transition rejected");
            e
        })?;
        *ticket = next;

        let snapshot = ticket.snapshot();
        debug!(
            ticket_id = %id,
            %event,
            state = %snapshot.state,
            version = snapshot.version,
            "Transition committed"
        );
        self.publish(&snapshot);
        Ok(snapshot)
    }

    fn slot(&self, id: TicketId) -> EngineResult<Slot> {
        self.tickets
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::TicketNotFound(id.to_string()))
    }

    /// Committed state stands even if delivery fails; the caller still
    /// receives the snapshot.
    fn publish(&self, snapshot: &TicketSnapshot) {
        if let Err(e) = self.sink.publish(snapshot) {
            warn!(ticket_id = %snapshot.id, version = snapshot.version, error = %e, "Snapshot delivery failed");
        }
    }
}

fn lock(slot: &Mutex<Ticket>) -> MutexGuard<'_, Ticket> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Unit Tests
// =============================================================================
