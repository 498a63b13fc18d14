//! # Snapshot Sinks
//!
//! Where committed ticket snapshots go after a transition.
//!
//! ```text
//!  TicketEngine ── commit ──► SnapshotSink::publish(&snapshot)
//!                                 │
//!                 ┌───────────────┼────────────────────┐
//!                 ▼               ▼                    ▼
//!             NoOpSink       ChannelSink           host impl
//!             (drop)       (mpsc → writer task)   (DB, webhook)
//! ```
//!
//! `publish` runs while the ticket lock is held, so snapshots of one ticket
//! reach the sink in version order. Implementations must not block.

use rcreyes_core::TicketSnapshot;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::{EngineError, EngineResult};

pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: &TicketSnapshot) -> EngineResult<()>;
}

/// Discards every snapshot. Used when the host persists from return values.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl SnapshotSink for NoOpSink {
    fn publish(&self, _snapshot: &TicketSnapshot) -> EngineResult<()> {
        Ok(())
    }
}

/// Forwards snapshots to an async consumer over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<TicketSnapshot>,
}

impl ChannelSink {
    /// Creates a sink and the receiver the host's writer task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TicketSnapshot>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl SnapshotSink for ChannelSink {
    fn publish(&self, snapshot: &TicketSnapshot) -> EngineResult<()> {
        trace!(code = %snapshot.code, version = snapshot.version, "Forwarding snapshot");
        self.tx
            .send(snapshot.clone())
            .map_err(|_| EngineError::SinkClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rcreyes_core::{CheckInRules, NewTicket, Ticket};

    fn snapshot() -> TicketSnapshot {
        let request = NewTicket {
            customer_name: None,
            person_count: 1,
            print_individually: false,
            tariff_id: "general".to_string(),
            membership_id: None,
        };
        let at = Utc.with_ymd_and_hms(2026, 1, 14, 16, 0, 0).unwrap();
        Ticket::check_in(request, &CheckInRules::default(), at)
            .unwrap()
            .snapshot()
    }

    #[tokio::test]
    async fn test_channel_sink_delivers() {
        let (sink, mut rx) = ChannelSink::new();
        let snapshot = snapshot();

        sink.publish(&snapshot).unwrap();
        assert_eq!(rx.recv().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_channel_sink_reports_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(sink.publish(&snapshot()), Err(EngineError::SinkClosed)));
    }

    #[test]
    fn test_noop_sink() {
        assert!(NoOpSink.publish(&snapshot()).is_ok());
    }
}
