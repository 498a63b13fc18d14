//! # rcreyes-engine: Ticket Engine for the RC Reyes Desk
//!
//! Keeps tickets resident and applies transitions safely under concurrent
//! request handlers.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Engine Architecture                             │
//! │                                                                         │
//! │   request handler A ──┐                                                 │
//! │   request handler B ──┼──► TicketEngine ──► per-ticket Mutex            │
//! │   request handler C ──┘         │                 │                     │
//! │                                 │                 ▼                     │
//! │                             Clock::now()   rcreyes-core Ticket          │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │                                    SnapshotSink (persistence, board)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`engine`] - `TicketEngine`, the resident registry
//! - [`clock`] - System and manual time sources
//! - [`sink`] - Where committed snapshots are delivered
//! - [`config`] - Billing and desk configuration (TOML + env)
//! - [`error`] - Engine error types
//! - [`telemetry`] - Tracing subscriber setup

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod sink;
pub mod telemetry;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, TicketSettings};
pub use engine::{BoardSummary, TicketEngine};
pub use error::{EngineError, EngineResult};
pub use sink::{ChannelSink, NoOpSink, SnapshotSink};
