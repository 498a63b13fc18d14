//! # Charge Replay
//!
//! Recomputes the charge of a persisted ticket, for disputes and audits.
//!
//! ## Usage
//! ```bash
//! # Recompute a closed ticket at its close time
//! cargo run -p rcreyes-engine --bin rcreyes-replay -- ticket.json --tariff general.json
//!
//! # Quote an open ticket at a given instant with a membership
//! cargo run -p rcreyes-engine --bin rcreyes-replay -- ticket.json \
//!     --tariff general.json --tier premium --at 2026-01-14T17:30:00Z
//! ```
//!
//! The snapshot is the JSON the engine hands to its sink. The tariff file is
//! a serialized `Tariff`. Billing rules come from `engine.toml` and the
//! `RCREYES_*` environment, as for the engine itself.

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rcreyes_core::format::format_minutes;
use rcreyes_core::{Membership, MembershipTier, Tariff, Ticket, TicketSnapshot, TicketState};
use rcreyes_engine::telemetry::init_tracing;
use rcreyes_engine::EngineConfig;
use tracing::{info, warn};

fn print_help() {
    println!("RC Reyes Charge Replay");
    println!();
    println!("Usage: rcreyes-replay <SNAPSHOT> --tariff <PATH> [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -t, --tariff <PATH>    Tariff JSON file (required)");
    println!("  -m, --tier <TIER>      Membership tier: none, basic, premium, vip (default: none)");
    println!("  -a, --at <RFC3339>     Instant to bill at (default: ticket end time, else now)");
    println!("  -c, --config <PATH>    engine.toml to read billing rules from");
    println!("  -h, --help             Show this help message");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut snapshot_path: Option<PathBuf> = None;
    let mut tariff_path: Option<PathBuf> = None;
    let mut tier = MembershipTier::None;
    let mut at: Option<DateTime<Utc>> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--tariff" | "-t" if i + 1 < args.len() => {
                tariff_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--tier" | "-m" if i + 1 < args.len() => {
                tier = args[i + 1].parse()?;
                i += 1;
            }
            "--at" | "-a" if i + 1 < args.len() => {
                at = Some(DateTime::parse_from_rfc3339(&args[i + 1])?.with_timezone(&Utc));
                i += 1;
            }
            "--config" | "-c" if i + 1 < args.len() => {
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other if snapshot_path.is_none() && !other.starts_with('-') => {
                snapshot_path = Some(PathBuf::from(other));
            }
            other => return Err(format!("Unexpected argument: {}", other).into()),
        }
        i += 1;
    }

    let (Some(snapshot_path), Some(tariff_path)) = (snapshot_path, tariff_path) else {
        print_help();
        return Err("a snapshot and --tariff are required".into());
    };

    let config = EngineConfig::load_or_default(config_path);
    let snapshot: TicketSnapshot = serde_json::from_str(&std::fs::read_to_string(&snapshot_path)?)?;
    let tariff: Tariff = serde_json::from_str(&std::fs::read_to_string(&tariff_path)?)?;
    let membership = Membership::from_tier(tier);

    let stored = snapshot.charge.clone();
    let at = at.or(snapshot.ended_at).unwrap_or_else(Utc::now);
    info!(code = %snapshot.code, state = %snapshot.state, %at, "Replaying ticket");

    let ticket = Ticket::restore(reopen(snapshot))?;
    let charge = ticket.quote(at, &tariff, &membership, &config.billing)?;

    if let Some(anomaly) = charge.anomaly {
        warn!(raw_seconds = anomaly.raw_seconds, "Negative net duration clamped to zero");
    }

    println!("{}", serde_json::to_string_pretty(&charge)?);
    println!();
    println!(
        "{} at {} ({} {}) = {}",
        format_minutes(charge.net_active_minutes),
        charge.effective_rate(),
        membership.tier.label(),
        config.billing.headcount,
        charge.amount()
    );

    if let Some(stored) = stored {
        if stored.amount_cents == charge.amount_cents {
            println!("Matches stored charge.");
        } else {
            println!("Stored charge was {}.", stored.amount());
        }
    }

    Ok(())
}

/// Turns a terminal snapshot back into the open ticket it was before the
/// final transition, so its charge can be recomputed.
fn reopen(mut snapshot: TicketSnapshot) -> TicketSnapshot {
    if snapshot.state.is_terminal() {
        let paused = snapshot.pauses.last().is_some_and(|p| p.end.is_none());
        snapshot.state = if paused {
            TicketState::Paused
        } else {
            TicketState::Active
        };
        snapshot.charge = None;
        snapshot.ended_at = None;
    }
    snapshot
}
