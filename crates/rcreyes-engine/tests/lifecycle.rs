//! End-to-end desk flows through the public engine API.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rcreyes_core::{
    CoreError, HeadcountPolicy, Membership, MembershipTier, NewTicket, Tariff, Ticket,
    TicketSnapshot, TicketState,
};
use rcreyes_engine::{ChannelSink, EngineConfig, EngineError, ManualClock, TicketEngine};

fn setup(config: EngineConfig) -> (TicketEngine, Arc<ManualClock>) {
    let start = Utc.with_ymd_and_hms(2026, 1, 14, 16, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let engine = TicketEngine::new(&config).with_clock(clock.clone());
    (engine, clock)
}

fn walk_in(persons: u32, tariff_id: &str) -> NewTicket {
    NewTicket {
        customer_name: Some("Familia Reyes".to_string()),
        person_count: persons,
        print_individually: persons > 1,
        tariff_id: tariff_id.to_string(),
        membership_id: None,
    }
}

#[test]
fn full_session_with_one_pause() {
    let (engine, clock) = setup(EngineConfig::default());
    let tariff = Tariff::new("general", "Pista general", 6000);

    let ticket = engine.check_in(walk_in(1, "general")).unwrap();
    assert_eq!(ticket.state, TicketState::Active);

    clock.advance(Duration::minutes(45));
    let paused = engine.pause(ticket.id, ticket.version).unwrap();

    clock.advance(Duration::minutes(30));
    let resumed = engine.resume(ticket.id, paused.version).unwrap();

    clock.advance(Duration::minutes(45));
    let closed = engine
        .close(ticket.id, resumed.version, &tariff, &Membership::none())
        .unwrap();

    let charge = closed.charge.as_ref().unwrap();
    assert_eq!(closed.state, TicketState::Closed);
    assert_eq!(closed.version, 3);
    assert_eq!(charge.net_active_minutes, 90);
    assert_eq!(charge.amount().to_string(), "$90.00");

    // Frozen: later reads and later clocks change nothing.
    clock.advance(Duration::hours(3));
    assert_eq!(engine.snapshot(ticket.id).unwrap(), closed);

    let err = engine.pause(ticket.id, closed.version).unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::TerminalState { .. })));
}

#[test]
fn premium_member_ninety_minutes() {
    let (engine, clock) = setup(EngineConfig::default());
    let tariff = Tariff::new("general", "Pista general", 10000);
    let membership = Membership::from_tier(MembershipTier::Premium).with_id("m-204");

    let ticket = engine.check_in(walk_in(1, "general")).unwrap();
    clock.advance(Duration::minutes(90));

    let closed = engine.close(ticket.id, 0, &tariff, &membership).unwrap();
    assert_eq!(closed.charge.unwrap().amount_cents, 13500);
}

#[test]
fn per_person_desk_bills_each_rider() {
    let mut config = EngineConfig::default();
    config.billing.headcount = HeadcountPolicy::PerPerson;
    let (engine, clock) = setup(config);
    let tariff = Tariff::new("general", "Pista general", 6000);

    let ticket = engine.check_in(walk_in(3, "general")).unwrap();
    clock.advance(Duration::minutes(20));

    let closed = engine.close(ticket.id, 0, &tariff, &Membership::none()).unwrap();
    let charge = closed.charge.unwrap();
    assert_eq!(charge.persons_billed, 3);
    assert_eq!(charge.amount_cents, 6000);
}

#[test]
fn closing_while_paused_stops_the_meter() {
    let (engine, clock) = setup(EngineConfig::default());
    let tariff = Tariff::new("general", "Pista general", 6000);

    let ticket = engine.check_in(walk_in(2, "general")).unwrap();
    clock.advance(Duration::minutes(40));
    let paused = engine.pause(ticket.id, 0).unwrap();

    clock.advance(Duration::minutes(25));
    let closed = engine.close(ticket.id, paused.version, &tariff, &Membership::none()).unwrap();

    assert!(closed.pauses.iter().all(|p| p.end.is_some()));
    assert_eq!(closed.charge.unwrap().net_active_minutes, 40);
}

#[test]
fn wrong_tariff_leaves_ticket_open() {
    let (engine, clock) = setup(EngineConfig::default());
    let ticket = engine.check_in(walk_in(1, "general")).unwrap();
    clock.advance(Duration::minutes(10));

    let night = Tariff::new("nocturna", "Tarifa nocturna", 9000);
    let err = engine.close(ticket.id, 0, &night, &Membership::none()).unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::TariffMismatch { .. })));
    assert_eq!(engine.snapshot(ticket.id).unwrap(), ticket);
}

#[test]
fn snapshots_survive_a_restart() {
    let (engine, clock) = setup(EngineConfig::default());
    let ticket = engine.check_in(walk_in(2, "general")).unwrap();
    clock.advance(Duration::minutes(15));
    let paused = engine.pause(ticket.id, 0).unwrap();

    let json = serde_json::to_string(&paused).unwrap();
    let persisted: TicketSnapshot = serde_json::from_str(&json).unwrap();

    let (restarted, clock) = setup(EngineConfig::default());
    restarted.restore(persisted).unwrap();
    clock.advance(Duration::minutes(30));

    let resumed = restarted.resume(ticket.id, paused.version).unwrap();
    assert_eq!(resumed.state, TicketState::Active);
    assert_eq!(resumed.pauses.len(), 1);
    assert!(Ticket::restore(resumed).is_ok());
}

#[tokio::test]
async fn sink_sees_every_commit() {
    let (sink, mut rx) = ChannelSink::new();
    let (engine, clock) = setup(EngineConfig::default());
    let engine = engine.with_sink(Arc::new(sink));
    let tariff = Tariff::new("general", "Pista general", 6000);

    let ticket = engine.check_in(walk_in(1, "general")).unwrap();
    clock.advance(Duration::minutes(30));
    engine.close(ticket.id, 0, &tariff, &Membership::none()).unwrap();

    let states = [rx.recv().await.unwrap().state, rx.recv().await.unwrap().state];
    assert_eq!(states, [TicketState::Active, TicketState::Closed]);
}
