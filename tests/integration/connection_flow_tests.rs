//! Full connection-lifecycle tests against the mock Notecard.

use notebridge::config::{CONNECT_TIMEOUT_MS, ConnectionConfig};
use notebridge::{ConnectionState, NotecardConnectionHandler, TransportLink};

use crate::mock_note::{ManualClock, MockNotecard};

type Handler<'a> = NotecardConnectionHandler<MockNotecard, &'a ManualClock>;

fn keep_alive(note: MockNotecard, clock: &ManualClock) -> Handler<'_> {
    let mut cfg = ConnectionConfig::serial("com.example:aquarium", 115_200);
    cfg.keep_alive = true;
    NotecardConnectionHandler::with_clock(note, cfg, clock)
}

#[test]
fn full_connect_lifecycle() {
    let clock = ManualClock::new();
    let mut h = keep_alive(MockNotecard::new(), &clock);

    assert_eq!(h.state(), ConnectionState::Init);
    assert_eq!(h.update(), ConnectionState::Connecting);

    // Relay session lags the local transport: a few polls go by.
    clock.advance(500);
    assert_eq!(h.update(), ConnectionState::Connecting);
    clock.advance(500);
    assert_eq!(h.update(), ConnectionState::Connecting);

    // Relay comes up.
    {
        let note = h.notecard_mut();
        note.hub_connected = true;
    }
    assert_eq!(h.update(), ConnectionState::Connected);

    // Steady state is idempotent.
    for _ in 0..5 {
        clock.advance(10_000);
        assert_eq!(h.update(), ConnectionState::Connected);
    }

    // Relay drops: demote, then keep-alive restarts the whole session.
    h.notecard_mut().hub_connected = false;
    assert_eq!(h.update(), ConnectionState::Disconnected);
    assert_eq!(h.update(), ConnectionState::Init);
    assert_eq!(h.update(), ConnectionState::Connecting);
    assert_eq!(h.notecard_mut().begin_calls, 2);
}

#[test]
fn connecting_timeout_restarts_from_init() {
    let clock = ManualClock::new();
    let mut h = keep_alive(MockNotecard::new(), &clock);
    assert_eq!(h.update(), ConnectionState::Connecting);

    clock.advance(CONNECT_TIMEOUT_MS + 1);
    assert_eq!(h.update(), ConnectionState::Init);

    // The restart re-runs the full INIT sequence.
    assert_eq!(h.update(), ConnectionState::Connecting);
    assert_eq!(h.notecard_mut().begin_calls, 2);
    assert_eq!(h.notecard_mut().count("note.template"), 4);

    // And the timeout window starts over from the re-entry instant.
    clock.advance(CONNECT_TIMEOUT_MS);
    assert_eq!(h.update(), ConnectionState::Connecting);
}

#[test]
fn one_shot_session_closes_after_init() {
    let clock = ManualClock::new();
    let cfg = ConnectionConfig::i2c("com.example:aquarium", 0x17, 254);
    let mut h = NotecardConnectionHandler::with_clock(MockNotecard::new(), cfg, &clock);

    assert_eq!(h.update(), ConnectionState::Disconnected);
    assert_eq!(h.update(), ConnectionState::Closed);
    assert_eq!(h.update(), ConnectionState::Closed);

    assert_eq!(
        h.notecard_mut().last_link,
        Some(TransportLink::I2c {
            address: 0x17,
            max_transaction: 254
        })
    );
}

#[test]
fn rearm_error_is_state_equivalent_to_rearm_success() {
    // Two identical handlers with an empty inbound queue and hardware
    // interrupts on; one mock errors every card.attn. The state histories
    // must match exactly.
    let run = |rearm_fails: bool| -> Vec<ConnectionState> {
        let clock = ManualClock::new();
        let mut note = MockNotecard::new();
        if rearm_fails {
            note.fail.insert("card.attn");
        }
        let mut cfg = ConnectionConfig::serial("com.example:aquarium", 115_200);
        cfg.keep_alive = true;
        cfg.hw_interrupts = true;
        let mut h = NotecardConnectionHandler::with_clock(note, cfg, &clock);
        (0..4).map(|_| h.update()).collect()
    };

    assert_eq!(run(false), run(true));
}

#[test]
fn device_uid_is_resolved_during_init() {
    let clock = ManualClock::new();
    let mut h = keep_alive(MockNotecard::new(), &clock);
    assert_eq!(h.device_uid(), "");
    h.update();
    assert_eq!(h.device_uid(), "dev:868050040000000");
}

#[test]
fn init_failure_is_terminal_until_reconstructed() {
    let clock = ManualClock::new();
    let mut note = MockNotecard::new();
    note.fail.insert("hub.get");
    let mut h = keep_alive(note, &clock);

    assert_eq!(h.update(), ConnectionState::Error);
    for _ in 0..3 {
        assert_eq!(h.update(), ConnectionState::Error);
    }
    // Nothing past hub.get was attempted.
    assert_eq!(h.notecard_mut().count("hub.status"), 0);
}
