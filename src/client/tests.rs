//! Streaming client scenarios against loopback trainer peers

use super::*;
use crate::codec::{FIELD_KEYS, decode_frame};
use crate::test_utils::{LoopbackTrainer, config_for_port, drain, sample_frame, unused_port};
use proptest::prelude::*;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Upper bound on ticks needed to fill loopback socket buffers.
const MAX_TICKS_TO_FILL: u64 = 2_000_000;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn start_without_peer_leaves_flag_clear_and_state_idle() {
    init_logging();
    let mut client = StreamingClient::new(&config_for_port(unused_port()));

    assert!(!client.start());
    assert!(!client.is_training());
    assert_eq!(client.state(), ClientState::Idle);
    assert_eq!(client.stats().connect_failures, 1);
}

#[test]
fn tick_is_a_noop_when_not_training() {
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());

    assert!(client.connect());
    let mut peer = trainer.accept(READ_TIMEOUT);
    assert_eq!(client.state(), ClientState::Connected);

    for _ in 0..5 {
        assert_eq!(client.tick(&sample_frame()), TickOutcome::Skipped);
    }

    assert!(drain(&mut peer).is_empty(), "no bytes may be written while the flag is clear");
    assert_eq!(client.stats().frames_sent, 0);
}

#[test]
fn connect_start_tick_stop_writes_exactly_one_record() {
    init_logging();
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());

    assert!(client.connect());
    let mut peer = trainer.accept(READ_TIMEOUT);

    assert!(client.start());
    assert!(client.is_training());
    assert_eq!(client.state(), ClientState::Training);

    let frame = sample_frame();
    let outcome = client.tick(&frame);
    assert!(outcome.wrote_frame());

    let received = String::from_utf8(drain(&mut peer)).expect("record is UTF-8");
    assert_eq!(received.split(',').count(), FIELD_KEYS.len());
    assert_eq!(decode_frame(&received).expect("record decodes"), frame);
    assert_eq!(outcome, TickOutcome::Sent { bytes: received.len() });

    client.stop();
    assert!(!client.is_training());
    assert_eq!(client.state(), ClientState::Connected, "stop keeps the connection");

    assert_eq!(client.tick(&frame), TickOutcome::Skipped);
    assert!(drain(&mut peer).is_empty());
}

#[test]
fn start_connects_on_demand() {
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());
    assert_eq!(client.state(), ClientState::Idle);

    assert!(client.start());
    let _peer = trainer.accept(READ_TIMEOUT);
    assert!(client.is_training());
    assert_eq!(client.stats().connections_opened, 1);

    // A second start reuses the live socket
    assert!(client.start());
    assert_eq!(client.stats().connections_opened, 1);
}

#[test]
fn peer_close_with_trainer_gone_stops_training_without_panicking() {
    init_logging();
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());

    assert!(client.start());
    let peer = trainer.accept(READ_TIMEOUT);

    drop(peer);
    drop(trainer);
    std::thread::sleep(Duration::from_millis(50));

    assert_eq!(client.tick(&sample_frame()), TickOutcome::ConnectFailed);
    assert!(!client.is_training());
    assert_eq!(client.state(), ClientState::Disconnected);

    // Further ticks are no-ops
    assert_eq!(client.tick(&sample_frame()), TickOutcome::Skipped);
}

#[test]
fn peer_close_with_trainer_listening_reconnects_and_delivers() {
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());

    assert!(client.start());
    let first_peer = trainer.accept(READ_TIMEOUT);
    drop(first_peer);
    std::thread::sleep(Duration::from_millis(50));

    let frame = sample_frame();
    let outcome = client.tick(&frame);
    assert!(outcome.wrote_frame(), "reconnect should succeed, got {outcome:?}");
    assert!(client.is_training());

    let mut second_peer = trainer.accept(READ_TIMEOUT);
    let received = String::from_utf8(drain(&mut second_peer)).expect("record is UTF-8");
    assert_eq!(decode_frame(&received).expect("record decodes"), frame);
    assert_eq!(client.stats().connections_opened, 2);
}

#[test]
fn newline_terminator_separates_records() {
    let trainer = LoopbackTrainer::bind();
    let config = BridgeConfig { record_terminator: RecordTerminator::Newline, ..trainer.config() };
    let mut client = StreamingClient::new(&config);

    assert!(client.start());
    let mut peer = trainer.accept(READ_TIMEOUT);

    for lap_count in 0..3 {
        let frame = Frame { lap_count, ..sample_frame() };
        assert!(client.tick(&frame).wrote_frame());
    }

    let received = String::from_utf8(drain(&mut peer)).expect("records are UTF-8");
    let laps: Vec<i64> = received
        .lines()
        .map(|line| decode_frame(line).expect("line decodes").lap_count)
        .collect();
    assert_eq!(laps, vec![0, 1, 2]);
}

#[test]
fn shutdown_is_idempotent_and_terminal() {
    let trainer = LoopbackTrainer::bind();
    let mut client = StreamingClient::new(&trainer.config());

    assert!(client.start());
    let mut peer = trainer.accept(READ_TIMEOUT);

    client.shutdown();
    let once = (client.is_training(), client.is_connected(), client.state());
    client.shutdown();
    let twice = (client.is_training(), client.is_connected(), client.state());

    assert_eq!(once, (false, false, ClientState::Shutdown));
    assert_eq!(once, twice);

    assert!(!client.connect());
    assert!(!client.start());
    assert_eq!(client.tick(&sample_frame()), TickOutcome::Skipped);
    assert!(drain(&mut peer).is_empty());
}

/// Client whose writes time out quickly once a peer stops reading.
fn stalling_client(trainer: &LoopbackTrainer, max_failures: u32) -> StreamingClient {
    StreamingClient::new(&BridgeConfig {
        write_timeout_ms: 50,
        max_consecutive_send_failures: max_failures,
        ..trainer.config()
    })
}

/// Tick until a write fails, returning that outcome and how many frames got through first.
fn tick_until_send_fails(client: &mut StreamingClient) -> (TickOutcome, u64) {
    let frame = sample_frame();
    for sent in 0..MAX_TICKS_TO_FILL {
        match client.tick(&frame) {
            TickOutcome::Sent { .. } => {}
            failed @ TickOutcome::SendFailed { .. } => return (failed, sent),
            other => panic!("Unexpected outcome while filling the socket: {other:?}"),
        }
    }
    panic!("Writes never failed against a peer that does not read");
}

#[test]
fn failed_write_drops_socket_and_next_tick_reconnects() {
    let trainer = LoopbackTrainer::bind();
    let mut client = stalling_client(&trainer, 2);

    assert!(client.start());
    // Accepted but never read, so the socket buffers fill up
    let _stalled_peer = trainer.accept(READ_TIMEOUT);

    let (outcome, sent) = tick_until_send_fails(&mut client);
    assert_eq!(outcome, TickOutcome::SendFailed { stopped: false });
    assert!(client.is_training(), "one failure is below the limit");
    assert!(!client.is_connected(), "the failed socket is dropped");
    assert_eq!(client.state(), ClientState::Disconnected);

    let stats = client.stats();
    assert_eq!(stats.send_failures, 1);
    assert_eq!(stats.frames_sent, sent);
    assert_eq!(stats.connections_opened, 1);

    // The listener queues the new handshake even though nothing accepts it
    let outcome = client.tick(&sample_frame());
    assert!(outcome.wrote_frame(), "next tick should reconnect and send, got {outcome:?}");
    assert_eq!(client.state(), ClientState::Training);
    assert_eq!(client.stats().connections_opened, 2);
    assert_eq!(client.stats().frames_sent, sent + 1);
}

#[test]
fn reaching_send_failure_limit_stops_training() {
    let trainer = LoopbackTrainer::bind();
    let mut client = stalling_client(&trainer, 1);

    assert!(client.start());
    let _stalled_peer = trainer.accept(READ_TIMEOUT);

    let (outcome, _) = tick_until_send_fails(&mut client);
    assert_eq!(outcome, TickOutcome::SendFailed { stopped: true });
    assert!(!client.is_training());
    assert_eq!(client.state(), ClientState::Disconnected);
    assert_eq!(client.stats().send_failures, 1);

    // Stopped: no reconnect and no further writes
    assert_eq!(client.tick(&sample_frame()), TickOutcome::Skipped);
    assert_eq!(client.stats().connections_opened, 1);
    assert_eq!(client.stats().send_failures, 1);
}

#[test]
fn send_failure_policy_stops_after_limit() {
    let mut policy = SendFailurePolicy::new(3);

    assert!(!policy.record_failure());
    assert!(!policy.record_failure());
    policy.reset();
    assert_eq!(policy.consecutive_failures(), 0);

    assert!(!policy.record_failure());
    assert!(!policy.record_failure());
    assert!(policy.record_failure());
}

#[test]
fn send_failure_policy_limit_is_at_least_one() {
    let mut policy = SendFailurePolicy::new(0);
    assert_eq!(policy.limit(), 1);
    assert!(policy.record_failure());
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Start,
    Stop,
}

fn commands() -> impl Strategy<Value = Vec<Command>> {
    prop::collection::vec(prop_oneof![Just(Command::Start), Just(Command::Stop)], 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn flag_follows_last_command_when_peer_is_up(sequence in commands()) {
        let trainer = LoopbackTrainer::bind();
        let mut client = StreamingClient::new(&trainer.config());

        for command in &sequence {
            match command {
                Command::Start => {
                    prop_assert!(client.start());
                }
                Command::Stop => client.stop(),
            }
        }

        let expected = matches!(sequence.last(), Some(Command::Start));
        prop_assert_eq!(client.is_training(), expected);
    }

    #[test]
    fn flag_stays_clear_when_peer_is_absent(sequence in commands()) {
        let mut client = StreamingClient::new(&config_for_port(unused_port()));

        for command in &sequence {
            match command {
                Command::Start => {
                    prop_assert!(!client.start());
                }
                Command::Stop => client.stop(),
            }
            prop_assert!(!client.is_training());
        }
        prop_assert_eq!(client.state(), ClientState::Idle);
    }
}
