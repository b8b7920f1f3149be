mod common;

use std::time::{Duration, Instant};

use common::{readings_for, status_for, Boards, SimulatedBus, FIRMWARE};
use rs485prims_frame::{command, ANALOG_INPUT, DIGITAL_INPUT, DIGITAL_OUTPUT, HOST};
use rs485prims_session::{AnalogKind, DigitalChannels, SessionError};

#[test]
fn ping_known_and_silent_peers() {
    let mut boards = Boards::default();
    boards.silent.insert(DIGITAL_INPUT);
    let (session, bus) = SimulatedBus::start_with(boards);

    assert!(session.ping(ANALOG_INPUT).expect("ping should not fail"));
    let answered = session.ping(DIGITAL_INPUT).expect("silent peer is ok");
    assert!(!answered);

    let sent = bus.received();
    assert_eq!(sent.len(), 2);
    for frame in &sent {
        assert_eq!((frame.source, frame.command), (HOST, command::PING));
        assert!(frame.payload.is_empty());
    }
}

#[test]
fn version_ignores_trailing_bytes() {
    let (session, _bus) = SimulatedBus::start();
    let version = session
        .get_version(DIGITAL_OUTPUT)
        .expect("version request")
        .expect("version should decode");

    assert_eq!(
        [version.major, version.minor, version.patch, version.build],
        FIRMWARE
    );
    assert_eq!(version.peer_id, DIGITAL_OUTPUT);
    assert_eq!(version.to_string(), "v1.4.2.17");
}

#[test]
fn status_and_heartbeat() {
    let (session, _bus) = SimulatedBus::start();

    let status = session
        .get_status(ANALOG_INPUT)
        .expect("status request")
        .expect("status should decode");
    assert_eq!(status, status_for(ANALOG_INPUT));
    assert_eq!(status.uptime_hms(), "01:02:05");

    let beat = session
        .heartbeat(DIGITAL_INPUT)
        .expect("heartbeat request")
        .expect("heartbeat should decode");
    assert_eq!(beat.peer_id, DIGITAL_INPUT);
    assert_eq!(beat.health, 92);
}

#[test]
fn digital_outputs_round_trip_through_the_board() {
    let (session, bus) = SimulatedBus::start();

    let outputs = DigitalChannels::from_active(&[0, 9, 55]);
    assert!(session
        .write_digital_outputs(DIGITAL_OUTPUT, &outputs)
        .expect("write should not fail"));

    let write = bus
        .received()
        .into_iter()
        .find(|f| f.command == command::WRITE_DO)
        .expect("write frame should reach the board");
    assert_eq!(
        write.payload.as_ref(),
        &[0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x80]
    );

    let read = session
        .read_digital_outputs(DIGITAL_OUTPUT)
        .expect("read request")
        .expect("outputs should decode");
    assert_eq!(read.active(), vec![0, 9, 55]);
    assert_eq!(read, outputs);
}

#[test]
fn digital_inputs_reflect_board_state() {
    let mut boards = Boards::default();
    boards.inputs = DigitalChannels::from_active(&[3, 4, 40]);
    let (session, _bus) = SimulatedBus::start_with(boards);

    let inputs = session
        .read_digital_inputs(DIGITAL_INPUT)
        .expect("read request")
        .expect("inputs should decode");
    assert_eq!(inputs.count_active(), 3);
    assert!(inputs.get(40));
    assert!(!inputs.get(41));
}

#[test]
fn analog_groups_with_raw_values() {
    let (session, _bus) = SimulatedBus::start();

    for kind in AnalogKind::ALL {
        let readings = session
            .read_analog_channels(ANALOG_INPUT, kind)
            .expect("analog request")
            .expect("analog response");
        assert_eq!(readings.len(), kind.channels());
        assert_eq!(readings, readings_for(kind, true));
    }
}

#[test]
fn analog_groups_without_raw_values() {
    let boards = Boards {
        simple_analog: true,
        ..Boards::default()
    };
    let (session, _bus) = SimulatedBus::start_with(boards);

    let readings = session
        .read_analog_channels(ANALOG_INPUT, AnalogKind::Voltage)
        .expect("analog request")
        .expect("analog response");
    assert!(readings.iter().all(|r| r.raw.is_none()));
    assert_eq!(readings[5].value, 10.0);
}

#[test]
fn all_analog_in_one_exchange() {
    let (session, bus) = SimulatedBus::start();

    let snapshot = session
        .read_all_analog(ANALOG_INPUT)
        .expect("analog request")
        .expect("snapshot should decode");
    for kind in AnalogKind::ALL {
        assert_eq!(snapshot.group(kind), readings_for(kind, true).as_slice());
    }
    assert_eq!(bus.received().len(), 1);
}

#[test]
fn rejected_request_is_absent() {
    let mut boards = Boards::default();
    boards.rejecting.insert(ANALOG_INPUT);
    let (session, _bus) = SimulatedBus::start_with(boards);

    let answered = session.ping(ANALOG_INPUT).expect("rejection is ok");
    assert!(!answered);
    assert!(session
        .get_status(ANALOG_INPUT)
        .expect("rejection is not an error")
        .is_none());
}

#[test]
fn wrong_response_code_is_absent() {
    let (session, _bus) = SimulatedBus::start();
    // The board answers unknown commands with ERROR_RESPONSE.
    let frame = session
        .request(ANALOG_INPUT, 0x7E, &[], Duration::from_millis(300))
        .expect("request should not fail");
    assert!(frame.is_none());
}

#[test]
fn timeout_is_bounded() {
    let mut boards = Boards::default();
    boards.silent.insert(DIGITAL_OUTPUT);
    let (session, _bus) = SimulatedBus::start_with(boards);

    let timeout = Duration::from_millis(150);
    let start = Instant::now();
    let err = session
        .send_and_wait(DIGITAL_OUTPUT, command::PING, &[], timeout)
        .expect_err("silent peer should time out");
    let elapsed = start.elapsed();

    assert!(matches!(err, SessionError::Timeout(t) if t == timeout));
    assert!(elapsed >= timeout);
    assert!(elapsed < timeout + Duration::from_millis(250));
}

#[test]
fn slow_peer_within_timeout_is_answered() {
    let mut boards = Boards::default();
    boards
        .delays
        .insert(DIGITAL_INPUT, Duration::from_millis(100));
    let (session, _bus) = SimulatedBus::start_with(boards);

    assert!(session.ping(DIGITAL_INPUT).expect("ping should not fail"));
}

#[test]
fn late_response_does_not_leak_into_next_request() {
    let mut boards = Boards::default();
    boards
        .delays
        .insert(ANALOG_INPUT, Duration::from_millis(200));
    let (session, bus) = SimulatedBus::start_with(boards);

    let err = session
        .send_and_wait(ANALOG_INPUT, command::PING, &[], Duration::from_millis(50))
        .expect_err("first request should time out");
    assert!(err.is_timeout());

    // Let the stale PING_RESPONSE arrive, then ask for something else.
    std::thread::sleep(Duration::from_millis(300));
    bus.with_boards(|b| b.delays.clear());

    let status = session
        .get_status(ANALOG_INPUT)
        .expect("status request")
        .expect("status response, not the stale ping reply");
    assert_eq!(status.peer_id, ANALOG_INPUT);
}

#[test]
fn stats_count_traffic() {
    let (session, _bus) = SimulatedBus::start();
    assert!(session.ping(ANALOG_INPUT).expect("ping"));
    assert!(session.ping(DIGITAL_INPUT).expect("ping"));

    let stats = session.stats();
    assert_eq!(stats.tx_count, 2);
    assert_eq!(stats.rx_count, 2);
    assert_eq!(stats.error_count, 0);
}

#[test]
fn oversized_payload_is_an_error() {
    let (session, bus) = SimulatedBus::start();
    let err = session
        .request(
            DIGITAL_OUTPUT,
            command::WRITE_DO,
            &[0u8; 251],
            Duration::from_millis(50),
        )
        .expect_err("oversized payload should be rejected");
    assert!(matches!(err, SessionError::Frame(_)));
    assert!(bus.received().is_empty());
}
