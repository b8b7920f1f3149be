//! Simulated controller boards answering on the far end of a memory link.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::BytesMut;
use rs485prims_frame::{command, encode_frame, Frame, Reassembler, KNOWN_PEERS};
use rs485prims_session::{
    encode_analog, AnalogKind, AnalogReading, DeviceStatus, DigitalChannels, ErrorCode, Session,
    SessionConfig,
};
use rs485prims_transport::{BusStream, MemoryLink};

pub const FIRMWARE: [u8; 4] = [1, 4, 2, 17];

/// Board behavior, adjustable while the bus runs.
#[derive(Default)]
pub struct Boards {
    pub inputs: DigitalChannels,
    pub outputs: DigitalChannels,
    /// Addresses that never answer.
    pub silent: HashSet<u8>,
    /// Addresses that answer every request with `ERROR_RESPONSE`.
    pub rejecting: HashSet<u8>,
    /// Commands no board answers.
    pub unanswered: HashSet<u8>,
    /// Per-address pause before answering.
    pub delays: HashMap<u8, Duration>,
    /// Send analog readings without the raw ADC value.
    pub simple_analog: bool,
    /// Every valid frame seen, in arrival order.
    pub received: Vec<Frame>,
}

pub struct SimulatedBus {
    pub boards: Arc<Mutex<Boards>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SimulatedBus {
    pub fn start() -> (Session, SimulatedBus) {
        Self::start_with(Boards::default())
    }

    pub fn start_with(boards: Boards) -> (Session, SimulatedBus) {
        let (host, mut device) = MemoryLink::pair();
        device.set_timeout(Duration::from_millis(20));

        let boards = Arc::new(Mutex::new(boards));
        let running = Arc::new(AtomicBool::new(true));
        let handle = {
            let boards = Arc::clone(&boards);
            let running = Arc::clone(&running);
            thread::spawn(move || serve(device, boards, running))
        };

        let session = Session::from_stream(BusStream::from(host), test_config())
            .expect("session should start over a memory link");
        (
            session,
            SimulatedBus {
                boards,
                running,
                handle: Some(handle),
            },
        )
    }

    pub fn with_boards<R>(&self, f: impl FnOnce(&mut Boards) -> R) -> R {
        f(&mut self.boards.lock().expect("boards lock"))
    }

    pub fn received(&self) -> Vec<Frame> {
        self.with_boards(|b| b.received.clone())
    }
}

impl Drop for SimulatedBus {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        settle_delay: Duration::ZERO,
        default_timeout: Duration::from_millis(500),
        write_timeout: Duration::from_millis(800),
        ..SessionConfig::default()
    }
}

pub fn status_for(address: u8) -> DeviceStatus {
    DeviceStatus {
        peer_id: address,
        health: 90 + address,
        uptime_secs: 3725,
        error_count: 2,
        rx_packets: 1000 + u32::from(address),
        tx_packets: 900,
    }
}

pub fn readings_for(kind: AnalogKind, extended: bool) -> Vec<AnalogReading> {
    let scale = match kind {
        AnalogKind::Current => 0.5,
        AnalogKind::Voltage => 2.0,
        AnalogKind::Temperature => 10.0,
    };
    (0..kind.channels())
        .map(|ch| AnalogReading {
            raw: extended.then_some(ch as u16 * 100),
            value: ch as f32 * scale,
        })
        .collect()
}

fn serve(mut link: MemoryLink, boards: Arc<Mutex<Boards>>, running: Arc<AtomicBool>) {
    let mut reassembler = Reassembler::new();
    let mut chunk = [0u8; 64];

    while running.load(Ordering::Acquire) {
        let n = match link.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::TimedOut => continue,
            Err(_) => return,
        };

        for frame in reassembler.feed(&chunk[..n]).into_iter().flatten() {
            let (reply, delay) = {
                let mut boards = boards.lock().expect("boards lock");
                boards.received.push(frame.clone());
                let delay = boards.delays.get(&frame.destination).copied();
                (answer(&mut boards, &frame), delay)
            };

            if let Some((code, payload)) = reply {
                if let Some(delay) = delay {
                    thread::sleep(delay);
                }
                let mut buf = BytesMut::new();
                encode_frame(frame.source, frame.destination, code, &payload, &mut buf)
                    .expect("simulated reply should encode");
                link.write_all(&buf).expect("memory link write");
            }
        }
    }
}

fn answer(boards: &mut Boards, frame: &Frame) -> Option<(u8, Vec<u8>)> {
    let address = frame.destination;
    if !KNOWN_PEERS.contains(&address)
        || boards.silent.contains(&address)
        || boards.unanswered.contains(&frame.command)
    {
        return None;
    }
    if boards.rejecting.contains(&address) {
        return Some(error_reply(ErrorCode::Busy, address));
    }

    let extended = !boards.simple_analog;
    let reply = match frame.command {
        command::PING => (command::PING_RESPONSE, Vec::new()),
        command::GET_VERSION => {
            let mut payload = FIRMWARE.to_vec();
            payload.extend_from_slice(&[address, 0, 0, 0]);
            (command::VERSION_RESPONSE, payload)
        }
        command::HEARTBEAT => (command::HEARTBEAT_RESPONSE, vec![address, 90 + address]),
        command::GET_STATUS => (
            command::STATUS_RESPONSE,
            status_for(address).to_bytes().to_vec(),
        ),
        command::READ_DI => (command::DI_RESPONSE, boards.inputs.as_bytes().to_vec()),
        command::READ_DO => (command::DO_RESPONSE, boards.outputs.as_bytes().to_vec()),
        command::WRITE_DO => match DigitalChannels::from_bytes(&frame.payload) {
            Some(outputs) => {
                boards.outputs = outputs;
                (command::DO_RESPONSE, outputs.as_bytes().to_vec())
            }
            None => error_reply(ErrorCode::InvalidLength, address),
        },
        command::READ_ANALOG_CURRENT => analog_reply(AnalogKind::Current, extended),
        command::READ_ANALOG_VOLTAGE => analog_reply(AnalogKind::Voltage, extended),
        command::READ_NTC => analog_reply(AnalogKind::Temperature, extended),
        command::READ_ALL_ANALOG => {
            let payload = AnalogKind::ALL
                .iter()
                .flat_map(|&kind| encode_analog(&readings_for(kind, extended)))
                .collect();
            (command::ALL_ANALOG_RESPONSE, payload)
        }
        _ => error_reply(ErrorCode::InvalidCommand, address),
    };
    Some(reply)
}

fn analog_reply(kind: AnalogKind, extended: bool) -> (u8, Vec<u8>) {
    let code = rs485prims_frame::response_code(kind.request_code())
        .expect("analog requests have response codes");
    (code, encode_analog(&readings_for(kind, extended)))
}

fn error_reply(code: ErrorCode, reporter: u8) -> (u8, Vec<u8>) {
    (command::ERROR_RESPONSE, vec![u8::from(code), reporter])
}
