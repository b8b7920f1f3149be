use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rs485prims_frame::{
    address_name, command_name, Frame, FrameError, FrameWriter, Reassembler, BROADCAST, HOST,
};
use rs485prims_transport::{BusStream, SerialConfig};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SessionError};
use crate::slots::PendingSlots;

const READ_CHUNK_SIZE: usize = 256;
const IDLE_BACKOFF: Duration = Duration::from_millis(1);
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(10);
const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Log target for per-frame send and receive events.
pub const FRAME_LOG_TARGET: &str = "rs485prims::frames";

/// Session behavior configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Source address stamped on every request.
    pub host_address: u8,
    /// Serial line settings used by `connect`.
    pub serial: SerialConfig,
    /// Pause after each write, before the bus is released to other callers.
    /// Gives slow peer firmware time to switch its transceiver around.
    pub settle_delay: Duration,
    /// Response timeout for ordinary commands.
    pub default_timeout: Duration,
    /// Response timeout for output writes, which peers apply before answering.
    pub write_timeout: Duration,
    /// How long `disconnect` waits for the receive thread to stop.
    pub disconnect_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host_address: HOST,
            serial: SerialConfig::default(),
            settle_delay: Duration::from_millis(20),
            default_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(2),
            disconnect_grace: Duration::from_secs(1),
        }
    }
}

/// Snapshot of session traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Frames written.
    pub tx_count: u64,
    /// Valid frames received, whoever they were addressed to.
    pub rx_count: u64,
    /// Write failures, read failures and rejected frames.
    pub error_count: u64,
}

type Handler = Arc<dyn Fn(&Frame) + Send + Sync>;

#[derive(Default)]
struct Counters {
    tx: AtomicU64,
    rx: AtomicU64,
    errors: AtomicU64,
}

/// State shared between callers and the receive thread.
struct Shared {
    host_address: u8,
    running: AtomicBool,
    slots: PendingSlots,
    handlers: Mutex<HashMap<u8, Handler>>,
    counters: Counters,
}

impl Shared {
    fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn dispatch(&self, frame: Frame) {
        self.counters.rx.fetch_add(1, Ordering::Relaxed);

        if frame.destination != self.host_address && frame.destination != BROADCAST {
            trace!(
                target: FRAME_LOG_TARGET,
                destination = frame.destination,
                source = frame.source,
                "ignoring frame for another node"
            );
            return;
        }

        debug!(
            target: FRAME_LOG_TARGET,
            source = frame.source,
            peer = address_name(frame.source),
            command = command_name(frame.command),
            size = frame.payload.len(),
            "received frame"
        );

        let handler = lock(&self.handlers).get(&frame.command).cloned();
        match handler {
            Some(handler) => {
                self.slots.fill(frame.source, frame.clone());
                handler(&frame);
            }
            None => self.slots.fill(frame.source, frame),
        }
    }
}

/// An open bus connection with a background receive thread.
///
/// Requests are serialized on the wire; responses are matched to callers by
/// the responding peer's address. Any number of threads may issue requests
/// concurrently, at most one outstanding request per peer address.
pub struct Session {
    shared: Arc<Shared>,
    writer: Mutex<Option<FrameWriter<BusStream>>>,
    receiver: Mutex<Option<JoinHandle<()>>>,
    config: SessionConfig,
    port: String,
}

impl Session {
    /// Start a session over an already-open stream.
    pub fn from_stream(stream: BusStream, config: SessionConfig) -> Result<Self> {
        let port = stream
            .name()
            .unwrap_or_else(|| stream.transport_name().to_string());
        let reader = stream.try_clone()?;

        let shared = Arc::new(Shared {
            host_address: config.host_address,
            running: AtomicBool::new(true),
            slots: PendingSlots::new(),
            handlers: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        });

        let receiver = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("rs485-rx".to_string())
                .spawn(move || receive_loop(reader, shared))
                .map_err(|source| SessionError::Spawn {
                    name: "rs485-rx",
                    source,
                })?
        };

        info!(port = %port, host = config.host_address, "session started");

        Ok(Self {
            shared,
            writer: Mutex::new(Some(FrameWriter::new(stream, config.host_address))),
            receiver: Mutex::new(Some(receiver)),
            config,
            port,
        })
    }

    /// Send a request and block until the addressed peer answers or `timeout` elapses.
    ///
    /// Any unread response from `destination` is discarded first. Whatever
    /// frame that peer sends next is returned; checking its command code is
    /// the caller's job. Corrupted responses are never returned and surface
    /// only as `SessionError::Timeout`.
    pub fn send_and_wait(
        &self,
        destination: u8,
        command: u8,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Frame> {
        if !self.is_connected() {
            return Err(SessionError::Disconnected);
        }

        let deadline = Instant::now() + timeout;
        self.shared.slots.clear(destination);
        self.send(destination, command, payload)?;

        match self.shared.slots.wait_until(destination, deadline) {
            Some(frame) => Ok(frame),
            None => {
                debug!(
                    destination,
                    command = command_name(command),
                    ?timeout,
                    "no response"
                );
                Err(SessionError::Timeout(timeout))
            }
        }
    }

    /// Send a frame without waiting for a response.
    ///
    /// Holds the bus for the write plus the settle delay.
    pub fn send(&self, destination: u8, command: u8, payload: &[u8]) -> Result<()> {
        let mut guard = lock(&self.writer);
        let writer = guard.as_mut().ok_or(SessionError::Disconnected)?;

        match writer.send(destination, command, payload) {
            Ok(()) => {}
            Err(err @ FrameError::PayloadTooLarge { .. }) => return Err(err.into()),
            Err(err) => {
                self.shared.record_error();
                warn!(destination, command = command_name(command), error = %err, "send failed");
                return Err(SessionError::Send(err));
            }
        }

        self.shared.counters.tx.fetch_add(1, Ordering::Relaxed);
        debug!(
            target: FRAME_LOG_TARGET,
            destination,
            peer = address_name(destination),
            command = command_name(command),
            size = payload.len(),
            "sent frame"
        );

        if !self.config.settle_delay.is_zero() {
            thread::sleep(self.config.settle_delay);
        }
        Ok(())
    }

    /// Call `handler` from the receive thread for every accepted frame with `command`.
    ///
    /// Replaces any handler already registered for that code. The handler
    /// runs after the frame is stored for waiting callers and must not block.
    pub fn register_handler<F>(&self, command: u8, handler: F)
    where
        F: Fn(&Frame) + Send + Sync + 'static,
    {
        lock(&self.shared.handlers).insert(command, Arc::new(handler));
    }

    /// Remove the handler for `command`, if any.
    pub fn unregister_handler(&self, command: u8) {
        lock(&self.shared.handlers).remove(&command);
    }

    /// Stop the receive thread and close the port.
    ///
    /// Safe to call more than once and concurrently with requests in flight;
    /// those return their response if it already arrived, otherwise a timeout.
    pub fn disconnect(&self) {
        if !self.shared.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.shared.slots.close();

        if let Some(handle) = lock(&self.receiver).take() {
            let deadline = Instant::now() + self.config.disconnect_grace;
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(JOIN_POLL_INTERVAL);
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("receive thread panicked");
                }
            } else {
                warn!(
                    grace = ?self.config.disconnect_grace,
                    "receive thread did not stop in time; detaching"
                );
            }
        }

        lock(&self.writer).take();
        info!(port = %self.port, "session disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SessionStats {
        let counters = &self.shared.counters;
        SessionStats {
            tx_count: counters.tx.load(Ordering::Relaxed),
            rx_count: counters.rx.load(Ordering::Relaxed),
            error_count: counters.errors.load(Ordering::Relaxed),
        }
    }

    pub fn host_address(&self) -> u8 {
        self.config.host_address
    }

    /// Port name, or the transport name for unnamed streams.
    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("port", &self.port)
            .field("host_address", &self.config.host_address)
            .field("connected", &self.is_connected())
            .finish()
    }
}

fn receive_loop(mut reader: BusStream, shared: Arc<Shared>) {
    let mut reassembler = Reassembler::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    while shared.running.load(Ordering::Acquire) {
        let read = match reader.read(&mut chunk) {
            Ok(0) => {
                thread::sleep(IDLE_BACKOFF);
                continue;
            }
            Ok(n) => n,
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(err) => {
                shared.record_error();
                warn!(error = %err, "serial read failed");
                reassembler.reset();
                thread::sleep(READ_ERROR_BACKOFF);
                continue;
            }
        };

        for result in reassembler.feed(&chunk[..read]) {
            match result {
                Ok(frame) => shared.dispatch(frame),
                Err(err) => {
                    shared.record_error();
                    warn!(error = %err, "discarding malformed frame");
                }
            }
        }
    }

    debug!("receive loop stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
