use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rs485prims_frame::{address_name, KNOWN_PEERS};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::payload::DeviceStatus;
use crate::session::Session;

/// Health polling configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between the start of consecutive polling rounds.
    pub interval: Duration,
    /// Peers polled each round, in order.
    pub peers: Vec<u8>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            peers: KNOWN_PEERS.to_vec(),
        }
    }
}

/// Outcome of polling one peer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum HealthEvent {
    /// Heartbeat answered. `status` is absent if the follow-up status read failed.
    Up {
        address: u8,
        peer_id: u8,
        health: u8,
        status: Option<DeviceStatus>,
    },
    /// No heartbeat answer.
    Down { address: u8 },
}

impl HealthEvent {
    pub fn address(&self) -> u8 {
        match self {
            HealthEvent::Up { address, .. } | HealthEvent::Down { address } => *address,
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, HealthEvent::Up { .. })
    }
}

/// Receives health events on the monitor thread.
pub trait HealthSink: Send + 'static {
    fn on_event(&mut self, event: HealthEvent);
}

impl<F> HealthSink for F
where
    F: FnMut(HealthEvent) + Send + 'static,
{
    fn on_event(&mut self, event: HealthEvent) {
        self(event)
    }
}

impl HealthSink for Sender<HealthEvent> {
    fn on_event(&mut self, event: HealthEvent) {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.send(event);
    }
}

/// Background thread that heartbeats each configured peer on a fixed interval.
///
/// Stopping (explicitly or by drop) waits for the current request to finish,
/// so it takes at most one response timeout.
pub struct HealthMonitor {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Start polling.
    pub fn spawn<S: HealthSink>(
        session: Arc<Session>,
        config: MonitorConfig,
        sink: S,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("rs485-health".to_string())
            .spawn(move || run(session, config, sink, stop_rx))
            .map_err(|source| SessionError::Spawn {
                name: "rs485-health",
                source,
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Stop polling and wait for the thread to exit. Idempotent.
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the channel, which wakes the thread.
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("health monitor thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<S: HealthSink>(
    session: Arc<Session>,
    config: MonitorConfig,
    mut sink: S,
    stop: mpsc::Receiver<()>,
) {
    let mut last_up: HashMap<u8, bool> = HashMap::new();
    info!(peers = ?config.peers, interval = ?config.interval, "health monitor started");

    'rounds: loop {
        let round_start = Instant::now();

        for &address in &config.peers {
            if stopped(&stop) {
                break 'rounds;
            }
            if !session.is_connected() {
                debug!("session closed; health monitor exiting");
                break 'rounds;
            }

            let event = poll_peer(&session, address, &stop);
            let up = event.is_up();
            if last_up.insert(address, up) != Some(up) {
                info!(
                    address,
                    peer = address_name(address),
                    up,
                    "peer connectivity changed"
                );
            }
            sink.on_event(event);
        }

        let remaining = config.interval.saturating_sub(round_start.elapsed());
        match stop.recv_timeout(remaining) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!("health monitor stopped");
}

fn stopped(stop: &mpsc::Receiver<()>) -> bool {
    !matches!(stop.try_recv(), Err(mpsc::TryRecvError::Empty))
}

fn poll_peer(session: &Session, address: u8, stop: &mpsc::Receiver<()>) -> HealthEvent {
    match session.heartbeat(address) {
        Ok(Some(beat)) => {
            // A stop that arrived during the heartbeat skips the status read.
            let status = if stopped(stop) {
                None
            } else {
                match session.get_status(address) {
                    Ok(status) => status,
                    Err(err) => {
                        debug!(address, error = %err, "status read failed");
                        None
                    }
                }
            };
            HealthEvent::Up {
                address,
                peer_id: beat.peer_id,
                health: beat.health,
                status,
            }
        }
        Ok(None) => HealthEvent::Down { address },
        Err(err) => {
            debug!(address, error = %err, "heartbeat failed");
            HealthEvent::Down { address }
        }
    }
}
