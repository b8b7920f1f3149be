use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use rs485prims_session::{HealthEvent, HealthMonitor, MonitorConfig};

use crate::cmd::MonitorArgs;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_health, OutputFormat};

const STOP_POLL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let session = Arc::new(args.bus.connect()?);
    let mut config = MonitorConfig {
        interval: args.interval,
        ..MonitorConfig::default()
    };
    if !args.peers.is_empty() {
        config.peers = args.peers.clone();
    }
    let per_round = config.peers.len();

    let (tx, rx) = mpsc::channel::<HealthEvent>();
    let mut monitor = HealthMonitor::spawn(Arc::clone(&session), config, tx)
        .map_err(|err| session_error("monitor failed to start", err))?;

    let mut seen = 0usize;
    while running.load(Ordering::SeqCst) {
        let event = match rx.recv_timeout(STOP_POLL) {
            Ok(event) => event,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        print_health(&event, format);
        seen = seen.saturating_add(1);

        if let Some(rounds) = args.count {
            if seen >= rounds.saturating_mul(per_round) {
                break;
            }
        }
    }

    monitor.stop();
    session.disconnect();
    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler failed: {err}")))
}
