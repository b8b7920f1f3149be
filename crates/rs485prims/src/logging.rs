use clap::ValueEnum;
use rs485prims_session::FRAME_LOG_TARGET;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crate prefix shared by every workspace member's log target.
const OWN_TARGETS: &str = "rs485prims";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Which events reach stderr.
///
/// Dependencies stay at warn. Per-frame traffic is logged on every request,
/// so it is held back to info unless `frames` is set, in which case it shows
/// at debug or at `level`, whichever is more verbose.
pub fn log_filter(level: LogLevel, frames: bool) -> Targets {
    let level = LevelFilter::from(level);
    let frame_level = if frames {
        level.max(LevelFilter::DEBUG)
    } else {
        level.min(LevelFilter::INFO)
    };

    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target(OWN_TARGETS, level)
        .with_target(FRAME_LOG_TARGET, frame_level)
}

/// Logs go to stderr so stdout stays machine-readable.
///
/// Thread names are included: frame traffic is logged from `rs485-rx` and
/// polling from `rs485-health`, not from the thread that issued the command.
pub fn init_logging(format: LogFormat, level: LogLevel, frames: bool) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);
    let registry = tracing_subscriber::registry().with(log_filter(level, frames));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}
