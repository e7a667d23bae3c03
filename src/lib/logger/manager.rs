use std::{
    io::{self, Write},
    sync::{Arc, Mutex},
};

use ringbuffer::{AllocRingBuffer, RingBuffer};
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{metadata::LevelFilter, *};
use tracing_log::LogTracer;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    EnvFilter, Layer,
};

use crate::cli;

/// Lines kept for `/api/log` clients that connect late
pub const HISTORY_CAPACITY: usize = 10 * 1024;
const LIVE_CAPACITY: usize = 100;

/// Recent formatted log lines plus a live feed of the new ones
pub struct LogHistory {
    lines: AllocRingBuffer<String>,
    live: Sender<String>,
}

impl Default for LogHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl LogHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let (live, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            lines: AllocRingBuffer::new(capacity),
            live,
        }
    }

    pub fn record(&mut self, line: String) {
        // Nobody listening is fine
        let _ = self.live.send(line.clone());
        self.lines.push(line);
    }

    /// Backlog to replay first, and the receiver for everything after it
    pub fn subscribe(&self) -> (Receiver<String>, Vec<String>) {
        (self.live.subscribe(), self.lines.to_vec())
    }
}

/// fmt writer recording every formatted event into a [`LogHistory`]
#[derive(Clone)]
struct HistoryWriter {
    history: Arc<Mutex<LogHistory>>,
}

impl Write for HistoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut history) = self.history.lock() {
            history.record(String::from_utf8_lossy(buf).into_owned());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for HistoryWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

lazy_static! {
    pub static ref HISTORY: Arc<Mutex<LogHistory>> = Default::default();
}

// Start logger, should be done inside main
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Redirect all logs from libs using "Log"
    LogTracer::init_with_filter(tracing::log::LevelFilter::Trace)?;

    // Configure the console log
    let console_env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli::manager::is_verbose() {
            EnvFilter::new(LevelFilter::DEBUG.to_string())
        } else {
            EnvFilter::new(LevelFilter::INFO.to_string())
        }
    });

    let console_layer = fmt::Layer::new()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(fmt::format::FmtSpan::NONE)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_filter(filter_unwanted_crates(console_env_filter));

    // Configure the file log
    let file_env_filter = if cli::manager::is_tracing() {
        EnvFilter::new(LevelFilter::TRACE.to_string())
    } else {
        EnvFilter::new(LevelFilter::DEBUG.to_string())
    };
    let file_appender =
        tracing_appender::rolling::hourly(cli::manager::log_path(), "scada-sensor-bridge.log");
    let file_layer = fmt::Layer::new()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(fmt::format::FmtSpan::NONE)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(filter_unwanted_crates(file_env_filter));

    // Configure the server log, streamed through /api/log
    let server_env_filter = if cli::manager::is_tracing() {
        EnvFilter::new(LevelFilter::TRACE.to_string())
    } else {
        EnvFilter::new(LevelFilter::DEBUG.to_string())
    };
    let server_layer = fmt::Layer::new()
        .with_writer(HistoryWriter {
            history: HISTORY.clone(),
        })
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(fmt::format::FmtSpan::NONE)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(filter_unwanted_crates(server_env_filter));

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(server_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        "{}, version: {}, build date: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_BUILD_TIMESTAMP").unwrap_or("?"),
    );
    info!(
        "Starting at {}",
        chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
    );
    info!("Server running at {}", cli::manager::server_address());
    debug!("Command line call: {}", cli::manager::command_line_string());
    debug!("Command line input struct call: {}", cli::manager::command_line());

    Ok(())
}

fn filter_unwanted_crates(env_filter: EnvFilter) -> EnvFilter {
    // Connection-level chatter from the HTTP stack
    ["actix_server=warn", "actix_http=warn", "mio=off", "h2=off"]
        .into_iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(env_filter, EnvFilter::add_directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_get_backlog_then_live_lines() {
        let mut history = LogHistory::with_capacity(2);
        history.record("first".into());
        history.record("second".into());
        history.record("third".into());

        let (mut receiver, backlog) = history.subscribe();
        assert_eq!(backlog, vec!["second".to_string(), "third".to_string()]);

        history.record("fourth".into());
        assert_eq!(receiver.recv().await.unwrap(), "fourth");
    }

    #[test]
    fn writer_records_formatted_events() {
        let history = Arc::new(Mutex::new(LogHistory::with_capacity(8)));
        let writer = HistoryWriter {
            history: history.clone(),
        };
        let subscriber = tracing_subscriber::registry().with(
            fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        );

        tracing::subscriber::with_default(subscriber, || {
            info!("device attached");
        });

        let (_, backlog) = history.lock().unwrap().subscribe();
        assert_eq!(backlog.len(), 1);
        assert!(backlog[0].contains("device attached"), "{backlog:?}");
    }
}
