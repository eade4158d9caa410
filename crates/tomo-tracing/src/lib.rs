//! Shared tracing setup for the tomo workspace.
//!
//! Integration tests, benches and downstream binaries install their `tracing`
//! subscriber through [`init_global_tracing`] so projection events look the
//! same everywhere. The projection crates only emit events and never install
//! a subscriber themselves.
//!
//! ```no_run
//! use tomo_tracing::{init_global_tracing, TracingConfig};
//!
//! // TOMO_TRACING_PROFILE=performance cargo bench
//! init_global_tracing(&TracingConfig::from_env())?;
//! # Ok::<(), tomo_tracing::TracingSetupError>(())
//! ```

pub mod performance;

#[macro_use]
pub mod macros;

use std::env;
use std::io;

use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::TestWriter;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter, Registry};

/// How the workspace subscriber filters, formats and writes events.
#[derive(Clone, Debug)]
pub struct TracingConfig {
    /// Filter directives such as `tomo_raytrafo=debug,info`. Without them
    /// `RUST_LOG` applies, then [`default_directive`](Self::default_directive).
    pub directives: Option<String>,
    pub default_directive: String,
    /// Print event targets (module paths).
    pub include_targets: bool,
    /// ANSI colours; ignored for JSON output.
    pub ansi: bool,
    /// Span lifecycle events to emit.
    pub span_events: FmtSpan,
    pub output: TracingOutput,
    pub writer: TracingWriter,
    /// Emit projection and engine timing spans.
    pub enable_performance_tracing: bool,
    /// Minimum duration in microseconds for a timing span to be logged.
    pub performance_threshold_us: Option<u64>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::for_local()
    }
}

impl TracingConfig {
    /// Pretty, coloured output on stdout.
    pub fn for_local() -> Self {
        Self {
            directives: None,
            default_directive: "info".to_string(),
            include_targets: true,
            ansi: true,
            span_events: FmtSpan::NONE,
            output: TracingOutput::Pretty,
            writer: TracingWriter::Stdout,
            enable_performance_tracing: cfg!(debug_assertions),
            performance_threshold_us: None,
        }
    }

    /// JSON lines for CI and log collectors.
    pub fn for_ci() -> Self {
        Self {
            ansi: false,
            output: TracingOutput::Json,
            enable_performance_tracing: false,
            ..Self::for_local()
        }
    }

    /// Debug output of the projection crates with span close timings.
    pub fn for_performance() -> Self {
        Self {
            directives: Some("tomo_raytrafo=debug,tomo_tracing=debug".to_string()),
            span_events: FmtSpan::CLOSE,
            enable_performance_tracing: true,
            ..Self::for_ci()
        }
    }

    /// Compact debug output routed through the test harness capture.
    ///
    /// Events of a passing test stay hidden; a failing test prints them with
    /// its output.
    pub fn for_tests() -> Self {
        Self {
            directives: Some("tomo_raytrafo=debug,tomo_tracing=debug".to_string()),
            ansi: false,
            output: TracingOutput::Compact,
            writer: TracingWriter::TestCapture,
            enable_performance_tracing: true,
            ..Self::for_local()
        }
    }

    /// Start from a profile and apply environment overrides.
    ///
    /// | variable | effect |
    /// |---|---|
    /// | `TOMO_TRACING_PROFILE` | `local` (default), `ci`, `performance` or `test` |
    /// | `TOMO_TRACING_DIRECTIVES` | replaces the filter directives |
    /// | `TOMO_TRACING_FORMAT` | `pretty`, `compact` or `json` |
    /// | `TOMO_TRACING_WRITER` | `stdout` or `stderr` |
    /// | `TOMO_PERF_TRACING` | `true`/`1`/`yes` enables timing spans |
    /// | `TOMO_PERF_THRESHOLD_US` | minimum timing span duration to log |
    pub fn from_env() -> Self {
        let mut config = match env_value("TOMO_TRACING_PROFILE").as_deref() {
            Some("ci") => Self::for_ci(),
            Some("performance") => Self::for_performance(),
            Some("test") => Self::for_tests(),
            _ => Self::for_local(),
        };

        if let Ok(directives) = env::var("TOMO_TRACING_DIRECTIVES") {
            if !directives.trim().is_empty() {
                config.directives = Some(directives);
            }
        }
        if let Some(output) = env_value("TOMO_TRACING_FORMAT").and_then(|v| TracingOutput::parse(&v)) {
            config.output = output;
            if output == TracingOutput::Json {
                config.ansi = false;
            }
        }
        if let Some(writer) = env_value("TOMO_TRACING_WRITER").and_then(|v| TracingWriter::parse(&v)) {
            config.writer = writer;
        }
        if let Some(flag) = env_value("TOMO_PERF_TRACING") {
            config.enable_performance_tracing = matches!(flag.as_str(), "true" | "1" | "yes");
        }
        if let Some(threshold_us) = env_value("TOMO_PERF_THRESHOLD_US").and_then(|v| v.parse().ok()) {
            config.performance_threshold_us = Some(threshold_us);
        }
        config
    }

    fn filter(&self) -> Result<EnvFilter, TracingSetupError> {
        match &self.directives {
            Some(directives) => {
                EnvFilter::try_new(directives).map_err(|err| TracingSetupError::InvalidFilter(err.to_string()))
            }
            None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_directive))),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = tracing_fmt::layer()
            .with_target(self.include_targets)
            .with_span_events(self.span_events.clone())
            .with_writer(self.writer.make_writer());
        match self.output {
            TracingOutput::Compact => Box::new(layer.compact().with_ansi(self.ansi)),
            TracingOutput::Pretty => Box::new(layer.pretty().with_ansi(self.ansi)),
            TracingOutput::Json => Box::new(layer.json().with_ansi(false)),
        }
    }
}

/// Trimmed, lowercased value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_ascii_lowercase())
}

/// Errors raised while installing the workspace subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TracingSetupError {
    #[error("invalid tracing directive: {0}")]
    InvalidFilter(String),
    /// Usually a subscriber is already installed.
    #[error("failed to install global tracing subscriber: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Subscriber described by `config`, not yet installed.
pub fn build_subscriber(config: &TracingConfig) -> Result<impl Subscriber + Send + Sync, TracingSetupError> {
    let filter = config.filter()?;
    Ok(Registry::default().with(config.fmt_layer()).with(filter))
}

/// Install the configured subscriber process-wide and publish the timing
/// settings read by [`performance::PerformanceSpan`].
///
/// Fails with [`TracingSetupError::SubscriberInit`] when another subscriber
/// is already installed; the timing settings are applied regardless.
pub fn init_global_tracing(config: &TracingConfig) -> Result<(), TracingSetupError> {
    performance::configure(config.enable_performance_tracing, config.performance_threshold_us);
    build_subscriber(config)?.try_init()?;
    Ok(())
}

/// Event formatting
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingOutput {
    Compact,
    Pretty,
    Json,
}

impl TracingOutput {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "compact" => Some(Self::Compact),
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Event destination
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingWriter {
    Stdout,
    /// Keeps bench and CLI reports on stdout readable.
    Stderr,
    /// `print!`-based writer captured by the libtest harness.
    TestCapture,
}

impl TracingWriter {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "stdout" => Some(Self::Stdout),
            "stderr" => Some(Self::Stderr),
            _ => None,
        }
    }

    fn make_writer(self) -> BoxMakeWriter {
        match self {
            TracingWriter::Stdout => BoxMakeWriter::new(io::stdout),
            TracingWriter::Stderr => BoxMakeWriter::new(io::stderr),
            TracingWriter::TestCapture => BoxMakeWriter::new(TestWriter::new()),
        }
    }
}
