//! Structured logging setup for applications using imgrad
//!
//! The library crates only emit `tracing` spans and events (operators are
//! instrumented at `debug` level). This module installs a
//! `tracing-subscriber` to print them.
//!
//! # Example
//!
//! ```ignore
//! use imgrad::tracing_support::{init_tracing, TracingConfig, TracingFormat};
//!
//! init_tracing(TracingConfig {
//!     format: TracingFormat::Compact,
//!     filter: "imgrad_kernels=debug,info".to_string(),
//!     ..TracingConfig::default()
//! })?;
//! ```
//!
//! # Environment Variables
//!
//! Read by [`TracingConfig::from_env`]:
//!
//! - `RUST_LOG`: filter directive (e.g., `RUST_LOG=imgrad_ad=debug`)
//! - `IMGRAD_LOG_FORMAT`: `json`, `compact` or `pretty` (default: `pretty`)

use anyhow::Result;
#[cfg(feature = "tracing-subscriber")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Environment variable selecting the output format
pub const LOG_FORMAT_ENV: &str = "IMGRAD_LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "imgrad=info,imgrad_kernels=info,imgrad_ad=info,warn";

/// Line layout of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingFormat {
    /// Multi-line, indented fields
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// One line per event
    Compact,
}

impl TracingFormat {
    /// Case-insensitive name lookup; unrecognised names give `Pretty`
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("json") {
            TracingFormat::Json
        } else if name.eq_ignore_ascii_case("compact") {
            TracingFormat::Compact
        } else {
            TracingFormat::Pretty
        }
    }
}

/// Subscriber settings consumed by [`init_tracing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    pub format: TracingFormat,
    /// `EnvFilter` directive string
    pub filter: String,
    /// Colour output; JSON never uses it
    pub with_ansi: bool,
    pub with_target: bool,
    pub with_thread_ids: bool,
    /// Source file and line of each event
    pub with_file: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: TracingFormat::default(),
            filter: DEFAULT_FILTER.to_owned(),
            with_ansi: true,
            with_target: true,
            with_thread_ids: false,
            with_file: false,
        }
    }
}

impl TracingConfig {
    /// [`Default`] settings with `RUST_LOG` and `IMGRAD_LOG_FORMAT` applied
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let format = lookup(LOG_FORMAT_ENV)
            .map(|name| TracingFormat::parse(&name))
            .unwrap_or_default();
        let filter = lookup("RUST_LOG")
            .filter(|directive| !directive.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_owned());
        Self {
            format,
            filter,
            ..Self::default()
        }
    }

    #[cfg(feature = "tracing-subscriber")]
    fn event_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_target(self.with_target)
            .with_thread_ids(self.with_thread_ids)
            .with_file(self.with_file)
            .with_line_number(self.with_file);
        match self.format {
            TracingFormat::Pretty => base.pretty().with_ansi(self.with_ansi).boxed(),
            TracingFormat::Compact => base.compact().with_ansi(self.with_ansi).boxed(),
            TracingFormat::Json => base.json().boxed(),
        }
    }
}

/// Install the process-wide subscriber described by `config`.
///
/// # Errors
///
/// Fails when `config.filter` is not a valid directive or when a global
/// subscriber is already set.
#[cfg(feature = "tracing-subscriber")]
pub fn init_tracing(config: TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;
    tracing_subscriber::registry()
        .with(config.event_layer().with_filter(filter))
        .try_init()?;

    tracing::debug!(format = ?config.format, filter = %config.filter, "tracing initialised");
    Ok(())
}

/// No-op without the `tracing-subscriber` feature
#[cfg(not(feature = "tracing-subscriber"))]
pub fn init_tracing(_config: TracingConfig) -> Result<()> {
    Ok(())
}
