//! Error taxonomy, filter status, and the logging callback seam.
//!
//! Grounded on the teacher crate's root-level `MetricsError` (`thiserror`
//! derive over the crate's fallible paths), expanded with the status/logging
//! shape a filter's `init`/`post_init`/`work` contract needs (spec §7/§10.1).

use std::fmt;

use thiserror::Error;

/// Fatal and non-fatal setup errors (spec §7/§10.1). `init`/`post_init`
/// return `Result<(), RenderSubError>`; `work` never produces one — internal
/// failures there are logged and the frame passes through unmodified.
#[derive(Debug, Error)]
pub enum RenderSubError {
    #[error("styled-text renderer failed to initialize: {reason}")]
    RendererInit { reason: String },

    #[error("no track implementation for subtitle format {format}")]
    UnsupportedFormat { format: String },

    #[error("no subtitle track marked for burning")]
    NoBurnSubtitle,

    #[error("input frame does not match the format this filter was initialized for: {reason}")]
    InputMismatch { reason: String },
}

/// The two-variant result of a steady-state `work` call (spec §6/§7).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FilterStatus {
    Ok,
    Done,
}

/// Log severity, ordered least to most severe so thresholds (spec §5: "below
/// severity 5 forwarded") are plain comparisons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// The renderer's own verbosity scale counts upward from 0 (most severe) to
/// 11 (most verbose); "forward everything below verbosity 5" from spec §5.
pub const RENDERER_VERBOSITY_THRESHOLD: u32 = 5;

/// A session-owning logging sink (spec §9's "pass through a context, not a
/// process global" principle, applied to diagnostics as well as the styled-
/// text renderer's own callback).
pub trait Logger {
    fn log(&self, severity: Severity, args: fmt::Arguments);
}

/// Forwards to the `log` crate at the matching level, so an embedder gets
/// ordinary `log`/`env_logger` behavior without wiring up a custom sink.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdLogger;

impl Logger for StdLogger {
    fn log(&self, severity: Severity, args: fmt::Arguments) {
        match severity {
            Severity::Trace => log::trace!("{}", args),
            Severity::Debug => log::debug!("{}", args),
            Severity::Info => log::info!("{}", args),
            Severity::Warn => log::warn!("{}", args),
            Severity::Error => log::error!("{}", args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_least_to_most_severe() {
        assert!(Severity::Trace < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }

    #[test]
    fn std_logger_does_not_panic() {
        let logger = StdLogger::default();
        logger.log(Severity::Info, format_args!("hello {}", 1));
    }
}
