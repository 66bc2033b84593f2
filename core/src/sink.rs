//! Receivers for failures swallowed by the silent call surface.

use crate::error::ApiError;

/// Something that wants to hear about failed calls.
///
/// Any `Fn(&ApiError) + Send + Sync` closure is a sink.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, error: &ApiError);
}

/// Reports through the `log` facade.
///
/// Application failures carry the server's own message and are logged at
/// `warn`; transport failures are logged at `error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, error: &ApiError) {
        match error {
            ApiError::Application { message, .. } => log::warn!("{message}"),
            other => log::error!("{other}"),
        }
    }
}

/// Drops every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct IgnoreSink;

impl DiagnosticSink for IgnoreSink {
    fn report(&self, _error: &ApiError) {}
}

impl<F> DiagnosticSink for F
where
    F: Fn(&ApiError) + Send + Sync,
{
    fn report(&self, error: &ApiError) {
        self(error)
    }
}
