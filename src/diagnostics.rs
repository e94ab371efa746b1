//! Diagnostics port
//!
//! Engine components report skipped work and progress through
//! [`Diagnostics`] instead of calling a logger directly. Production code
//! forwards to `tracing`; tests capture events for assertions.

use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    pub level: DiagnosticLevel,
    pub component: &'static str,
    pub message: String,
}

pub trait Diagnostics: Send + Sync {
    fn record(&self, event: DiagnosticEvent);

    fn debug(&self, component: &'static str, message: String) {
        self.record(DiagnosticEvent {
            level: DiagnosticLevel::Debug,
            component,
            message,
        });
    }

    fn info(&self, component: &'static str, message: String) {
        self.record(DiagnosticEvent {
            level: DiagnosticLevel::Info,
            component,
            message,
        });
    }

    fn warn(&self, component: &'static str, message: String) {
        self.record(DiagnosticEvent {
            level: DiagnosticLevel::Warn,
            component,
            message,
        });
    }

    fn error(&self, component: &'static str, message: String) {
        self.record(DiagnosticEvent {
            level: DiagnosticLevel::Error,
            component,
            message,
        });
    }
}

/// Forwards every event to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        let DiagnosticEvent {
            level,
            component,
            message,
        } = event;
        match level {
            DiagnosticLevel::Debug => debug!(component, "{}", message),
            DiagnosticLevel::Info => info!(component, "{}", message),
            DiagnosticLevel::Warn => warn!(component, "{}", message),
            DiagnosticLevel::Error => error!(component, "{}", message),
        }
    }
}

#[cfg(test)]
pub use recording::RecordingDiagnostics;
