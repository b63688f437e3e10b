//! Collaborator seams: session telemetry and user-facing notices.
//!
//! The store reports session lifecycle and failure notices through
//! these traits, fire-and-forget. Hosts hand in their own impls (a
//! telemetry pipe, a toast surface); everything here also ships with
//! no-op, logging, and recording impls so the store works standalone.

use std::sync::{Arc, Mutex};

/// Weight of a notice, shared by telemetry and user notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

// ─── Session Sink ────────────────────────────────────────────────────────

/// Receives session lifecycle events and telemetry notices.
///
/// Calls are fire-and-forget: the store never reads anything back and
/// never lets a sink failure affect graph state.
pub trait SessionSink {
    fn session_started(&self);
    fn session_ended(&self);
    fn notice(&self, severity: Severity, message: &str);
}

/// Discards everything. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSessionSink;

impl SessionSink for NullSessionSink {
    fn session_started(&self) {}
    fn session_ended(&self) {}
    fn notice(&self, _severity: Severity, _message: &str) {}
}

/// Forwards session events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSessionSink;

impl SessionSink for LogSessionSink {
    fn session_started(&self) {
        log::info!("workflow session started");
    }

    fn session_ended(&self) {
        log::info!("workflow session ended");
    }

    fn notice(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }
    }
}

/// One recorded session event, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Ended,
    Notice(Severity, String),
}

/// Records every event in memory. Meant for tests and diagnostics;
/// hold an `Arc<MemorySink>` and inspect [`MemorySink::events`].
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SessionEvent>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn notices(&self) -> Vec<(Severity, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SessionEvent::Notice(severity, message) => Some((severity, message)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

impl SessionSink for MemorySink {
    fn session_started(&self) {
        self.record(SessionEvent::Started);
    }

    fn session_ended(&self) {
        self.record(SessionEvent::Ended);
    }

    fn notice(&self, severity: Severity, message: &str) {
        self.record(SessionEvent::Notice(severity, message.to_string()));
    }
}

// ─── Notifier ────────────────────────────────────────────────────────────

/// Surfaces user-visible messages (toasts, status bar) on failure
/// paths. Fire-and-forget, like [`SessionSink`].
pub trait Notifier {
    fn notify(&self, severity: Severity, message: &str);
}

/// Swallows all notifications. The default notifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _severity: Severity, _message: &str) {}
}

/// Records every notification in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<(Severity, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<(Severity, String)> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, message.to_string()));
    }
}
