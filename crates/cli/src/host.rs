//! Terminal host: prints notifications as they arrive.

use careplan_core::{CloseReason, HostSurface, Notification, NotificationLevel};
use std::io::Write;

pub struct TerminalHost<W: Write> {
    out: W,
    errors: usize,
    closed: Option<CloseReason>,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            errors: 0,
            closed: None,
        }
    }

    /// Number of error notifications seen so far.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// How the last session ended, if it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.closed
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!("could not write to terminal: {e}");
        }
    }
}

impl<W: Write> HostSurface for TerminalHost<W> {
    fn notify(&mut self, notification: &Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Warning => "warn",
            NotificationLevel::Error => {
                self.errors += 1;
                "error"
            }
        };
        self.line(&format!("[{tag}] {}", notification.message));
    }

    fn refresh(&mut self) {
        tracing::debug!("host refresh requested");
    }

    fn closed(&mut self, reason: CloseReason) {
        self.closed = Some(reason);
        let text = match reason {
            CloseReason::Completed => "workflow completed",
            CloseReason::Cancelled => "workflow cancelled",
            CloseReason::Host => "workflow closed",
        };
        self.line(text);
    }
}
