use std::time::{Duration, Instant};

/// How long a notification stays visible without user action.
pub const AUTO_DISMISS: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Success => "✅",
            Severity::Error => "❌",
        }
    }
}

/// Read-only snapshot of the feedback slot. `message` and `severity` stay
/// intact after dismissal; they are only overwritten by the next `notify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    pub visible: bool,
    pub severity: Severity,
    pub message: String,
}

/// Single-slot, last-write-wins feedback channel.
///
/// There is no queue: a second `notify` while one is visible replaces it and
/// restarts the auto-dismiss window. The dismissal timer is owned here, not
/// by the renderer; callers drive it via `tick`.
#[derive(Debug)]
pub struct NotificationChannel {
    state: NotificationState,
    shown_at: Option<Instant>,
}

impl NotificationChannel {
    pub fn new() -> Self {
        Self {
            state: NotificationState {
                visible: false,
                severity: Severity::Info,
                message: String::new(),
            },
            shown_at: None,
        }
    }

    pub fn state(&self) -> &NotificationState {
        &self.state
    }

    /// Overwrite the slot and make it visible, restarting the dismiss window.
    pub fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.state = NotificationState {
            visible: true,
            severity,
            message: message.into(),
        };
        self.shown_at = Some(Instant::now());
    }

    /// Hide the notification without clearing its content. Idempotent.
    pub fn dismiss(&mut self) {
        self.state.visible = false;
        self.shown_at = None;
    }

    /// Fire the auto-dismiss once the window has elapsed. Returns whether
    /// this call dismissed the notification.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.shown_at {
            Some(shown) if now.duration_since(shown) >= AUTO_DISMISS => {
                self.dismiss();
                true
            }
            _ => false,
        }
    }
}

impl Default for NotificationChannel {
    fn default() -> Self {
        Self::new()
    }
}
