use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub delay: Duration,
    pub display: Duration,
    pub exit: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            display: Duration::from_secs(3),
            exit: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Entering,
    Shown,
    Leaving,
    Expired,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    created: Instant,
}

impl Toast {
    pub fn phase(&self, timing: &Timing, now: Instant) -> Phase {
        let age = now.saturating_duration_since(self.created);
        let shown_at = timing.delay;
        let hidden_at = shown_at + timing.display;
        let removed_at = hidden_at + timing.exit;
        if age < shown_at {
            Phase::Entering
        } else if age < hidden_at {
            Phase::Shown
        } else if age < removed_at {
            Phase::Leaving
        } else {
            Phase::Expired
        }
    }
}

/// Independent, self-dismissing status messages. Each toast runs its own
/// entrance, display, and exit schedule; none of them blocks input.
#[derive(Debug, Default)]
pub struct Notifier {
    timing: Timing,
    toasts: Vec<Toast>,
    next_id: u64,
}

impl Notifier {
    pub fn new(timing: Timing) -> Self {
        Self {
            timing,
            toasts: Vec::new(),
            next_id: 1,
        }
    }

    pub fn notify_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.toasts.push(Toast {
            id,
            message: message.into(),
            severity,
            created: now,
        });
        id
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) -> u64 {
        self.notify_at(message, severity, Instant::now())
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Info)
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Success)
    }

    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.notify(message, Severity::Error)
    }

    /// Drops toasts whose exit transition has finished. Returns true when
    /// anything is still scheduled, so the caller keeps redrawing.
    pub fn prune(&mut self, now: Instant) -> bool {
        let timing = self.timing;
        self.toasts
            .retain(|toast| toast.phase(&timing, now) != Phase::Expired);
        !self.toasts.is_empty()
    }

    /// Toasts currently on screen, oldest first.
    pub fn on_screen(&self, now: Instant) -> Vec<(&Toast, Phase)> {
        self.toasts
            .iter()
            .map(|toast| (toast, toast.phase(&self.timing, now)))
            .filter(|(_, phase)| matches!(phase, Phase::Shown | Phase::Leaving))
            .collect()
    }

    pub fn messages(&self) -> impl Iterator<Item = (&str, Severity)> {
        self.toasts
            .iter()
            .map(|toast| (toast.message.as_str(), toast.severity))
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
