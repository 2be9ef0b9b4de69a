//! Transient, self-dismissing notifications.
//!
//! Banners stack in the notification region. Each one is visible for
//! [`DISMISS_AFTER`], then fades for [`FADE_DURATION`], and is removed only once
//! the fade has completed. Timers are per banner; the UI loop calls
//! [`Notifier::tick`] with the current instant.

use std::time::{Duration, Instant};

pub const DISMISS_AFTER: Duration = Duration::from_secs(5);
pub const FADE_DURATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Success => "ok",
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Visible,
    Fading,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    created: Instant,
}

impl Notification {
    pub fn phase(&self, now: Instant) -> Phase {
        if now.saturating_duration_since(self.created) < DISMISS_AFTER {
            Phase::Visible
        } else {
            Phase::Fading
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= DISMISS_AFTER + FADE_DURATION
    }
}

/// The notification region.
#[derive(Debug, Default)]
pub struct Notifier {
    items: Vec<Notification>,
    next_id: u64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notify_at(message, severity, Instant::now());
    }

    /// Append a banner created at `now`.
    pub fn notify_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        match severity {
            Severity::Success => tracing::info!(%message, "notify"),
            Severity::Warning => tracing::warn!(%message, "notify"),
            Severity::Error => tracing::error!(%message, "notify"),
        }
        self.next_id += 1;
        self.items.push(Notification {
            id: self.next_id,
            message,
            severity,
            created: now,
        });
    }

    /// Drop banners whose fade has finished. Returns `true` if anything was removed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|n| !n.expired(now));
        self.items.len() != before
    }

    /// Banners currently on screen, oldest first.
    pub fn active(&self) -> &[Notification] {
        &self.items
    }

    /// Take every banner at once, for front-ends that print instead of draw.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.items)
    }

    /// Whether any banner is mid-fade (the UI keeps redrawing while so).
    pub fn any_fading(&self, now: Instant) -> bool {
        self.items.iter().any(|n| n.phase(now) == Phase::Fading)
    }
}
