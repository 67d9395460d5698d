use strum::Display;
use tracing::debug;

/// Outcome notifications the host platform can turn into haptics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Notification {
    Success,
    Error,
    Warning,
}

/// Strength of a tap-style impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Impact {
    Light,
    Medium,
    Heavy,
    Rigid,
    Soft,
}

/// A decorative side channel for user feedback.
///
/// Calls are fire-and-forget: implementors must not fail and callers never wait on them.
pub trait Feedback {
    fn notify(&self, notification: Notification);

    fn impact(&self, impact: Impact);

    fn selection_changed(&self);
}

/// Discards all feedback. Used when the app runs outside the chat platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

impl Feedback for NoopFeedback {
    fn notify(&self, _notification: Notification) {}

    fn impact(&self, _impact: Impact) {}

    fn selection_changed(&self) {}
}

/// Records feedback as trace events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl Feedback for TracingFeedback {
    fn notify(&self, notification: Notification) {
        debug!(%notification, "feedback notification");
    }

    fn impact(&self, impact: Impact) {
        debug!(%impact, "feedback impact");
    }

    fn selection_changed(&self) {
        debug!("feedback selection changed");
    }
}
