//! Notifications
//!
//! User-facing notices and the single auto-clearing toast slot.
//!
//! The storefront and the product-entry flow produce [`Notice`]s; a UI event
//! loop feeds them to [`Toasts::show`] and calls [`Toasts::tick`] each frame.

use std::fmt;

use jiff::{SignedDuration, Timestamp};

use crate::schedule::Deadline;

/// How long a toast stays visible.
pub const TOAST_DURATION: SignedDuration = SignedDuration::from_secs(3);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// An action succeeded
    Success,

    /// Neutral information
    Info,

    /// Something needs the user's attention
    Warning,

    /// An action failed
    Error,
}

/// A message for the user interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub kind: NoticeKind,

    /// Message text
    pub text: String,
}

impl Notice {
    /// Success notice
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Informational notice
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    /// Warning notice
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    /// Error notice
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Single toast slot. Showing a toast replaces the visible one and restarts
/// its dismissal timer.
#[derive(Debug, Clone, Default)]
pub struct Toasts {
    visible: Option<Notice>,
    dismissal: Deadline<()>,
}

impl Toasts {
    /// Show `notice` at `now`; it clears after [`TOAST_DURATION`].
    pub fn show(&mut self, notice: Notice, now: Timestamp) {
        self.visible = Some(notice);
        self.dismissal.schedule((), now, TOAST_DURATION);
    }

    /// Clear the toast if its timer has elapsed at `now`.
    pub fn tick(&mut self, now: Timestamp) {
        if self.dismissal.poll(now).is_some() {
            self.visible = None;
        }
    }

    /// Clear the toast and cancel its timer.
    pub fn dismiss(&mut self) {
        self.dismissal.cancel();
        self.visible = None;
    }

    /// The visible toast, if any.
    pub fn visible(&self) -> Option<&Notice> {
        self.visible.as_ref()
    }
}
