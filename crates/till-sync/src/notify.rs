//! # Notification Boundary
//!
//! Operator-facing feedback for lifecycle actions and sync anomalies.
//!
//! The UI that renders these is out of scope; this module only defines the
//! contract. Lifecycle actions produce blocking Success/Error dialogs,
//! realtime sync anomalies produce non-blocking warnings (they are expected
//! to self-heal on the next event or polling tick).

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use ts_rs::TS;

// =============================================================================
// Notice
// =============================================================================

/// Severity/intent of an operator notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
    /// Requires operator confirmation before an action proceeds.
    Confirm,
}

/// One operator-facing notification.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    /// Builds a success notice.
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Builds an error notice.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Builds a warning notice.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Warning,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Builds an info notice.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Notification Sink
// =============================================================================

/// Trait for delivering notices to the operator (implemented by the UI
/// integration).
///
/// Shared as an `Arc<dyn NotificationSink>` by every component that emits
/// operator feedback.
pub trait NotificationSink: Send + Sync {
    /// Delivers a notice. Must not block.
    fn notify(&self, notice: Notice);
}

/// No-op sink for testing.
pub struct NoOpSink;

impl NotificationSink for NoOpSink {
    fn notify(&self, _notice: Notice) {}
}

/// Default sink that writes notices to the log.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => error!(title = %notice.title, "{}", notice.message),
            NoticeKind::Warning => warn!(title = %notice.title, "{}", notice.message),
            _ => info!(title = %notice.title, "{}", notice.message),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_builders() {
        let notice = Notice::success("Register Opened", "The register was opened.");
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.title, "Register Opened");

        assert_eq!(Notice::warning("t", "m").kind, NoticeKind::Warning);
        assert_eq!(Notice::error("t", "m").kind, NoticeKind::Error);
        assert_eq!(Notice::info("t", "m").kind, NoticeKind::Info);
    }

    #[test]
    fn test_notice_serde_shape() {
        let json = serde_json::to_string(&Notice::warning("Sync", "no category")).unwrap();
        assert!(json.contains("\"kind\":\"warning\""));
        assert!(json.contains("\"title\":\"Sync\""));
    }
}
