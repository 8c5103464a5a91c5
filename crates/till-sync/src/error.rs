//! # Sync Error Types
//!
//! Error taxonomy for the reconciliation engine.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Conflict     │  │   Validation    │  │        Store            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  AlreadyOpen    │  │  Validation     │  │  Store (wraps DbError)  │ │
//! │  │  NotOpen        │  │  (wraps core    │  │                         │ │
//! │  │  SessionStill-  │  │   errors)       │  │  transport/remote       │ │
//! │  │  Open           │  │                 │  │  failures propagate to  │ │
//! │  │  SessionNot-    │  │  aborted before │  │  the caller; no partial │ │
//! │  │  Found          │  │  any write      │  │  write is assumed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Conflicts and validation failures are surfaced to the operator and    │
//! │  never auto-retried. A skipped order is NOT an error - see             │
//! │  SyncOutcome::Skipped in the engine module.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use till_core::ValidationError;
use till_db::DbError;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Error type covering lifecycle and reconciliation failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Conflict Errors (lifecycle preconditions)
    // =========================================================================
    /// Attempted to open while a session is already open.
    #[error("Register already open (session {0})")]
    AlreadyOpen(String),

    /// Attempted an action that requires an open register.
    #[error("No open register")]
    NotOpen,

    /// Attempted to delete a session that is still open.
    #[error("Register session {0} is still open")]
    SessionStillOpen(String),

    /// Referenced session does not exist.
    #[error("Register session not found: {0}")]
    SessionNotFound(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    /// Malformed input; the operation was aborted with no partial write.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Store Errors
    // =========================================================================
    /// A ledger store call failed. Each write is a single atomic remote
    /// call, so a failed call means that specific write did not happen.
    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// True for lifecycle precondition violations. Surfaced to the operator
    /// as a blocking dialog; never auto-retried.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SyncError::AlreadyOpen(_)
                | SyncError::NotOpen
                | SyncError::SessionStillOpen(_)
                | SyncError::SessionNotFound(_)
        )
    }

    /// True for malformed-input failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }

    /// True for store/transport failures. These are expected to self-heal
    /// on the next event or polling tick for sync paths.
    pub fn is_store(&self) -> bool {
        matches!(self, SyncError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorization() {
        assert!(SyncError::AlreadyOpen("s1".into()).is_conflict());
        assert!(SyncError::NotOpen.is_conflict());
        assert!(SyncError::SessionStillOpen("s1".into()).is_conflict());

        let validation: SyncError = ValidationError::MustBePositive {
            field: "amount".into(),
        }
        .into();
        assert!(validation.is_validation());
        assert!(!validation.is_conflict());

        let store: SyncError = DbError::PoolExhausted.into();
        assert!(store.is_store());
        assert!(!store.is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::AlreadyOpen("abc-123".into());
        assert!(err.to_string().contains("abc-123"));
        assert_eq!(SyncError::NotOpen.to_string(), "No open register");
    }
}
