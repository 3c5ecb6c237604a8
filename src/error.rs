//! Error types used by the bubblebus dispatch engine.
//!
//! This module defines one error enum:
//!
//! - [`BusError`] — errors raised by registration and publish operations on an
//!   [`EventManager`](crate::EventManager).
//!
//! The type provides helper methods (`as_label`, `as_message`) for logging and
//! metrics. Handler panics during dispatch are deliberately **not** represented
//! here: they are caught, logged and never propagated to the publisher.

use thiserror::Error;

/// # Errors produced by bus operations.
///
/// These represent misuse of the registration/publish API, not failures of
/// individual handlers. Unsubscribe operations never produce them; they are
/// silent no-ops on a disposed manager or an unknown target.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Operation attempted on a manager after [`dispose`](crate::EventManager::dispose).
    ///
    /// The disposed state is terminal; callers must construct a new manager.
    #[error("event manager '{manager}' is disposed")]
    Disposed {
        /// Name of the manager (from its config).
        manager: String,
    },

    /// The same handler identity is already registered on this manager.
    ///
    /// Identity is `Arc` pointer identity: wrapping the same closure in a
    /// second `Arc` yields a distinct, registrable handler.
    #[error("handler '{handler}' is already registered on manager '{manager}'")]
    DuplicateHandler {
        /// Name of the offending handler.
        handler: String,
        /// Name of the manager.
        manager: String,
    },

    /// The same listener identity is already registered on this manager.
    #[error("listener '{listener}' is already registered on manager '{manager}'")]
    DuplicateListener {
        /// Name of the offending listener.
        listener: String,
        /// Name of the manager.
        manager: String,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bubblebus::BusError;
    ///
    /// let err = BusError::Disposed { manager: "root".into() };
    /// assert_eq!(err.as_label(), "manager_disposed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::Disposed { .. } => "manager_disposed",
            BusError::DuplicateHandler { .. } => "duplicate_handler",
            BusError::DuplicateListener { .. } => "duplicate_listener",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::Disposed { manager } => format!("disposed: manager={manager}"),
            BusError::DuplicateHandler { handler, manager } => {
                format!("duplicate handler: handler={handler} manager={manager}")
            }
            BusError::DuplicateListener { listener, manager } => {
                format!("duplicate listener: listener={listener} manager={manager}")
            }
        }
    }

    /// True if the error is the terminal disposed-manager error.
    ///
    /// # Example
    /// ```
    /// use bubblebus::BusError;
    ///
    /// let err = BusError::Disposed { manager: "root".into() };
    /// assert!(err.is_disposed());
    /// ```
    pub fn is_disposed(&self) -> bool {
        matches!(self, BusError::Disposed { .. })
    }
}
