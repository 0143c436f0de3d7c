//! Error taxonomy for the component runtime.
//!
//! Every variant marks a programming error in a collaborator, not a
//! runtime condition to degrade from. Nothing here is caught
//! internally - errors terminate the call chain that triggered them.

use crate::bus::Lifecycle;

/// Errors surfaced by lifecycle, property and render operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Emit to a lifecycle event with no registered handlers.
    ///
    /// Emitting into the void is treated as a wiring bug, never a
    /// silent no-op.
    #[error("no handlers registered for `{0}` event")]
    UnknownEvent(Lifecycle),

    /// An operation the reactive property store rejects outright,
    /// such as deleting a property key. The store is left unmodified.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The render step produced something other than exactly one root
    /// element, or markup that does not parse.
    #[error("malformed render: {0}")]
    MalformedRender(String),
}

impl Error {
    /// Shorthand for the "property keys cannot be deleted" rejection.
    pub(crate) fn prop_deletion(key: &str) -> Self {
        Self::InvalidOperation(format!("property keys cannot be deleted: `{key}`"))
    }
}

// =============================================================================
// Tests
// =============================================================================
