/// Convenience result type used across Saccade.
pub type SaccadeResult<T> = Result<T, SaccadeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum SaccadeError {
    /// A parent/child edit or traversal that would make the hierarchy cyclic.
    #[error("cycle error: {0}")]
    Cycle(String),

    /// Destroy requested while hooks or bindings are still pinned to the object.
    #[error("dangling reference error: {0}")]
    DanglingReference(String),

    /// Name or handle lookup miss, including stale handles to destroyed objects.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// Malformed parameters, rejected before any state was mutated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A script hook or custom-animation callback faulted during its invocation.
    ///
    /// Never propagated out of a tick; the scheduler catches it per hook and
    /// reports it in the tick output.
    #[error("hook failure: {0}")]
    HookFailure(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SaccadeError {
    /// Build a [`SaccadeError::Cycle`] value.
    pub fn cycle(msg: impl Into<String>) -> Self {
        Self::Cycle(msg.into())
    }

    /// Build a [`SaccadeError::DanglingReference`] value.
    pub fn dangling(msg: impl Into<String>) -> Self {
        Self::DanglingReference(msg.into())
    }

    /// Build a [`SaccadeError::UnknownObject`] value.
    pub fn unknown_object(msg: impl Into<String>) -> Self {
        Self::UnknownObject(msg.into())
    }

    /// Build a [`SaccadeError::InvalidArgument`] value.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Build a [`SaccadeError::HookFailure`] value.
    pub fn hook_failure(msg: impl Into<String>) -> Self {
        Self::HookFailure(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
