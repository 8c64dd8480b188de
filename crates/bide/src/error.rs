// Error types for bide

use crate::driver::DriverError;
use thiserror::Error;

/// Result type alias for bide operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when using bide
#[derive(Debug, Error)]
pub enum Error {
    /// A condition was not met before the wait budget expired
    ///
    /// This is the primary user-visible failure mode. It carries everything
    /// needed to diagnose the failure without re-running: how the element is
    /// located, what was expected of it, what was last observed, and how
    /// long the wait lasted.
    #[error(
        "element '{locator}' should {condition}, but was: {last_state} (timeout: {timeout_ms} ms)"
    )]
    ConditionNotMet {
        locator: String,
        condition: String,
        last_state: String,
        timeout_ms: u64,
    },

    /// A collection did not reach the expected size before the wait expired
    ///
    /// Carries the element list as observed at the last poll, rendered one
    /// element per entry.
    #[error(
        "collection '{collection}' size mismatch: expected: {expected}, actual: {actual}, \
         timeout: {timeout_ms} ms\nElements: {elements}"
    )]
    ListSizeMismatch {
        collection: String,
        expected: String,
        actual: usize,
        timeout_ms: u64,
        elements: String,
    },

    /// A collection's texts did not match before the wait expired
    #[error(
        "collection '{collection}' texts mismatch: expected: {expected:?}, actual: {actual:?}, \
         timeout: {timeout_ms} ms"
    )]
    TextsMismatch {
        collection: String,
        expected: Vec<String>,
        actual: Vec<String>,
        timeout_ms: u64,
    },

    /// A driver action failed after its actionability wait had succeeded
    #[error("{action} failed on '{locator}': {source}")]
    Interaction {
        action: &'static str,
        locator: String,
        #[source]
        source: DriverError,
    },

    /// The container detected a cycle while resolving a capability
    ///
    /// The path lists the full cycle in resolution order, e.g.
    /// `FooImpl -> Bar -> FooImpl`.
    #[error("cyclic dependency: {path}")]
    CyclicDependency { path: String },

    /// The capability already has a binding; the first binding stays in effect
    #[error("capability '{capability}' is already bound")]
    AlreadyBound { capability: &'static str },

    /// The capability was already resolved and can no longer be rebound
    #[error("capability '{capability}' was already resolved and can no longer be bound")]
    BoundAfterResolution { capability: &'static str },

    /// No factory was registered for the requested capability
    #[error("no binding registered for capability '{capability}'")]
    NoBinding { capability: &'static str },

    /// The container cache held a value of an unexpected type
    #[error("container cache holds an unexpected type for capability '{capability}'")]
    CorruptedCache { capability: &'static str },

    /// Fatal session-level failure, propagated immediately without retry
    #[error("session failure: {0}")]
    Session(#[from] DriverError),
}
