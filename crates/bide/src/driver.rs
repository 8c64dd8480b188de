// Driver seam - the narrow capability surface consumed from a browser session
//
// bide does not own a wire protocol. Everything it needs from the browser is
// expressed here: query elements, read their observable state, perform the
// three basic actions, and detect staleness. A WebDriver/CDP client
// implements [`Driver`] once and every handle in the crate works against it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::locator::Selector;

/// Opaque reference to a driver-side element.
///
/// A reference is only valid for the single operation it was resolved for;
/// handles never keep one across operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    id: Arc<str>,
}

impl ElementRef {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Result type alias for driver operations
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Errors surfaced by a [`Driver`] implementation.
///
/// The wait engine retries every variant except [`DriverError::SessionClosed`],
/// which aborts the wait immediately.
#[derive(Debug, Clone, Error)]
pub enum DriverError {
    /// No element currently matches; may succeed if retried shortly after
    #[error("no element matching '{0}'")]
    NotFound(String),

    /// The referenced element is detached from the page
    #[error("stale element reference: {0}")]
    Stale(String),

    /// The element exists but cannot receive the action yet
    #[error("element not interactable: {0}")]
    NotInteractable(String),

    /// Anything transient the driver reports that fits no other class
    #[error("driver error: {0}")]
    Other(String),

    /// The session or browser is gone; never retried
    #[error("session closed: {0}")]
    SessionClosed(String),
}

impl DriverError {
    /// Whether a retry may succeed. Session-level failures are final.
    pub fn is_transient(&self) -> bool {
        !matches!(self, DriverError::SessionClosed(_))
    }
}

/// The drivable-session interface.
///
/// `query` returns matches in document order. Per-element methods take a
/// reference obtained from a prior `query` on the same session.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Queries elements matching `selector`, scoped to `scope` when given,
    /// otherwise to the session root.
    async fn query(
        &self,
        scope: Option<&ElementRef>,
        selector: &Selector,
    ) -> DriverResult<Vec<ElementRef>>;

    async fn text(&self, element: &ElementRef) -> DriverResult<String>;

    async fn tag_name(&self, element: &ElementRef) -> DriverResult<String>;

    async fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>>;

    async fn css_value(&self, element: &ElementRef, name: &str) -> DriverResult<String>;

    async fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool>;

    async fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool>;

    /// Whether the reference points at an element no longer attached to the page.
    async fn is_stale(&self, element: &ElementRef) -> DriverResult<bool>;

    async fn click(&self, element: &ElementRef) -> DriverResult<()>;

    async fn send_keys(&self, element: &ElementRef, keys: &str) -> DriverResult<()>;

    async fn clear(&self, element: &ElementRef) -> DriverResult<()>;
}

/// Context handed to the failure-artifact hook when a wait ultimately fails.
#[derive(Debug, Clone)]
pub struct FailureContext {
    /// Description of how the failing target is located
    pub locator: String,
    /// Description of the condition that was not met
    pub condition: String,
    /// Last observed state of the target, best effort
    pub last_state: String,
    /// How long the wait lasted before giving up
    pub elapsed: Duration,
}

/// Hook invoked once per failed wait, e.g. to capture a screenshot.
///
/// Capture is best-effort: a reporter failure is logged and never masks the
/// assertion failure that triggered it.
#[async_trait]
pub trait FailureReporter: Send + Sync {
    async fn capture_failure(&self, context: &FailureContext) -> DriverResult<()>;
}

/// Default reporter that captures nothing.
#[derive(Debug, Default)]
pub struct NoopReporter;

#[async_trait]
impl FailureReporter for NoopReporter {
    async fn capture_failure(&self, _context: &FailureContext) -> DriverResult<()> {
        Ok(())
    }
}
