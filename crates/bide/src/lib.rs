//! bide: self-waiting element assertions over a WebDriver-style session
//!
//! This crate provides lazy element and collection handles that re-resolve
//! against the live browser session on every operation and retry conditions
//! until they hold or a timeout expires. Handles never cache a resolved
//! driver element, so a handle created at the top of a test keeps observing
//! the current page for its whole lifetime.
//!
//! # Examples
//!
//! ## Self-waiting assertions
//!
//! ```ignore
//! use bide::conditions::{exact_text, not, size, visible};
//! use bide::{Config, Session};
//!
//! # async fn run(driver: std::sync::Arc<dyn bide::Driver>) -> bide::Result<()> {
//! let session = Session::new(driver, Config::default());
//!
//! // Creating a handle starts no lookup; the assertion resolves and
//! // retries until the condition holds or the timeout expires.
//! let status = session.element("#status");
//! status.should_be(visible()).await?;
//! status.should_have(exact_text("Saved")).await?;
//!
//! // Absence is awaited through the same retry loop.
//! session.element("#spinner").should(not(visible())).await?;
//!
//! // Collections stay lazy too, including filtered views.
//! session
//!     .elements("#messages li")
//!     .filtered_by(visible())
//!     .should_have(size(3))
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Actions wait for actionability
//!
//! ```ignore
//! use bide::{Config, Session};
//!
//! # async fn run(session: Session) -> bide::Result<()> {
//! // click() waits for the button to become visible first.
//! session.element("#save").click().await?;
//! session.element("input[name='email']").set_value("a@b.c").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Wiring collaborators through the container
//!
//! ```ignore
//! use bide::{Config, Container, Driver, Session};
//!
//! # fn wire(make_driver: fn() -> std::sync::Arc<dyn Driver>) -> bide::Result<Session> {
//! let container = Container::new();
//! container.bind::<Config, Config, _>(|_| Ok(std::sync::Arc::new(Config::default())))?;
//! // Bind `dyn Driver` to whatever WebDriver/CDP client the suite uses.
//! Session::from_container(&container)
//! # }
//! ```

use std::time::Duration;

mod collection;
pub mod conditions;
mod config;
mod container;
mod driver;
mod element;
mod error;
mod locator;
mod session;
mod wait;

/// Default wait budget for `should_*` assertions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(4);

/// Default pause between retry attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Re-export error types
pub use error::{Error, Result};

// Re-export the session entry point and handles
pub use collection::Collection;
pub use element::Element;
pub use session::Session;

// Re-export condition types (factories live in `conditions`)
pub use conditions::{CollectionCondition, Condition};

// Re-export the driver seam
pub use driver::{
    Driver, DriverError, DriverResult, ElementRef, FailureContext, FailureReporter, NoopReporter,
};

// Re-export configuration and wiring
pub use config::Config;
pub use container::Container;
pub use locator::Selector;
