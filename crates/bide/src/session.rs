// Session - explicit context object owning the driver-facing collaborators
//
// There is no ambient global session. Each test thread or task constructs
// its own Session (directly or through a Container) and hands it around;
// every handle created from it keeps a cheap clone. The session lives until
// the last handle is dropped; the underlying driver decides what teardown
// means.

use std::sync::Arc;

use crate::collection::Collection;
use crate::config::Config;
use crate::container::Container;
use crate::driver::{Driver, ElementRef, FailureContext, FailureReporter, NoopReporter};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::locator::{CollectionSource, ElementSource, Locator, Selector};

/// Entry point for element and collection handles.
///
/// ```ignore
/// use bide::conditions::{size, text};
/// use bide::{Config, Session};
///
/// let session = Session::new(driver, Config::default());
/// session.element("#status").should_have(text("Saved")).await?;
/// session.elements("#messages .new").should_have(size(3)).await?;
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

struct Inner {
    driver: Arc<dyn Driver>,
    reporter: Arc<dyn FailureReporter>,
    config: Config,
}

impl Session {
    /// Session with a no-op failure reporter.
    pub fn new(driver: Arc<dyn Driver>, config: Config) -> Self {
        Self::with_reporter(driver, Arc::new(NoopReporter), config)
    }

    pub fn with_reporter(
        driver: Arc<dyn Driver>,
        reporter: Arc<dyn FailureReporter>,
        config: Config,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                driver,
                reporter,
                config,
            }),
        }
    }

    /// Builds a session from container bindings.
    ///
    /// `dyn Driver` and `Config` are required; `dyn FailureReporter` is
    /// optional and falls back to [`NoopReporter`].
    pub fn from_container(container: &Container) -> Result<Self> {
        let driver = container.instance::<dyn Driver>()?;
        let config = container.instance::<Config>()?;
        let reporter: Arc<dyn FailureReporter> =
            match container.instance::<dyn FailureReporter>() {
                Ok(reporter) => reporter,
                Err(Error::NoBinding { .. }) => Arc::new(NoopReporter),
                Err(e) => return Err(e),
            };
        Ok(Self::with_reporter(driver, reporter, (*config).clone()))
    }

    /// Lazy handle for the first element matching `selector`.
    ///
    /// No lookup happens until the handle is used.
    pub fn element(&self, selector: impl Into<Selector>) -> Element {
        self.element_at(selector, 0)
    }

    /// Lazy handle for the Nth (0-based) element matching `selector`.
    pub fn element_at(&self, selector: impl Into<Selector>, index: usize) -> Element {
        Element::new(
            self.clone(),
            ElementSource::ByLocator(Locator {
                selector: selector.into(),
                parent: None,
                index,
            }),
        )
    }

    /// Lazy collection of all elements matching `selector`.
    pub fn elements(&self, selector: impl Into<Selector>) -> Collection {
        Collection::new(
            self.clone(),
            CollectionSource::BySelector {
                selector: selector.into(),
                parent: None,
            },
        )
    }

    /// Wraps an explicit element list into a fixed collection handle.
    pub fn wrap(&self, elements: Vec<ElementRef>) -> Collection {
        Collection::new(self.clone(), CollectionSource::Fixed(elements))
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.inner.driver
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Best-effort failure artifact capture; never masks the original error.
    pub(crate) async fn report_failure(&self, context: &FailureContext) {
        if let Err(e) = self.inner.reporter.capture_failure(context).await {
            tracing::debug!(error = %e, "failure artifact capture failed");
        }
    }
}
