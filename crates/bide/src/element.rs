// Element - lazy, self-waiting handle over a single element
//
// An Element never holds a resolved driver reference. Every operation walks
// the locator chain again and retries through the wait engine, so a handle
// created before the page changed still observes the current page.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::collection::Collection;
use crate::conditions::{Condition, exist, visible};
use crate::driver::{DriverError, ElementRef, FailureContext};
use crate::error::{Error, Result};
use crate::locator::{CollectionSource, ElementSource, Locator, Selector, describe_element};
use crate::session::Session;
use crate::wait::{Attempt, WaitError, wait_for};

/// Lazy handle over a single element.
///
/// Created via [`Session::element`], [`Collection::get`] or the chaining
/// methods below; cheap to clone and safe to keep for the whole test.
#[derive(Clone)]
pub struct Element {
    session: Session,
    source: Arc<ElementSource>,
}

impl Element {
    pub(crate) fn new(session: Session, source: ElementSource) -> Self {
        Self {
            session,
            source: Arc::new(source),
        }
    }

    /// Human-readable description of how this element is located.
    pub fn description(&self) -> String {
        self.source.description()
    }

    /// Lazy handle for the first descendant matching `selector`.
    pub fn find(&self, selector: impl Into<Selector>) -> Element {
        self.find_at(selector, 0)
    }

    /// Lazy handle for the Nth (0-based) descendant matching `selector`.
    pub fn find_at(&self, selector: impl Into<Selector>, index: usize) -> Element {
        Element::new(
            self.session.clone(),
            ElementSource::ByLocator(Locator {
                selector: selector.into(),
                parent: Some(Arc::clone(&self.source)),
                index,
            }),
        )
    }

    /// Lazy collection of all descendants matching `selector`.
    pub fn all(&self, selector: impl Into<Selector>) -> Collection {
        Collection::new(
            self.session.clone(),
            CollectionSource::BySelector {
                selector: selector.into(),
                parent: Some(Arc::clone(&self.source)),
            },
        )
    }

    /// Waits until the condition holds, using the session's default timeout.
    pub async fn should(&self, condition: Condition) -> Result<&Self> {
        self.wait_condition(condition, self.session.config().timeout)
            .await?;
        Ok(self)
    }

    /// Alias of [`Element::should`]; reads well for state conditions.
    pub async fn should_be(&self, condition: Condition) -> Result<&Self> {
        self.should(condition).await
    }

    /// Alias of [`Element::should`]; reads well for content conditions.
    pub async fn should_have(&self, condition: Condition) -> Result<&Self> {
        self.should(condition).await
    }

    /// Waits until the negated condition holds. Absence is awaited through
    /// the same retry loop, not assumed from a single failed lookup.
    pub async fn should_not(&self, condition: Condition) -> Result<&Self> {
        self.wait_condition(condition.negate(), self.session.config().timeout)
            .await?;
        Ok(self)
    }

    /// Alias of [`Element::should_not`].
    pub async fn should_not_be(&self, condition: Condition) -> Result<&Self> {
        self.should_not(condition).await
    }

    /// Alias of [`Element::should_not`].
    pub async fn should_not_have(&self, condition: Condition) -> Result<&Self> {
        self.should_not(condition).await
    }

    /// Waits until the condition holds, with an explicit timeout override.
    pub async fn wait_until(&self, condition: Condition, timeout: Duration) -> Result<&Self> {
        self.wait_condition(condition, timeout).await?;
        Ok(self)
    }

    /// Waits until the condition stops holding, with an explicit timeout.
    pub async fn wait_while(&self, condition: Condition, timeout: Duration) -> Result<&Self> {
        self.wait_condition(condition.negate(), timeout).await?;
        Ok(self)
    }

    /// Evaluates the condition exactly once, without waiting.
    ///
    /// A transient resolution failure answers `false` for a positive
    /// condition and `true` for a negated one.
    pub async fn is(&self, condition: Condition) -> Result<bool> {
        let driver = Arc::clone(self.session.driver());
        match self.source.resolve(driver.as_ref()).await {
            Ok(element) => match condition.check(driver.as_ref(), &element).await {
                Ok(holds) => Ok(holds),
                Err(e) if e.is_transient() => Ok(condition.is_negated()),
                Err(e) => Err(Error::Session(e)),
            },
            Err(e) if e.is_transient() => Ok(condition.is_negated()),
            Err(e) => Err(Error::Session(e)),
        }
    }

    /// Whether the element is currently attached; never waits.
    pub async fn exists(&self) -> Result<bool> {
        self.is(exist()).await
    }

    /// Waits for visibility, then clicks.
    pub async fn click(&self) -> Result<()> {
        let element = self.await_ready(visible(), "click").await?;
        self.session
            .driver()
            .click(&element)
            .await
            .map_err(|e| self.interaction_error("click", e))
    }

    /// Waits for visibility, clears the field, then types `text`.
    pub async fn set_value(&self, text: &str) -> Result<()> {
        let element = self.await_ready(visible(), "set_value").await?;
        let driver = self.session.driver();
        driver
            .clear(&element)
            .await
            .map_err(|e| self.interaction_error("set_value", e))?;
        driver
            .send_keys(&element, text)
            .await
            .map_err(|e| self.interaction_error("set_value", e))
    }

    /// Waits for visibility, then types `text` without clearing first.
    pub async fn append(&self, text: &str) -> Result<()> {
        let element = self.await_ready(visible(), "append").await?;
        self.session
            .driver()
            .send_keys(&element, text)
            .await
            .map_err(|e| self.interaction_error("append", e))
    }

    /// Waits for visibility, then clears the field.
    pub async fn clear(&self) -> Result<()> {
        let element = self.await_ready(visible(), "clear").await?;
        self.session
            .driver()
            .clear(&element)
            .await
            .map_err(|e| self.interaction_error("clear", e))
    }

    /// Waits for the element to exist, then reads its text.
    pub async fn text(&self) -> Result<String> {
        let element = self.await_ready(exist(), "read text").await?;
        self.session
            .driver()
            .text(&element)
            .await
            .map_err(|e| self.interaction_error("read text", e))
    }

    /// Waits for the element to exist, then reads an attribute.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let element = self.await_ready(exist(), "read attribute").await?;
        self.session
            .driver()
            .attribute(&element, name)
            .await
            .map_err(|e| self.interaction_error("read attribute", e))
    }

    /// Shorthand for `attribute("value")`.
    pub async fn value(&self) -> Result<Option<String>> {
        self.attribute("value").await
    }

    /// Waits for the element to exist, then reads a computed CSS property.
    pub async fn css_value(&self, name: &str) -> Result<String> {
        let element = self.await_ready(exist(), "read css property").await?;
        self.session
            .driver()
            .css_value(&element, name)
            .await
            .map_err(|e| self.interaction_error("read css property", e))
    }

    /// Core wait: resolve, evaluate, retry until the condition holds.
    ///
    /// Returns the resolved reference, or `None` when a negated condition
    /// was satisfied by the element's absence.
    async fn wait_condition(
        &self,
        condition: Condition,
        timeout: Duration,
    ) -> Result<Option<ElementRef>> {
        let driver = Arc::clone(self.session.driver());
        let poll_interval = self.session.config().poll_interval;
        let source = Arc::clone(&self.source);

        let outcome = wait_for(timeout, poll_interval, || {
            let driver = Arc::clone(&driver);
            let source = Arc::clone(&source);
            let condition = condition.clone();
            async move {
                match source.resolve(driver.as_ref()).await {
                    Ok(element) => match condition.check(driver.as_ref(), &element).await {
                        Ok(true) => Ok(Attempt::Ready(Some(element))),
                        Ok(false) => {
                            let state = describe_element(driver.as_ref(), &element).await;
                            Ok(Attempt::Pending(state))
                        }
                        // The probe itself could not resolve the element:
                        // satisfied for negated conditions, "not yet" otherwise.
                        Err(e) if e.is_transient() => {
                            if condition.is_negated() {
                                Ok(Attempt::Ready(None))
                            } else {
                                Ok(Attempt::Pending(e.to_string()))
                            }
                        }
                        Err(e) => Err(e),
                    },
                    Err(e) if e.is_transient() => {
                        if condition.is_negated() {
                            Ok(Attempt::Ready(None))
                        } else {
                            Ok(Attempt::Pending(e.to_string()))
                        }
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await;

        match outcome {
            Ok(element) => Ok(element),
            Err(WaitError::Fatal(e)) => Err(Error::Session(e)),
            Err(WaitError::TimedOut { last, elapsed }) => {
                let last_state = last.unwrap_or_else(|| "element not found".to_string());
                let context = FailureContext {
                    locator: self.description(),
                    condition: condition.describe(),
                    last_state: last_state.clone(),
                    elapsed,
                };
                self.session.report_failure(&context).await;
                Err(Error::ConditionNotMet {
                    locator: context.locator,
                    condition: context.condition,
                    last_state,
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Waits for a positive condition and returns the resolved reference.
    async fn await_ready(
        &self,
        condition: Condition,
        action: &'static str,
    ) -> Result<ElementRef> {
        match self
            .wait_condition(condition, self.session.config().timeout)
            .await?
        {
            Some(element) => Ok(element),
            None => Err(Error::Interaction {
                action,
                locator: self.description(),
                source: DriverError::NotFound(self.description()),
            }),
        }
    }

    fn interaction_error(&self, action: &'static str, source: DriverError) -> Error {
        if source.is_transient() {
            Error::Interaction {
                action,
                locator: self.description(),
                source,
            }
        } else {
            Error::Session(source)
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("locator", &self.description())
            .finish()
    }
}
