// Collection - lazy, self-waiting handle over an ordered element sequence
//
// A Collection owns a base query (or a fixed list) plus view transforms that
// are re-applied on every resolution. Filters compose and always evaluate
// against the current page, never a snapshot taken at construction time.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use crate::conditions::{CollectionCondition, Condition};
use crate::driver::{DriverError, ElementRef, FailureContext};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::locator::{CollectionSource, ElementSource, describe_elements};
use crate::session::Session;
use crate::wait::{Attempt, WaitError, wait_for};

/// Lazy handle over the ordered sequence of elements a query matches.
///
/// Created via [`Session::elements`], [`Element::all`] or [`Session::wrap`].
#[derive(Clone)]
pub struct Collection {
    session: Session,
    source: Arc<CollectionSource>,
}

/// What the last poll saw, kept for failure reporting.
struct LastLook {
    count: usize,
    texts: Vec<String>,
    elements: Vec<ElementRef>,
}

impl Collection {
    pub(crate) fn new(session: Session, source: CollectionSource) -> Self {
        Self {
            session,
            source: Arc::new(source),
        }
    }

    /// Human-readable description of how this collection is located.
    pub fn description(&self) -> String {
        self.source.description()
    }

    /// Lazy view keeping only elements that satisfy `condition`.
    ///
    /// The filter re-evaluates on every resolution; chaining filters applies
    /// them in declaration order against the current page state.
    pub fn filtered_by(&self, condition: Condition) -> Collection {
        Collection::new(
            self.session.clone(),
            CollectionSource::Filtered {
                base: Arc::clone(&self.source),
                condition,
            },
        )
    }

    /// Lazy view sorted by element text (stable).
    pub fn sorted_by_text(&self) -> Collection {
        Collection::new(
            self.session.clone(),
            CollectionSource::SortedByText {
                base: Arc::clone(&self.source),
            },
        )
    }

    /// Lazy sub-range view.
    pub fn slice(&self, range: Range<usize>) -> Collection {
        Collection::new(
            self.session.clone(),
            CollectionSource::Slice {
                base: Arc::clone(&self.source),
                from: range.start,
                to: range.end,
            },
        )
    }

    /// Lazy handle for the Nth (0-based) element of this collection.
    pub fn get(&self, index: usize) -> Element {
        Element::new(
            self.session.clone(),
            ElementSource::NthOf {
                collection: Arc::clone(&self.source),
                index,
            },
        )
    }

    /// Lazy handle for the first element.
    pub fn first(&self) -> Element {
        self.get(0)
    }

    /// Waits until the condition holds, using the session's default timeout.
    pub async fn should_have(&self, condition: CollectionCondition) -> Result<&Self> {
        self.wait_collection(condition, self.session.config().timeout)
            .await?;
        Ok(self)
    }

    /// Waits until the condition holds, with an explicit timeout override.
    pub async fn wait_until(
        &self,
        condition: CollectionCondition,
        timeout: Duration,
    ) -> Result<&Self> {
        self.wait_collection(condition, timeout).await?;
        Ok(self)
    }

    /// Current element count; forces one resolution, no waiting.
    pub async fn count(&self) -> Result<usize> {
        let driver = self.session.driver();
        self.source
            .resolve(driver.as_ref())
            .await
            .map(|elements| elements.len())
            .map_err(|e| self.resolve_error("count", e))
    }

    /// Current element texts; forces one resolution, no waiting.
    pub async fn texts(&self) -> Result<Vec<String>> {
        let driver = self.session.driver();
        let elements = self
            .source
            .resolve(driver.as_ref())
            .await
            .map_err(|e| self.resolve_error("read texts", e))?;
        let mut texts = Vec::with_capacity(elements.len());
        for element in &elements {
            let text = driver
                .text(element)
                .await
                .map_err(|e| self.resolve_error("read texts", e))?;
            texts.push(text);
        }
        Ok(texts)
    }

    /// Resolves once and returns fixed (non-lazy) handles over the result.
    ///
    /// Use this for iteration; callers wanting freshness-with-retry should
    /// assert with [`Collection::should_have`] first.
    pub async fn snapshot(&self) -> Result<Vec<Element>> {
        let driver = self.session.driver();
        let elements = self
            .source
            .resolve(driver.as_ref())
            .await
            .map_err(|e| self.resolve_error("snapshot", e))?;
        let fixed = Arc::new(CollectionSource::Fixed(elements.clone()));
        Ok((0..elements.len())
            .map(|index| {
                Element::new(
                    self.session.clone(),
                    ElementSource::NthOf {
                        collection: Arc::clone(&fixed),
                        index,
                    },
                )
            })
            .collect())
    }

    async fn wait_collection(
        &self,
        condition: CollectionCondition,
        timeout: Duration,
    ) -> Result<()> {
        let driver = Arc::clone(self.session.driver());
        let poll_interval = self.session.config().poll_interval;
        let source = Arc::clone(&self.source);
        let wants_texts = condition.wants_texts();

        let outcome = wait_for(timeout, poll_interval, || {
            let driver = Arc::clone(&driver);
            let source = Arc::clone(&source);
            let condition = condition.clone();
            async move {
                let elements = source.resolve(driver.as_ref()).await?;
                let mut texts = Vec::new();
                if wants_texts {
                    for element in &elements {
                        texts.push(driver.text(element).await?.trim().to_string());
                    }
                }
                if condition.check(elements.len(), &texts) {
                    Ok(Attempt::Ready(()))
                } else {
                    Ok(Attempt::Pending(LastLook {
                        count: elements.len(),
                        texts,
                        elements,
                    }))
                }
            }
        })
        .await;

        match outcome {
            Ok(()) => Ok(()),
            Err(WaitError::Fatal(e)) => Err(Error::Session(e)),
            Err(WaitError::TimedOut { last, elapsed }) => {
                let look = last.unwrap_or(LastLook {
                    count: 0,
                    texts: Vec::new(),
                    elements: Vec::new(),
                });
                let context = FailureContext {
                    locator: self.description(),
                    condition: condition.describe(),
                    last_state: format!("size {}", look.count),
                    elapsed,
                };
                self.session.report_failure(&context).await;
                let timeout_ms = timeout.as_millis() as u64;
                match condition.expected_size() {
                    Some(expected) => {
                        let elements = describe_elements(driver.as_ref(), &look.elements).await;
                        Err(Error::ListSizeMismatch {
                            collection: self.description(),
                            expected,
                            actual: look.count,
                            timeout_ms,
                            elements,
                        })
                    }
                    None => Err(Error::TextsMismatch {
                        collection: self.description(),
                        expected: condition.expected_texts().unwrap_or_default().to_vec(),
                        actual: look.texts,
                        timeout_ms,
                    }),
                }
            }
        }
    }

    fn resolve_error(&self, action: &'static str, source: DriverError) -> Error {
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

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("locator", &self.description())
            .finish()
    }
}
