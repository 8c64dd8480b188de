// Locators - declarative descriptions of how to find elements
//
// A locator identifies *how* to find an element, never a found node.
// Resolution happens on demand against the live session: parent scopes are
// re-resolved on every call, so nothing observed here can go stale across
// operations.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::conditions::Condition;
use crate::driver::{Driver, DriverError, DriverResult, ElementRef};

/// How elements are selected: a CSS selector or an XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        Selector::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Selector::XPath(value.into())
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Selector::css(value)
    }
}

impl From<String> for Selector {
    fn from(value: String) -> Self {
        Selector::Css(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(value) => write!(f, "{value}"),
            Selector::XPath(value) => write!(f, "xpath={value}"),
        }
    }
}

/// Selector + optional parent scope + 0-based index among the matches.
#[derive(Debug, Clone)]
pub(crate) struct Locator {
    pub(crate) selector: Selector,
    pub(crate) parent: Option<Arc<ElementSource>>,
    pub(crate) index: usize,
}

/// How a single element handle finds its target.
#[derive(Debug, Clone)]
pub(crate) enum ElementSource {
    ByLocator(Locator),
    /// The Nth element of a lazily resolved collection.
    NthOf {
        collection: Arc<CollectionSource>,
        index: usize,
    },
}

/// How a collection handle finds its targets: a base query or fixed list,
/// plus lazily applied view transforms. Transforms are pure and preserve
/// driver order, except the explicit sort.
#[derive(Debug, Clone)]
pub(crate) enum CollectionSource {
    BySelector {
        selector: Selector,
        parent: Option<Arc<ElementSource>>,
    },
    Fixed(Vec<ElementRef>),
    Filtered {
        base: Arc<CollectionSource>,
        condition: Condition,
    },
    SortedByText {
        base: Arc<CollectionSource>,
    },
    Slice {
        base: Arc<CollectionSource>,
        from: usize,
        to: usize,
    },
}

type Resolving<'a, T> = Pin<Box<dyn Future<Output = DriverResult<T>> + Send + 'a>>;

impl ElementSource {
    /// Resolves to one transient element reference.
    ///
    /// The whole chain is walked on every call; fewer matches than `index + 1`
    /// is a retryable not-found.
    pub(crate) fn resolve<'a>(&'a self, driver: &'a dyn Driver) -> Resolving<'a, ElementRef> {
        Box::pin(async move {
            match self {
                ElementSource::ByLocator(locator) => {
                    let matches = match &locator.parent {
                        Some(parent) => {
                            let scope = parent.resolve(driver).await?;
                            driver.query(Some(&scope), &locator.selector).await?
                        }
                        None => driver.query(None, &locator.selector).await?,
                    };
                    matches
                        .into_iter()
                        .nth(locator.index)
                        .ok_or_else(|| DriverError::NotFound(self.description()))
                }
                ElementSource::NthOf { collection, index } => {
                    let elements = collection.resolve(driver).await?;
                    elements
                        .into_iter()
                        .nth(*index)
                        .ok_or_else(|| DriverError::NotFound(self.description()))
                }
            }
        })
    }

    pub(crate) fn description(&self) -> String {
        match self {
            ElementSource::ByLocator(locator) => {
                let base = match &locator.parent {
                    Some(parent) => format!("{} {}", parent.description(), locator.selector),
                    None => locator.selector.to_string(),
                };
                if locator.index > 0 {
                    format!("{base}[{}]", locator.index)
                } else {
                    base
                }
            }
            ElementSource::NthOf { collection, index } => {
                format!("{}[{index}]", collection.description())
            }
        }
    }
}

impl CollectionSource {
    /// Resolves to the current ordered element list.
    ///
    /// The base is re-queried and every transform re-applied on each call;
    /// nothing is memoized between resolutions.
    pub(crate) fn resolve<'a>(&'a self, driver: &'a dyn Driver) -> Resolving<'a, Vec<ElementRef>> {
        Box::pin(async move {
            match self {
                CollectionSource::BySelector { selector, parent } => match parent {
                    Some(parent) => {
                        let scope = parent.resolve(driver).await?;
                        driver.query(Some(&scope), selector).await
                    }
                    None => driver.query(None, selector).await,
                },
                CollectionSource::Fixed(elements) => Ok(elements.clone()),
                CollectionSource::Filtered { base, condition } => {
                    let elements = base.resolve(driver).await?;
                    let mut kept = Vec::with_capacity(elements.len());
                    for element in elements {
                        if condition.check(driver, &element).await? {
                            kept.push(element);
                        }
                    }
                    Ok(kept)
                }
                CollectionSource::SortedByText { base } => {
                    let elements = base.resolve(driver).await?;
                    let mut keyed = Vec::with_capacity(elements.len());
                    for element in elements {
                        let text = driver.text(&element).await?;
                        keyed.push((text, element));
                    }
                    keyed.sort_by(|a, b| a.0.cmp(&b.0));
                    Ok(keyed.into_iter().map(|(_, element)| element).collect())
                }
                CollectionSource::Slice { base, from, to } => {
                    let elements = base.resolve(driver).await?;
                    let end = (*to).min(elements.len());
                    let start = (*from).min(end);
                    Ok(elements[start..end].to_vec())
                }
            }
        })
    }

    pub(crate) fn description(&self) -> String {
        match self {
            CollectionSource::BySelector { selector, parent } => match parent {
                Some(parent) => format!("{} {selector}", parent.description()),
                None => selector.to_string(),
            },
            CollectionSource::Fixed(elements) => format!("$$({} elements)", elements.len()),
            CollectionSource::Filtered { base, condition } => {
                format!("{}.filtered_by({condition})", base.description())
            }
            CollectionSource::SortedByText { base } => {
                format!("{}.sorted_by_text()", base.description())
            }
            CollectionSource::Slice { base, from, to } => {
                format!("{}[{from}..{to}]", base.description())
            }
        }
    }
}

/// Best-effort one-line render of an element for failure messages.
pub(crate) async fn describe_element(driver: &dyn Driver, element: &ElementRef) -> String {
    let tag = match driver.tag_name(element).await {
        Ok(tag) => tag,
        Err(e) => return format!("<unreadable element: {e}>"),
    };
    let mut attributes = String::new();
    for name in ["id", "class", "name", "value"] {
        if let Ok(Some(value)) = driver.attribute(element, name).await {
            attributes.push_str(&format!(" {name}=\"{value}\""));
        }
    }
    let text = driver.text(element).await.unwrap_or_default();
    format!("<{tag}{attributes}>{text}</{tag}>")
}

/// Renders a whole element list, one entry per element.
pub(crate) async fn describe_elements(driver: &dyn Driver, elements: &[ElementRef]) -> String {
    let mut rendered = Vec::with_capacity(elements.len());
    for element in elements {
        rendered.push(describe_element(driver, element).await);
    }
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::visible;

    fn by_css(selector: &str, parent: Option<Arc<ElementSource>>, index: usize) -> ElementSource {
        ElementSource::ByLocator(Locator {
            selector: Selector::css(selector),
            parent,
            index,
        })
    }

    #[test]
    fn element_descriptions_follow_the_chain() {
        let root = by_css("#list", None, 0);
        let child = by_css("li", Some(Arc::new(root)), 2);
        assert_eq!(child.description(), "#list li[2]");
    }

    #[test]
    fn xpath_selectors_are_marked() {
        let xpath = ElementSource::ByLocator(Locator {
            selector: Selector::xpath("//div[@id='x']"),
            parent: None,
            index: 0,
        });
        assert_eq!(xpath.description(), "xpath=//div[@id='x']");
    }

    #[test]
    fn collection_descriptions_include_transforms() {
        let base = Arc::new(CollectionSource::BySelector {
            selector: Selector::css("ul li"),
            parent: None,
        });
        let filtered = CollectionSource::Filtered {
            base,
            condition: visible(),
        };
        assert_eq!(filtered.description(), "ul li.filtered_by(be visible)");

        let sliced = CollectionSource::Slice {
            base: Arc::new(filtered),
            from: 1,
            to: 3,
        };
        assert_eq!(
            sliced.description(),
            "ul li.filtered_by(be visible)[1..3]"
        );
    }

    #[test]
    fn nth_of_collection_description() {
        let base = Arc::new(CollectionSource::BySelector {
            selector: Selector::css(".row"),
            parent: None,
        });
        let nth = ElementSource::NthOf {
            collection: base,
            index: 4,
        };
        assert_eq!(nth.description(), ".row[4]");
    }
}
