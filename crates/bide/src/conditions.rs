// Conditions - named, composable predicates over observed element state
//
// Conditions are stateless and cloneable; the same condition value can back
// many assertions. Every condition can be used positively or negated, and
// describes itself for failure messages ("be visible", "have text \"x\"").

use std::fmt;

use regex::Regex;

use crate::driver::{Driver, DriverResult, ElementRef};

/// A named predicate over an element's observable state.
///
/// Built through the factory functions in this module:
///
/// ```ignore
/// use bide::conditions::{exact_text, not, visible};
///
/// session.element("#save").should_be(visible()).await?;
/// session.element("#status").should_have(exact_text("Saved")).await?;
/// session.element("#spinner").should(not(visible())).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Condition {
    test: Test,
    negated: bool,
}

#[derive(Debug, Clone)]
enum Test {
    Exist,
    Visible,
    Enabled,
    Text(String),
    ExactText(String),
    MatchText(Regex),
    Value(String),
    Attribute(String),
    AttributeValue(String, String),
    CssClass(String),
    CssValue(String, String),
}

impl Condition {
    fn positive(test: Test) -> Self {
        Self {
            test,
            negated: false,
        }
    }

    /// Inverts the condition. Double negation restores the original.
    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub(crate) fn is_negated(&self) -> bool {
        self.negated
    }

    /// Evaluates one probe against the live element, negation applied.
    pub(crate) async fn check(
        &self,
        driver: &dyn Driver,
        element: &ElementRef,
    ) -> DriverResult<bool> {
        let holds = self.test.check(driver, element).await?;
        Ok(holds != self.negated)
    }

    /// Verb-phrase description, e.g. `have text "Saved"` or `not be visible`.
    pub(crate) fn describe(&self) -> String {
        if self.negated {
            format!("not {}", self.test.describe())
        } else {
            self.test.describe()
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl Test {
    async fn check(&self, driver: &dyn Driver, element: &ElementRef) -> DriverResult<bool> {
        match self {
            Test::Exist => Ok(!driver.is_stale(element).await?),
            Test::Visible => driver.is_displayed(element).await,
            Test::Enabled => driver.is_enabled(element).await,
            Test::Text(expected) => {
                let text = driver.text(element).await?;
                Ok(text.trim().contains(expected.as_str()))
            }
            Test::ExactText(expected) => {
                let text = driver.text(element).await?;
                Ok(text.trim() == expected.trim())
            }
            Test::MatchText(pattern) => {
                let text = driver.text(element).await?;
                Ok(pattern.is_match(text.trim()))
            }
            Test::Value(expected) => {
                let value = driver.attribute(element, "value").await?;
                Ok(value.as_deref() == Some(expected.as_str()))
            }
            Test::Attribute(name) => Ok(driver.attribute(element, name).await?.is_some()),
            Test::AttributeValue(name, expected) => {
                let value = driver.attribute(element, name).await?;
                Ok(value.as_deref() == Some(expected.as_str()))
            }
            Test::CssClass(class) => {
                let classes = driver.attribute(element, "class").await?;
                Ok(classes
                    .is_some_and(|all| all.split_whitespace().any(|c| c == class)))
            }
            Test::CssValue(name, expected) => {
                Ok(driver.css_value(element, name).await? == *expected)
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Test::Exist => "exist".to_string(),
            Test::Visible => "be visible".to_string(),
            Test::Enabled => "be enabled".to_string(),
            Test::Text(expected) => format!("have text {expected:?}"),
            Test::ExactText(expected) => format!("have exact text {expected:?}"),
            Test::MatchText(pattern) => format!("match text /{pattern}/"),
            Test::Value(expected) => format!("have value {expected:?}"),
            Test::Attribute(name) => format!("have attribute {name:?}"),
            Test::AttributeValue(name, expected) => {
                format!("have attribute {name:?} = {expected:?}")
            }
            Test::CssClass(class) => format!("have css class {class:?}"),
            Test::CssValue(name, expected) => {
                format!("have css property {name:?} = {expected:?}")
            }
        }
    }
}

/// The element is attached to the page.
pub fn exist() -> Condition {
    Condition::positive(Test::Exist)
}

/// The element is displayed.
pub fn visible() -> Condition {
    Condition::positive(Test::Visible)
}

/// The element is not displayed (or absent, when awaited negatively).
pub fn hidden() -> Condition {
    visible().negate()
}

/// The element is enabled.
pub fn enabled() -> Condition {
    Condition::positive(Test::Enabled)
}

/// The element is disabled.
pub fn disabled() -> Condition {
    enabled().negate()
}

/// The element's trimmed text contains `expected` (case-sensitive).
pub fn text(expected: impl Into<String>) -> Condition {
    Condition::positive(Test::Text(expected.into()))
}

/// The element's trimmed text equals `expected` trimmed.
pub fn exact_text(expected: impl Into<String>) -> Condition {
    Condition::positive(Test::ExactText(expected.into()))
}

/// The element's trimmed text matches `pattern`.
pub fn match_text(pattern: Regex) -> Condition {
    Condition::positive(Test::MatchText(pattern))
}

/// The element's `value` attribute equals `expected`.
pub fn value(expected: impl Into<String>) -> Condition {
    Condition::positive(Test::Value(expected.into()))
}

/// The attribute is present, with any value.
pub fn attribute(name: impl Into<String>) -> Condition {
    Condition::positive(Test::Attribute(name.into()))
}

/// The attribute is present with exactly `expected`.
pub fn attribute_value(name: impl Into<String>, expected: impl Into<String>) -> Condition {
    Condition::positive(Test::AttributeValue(name.into(), expected.into()))
}

/// The `class` attribute contains `class` as one of its tokens.
pub fn css_class(class: impl Into<String>) -> Condition {
    Condition::positive(Test::CssClass(class.into()))
}

/// The computed CSS property `name` equals `expected`.
pub fn css_value(name: impl Into<String>, expected: impl Into<String>) -> Condition {
    Condition::positive(Test::CssValue(name.into(), expected.into()))
}

/// Negates any condition; `should(not(visible()))` reads like prose.
pub fn not(condition: Condition) -> Condition {
    condition.negate()
}

/// A named predicate over a resolved element sequence.
#[derive(Debug, Clone)]
pub struct CollectionCondition {
    test: CollectionTest,
}

#[derive(Debug, Clone)]
enum CollectionTest {
    Size(usize),
    SizeGreaterThan(usize),
    SizeGreaterThanOrEqual(usize),
    SizeLessThan(usize),
    Empty,
    Texts(Vec<String>),
    ExactTexts(Vec<String>),
}

impl CollectionCondition {
    /// Whether evaluation needs the elements' texts, not just the count.
    pub(crate) fn wants_texts(&self) -> bool {
        matches!(
            self.test,
            CollectionTest::Texts(_) | CollectionTest::ExactTexts(_)
        )
    }

    pub(crate) fn check(&self, count: usize, texts: &[String]) -> bool {
        match &self.test {
            CollectionTest::Size(expected) => count == *expected,
            CollectionTest::SizeGreaterThan(expected) => count > *expected,
            CollectionTest::SizeGreaterThanOrEqual(expected) => count >= *expected,
            CollectionTest::SizeLessThan(expected) => count < *expected,
            CollectionTest::Empty => count == 0,
            CollectionTest::Texts(expected) => {
                count == expected.len()
                    && texts
                        .iter()
                        .zip(expected)
                        .all(|(actual, wanted)| actual.contains(wanted.as_str()))
            }
            CollectionTest::ExactTexts(expected) => {
                count == expected.len()
                    && texts
                        .iter()
                        .zip(expected)
                        .all(|(actual, wanted)| actual.trim() == wanted.trim())
            }
        }
    }

    /// Expected-size rendering for size-mismatch failures; `None` for text
    /// conditions.
    pub(crate) fn expected_size(&self) -> Option<String> {
        match &self.test {
            CollectionTest::Size(expected) => Some(expected.to_string()),
            CollectionTest::SizeGreaterThan(expected) => Some(format!("> {expected}")),
            CollectionTest::SizeGreaterThanOrEqual(expected) => Some(format!(">= {expected}")),
            CollectionTest::SizeLessThan(expected) => Some(format!("< {expected}")),
            CollectionTest::Empty => Some("0".to_string()),
            CollectionTest::Texts(_) | CollectionTest::ExactTexts(_) => None,
        }
    }

    pub(crate) fn expected_texts(&self) -> Option<&[String]> {
        match &self.test {
            CollectionTest::Texts(expected) | CollectionTest::ExactTexts(expected) => {
                Some(expected)
            }
            _ => None,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match &self.test {
            CollectionTest::Size(expected) => format!("have size {expected}"),
            CollectionTest::SizeGreaterThan(expected) => format!("have size > {expected}"),
            CollectionTest::SizeGreaterThanOrEqual(expected) => {
                format!("have size >= {expected}")
            }
            CollectionTest::SizeLessThan(expected) => format!("have size < {expected}"),
            CollectionTest::Empty => "be empty".to_string(),
            CollectionTest::Texts(expected) => format!("have texts {expected:?}"),
            CollectionTest::ExactTexts(expected) => format!("have exact texts {expected:?}"),
        }
    }
}

impl fmt::Display for CollectionCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Exactly `expected` elements.
pub fn size(expected: usize) -> CollectionCondition {
    CollectionCondition {
        test: CollectionTest::Size(expected),
    }
}

pub fn size_greater_than(expected: usize) -> CollectionCondition {
    CollectionCondition {
        test: CollectionTest::SizeGreaterThan(expected),
    }
}

pub fn size_greater_than_or_equal(expected: usize) -> CollectionCondition {
    CollectionCondition {
        test: CollectionTest::SizeGreaterThanOrEqual(expected),
    }
}

pub fn size_less_than(expected: usize) -> CollectionCondition {
    CollectionCondition {
        test: CollectionTest::SizeLessThan(expected),
    }
}

/// No elements at all.
pub fn empty() -> CollectionCondition {
    CollectionCondition {
        test: CollectionTest::Empty,
    }
}

/// Element texts contain the given substrings, in order, same length.
pub fn texts<I, S>(expected: I) -> CollectionCondition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CollectionCondition {
        test: CollectionTest::Texts(expected.into_iter().map(Into::into).collect()),
    }
}

/// Element texts equal the given strings (trimmed), in order, same length.
pub fn exact_texts<I, S>(expected: I) -> CollectionCondition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CollectionCondition {
        test: CollectionTest::ExactTexts(expected.into_iter().map(Into::into).collect()),
    }
}
