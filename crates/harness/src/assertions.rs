// Auto-retry assertions.
//
// expect() wraps a locator in an Expectation; every condition re-probes the
// page until it holds or the assertion timeout elapses. Probes tolerate
// transient resolution errors (mid-navigation races) and simply retry.

use std::time::Duration;

use regex::Regex;

use crate::error::{Error, Result};
use crate::locator::Locator;

/// Default timeout for assertions (5 seconds).
const DEFAULT_ASSERTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Default polling interval for assertions (100ms).
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Creates an expectation for a locator with auto-retry behavior.
///
/// ```no_run
/// # use uilab::{expect, BrowserSession, LabConfig};
/// # async fn demo() -> uilab::Result<()> {
/// # let session = BrowserSession::launch(&LabConfig::default()).await?;
/// let page = session.new_page("http://127.0.0.1:4200/").await?;
/// expect(page.locator("h1")).to_be_visible().await?;
/// expect(page.locator(".spinner")).not().to_be_visible().await?;
/// # Ok(())
/// # }
/// ```
pub fn expect(locator: Locator) -> Expectation {
    Expectation::new(locator)
}

/// Wraps a locator and provides assertion methods with auto-retry.
pub struct Expectation {
    locator: Locator,
    timeout: Duration,
    poll_interval: Duration,
    negate: bool,
}

impl Expectation {
    pub(crate) fn new(locator: Locator) -> Self {
        Self {
            locator,
            timeout: DEFAULT_ASSERTION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            negate: false,
        }
    }

    /// Sets a custom timeout for this assertion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets a custom poll interval. Default is 100ms.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Negates the assertion.
    ///
    /// A method rather than `std::ops::Not` so call sites read as a chain.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        self.negate = true;
        self
    }

    /// Asserts that the first matching element is visible.
    pub async fn to_be_visible(self) -> Result<()> {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();

        loop {
            let visible = self.locator.peek_visible().await;
            let holds = if self.negate { !visible } else { visible };
            if holds {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to be visible, but it still was after {:?}",
                        subject, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to be visible, but it was not after {:?}",
                        subject, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Asserts that the element is hidden (not visible, or absent).
    pub async fn to_be_hidden(self) -> Result<()> {
        // Hidden is visible negated; flip so double negation still works.
        let flipped = Expectation {
            negate: !self.negate,
            ..self
        };
        flipped.to_be_visible().await
    }

    /// Asserts the checked state of a checkbox or radio.
    pub async fn to_be_checked(self) -> Result<()> {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();

        loop {
            let checked = self.locator.peek_checked().await.unwrap_or(false);
            let holds = if self.negate { !checked } else { checked };
            if holds {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to be checked, but it still was after {:?}",
                        subject, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to be checked, but it was not after {:?}",
                        subject, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Asserts how many elements the locator matches.
    pub async fn to_have_count(self, expected: usize) -> Result<()> {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();

        loop {
            let actual = self.locator.peek_count().await;
            let holds = if self.negate {
                actual != expected
            } else {
                actual == expected
            };
            if holds {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to match {} elements, but it did after {:?}",
                        subject, expected, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to match {} elements, found {} after {:?}",
                        subject, expected, actual, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Asserts the element's trimmed rendered text equals `expected`.
    pub async fn to_have_text(self, expected: &str) -> Result<()> {
        self.text_condition(
            "have text",
            expected.to_string(),
            move |text, wanted| text.trim() == wanted,
        )
        .await
    }

    /// Asserts the element's rendered text contains `expected`.
    pub async fn to_contain_text(self, expected: &str) -> Result<()> {
        self.text_condition(
            "contain text",
            expected.to_string(),
            move |text, wanted| text.contains(wanted),
        )
        .await
    }

    /// Asserts the element's trimmed text matches the regex `pattern`.
    pub async fn to_have_text_regex(self, pattern: &str) -> Result<()> {
        let regex = compile(pattern)?;
        self.text_condition("match text", pattern.to_string(), move |text, _| {
            regex.is_match(text.trim())
        })
        .await
    }

    /// Asserts the element's rendered text has a match for `pattern`.
    pub async fn to_contain_text_regex(self, pattern: &str) -> Result<()> {
        let regex = compile(pattern)?;
        self.text_condition("contain a match for", pattern.to_string(), move |text, _| {
            regex.is_match(text)
        })
        .await
    }

    /// Asserts the input's current value equals `expected`.
    pub async fn to_have_value(self, expected: &str) -> Result<()> {
        self.value_condition("have value", expected.to_string(), move |value, wanted| {
            value == wanted
        })
        .await
    }

    /// Asserts the input's current value matches the regex `pattern`.
    pub async fn to_have_value_regex(self, pattern: &str) -> Result<()> {
        let regex = compile(pattern)?;
        self.value_condition("match value", pattern.to_string(), move |value, _| {
            regex.is_match(value)
        })
        .await
    }

    /// Asserts an attribute is present with exactly `expected` as its value.
    pub async fn to_have_attribute(self, name: &str, expected: &str) -> Result<()> {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();

        loop {
            let attribute = self.locator.peek_attribute(name).await.flatten();
            let holds_positive = attribute.as_deref() == Some(expected);
            let holds = if self.negate {
                !holds_positive
            } else {
                holds_positive
            };
            if holds {
                return Ok(());
            }
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to have {}=\"{}\", but it still did after {:?}",
                        subject, name, expected, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to have {}=\"{}\", got {:?} after {:?}",
                        subject, name, expected, attribute, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn text_condition<F>(self, verb: &str, wanted: String, holds_for: F) -> Result<()>
    where
        F: Fn(&str, &str) -> bool,
    {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();
        let mut last: Option<String> = None;

        loop {
            let text = self.locator.peek_text().await;
            let holds_positive = text.as_deref().is_some_and(|t| holds_for(t, &wanted));
            let holds = if self.negate {
                !holds_positive
            } else {
                holds_positive
            };
            if holds {
                return Ok(());
            }
            last = text;
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to {} '{}', but it still did after {:?}",
                        subject, verb, wanted, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to {} '{}', got {:?} after {:?}",
                        subject, verb, wanted, last, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn value_condition<F>(self, verb: &str, wanted: String, holds_for: F) -> Result<()>
    where
        F: Fn(&str, &str) -> bool,
    {
        let start = std::time::Instant::now();
        let subject = self.locator.describe();
        let mut last: Option<String> = None;

        loop {
            let value = self.locator.peek_value().await;
            let holds_positive = value.as_deref().is_some_and(|v| holds_for(v, &wanted));
            let holds = if self.negate {
                !holds_positive
            } else {
                holds_positive
            };
            if holds {
                return Ok(());
            }
            last = value;
            if start.elapsed() >= self.timeout {
                let message = if self.negate {
                    format!(
                        "expected '{}' NOT to {} '{}', but it still did after {:?}",
                        subject, verb, wanted, self.timeout
                    )
                } else {
                    format!(
                        "expected '{}' to {} '{}', got {:?} after {:?}",
                        subject, verb, wanted, last, self.timeout
                    )
                };
                return Err(Error::Assertion(message));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Pattern {
        pattern: pattern.into(),
        reason: e.to_string(),
    })
}
