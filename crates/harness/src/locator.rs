// Deferred element references.
//
// A locator records how to find its elements (CSS steps, text filters,
// index picks) and resolves freshly on every action or query, polling until
// a match exists or the timeout elapses. Resolution delegates to the
// browser's own query primitives; there is no selector engine here.

use std::path::Path;
use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::DEFAULT_TIMEOUT_MS;
use crate::error::{Error, Result};
use crate::page::Page;

const RESOLVE_POLL: Duration = Duration::from_millis(100);

const VISIBLE_FN: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    const style = getComputedStyle(this); \
    return rect.width > 0 && rect.height > 0 \
        && style.visibility !== 'hidden' && style.display !== 'none'; \
}";

const FIRE_EVENTS: &str = "this.dispatchEvent(new Event('input', { bubbles: true })); \
this.dispatchEvent(new Event('change', { bubbles: true }));";

#[derive(Debug, Clone)]
enum Step {
    Css(String),
    Text { needle: String, exact: bool },
    Nth(usize),
    Last,
}

/// Which `<select>` option to pick.
#[derive(Debug, Clone)]
pub enum SelectOption {
    /// Match on the option's `value` attribute.
    Value(String),
    /// Match on the option's visible label.
    Label(String),
    /// Pick by position.
    Index(usize),
}

/// A deferred reference to a DOM element (or set of elements).
#[derive(Clone)]
pub struct Locator {
    page: Page,
    steps: Vec<Step>,
    timeout: Duration,
}

impl Locator {
    pub(crate) fn new(page: Page, selector: String) -> Self {
        Self {
            page,
            steps: vec![Step::Css(selector)],
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Narrows to descendants matching `selector`.
    pub fn locator(&self, selector: impl Into<String>) -> Self {
        self.with_step(Step::Css(selector.into()))
    }

    /// Keeps only elements whose rendered text contains `needle`.
    pub fn filter_text(&self, needle: impl Into<String>) -> Self {
        self.with_step(Step::Text {
            needle: needle.into(),
            exact: false,
        })
    }

    /// Keeps only elements whose trimmed rendered text equals `needle`.
    ///
    /// The exact variant matters wherever substrings collide, e.g. calendar
    /// day "1" versus "10".
    pub fn filter_text_exact(&self, needle: impl Into<String>) -> Self {
        self.with_step(Step::Text {
            needle: needle.into(),
            exact: true,
        })
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn last(&self) -> Self {
        self.with_step(Step::Last)
    }

    pub fn nth(&self, index: usize) -> Self {
        self.with_step(Step::Nth(index))
    }

    /// Overrides the resolution timeout for this locator.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn with_step(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            page: self.page.clone(),
            steps,
            timeout: self.timeout,
        }
    }

    pub(crate) fn describe(&self) -> String {
        let parts: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Css(css) => css.clone(),
                Step::Text { needle, exact: true } => format!("text(={needle})"),
                Step::Text { needle, exact: false } => format!("text(~{needle})"),
                Step::Nth(n) => format!("nth({n})"),
                Step::Last => "last".into(),
            })
            .collect();
        parts.join(" >> ")
    }

    // ---- resolution ----

    async fn resolve_all(&self) -> Result<Vec<Element>> {
        let mut current: Option<Vec<Element>> = None;
        for step in &self.steps {
            let next = match (step, current.take()) {
                (Step::Css(css), None) => self.page.inner.find_elements(css.clone()).await?,
                (Step::Css(css), Some(scope)) => {
                    let mut out = Vec::new();
                    for element in &scope {
                        out.extend(element.find_elements(css.clone()).await?);
                    }
                    out
                }
                (Step::Text { needle, exact }, scope) => {
                    let mut out = Vec::new();
                    for element in scope.unwrap_or_default() {
                        let text = element.inner_text().await?.unwrap_or_default();
                        let hit = if *exact {
                            text.trim() == needle
                        } else {
                            text.contains(needle.as_str())
                        };
                        if hit {
                            out.push(element);
                        }
                    }
                    out
                }
                (Step::Nth(n), scope) => scope
                    .unwrap_or_default()
                    .into_iter()
                    .skip(*n)
                    .take(1)
                    .collect(),
                (Step::Last, scope) => {
                    let mut all = scope.unwrap_or_default();
                    match all.pop() {
                        Some(element) => vec![element],
                        None => Vec::new(),
                    }
                }
            };
            if next.is_empty() {
                return Ok(Vec::new());
            }
            current = Some(next);
        }
        Ok(current.unwrap_or_default())
    }

    /// Polls resolution until one element matches or the timeout elapses.
    async fn resolve_one(&self) -> Result<Element> {
        let start = Instant::now();
        loop {
            let mut matches = self.resolve_all().await?;
            if !matches.is_empty() {
                return Ok(matches.remove(0));
            }
            if start.elapsed() >= self.timeout {
                return Err(Error::WaitTimeout {
                    subject: format!("element '{}'", self.describe()),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(RESOLVE_POLL).await;
        }
    }

    async fn eval_on<T: DeserializeOwned>(&self, element: &Element, function: &str) -> Result<T> {
        let returns = element.call_js_fn(function, false).await?;
        if let Some(exception) = returns.exception_details {
            return Err(Error::Script(exception.text));
        }
        let value = returns.result.value.unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    // ---- actions ----

    /// Clicks the element through real input events.
    pub async fn click(&self) -> Result<()> {
        let element = self.resolve_one().await?;
        element.click().await?;
        Ok(())
    }

    /// Clicks via the DOM, bypassing hit-testing entirely.
    pub async fn force_click(&self) -> Result<()> {
        let element = self.resolve_one().await?;
        self.eval_on::<()>(&element, "function() { this.click(); }")
            .await
    }

    /// Sets the field's value directly and fires input/change.
    pub async fn fill(&self, value: &str) -> Result<()> {
        let element = self.resolve_one().await?;
        let literal = serde_json::to_string(value)?;
        let function = format!(
            "function() {{ this.focus(); this.value = {literal}; {FIRE_EVENTS} }}"
        );
        self.eval_on::<()>(&element, &function).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.fill("").await
    }

    /// Types character by character with real key events, pausing `delay`
    /// between keystrokes.
    pub async fn press_sequentially(&self, text: &str, delay: Duration) -> Result<()> {
        let element = self.resolve_one().await?;
        element.focus().await?;
        for ch in text.chars() {
            element.type_str(ch.to_string()).await?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Presses a single named key, e.g. `Enter` or `Tab`.
    pub async fn press(&self, key: &str) -> Result<()> {
        let element = self.resolve_one().await?;
        element.press_key(key).await?;
        Ok(())
    }

    pub async fn check(&self) -> Result<()> {
        self.set_checked(true).await
    }

    pub async fn uncheck(&self) -> Result<()> {
        self.set_checked(false).await
    }

    /// Clicks only when the checked state differs from `desired`.
    pub async fn set_checked(&self, desired: bool) -> Result<()> {
        let element = self.resolve_one().await?;
        let current: bool = self
            .eval_on(&element, "function() { return !!this.checked; }")
            .await?;
        if current != desired {
            element.click().await?;
        }
        Ok(())
    }

    pub async fn force_check(&self) -> Result<()> {
        self.force_set_checked(true).await
    }

    pub async fn force_uncheck(&self) -> Result<()> {
        self.force_set_checked(false).await
    }

    async fn force_set_checked(&self, desired: bool) -> Result<()> {
        let element = self.resolve_one().await?;
        let function =
            format!("function() {{ if (!!this.checked !== {desired}) this.click(); }}");
        self.eval_on::<()>(&element, &function).await
    }

    /// Picks an option of a native `<select>` and fires input/change.
    pub async fn select_option(&self, option: SelectOption) -> Result<()> {
        let element = self.resolve_one().await?;
        let function = match &option {
            SelectOption::Value(value) => {
                let literal = serde_json::to_string(value)?;
                format!(
                    "function() {{ \
                     const opt = Array.from(this.options).find(o => o.value === {literal}); \
                     if (!opt) return false; \
                     this.value = opt.value; {FIRE_EVENTS} return true; }}"
                )
            }
            SelectOption::Label(label) => {
                let literal = serde_json::to_string(label)?;
                format!(
                    "function() {{ \
                     const opt = Array.from(this.options).find(o => o.textContent.trim() === {literal}); \
                     if (!opt) return false; \
                     this.value = opt.value; {FIRE_EVENTS} return true; }}"
                )
            }
            SelectOption::Index(index) => format!(
                "function() {{ \
                 if (this.options.length <= {index}) return false; \
                 this.selectedIndex = {index}; {FIRE_EVENTS} return true; }}"
            ),
        };
        let selected: bool = self.eval_on(&element, &function).await?;
        if !selected {
            return Err(Error::Assertion(format!(
                "no option {:?} in '{}'",
                option,
                self.describe()
            )));
        }
        Ok(())
    }

    /// Moves the mouse to the element's center.
    pub async fn hover(&self) -> Result<()> {
        let element = self.resolve_one().await?;
        let point = element.clickable_point().await?;
        self.page.mouse_move(point.x, point.y, false).await
    }

    pub async fn scroll_into_view(&self) -> Result<()> {
        let element = self.resolve_one().await?;
        element.scroll_into_view().await?;
        Ok(())
    }

    /// Presses on this element and releases over `target`.
    pub async fn drag_to(&self, target: &Locator) -> Result<()> {
        let from = self.resolve_one().await?.clickable_point().await?;
        let to = target.resolve_one().await?.clickable_point().await?;
        self.drag(from.x, from.y, to.x, to.y).await
    }

    /// Presses on this element and releases `dx`/`dy` pixels away.
    pub async fn drag_by(&self, dx: f64, dy: f64) -> Result<()> {
        let from = self.resolve_one().await?.clickable_point().await?;
        self.drag(from.x, from.y, from.x + dx, from.y + dy).await
    }

    async fn drag(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Result<()> {
        const STEPS: i32 = 6;
        self.page.mouse_move(x0, y0, false).await?;
        self.page.mouse_press(x0, y0).await?;
        for i in 1..=STEPS {
            let t = f64::from(i) / f64::from(STEPS);
            let x = x0 + (x1 - x0) * t;
            let y = y0 + (y1 - y0) * t;
            self.page.mouse_move(x, y, true).await?;
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        self.page.mouse_release(x1, y1).await?;
        Ok(())
    }

    /// Writes a PNG of just this element to `path`, creating parent
    /// directories. The element is scrolled into view first so the capture
    /// covers its full box.
    pub async fn screenshot_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let element = self.resolve_one().await?;
        element.scroll_into_view().await?;
        let bytes = element.screenshot(CaptureScreenshotFormat::Png).await?;
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, bytes)?;
        Ok(())
    }

    // ---- queries ----

    /// Number of matching elements right now; does not wait.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.resolve_all().await?.len())
    }

    /// One locator per currently matching element.
    pub async fn all(&self) -> Result<Vec<Locator>> {
        let n = self.count().await?;
        Ok((0..n).map(|i| self.nth(i)).collect())
    }

    pub async fn text_content(&self) -> Result<Option<String>> {
        let element = self.resolve_one().await?;
        self.eval_on(&element, "function() { return this.textContent; }")
            .await
    }

    /// Rendered text of the first match.
    pub async fn inner_text(&self) -> Result<String> {
        let element = self.resolve_one().await?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    pub async fn input_value(&self) -> Result<String> {
        let element = self.resolve_one().await?;
        self.eval_on(&element, "function() { return this.value ?? ''; }")
            .await
    }

    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let element = self.resolve_one().await?;
        Ok(element.attribute(name).await?)
    }

    /// Computed CSS value, e.g. `background-color` as `rgb(r, g, b)`.
    pub async fn css_value(&self, property: &str) -> Result<String> {
        let element = self.resolve_one().await?;
        let literal = serde_json::to_string(property)?;
        self.eval_on(
            &element,
            &format!("function() {{ return getComputedStyle(this).getPropertyValue({literal}); }}"),
        )
        .await
    }

    pub async fn is_checked(&self) -> Result<bool> {
        let element = self.resolve_one().await?;
        self.eval_on(&element, "function() { return !!this.checked; }")
            .await
    }

    /// Visibility right now; zero matches reads as not visible, no waiting.
    pub async fn is_visible(&self) -> Result<bool> {
        let matches = self.resolve_all().await?;
        match matches.first() {
            Some(element) => self.eval_on(element, VISIBLE_FN).await,
            None => Ok(false),
        }
    }

    // ---- error-tolerant snapshots used by the assertion poll loops ----

    pub(crate) async fn peek_count(&self) -> usize {
        self.resolve_all().await.map(|all| all.len()).unwrap_or(0)
    }

    pub(crate) async fn peek_visible(&self) -> bool {
        match self.resolve_all().await {
            Ok(all) => match all.first() {
                Some(element) => self.eval_on(element, VISIBLE_FN).await.unwrap_or(false),
                None => false,
            },
            Err(_) => false,
        }
    }

    pub(crate) async fn peek_text(&self) -> Option<String> {
        let all = self.resolve_all().await.ok()?;
        let element = all.first()?;
        element.inner_text().await.ok()?
    }

    pub(crate) async fn peek_value(&self) -> Option<String> {
        let all = self.resolve_all().await.ok()?;
        let element = all.first()?;
        self.eval_on(element, "function() { return this.value ?? ''; }")
            .await
            .ok()
    }

    pub(crate) async fn peek_checked(&self) -> Option<bool> {
        let all = self.resolve_all().await.ok()?;
        let element = all.first()?;
        self.eval_on(element, "function() { return !!this.checked; }")
            .await
            .ok()
    }

    pub(crate) async fn peek_attribute(&self, name: &str) -> Option<Option<String>> {
        let all = self.resolve_all().await.ok()?;
        let element = all.first()?;
        element.attribute(name).await.ok()
    }
}
