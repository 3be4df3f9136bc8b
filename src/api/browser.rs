//! UI-automation seam used by the gallery fetch.
//!
//! A [`SessionFactory`] hands out one exclusive [`BrowserSession`] per fetch
//! attempt. Sessions are never shared between attempts.

use crate::error::AppResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Opaque handle to an element located in the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// Element locator, expressed as an XPath selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    xpath: String,
    label: String,
}

impl Locator {
    /// A `div` with the given class whose own text is exactly `text`.
    pub fn folder(class: &str, text: &str) -> Self {
        Locator {
            xpath: format!(
                "//div[@class={} and text()={}]",
                xpath_literal(class),
                xpath_literal(text)
            ),
            label: format!("folder '{}'", text),
        }
    }

    /// A `div` carrying exactly the given class.
    pub fn class(class: &str) -> Self {
        Locator {
            xpath: format!("//div[@class={}]", xpath_literal(class)),
            label: format!("element .{}", class),
        }
    }

    pub fn xpath(&self) -> &str {
        &self.xpath
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Quotes `s` as an XPath 1.0 string literal.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{}'", s);
    }
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }
    let parts: Vec<String> = s.split('\'').map(|p| format!("'{}'", p)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate(&mut self, url: &str) -> AppResult<()>;

    /// Waits until the element is located, displayed and enabled.
    async fn wait_until_clickable(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef>;

    async fn wait_until_present(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef>;

    async fn click(&mut self, element: &ElementRef) -> AppResult<()>;

    async fn read_text(&mut self, element: &ElementRef) -> AppResult<String>;

    /// Ends the session. Safe to call after any earlier failure.
    async fn close(&mut self) -> AppResult<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> AppResult<Box<dyn BrowserSession>>;
}
