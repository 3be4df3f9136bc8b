//! Minimal W3C WebDriver client.
//!
//! Speaks the JSON wire protocol to an already-running driver (chromedriver by
//! default). Only the handful of commands the gallery walk needs are covered.

use crate::api::browser::{BrowserSession, ElementRef, Locator, SessionFactory};
use crate::config::{self, BrowserConfig};
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::time::sleep;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct WebDriverClient {
    client: Client,
    base_url: String,
}

impl WebDriverClient {
    pub fn new(browser: &BrowserConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(config::HTTP_CONNECT_TIMEOUT))
            .build()
            .map_err(AppError::from)?;
        Ok(WebDriverClient {
            client,
            base_url: browser.webdriver_url.trim_end_matches('/').to_string(),
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        command: &str,
    ) -> AppResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(b) = body {
            request = request.json(b);
        }

        let resp = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::timeout(format!("WebDriver '{}'", command), config::HTTP_TIMEOUT_SECONDS)
            } else {
                AppError::from(e)
            }
        })?;
        let status = resp.status();
        let bytes = resp.bytes().await.map_err(AppError::from)?;
        decode_response(status, &bytes, command)
    }
}

fn decode_response(status: StatusCode, bytes: &[u8], command: &str) -> AppResult<Value> {
    let wire: WireResponse = serde_json::from_slice(bytes).map_err(|e| {
        let snippet = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]);
        AppError::webdriver(
            command,
            format!("HTTP {}", status.as_u16()),
            format!("undecodable response ({}): '{}'", e, snippet),
        )
    })?;

    if status.is_success() {
        return Ok(wire.value);
    }

    match serde_json::from_value::<WireError>(wire.value) {
        Ok(err) if err.error == "no such element" => Err(AppError::ElementNotFound(err.message)),
        Ok(err) => Err(AppError::webdriver(command, err.error, err.message)),
        Err(_) => Err(AppError::webdriver(
            command,
            format!("HTTP {}", status.as_u16()),
            "error response without error code".to_string(),
        )),
    }
}

fn element_from_value(value: &Value) -> Option<ElementRef> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
}

fn capabilities(headless: bool) -> Value {
    let args: Vec<&str> = config::HEADLESS_CHROME_ARGS
        .iter()
        .copied()
        .filter(|a| headless || *a != "--headless")
        .collect();
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

pub struct WebDriverFactory {
    client: WebDriverClient,
    headless: bool,
    poll_interval: Duration,
}

impl WebDriverFactory {
    pub fn new(browser: &BrowserConfig, poll_interval: Duration) -> AppResult<Self> {
        Ok(WebDriverFactory {
            client: WebDriverClient::new(browser)?,
            headless: browser.headless,
            poll_interval,
        })
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> AppResult<Box<dyn BrowserSession>> {
        let body = capabilities(self.headless);
        let value = self
            .client
            .command(Method::POST, "/session", Some(&body), "new session")
            .await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AppError::webdriver("new session", "invalid response", "missing sessionId")
            })?
            .to_string();

        log(
            LogLevel::Info,
            &format!("Opened browser session {} (headless: {})", session_id, self.headless),
        );

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_id: Some(session_id),
            poll_interval: self.poll_interval,
        }))
    }
}

pub struct WebDriverSession {
    client: WebDriverClient,
    session_id: Option<String>,
    poll_interval: Duration,
}

impl WebDriverSession {
    fn path(&self, suffix: &str) -> AppResult<String> {
        let id = self.session_id.as_deref().ok_or_else(|| {
            AppError::webdriver("session", "invalid session id", "session already closed")
        })?;
        Ok(format!("/session/{}{}", id, suffix))
    }

    async fn find(&self, locator: &Locator) -> AppResult<Option<ElementRef>> {
        let body = json!({ "using": "xpath", "value": locator.xpath() });
        let path = self.path("/element")?;
        match self
            .client
            .command(Method::POST, &path, Some(&body), "find element")
            .await
        {
            Ok(value) => Ok(element_from_value(&value)),
            Err(AppError::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn element_flag(&self, element: &ElementRef, flag: &str) -> AppResult<bool> {
        let path = self.path(&format!("/element/{}/{}", element.0, flag))?;
        let value = self.client.command(Method::GET, &path, None, flag).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn probe(&self, locator: &Locator, clickable: bool) -> AppResult<Option<ElementRef>> {
        let Some(element) = self.find(locator).await? else {
            return Ok(None);
        };
        if !clickable {
            return Ok(Some(element));
        }
        if self.element_flag(&element, "displayed").await?
            && self.element_flag(&element, "enabled").await?
        {
            Ok(Some(element))
        } else {
            Ok(None)
        }
    }

    async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
        clickable: bool,
    ) -> AppResult<ElementRef> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.probe(locator, clickable).await {
                Ok(Some(element)) => return Ok(element),
                Ok(None) => {}
                Err(e) if e.is_transient_lookup() => {}
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AppError::timeout(locator.to_string(), timeout.as_secs()));
            }
            sleep(self.poll_interval.min(deadline - now)).await;
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> AppResult<()> {
        let path = self.path("/url")?;
        self.client
            .command(Method::POST, &path, Some(&json!({ "url": url })), "navigate")
            .await?;
        Ok(())
    }

    async fn wait_until_clickable(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef> {
        self.wait_for(locator, timeout, true).await
    }

    async fn wait_until_present(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef> {
        self.wait_for(locator, timeout, false).await
    }

    async fn click(&mut self, element: &ElementRef) -> AppResult<()> {
        let path = self.path(&format!("/element/{}/click", element.0))?;
        self.client
            .command(Method::POST, &path, Some(&json!({})), "click")
            .await?;
        Ok(())
    }

    async fn read_text(&mut self, element: &ElementRef) -> AppResult<String> {
        let path = self.path(&format!("/element/{}/text", element.0))?;
        let value = self.client.command(Method::GET, &path, None, "text").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&mut self) -> AppResult<()> {
        let Some(id) = self.session_id.take() else {
            return Ok(());
        };
        self.client
            .command(Method::DELETE, &format!("/session/{}", id), None, "delete session")
            .await?;
        log(LogLevel::Info, &format!("Closed browser session {}", id));
        Ok(())
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Some(id) = &self.session_id {
            log(
                LogLevel::Warning,
                &format!("Browser session {} dropped without being closed", id),
            );
        }
    }
}
