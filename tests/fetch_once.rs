use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assembly_tally::api::browser::{BrowserSession, ElementRef, Locator, SessionFactory};
use assembly_tally::api::gallery::{fetch_once, CountFetcher, GalleryFetcher};
use assembly_tally::config::GalleryConfig;
use assembly_tally::error::{AppError, AppResult};
use assembly_tally::model::DatePlan;
use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
enum FailAt {
    Nothing,
    Navigate,
    Wait(usize),
    Click(usize),
    Footer,
    FooterText,
}

struct ScriptedSession {
    fail_at: FailAt,
    waits: usize,
    closes: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> AppResult<()> {
        if self.fail_at == FailAt::Navigate {
            return Err(AppError::webdriver("navigate", "unknown error", "net::ERR"));
        }
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn wait_until_clickable(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef> {
        let idx = self.waits;
        self.waits += 1;
        if self.fail_at == FailAt::Wait(idx) {
            return Err(AppError::timeout(locator.to_string(), timeout.as_secs()));
        }
        self.visited.lock().unwrap().push(locator.xpath().to_string());
        Ok(ElementRef(idx.to_string()))
    }

    async fn wait_until_present(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> AppResult<ElementRef> {
        if self.fail_at == FailAt::Footer {
            return Err(AppError::timeout(locator.to_string(), timeout.as_secs()));
        }
        self.visited.lock().unwrap().push(locator.xpath().to_string());
        Ok(ElementRef("footer".into()))
    }

    async fn click(&mut self, element: &ElementRef) -> AppResult<()> {
        if let FailAt::Click(idx) = self.fail_at {
            if element.0 == idx.to_string() {
                return Err(AppError::ElementNotFound(element.0.clone()));
            }
        }
        Ok(())
    }

    async fn read_text(&mut self, _element: &ElementRef) -> AppResult<String> {
        if self.fail_at == FailAt::FooterText {
            Ok("沒有項目".to_string())
        } else {
            Ok("48 個項目".to_string())
        }
    }

    async fn close(&mut self) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedFactory {
    fail_at: FailAt,
    opens: AtomicUsize,
    closes: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFactory {
    fn new(fail_at: FailAt) -> Self {
        ScriptedFactory {
            fail_at,
            opens: AtomicUsize::new(0),
            closes: Arc::new(AtomicUsize::new(0)),
            visited: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> AppResult<Box<dyn BrowserSession>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            fail_at: self.fail_at,
            waits: 0,
            closes: self.closes.clone(),
            visited: self.visited.clone(),
        }))
    }
}

struct UnavailableDriver;

#[async_trait]
impl SessionFactory for UnavailableDriver {
    async fn open(&self) -> AppResult<Box<dyn BrowserSession>> {
        Err(AppError::Reqwest("connection refused".into()))
    }
}

fn quick_gallery() -> GalleryConfig {
    GalleryConfig {
        root_url: "https://gallery.test/root".into(),
        wait_timeout: Duration::from_secs(1),
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
        ..GalleryConfig::default()
    }
}

fn plan() -> DatePlan {
    DatePlan::new(1, NaiveDate::from_ymd_opt(2025, 2, 6).unwrap()).unwrap()
}

#[tokio::test]
async fn success_reads_footer_and_closes_once() {
    let factory = ScriptedFactory::new(FailAt::Nothing);
    let count = fetch_once(&factory, &quick_gallery(), &plan()).await;

    assert_eq!(count, 48);
    assert_eq!(factory.opens.load(Ordering::SeqCst), 1);
    assert_eq!(factory.closes.load(Ordering::SeqCst), 1);

    let visited = factory.visited.lock().unwrap().clone();
    assert_eq!(visited[0], "https://gallery.test/root");
    assert!(visited[1].contains("每日組裝分享 (僅網路部)"));
    assert!(visited[2].contains("text()='114年'"));
    assert!(visited[3].contains("text()='1140206'"));
    assert!(visited[4].contains("synofoto-folder-wall-footer"));
}

#[tokio::test]
async fn every_failure_point_returns_zero_and_closes_once() {
    let failure_points = [
        FailAt::Navigate,
        FailAt::Wait(0),
        FailAt::Wait(1),
        FailAt::Wait(2),
        FailAt::Click(0),
        FailAt::Click(2),
        FailAt::Footer,
        FailAt::FooterText,
    ];

    for fail_at in failure_points {
        let factory = ScriptedFactory::new(fail_at);
        let count = fetch_once(&factory, &quick_gallery(), &plan()).await;
        assert_eq!(count, 0, "{:?}", fail_at);
        assert_eq!(factory.closes.load(Ordering::SeqCst), 1, "{:?}", fail_at);
    }
}

#[tokio::test]
async fn unavailable_driver_counts_as_zero() {
    let count = fetch_once(&UnavailableDriver, &quick_gallery(), &plan()).await;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn gallery_fetcher_opens_a_session_per_attempt() {
    let factory = Arc::new(ScriptedFactory::new(FailAt::Nothing));
    let fetcher = GalleryFetcher::new(factory.clone(), quick_gallery());

    assert_eq!(fetcher.fetch_count(&plan()).await, 48);
    assert_eq!(fetcher.fetch_count(&plan()).await, 48);
    assert_eq!(factory.opens.load(Ordering::SeqCst), 2);
    assert_eq!(factory.closes.load(Ordering::SeqCst), 2);
}
