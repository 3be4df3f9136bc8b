use crate::api::browser::{BrowserSession, Locator, SessionFactory};
use crate::config::GalleryConfig;
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use crate::model::{AssembleCount, DatePlan};
use crate::utils;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of one count per attempt. A failed attempt yields 0.
#[async_trait]
pub trait CountFetcher: Send + Sync {
    async fn fetch_count(&self, plan: &DatePlan) -> AssembleCount;
}

pub struct GalleryFetcher {
    sessions: Arc<dyn SessionFactory>,
    gallery: GalleryConfig,
}

impl GalleryFetcher {
    pub fn new(sessions: Arc<dyn SessionFactory>, gallery: GalleryConfig) -> Self {
        GalleryFetcher { sessions, gallery }
    }
}

#[async_trait]
impl CountFetcher for GalleryFetcher {
    async fn fetch_count(&self, plan: &DatePlan) -> AssembleCount {
        fetch_once(self.sessions.as_ref(), &self.gallery, plan).await
    }
}

/// One attempt at reading the item count of a date folder.
///
/// Opens a fresh session and always closes it before returning, whether the
/// walk succeeded or not. Any failure is logged and reported as 0.
pub async fn fetch_once(
    sessions: &dyn SessionFactory,
    gallery: &GalleryConfig,
    plan: &DatePlan,
) -> AssembleCount {
    let mut session = match sessions.open().await {
        Ok(s) => s,
        Err(e) => {
            log(
                LogLevel::Warning,
                &format!(
                    "Could not start browser for {} / {}: {}. Counting as 0.",
                    plan.folder_year_key, plan.date_key, e
                ),
            );
            return 0;
        }
    };

    let result = walk_to_count(session.as_mut(), gallery, plan).await;

    if let Err(e) = session.close().await {
        log(
            LogLevel::Warning,
            &format!("Browser session teardown failed: {}", e),
        );
    }

    match result {
        Ok(count) => {
            log(
                LogLevel::Info,
                &format!("Folder {} holds {} item(s)", plan.date_key, count),
            );
            count
        }
        Err(e) => {
            log(
                LogLevel::Warning,
                &format!(
                    "Fetch failed for {} / {}: {}. Counting as 0.",
                    plan.folder_year_key, plan.date_key, e
                ),
            );
            0
        }
    }
}

async fn walk_to_count(
    session: &mut dyn BrowserSession,
    gallery: &GalleryConfig,
    plan: &DatePlan,
) -> AppResult<AssembleCount> {
    session.navigate(&gallery.root_url).await?;
    utils::settle(gallery.settle_delay).await;

    for label in [
        gallery.share_folder.as_str(),
        plan.folder_year_key.as_str(),
        plan.date_key.as_str(),
    ] {
        let locator = Locator::folder(&gallery.folder_class, label);
        let element = session
            .wait_until_clickable(&locator, gallery.wait_timeout)
            .await?;
        session.click(&element).await?;
        utils::settle(gallery.settle_delay).await;
    }

    let footer = session
        .wait_until_present(&Locator::class(&gallery.footer_class), gallery.wait_timeout)
        .await?;
    let text = session.read_text(&footer).await?;
    parse_footer_count(&text)
}

/// Leading whitespace-delimited token of the footer, e.g. `48 個項目` -> 48.
pub fn parse_footer_count(text: &str) -> AppResult<AssembleCount> {
    text.split_whitespace()
        .next()
        .and_then(|token| token.parse::<AssembleCount>().ok())
        .ok_or_else(|| AppError::ParseFailure(text.trim().to_string()))
}
