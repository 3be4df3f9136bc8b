use crate::error::{AppError, AppResult};
use chrono::{FixedOffset, NaiveDate};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_GALLERY_URL: &str =
    "https://www.coolpc.com.tw/photo/#/shared_space/folder/156?_k=tr98b7";
pub const DEFAULT_SHARE_FOLDER: &str = "每日組裝分享 (僅網路部)";
pub const FOLDER_NAME_CLASS: &str = "css-106gz8u";
pub const FOOTER_CLASS: &str = "synofoto-folder-wall-footer";

pub const DEFAULT_CREDENTIALS_PATH: &str = "service_account.json";
pub const DEFAULT_DOCUMENT_NAME: &str = "Yung資料庫";
pub const DEFAULT_SHEET_NAME: &str = "原價屋網路PC組裝數RD";

pub const DEFAULT_LOOKBACK_DAYS: u32 = 5;
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_RETRY_ROUNDS: u32 = 3;
pub const DEFAULT_FRESH_SLOTS: usize = 2;
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Rows at the end of the sheet scanned for an existing date key.
pub const UPSERT_TRAILING_ROWS: usize = 5;

/// Gregorian year of era year 0.
pub const ERA_BASE_YEAR: i32 = 1911;
pub const FOLDER_YEAR_SUFFIX: &str = "年";

pub const HTTP_TIMEOUT_SECONDS: u64 = 35;
pub const HTTP_CONNECT_TIMEOUT: u64 = 20;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
pub const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive.readonly",
];

pub const HEADLESS_CHROME_ARGS: &[&str] = &["--headless", "--no-sandbox", "--disable-dev-shm-usage"];

#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub root_url: String,
    pub share_folder: String,
    pub folder_class: String,
    pub footer_class: String,
    pub wait_timeout: Duration,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            root_url: DEFAULT_GALLERY_URL.to_string(),
            share_folder: DEFAULT_SHARE_FOLDER.to_string(),
            folder_class: FOLDER_NAME_CLASS.to_string(),
            footer_class: FOOTER_CLASS.to_string(),
            wait_timeout: Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            settle_delay: Duration::from_secs(DEFAULT_SETTLE_DELAY_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            headless: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetTarget {
    pub credentials_path: PathBuf,
    pub document: String,
    pub sheet: String,
}

impl Default for SheetTarget {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            document: DEFAULT_DOCUMENT_NAME.to_string(),
            sheet: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

/// Retry budget for the most recent slots of the look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Leading slots (yesterday first) eligible for retry.
    pub fresh_slots: usize,
    /// Extra rounds run when every fresh slot came back as zero.
    pub extra_rounds: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            fresh_slots: DEFAULT_FRESH_SLOTS,
            extra_rounds: DEFAULT_RETRY_ROUNDS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub lookback_days: u32,
    pub utc_offset_hours: i32,
    pub today: Option<NaiveDate>,
    pub gallery: GalleryConfig,
    pub browser: BrowserConfig,
    pub sheet: SheetTarget,
    pub retry: RetryPolicy,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
    pub fail_on_error: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            today: None,
            gallery: GalleryConfig::default(),
            browser: BrowserConfig::default(),
            sheet: SheetTarget::default(),
            retry: RetryPolicy::default(),
            dry_run: false,
            report_path: None,
            fail_on_error: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.gallery.root_url.trim().is_empty() {
            return Err(AppError::Config("gallery URL cannot be empty".into()));
        }
        if self.gallery.share_folder.trim().is_empty() {
            return Err(AppError::Config("share folder label cannot be empty".into()));
        }
        if self.gallery.wait_timeout.is_zero() {
            return Err(AppError::Config(
                "wait timeout must be greater than zero".into(),
            ));
        }
        if self.gallery.poll_interval.is_zero() {
            return Err(AppError::Config(
                "poll interval must be greater than zero".into(),
            ));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(AppError::Config(format!(
                "UTC offset {}h is outside -12..=14",
                self.utc_offset_hours
            )));
        }
        if !self.dry_run {
            if self.sheet.document.trim().is_empty() {
                return Err(AppError::Config("document name cannot be empty".into()));
            }
            if self.sheet.sheet.trim().is_empty() {
                return Err(AppError::Config("sheet name cannot be empty".into()));
            }
        }
        Ok(())
    }

    pub fn time_zone(&self) -> AppResult<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Config(format!("invalid UTC offset: {}h", self.utc_offset_hours))
        })
    }
}
