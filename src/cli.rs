use crate::config::{self, BrowserConfig, GalleryConfig, RetryPolicy, RunConfig, SheetTarget};
use crate::error::{AppError, AppResult};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Counts the daily assembly-share photo folders and records them in a spreadsheet.",
    long_about = None
)]
pub struct CliArgs {
    #[arg(
        long,
        env = "ASSEMBLY_CREDENTIALS",
        default_value = config::DEFAULT_CREDENTIALS_PATH,
        value_name = "FILE_PATH",
        help = "Service account key file for the spreadsheet"
    )]
    credentials: PathBuf,

    #[arg(
        long,
        env = "ASSEMBLY_DOCUMENT",
        default_value = config::DEFAULT_DOCUMENT_NAME,
        help = "Spreadsheet document name"
    )]
    document: String,

    #[arg(
        long,
        env = "ASSEMBLY_SHEET",
        default_value = config::DEFAULT_SHEET_NAME,
        help = "Sheet (tab) name inside the document"
    )]
    sheet: String,

    #[arg(
        long,
        env = "ASSEMBLY_GALLERY_URL",
        default_value = config::DEFAULT_GALLERY_URL,
        value_name = "URL",
        help = "Gallery root URL"
    )]
    gallery_url: String,

    #[arg(
        long,
        env = "ASSEMBLY_SHARE_FOLDER",
        default_value = config::DEFAULT_SHARE_FOLDER,
        help = "Label of the top-level share folder"
    )]
    share_folder: String,

    #[arg(
        short,
        long,
        env = "ASSEMBLY_DAYS",
        default_value_t = config::DEFAULT_LOOKBACK_DAYS,
        help = "Number of days before today to process"
    )]
    days: u32,

    #[arg(
        long,
        env = "ASSEMBLY_WAIT_TIMEOUT",
        default_value_t = config::DEFAULT_WAIT_TIMEOUT_SECS,
        value_name = "SECONDS",
        help = "Timeout for each element wait"
    )]
    wait_timeout: u64,

    #[arg(
        long,
        env = "ASSEMBLY_SETTLE_DELAY",
        default_value_t = config::DEFAULT_SETTLE_DELAY_SECS,
        value_name = "SECONDS",
        help = "Pause after each page action (0 disables)"
    )]
    settle_delay: u64,

    #[arg(
        long,
        env = "ASSEMBLY_POLL_INTERVAL_MS",
        default_value_t = config::DEFAULT_POLL_INTERVAL_MS,
        value_name = "MILLIS",
        help = "Polling interval while waiting for an element"
    )]
    poll_interval_ms: u64,

    #[arg(
        long,
        env = "ASSEMBLY_RETRY_ROUNDS",
        default_value_t = config::DEFAULT_RETRY_ROUNDS,
        help = "Extra rounds for the most recent days when they all return 0"
    )]
    retry_rounds: u32,

    #[arg(
        long,
        env = "ASSEMBLY_FRESH_SLOTS",
        default_value_t = config::DEFAULT_FRESH_SLOTS,
        help = "How many of the most recent days are eligible for retry"
    )]
    fresh_slots: usize,

    #[arg(
        long,
        env = "ASSEMBLY_UTC_OFFSET_HOURS",
        default_value_t = config::DEFAULT_UTC_OFFSET_HOURS,
        allow_negative_numbers = true,
        value_name = "HOURS",
        help = "UTC offset used to decide what 'today' is"
    )]
    utc_offset_hours: i32,

    #[arg(
        long,
        env = "ASSEMBLY_TODAY",
        value_name = "YYYY-MM-DD",
        help = "Treat this date as today instead of the wall clock"
    )]
    today: Option<NaiveDate>,

    #[arg(
        long,
        env = "ASSEMBLY_WEBDRIVER_URL",
        default_value = config::DEFAULT_WEBDRIVER_URL,
        value_name = "URL",
        help = "WebDriver endpoint (e.g. a running chromedriver)"
    )]
    webdriver_url: String,

    #[arg(long, help = "Run the browser with a visible window")]
    show_browser: bool,

    #[arg(long, help = "Fetch counts but write to an in-memory sheet only")]
    dry_run: bool,

    #[arg(
        long,
        env = "ASSEMBLY_REPORT",
        value_name = "FILE_PATH",
        help = "Write a JSON report of the run to this file"
    )]
    report: Option<PathBuf>,

    #[arg(
        long,
        help = "Exit with status 1 on a fatal error or when every date returns 0"
    )]
    fail_on_error: bool,
}

impl CliArgs {
    pub fn fail_on_error(&self) -> bool {
        self.fail_on_error
    }

    pub fn into_config(self) -> AppResult<RunConfig> {
        let cfg = RunConfig {
            lookback_days: self.days,
            utc_offset_hours: self.utc_offset_hours,
            today: self.today,
            gallery: GalleryConfig {
                root_url: self.gallery_url,
                share_folder: self.share_folder,
                wait_timeout: Duration::from_secs(self.wait_timeout),
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                settle_delay: Duration::from_secs(self.settle_delay),
                ..GalleryConfig::default()
            },
            browser: BrowserConfig {
                webdriver_url: self.webdriver_url,
                headless: !self.show_browser,
            },
            sheet: SheetTarget {
                credentials_path: self.credentials,
                document: self.document,
                sheet: self.sheet,
            },
            retry: RetryPolicy {
                fresh_slots: self.fresh_slots,
                extra_rounds: self.retry_rounds,
            },
            dry_run: self.dry_run,
            report_path: self.report,
            fail_on_error: self.fail_on_error,
        };
        cfg.validate()
            .map_err(|e| AppError::Argument(e.to_string()))?;
        Ok(cfg)
    }
}
