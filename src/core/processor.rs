use crate::api::gallery::{CountFetcher, GalleryFetcher};
use crate::api::sheets::{GoogleSheets, SheetStore};
use crate::api::webdriver::WebDriverFactory;
use crate::config::RunConfig;
use crate::core::planner;
use crate::core::retry::{self, SlotResult};
use crate::core::stats::{self, CategoryStats, RunStats};
use crate::core::upsert::{self, UpsertOutcome};
use crate::error::AppResult;
use crate::io::{self, ReportEntry, RunReport};
use crate::logging::{log, LogLevel};
use crate::testing::MemorySheet;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RunOutcome {
    pub today: NaiveDate,
    pub slots: Vec<SlotResult>,
    pub upserts: Vec<UpsertOutcome>,
    pub stats: RunStats,
}

/// One scheduled run against the live gallery and spreadsheet.
pub async fn run(config: RunConfig) -> AppResult<i32> {
    let overall_start_time = Instant::now();
    let tz = config.time_zone()?;
    let today = config
        .today
        .unwrap_or_else(|| planner::today_at_offset(tz));

    log(
        LogLevel::Step,
        &format!(
            "Starting assembly count sync for {} day(s) before {} (UTC{:+})",
            config.lookback_days, today, config.utc_offset_hours
        ),
    );

    let memory = config.dry_run.then(|| Arc::new(MemorySheet::new()));
    let store: Arc<dyn SheetStore> = match &memory {
        Some(m) => {
            log(
                LogLevel::Warning,
                "Dry run: results go to an in-memory sheet, nothing is persisted.",
            );
            m.clone() as Arc<dyn SheetStore>
        }
        None => Arc::new(GoogleSheets::connect(&config.sheet).await?),
    };

    let sessions = Arc::new(WebDriverFactory::new(
        &config.browser,
        config.gallery.poll_interval,
    )?);
    let fetcher = GalleryFetcher::new(sessions, config.gallery.clone());

    let outcome = run_with(today, &config, &fetcher, store.as_ref()).await?;

    stats::print_summary(
        &outcome.stats,
        outcome.today,
        &outcome.slots,
        overall_start_time.elapsed(),
    );

    if let Some(m) = &memory {
        for (i, row) in m.rows().iter().enumerate() {
            log(
                LogLevel::Info,
                &format!("Dry-run row {}: {}", i + 1, row.join(" | ")),
            );
        }
    }

    if let Some(path) = &config.report_path {
        let report = build_report(&outcome, config.dry_run);
        if let Err(e) = io::save_json(path.clone(), report).await {
            log(
                LogLevel::Warning,
                &format!("Could not write run report: {}", e),
            );
        }
    }

    log(
        LogLevel::Step,
        &format!(
            "--- Run Finished at {} ---",
            Utc::now().format("%Y-%m-%d %H:%M:%S %Z")
        ),
    );
    Ok(stats::determine_exit_code(&outcome.stats, config.fail_on_error))
}

/// Plans the window, collects counts and upserts them in plan order.
///
/// Sheet errors abort the run; fetch errors never do.
pub async fn run_with(
    today: NaiveDate,
    config: &RunConfig,
    fetcher: &dyn CountFetcher,
    store: &dyn SheetStore,
) -> AppResult<RunOutcome> {
    let mut run_stats = stats::initialize_stats();

    let plans = planner::plan_window(today, config.lookback_days);
    if plans.is_empty() {
        log(LogLevel::Warning, "Look-back window is empty; nothing to do.");
    }

    let fetch_start_time = Instant::now();
    log(LogLevel::Step, "--- Phase 1: Gallery Fetch ---");
    let slots = retry::collect_counts(fetcher, &plans, &config.retry).await;
    stats::record_fetches(&mut run_stats, &slots);
    log_phase_completion(
        "Gallery Fetch",
        &run_stats[stats::CAT_FETCH],
        fetch_start_time.elapsed(),
    );

    let upsert_start_time = Instant::now();
    log(LogLevel::Step, "--- Phase 2: Sheet Upsert ---");
    if let Some(s) = run_stats.get_mut(stats::CAT_UPSERT) {
        s.set_total(slots.len());
    }
    let mut upserts = Vec::with_capacity(slots.len());
    for slot in &slots {
        match upsert::upsert(store, &slot.plan.date_key, slot.count()).await {
            Ok(outcome) => {
                stats::record_upsert(&mut run_stats, Some(outcome));
                upserts.push(outcome);
            }
            Err(e) => {
                stats::record_upsert(&mut run_stats, None);
                log(
                    LogLevel::Error,
                    &format!("Upsert of {} failed: {}", slot.plan.date_key, e),
                );
                return Err(e);
            }
        }
    }
    log_phase_completion(
        "Sheet Upsert",
        &run_stats[stats::CAT_UPSERT],
        upsert_start_time.elapsed(),
    );

    Ok(RunOutcome {
        today,
        slots,
        upserts,
        stats: run_stats,
    })
}

fn build_report(outcome: &RunOutcome, dry_run: bool) -> RunReport {
    let entries = outcome
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| ReportEntry {
            recorded_count: slot.count(),
            slot: slot.clone(),
            upsert: outcome.upserts.get(i).copied(),
        })
        .collect();
    RunReport {
        generated_at: Utc::now(),
        today: outcome.today,
        dry_run,
        entries,
    }
}

fn log_phase_completion(phase_name: &str, stats: &CategoryStats, duration: Duration) {
    log(
        LogLevel::Info,
        &format!(
            "{} complete in {:.2?}. Processed: {}/{} (OK: {}, Zero/Appended: {}, Fail: {}, Attempts: {})",
            phase_name,
            duration,
            stats.get_processed(),
            stats.total_tasks,
            stats.ok,
            stats.zero_or_appended,
            stats.fail,
            stats.attempts
        ),
    );
}
