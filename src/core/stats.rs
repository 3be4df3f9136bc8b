use crate::core::retry::{SlotResult, SlotState};
use crate::core::upsert::UpsertOutcome;
use crate::logging::{log, LogLevel};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::time::Duration;

pub const CAT_FETCH: &str = "Gallery Fetch";
pub const CAT_UPSERT: &str = "Sheet Upsert";

#[derive(Debug, Clone, Default)]
pub struct CategoryStats {
    pub ok: usize,
    pub fail: usize,
    pub zero_or_appended: usize,
    pub total_tasks: usize,
    pub attempts: usize,
}

impl CategoryStats {
    pub fn add_ok(&mut self) {
        self.ok += 1;
    }
    pub fn add_fail(&mut self) {
        self.fail += 1;
    }
    pub fn add_other(&mut self) {
        self.zero_or_appended += 1;
    }
    pub fn set_total(&mut self, total: usize) {
        self.total_tasks = total;
    }
    pub fn get_processed(&self) -> usize {
        self.ok + self.fail + self.zero_or_appended
    }
}

pub type RunStats = BTreeMap<&'static str, CategoryStats>;

pub fn initialize_stats() -> RunStats {
    let mut stats = BTreeMap::new();
    stats.insert(CAT_FETCH, CategoryStats::default());
    stats.insert(CAT_UPSERT, CategoryStats::default());
    stats
}

/// Fetch: ok = nonzero count, other = zero after every attempt.
pub fn record_fetches(stats: &mut RunStats, slots: &[SlotResult]) {
    let s = stats.entry(CAT_FETCH).or_default();
    s.set_total(slots.len());
    for slot in slots {
        s.attempts += slot.attempts as usize;
        match slot.state {
            SlotState::Succeeded { .. } => s.add_ok(),
            _ => s.add_other(),
        }
    }
}

/// Upsert: ok = overwrote or first row, other = appended.
pub fn record_upsert(stats: &mut RunStats, outcome: Option<UpsertOutcome>) {
    let s = stats.entry(CAT_UPSERT).or_default();
    s.attempts += 1;
    match outcome {
        Some(UpsertOutcome::First) | Some(UpsertOutcome::Updated(_)) => s.add_ok(),
        Some(UpsertOutcome::Appended(_)) => s.add_other(),
        None => s.add_fail(),
    }
}

pub fn print_summary(stats: &RunStats, today: NaiveDate, slots: &[SlotResult], duration: Duration) {
    let sep = "=".repeat(60);
    let title = format!("Run Summary ({} Day(s) before {})", slots.len(), today);
    println!("\n{}\n{:^60}\n{}", sep, title, sep);
    println!("Total Run Time:    {:.3?}", duration);
    println!("{}", "-".repeat(60));

    println!(
        "{:<10} {:<12} {:<10} {:<8} {:<18}",
        "Date", "Key", "Count", "Tries", "State"
    );
    println!("{}", "-".repeat(60));
    for slot in slots {
        let state = match slot.state {
            SlotState::Succeeded { .. } => "ok",
            SlotState::ExhaustedRetries => "zero / failed",
            SlotState::Pending => "pending",
        };
        println!(
            "{:<10} {:<12} {:<10} {:<8} {:<18}",
            slot.plan.date.format("%m/%d").to_string(),
            slot.plan.date_key.as_str(),
            slot.count(),
            slot.attempts,
            state
        );
    }
    println!("{}", "-".repeat(60));

    println!(
        "{:<17} {:<8} {:<16} {:<8} {:<8}",
        "Category", "OK", "Zero/Appended", "Fail", "Total"
    );
    println!("{}", "-".repeat(60));
    for (cat_name, s) in stats {
        println!(
            "{:<17} {:<8} {:<16} {:<8} {:<8}",
            cat_name, s.ok, s.zero_or_appended, s.fail, s.total_tasks
        );
    }
    println!("{}", sep);

    log_overall_status(stats);
}

fn log_overall_status(stats: &RunStats) {
    let fetch = stats.get(CAT_FETCH).cloned().unwrap_or_default();
    let upsert_failures = stats.get(CAT_UPSERT).map_or(0, |s| s.fail);

    if fetch.total_tasks == 0 {
        log(LogLevel::Warning, "Run completed, but no dates were planned.");
    } else if fetch.ok == 0 {
        log(
            LogLevel::Error,
            "Run completed, but every date came back as 0. Check the gallery and the browser logs.",
        );
    } else if fetch.zero_or_appended > 0 || upsert_failures > 0 {
        log(
            LogLevel::Warning,
            &format!(
                "Run completed: {} of {} date(s) at 0, {} upsert(s) failed.",
                fetch.zero_or_appended, fetch.total_tasks, upsert_failures
            ),
        );
    } else {
        log(LogLevel::Success, "Run completed successfully.");
    }
}

/// Exit status for the run. Always 0 unless `fail_on_error` is set, in which
/// case a run where no date produced a count, or an upsert failed, gives 1.
pub fn determine_exit_code(stats: &RunStats, fail_on_error: bool) -> i32 {
    if !fail_on_error {
        return 0;
    }
    let fetch = stats.get(CAT_FETCH).cloned().unwrap_or_default();
    let upsert_failures = stats.get(CAT_UPSERT).map_or(0, |s| s.fail);
    if (fetch.total_tasks > 0 && fetch.ok == 0) || upsert_failures > 0 {
        1
    } else {
        0
    }
}
