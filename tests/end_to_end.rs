mod common;

use assembly_tally::api::sheets::SheetStore;
use assembly_tally::config::RunConfig;
use assembly_tally::core::processor::run_with;
use assembly_tally::core::stats::{determine_exit_code, CAT_FETCH, CAT_UPSERT};
use assembly_tally::core::upsert::UpsertOutcome;
use assembly_tally::error::{AppError, AppResult};
use assembly_tally::model::SheetRow;
use assembly_tally::testing::MemorySheet;
use async_trait::async_trait;
use common::{ymd, ScriptedFetcher};

fn scenario_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new([
        ("1140211", vec![0, 15]),
        ("1140210", vec![0, 0, 22]),
        ("1140209", vec![40]),
        ("1140208", vec![38]),
        ("1140207", vec![52]),
    ])
}

#[tokio::test]
async fn five_day_run_fills_an_empty_sheet() {
    let sheet = MemorySheet::new();
    let fetcher = scenario_fetcher();

    let outcome = run_with(ymd(2025, 2, 12), &RunConfig::default(), &fetcher, &sheet)
        .await
        .unwrap();

    let counts: Vec<u32> = outcome.slots.iter().map(|s| s.count()).collect();
    assert_eq!(counts, [15, 22, 40, 38, 52]);
    assert_eq!(
        sheet.rows(),
        vec![
            vec!["1140211", "15"],
            vec!["1140210", "22"],
            vec!["1140209", "40"],
            vec!["1140208", "38"],
            vec!["1140207", "52"],
        ]
    );
    assert_eq!(
        outcome.upserts,
        [
            UpsertOutcome::First,
            UpsertOutcome::Appended(2),
            UpsertOutcome::Appended(3),
            UpsertOutcome::Appended(4),
            UpsertOutcome::Appended(5),
        ]
    );
    assert_eq!(outcome.stats[CAT_FETCH].ok, 5);
    assert_eq!(outcome.stats[CAT_FETCH].attempts, 8);
    assert_eq!(outcome.stats[CAT_UPSERT].zero_or_appended, 4);
}

#[tokio::test]
async fn rerun_updates_rows_instead_of_appending() {
    let sheet = MemorySheet::new();
    run_with(ymd(2025, 2, 12), &RunConfig::default(), &scenario_fetcher(), &sheet)
        .await
        .unwrap();

    let corrected = ScriptedFetcher::new([
        ("1140211", vec![16]),
        ("1140210", vec![23]),
        ("1140209", vec![40]),
        ("1140208", vec![38]),
        ("1140207", vec![52]),
    ]);
    let outcome = run_with(ymd(2025, 2, 12), &RunConfig::default(), &corrected, &sheet)
        .await
        .unwrap();

    assert_eq!(sheet.rows().len(), 5);
    assert_eq!(sheet.rows()[0], vec!["1140211", "16"]);
    assert_eq!(sheet.rows()[1], vec!["1140210", "23"]);
    assert!(outcome
        .upserts
        .iter()
        .all(|u| matches!(u, UpsertOutcome::Updated(_))));
}

#[tokio::test]
async fn total_fetch_failure_still_writes_zero_rows() {
    let sheet = MemorySheet::new();
    let fetcher = ScriptedFetcher::default();
    let config = RunConfig::default();

    let outcome = run_with(ymd(2025, 2, 12), &config, &fetcher, &sheet)
        .await
        .unwrap();

    assert!(sheet.rows().iter().all(|r| r[1] == "0"));
    assert_eq!(sheet.rows().len(), 5);
    // 2 fresh slots x 4 attempts + 3 single attempts.
    assert_eq!(fetcher.calls().len(), 11);
    assert_eq!(determine_exit_code(&outcome.stats, false), 0);
    assert_eq!(determine_exit_code(&outcome.stats, true), 1);
}

struct LockedSheet;

#[async_trait]
impl SheetStore for LockedSheet {
    async fn read_all_rows(&self) -> AppResult<Vec<Vec<String>>> {
        Err(AppError::Authentication("token expired".into()))
    }

    async fn read_range(&self, _first: usize, _last: usize) -> AppResult<Vec<Vec<String>>> {
        unreachable!("no range read after a failed full read")
    }

    async fn write_range(&self, _first: usize, _last: usize, _rows: &[SheetRow]) -> AppResult<()> {
        unreachable!("no write after a failed full read")
    }
}

#[tokio::test]
async fn sheet_errors_abort_the_run() {
    let fetcher = scenario_fetcher();
    let err = run_with(ymd(2025, 2, 12), &RunConfig::default(), &fetcher, &LockedSheet)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)));
}

#[tokio::test]
async fn zero_day_window_touches_nothing() {
    let sheet = MemorySheet::new();
    let fetcher = ScriptedFetcher::default();
    let config = RunConfig {
        lookback_days: 0,
        ..RunConfig::default()
    };

    let outcome = run_with(ymd(2025, 2, 12), &config, &fetcher, &sheet)
        .await
        .unwrap();

    assert!(outcome.slots.is_empty());
    assert!(fetcher.calls().is_empty());
    assert_eq!(sheet.write_count(), 0);
    assert_eq!(determine_exit_code(&outcome.stats, true), 0);
}
