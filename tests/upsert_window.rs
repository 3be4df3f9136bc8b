use assembly_tally::api::sheets::SheetStore;
use assembly_tally::core::upsert::{upsert, UpsertOutcome};
use assembly_tally::model::DateKey;
use assembly_tally::testing::MemorySheet;
use chrono::NaiveDate;

fn key(y: i32, m: u32, d: u32) -> DateKey {
    DateKey::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
}

fn rows_for(sheet: &MemorySheet, k: &str) -> Vec<Vec<String>> {
    sheet
        .rows()
        .into_iter()
        .filter(|r| r.first().map(String::as_str) == Some(k))
        .collect()
}

#[tokio::test]
async fn empty_table_writes_first_row_only() {
    let sheet = MemorySheet::new();
    let outcome = upsert(&sheet, &key(2025, 2, 6), 63).await.unwrap();

    assert_eq!(outcome, UpsertOutcome::First);
    assert_eq!(sheet.read_all_rows().await.unwrap(), vec![vec!["1140206", "63"]]);
}

#[tokio::test]
async fn repeated_upsert_overwrites_in_place() {
    let sheet = MemorySheet::with_rows([["1140203", "20"], ["1140204", "21"], ["1140205", "22"]]);
    let k = key(2025, 2, 6);

    assert_eq!(upsert(&sheet, &k, 10).await.unwrap(), UpsertOutcome::Appended(4));
    assert_eq!(upsert(&sheet, &k, 12).await.unwrap(), UpsertOutcome::Updated(4));

    assert_eq!(rows_for(&sheet, "1140206"), vec![vec!["1140206", "12"]]);
    assert_eq!(sheet.rows().len(), 4);
}

#[tokio::test]
async fn identical_input_leaves_table_unchanged() {
    let sheet = MemorySheet::with_rows([["1140205", "22"], ["1140206", "12"]]);
    let before = sheet.rows();

    upsert(&sheet, &key(2025, 2, 6), 12).await.unwrap();

    assert_eq!(sheet.rows(), before);
}

#[tokio::test]
async fn match_on_oldest_row_of_window_is_updated() {
    // Six rows: the trailing window is rows 2..=6.
    let sheet = MemorySheet::with_rows([
        ["1140130", "1"],
        ["1140131", "2"],
        ["1140201", "3"],
        ["1140202", "4"],
        ["1140203", "5"],
        ["1140204", "6"],
    ]);

    let outcome = upsert(&sheet, &key(2025, 1, 31), 50).await.unwrap();

    assert_eq!(outcome, UpsertOutcome::Updated(2));
    assert_eq!(sheet.rows()[1], vec!["1140131", "50"]);
    assert_eq!(sheet.rows().len(), 6);
}

#[tokio::test]
async fn key_outside_window_is_appended_as_duplicate() {
    // The key sits six rows back, beyond the five-row window, so it cannot
    // be corrected; a second row for it is appended instead.
    let sheet = MemorySheet::with_rows([
        ["1140206", "10"],
        ["1140207", "2"],
        ["1140208", "3"],
        ["1140209", "4"],
        ["1140210", "5"],
        ["1140211", "6"],
    ]);

    let outcome = upsert(&sheet, &key(2025, 2, 6), 12).await.unwrap();

    assert_eq!(outcome, UpsertOutcome::Appended(7));
    assert_eq!(
        rows_for(&sheet, "1140206"),
        vec![vec!["1140206", "10"], vec!["1140206", "12"]]
    );
}

#[tokio::test]
async fn blank_rows_in_window_are_skipped() {
    let sheet = MemorySheet::with_rows(vec![
        vec!["1140205", "1"],
        vec![],
        vec!["1140206", "2"],
    ]);

    let outcome = upsert(&sheet, &key(2025, 2, 6), 3).await.unwrap();

    assert_eq!(outcome, UpsertOutcome::Updated(3));
    assert_eq!(sheet.rows()[2], vec!["1140206", "3"]);
}
