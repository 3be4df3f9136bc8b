use crate::api::sheets::SheetStore;
use crate::config;
use crate::error::AppResult;
use crate::logging::{log, LogLevel};
use crate::model::{AssembleCount, DateKey, SheetRow};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "row", rename_all = "camelCase")]
pub enum UpsertOutcome {
    /// The sheet was empty; written to row 1.
    First,
    /// An existing row in the trailing window was overwritten.
    Updated(usize),
    /// No match in the trailing window; appended at this row.
    Appended(usize),
}

impl UpsertOutcome {
    pub fn row(&self) -> usize {
        match self {
            UpsertOutcome::First => 1,
            UpsertOutcome::Updated(r) | UpsertOutcome::Appended(r) => *r,
        }
    }
}

/// Writes `(date_key, count)` into the sheet.
///
/// Only the last [`config::UPSERT_TRAILING_ROWS`] rows are searched for an
/// existing key. A key that only occurs further up is appended again.
pub async fn upsert(
    store: &dyn SheetStore,
    date_key: &DateKey,
    count: AssembleCount,
) -> AppResult<UpsertOutcome> {
    let row = SheetRow::new(date_key.clone(), count);
    let row_count = store.read_all_rows().await?.len();

    if row_count == 0 {
        store.write_range(1, 1, std::slice::from_ref(&row)).await?;
        log(
            LogLevel::Info,
            &format!("Sheet was empty; wrote {} = {} to row 1", date_key, count),
        );
        return Ok(UpsertOutcome::First);
    }

    let start_row = row_count
        .saturating_sub(config::UPSERT_TRAILING_ROWS - 1)
        .max(1);
    let window = store.read_range(start_row, row_count).await?;

    let matched = window
        .iter()
        .position(|cells| cells.first().map(String::as_str) == Some(date_key.as_str()))
        .map(|i| start_row + i);

    let outcome = match matched {
        Some(r) => {
            store.write_range(r, r, std::slice::from_ref(&row)).await?;
            log(
                LogLevel::Info,
                &format!("Found {} at row {}; overwrote with count {}", date_key, r, count),
            );
            UpsertOutcome::Updated(r)
        }
        None => {
            let r = row_count + 1;
            store.write_range(r, r, std::slice::from_ref(&row)).await?;
            log(
                LogLevel::Info,
                &format!("{} not in the last rows; appended at row {} with count {}", date_key, r, count),
            );
            UpsertOutcome::Appended(r)
        }
    };
    Ok(outcome)
}
