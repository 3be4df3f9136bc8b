//! In-memory sheet backend, used by `--dry-run` and by tests.

use crate::api::sheets::SheetStore;
use crate::error::{AppError, AppResult};
use crate::model::SheetRow;
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<Vec<String>>,
    writes: usize,
}

#[derive(Debug, Default)]
pub struct MemorySheet {
    state: Mutex<MemoryState>,
}

fn poison_err<T>(_: PoisonError<T>) -> AppError {
    AppError::Unexpected("memory sheet lock poisoned".into())
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(Into::into).collect())
            .collect();
        MemorySheet {
            state: Mutex::new(MemoryState { rows, writes: 0 }),
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.state
            .lock()
            .map(|s| s.rows.clone())
            .unwrap_or_default()
    }

    /// Number of `write_range` calls served so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().map(|s| s.writes).unwrap_or_default()
    }
}

fn check_span(first_row: usize, last_row: usize) -> AppResult<()> {
    if first_row == 0 || last_row < first_row {
        return Err(AppError::Argument(format!(
            "invalid row span {}..={}",
            first_row, last_row
        )));
    }
    Ok(())
}

#[async_trait]
impl SheetStore for MemorySheet {
    async fn read_all_rows(&self) -> AppResult<Vec<Vec<String>>> {
        Ok(self.state.lock().map_err(poison_err)?.rows.clone())
    }

    async fn read_range(&self, first_row: usize, last_row: usize) -> AppResult<Vec<Vec<String>>> {
        check_span(first_row, last_row)?;
        let state = self.state.lock().map_err(poison_err)?;
        Ok(state
            .rows
            .iter()
            .skip(first_row - 1)
            .take(last_row - first_row + 1)
            .map(|r| r.iter().take(2).cloned().collect())
            .collect())
    }

    async fn write_range(
        &self,
        first_row: usize,
        last_row: usize,
        rows: &[SheetRow],
    ) -> AppResult<()> {
        check_span(first_row, last_row)?;
        if rows.len() != last_row - first_row + 1 {
            return Err(AppError::Argument(format!(
                "{} row(s) supplied for span {}..={}",
                rows.len(),
                first_row,
                last_row
            )));
        }

        let mut state = self.state.lock().map_err(poison_err)?;
        if state.rows.len() < last_row {
            state.rows.resize(last_row, Vec::new());
        }
        for (i, row) in rows.iter().enumerate() {
            let target = &mut state.rows[first_row - 1 + i];
            if target.len() < 2 {
                target.resize(2, String::new());
            }
            let cells = row.cells();
            target[0] = cells[0].clone();
            target[1] = cells[1].clone();
        }
        state.writes += 1;
        Ok(())
    }
}
