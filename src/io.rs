use crate::core::retry::SlotResult;
use crate::core::upsert::UpsertOutcome;
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use crate::utils;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    #[serde(flatten)]
    pub slot: SlotResult,
    pub recorded_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upsert: Option<UpsertOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub today: NaiveDate,
    pub dry_run: bool,
    pub entries: Vec<ReportEntry>,
}

fn map_io_error(error: std::io::Error, path: &Path) -> AppError {
    AppError::Io(format!("I/O error at path '{}': {}", path.display(), error))
}

async fn write_file_async(fpath: &Path, data: &[u8]) -> AppResult<()> {
    if let Some(parent) = fpath.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| map_io_error(e, parent))?;
    }
    let mut file = File::create(fpath)
        .await
        .map_err(|e| map_io_error(e, fpath))?;
    file.write_all(data)
        .await
        .map_err(|e| map_io_error(e, fpath))?;
    file.flush().await.map_err(|e| map_io_error(e, fpath))?;
    Ok(())
}

pub async fn save_json<T>(fpath: PathBuf, data: T) -> AppResult<()>
where
    T: Serialize + Send + Sync + 'static,
{
    let json_string =
        utils::run_blocking(move || serde_json::to_string_pretty(&data).map_err(AppError::from))
            .await?;

    if let Err(e) = write_file_async(&fpath, json_string.as_bytes()).await {
        log(
            LogLevel::Error,
            &format!("Save JSON FAIL - Write Error: {}. File: '{}'", e, fpath.display()),
        );
        if fs::try_exists(&fpath).await.unwrap_or(false) {
            let _ = fs::remove_file(&fpath).await;
        }
        return Err(e);
    }

    log(
        LogLevel::Success,
        &format!("Run report written to {}", fpath.display()),
    );
    Ok(())
}
