use crate::config::{self, SheetTarget};
use crate::error::{AppError, AppResult};
use crate::logging::{log, LogLevel};
use crate::model::SheetRow;
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Row-addressed access to one sheet. Row numbers are 1-based and inclusive.
#[async_trait]
pub trait SheetStore: Send + Sync {
    async fn read_all_rows(&self) -> AppResult<Vec<Vec<String>>>;

    async fn read_range(&self, first_row: usize, last_row: usize) -> AppResult<Vec<Vec<String>>>;

    async fn write_range(
        &self,
        first_row: usize,
        last_row: usize,
        rows: &[SheetRow],
    ) -> AppResult<()>;
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 backend, authenticated with a service account key file.
pub struct GoogleSheets {
    client: Client,
    tokens: Arc<dyn TokenProvider>,
    spreadsheet_id: String,
    sheet: String,
}

impl GoogleSheets {
    /// Authenticates, then opens the document and sheet by their exact names.
    pub async fn connect(target: &SheetTarget) -> AppResult<Self> {
        let account = CustomServiceAccount::from_file(&target.credentials_path).map_err(|e| {
            AppError::Authentication(format!(
                "cannot load credentials from '{}': {}",
                target.credentials_path.display(),
                e
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECONDS))
            .connect_timeout(Duration::from_secs(config::HTTP_CONNECT_TIMEOUT))
            .build()
            .map_err(AppError::from)?;

        let mut sheets = GoogleSheets {
            client,
            tokens: Arc::new(account),
            spreadsheet_id: String::new(),
            sheet: target.sheet.clone(),
        };
        sheets.spreadsheet_id = sheets.open_document_by_name(&target.document).await?;
        sheets.open_sheet_by_name(&target.document, &target.sheet).await?;

        log(
            LogLevel::Success,
            &format!(
                "Connected to sheet '{}' in document '{}'",
                target.sheet, target.document
            ),
        );
        Ok(sheets)
    }

    async fn open_document_by_name(&self, name: &str) -> AppResult<String> {
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_drive_query(name),
            config::SPREADSHEET_MIME
        );
        let request = self.client.get(config::DRIVE_FILES_API).query(&[
            ("q", query.as_str()),
            ("fields", "files(id,name)"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ]);
        let list: DriveFileList = self.send_json(request, "find document").await?;

        list.files
            .into_iter()
            .find(|f| f.name == name)
            .map(|f| f.id)
            .ok_or_else(|| AppError::DocumentNotFound(name.to_string()))
    }

    async fn open_sheet_by_name(&self, document: &str, sheet: &str) -> AppResult<()> {
        let url = self.spreadsheet_url(&[])?;
        let request = self
            .client
            .get(url)
            .query(&[("fields", "sheets.properties.title")]);
        let meta: SpreadsheetMeta = self.send_json(request, "open sheet").await?;

        if meta.sheets.iter().any(|s| s.properties.title == sheet) {
            Ok(())
        } else {
            Err(AppError::SheetNotFound {
                document: document.to_string(),
                sheet: sheet.to_string(),
            })
        }
    }

    fn spreadsheet_url(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = Url::parse(config::SHEETS_API_BASE)
            .map_err(|e| AppError::Config(format!("invalid Sheets API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Sheets API URL cannot take a path".into()))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> AppResult<T> {
        let token = self.tokens.token(config::GOOGLE_SCOPES).await?;
        let resp = request.bearer_auth(token.as_str()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AppError::Authentication(format!(
                "{} rejected with HTTP {}: {}",
                operation,
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }
        if !status.is_success() {
            return Err(AppError::sheets_api(
                status.as_u16(),
                operation,
                body.chars().take(300).collect::<String>(),
            ));
        }
        serde_json::from_str(&body).map_err(AppError::from)
    }

    async fn get_values(&self, range: &str) -> AppResult<Vec<Vec<String>>> {
        let url = self.spreadsheet_url(&["values", range])?;
        let vr: ValueRange = self
            .send_json(self.client.get(url), "read range")
            .await?;
        Ok(vr
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

#[async_trait]
impl SheetStore for GoogleSheets {
    async fn read_all_rows(&self) -> AppResult<Vec<Vec<String>>> {
        self.get_values(&quote_sheet_name(&self.sheet)).await
    }

    async fn read_range(&self, first_row: usize, last_row: usize) -> AppResult<Vec<Vec<String>>> {
        self.get_values(&a1_range(&self.sheet, first_row, last_row))
            .await
    }

    async fn write_range(
        &self,
        first_row: usize,
        last_row: usize,
        rows: &[SheetRow],
    ) -> AppResult<()> {
        let range = a1_range(&self.sheet, first_row, last_row);
        let values: Vec<Value> = rows
            .iter()
            .map(|r| json!([r.date_key.as_str(), r.count]))
            .collect();
        let url = self.spreadsheet_url(&["values", range.as_str()])?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": values });

        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .json(&body);
        let _: Value = self.send_json(request, "write range").await?;
        Ok(())
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape_drive_query(name: &str) -> String {
    name.replace('\\', "\\\\").replace('\'', "\\'")
}

fn quote_sheet_name(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// Two-column A1 range covering rows `first..=last`.
pub fn a1_range(sheet: &str, first_row: usize, last_row: usize) -> String {
    format!("{}!A{}:B{}", quote_sheet_name(sheet), first_row, last_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_range_quotes_sheet() {
        assert_eq!(a1_range("原價屋網路PC組裝數RD", 3, 7), "'原價屋網路PC組裝數RD'!A3:B7");
        assert_eq!(a1_range("Bob's", 1, 1), "'Bob''s'!A1:B1");
    }

    #[test]
    fn drive_query_escapes_quotes() {
        assert_eq!(escape_drive_query("a'b\\c"), "a\\'b\\\\c");
    }

    #[test]
    fn cells_render_as_text() {
        assert_eq!(cell_to_string(json!("1140206")), "1140206");
        assert_eq!(cell_to_string(json!(63)), "63");
        assert_eq!(cell_to_string(Value::Null), "");
    }

    #[test]
    fn value_range_without_values_is_empty() {
        let vr: ValueRange = serde_json::from_str(r#"{"range":"'S'!A1:Z1000","majorDimension":"ROWS"}"#).unwrap();
        assert!(vr.values.is_empty());
    }
}
