use thiserror::Error;
use tokio::task::JoinError;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error("Timed out after {seconds}s waiting for {what}")]
    InteractionTimeout { what: String, seconds: u64 },
    #[error("Could not parse item count from footer text '{0}'")]
    ParseFailure(String),
    #[error("WebDriver command '{command}' failed: {error}: {message}")]
    WebDriver {
        command: String,
        error: String,
        message: String,
    },
    #[error("Spreadsheet authentication failed: {0}")]
    Authentication(String),
    #[error("Spreadsheet document not found: '{0}'")]
    DocumentNotFound(String),
    #[error("Sheet '{sheet}' not found in document '{document}'")]
    SheetNotFound { document: String, sheet: String },
    #[error("Sheets API returned HTTP {status} for {operation}: {body}")]
    SheetsApi {
        status: u16,
        operation: String,
        body: String,
    },
    #[error("HTTP request failed: {0}")]
    Reqwest(String),
    #[error("Filesystem I/O error: {0}")]
    Io(String),
    #[error("JSON parsing error: {0}")]
    SerdeParse(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid argument provided: {0}")]
    Argument(String),
    #[error("Tokio task join error: {0}")]
    JoinError(String),
    #[error("Unexpected internal error: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Reqwest(e.to_string())
    }
}
impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::SerdeParse(e.to_string())
    }
}
impl From<JoinError> for AppError {
    fn from(e: JoinError) -> Self {
        AppError::JoinError(e.to_string())
    }
}
impl From<gcp_auth::Error> for AppError {
    fn from(e: gcp_auth::Error) -> Self {
        AppError::Authentication(e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn webdriver<S: Into<String>>(command: &str, error: S, message: S) -> AppError {
        AppError::WebDriver {
            command: command.to_string(),
            error: error.into(),
            message: message.into(),
        }
    }

    pub fn sheets_api<S: Into<String>>(status: u16, operation: &str, body: S) -> AppError {
        AppError::SheetsApi {
            status,
            operation: operation.to_string(),
            body: body.into(),
        }
    }

    pub fn timeout<S: Into<String>>(what: S, seconds: u64) -> AppError {
        AppError::InteractionTimeout {
            what: what.into(),
            seconds,
        }
    }

    /// Errors that can clear up on a later poll of the same element.
    pub fn is_transient_lookup(&self) -> bool {
        match self {
            AppError::ElementNotFound(_) => true,
            AppError::WebDriver { error, .. } => {
                error == "no such element" || error == "stale element reference"
            }
            _ => false,
        }
    }
}
