use thiserror::Error;

use repere_core::errors::CoreError;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl SheetsError {
    /// Rate limiting, server-side failures and network errors may clear up
    /// on the next pass.
    pub fn is_transient(&self) -> bool {
        match self {
            SheetsError::Http(error) => error.is_timeout() || error.is_connect() || error.is_request(),
            SheetsError::Api { status, .. } => *status == 429 || *status >= 500,
            SheetsError::Auth(_) | SheetsError::Json(_) | SheetsError::MissingCredentials(_) => false,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for SheetsError {
    fn from(error: jsonwebtoken::errors::Error) -> Self {
        SheetsError::Auth(error.to_string())
    }
}

impl From<SheetsError> for CoreError {
    fn from(error: SheetsError) -> Self {
        let transient = error.is_transient();
        CoreError::gateway(error.to_string(), transient)
    }
}

pub type SheetsResult<T> = Result<T, SheetsError>;
