//! Google Sheets v4 REST client.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument};

use repere_core::errors::CoreResult;
use repere_core::ports::{SheetGateway, SheetRange, SheetRow};

use crate::auth::{ServiceAccountKey, TokenProvider};
use crate::error::{SheetsError, SheetsResult};
use crate::throttle::Throttle;

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Quotes a sheet title for use in an A1 range.
pub fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Cell values come back formatted as strings; anything else is rendered as JSON.
pub(crate) fn cell_to_string(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn api_error(status: u16, body: &str) -> SheetsError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    SheetsError::Api { status, message }
}

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    auth: TokenProvider,
    throttle: Throttle,
    base_url: String,
    /// spreadsheet id -> sheet title -> sheet id
    sheet_ids: RwLock<HashMap<String, HashMap<String, i64>>>,
}

impl std::fmt::Debug for GoogleSheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleSheetsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GoogleSheetsClient {
    pub fn new(key: ServiceAccountKey, min_interval: Duration) -> SheetsResult<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let auth = TokenProvider::new(key, http.clone())?;
        Ok(Self {
            http,
            auth,
            throttle: Throttle::new(min_interval),
            base_url: DEFAULT_BASE_URL.to_string(),
            sheet_ids: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> SheetsResult<reqwest::Response> {
        let token = self.auth.access_token().await?;
        self.throttle.wait().await;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &body))
    }

    async fn get_values(&self, spreadsheet_id: &str, range: &str) -> SheetsResult<Vec<SheetRow>> {
        let url = self.values_url(spreadsheet_id, range);
        let response = self
            .send(self.http.get(url).query(&[("majorDimension", "ROWS")]))
            .await?;
        let range: ValueRange = response.json().await?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    fn cached_sheet(&self, spreadsheet_id: &str, title: &str) -> Option<i64> {
        self.sheet_ids.read().get(spreadsheet_id)?.get(title).copied()
    }

    /// Fetches sheet titles and ids, replacing the cached entry.
    async fn refresh_metadata(&self, spreadsheet_id: &str) -> SheetsResult<HashMap<String, i64>> {
        let url = format!("{}/{}", self.base_url, urlencoding::encode(spreadsheet_id));
        let response = self
            .send(
                self.http
                    .get(url)
                    .query(&[("fields", "sheets.properties(sheetId,title)")]),
            )
            .await?;
        let metadata: SpreadsheetMetadata = response.json().await?;
        let sheets: HashMap<String, i64> = metadata
            .sheets
            .into_iter()
            .map(|sheet| (sheet.properties.title, sheet.properties.sheet_id))
            .collect();
        debug!(spreadsheet_id, sheets = sheets.len(), "Sheet metadata refreshed");
        self.sheet_ids
            .write()
            .insert(spreadsheet_id.to_string(), sheets.clone());
        Ok(sheets)
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str, headers: &[String]) -> SheetsResult<()> {
        let url = format!("{}/{}:batchUpdate", self.base_url, urlencoding::encode(spreadsheet_id));
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self.send(self.http.post(url).json(&body)).await?;
        let reply: Value = response.json().await?;
        if let Some(sheet_id) = reply["replies"][0]["addSheet"]["properties"]["sheetId"].as_i64() {
            self.sheet_ids
                .write()
                .entry(spreadsheet_id.to_string())
                .or_default()
                .insert(title.to_string(), sheet_id);
        }

        if !headers.is_empty() {
            let range = format!("{}!A1", quote_title(title));
            let url = self.values_url(spreadsheet_id, &range);
            let body = json!({ "range": range, "majorDimension": "ROWS", "values": [headers] });
            self.send(
                self.http
                    .put(url)
                    .query(&[("valueInputOption", "RAW")])
                    .json(&body),
            )
            .await?;
        }
        info!(spreadsheet_id, title, "Created status sheet");
        Ok(())
    }
}

#[async_trait]
impl SheetGateway for GoogleSheetsClient {
    #[instrument(skip(self, range), fields(range = %range.to_a1()))]
    async fn read_rows(&self, spreadsheet_id: &str, range: &SheetRange) -> CoreResult<Vec<SheetRow>> {
        Ok(self.get_values(spreadsheet_id, &range.to_a1()).await?)
    }

    #[instrument(skip(self, values))]
    async fn append_row(&self, spreadsheet_id: &str, sheet_title: &str, values: &[String]) -> CoreResult<()> {
        let range = format!("{}!A:Z", quote_title(sheet_title));
        let url = format!("{}:append", self.values_url(spreadsheet_id, &range));
        let body = json!({ "majorDimension": "ROWS", "values": [values] });
        self.send(
            self.http
                .post(url)
                .query(&[("valueInputOption", "USER_ENTERED"), ("insertDataOption", "INSERT_ROWS")])
                .json(&body),
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, headers))]
    async fn ensure_sheet_exists(&self, spreadsheet_id: &str, title: &str, headers: &[String]) -> CoreResult<bool> {
        if self.cached_sheet(spreadsheet_id, title).is_some() {
            return Ok(true);
        }
        if self.refresh_metadata(spreadsheet_id).await?.contains_key(title) {
            return Ok(true);
        }
        self.add_sheet(spreadsheet_id, title, headers).await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn row_count(&self, spreadsheet_id: &str, sheet_title: Option<&str>) -> CoreResult<usize> {
        let range = SheetRange::columns(sheet_title, 'A', 'A').to_a1();
        Ok(self.get_values(spreadsheet_id, &range).await?.len())
    }
}
