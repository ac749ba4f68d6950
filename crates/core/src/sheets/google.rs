use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::layout::column_letter;
use super::credential::Credential;
use super::traits::SheetClient;

const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SERVICE: &str = "Google Sheets";

/// Longest slice of an error body quoted back in `CoreError::Api`.
const MAX_ERROR_BODY: usize = 300;

/// Google Sheets API v4 client bound to one worksheet of one spreadsheet.
///
/// - **Lookup**: the spreadsheet is found by document name through Drive API v3.
/// - **Writes**: values go in with `USER_ENTERED`, so prices land as numbers.
/// - **Deletes**: `batchUpdate` + `deleteDimension`, which shifts rows up.
/// - **Auth**: bearer access token, see [`Credential`].
pub struct GoogleSheetsClient {
    client: Client,
    credential: Credential,
    spreadsheet_id: String,
    sheet_id: i64,
    sheet_title: String,
    label: String,
}

// ── Google API response types ───────────────────────────────────────

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    #[serde(rename = "sheetId")]
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl GoogleSheetsClient {
    /// Open the worksheet at `worksheet_index` of the spreadsheet named
    /// `document_name`. If several documents share the name, the first one
    /// Drive returns is used.
    pub async fn open(
        document_name: &str,
        worksheet_index: usize,
        credential: Credential,
    ) -> Result<Self, CoreError> {
        let client = build_http_client();

        let mut url = endpoint(DRIVE_URL, &[])?;
        let query = format!(
            "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
            document_name.replace('\\', "\\\\").replace('\'', "\\'")
        );
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("fields", "files(id)")
            .append_pair("pageSize", "1");

        let list: DriveFileList =
            fetch_json(client.get(url), &credential, "spreadsheet lookup").await?;
        let spreadsheet_id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| {
                CoreError::Connection(format!("Spreadsheet '{document_name}' not found"))
            })?;

        let mut client = Self::open_by_id_with(client, &spreadsheet_id, worksheet_index, credential).await?;
        client.label = format!("{SERVICE}: {document_name}");
        Ok(client)
    }

    /// Open a worksheet when the spreadsheet id is already known.
    pub async fn open_by_id(
        spreadsheet_id: &str,
        worksheet_index: usize,
        credential: Credential,
    ) -> Result<Self, CoreError> {
        Self::open_by_id_with(build_http_client(), spreadsheet_id, worksheet_index, credential).await
    }

    async fn open_by_id_with(
        client: Client,
        spreadsheet_id: &str,
        worksheet_index: usize,
        credential: Credential,
    ) -> Result<Self, CoreError> {
        let mut url = endpoint(SHEETS_URL, &[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties(sheetId,title)");

        let meta: SpreadsheetMeta =
            fetch_json(client.get(url), &credential, "spreadsheet metadata").await?;
        let sheet_count = meta.sheets.len();
        let properties = meta
            .sheets
            .into_iter()
            .nth(worksheet_index)
            .map(|s| s.properties)
            .ok_or_else(|| {
                CoreError::Connection(format!(
                    "Worksheet {worksheet_index} not found (spreadsheet has {sheet_count})"
                ))
            })?;

        log::info!(
            "opened worksheet '{}' (sheetId {}) of spreadsheet {spreadsheet_id}",
            properties.title,
            properties.sheet_id
        );

        Ok(Self {
            client,
            credential,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_id: properties.sheet_id,
            label: format!("{SERVICE}: {}", properties.title),
            sheet_title: properties.title,
        })
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    /// Run one structural request through `spreadsheets.batchUpdate`.
    async fn batch_update(&self, request: serde_json::Value, action: &str) -> Result<(), CoreError> {
        let target = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = endpoint(SHEETS_URL, &[target.as_str()])?;
        let body = json!({ "requests": [request] });
        send_checked(self.client.post(url).json(&body), &self.credential, action).await?;
        Ok(())
    }

    /// A1 range covering `cell_range` on this worksheet, e.g. `'Sheet1'!A2:F2`.
    fn range(&self, cell_range: &str) -> String {
        format!("{}!{cell_range}", quote_title(&self.sheet_title))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl SheetClient for GoogleSheetsClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>, CoreError> {
        let range = quote_title(&self.sheet_title);
        let url = endpoint(SHEETS_URL, &[self.spreadsheet_id.as_str(), "values", range.as_str()])?;
        let body: ValueRange = fetch_json(self.client.get(url), &self.credential, "read").await?;
        Ok(body.values)
    }

    async fn append_row(&self, values: Vec<String>) -> Result<(), CoreError> {
        self.append_rows(vec![values]).await
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), CoreError> {
        if rows.is_empty() {
            return Ok(());
        }
        let target = format!("{}:append", self.range("A1"));
        let mut url = endpoint(SHEETS_URL, &[self.spreadsheet_id.as_str(), "values", target.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let request = self.client.post(url).json(&json!({ "values": rows }));
        send_checked(request, &self.credential, "append").await?;
        Ok(())
    }

    async fn update_row(&self, row: u32, values: Vec<Option<String>>) -> Result<(), CoreError> {
        if row == 0 {
            return Err(CoreError::RowNotFound(row));
        }
        if values.is_empty() {
            return Ok(());
        }
        let last = column_letter(values.len() - 1);
        let range = self.range(&format!("A{row}:{last}{row}"));
        let mut url = endpoint(SHEETS_URL, &[self.spreadsheet_id.as_str(), "values", range.as_str()])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        // `null` cells are skipped by the API, leaving their content intact.
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [values],
        });
        send_checked(self.client.put(url).json(&body), &self.credential, "update").await?;
        Ok(())
    }

    async fn delete_row(&self, row: u32) -> Result<(), CoreError> {
        if row == 0 {
            return Err(CoreError::RowNotFound(row));
        }
        let request = json!({
            "deleteDimension": {
                "range": {
                    "sheetId": self.sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row - 1,
                    "endIndex": row,
                }
            }
        });
        self.batch_update(request, "delete").await
    }

    async fn insert_column(&self, column: usize) -> Result<(), CoreError> {
        let request = json!({
            "insertDimension": {
                "range": {
                    "sheetId": self.sheet_id,
                    "dimension": "COLUMNS",
                    "startIndex": column,
                    "endIndex": column + 1,
                },
                "inheritFromBefore": column > 0,
            }
        });
        self.batch_update(request, "insert column").await
    }
}

// ── HTTP helpers ────────────────────────────────────────────────────

fn build_http_client() -> Client {
    let builder = Client::builder();
    #[cfg(not(target_arch = "wasm32"))]
    let builder = builder.timeout(Duration::from_secs(30));
    builder.build().unwrap_or_else(|_| Client::new())
}

/// `base` with each of `segments` appended as an escaped path segment.
fn endpoint(base: &str, segments: &[&str]) -> Result<Url, CoreError> {
    let mut url = Url::parse(base).map_err(|e| CoreError::Api {
        service: SERVICE.into(),
        message: format!("Invalid endpoint {base}: {e}"),
    })?;
    if !segments.is_empty() {
        url.path_segments_mut()
            .map_err(|_| CoreError::Api {
                service: SERVICE.into(),
                message: format!("Endpoint {base} cannot take path segments"),
            })?
            .extend(segments);
    }
    Ok(url)
}

/// Worksheet titles are quoted in A1 ranges; embedded quotes are doubled.
pub(crate) fn quote_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

async fn send_checked(
    request: RequestBuilder,
    credential: &Credential,
    action: &str,
) -> Result<Response, CoreError> {
    let response = request.bearer_auth(credential.bearer()).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    log::warn!("{SERVICE} {action} failed with HTTP {status}");
    Err(status_error(status, action, &body))
}

/// Error for a non-success response: 401/403/404 are `Connection`, anything
/// else is `Api` quoting the start of the body.
fn status_error(status: StatusCode, action: &str, body: &str) -> CoreError {
    match status.as_u16() {
        401 | 403 => CoreError::Connection(format!(
            "{SERVICE} rejected the credential during {action} (HTTP {status})"
        )),
        404 => CoreError::Connection(format!(
            "{SERVICE} document not found during {action} (HTTP {status})"
        )),
        _ => {
            let excerpt: String = body.chars().take(MAX_ERROR_BODY).collect();
            CoreError::Api {
                service: SERVICE.into(),
                message: format!("{action} failed with HTTP {status}: {excerpt}"),
            }
        }
    }
}

async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    credential: &Credential,
    action: &str,
) -> Result<T, CoreError> {
    send_checked(request, credential, action)
        .await?
        .json()
        .await
        .map_err(|e| CoreError::Api {
            service: SERVICE.into(),
            message: format!("Failed to parse {action} response: {e}"),
        })
}
