// Remote spreadsheet loader - one big worksheet, rows partitioned by the
// Sheet column. Talks to the Google Sheets / Drive REST APIs directly.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::loader::parse_date_str;
use crate::model::{
    find_category_column, CallRecord, SourceTable, CATEGORY_COLUMN, DATE_COLUMN, SHEET_COLUMN,
    SHEET_NAMES,
};
use std::collections::HashMap;

/// Stored Google credential, as written by the usual OAuth tooling.
///
/// Both `token` and `access_token` spellings are accepted on read. When a
/// refresh token is present it is exchanged for a fresh access token at
/// startup; otherwise the stored access token is used as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, alias = "access_token")]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

pub fn load_credentials(path: &Path) -> Result<StoredCredentials> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
    let creds: StoredCredentials = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid credentials file: {}", path.display()))?;
    Ok(creds)
}

/// Fetch the named spreadsheet and partition it into the four source tables.
///
/// Runs once at startup. Auth, lookup, or fetch failures abort the load;
/// there are no retries.
pub fn fetch_spreadsheet(credentials_path: &Path, title: &str) -> Result<Vec<SourceTable>> {
    let creds = load_credentials(credentials_path)?;
    let client = Client::new();

    let token = access_token(&client, &creds)?;
    let spreadsheet_id = lookup_spreadsheet_id(&client, &token, title)?;
    let worksheet = first_worksheet_title(&client, &token, &spreadsheet_id)?;
    let grid = fetch_values(&client, &token, &spreadsheet_id, &worksheet)?;

    partition_grid(&grid)
}

/// Obtain a usable access token from the stored credential.
fn access_token(client: &Client, creds: &StoredCredentials) -> Result<String> {
    let refresh_token = match &creds.refresh_token {
        Some(refresh_token) => refresh_token,
        None => {
            return creds
                .token
                .clone()
                .ok_or_else(|| anyhow!("Credentials file has neither refresh_token nor token"));
        }
    };

    let client_id = creds
        .client_id
        .as_deref()
        .context("Credentials file has refresh_token but no client_id")?;
    let client_secret = creds.client_secret.as_deref().unwrap_or_default();

    let resp = client
        .post(&creds.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .context("Token refresh request failed")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        bail!("Token refresh failed ({}): {}", status, body);
    }

    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
    }

    let body: TokenResponse = resp.json().context("Token response missing access_token")?;
    Ok(body.access_token)
}

/// Resolve a spreadsheet id from its title via the Drive files search.
fn lookup_spreadsheet_id(client: &Client, token: &str, title: &str) -> Result<String> {
    let query = format!(
        "name = '{}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        title.replace('\'', "\\'")
    );
    let url = format!(
        "https://www.googleapis.com/drive/v3/files?q={}&fields=files(id,name)&pageSize=1",
        urlencoding::encode(&query)
    );

    let body: serde_json::Value = get_json(client, token, &url)
        .with_context(|| format!("Drive lookup failed for spreadsheet '{}'", title))?;

    body["files"]
        .as_array()
        .and_then(|files| files.first())
        .and_then(|file| file["id"].as_str())
        .map(|id| id.to_string())
        .ok_or_else(|| anyhow!("Spreadsheet '{}' not found", title))
}

/// Title of the spreadsheet's first worksheet.
fn first_worksheet_title(client: &Client, token: &str, spreadsheet_id: &str) -> Result<String> {
    let url = format!(
        "https://sheets.googleapis.com/v4/spreadsheets/{}?fields=sheets.properties.title",
        spreadsheet_id
    );

    let body: serde_json::Value =
        get_json(client, token, &url).context("Spreadsheet metadata fetch failed")?;

    body["sheets"]
        .as_array()
        .and_then(|sheets| sheets.first())
        .and_then(|sheet| sheet["properties"]["title"].as_str())
        .map(|title| title.to_string())
        .ok_or_else(|| anyhow!("Spreadsheet {} has no worksheets", spreadsheet_id))
}

/// Read the full grid of a worksheet as rows of strings.
fn fetch_values(
    client: &Client,
    token: &str,
    spreadsheet_id: &str,
    worksheet: &str,
) -> Result<Vec<Vec<String>>> {
    let url = format!(
        "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
        spreadsheet_id,
        urlencoding::encode(worksheet)
    );

    #[derive(Deserialize)]
    struct ValueRange {
        #[serde(default)]
        values: Vec<Vec<serde_json::Value>>,
    }

    let body: ValueRange = get_json(client, token, &url)
        .with_context(|| format!("Values fetch failed for worksheet '{}'", worksheet))?;

    Ok(body
        .values
        .into_iter()
        .map(|row| row.iter().map(value_to_string).collect())
        .collect())
}

fn get_json<T: serde::de::DeserializeOwned>(client: &Client, token: &str, url: &str) -> Result<T> {
    let resp = client.get(url).bearer_auth(token).send()?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        bail!("API error {}: {}", status, body);
    }

    Ok(resp.json()?)
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Partition a header-first grid into the four source tables by the value
/// of its Sheet column.
///
/// Rows whose sheet value matches none of the declared source names are
/// dropped; a source name with no rows yields an empty table. A grid whose
/// header row has no recognized category spelling is a fatal load error.
pub fn partition_grid(grid: &[Vec<String>]) -> Result<Vec<SourceTable>> {
    let header_cells = grid.first().context("Spreadsheet grid is empty")?;
    let mut columns = header_cells.clone();

    let category_idx = find_category_column(&columns)
        .context("Category column not found in spreadsheet grid")?;
    columns[category_idx] = CATEGORY_COLUMN.to_string();

    let date_idx = columns
        .iter()
        .position(|h| h == DATE_COLUMN)
        .context("Date column not found in spreadsheet grid")?;
    let sheet_idx = columns
        .iter()
        .position(|h| h == SHEET_COLUMN)
        .context("Sheet column not found in spreadsheet grid")?;

    let mut sources: Vec<SourceTable> = SHEET_NAMES
        .iter()
        .map(|name| SourceTable {
            name: name.to_string(),
            columns: columns.clone(),
            rows: Vec::new(),
        })
        .collect();

    for cells in &grid[1..] {
        let sheet = match cells.get(sheet_idx) {
            Some(sheet) => sheet.as_str(),
            None => continue,
        };
        let source = match sources.iter_mut().find(|s| s.name == sheet) {
            Some(source) => source,
            None => continue,
        };
        let date = match cells.get(date_idx).and_then(|s| parse_date_str(s)) {
            Some(date) => date,
            None => continue,
        };
        let category = cells.get(category_idx).cloned().unwrap_or_default();

        let mut extra = HashMap::new();
        for (idx, column) in columns.iter().enumerate() {
            if idx == date_idx || idx == category_idx || idx == sheet_idx {
                continue;
            }
            extra.insert(column.clone(), cells.get(idx).cloned().unwrap_or_default());
        }

        source.rows.push(CallRecord {
            date,
            category,
            sheet: sheet.to_string(),
            extra,
        });
    }

    Ok(sources)
}
