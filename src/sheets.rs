//! Secondary sink: appends each submission as a row to a spreadsheet
//! through an HTTP append endpoint.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::config::SheetsConfig;
use crate::submission::mapper::NormalizedRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkOutcome {
    Appended,
    /// The request did not complete within the configured timeout.
    TimedOut,
    /// The endpoint could not be reached or is not configured.
    Unreachable(String),
    /// The endpoint answered but refused the row.
    Rejected(String),
}

impl SinkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SinkOutcome::Appended)
    }

    pub fn error(&self) -> Option<String> {
        match self {
            SinkOutcome::Appended => None,
            SinkOutcome::TimedOut => Some("Request timed out".to_string()),
            SinkOutcome::Unreachable(e) | SinkOutcome::Rejected(e) => Some(e.clone()),
        }
    }
}

#[async_trait]
pub trait SheetSink: Send + Sync {
    async fn append(&self, record: &NormalizedRecord, raw: &Map<String, Value>) -> SinkOutcome;
}

pub struct HttpSheetSink {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpSheetSink {
    pub fn new(config: &SheetsConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("Failed to build sheets client: {e}"))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl SheetSink for HttpSheetSink {
    async fn append(&self, record: &NormalizedRecord, raw: &Map<String, Value>) -> SinkOutcome {
        let schema = record.variant.schema();
        let body = json!({
            "sheet": record.variant.id(),
            "headers": schema.sheet_headers,
            "row": sheet_row(record, Utc::now()),
            "submission": raw,
        });

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let started = std::time::Instant::now();
        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return SinkOutcome::TimedOut,
            Err(e) => return SinkOutcome::Unreachable(format!("Fetch error: {e}")),
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) if e.is_timeout() => return SinkOutcome::TimedOut,
            Err(e) => return SinkOutcome::Unreachable(format!("Fetch error: {e}")),
        };
        tracing::debug!(
            "Sheets endpoint answered {status} in {}ms",
            started.elapsed().as_millis()
        );

        classify(status, &text)
    }
}

/// Read the endpoint's answer. A 2xx whose body is not JSON counts as a
/// transport failure, not an append.
fn classify(status: reqwest::StatusCode, text: &str) -> SinkOutcome {
    let parsed: Option<Value> = serde_json::from_str(text).ok();
    let error_message = parsed
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.as_str())
        .map(|s| s.to_string());

    if !status.is_success() {
        return SinkOutcome::Rejected(error_message.unwrap_or_else(|| format!("HTTP {status}")));
    }

    let Some(parsed) = parsed else {
        return SinkOutcome::Unreachable("Fetch error: invalid response body".to_string());
    };

    match parsed.get("success").and_then(|s| s.as_bool()) {
        Some(false) => {
            SinkOutcome::Rejected(error_message.unwrap_or_else(|| "Unknown error".to_string()))
        }
        _ => SinkOutcome::Appended,
    }
}

/// Used when no spreadsheet endpoint is configured.
pub struct UnconfiguredSink;

#[async_trait]
impl SheetSink for UnconfiguredSink {
    async fn append(&self, _record: &NormalizedRecord, _raw: &Map<String, Value>) -> SinkOutcome {
        SinkOutcome::Unreachable("Spreadsheet endpoint not configured".to_string())
    }
}

/// Lay a record out in its variant's spreadsheet columns. Every header gets
/// a string value; missing fields are empty.
pub fn sheet_row(record: &NormalizedRecord, timestamp: DateTime<Utc>) -> Map<String, Value> {
    let mut row = Map::new();
    for header in record.variant.schema().sheet_headers {
        let value = match *header {
            "timestamp" => timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            "form_type" => record.variant.id().to_string(),
            "first_name" | "full_name" => record.full_name.clone().unwrap_or_default(),
            "email" => record.email_address.clone().unwrap_or_default(),
            "whatsapp" => record.whatsapp_number.clone().unwrap_or_default(),
            "form_data" => Value::Object(record.form_data.clone()).to_string(),
            field => match record.form_data.get(field) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            },
        };
        row.insert(header.to_string(), Value::String(value));
    }
    row
}
