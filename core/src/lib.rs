use std::collections::HashMap;

use aws_sdk_dynamodb::{
    error::SdkError,
    operation::{put_item::PutItemError, scan::ScanError},
    types::AttributeValue,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_dynamo::aws_sdk_dynamodb_1::{from_items, to_item};
use uuid::Uuid;

/// How many entries a retrieve returns at most.
pub const RECENT_LOG_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request body is missing")]
    MissingBody,
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("Message is required")]
    MissingMessage,
    #[error("failed to save log entry: {0}")]
    Put(#[from] SdkError<PutItemError>),
    #[error("failed to scan log entries: {0}")]
    Scan(#[from] SdkError<ScanError>),
    #[error("bad item in log table: {0}")]
    Item(#[from] serde_dynamo::Error),
}

/// Inbound append payload. `Message` stays optional here so a missing field
/// turns into an explicit validation error instead of a serde one.
#[derive(Debug, Deserialize)]
pub struct LogRequest {
    #[serde(rename = "Severity")]
    pub severity: Option<String>,
    #[serde(rename = "Message")]
    pub message: Option<String>,
}

impl LogRequest {
    pub fn from_json(body: &[u8]) -> Result<LogRequest, Error> {
        if body.is_empty() {
            return Err(Error::MissingBody);
        }
        Ok(serde_json::from_slice(body)?)
    }
}

/// One persisted log record, serialized with the table's attribute names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DateTime")]
    pub date_time: String,
    #[serde(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl LogEntry {
    /// Build a fresh entry from a request. The id and timestamp are generated
    /// here; nothing about the entry changes afterwards.
    pub fn from_request(request: LogRequest) -> Result<LogEntry, Error> {
        let message = request.message.ok_or(Error::MissingMessage)?;

        Ok(LogEntry {
            id: Uuid::new_v4().to_string(),
            date_time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            severity: request.severity.unwrap_or_else(|| "info".to_string()),
            message,
        })
    }
}

/// Sort newest first by `DateTime` and keep the top [RECENT_LOG_LIMIT].
///
/// Every timestamp carries the same `+00:00` offset and microsecond precision,
/// so string order is time order. The sort is stable; entries with identical
/// timestamps keep their scan order.
pub fn most_recent_first(mut entries: Vec<LogEntry>) -> Vec<LogEntry> {
    entries.sort_by(|a, b| b.date_time.cmp(&a.date_time));
    entries.truncate(RECENT_LOG_LIMIT);
    entries
}

/// Handle on the log table. The inner client is reference-counted, so one
/// `Store` gets built at startup and cloned wherever a handler needs it.
#[derive(Debug, Clone)]
pub struct Store {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl Store {
    pub fn new(client: aws_sdk_dynamodb::Client, table: impl Into<String>) -> Store {
        Store {
            client,
            table: table.into(),
        }
    }

    /// Build from the ambient AWS config and `DYNAMODB_TABLE`. A missing
    /// table name is a deployment mistake, so this panics at startup rather
    /// than mid-request.
    pub async fn from_env() -> Store {
        let table = std::env::var("DYNAMODB_TABLE").expect("DYNAMODB_TABLE not set");
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Store::new(aws_sdk_dynamodb::Client::new(&config), table)
    }

    pub async fn save(&self, entry: &LogEntry) -> Result<(), Error> {
        let item = to_item(entry)?;
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await?;

        tracing::debug!(id = %entry.id, "saved log entry");
        Ok(())
    }

    /// The most recent entries, newest first, at most [RECENT_LOG_LIMIT].
    ///
    /// Known limitation: this scans the whole table into memory before
    /// sorting, which is fine at the volumes the table sees today. If it ever
    /// grows past that, the fix is a date-keyed index, not a bigger scan.
    pub async fn recent_logs(&self) -> Result<Vec<LogEntry>, Error> {
        let mut items: Vec<HashMap<String, AttributeValue>> = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(&self.table)
                .set_exclusive_start_key(start_key)
                .send()
                .await?;
            items.extend(page.items.unwrap_or_default());
            start_key = page.last_evaluated_key;
            if start_key.is_none() {
                break;
            }
        }

        tracing::debug!(count = items.len(), "scanned log table");

        let entries = from_items(items)?;
        Ok(most_recent_first(entries))
    }
}
