use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::ledger::Ledger;
use crate::domain::repository::LedgerStore;
use crate::domain::types::{Code, IssuanceRecord, UsageEvent};
use crate::error::AccessServiceError;
use crate::infra::fs::{append_synced, read_if_exists, with_file_lock, write_atomic};

const CODE_HEADERS: [&str; 3] = ["code", "issued", "used"];
const ISSUANCE_HEADERS: [&str; 3] = ["identity", "code", "issued_at"];
const USAGE_HEADERS: [&str; 5] = ["timestamp", "event", "email", "code", "source"];

/// Value of the usage log's `source` column for events this service writes.
pub const USAGE_SOURCE: &str = "access";

// ── Row types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct CodeRow {
    code: String,
    #[serde(deserialize_with = "flag")]
    issued: bool,
    #[serde(deserialize_with = "flag")]
    used: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct IssuanceRow {
    identity: String,
    code: String,
    #[serde(
        serialize_with = "pulse_core::serde::to_rfc3339_ms",
        deserialize_with = "pulse_core::serde::from_rfc3339"
    )]
    issued_at: DateTime<Utc>,
}

/// Accepts the spellings spreadsheet tools write for booleans.
fn flag<'de, D>(d: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(d)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("not a boolean: {other:?}"))),
    }
}

#[derive(Debug, Serialize)]
struct UsageRow<'a> {
    #[serde(serialize_with = "pulse_core::serde::to_rfc3339_ms")]
    timestamp: DateTime<Utc>,
    event: &'static str,
    email: &'a str,
    code: &'a str,
    source: &'static str,
}

impl<'a> From<&'a UsageEvent> for UsageRow<'a> {
    fn from(event: &'a UsageEvent) -> Self {
        Self {
            timestamp: event.at,
            event: event.kind.as_str(),
            email: &event.identity,
            code: &event.code,
            source: USAGE_SOURCE,
        }
    }
}

fn code_from_row(row: CodeRow) -> Code {
    Code {
        value: row.code,
        issued: row.issued,
        used: row.used,
    }
}

fn record_from_row(row: IssuanceRow) -> IssuanceRecord {
    IssuanceRecord {
        identity: row.identity,
        code: row.code,
        issued_at: row.issued_at,
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Ledger kept as CSV files: the code table, the issuance log and the
/// append-only usage log.
///
/// Every process opening the same code table locks `<code table>.lock`
/// around its load/persist cycles.
#[derive(Debug, Clone)]
pub struct CsvLedgerStore {
    pub codes_path: PathBuf,
    pub issuance_path: PathBuf,
    pub usage_log_path: PathBuf,
}

impl CsvLedgerStore {
    pub fn new(
        codes_path: impl Into<PathBuf>,
        issuance_path: impl Into<PathBuf>,
        usage_log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            codes_path: codes_path.into(),
            issuance_path: issuance_path.into(),
            usage_log_path: usage_log_path.into(),
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.codes_path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    async fn append_events(&self, events: &[UsageEvent]) -> Result<(), AccessServiceError> {
        if events.is_empty() {
            return Ok(());
        }
        let rows: Vec<UsageRow<'_>> = events.iter().map(UsageRow::from).collect();
        match read_if_exists(&self.usage_log_path).await?.filter(|b| !b.is_empty()) {
            None => {
                let content = render_rows(&USAGE_HEADERS, &rows).context("render usage log")?;
                write_atomic(&self.usage_log_path, &content).await?;
            }
            Some(existing) => {
                let content = render_rows(&[], &rows).context("render usage events")?;
                append_synced(&self.usage_log_path, !existing.ends_with(b"\n"), &content).await?;
            }
        }
        Ok(())
    }
}

fn parse_rows<T>(bytes: &[u8], path: &Path) -> Result<Vec<T>, AccessServiceError>
where
    T: for<'de> Deserialize<'de>,
{
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes)
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            // Line 1 is the header.
            row.map_err(|e| {
                AccessServiceError::StorageRead(format!("{} line {}: {e}", path.display(), i + 2))
            })
        })
        .collect()
}

fn render_rows<T: Serialize>(headers: &[&str], rows: &[T]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    if !headers.is_empty() {
        wtr.write_record(headers)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv buffer: {}", e.error()))
}

impl LedgerStore for CsvLedgerStore {
    async fn load(&self) -> Result<Ledger, AccessServiceError> {
        let code_bytes = read_if_exists(&self.codes_path).await?.ok_or_else(|| {
            AccessServiceError::Configuration(format!(
                "{} does not exist; provision codes first",
                self.codes_path.display()
            ))
        })?;
        let codes = parse_rows::<CodeRow>(&code_bytes, &self.codes_path)?
            .into_iter()
            .map(code_from_row)
            .collect();

        let records = match read_if_exists(&self.issuance_path).await? {
            Some(bytes) => parse_rows::<IssuanceRow>(&bytes, &self.issuance_path)?
                .into_iter()
                .map(record_from_row)
                .collect(),
            None => Vec::new(),
        };

        Ok(Ledger::from_parts(codes, records)?)
    }

    async fn persist(&self, ledger: &Ledger) -> Result<(), AccessServiceError> {
        let code_rows: Vec<CodeRow> = ledger
            .codes()
            .iter()
            .map(|c| CodeRow {
                code: c.value.clone(),
                issued: c.issued,
                used: c.used,
            })
            .collect();
        let issuance_rows: Vec<IssuanceRow> = ledger
            .records()
            .iter()
            .map(|r| IssuanceRow {
                identity: r.identity.clone(),
                code: r.code.clone(),
                issued_at: r.issued_at,
            })
            .collect();

        let code_bytes = render_rows(&CODE_HEADERS, &code_rows).context("render code table")?;
        let issuance_bytes =
            render_rows(&ISSUANCE_HEADERS, &issuance_rows).context("render issuance log")?;

        // Code table first: an interrupted persist can then only strand an
        // issued code without its record, never bind a record to a free code.
        write_atomic(&self.codes_path, &code_bytes).await?;
        write_atomic(&self.issuance_path, &issuance_bytes).await?;
        self.append_events(ledger.pending_events()).await
    }

    async fn exclusive<T, F>(&self, work: F) -> Result<T, AccessServiceError>
    where
        F: Future<Output = Result<T, AccessServiceError>>,
    {
        with_file_lock(&self.lock_path(), work).await
    }
}
