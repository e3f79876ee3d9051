use std::path::PathBuf;

use anyhow::Context as _;

use crate::domain::ballot::SubmissionRecord;
use crate::domain::repository::SubmissionStore;
use crate::error::AccessServiceError;
use crate::infra::fs::{append_synced, read_if_exists, write_atomic};

/// Ballot submissions kept as one CSV file with a header row.
#[derive(Debug, Clone)]
pub struct CsvSubmissionStore {
    pub path: PathBuf,
}

impl CsvSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn header_of(&self, bytes: &[u8]) -> Result<Vec<String>, AccessServiceError> {
        let mut rdr = csv::Reader::from_reader(bytes);
        let headers = rdr.headers().map_err(|e| {
            AccessServiceError::StorageRead(format!("{}: {e}", self.path.display()))
        })?;
        Ok(headers.iter().map(str::to_owned).collect())
    }
}

fn render_line<'a>(fields: impl IntoIterator<Item = &'a str>) -> anyhow::Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(fields)?;
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv buffer: {}", e.error()))
}

impl SubmissionStore for CsvSubmissionStore {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), AccessServiceError> {
        let row = render_line(record.values()).context("render submission row")?;

        let existing = read_if_exists(&self.path).await?;
        let Some(bytes) = existing.filter(|b| !b.is_empty()) else {
            let mut content = render_line(record.names()).context("render submission header")?;
            content.extend_from_slice(&row);
            write_atomic(&self.path, &content).await?;
            return Ok(());
        };

        let header = self.header_of(&bytes)?;
        if !header.iter().map(String::as_str).eq(record.names()) {
            return Err(AccessServiceError::StorageRead(format!(
                "{} has different columns than the submission",
                self.path.display()
            )));
        }

        append_synced(&self.path, !bytes.ends_with(b"\n"), &row).await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<SubmissionRecord>, AccessServiceError> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(Vec::new());
        };
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let headers = rdr
            .headers()
            .map_err(|e| AccessServiceError::StorageRead(format!("{}: {e}", self.path.display())))?
            .clone();

        rdr.records()
            .enumerate()
            .map(|(i, row)| {
                let row = row.map_err(|e| {
                    AccessServiceError::StorageRead(format!(
                        "{} line {}: {e}",
                        self.path.display(),
                        i + 2
                    ))
                })?;
                let columns = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| (name.to_owned(), value.to_owned()))
                    .collect();
                Ok(SubmissionRecord::from_columns(columns))
            })
            .collect()
    }
}
