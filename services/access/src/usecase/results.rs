use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::ballot::{COL_REGION, SubmissionRecord, TALLIED_COLUMNS};
use crate::domain::repository::{LedgerStore, SubmissionStore};
use crate::error::AccessServiceError;
use crate::usecase::ledger::CodeLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnTally {
    pub column: String,
    pub counts: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub total: u64,
    pub region: Option<String>,
    pub columns: Vec<ColumnTally>,
}

/// Count each distinct non-empty value of `column`, most frequent first,
/// ties broken by value.
pub fn tally(records: &[&SubmissionRecord], column: &str) -> Vec<ValueCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for value in records.iter().filter_map(|r| r.get(column)) {
        let value = value.trim();
        if !value.is_empty() {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut counts: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_owned(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

pub struct ResultsSummaryUseCase<S, B>
where
    S: LedgerStore,
    B: SubmissionStore,
{
    pub ledger: Arc<CodeLedger<S>>,
    pub submissions: B,
}

impl<S, B> ResultsSummaryUseCase<S, B>
where
    S: LedgerStore,
    B: SubmissionStore,
{
    /// Aggregate answer counts, optionally restricted to one region.
    ///
    /// Submissions are appended under the ledger lock, so reading under it
    /// never sees a half-written row.
    pub async fn execute(&self, region: Option<String>) -> Result<ResultsSummary, AccessServiceError> {
        let all = self.ledger.exclusive(self.submissions.load_all()).await?;
        let region = region.map(|r| r.trim().to_owned()).filter(|r| !r.is_empty());
        let selected: Vec<&SubmissionRecord> = all
            .iter()
            .filter(|r| match &region {
                Some(want) => r.get(COL_REGION).map(str::trim) == Some(want.as_str()),
                None => true,
            })
            .collect();

        let columns = TALLIED_COLUMNS
            .iter()
            .map(|&column| ColumnTally {
                column: column.to_owned(),
                counts: tally(&selected, column),
            })
            .collect();

        Ok(ResultsSummary {
            total: selected.len() as u64,
            region,
            columns,
        })
    }
}
