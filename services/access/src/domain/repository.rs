#![allow(async_fn_in_trait)]

use std::future::Future;

use crate::domain::ballot::SubmissionRecord;
use crate::domain::ledger::Ledger;
use crate::error::AccessServiceError;

/// Backing store for the code table and the issuance log.
pub trait LedgerStore: Send + Sync {
    /// Read the full ledger.
    ///
    /// A missing code table is `Configuration`; a missing issuance log is an
    /// empty one; unparsable or inconsistent data is `StorageRead`.
    async fn load(&self) -> Result<Ledger, AccessServiceError>;

    /// Replace the stored ledger and append its pending usage events.
    /// Readers never see a half-written store.
    async fn persist(&self, ledger: &Ledger) -> Result<(), AccessServiceError>;

    /// Run `work` while holding whatever lock keeps other processes sharing
    /// this store out. Stores private to one process need none.
    async fn exclusive<T, F>(&self, work: F) -> Result<T, AccessServiceError>
    where
        F: Future<Output = Result<T, AccessServiceError>>,
    {
        work.await
    }
}

/// Outbound channel that hands an access code to its requester.
pub trait CodeDelivery: Send + Sync {
    async fn send(&self, identity: &str, code: &str) -> Result<(), AccessServiceError>;
}

/// Append-only store of finalized ballot submissions.
pub trait SubmissionStore: Send + Sync {
    async fn append(&self, record: &SubmissionRecord) -> Result<(), AccessServiceError>;

    /// Every stored submission, oldest first. A store with no file yet is empty.
    async fn load_all(&self) -> Result<Vec<SubmissionRecord>, AccessServiceError>;
}
