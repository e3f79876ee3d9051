use std::future::Future;

use tokio::sync::Mutex;
use tracing::warn;

use crate::domain::ledger::Ledger;
use crate::domain::repository::LedgerStore;
use crate::error::AccessServiceError;

/// The single serialization point for ledger access.
///
/// Every load/mutate/persist cycle runs while holding one async mutex and the
/// store's cross-process lock, so neither two requests nor the service and
/// an operator tool can interleave their read-modify-write and lose an update.
pub struct CodeLedger<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S: LedgerStore> CodeLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run `work` under the ledger lock without touching the ledger itself.
    /// Used for files whose writers hold the same lock.
    pub async fn exclusive<T, F>(&self, work: F) -> Result<T, AccessServiceError>
    where
        F: Future<Output = Result<T, AccessServiceError>>,
    {
        let _guard = self.lock.lock().await;
        self.store.exclusive(work).await
    }

    /// Consistent read-only snapshot of the ledger.
    pub async fn snapshot(&self) -> Result<Ledger, AccessServiceError> {
        self.exclusive(self.store.load()).await
    }

    /// Load, apply `f`, and persist when `f` reports a change.
    ///
    /// `f` returns the result plus whether the ledger was modified; when it
    /// fails or reports no change nothing is written.
    pub async fn transact<T, F>(&self, f: F) -> Result<T, AccessServiceError>
    where
        F: FnOnce(&mut Ledger) -> Result<(T, bool), AccessServiceError>,
    {
        self.exclusive(async {
            let ledger = self.store.load().await?;
            self.apply_and_persist(ledger, f).await
        })
        .await
    }

    /// [`CodeLedger::transact`] for provisioning: a missing code table starts
    /// an empty ledger instead of failing.
    pub async fn transact_or_new<T, F>(&self, f: F) -> Result<T, AccessServiceError>
    where
        F: FnOnce(&mut Ledger) -> Result<(T, bool), AccessServiceError>,
    {
        self.exclusive(async {
            let ledger = match self.store.load().await {
                Ok(ledger) => ledger,
                Err(AccessServiceError::Configuration(reason)) => {
                    warn!(%reason, "code table missing, starting a new ledger");
                    Ledger::default()
                }
                Err(e) => return Err(e),
            };
            self.apply_and_persist(ledger, f).await
        })
        .await
    }

    async fn apply_and_persist<T, F>(&self, mut ledger: Ledger, f: F) -> Result<T, AccessServiceError>
    where
        F: FnOnce(&mut Ledger) -> Result<(T, bool), AccessServiceError>,
    {
        let (out, changed) = f(&mut ledger)?;
        if changed {
            self.store.persist(&ledger).await?;
        }
        Ok(out)
    }

    /// Like [`CodeLedger::transact`], but runs an async `finalize` step between
    /// the check and the mutation, still under the lock.
    ///
    /// `check` inspects the loaded ledger; `finalize` runs only if it passed;
    /// `apply` mutates and is followed by a persist only if `finalize` succeeded.
    pub async fn transact_with<C, Fut, A>(
        &self,
        check: C,
        finalize: Fut,
        apply: A,
    ) -> Result<(), AccessServiceError>
    where
        C: FnOnce(&Ledger) -> Result<(), AccessServiceError>,
        Fut: Future<Output = Result<(), AccessServiceError>>,
        A: FnOnce(&mut Ledger) -> Result<(), AccessServiceError>,
    {
        self.exclusive(async {
            let mut ledger = self.store.load().await?;
            check(&ledger)?;
            finalize.await?;
            apply(&mut ledger)?;
            self.store.persist(&ledger).await
        })
        .await
    }
}
