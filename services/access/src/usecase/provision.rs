use std::sync::Arc;

use rand::RngExt;
use tracing::info;

use crate::domain::repository::LedgerStore;
use crate::domain::types::{CODE_CHARSET, CODE_LEN};
use crate::error::AccessServiceError;
use crate::usecase::ledger::CodeLedger;

/// Give up after this many consecutive collisions with existing codes.
const MAX_COLLISIONS: usize = 1_000;

pub fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

pub struct ProvisionCodesUseCase<S: LedgerStore> {
    pub ledger: Arc<CodeLedger<S>>,
}

impl<S: LedgerStore> ProvisionCodesUseCase<S> {
    /// Append `count` fresh codes to the code table, creating it if missing.
    /// Returns the new codes in stored order.
    pub async fn execute(&self, count: usize) -> Result<Vec<String>, AccessServiceError> {
        self.execute_with(count, generate_code).await
    }

    /// Same as [`ProvisionCodesUseCase::execute`] with a caller-supplied generator.
    pub async fn execute_with<G>(
        &self,
        count: usize,
        mut generate: G,
    ) -> Result<Vec<String>, AccessServiceError>
    where
        G: FnMut() -> String,
    {
        let added = self
            .ledger
            .transact_or_new(|ledger| {
                let mut added = Vec::with_capacity(count);
                let mut collisions = 0;
                while added.len() < count {
                    let candidate = generate();
                    if ledger.add_code(&candidate) {
                        added.push(candidate);
                        collisions = 0;
                    } else {
                        collisions += 1;
                        if collisions >= MAX_COLLISIONS {
                            return Err(AccessServiceError::Internal(anyhow::anyhow!(
                                "code generator keeps producing existing codes"
                            )));
                        }
                    }
                }
                let changed = !added.is_empty();
                Ok((added, changed))
            })
            .await?;
        info!(added = added.len(), "access codes provisioned");
        Ok(added)
    }
}
