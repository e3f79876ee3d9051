use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::domain::ledger::Ledger;
use crate::domain::repository::LedgerStore;
use crate::domain::types::{UsageEvent, UsageEventKind, ValidationResult};
use crate::error::AccessServiceError;
use crate::usecase::ledger::CodeLedger;

fn ensure_redeemable(ledger: &Ledger, code: &str) -> Result<(), AccessServiceError> {
    match ledger.validate(code) {
        ValidationResult::Valid => Ok(()),
        ValidationResult::NotFound => Err(AccessServiceError::CodeNotFound),
        ValidationResult::AlreadyUsed => Err(AccessServiceError::CodeAlreadyUsed),
    }
}

/// Mark `code` used and log the redemption without naming its holder.
fn consume(ledger: &mut Ledger, code: &str, kind: UsageEventKind) -> Result<(), AccessServiceError> {
    ledger.mark_used(code)?;
    ledger.record_event(UsageEvent {
        at: Utc::now(),
        kind,
        identity: String::new(),
        code: code.to_owned(),
    });
    Ok(())
}

// ── ValidateCode ──────────────────────────────────────────────────────────────

pub struct ValidateCodeUseCase<S: LedgerStore> {
    pub ledger: Arc<CodeLedger<S>>,
}

impl<S: LedgerStore> ValidateCodeUseCase<S> {
    /// Read-only check of a user-entered code.
    pub async fn execute(&self, code: &str) -> Result<ValidationResult, AccessServiceError> {
        let ledger = self.ledger.snapshot().await?;
        Ok(ledger.validate(code.trim()))
    }
}

// ── RedeemCode ────────────────────────────────────────────────────────────────

pub struct RedeemCodeUseCase<S: LedgerStore> {
    pub ledger: Arc<CodeLedger<S>>,
}

impl<S: LedgerStore> RedeemCodeUseCase<S> {
    /// Consume a code. A second redemption of the same code fails with
    /// `CodeAlreadyUsed`; codes that were never issued are `CodeNotFound`.
    pub async fn execute(&self, code: &str) -> Result<(), AccessServiceError> {
        let code = code.trim();
        self.ledger
            .transact(|ledger| {
                ensure_redeemable(ledger, code)?;
                consume(ledger, code, UsageEventKind::CodeRedeemed)?;
                Ok(((), true))
            })
            .await?;
        info!("access code redeemed");
        Ok(())
    }

    /// Consume a code after `finalize` succeeds, holding the ledger lock
    /// throughout so no other redemption of the code can slip in between.
    ///
    /// `finalize` is not polled unless the code is redeemable, and the code
    /// stays unused if `finalize` fails. The usage log records `kind`.
    pub async fn execute_with<F>(
        &self,
        code: &str,
        kind: UsageEventKind,
        finalize: F,
    ) -> Result<(), AccessServiceError>
    where
        F: Future<Output = Result<(), AccessServiceError>>,
    {
        let code = code.trim();
        self.ledger
            .transact_with(
                |ledger| ensure_redeemable(ledger, code),
                finalize,
                |ledger| consume(ledger, code, kind),
            )
            .await?;
        info!("access code redeemed");
        Ok(())
    }
}
