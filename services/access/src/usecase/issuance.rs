use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::repository::{CodeDelivery, LedgerStore};
use crate::domain::types::{Code, SurveyWindow, UsageEvent, UsageEventKind};
use crate::error::AccessServiceError;
use crate::usecase::ledger::CodeLedger;

pub struct RequestCodeInput {
    pub identity: String,
}

pub struct RequestCodeUseCase<S, D>
where
    S: LedgerStore,
    D: CodeDelivery,
{
    pub ledger: Arc<CodeLedger<S>>,
    pub delivery: D,
    pub delivery_timeout: Duration,
    pub window: SurveyWindow,
    /// Re-send the existing code when an identity asks again.
    pub resend_on_repeat: bool,
}

impl<S, D> RequestCodeUseCase<S, D>
where
    S: LedgerStore,
    D: CodeDelivery,
{
    /// Hand out the identity's code, allocating one on first request.
    ///
    /// The allocation is durable before delivery is attempted. A delivery
    /// failure is returned as `Delivery` but keeps the allocation, so asking
    /// again yields the same code.
    pub async fn execute(&self, input: RequestCodeInput) -> Result<Code, AccessServiceError> {
        if !self.window.is_open_at(Utc::now()) {
            return Err(AccessServiceError::SurveyClosed);
        }
        let identity = input.identity.trim();
        if identity.is_empty() || !identity.contains('@') {
            return Err(AccessServiceError::InvalidIdentity);
        }

        let (code, newly_issued) = self
            .ledger
            .transact(|ledger| {
                if let Some(record) = ledger.record_for(identity) {
                    let code = ledger.code(&record.code).cloned().ok_or_else(|| {
                        AccessServiceError::InvariantViolation(format!(
                            "issuance record points at missing code {:?}",
                            record.code
                        ))
                    })?;
                    return Ok(((code, false), false));
                }

                let fresh = ledger.allocate_unused()?;
                let record = ledger.issue_to(identity, &fresh.value, Utc::now())?;
                ledger.record_event(UsageEvent {
                    at: record.issued_at,
                    kind: UsageEventKind::CodeIssued,
                    identity: record.identity,
                    code: record.code,
                });
                let issued = Code {
                    issued: true,
                    ..fresh
                };
                info!(remaining = ledger.unissued_count(), "access code issued");
                Ok(((issued, true), true))
            })
            .await
            .inspect_err(|e| {
                if matches!(e, AccessServiceError::NoCodesAvailable) {
                    warn!("access code pool exhausted");
                }
            })?;

        if newly_issued || self.resend_on_repeat {
            self.deliver(identity, &code.value).await?;
        }
        Ok(code)
    }

    async fn deliver(&self, identity: &str, code: &str) -> Result<(), AccessServiceError> {
        let outcome = tokio::time::timeout(self.delivery_timeout, self.delivery.send(identity, code))
            .await;
        let err = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(AccessServiceError::Delivery(msg))) => msg,
            Ok(Err(other)) => other.to_string(),
            Err(_) => format!(
                "delivery timed out after {} ms",
                self.delivery_timeout.as_millis()
            ),
        };
        warn!(error = %err, "access code delivery failed");
        Err(AccessServiceError::Delivery(err))
    }
}
