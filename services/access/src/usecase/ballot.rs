use std::sync::Arc;

use chrono::Utc;

use crate::domain::ballot::Ballot;
use crate::domain::repository::{LedgerStore, SubmissionStore};
use crate::domain::types::{SurveyWindow, UsageEventKind};
use crate::error::AccessServiceError;
use crate::usecase::ledger::CodeLedger;
use crate::usecase::redemption::RedeemCodeUseCase;

pub struct SubmitBallotInput {
    pub code: String,
    pub ballot: Ballot,
}

pub struct SubmitBallotUseCase<S, B>
where
    S: LedgerStore,
    B: SubmissionStore,
{
    pub ledger: Arc<CodeLedger<S>>,
    pub submissions: B,
    pub window: SurveyWindow,
}

impl<S, B> SubmitBallotUseCase<S, B>
where
    S: LedgerStore,
    B: SubmissionStore,
{
    /// Record a ballot and consume its access code as one step: the row is
    /// appended only for a redeemable code, and the code is marked used only
    /// once the row is stored.
    pub async fn execute(&self, input: SubmitBallotInput) -> Result<(), AccessServiceError> {
        let now = Utc::now();
        if !self.window.is_open_at(now) {
            return Err(AccessServiceError::SurveyClosed);
        }
        input
            .ballot
            .check()
            .map_err(AccessServiceError::InvalidBallot)?;

        let code = input.code.trim();
        let record = input.ballot.to_record(code, now);

        let redeem = RedeemCodeUseCase {
            ledger: Arc::clone(&self.ledger),
        };
        redeem
            .execute_with(code, UsageEventKind::VoteCast, self.submissions.append(&record))
            .await
    }
}
