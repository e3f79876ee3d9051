use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::domain::ballot::Ballot;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::ballot::{SubmitBallotInput, SubmitBallotUseCase};

#[derive(Deserialize)]
pub struct SubmitBallotRequest {
    pub code: String,
    pub ballot: Ballot,
}

pub async fn submit_ballot(
    State(state): State<AppState>,
    Json(body): Json<SubmitBallotRequest>,
) -> Result<StatusCode, AccessServiceError> {
    let usecase = SubmitBallotUseCase {
        ledger: state.code_ledger(),
        submissions: state.submission_store(),
        window: state.window,
    };
    usecase
        .execute(SubmitBallotInput {
            code: body.code,
            ballot: body.ballot,
        })
        .await?;
    Ok(StatusCode::CREATED)
}
