use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::results::{ResultsSummary, ResultsSummaryUseCase};

#[derive(Deserialize)]
pub struct ResultsQuery {
    pub region: Option<String>,
}

pub async fn get_results(
    State(state): State<AppState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsSummary>, AccessServiceError> {
    let usecase = ResultsSummaryUseCase {
        ledger: state.code_ledger(),
        submissions: state.submission_store(),
    };
    Ok(Json(usecase.execute(query.region).await?))
}
