use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::types::ValidationResult;
use crate::error::AccessServiceError;
use crate::state::AppState;
use crate::usecase::issuance::{RequestCodeInput, RequestCodeUseCase};
use crate::usecase::redemption::ValidateCodeUseCase;

#[derive(Deserialize)]
pub struct RequestCodeRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct RequestCodeResponse {
    pub status: &'static str,
}

/// `POST /access/code`. The code itself only travels by email.
pub async fn request_code(
    State(state): State<AppState>,
    Json(body): Json<RequestCodeRequest>,
) -> Result<(StatusCode, Json<RequestCodeResponse>), AccessServiceError> {
    let usecase = RequestCodeUseCase {
        ledger: state.code_ledger(),
        delivery: state.mailer(),
        delivery_timeout: state.delivery_timeout,
        window: state.window,
        resend_on_repeat: state.resend_on_repeat,
    };
    usecase
        .execute(RequestCodeInput {
            identity: body.email,
        })
        .await?;
    Ok((StatusCode::ACCEPTED, Json(RequestCodeResponse { status: "sent" })))
}

#[derive(Deserialize)]
pub struct ValidateCodeRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct ValidateCodeResponse {
    pub result: ValidationResult,
}

/// `POST /access/validate`. Always 200; the verdict is in the body.
pub async fn validate_code(
    State(state): State<AppState>,
    Json(body): Json<ValidateCodeRequest>,
) -> Result<Json<ValidateCodeResponse>, AccessServiceError> {
    let usecase = ValidateCodeUseCase {
        ledger: state.code_ledger(),
    };
    let result = usecase.execute(&body.code).await?;
    Ok(Json(ValidateCodeResponse { result }))
}
