use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::error::AppError;
use crate::ledger::reversal::{self, ReversalRequest};

pub async fn reverse_payment(
    State(state): State<AppState>,
    Json(request): Json<ReversalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = reversal::reverse_payment(&state.db, &request).await?;
    Ok(Json(outcome))
}
