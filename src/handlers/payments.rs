use axum::{Json, extract::State, response::IntoResponse};

use crate::AppState;
use crate::error::AppError;
use crate::ledger::recorder::{self, PaymentRequest};

pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<PaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = recorder::record_payment(&state.db, &request).await?;
    Ok(Json(outcome))
}
