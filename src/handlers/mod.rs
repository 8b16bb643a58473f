pub mod audit;
pub mod export;
pub mod payments;
pub mod reversals;
pub mod transactions;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::AppState;
use crate::db::queries::TransactionFilter;
use crate::error::AppError;
use crate::validation;

#[derive(Serialize)]
pub struct DbPoolStats {
    pub active_connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub db: String,
    pub db_pool: DbPoolStats,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let pool = &state.db;
    let pool_stats = DbPoolStats {
        active_connections: pool.size(),
        idle_connections: pool.num_idle() as u32,
        max_connections: pool.options().get_max_connections(),
    };

    let health_response = HealthStatus {
        status: if db_status == "connected" {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        db: db_status.to_string(),
        db_pool: pool_stats,
    };

    let status_code = if db_status == "connected" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_response))
}

/// Shared filter parsing for the list and export surfaces. Date bounds are
/// inclusive; a bare end date covers its whole day.
pub(crate) fn build_filter(
    merchant_id: &Option<String>,
    reference: &Option<String>,
    from: &Option<String>,
    to: &Option<String>,
) -> Result<TransactionFilter, AppError> {
    let merchant_id = merchant_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let reference = reference
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    let occurred_from = match from.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(validation::parse_timestamp("from", raw)?),
        _ => None,
    };

    let occurred_to = match to.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let parsed = validation::parse_timestamp("to", raw)?;
            Some(if raw.len() == 10 {
                parsed + chrono::Duration::days(1) - chrono::Duration::microseconds(1)
            } else {
                parsed
            })
        }
        _ => None,
    };

    Ok(TransactionFilter {
        merchant_id,
        reference,
        occurred_from,
        occurred_to,
    })
}
