use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::AppState;
use crate::db::models::AuditEntry;
use crate::error::AppError;
use crate::ledger::audit;
use crate::ledger::projection::Page;

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Read-only view over the append-only audit trail, newest first.
pub async fn list_audit_log(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
) -> Result<Json<Page<AuditEntry>>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * page_size;

    let (total, entries) = audit::list(&state.db, page_size, offset).await?;

    Ok(Json(Page::new(entries, page, page_size, total)))
}
