use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use crate::db::queries;
use crate::error::AppError;
use crate::handlers::build_filter;
use crate::ledger::projection::{self, Page, ProjectedTransaction};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub merchant_id: Option<String>,
    pub reference: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page<ProjectedTransaction>>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params.page_size.unwrap_or(50).clamp(1, 100);
    let filter = build_filter(&params.merchant_id, &params.reference, &params.from, &params.to)?;

    let offset = (page - 1) * page_size;
    let (total, rows) =
        queries::search_transactions(&state.db, &filter, Some(page_size), offset).await?;
    let projected = projection::project_rows(&state.db, rows).await?;

    Ok(Json(Page::new(projected, page, page_size, total)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectedTransaction>, AppError> {
    let row = queries::get_transaction(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    let projected = projection::project_rows(&state.db, vec![row])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("projection yielded no row".to_string()))?;

    Ok(Json(projected))
}
