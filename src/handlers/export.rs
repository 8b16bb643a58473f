use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::db::queries::{self, TransactionFilter};
use crate::error::AppError;
use crate::handlers::build_filter;
use crate::ledger::projection::{self, ProjectedTransaction};

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub merchant_id: Option<String>,
    pub reference: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// CSV row shape: every numeric value is an exact decimal string so
/// downstream accounting tools never see binary floats.
#[derive(Debug, Serialize)]
struct ExportRow {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    merchant_id: String,
    reference: String,
    amount: String,
    fee: String,
    net_amount: String,
    status: String,
    occurred_at: String,
    created_at: String,
    original_transaction_id: String,
}

impl From<&ProjectedTransaction> for ExportRow {
    fn from(row: &ProjectedTransaction) -> Self {
        let tx = &row.transaction;
        ExportRow {
            id: tx.id.to_string(),
            kind: tx.kind.clone(),
            merchant_id: tx.merchant_id.clone(),
            reference: tx.reference.clone(),
            amount: tx.amount.to_string(),
            fee: tx.fee.to_string(),
            net_amount: tx.net_amount.to_string(),
            status: row.status.as_str().to_string(),
            occurred_at: tx.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            created_at: tx.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            original_transaction_id: tx
                .original_transaction_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        }
    }
}

fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn export_filename(filter: &TransactionFilter) -> String {
    let mut parts = vec!["transactions".to_string()];
    if let Some(ref merchant_id) = filter.merchant_id {
        parts.push(format!("merchant-{}", slug(merchant_id)));
    }
    if let Some(ref reference) = filter.reference {
        parts.push(format!("reference-{}", slug(reference)));
    }
    if let Some(from) = filter.occurred_from {
        parts.push(format!("from-{}", from.format("%Y-%m-%d")));
    }
    if let Some(to) = filter.occurred_to {
        parts.push(format!("to-{}", to.format("%Y-%m-%d")));
    }

    format!("{}.csv", parts.join("_"))
}

/// Full unpaginated result set for the active filters, ordered identically
/// to the list endpoint.
pub async fn export_transactions(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = build_filter(&params.merchant_id, &params.reference, &params.from, &params.to)?;

    let (_, rows) = queries::search_transactions(&state.db, &filter, None, 0).await?;
    let projected = projection::project_rows(&state.db, rows).await?;

    let mut writer = csv::Writer::from_writer(vec![]);
    for row in &projected {
        writer
            .serialize(ExportRow::from(row))
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))?;

    let filename = export_filename(&filter);
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(e.to_string()))?,
    );

    Ok((StatusCode::OK, headers, body))
}
