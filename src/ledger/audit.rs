use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::AuditEntry;
use crate::db::queries;

pub const ACTION_PAYMENT_CREATED: &str = "payment_created";
pub const ACTION_PAYMENT_DUPLICATE_IGNORED: &str = "payment_duplicate_ignored";
pub const ACTION_PAYMENT_REVERSED: &str = "payment_reversed";

pub const ENTITY_TRANSACTION: &str = "transaction";

pub async fn record(
    pool: &PgPool,
    actor: &str,
    action: &str,
    entity_type: &str,
    entity_id: Uuid,
    details: Value,
) -> Result<AuditEntry, sqlx::Error> {
    let entry = AuditEntry::new(actor, action, entity_type, entity_id, details);
    queries::insert_audit_entry(pool, &entry).await
}

/// Audit appends never gate the ledger write they describe: the ledger row
/// is already committed when this runs, so a failed append is reported to
/// the operational log for reconciliation and the operation still succeeds.
pub async fn record_best_effort(
    pool: &PgPool,
    actor: &str,
    action: &str,
    entity_type: &str,
    entity_id: Uuid,
    details: Value,
) {
    if let Err(error) = record(pool, actor, action, entity_type, entity_id, details).await {
        tracing::error!(
            action = %action,
            entity_id = %entity_id,
            error = %error,
            "audit append failed after ledger write"
        );
    }
}

pub async fn list(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<(i64, Vec<AuditEntry>), sqlx::Error> {
    queries::list_audit_entries(pool, limit, offset).await
}
