use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

pub const TYPE_PAYMENT: &str = "PAYMENT";
pub const TYPE_REVERSAL: &str = "REVERSAL";

/// A ledger row. Immutable once written: state changes are new rows, never
/// updates, so every field here reflects the moment of insertion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub merchant_id: String,
    pub reference: String,
    pub amount: BigDecimal,
    pub fee: BigDecimal,
    pub net_amount: BigDecimal,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub original_transaction_id: Option<Uuid>,
    pub idempotency_key: Option<String>,
}

impl Transaction {
    pub fn payment(
        merchant_id: String,
        reference: String,
        amount: BigDecimal,
        fee: BigDecimal,
        net_amount: BigDecimal,
        occurred_at: DateTime<Utc>,
        idempotency_key: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: TYPE_PAYMENT.to_string(),
            merchant_id,
            reference,
            amount,
            fee,
            net_amount,
            occurred_at,
            created_at: Utc::now(),
            original_transaction_id: None,
            idempotency_key: Some(idempotency_key),
        }
    }

    /// The negated mirror of `original`. `occurred_at` is the time of the
    /// reversal action, not the original's business time.
    pub fn reversal_of(original: &Transaction) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: TYPE_REVERSAL.to_string(),
            merchant_id: original.merchant_id.clone(),
            reference: original.reference.clone(),
            amount: -original.amount.clone(),
            fee: -original.fee.clone(),
            net_amount: -original.net_amount.clone(),
            occurred_at: now,
            created_at: now,
            original_transaction_id: Some(original.id),
            idempotency_key: None,
        }
    }

    pub fn is_payment(&self) -> bool {
        self.kind == TYPE_PAYMENT
    }

    pub fn is_reversal(&self) -> bool {
        self.kind == TYPE_REVERSAL
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor: &str,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: actor.to_string(),
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            details,
            created_at: Utc::now(),
        }
    }
}
