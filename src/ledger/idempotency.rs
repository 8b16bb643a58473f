use bigdecimal::BigDecimal;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::ledger::money;

/// Deterministic fingerprint of a payment submission. Equivalent numeric and
/// temporal spellings ("10" vs "10.00", second vs millisecond timestamps)
/// collapse to the same digest, so a retried request lands on the same key
/// regardless of how the client re-serialized it.
///
/// The fee is deliberately not part of the key: a resubmission that differs
/// only in fee is treated as a duplicate of the first recording and keeps the
/// first fee.
pub fn derive_key(
    merchant_id: &str,
    reference: &str,
    amount: &BigDecimal,
    occurred_at: DateTime<Utc>,
) -> String {
    let normalized_amount = money::to_fixed2(amount);
    let normalized_timestamp = occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true);
    let payload = format!(
        "{}|{}|{}|{}",
        merchant_id, reference, normalized_amount, normalized_timestamp
    );

    hex::encode(Sha256::digest(payload.as_bytes()))
}
