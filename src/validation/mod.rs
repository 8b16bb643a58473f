use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trims the value and rejects empty input.
pub fn require_text(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(trimmed.to_string())
}

/// Accepts a JSON number or a numeric string, as clients submit both.
pub fn parse_decimal(field: &'static str, value: &Value) -> ValidationResult<BigDecimal> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => return Err(ValidationError::new(field, "is required")),
        _ => {
            return Err(ValidationError::new(
                field,
                "must be a number or numeric string",
            ));
        }
    };

    text.parse::<BigDecimal>()
        .map_err(|_| ValidationError::new(field, "must be a valid decimal number"))
}

pub fn parse_amount(value: &Value) -> ValidationResult<BigDecimal> {
    let amount = parse_decimal("amount", value)?;
    if amount <= BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(amount)
}

pub fn parse_fee(value: &Value, amount: &BigDecimal) -> ValidationResult<BigDecimal> {
    let fee = parse_decimal("fee", value)?;
    if fee < BigDecimal::from(0) {
        return Err(ValidationError::new("fee", "must be zero or greater"));
    }
    if &fee >= amount {
        return Err(ValidationError::new("fee", "must be less than amount"));
    }

    Ok(fee)
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(field: &'static str, value: &str) -> ValidationResult<DateTime<Utc>> {
    let candidate = if value.len() == 10 {
        format!("{}T00:00:00Z", value)
    } else {
        value.to_string()
    };

    DateTime::parse_from_rfc3339(&candidate)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            ValidationError::new(field, "must be an RFC 3339 timestamp or YYYY-MM-DD date")
        })
}

/// `now` is captured once by the caller so the future-bound check is exact.
pub fn parse_occurred_at(raw: &str, now: DateTime<Utc>) -> ValidationResult<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::new("occurred_at", "is required"));
    }

    let parsed = parse_timestamp("occurred_at", value)?;
    if parsed > now {
        return Err(ValidationError::new(
            "occurred_at",
            "must not be in the future",
        ));
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn requires_non_empty_text() {
        assert_eq!(require_text("merchant_id", "  M1  ").unwrap(), "M1");
        assert!(require_text("merchant_id", "   ").is_err());
        assert!(require_text("reference", "").is_err());
    }

    #[test]
    fn parses_decimal_from_string_and_number() {
        assert_eq!(
            parse_decimal("amount", &json!("120.50")).unwrap(),
            BigDecimal::from_str("120.50").unwrap()
        );
        assert_eq!(
            parse_decimal("amount", &json!(120.5)).unwrap(),
            BigDecimal::from_str("120.5").unwrap()
        );
        assert!(parse_decimal("amount", &Value::Null).is_err());
        assert!(parse_decimal("amount", &json!(true)).is_err());
        assert!(parse_decimal("amount", &json!("not-a-number")).is_err());
    }

    #[test]
    fn rejects_non_positive_amount() {
        assert!(parse_amount(&json!("0")).is_err());
        assert!(parse_amount(&json!("-5")).is_err());
        assert!(parse_amount(&json!("0.01")).is_ok());
    }

    #[test]
    fn enforces_fee_bounds() {
        let amount = BigDecimal::from_str("100").unwrap();
        assert!(parse_fee(&json!("0"), &amount).is_ok());
        assert!(parse_fee(&json!("99.99"), &amount).is_ok());
        assert!(parse_fee(&json!("-0.01"), &amount).is_err());
        // Fee equal to amount is rejected, not just greater.
        assert!(parse_fee(&json!("100"), &amount).is_err());
        assert!(parse_fee(&json!("100.00"), &amount).is_err());
        assert!(parse_fee(&json!("100.01"), &amount).is_err());
    }

    #[test]
    fn parses_date_only_timestamp_as_midnight_utc() {
        let parsed = parse_timestamp("from", "2024-01-01").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn rejects_invalid_timestamp() {
        assert!(parse_timestamp("from", "yesterday").is_err());
        assert!(parse_timestamp("from", "2024-13-01T00:00:00Z").is_err());
    }

    #[test]
    fn accepts_occurred_at_exactly_now() {
        let now = Utc::now();
        assert_eq!(parse_occurred_at(&now.to_rfc3339(), now).unwrap(), now);
    }

    #[test]
    fn rejects_occurred_at_one_millisecond_in_the_future() {
        let now = Utc::now();
        let future = now + Duration::milliseconds(1);
        assert!(parse_occurred_at(&future.to_rfc3339(), now).is_err());
    }

    #[test]
    fn rejects_missing_occurred_at() {
        assert!(parse_occurred_at("   ", Utc::now()).is_err());
    }
}
