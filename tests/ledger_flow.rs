//! End-to-end ledger flow against a real Postgres.
//!
//! These tests need a database: set DATABASE_URL and run with
//! `cargo test -- --ignored`.

use bigdecimal::BigDecimal;
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use tally_core::db::queries::{self, TransactionFilter};
use tally_core::error::AppError;
use tally_core::ledger::audit;
use tally_core::ledger::projection::{self, TransactionStatus};
use tally_core::ledger::recorder::{self, PaymentRequest};
use tally_core::ledger::reversal::{self, ReversalRequest};

async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    let migrator = Migrator::new(Path::new("./migrations"))
        .await
        .expect("Failed to load migrations");
    migrator
        .run(&pool)
        .await
        .expect("Failed to run migrations on test DB");
    pool
}

fn payment_request(merchant_id: &str, reference: &str) -> PaymentRequest {
    PaymentRequest {
        merchant_id: merchant_id.to_string(),
        reference: reference.to_string(),
        amount: json!("120.50"),
        fee: json!("1.50"),
        occurred_at: "2024-01-01T00:00:00Z".to_string(),
        actor: "test".to_string(),
    }
}

#[tokio::test]
#[ignore] // requires Postgres
async fn records_reverses_and_projects_a_payment() {
    let pool = setup_test_db().await;
    let merchant_id = format!("test-merchant-{}", Uuid::new_v4());
    let reference = format!("INV-{}", Uuid::new_v4());
    let request = payment_request(&merchant_id, &reference);

    // Fresh insert.
    let first = recorder::record_payment(&pool, &request).await.unwrap();
    assert!(!first.duplicate);
    assert_eq!(
        first.transaction.net_amount,
        BigDecimal::from_str("119.00").unwrap()
    );
    assert!(first.transaction.idempotency_key.is_some());

    // Identical resubmission returns the original row.
    let second = recorder::record_payment(&pool, &request).await.unwrap();
    assert!(second.duplicate);
    assert_eq!(second.transaction.id, first.transaction.id);

    // Reverse it.
    let reversal_request = ReversalRequest {
        transaction_id: first.transaction.id.to_string(),
        actor: "test".to_string(),
    };
    let reversed = reversal::reverse_payment(&pool, &reversal_request)
        .await
        .unwrap();
    assert!(!reversed.duplicate);
    assert_eq!(
        reversed.transaction.amount,
        BigDecimal::from_str("-120.50").unwrap()
    );
    assert_eq!(
        reversed.transaction.fee,
        BigDecimal::from_str("-1.50").unwrap()
    );
    assert_eq!(
        reversed.transaction.net_amount,
        BigDecimal::from_str("-119.00").unwrap()
    );
    assert_eq!(
        reversed.transaction.original_transaction_id,
        Some(first.transaction.id)
    );

    // Reversing again is a no-op returning the existing reversal.
    let again = reversal::reverse_payment(&pool, &reversal_request)
        .await
        .unwrap();
    assert!(again.duplicate);
    assert_eq!(again.transaction.id, reversed.transaction.id);

    // A reversal cannot itself be reversed.
    let on_reversal = reversal::reverse_payment(
        &pool,
        &ReversalRequest {
            transaction_id: reversed.transaction.id.to_string(),
            actor: "test".to_string(),
        },
    )
    .await;
    assert!(matches!(on_reversal, Err(AppError::NotFound(_))));

    // Listing the merchant yields both rows with derived statuses.
    let filter = TransactionFilter {
        merchant_id: Some(merchant_id.clone()),
        ..Default::default()
    };
    let (total, rows) = queries::search_transactions(&pool, &filter, Some(50), 0)
        .await
        .unwrap();
    assert_eq!(total, 2);

    let projected = projection::project_rows(&pool, rows).await.unwrap();
    let payment = projected
        .iter()
        .find(|row| row.transaction.id == first.transaction.id)
        .unwrap();
    assert_eq!(payment.status, TransactionStatus::Reversed);
    assert_eq!(payment.reversal_id, Some(reversed.transaction.id));

    let mirror = projected
        .iter()
        .find(|row| row.transaction.id == reversed.transaction.id)
        .unwrap();
    assert_eq!(mirror.status, TransactionStatus::Reversal);

    // Every mutating call left an audit trace.
    let (_, entries) = audit::list(&pool, 100, 0).await.unwrap();
    assert!(entries.iter().any(|e| {
        e.entity_id == first.transaction.id && e.action == audit::ACTION_PAYMENT_CREATED
    }));
    assert!(entries.iter().any(|e| {
        e.entity_id == first.transaction.id && e.action == audit::ACTION_PAYMENT_DUPLICATE_IGNORED
    }));
    assert!(entries.iter().any(|e| {
        e.entity_id == reversed.transaction.id && e.action == audit::ACTION_PAYMENT_REVERSED
    }));
}

#[tokio::test]
#[ignore] // requires Postgres
async fn rejected_input_writes_nothing() {
    let pool = setup_test_db().await;
    let merchant_id = format!("test-merchant-{}", Uuid::new_v4());

    // Fee equal to amount.
    let mut request = payment_request(&merchant_id, "INV-BAD-FEE");
    request.fee = json!("120.50");
    assert!(matches!(
        recorder::record_payment(&pool, &request).await,
        Err(AppError::Validation(_))
    ));

    // Future business timestamp.
    let mut request = payment_request(&merchant_id, "INV-FUTURE");
    request.occurred_at = "2999-01-01T00:00:00Z".to_string();
    assert!(matches!(
        recorder::record_payment(&pool, &request).await,
        Err(AppError::Validation(_))
    ));

    let filter = TransactionFilter {
        merchant_id: Some(merchant_id),
        ..Default::default()
    };
    let (total, _) = queries::search_transactions(&pool, &filter, Some(10), 0)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[tokio::test]
#[ignore] // requires Postgres
async fn reversal_of_unknown_payment_is_not_found() {
    let pool = setup_test_db().await;

    let missing = reversal::reverse_payment(
        &pool,
        &ReversalRequest {
            transaction_id: Uuid::new_v4().to_string(),
            actor: "test".to_string(),
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let malformed = reversal::reverse_payment(
        &pool,
        &ReversalRequest {
            transaction_id: "not-a-uuid".to_string(),
            actor: "test".to_string(),
        },
    )
    .await;
    assert!(matches!(malformed, Err(AppError::Validation(_))));
}

#[tokio::test]
#[ignore] // requires Postgres
async fn equivalent_spellings_hit_the_same_key() {
    let pool = setup_test_db().await;
    let merchant_id = format!("test-merchant-{}", Uuid::new_v4());
    let reference = format!("INV-{}", Uuid::new_v4());

    let mut request = payment_request(&merchant_id, &reference);
    request.amount = json!("200");
    request.fee = json!("2");
    let first = recorder::record_payment(&pool, &request).await.unwrap();
    assert!(!first.duplicate);

    // Same payment, re-serialized by a retrying client.
    let mut retry = payment_request(&merchant_id, &reference);
    retry.amount = json!(200.0);
    retry.fee = json!(2.0);
    retry.occurred_at = "2024-01-01T00:00:00.000Z".to_string();
    let second = recorder::record_payment(&pool, &retry).await.unwrap();
    assert!(second.duplicate);
    assert_eq!(second.transaction.id, first.transaction.id);
}
