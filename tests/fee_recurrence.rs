mod common;

use schooldesk::config::OverpaymentPolicy;
use schooldesk::db::fees::{self, NewFeeMaster, NewPayment, NewPaymentItem};
use schooldesk::errors::AppError;
use sqlx::SqlitePool;

async fn seed_master(pool: &SqlitePool, total: f64) -> i64 {
    let student = common::seed_student(pool, "SCH001", "ADM001").await;
    let (id, created) = fees::create_master(
        pool,
        NewFeeMaster {
            admission_id: "ADM001".to_string(),
            student_id: student.id,
            school_code: "SCH001".to_string(),
            total_fee_amount: total,
            remarks: None,
        },
    )
    .await
    .unwrap();
    assert!(created);
    id
}

fn payment(paying_now: f64, due_date: Option<&str>) -> NewPayment {
    NewPayment {
        admission_id: "ADM001".to_string(),
        school_code: "SCH001".to_string(),
        paying_now,
        due_date: due_date.map(|d| d.to_string()),
        fine_amount: None,
        remarks: None,
        items: vec![NewPaymentItem {
            fee_head: "Tuition".to_string(),
            amount: paying_now,
            note: None,
            status: None,
        }],
    }
}

#[actix_web::test]
async fn master_create_is_idempotent() {
    let pool = common::test_pool().await;
    let student = common::seed_student(&pool, "SCH001", "ADM001").await;

    let master = NewFeeMaster {
        admission_id: "ADM001".to_string(),
        student_id: student.id,
        school_code: "SCH001".to_string(),
        total_fee_amount: 10_000.0,
        remarks: None,
    };
    let (first_id, created) = fees::create_master(&pool, master).await.unwrap();
    assert!(created);

    let again = NewFeeMaster {
        admission_id: "ADM001".to_string(),
        student_id: student.id,
        school_code: "SCH001".to_string(),
        total_fee_amount: 99_999.0,
        remarks: None,
    };
    let (second_id, created) = fees::create_master(&pool, again).await.unwrap();
    assert!(!created);
    assert_eq!(first_id, second_id);
}

#[actix_web::test]
async fn pending_walks_down_and_due_date_clears_at_zero() {
    let pool = common::test_pool().await;
    seed_master(&pool, 10_000.0).await;

    let first = fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        payment(4_000.0, Some("2024-07-10")),
    )
    .await
    .unwrap();
    assert_eq!(first.pending_after, 6_000.0);
    assert_eq!(first.due_date.as_deref(), Some("2024-07-10"));

    // Settling the ledger must not leave a due date dangling.
    let second = fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        payment(6_000.0, Some("2024-08-10")),
    )
    .await
    .unwrap();
    assert_eq!(second.pending_after, 0.0);
    assert_eq!(second.due_date, None);

    let summary = fees::summary(&pool, "ADM001", "SCH001")
        .await
        .unwrap()
        .expect("summary exists");
    assert_eq!(summary.total_paid, 10_000.0);
    assert_eq!(summary.pending, 0.0);
    assert_eq!(summary.last_due_date, None);
}

#[actix_web::test]
async fn due_date_required_while_balance_remains() {
    let pool = common::test_pool().await;
    seed_master(&pool, 10_000.0).await;

    match fees::add_payment(&pool, OverpaymentPolicy::Reject, payment(4_000.0, None)).await {
        Err(AppError::Validation(msg)) => {
            assert_eq!(msg, "due_date is required while a balance remains pending")
        }
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[actix_web::test]
async fn overpayment_rejected_then_clamped_by_policy() {
    let pool = common::test_pool().await;
    seed_master(&pool, 5_000.0).await;

    match fees::add_payment(&pool, OverpaymentPolicy::Reject, payment(6_000.0, None)).await {
        Err(AppError::Validation(msg)) => assert_eq!(msg, "Payment exceeds pending balance"),
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
    // The rejected payment left no trace.
    let summary = fees::summary(&pool, "ADM001", "SCH001")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(summary.total_paid, 0.0);
    assert_eq!(summary.pending, 5_000.0);

    let clamped = fees::add_payment(&pool, OverpaymentPolicy::Clamp, payment(6_000.0, None))
        .await
        .unwrap();
    assert_eq!(clamped.pending_after, 0.0);
}

#[actix_web::test]
async fn master_total_frozen_once_payments_exist() {
    let pool = common::test_pool().await;
    let master_id = seed_master(&pool, 10_000.0).await;

    // No payments yet, so the contracted total can still be corrected.
    let updated = fees::update_master_total(&pool, master_id, 12_000.0)
        .await
        .unwrap();
    assert_eq!(updated.total_fee_amount, 12_000.0);

    fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        payment(2_000.0, Some("2024-07-10")),
    )
    .await
    .unwrap();

    match fees::update_master_total(&pool, master_id, 15_000.0).await {
        Err(AppError::Conflict(msg)) => {
            assert_eq!(msg, "Total fee cannot be changed once payments exist")
        }
        other => panic!("expected conflict, got {:?}", other.map(|_| ())),
    }
}

#[actix_web::test]
async fn outstanding_empties_once_ledger_settles() {
    let pool = common::test_pool().await;
    seed_master(&pool, 10_000.0).await;

    // No payments yet: the balance is owed but no due month exists to report.
    let rows = fees::outstanding(&pool, "ADM001", "SCH001").await.unwrap();
    assert!(rows.is_empty());

    fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        payment(4_000.0, Some("2024-07-10")),
    )
    .await
    .unwrap();

    let rows = fees::outstanding(&pool, "ADM001", "SCH001").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].month, "2024-07");
    assert_eq!(rows[0].pending, 6_000.0);

    // Paying the ledger off must clear the view; the historical July row
    // is no longer a due.
    fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        payment(6_000.0, Some("2024-08-10")),
    )
    .await
    .unwrap();

    let rows = fees::outstanding(&pool, "ADM001", "SCH001").await.unwrap();
    assert!(rows.is_empty(), "settled ledger reported dues: {:?}", rows);

    // Unknown ledgers report nothing rather than erroring.
    let rows = fees::outstanding(&pool, "NOBODY", "SCH001").await.unwrap();
    assert!(rows.is_empty());
}

#[actix_web::test]
async fn receipt_reconstructs_payment_and_items() {
    let pool = common::test_pool().await;
    seed_master(&pool, 10_000.0).await;

    let paid = fees::add_payment(
        &pool,
        OverpaymentPolicy::Reject,
        NewPayment {
            items: vec![
                NewPaymentItem {
                    fee_head: "Tuition".to_string(),
                    amount: 3_000.0,
                    note: None,
                    status: None,
                },
                NewPaymentItem {
                    fee_head: "Library".to_string(),
                    amount: 1_000.0,
                    note: Some("annual".to_string()),
                    status: None,
                },
            ],
            ..payment(4_000.0, Some("2024-07-10"))
        },
    )
    .await
    .unwrap();

    let receipt = fees::receipt(&pool, paid.id).await.unwrap();
    assert_eq!(receipt.payment.id, paid.id);
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(receipt.summary.pending, 6_000.0);
    assert_eq!(receipt.fee_master.admission_id, "ADM001");

    match fees::receipt(&pool, 9_999).await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Payment not found"),
        other => panic!("expected not found, got {:?}", other.map(|_| ())),
    }
}
