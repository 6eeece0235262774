mod common;

use schooldesk::config::OverpaymentPolicy;
use schooldesk::db::fees::{
    self, NewFeeMaster, NewPayment, NewPaymentItem, PayPendingRequest,
};
use schooldesk::errors::AppError;
use sqlx::SqlitePool;

/// Seeds a master of 10 000 and one payment of 2 000 carrying two PENDING
/// items of 1 500 and 500.
async fn seed_ledger_with_pending(pool: &SqlitePool) -> Vec<i64> {
    let student = common::seed_student(pool, "SCH001", "ADM001").await;
    fees::create_master(
        pool,
        NewFeeMaster {
            admission_id: "ADM001".to_string(),
            student_id: student.id,
            school_code: "SCH001".to_string(),
            total_fee_amount: 10_000.0,
            remarks: None,
        },
    )
    .await
    .unwrap();

    fees::add_payment(
        pool,
        OverpaymentPolicy::Reject,
        NewPayment {
            admission_id: "ADM001".to_string(),
            school_code: "SCH001".to_string(),
            paying_now: 2_000.0,
            due_date: Some("2024-07-10".to_string()),
            fine_amount: None,
            remarks: None,
            items: vec![
                NewPaymentItem {
                    fee_head: "Tuition".to_string(),
                    amount: 2_000.0,
                    note: None,
                    status: None,
                },
                NewPaymentItem {
                    fee_head: "Transport".to_string(),
                    amount: 1_500.0,
                    note: None,
                    status: Some("PENDING".to_string()),
                },
                NewPaymentItem {
                    fee_head: "Library".to_string(),
                    amount: 500.0,
                    note: None,
                    status: Some("PENDING".to_string()),
                },
            ],
        },
    )
    .await
    .unwrap();

    fees::pending_items(pool, "ADM001", "SCH001")
        .await
        .unwrap()
        .iter()
        .map(|i| i.id)
        .collect()
}

#[actix_web::test]
async fn settles_selected_items_in_one_payment() {
    let pool = common::test_pool().await;
    let pending_ids = seed_ledger_with_pending(&pool).await;
    assert_eq!(pending_ids.len(), 2);
    assert_eq!(
        fees::pending_count(&pool, "ADM001", "SCH001").await.unwrap(),
        2
    );

    let settlement = fees::pay_pending(
        &pool,
        OverpaymentPolicy::Reject,
        PayPendingRequest {
            admission_id: "ADM001".to_string(),
            school_code: "SCH001".to_string(),
            item_ids: pending_ids.clone(),
            due_date: Some("2024-08-10".to_string()),
        },
    )
    .await
    .unwrap();

    // 1500 + 500 settled on top of the earlier 2000.
    assert_eq!(settlement.paying_now, 2_000.0);
    assert_eq!(settlement.pending_after, 6_000.0);
    assert_eq!(fees::pending_count(&pool, "ADM001", "SCH001").await.unwrap(), 0);

    // The items keep their original payment link and record the settlement.
    let history = fees::history(&pool, "ADM001", "SCH001").await.unwrap();
    let settled: Vec<_> = history
        .iter()
        .flat_map(|p| p.items.iter())
        .filter(|i| i.settled_by_payment_id == Some(settlement.id))
        .collect();
    assert_eq!(settled.len(), 2);
    assert!(settled.iter().all(|i| i.status == "PAID"));
    assert!(settled.iter().all(|i| i.payment_id != settlement.id));
}

#[actix_web::test]
async fn bad_selection_leaves_ledger_untouched() {
    let pool = common::test_pool().await;
    let mut pending_ids = seed_ledger_with_pending(&pool).await;

    // One real item plus one that does not exist.
    pending_ids.push(9_999);
    match fees::pay_pending(
        &pool,
        OverpaymentPolicy::Reject,
        PayPendingRequest {
            admission_id: "ADM001".to_string(),
            school_code: "SCH001".to_string(),
            item_ids: pending_ids,
            due_date: Some("2024-08-10".to_string()),
        },
    )
    .await
    {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "One or more fee items not found"),
        other => panic!("expected not found, got {:?}", other.map(|_| ())),
    }

    // Nothing was settled and no payment row appeared.
    assert_eq!(fees::pending_count(&pool, "ADM001", "SCH001").await.unwrap(), 2);
    let history = fees::history(&pool, "ADM001", "SCH001").await.unwrap();
    assert_eq!(history.len(), 1);
}

#[actix_web::test]
async fn already_paid_items_rejected() {
    let pool = common::test_pool().await;
    let pending_ids = seed_ledger_with_pending(&pool).await;

    fees::pay_pending(
        &pool,
        OverpaymentPolicy::Reject,
        PayPendingRequest {
            admission_id: "ADM001".to_string(),
            school_code: "SCH001".to_string(),
            item_ids: pending_ids.clone(),
            due_date: Some("2024-08-10".to_string()),
        },
    )
    .await
    .unwrap();

    match fees::pay_pending(
        &pool,
        OverpaymentPolicy::Reject,
        PayPendingRequest {
            admission_id: "ADM001".to_string(),
            school_code: "SCH001".to_string(),
            item_ids: pending_ids,
            due_date: Some("2024-09-10".to_string()),
        },
    )
    .await
    {
        Err(AppError::Conflict(msg)) => assert_eq!(msg, "Item already paid"),
        other => panic!("expected conflict, got {:?}", other.map(|_| ())),
    }
}

#[actix_web::test]
async fn items_from_another_ledger_rejected() {
    let pool = common::test_pool().await;
    let pending_ids = seed_ledger_with_pending(&pool).await;

    // A second student with their own ledger.
    let other = common::seed_student(&pool, "SCH001", "ADM002").await;
    fees::create_master(
        &pool,
        NewFeeMaster {
            admission_id: "ADM002".to_string(),
            student_id: other.id,
            school_code: "SCH001".to_string(),
            total_fee_amount: 10_000.0,
            remarks: None,
        },
    )
    .await
    .unwrap();

    match fees::pay_pending(
        &pool,
        OverpaymentPolicy::Reject,
        PayPendingRequest {
            admission_id: "ADM002".to_string(),
            school_code: "SCH001".to_string(),
            item_ids: pending_ids,
            due_date: Some("2024-08-10".to_string()),
        },
    )
    .await
    {
        Err(AppError::Validation(msg)) => {
            assert_eq!(msg, "Items belong to a different fee ledger")
        }
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    }
}

#[actix_web::test]
async fn fine_waiver_requires_approver() {
    let pool = common::test_pool().await;
    seed_ledger_with_pending(&pool).await;

    let history = fees::history(&pool, "ADM001", "SCH001").await.unwrap();
    let payment_id = history[0].payment.id;

    match fees::waive_fine(&pool, payment_id, "  ").await {
        Err(AppError::Validation(msg)) => {
            assert_eq!(msg, "approved_by is required to waive a fine")
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    fees::waive_fine(&pool, payment_id, "principal@sch001").await.unwrap();
    let history = fees::history(&pool, "ADM001", "SCH001").await.unwrap();
    assert_eq!(
        history[0].payment.fine_waived_by.as_deref(),
        Some("principal@sch001")
    );

    match fees::waive_fine(&pool, 9_999, "principal@sch001").await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Payment not found"),
        other => panic!("expected not found, got {:?}", other),
    }
}
