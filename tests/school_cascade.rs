mod common;

use schooldesk::config::OverpaymentPolicy;
use schooldesk::db::assignments::{self, NewAssignment};
use schooldesk::db::attendance::{self, AttendanceMark};
use schooldesk::db::fees::{self, NewFeeMaster, NewPayment, NewPaymentItem};
use schooldesk::db::schools::{self, NewSchool};
use schooldesk::errors::AppError;
use sqlx::SqlitePool;

fn school(code: &str) -> NewSchool {
    NewSchool {
        school_name: format!("School {code}"),
        school_code: code.to_string(),
        contact_number: None,
        account_type: None,
        education_type: None,
        email: format!("{}@platform.test", code.to_lowercase()),
        pwd_hash: "not-a-real-hash".to_string(),
        active: None,
        active_date: None,
        deactive_date: None,
        school_logo: None,
    }
}

async fn count(pool: &SqlitePool, sql: &str, code: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(code)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[actix_web::test]
async fn duplicate_school_code_rejected() {
    let pool = common::test_pool().await;
    schools::create_school(&pool, school("SCH001")).await.unwrap();

    let duplicate = NewSchool {
        email: "other@platform.test".to_string(),
        ..school("SCH001")
    };
    match schools::create_school(&pool, duplicate).await {
        Err(AppError::Conflict(msg)) => assert_eq!(msg, "School code already exists"),
        other => panic!("expected conflict, got {:?}", other.map(|_| ())),
    }
}

#[actix_web::test]
async fn delete_removes_everything_the_school_owns() {
    let pool = common::test_pool().await;
    let created = schools::create_school(&pool, school("SCH001")).await.unwrap();
    schools::create_school(&pool, school("SCH002")).await.unwrap();

    // Populate both tenants; only SCH001 must vanish.
    for code in ["SCH001", "SCH002"] {
        let teacher = common::seed_teacher(&pool, code, "T1").await;
        let student = common::seed_student(&pool, code, "ADM001").await;

        assignments::assign_teacher(
            &pool,
            NewAssignment {
                school_code: code.to_string(),
                standard: "5".to_string(),
                section: "A".to_string(),
                teacher_id: teacher.id,
                teacher_name: teacher.fullname,
            },
        )
        .await
        .unwrap();

        attendance::add_attendance(
            &pool,
            &AttendanceMark {
                school_code: code.to_string(),
                person_id: "ADM001".to_string(),
                person_type: "student".to_string(),
                date: "2024-06-03".to_string(),
                status: "Present".to_string(),
                marked_by: "T1".to_string(),
            },
        )
        .await
        .unwrap();

        fees::create_master(
            &pool,
            NewFeeMaster {
                admission_id: "ADM001".to_string(),
                student_id: student.id,
                school_code: code.to_string(),
                total_fee_amount: 10_000.0,
                remarks: None,
            },
        )
        .await
        .unwrap();
        fees::add_payment(
            &pool,
            OverpaymentPolicy::Reject,
            NewPayment {
                admission_id: "ADM001".to_string(),
                school_code: code.to_string(),
                paying_now: 2_000.0,
                due_date: Some("2024-07-10".to_string()),
                fine_amount: None,
                remarks: None,
                items: vec![NewPaymentItem {
                    fee_head: "Tuition".to_string(),
                    amount: 2_000.0,
                    note: None,
                    status: None,
                }],
            },
        )
        .await
        .unwrap();
    }

    schools::delete_school_cascade(&pool, created.id).await.unwrap();

    for sql in [
        "SELECT COUNT(*) FROM teachers WHERE school_code = $1",
        "SELECT COUNT(*) FROM students WHERE school_code = $1",
        "SELECT COUNT(*) FROM attendance WHERE school_code = $1",
        "SELECT COUNT(*) FROM class_teacher_assignments WHERE school_code = $1",
        "SELECT COUNT(*) FROM fee_master WHERE school_code = $1",
        "SELECT COUNT(*) FROM fee_payments WHERE school_code = $1",
        "SELECT COUNT(*) FROM fee_payment_items WHERE fee_master_id IN \
         (SELECT id FROM fee_master WHERE school_code = $1)",
    ] {
        assert_eq!(count(&pool, sql, "SCH001").await, 0, "leftover rows: {sql}");
        assert!(count(&pool, sql, "SCH002").await > 0, "sibling lost rows: {sql}");
    }

    // The sibling tenant is intact.
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM students WHERE school_code = $1", "SCH002").await,
        1
    );
    assert!(schools::get_school(&pool, created.id).await.unwrap().is_none());

    match schools::delete_school_cascade(&pool, created.id).await {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "School not found"),
        other => panic!("expected not found, got {:?}", other.map(|_| ())),
    }
}
