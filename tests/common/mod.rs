#![allow(dead_code)]

use schooldesk::config::{AppConfig, OverpaymentPolicy};
use schooldesk::db::students::NewStudent;
use schooldesk::db::teachers::NewTeacher;
use schooldesk::structs::{Student, Teacher};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// One connection only: every handle must see the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

pub fn test_config(uploads_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        token_secret: "integration-test-secret".to_string(),
        token_ttl_secs: 3600,
        uploads_dir: uploads_dir.to_string_lossy().into_owned(),
        overpayment: OverpaymentPolicy::Reject,
    }
}

pub async fn seed_student(pool: &SqlitePool, school_code: &str, admission_id: &str) -> Student {
    schooldesk::db::students::create_student(
        pool,
        NewStudent {
            fullname: format!("Student {admission_id}"),
            admission_id: admission_id.to_string(),
            standard: Some("5".to_string()),
            section: Some("A".to_string()),
            dateofbirth: None,
            gender: None,
            contact_number: None,
            guardian_name: None,
            address: None,
            email: format!("{}@school.test", admission_id.to_lowercase()),
            pwd_hash: "not-a-real-hash".to_string(),
            photo: None,
            school_code: school_code.to_string(),
        },
    )
    .await
    .expect("seed student")
}

pub async fn seed_teacher(pool: &SqlitePool, school_code: &str, employee_id: &str) -> Teacher {
    schooldesk::db::teachers::create_teacher(
        pool,
        NewTeacher {
            fullname: format!("Teacher {employee_id}"),
            subject: Some("Maths".to_string()),
            qualification: None,
            experience: None,
            dateofbirth: None,
            mobile_no: None,
            employee_id: employee_id.to_string(),
            present_address: None,
            email: format!("{}@school.test", employee_id.to_lowercase()),
            pwd_hash: "not-a-real-hash".to_string(),
            photo: None,
            school_code: school_code.to_string(),
        },
    )
    .await
    .expect("seed teacher")
}
