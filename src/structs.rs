use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::AppError;

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct CompanyAdmin {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct School {
    pub id: i64,
    pub school_name: String,
    pub school_code: String,
    pub contact_number: Option<String>,
    pub account_type: String,
    pub education_type: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub active: i64,
    pub active_date: Option<String>,
    pub deactive_date: Option<String>,
    pub school_logo: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Teacher {
    pub id: i64,
    pub fullname: String,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub dateofbirth: Option<String>,
    pub mobile_no: Option<String>,
    pub employee_id: String,
    pub present_address: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub photo: Option<String>,
    pub school_code: String,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Student {
    pub id: i64,
    pub fullname: String,
    pub admission_id: String,
    pub standard: Option<String>,
    pub section: Option<String>,
    pub dateofbirth: Option<String>,
    pub gender: Option<String>,
    pub contact_number: Option<String>,
    pub guardian_name: Option<String>,
    pub address: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub photo: Option<String>,
    pub school_code: String,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub school_code: String,
    pub person_id: String,
    pub person_type: String,
    pub date: String,
    pub status: String,
    pub marked_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Attendance row joined with the person's name for the day-roster view.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct AttendanceView {
    pub person_id: String,
    pub person_type: String,
    pub date: String,
    pub status: String,
    pub marked_by: String,
    pub created_at: String,
    pub person_name: String,
}

#[derive(Serialize, Debug, Clone, FromRow)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct ClassAssignment {
    pub id: i64,
    pub school_code: String,
    pub standard: String,
    pub section: String,
    pub teacher_id: i64,
    pub teacher_name: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct FeeMaster {
    pub id: i64,
    pub admission_id: String,
    pub student_id: i64,
    pub school_code: String,
    pub total_fee_amount: f64,
    pub remarks: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct FeePayment {
    pub id: i64,
    pub fee_master_id: i64,
    pub admission_id: String,
    pub student_id: i64,
    pub school_code: String,
    pub paying_now: f64,
    pub pending_after: f64,
    pub payment_date: String,
    pub due_date: Option<String>,
    pub fine_amount: f64,
    pub fine_waived_by: Option<String>,
    pub remarks: Option<String>,
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct FeePaymentItem {
    pub id: i64,
    pub payment_id: i64,
    pub fee_master_id: i64,
    pub fee_head: String,
    pub amount: f64,
    pub note: Option<String>,
    pub status: String,
    pub settled_by_payment_id: Option<i64>,
}

/// Marking status for one person-day. Anything outside this set is rejected
/// before it reaches the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
    HalfDay,
    Holiday,
}

impl AttendanceStatus {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Absent" => Ok(AttendanceStatus::Absent),
            "Leave" => Ok(AttendanceStatus::Leave),
            "Half-Day" => Ok(AttendanceStatus::HalfDay),
            "Holiday" => Ok(AttendanceStatus::Holiday),
            other => Err(AppError::Validation(format!(
                "Invalid attendance status: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Leave => "Leave",
            AttendanceStatus::HalfDay => "Half-Day",
            AttendanceStatus::Holiday => "Holiday",
        }
    }
}

/// The two kinds of people an attendance row can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonType {
    Student,
    Teacher,
}

impl PersonType {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "student" => Ok(PersonType::Student),
            "teacher" => Ok(PersonType::Teacher),
            other => Err(AppError::Validation(format!(
                "Invalid person type: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonType::Student => "student",
            PersonType::Teacher => "teacher",
        }
    }
}
