use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::{AttendanceRecord, AttendanceView, StatusCount};

pub struct AttendanceMark {
    pub school_code: String,
    pub person_id: String,
    pub person_type: String,
    pub date: String,
    pub status: String,
    pub marked_by: String,
}

/// First mark for a person-day. The unique index on
/// (school_code, person_id, person_type, date) is what actually enforces the
/// one-record-per-day invariant; a lost race surfaces as the same conflict.
pub async fn add_attendance(pool: &SqlitePool, mark: &AttendanceMark) -> Result<(), AppError> {
    let now = super::now_string();
    sqlx::query(
        "INSERT INTO attendance (school_code, person_id, person_type, date, status, marked_by, \
         created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&mark.school_code)
    .bind(&mark.person_id)
    .bind(&mark.person_type)
    .bind(&mark.date)
    .bind(&mark.status)
    .bind(&mark.marked_by)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Attendance already exists. Use update."))?;
    Ok(())
}

/// Changes status and marked_by for an existing tuple; the key columns are
/// only ever matched, never rewritten.
pub async fn update_attendance(pool: &SqlitePool, mark: &AttendanceMark) -> Result<(), AppError> {
    let now = super::now_string();
    let result = sqlx::query(
        "UPDATE attendance SET status = $1, marked_by = $2, updated_at = $3 \
         WHERE school_code = $4 AND person_id = $5 AND person_type = $6 AND date = $7",
    )
    .bind(&mark.status)
    .bind(&mark.marked_by)
    .bind(&now)
    .bind(&mark.school_code)
    .bind(&mark.person_id)
    .bind(&mark.person_type)
    .bind(&mark.date)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "No attendance found to update".to_string(),
        ));
    }
    Ok(())
}

/// Day roster for one person type, joined with the person's name.
pub async fn view_by_date(
    pool: &SqlitePool,
    school_code: &str,
    date: &str,
    person_type: &str,
) -> Result<Vec<AttendanceView>, AppError> {
    let rows = sqlx::query_as::<_, AttendanceView>(
        "SELECT a.person_id, a.person_type, a.date, a.status, a.marked_by, a.created_at, \
           COALESCE( \
             CASE WHEN a.person_type = 'student' THEN s.fullname END, \
             CASE WHEN a.person_type = 'teacher' THEN t.fullname END, \
           '') AS person_name \
         FROM attendance a \
         LEFT JOIN students s ON a.person_type = 'student' \
           AND a.person_id = s.admission_id AND s.school_code = a.school_code \
         LEFT JOIN teachers t ON a.person_type = 'teacher' \
           AND a.person_id = t.employee_id AND t.school_code = a.school_code \
         WHERE a.school_code = $1 AND a.date = $2 AND a.person_type = $3 \
         ORDER BY a.person_id",
    )
    .bind(school_code)
    .bind(date)
    .bind(person_type)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn check_attendance(
    pool: &SqlitePool,
    school_code: &str,
    person_id: &str,
    date: &str,
    person_type: &str,
) -> Result<Option<AttendanceRecord>, AppError> {
    let record = sqlx::query_as::<_, AttendanceRecord>(
        "SELECT * FROM attendance \
         WHERE school_code = $1 AND person_id = $2 AND date = $3 AND person_type = $4 LIMIT 1",
    )
    .bind(school_code)
    .bind(person_id)
    .bind(date)
    .bind(person_type)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Per-status counts for one person. Without a range this spans all time; the
/// optional inclusive bounds support per-term and per-month views.
pub async fn summary(
    pool: &SqlitePool,
    school_code: &str,
    person_id: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<Vec<StatusCount>, AppError> {
    let mut sql = String::from(
        "SELECT status, COUNT(*) AS count FROM attendance \
         WHERE school_code = $1 AND person_id = $2",
    );
    let mut param_index = 3;
    if from.is_some() {
        sql.push_str(&format!(" AND date >= ${}", param_index));
        param_index += 1;
    }
    if to.is_some() {
        sql.push_str(&format!(" AND date <= ${}", param_index));
    }
    sql.push_str(" GROUP BY status ORDER BY status");

    let mut q = sqlx::query_as::<_, StatusCount>(&sql)
        .bind(school_code)
        .bind(person_id);
    if let Some(from) = from {
        q = q.bind(from);
    }
    if let Some(to) = to {
        q = q.bind(to);
    }
    let counts = q.fetch_all(pool).await?;
    Ok(counts)
}
