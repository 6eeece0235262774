use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::School;

pub struct NewSchool {
    pub school_name: String,
    pub school_code: String,
    pub contact_number: Option<String>,
    pub account_type: Option<String>,
    pub education_type: Option<String>,
    pub email: String,
    pub pwd_hash: String,
    pub active: Option<i64>,
    pub active_date: Option<String>,
    pub deactive_date: Option<String>,
    pub school_logo: Option<String>,
}

#[derive(Default)]
pub struct UpdateSchool {
    pub school_name: Option<String>,
    pub contact_number: Option<String>,
    pub account_type: Option<String>,
    pub education_type: Option<String>,
    pub email: Option<String>,
    pub pwd_hash: Option<String>,
    pub active: Option<i64>,
    pub active_date: Option<String>,
    pub deactive_date: Option<String>,
    pub school_logo: Option<String>,
}

pub async fn create_school(pool: &SqlitePool, school: NewSchool) -> Result<School, AppError> {
    let created_at = super::now_string();
    let row = sqlx::query_as::<_, School>(
        "INSERT INTO schools (school_name, school_code, contact_number, account_type, \
         education_type, email, pwd_hash, active, active_date, deactive_date, school_logo, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
    )
    .bind(&school.school_name)
    .bind(&school.school_code)
    .bind(&school.contact_number)
    .bind(school.account_type.as_deref().unwrap_or("standard"))
    .bind(school.education_type.as_deref().unwrap_or("school"))
    .bind(&school.email)
    .bind(&school.pwd_hash)
    .bind(school.active.unwrap_or(1))
    .bind(&school.active_date)
    .bind(&school.deactive_date)
    .bind(&school.school_logo)
    .bind(&created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "School code already exists"))?;
    log::info!("School created: {} ({})", row.school_name, row.school_code);
    Ok(row)
}

pub async fn list_schools(pool: &SqlitePool) -> Result<Vec<School>, AppError> {
    let schools = sqlx::query_as::<_, School>("SELECT * FROM schools ORDER BY id DESC")
        .fetch_all(pool)
        .await?;
    Ok(schools)
}

pub async fn get_school(pool: &SqlitePool, id: i64) -> Result<Option<School>, AppError> {
    let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(school)
}

pub async fn find_school_login(
    pool: &SqlitePool,
    email: &str,
    school_code: &str,
) -> Result<Option<School>, AppError> {
    let school =
        sqlx::query_as::<_, School>("SELECT * FROM schools WHERE email = $1 AND school_code = $2")
            .bind(email)
            .bind(school_code)
            .fetch_optional(pool)
            .await?;
    Ok(school)
}

/// Partial update; absent fields keep their stored value (the COALESCE form
/// the original used for password and logo, applied uniformly).
pub async fn update_school(
    pool: &SqlitePool,
    id: i64,
    fields: UpdateSchool,
) -> Result<School, AppError> {
    let row = sqlx::query_as::<_, School>(
        "UPDATE schools SET \
           school_name   = COALESCE($1, school_name), \
           contact_number = COALESCE($2, contact_number), \
           account_type  = COALESCE($3, account_type), \
           education_type = COALESCE($4, education_type), \
           email         = COALESCE($5, email), \
           pwd_hash      = COALESCE($6, pwd_hash), \
           active        = COALESCE($7, active), \
           active_date   = COALESCE($8, active_date), \
           deactive_date = COALESCE($9, deactive_date), \
           school_logo   = COALESCE($10, school_logo) \
         WHERE id = $11 RETURNING *",
    )
    .bind(&fields.school_name)
    .bind(&fields.contact_number)
    .bind(&fields.account_type)
    .bind(&fields.education_type)
    .bind(&fields.email)
    .bind(&fields.pwd_hash)
    .bind(fields.active)
    .bind(&fields.active_date)
    .bind(&fields.deactive_date)
    .bind(&fields.school_logo)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;
    Ok(row)
}

/// Deletes a school and everything it owns in one transaction. Returns the
/// stored photo/logo paths so the caller can clean up files after commit.
pub async fn delete_school_cascade(pool: &SqlitePool, id: i64) -> Result<Vec<String>, AppError> {
    let mut tx = pool.begin().await?;

    let school = sqlx::query_as::<_, School>("SELECT * FROM schools WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;
    let code = school.school_code.clone();

    let mut files: Vec<String> = sqlx::query_scalar::<_, String>(
        "SELECT photo FROM teachers WHERE school_code = $1 AND photo IS NOT NULL",
    )
    .bind(&code)
    .fetch_all(&mut *tx)
    .await?;
    files.extend(
        sqlx::query_scalar::<_, String>(
            "SELECT photo FROM students WHERE school_code = $1 AND photo IS NOT NULL",
        )
        .bind(&code)
        .fetch_all(&mut *tx)
        .await?,
    );
    if let Some(logo) = school.school_logo.clone() {
        files.push(logo);
    }

    sqlx::query(
        "DELETE FROM fee_payment_items WHERE fee_master_id IN \
         (SELECT id FROM fee_master WHERE school_code = $1)",
    )
    .bind(&code)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM fee_payments WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM fee_master WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM attendance WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM class_teacher_assignments WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM teachers WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM students WHERE school_code = $1")
        .bind(&code)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM schools WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    log::info!("School {} deleted with all owned records", code);
    Ok(files)
}
