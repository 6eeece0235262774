use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::Teacher;

pub struct NewTeacher {
    pub fullname: String,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub dateofbirth: Option<String>,
    pub mobile_no: Option<String>,
    pub employee_id: String,
    pub present_address: Option<String>,
    pub email: String,
    pub pwd_hash: String,
    pub photo: Option<String>,
    pub school_code: String,
}

#[derive(Default)]
pub struct UpdateTeacher {
    pub fullname: Option<String>,
    pub subject: Option<String>,
    pub qualification: Option<String>,
    pub experience: Option<String>,
    pub dateofbirth: Option<String>,
    pub mobile_no: Option<String>,
    pub employee_id: Option<String>,
    pub present_address: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

pub async fn create_teacher(pool: &SqlitePool, teacher: NewTeacher) -> Result<Teacher, AppError> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM teachers WHERE employee_id = $1 AND school_code = $2",
    )
    .bind(&teacher.employee_id)
    .bind(&teacher.school_code)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Employee ID already exists in this school".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM teachers WHERE email = $1 AND school_code = $2",
    )
    .bind(&teacher.email)
    .bind(&teacher.school_code)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Email already exists in this school".to_string(),
        ));
    }

    let created_at = super::now_string();
    let row = sqlx::query_as::<_, Teacher>(
        "INSERT INTO teachers (fullname, subject, qualification, experience, dateofbirth, \
         mobile_no, employee_id, present_address, email, pwd_hash, photo, school_code, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
    )
    .bind(&teacher.fullname)
    .bind(&teacher.subject)
    .bind(&teacher.qualification)
    .bind(&teacher.experience)
    .bind(&teacher.dateofbirth)
    .bind(&teacher.mobile_no)
    .bind(&teacher.employee_id)
    .bind(&teacher.present_address)
    .bind(&teacher.email)
    .bind(&teacher.pwd_hash)
    .bind(&teacher.photo)
    .bind(&teacher.school_code)
    .bind(&created_at)
    .fetch_one(pool)
    .await
    // The unique indexes backstop the checks above under concurrency.
    .map_err(|e| conflict_on_unique(e, "Employee ID or email already exists in this school"))?;
    log::info!("Teacher created: {} ({})", row.fullname, row.employee_id);
    Ok(row)
}

pub async fn list_teachers(pool: &SqlitePool, school_code: &str) -> Result<Vec<Teacher>, AppError> {
    let teachers =
        sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE school_code = $1 ORDER BY id")
            .bind(school_code)
            .fetch_all(pool)
            .await?;
    Ok(teachers)
}

pub async fn search_teachers(
    pool: &SqlitePool,
    school_code: &str,
    query: &str,
) -> Result<Vec<Teacher>, AppError> {
    let pattern = format!("%{}%", query);
    let teachers = sqlx::query_as::<_, Teacher>(
        "SELECT * FROM teachers WHERE school_code = $1 AND \
         (fullname LIKE $2 OR subject LIKE $2 OR email LIKE $2 \
          OR mobile_no LIKE $2 OR employee_id LIKE $2) \
         ORDER BY id",
    )
    .bind(school_code)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;
    Ok(teachers)
}

pub async fn get_teacher(pool: &SqlitePool, id: i64) -> Result<Option<Teacher>, AppError> {
    let teacher = sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(teacher)
}

pub async fn find_teacher_login(
    pool: &SqlitePool,
    email: &str,
    school_code: &str,
) -> Result<Option<Teacher>, AppError> {
    let teacher =
        sqlx::query_as::<_, Teacher>("SELECT * FROM teachers WHERE email = $1 AND school_code = $2")
            .bind(email)
            .bind(school_code)
            .fetch_optional(pool)
            .await?;
    Ok(teacher)
}

pub async fn update_teacher(
    pool: &SqlitePool,
    id: i64,
    fields: UpdateTeacher,
) -> Result<Teacher, AppError> {
    let current = get_teacher(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;

    if let Some(employee_id) = &fields.employee_id {
        if *employee_id != current.employee_id {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM teachers WHERE employee_id = $1 AND school_code = $2 AND id <> $3",
            )
            .bind(employee_id)
            .bind(&current.school_code)
            .bind(id)
            .fetch_optional(pool)
            .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(
                    "Employee ID already exists in this school".to_string(),
                ));
            }
        }
    }
    if let Some(email) = &fields.email {
        if *email != current.email {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM teachers WHERE email = $1 AND school_code = $2 AND id <> $3",
            )
            .bind(email)
            .bind(&current.school_code)
            .bind(id)
            .fetch_optional(pool)
            .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(
                    "Email already exists in this school".to_string(),
                ));
            }
        }
    }

    let row = sqlx::query_as::<_, Teacher>(
        "UPDATE teachers SET \
           fullname       = COALESCE($1, fullname), \
           subject        = COALESCE($2, subject), \
           qualification  = COALESCE($3, qualification), \
           experience     = COALESCE($4, experience), \
           dateofbirth    = COALESCE($5, dateofbirth), \
           mobile_no      = COALESCE($6, mobile_no), \
           employee_id    = COALESCE($7, employee_id), \
           present_address = COALESCE($8, present_address), \
           email          = COALESCE($9, email), \
           photo          = COALESCE($10, photo) \
         WHERE id = $11 RETURNING *",
    )
    .bind(&fields.fullname)
    .bind(&fields.subject)
    .bind(&fields.qualification)
    .bind(&fields.experience)
    .bind(&fields.dateofbirth)
    .bind(&fields.mobile_no)
    .bind(&fields.employee_id)
    .bind(&fields.present_address)
    .bind(&fields.email)
    .bind(&fields.photo)
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Employee ID or email already exists in this school"))?;
    Ok(row)
}

pub async fn delete_teacher(pool: &SqlitePool, id: i64) -> Result<Teacher, AppError> {
    let teacher = get_teacher(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;
    sqlx::query("DELETE FROM teachers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("Teacher with id {} deleted", id);
    Ok(teacher)
}
