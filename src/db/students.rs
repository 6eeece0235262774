use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::Student;

pub struct NewStudent {
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
    pub pwd_hash: String,
    pub photo: Option<String>,
    pub school_code: String,
}

#[derive(Default)]
pub struct UpdateStudent {
    pub fullname: Option<String>,
    pub admission_id: Option<String>,
    pub standard: Option<String>,
    pub section: Option<String>,
    pub dateofbirth: Option<String>,
    pub gender: Option<String>,
    pub contact_number: Option<String>,
    pub guardian_name: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
}

pub async fn create_student(pool: &SqlitePool, student: NewStudent) -> Result<Student, AppError> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM students WHERE admission_id = $1 AND school_code = $2",
    )
    .bind(&student.admission_id)
    .bind(&student.school_code)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Admission ID already exists in this school".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM students WHERE email = $1 AND school_code = $2",
    )
    .bind(&student.email)
    .bind(&student.school_code)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Email already exists in this school".to_string(),
        ));
    }

    let created_at = super::now_string();
    let row = sqlx::query_as::<_, Student>(
        "INSERT INTO students (fullname, admission_id, standard, section, dateofbirth, gender, \
         contact_number, guardian_name, address, email, pwd_hash, photo, school_code, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING *",
    )
    .bind(&student.fullname)
    .bind(&student.admission_id)
    .bind(&student.standard)
    .bind(&student.section)
    .bind(&student.dateofbirth)
    .bind(&student.gender)
    .bind(&student.contact_number)
    .bind(&student.guardian_name)
    .bind(&student.address)
    .bind(&student.email)
    .bind(&student.pwd_hash)
    .bind(&student.photo)
    .bind(&student.school_code)
    .bind(&created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Admission ID or email already exists in this school"))?;
    log::info!("Student created: {} ({})", row.fullname, row.admission_id);
    Ok(row)
}

pub async fn list_students(pool: &SqlitePool, school_code: &str) -> Result<Vec<Student>, AppError> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE school_code = $1 ORDER BY id DESC",
    )
    .bind(school_code)
    .fetch_all(pool)
    .await?;
    Ok(students)
}

pub async fn search_students(
    pool: &SqlitePool,
    school_code: &str,
    query: &str,
) -> Result<Vec<Student>, AppError> {
    let pattern = format!("%{}%", query);
    let students = sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE school_code = $1 AND \
         (fullname LIKE $2 OR email LIKE $2 OR contact_number LIKE $2 \
          OR admission_id LIKE $2 OR standard LIKE $2 OR CAST(id AS TEXT) LIKE $2) \
         ORDER BY id DESC",
    )
    .bind(school_code)
    .bind(&pattern)
    .fetch_all(pool)
    .await?;
    Ok(students)
}

pub async fn get_student(pool: &SqlitePool, id: i64) -> Result<Option<Student>, AppError> {
    let student = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(student)
}

pub async fn find_by_admission(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<Option<Student>, AppError> {
    let student = sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE admission_id = $1 AND school_code = $2",
    )
    .bind(admission_id)
    .bind(school_code)
    .fetch_optional(pool)
    .await?;
    Ok(student)
}

pub async fn find_student_login(
    pool: &SqlitePool,
    email: &str,
    school_code: &str,
) -> Result<Option<Student>, AppError> {
    let student =
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE email = $1 AND school_code = $2")
            .bind(email)
            .bind(school_code)
            .fetch_optional(pool)
            .await?;
    Ok(student)
}

/// Roster of one (standard, section) class, for the class-teacher view.
pub async fn class_roster(
    pool: &SqlitePool,
    school_code: &str,
    standard: &str,
    section: &str,
) -> Result<Vec<Student>, AppError> {
    let students = sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE school_code = $1 AND standard = $2 AND section = $3 \
         ORDER BY id",
    )
    .bind(school_code)
    .bind(standard)
    .bind(section)
    .fetch_all(pool)
    .await?;
    Ok(students)
}

pub async fn update_student(
    pool: &SqlitePool,
    id: i64,
    fields: UpdateStudent,
) -> Result<Student, AppError> {
    let current = get_student(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    if let Some(admission_id) = &fields.admission_id {
        if *admission_id != current.admission_id {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM students WHERE admission_id = $1 AND school_code = $2 AND id <> $3",
            )
            .bind(admission_id)
            .bind(&current.school_code)
            .bind(id)
            .fetch_optional(pool)
            .await?;
            if taken.is_some() {
                return Err(AppError::Conflict(
                    "Admission ID already exists in this school".to_string(),
                ));
            }
        }
    }
    if let Some(email) = &fields.email {
        if *email != current.email {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM students WHERE email = $1 AND school_code = $2 AND id <> $3",
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

    let row = sqlx::query_as::<_, Student>(
        "UPDATE students SET \
           fullname       = COALESCE($1, fullname), \
           admission_id   = COALESCE($2, admission_id), \
           standard       = COALESCE($3, standard), \
           section        = COALESCE($4, section), \
           dateofbirth    = COALESCE($5, dateofbirth), \
           gender         = COALESCE($6, gender), \
           contact_number = COALESCE($7, contact_number), \
           guardian_name  = COALESCE($8, guardian_name), \
           address        = COALESCE($9, address), \
           email          = COALESCE($10, email), \
           photo          = COALESCE($11, photo) \
         WHERE id = $12 RETURNING *",
    )
    .bind(&fields.fullname)
    .bind(&fields.admission_id)
    .bind(&fields.standard)
    .bind(&fields.section)
    .bind(&fields.dateofbirth)
    .bind(&fields.gender)
    .bind(&fields.contact_number)
    .bind(&fields.guardian_name)
    .bind(&fields.address)
    .bind(&fields.email)
    .bind(&fields.photo)
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Admission ID or email already exists in this school"))?;
    Ok(row)
}

pub async fn delete_student(pool: &SqlitePool, id: i64) -> Result<Student, AppError> {
    let student = get_student(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    sqlx::query("DELETE FROM students WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    log::info!("Student with id {} deleted", id);
    Ok(student)
}
