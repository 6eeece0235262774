use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::ClassAssignment;

pub struct NewAssignment {
    pub school_code: String,
    pub standard: String,
    pub section: String,
    pub teacher_id: i64,
    pub teacher_name: String,
}

pub async fn list_assignments(
    pool: &SqlitePool,
    school_code: &str,
    standard: Option<&str>,
    teacher_name: Option<&str>,
) -> Result<Vec<ClassAssignment>, AppError> {
    let mut sql =
        String::from("SELECT * FROM class_teacher_assignments WHERE school_code = $1");
    let mut param_index = 2;
    if standard.is_some() {
        sql.push_str(&format!(" AND standard = ${}", param_index));
        param_index += 1;
    }
    if teacher_name.is_some() {
        sql.push_str(&format!(" AND teacher_name LIKE ${}", param_index));
    }
    sql.push_str(" ORDER BY standard, section");

    let mut q = sqlx::query_as::<_, ClassAssignment>(&sql).bind(school_code);
    if let Some(standard) = standard {
        q = q.bind(standard);
    }
    if let Some(teacher_name) = teacher_name {
        q = q.bind(format!("%{}%", teacher_name));
    }
    let rows = q.fetch_all(pool).await?;
    Ok(rows)
}

pub async fn assign_teacher(
    pool: &SqlitePool,
    assignment: NewAssignment,
) -> Result<ClassAssignment, AppError> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM class_teacher_assignments \
         WHERE school_code = $1 AND standard = $2 AND section = $3",
    )
    .bind(&assignment.school_code)
    .bind(&assignment.standard)
    .bind(&assignment.section)
    .fetch_optional(pool)
    .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Assignment already exists for this class & section".to_string(),
        ));
    }

    let row = sqlx::query_as::<_, ClassAssignment>(
        "INSERT INTO class_teacher_assignments (school_code, standard, section, teacher_id, teacher_name) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(&assignment.school_code)
    .bind(&assignment.standard)
    .bind(&assignment.section)
    .bind(assignment.teacher_id)
    .bind(&assignment.teacher_name)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Assignment already exists for this class & section"))?;
    log::info!(
        "Teacher {} assigned to {}-{} in {}",
        row.teacher_name,
        row.standard,
        row.section,
        row.school_code
    );
    Ok(row)
}

pub async fn edit_assignment(
    pool: &SqlitePool,
    id: i64,
    standard: &str,
    section: &str,
    teacher_id: i64,
    teacher_name: &str,
) -> Result<ClassAssignment, AppError> {
    let current = sqlx::query_as::<_, ClassAssignment>(
        "SELECT * FROM class_teacher_assignments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    let taken = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM class_teacher_assignments \
         WHERE school_code = $1 AND standard = $2 AND section = $3 AND id <> $4",
    )
    .bind(&current.school_code)
    .bind(standard)
    .bind(section)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(
            "Assignment already exists for this class & section".to_string(),
        ));
    }

    let row = sqlx::query_as::<_, ClassAssignment>(
        "UPDATE class_teacher_assignments \
         SET standard = $1, section = $2, teacher_id = $3, teacher_name = $4 \
         WHERE id = $5 RETURNING *",
    )
    .bind(standard)
    .bind(section)
    .bind(teacher_id)
    .bind(teacher_name)
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Assignment already exists for this class & section"))?;
    Ok(row)
}

pub async fn delete_assignment(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM class_teacher_assignments WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Assignment not found".to_string()));
    }
    log::info!("Assignment with id {} deleted", id);
    Ok(())
}
