use sqlx::SqlitePool;

use crate::errors::{conflict_on_unique, AppError};
use crate::structs::CompanyAdmin;

pub async fn create_admin(
    pool: &SqlitePool,
    email: &str,
    pwd_hash: &str,
) -> Result<CompanyAdmin, AppError> {
    let created_at = super::now_string();
    let admin = sqlx::query_as::<_, CompanyAdmin>(
        "INSERT INTO company_admins (email, pwd_hash, created_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(email)
    .bind(pwd_hash)
    .bind(&created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| conflict_on_unique(e, "Email already exists"))?;
    log::info!("Company admin registered: {}", admin.email);
    Ok(admin)
}

pub async fn find_admin_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<CompanyAdmin>, AppError> {
    let admin = sqlx::query_as::<_, CompanyAdmin>("SELECT * FROM company_admins WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(admin)
}

pub async fn list_admins(pool: &SqlitePool) -> Result<Vec<CompanyAdmin>, AppError> {
    let admins = sqlx::query_as::<_, CompanyAdmin>("SELECT * FROM company_admins ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(admins)
}

pub async fn update_admin_password(
    pool: &SqlitePool,
    email: &str,
    pwd_hash: &str,
) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE company_admins SET pwd_hash = $1 WHERE email = $2")
        .bind(pwd_hash)
        .bind(email)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Admin not found".to_string()));
    }
    Ok(())
}
