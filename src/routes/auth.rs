use actix_web::{
    get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, AuthedPrincipal, Claims, PrincipalKind};
use crate::db;
use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

#[post("/register")]
pub async fn register_handler(
    web::Json(body): web::Json<Credentials>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }
    if !body.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let email = body.email.to_lowercase();
    let pwd_hash = auth::hash_password(&body.password)?;
    db::admins::create_admin(&state.db_pool, &email, &pwd_hash).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Admin registered successfully",
    })))
}

#[post("/login")]
pub async fn login_handler(
    web::Json(body): web::Json<Credentials>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password required".to_string(),
        ));
    }

    let email = body.email.to_lowercase();
    let admin = db::admins::find_admin_by_email(&state.db_pool, &email).await?;

    // Unknown email and wrong password answer identically.
    let Some(admin) = admin else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !auth::verify_password(&body.password, &admin.pwd_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = Claims::new(
        PrincipalKind::CompanyAdmin,
        admin.id,
        &admin.email,
        None,
        state.config.token_ttl_secs,
    );
    let token = auth::sign_token(&claims, &state.config.token_secret)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
    })))
}

#[get("/admins")]
pub async fn admins_handler(
    principal: AuthedPrincipal,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;

    let admins = db::admins::list_admins(&state.db_pool).await?;
    let admins: Vec<_> = admins
        .iter()
        .map(|a| json!({ "id": a.id, "email": a.email }))
        .collect();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "admins": admins })))
}

#[derive(Deserialize)]
pub struct UpdatePassword {
    email: String,
    new_password: String,
}

#[put("/update-password")]
pub async fn update_password_handler(
    principal: AuthedPrincipal,
    web::Json(body): web::Json<UpdatePassword>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;

    if body.email.trim().is_empty() || body.new_password.is_empty() {
        return Err(AppError::Validation(
            "Email and new_password required".to_string(),
        ));
    }

    let pwd_hash = auth::hash_password(&body.new_password)?;
    db::admins::update_admin_password(&state.db_pool, &body.email.to_lowercase(), &pwd_hash)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password updated successfully",
    })))
}
