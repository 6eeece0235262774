use actix_web::{
    delete, get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, AuthedPrincipal, Claims, PrincipalKind};
use crate::db::{
    self,
    schools::{NewSchool, UpdateSchool},
};
use crate::errors::AppError;
use crate::{uploads, AppState};

#[derive(Deserialize)]
pub struct SchoolLogin {
    email: String,
    password: String,
    school_code: String,
}

#[post("/login")]
pub async fn login_handler(
    web::Json(body): web::Json<SchoolLogin>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.school_code.trim().is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    let school = db::schools::find_school_login(
        &state.db_pool,
        &body.email.to_lowercase(),
        &body.school_code,
    )
    .await?;
    let Some(school) = school else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !auth::verify_password(&body.password, &school.pwd_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }
    if school.active == 0 {
        return Err(AppError::Forbidden(
            "School account is deactivated".to_string(),
        ));
    }

    let claims = Claims::new(
        PrincipalKind::SchoolAdmin,
        school.id,
        &school.email,
        Some(&school.school_code),
        state.config.token_ttl_secs,
    );
    let token = auth::sign_token(&claims, &state.config.token_secret)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "school": school,
    })))
}

#[derive(Deserialize)]
pub struct AddSchool {
    school_name: String,
    school_code: String,
    contact_number: Option<String>,
    account_type: Option<String>,
    education_type: Option<String>,
    email: String,
    password: String,
    active: Option<i64>,
    active_date: Option<String>,
    deactive_date: Option<String>,
    school_logo: Option<String>,
}

#[post("")]
pub async fn add_handler(
    principal: AuthedPrincipal,
    web::Json(body): web::Json<AddSchool>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;

    if body.school_name.trim().is_empty()
        || body.school_code.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.is_empty()
    {
        return Err(AppError::Validation(
            "school_name, school_code, email and password are required".to_string(),
        ));
    }

    let school_logo = uploads::resolve_photo(
        &state.config.uploads_dir,
        "school",
        body.school_logo.as_deref(),
    )?;
    let pwd_hash = auth::hash_password(&body.password)?;

    let school = db::schools::create_school(
        &state.db_pool,
        NewSchool {
            school_name: body.school_name,
            school_code: body.school_code,
            contact_number: body.contact_number,
            account_type: body.account_type,
            education_type: body.education_type,
            email: body.email.to_lowercase(),
            pwd_hash,
            active: body.active,
            active_date: body.active_date,
            deactive_date: body.deactive_date,
            school_logo,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "School added successfully",
        "school_id": school.id,
        "data": school,
    })))
}

#[get("")]
pub async fn list_handler(
    principal: AuthedPrincipal,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;
    let schools = db::schools::list_schools(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": schools })))
}

#[get("/{id}")]
pub async fn get_handler(
    principal: AuthedPrincipal,
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;
    let school = db::schools::get_school(&state.db_pool, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": school })))
}

#[derive(Deserialize)]
pub struct EditSchool {
    school_name: Option<String>,
    contact_number: Option<String>,
    account_type: Option<String>,
    education_type: Option<String>,
    email: Option<String>,
    password: Option<String>,
    active: Option<i64>,
    active_date: Option<String>,
    deactive_date: Option<String>,
    school_logo: Option<String>,
}

#[put("/{id}")]
pub async fn update_handler(
    principal: AuthedPrincipal,
    path: web::Path<i64>,
    web::Json(body): web::Json<EditSchool>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;
    let id = path.into_inner();

    let old = db::schools::get_school(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("School not found".to_string()))?;

    let school_logo = uploads::resolve_photo(
        &state.config.uploads_dir,
        "school",
        body.school_logo.as_deref(),
    )?;
    let pwd_hash = match body.password.as_deref() {
        Some(p) if !p.is_empty() => Some(auth::hash_password(p)?),
        _ => None,
    };

    let school = db::schools::update_school(
        &state.db_pool,
        id,
        UpdateSchool {
            school_name: body.school_name,
            contact_number: body.contact_number,
            account_type: body.account_type,
            education_type: body.education_type,
            email: body.email.map(|e| e.to_lowercase()),
            pwd_hash,
            active: body.active,
            active_date: body.active_date,
            deactive_date: body.deactive_date,
            school_logo: school_logo.clone(),
        },
    )
    .await?;

    // Drop the superseded logo file once the row points elsewhere.
    if let (Some(new_logo), Some(old_logo)) = (school_logo, old.school_logo) {
        if new_logo != old_logo {
            uploads::delete_photo(&state.config.uploads_dir, &old_logo);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "School updated successfully",
        "data": school,
    })))
}

#[delete("/{id}")]
pub async fn delete_handler(
    principal: AuthedPrincipal,
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    principal.0.require(PrincipalKind::CompanyAdmin)?;

    let files = db::schools::delete_school_cascade(&state.db_pool, path.into_inner()).await?;
    for file in &files {
        uploads::delete_photo(&state.config.uploads_dir, file);
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "School deleted successfully",
    })))
}
