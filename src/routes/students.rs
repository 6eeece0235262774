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
    students::{NewStudent, UpdateStudent},
};
use crate::errors::AppError;
use crate::{uploads, AppState};

#[derive(Deserialize)]
pub struct AddStudent {
    fullname: String,
    admission_id: String,
    standard: Option<String>,
    section: Option<String>,
    dateofbirth: Option<String>,
    gender: Option<String>,
    contact_number: Option<String>,
    guardian_name: Option<String>,
    address: Option<String>,
    email: String,
    password: String,
    photo: Option<String>,
    school_code: String,
}

#[post("/add")]
pub async fn add_handler(
    web::Json(body): web::Json<AddStudent>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.fullname.trim().is_empty()
        || body.admission_id.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.is_empty()
        || body.school_code.trim().is_empty()
    {
        return Err(AppError::Validation(
            "fullname, admission_id, email, password and school_code are required".to_string(),
        ));
    }
    if !body.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "student", body.photo.as_deref())?;
    let pwd_hash = auth::hash_password(&body.password)?;

    let student = db::students::create_student(
        &state.db_pool,
        NewStudent {
            fullname: body.fullname,
            admission_id: body.admission_id,
            standard: body.standard,
            section: body.section,
            dateofbirth: body.dateofbirth,
            gender: body.gender,
            contact_number: body.contact_number,
            guardian_name: body.guardian_name,
            address: body.address,
            email: body.email.to_lowercase(),
            pwd_hash,
            photo,
            school_code: body.school_code,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Student added successfully",
        "data": student,
    })))
}

#[derive(Deserialize)]
pub struct ListQuery {
    school_code: Option<String>,
}

#[get("")]
pub async fn list_handler(
    query: web::Query<ListQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let school_code = query
        .school_code
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("school_code required".to_string()))?;
    let students = db::students::list_students(&state.db_pool, school_code).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": students })))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    school_code: Option<String>,
    query: Option<String>,
}

#[get("/search")]
pub async fn search_handler(
    query: web::Query<SearchQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (Some(school_code), Some(needle)) = (query.school_code.as_deref(), query.query.as_deref())
    else {
        return Err(AppError::Validation(
            "query & school_code required".to_string(),
        ));
    };
    let students = db::students::search_students(&state.db_pool, school_code, needle).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": students.len(),
        "data": students,
    })))
}

#[derive(Deserialize)]
pub struct EditStudent {
    fullname: Option<String>,
    admission_id: Option<String>,
    standard: Option<String>,
    section: Option<String>,
    dateofbirth: Option<String>,
    gender: Option<String>,
    contact_number: Option<String>,
    guardian_name: Option<String>,
    address: Option<String>,
    email: Option<String>,
    photo: Option<String>,
}

#[put("/update/{id}")]
pub async fn update_handler(
    path: web::Path<i64>,
    web::Json(body): web::Json<EditStudent>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let old = db::students::get_student(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "student", body.photo.as_deref())?;

    let student = db::students::update_student(
        &state.db_pool,
        id,
        UpdateStudent {
            fullname: body.fullname,
            admission_id: body.admission_id,
            standard: body.standard,
            section: body.section,
            dateofbirth: body.dateofbirth,
            gender: body.gender,
            contact_number: body.contact_number,
            guardian_name: body.guardian_name,
            address: body.address,
            email: body.email.map(|e| e.to_lowercase()),
            photo: photo.clone(),
        },
    )
    .await?;

    if let (Some(new_photo), Some(old_photo)) = (photo, old.photo) {
        if new_photo != old_photo {
            uploads::delete_photo(&state.config.uploads_dir, &old_photo);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Student updated successfully",
        "data": student,
    })))
}

#[delete("/delete/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let student = db::students::delete_student(&state.db_pool, path.into_inner()).await?;
    if let Some(photo) = &student.photo {
        uploads::delete_photo(&state.config.uploads_dir, photo);
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Student deleted successfully",
    })))
}

#[derive(Deserialize)]
pub struct StudentLogin {
    email: String,
    password: String,
    school_code: String,
}

#[post("/login")]
pub async fn login_handler(
    web::Json(body): web::Json<StudentLogin>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.school_code.trim().is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    let student = db::students::find_student_login(
        &state.db_pool,
        &body.email.to_lowercase(),
        &body.school_code,
    )
    .await?;
    let Some(student) = student else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !auth::verify_password(&body.password, &student.pwd_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = Claims::new(
        PrincipalKind::Student,
        student.id,
        &student.admission_id,
        Some(&student.school_code),
        state.config.token_ttl_secs,
    );
    let token = auth::sign_token(&claims, &state.config.token_secret)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "data": student,
    })))
}

#[get("/profile")]
pub async fn profile_handler(
    principal: AuthedPrincipal,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let claims = principal.0.require(PrincipalKind::Student)?;
    let student = db::students::get_student(&state.db_pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": student })))
}

#[derive(Deserialize)]
pub struct EditProfile {
    fullname: Option<String>,
    dateofbirth: Option<String>,
    gender: Option<String>,
    contact_number: Option<String>,
    guardian_name: Option<String>,
    address: Option<String>,
    photo: Option<String>,
}

/// Self-service profile edit; admission_id, class placement and email
/// stay under school control.
#[put("/profile/update")]
pub async fn profile_update_handler(
    principal: AuthedPrincipal,
    web::Json(body): web::Json<EditProfile>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let claims = principal.0.require(PrincipalKind::Student)?;
    let old = db::students::get_student(&state.db_pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "student", body.photo.as_deref())?;

    let student = db::students::update_student(
        &state.db_pool,
        claims.id,
        UpdateStudent {
            fullname: body.fullname,
            dateofbirth: body.dateofbirth,
            gender: body.gender,
            contact_number: body.contact_number,
            guardian_name: body.guardian_name,
            address: body.address,
            photo: photo.clone(),
            ..Default::default()
        },
    )
    .await?;

    if let (Some(new_photo), Some(old_photo)) = (photo, old.photo) {
        if new_photo != old_photo {
            uploads::delete_photo(&state.config.uploads_dir, &old_photo);
        }
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": student,
    })))
}
