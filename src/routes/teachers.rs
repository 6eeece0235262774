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
    teachers::{NewTeacher, UpdateTeacher},
};
use crate::errors::AppError;
use crate::{uploads, AppState};

#[derive(Deserialize)]
pub struct AddTeacher {
    fullname: String,
    subject: Option<String>,
    qualification: Option<String>,
    experience: Option<String>,
    dateofbirth: Option<String>,
    mobile_no: Option<String>,
    employee_id: String,
    present_address: Option<String>,
    email: String,
    password: String,
    photo: Option<String>,
    school_code: String,
}

#[post("/add")]
pub async fn add_handler(
    web::Json(body): web::Json<AddTeacher>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.fullname.trim().is_empty()
        || body.employee_id.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.is_empty()
        || body.school_code.trim().is_empty()
    {
        return Err(AppError::Validation(
            "fullname, employee_id, email, password and school_code are required".to_string(),
        ));
    }
    if !body.email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "teacher", body.photo.as_deref())?;
    let pwd_hash = auth::hash_password(&body.password)?;

    let teacher = db::teachers::create_teacher(
        &state.db_pool,
        NewTeacher {
            fullname: body.fullname,
            subject: body.subject,
            qualification: body.qualification,
            experience: body.experience,
            dateofbirth: body.dateofbirth,
            mobile_no: body.mobile_no,
            employee_id: body.employee_id,
            present_address: body.present_address,
            email: body.email.to_lowercase(),
            pwd_hash,
            photo,
            school_code: body.school_code,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Teacher added successfully",
        "data": teacher,
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
    let teachers = db::teachers::list_teachers(&state.db_pool, school_code).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": teachers })))
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
    let teachers = db::teachers::search_teachers(&state.db_pool, school_code, needle).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": teachers.len(),
        "data": teachers,
    })))
}

#[derive(Deserialize)]
pub struct EditTeacher {
    fullname: Option<String>,
    subject: Option<String>,
    qualification: Option<String>,
    experience: Option<String>,
    dateofbirth: Option<String>,
    mobile_no: Option<String>,
    employee_id: Option<String>,
    present_address: Option<String>,
    email: Option<String>,
    photo: Option<String>,
}

#[put("/update/{id}")]
pub async fn update_handler(
    path: web::Path<i64>,
    web::Json(body): web::Json<EditTeacher>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let old = db::teachers::get_teacher(&state.db_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "teacher", body.photo.as_deref())?;

    let teacher = db::teachers::update_teacher(
        &state.db_pool,
        id,
        UpdateTeacher {
            fullname: body.fullname,
            subject: body.subject,
            qualification: body.qualification,
            experience: body.experience,
            dateofbirth: body.dateofbirth,
            mobile_no: body.mobile_no,
            employee_id: body.employee_id,
            present_address: body.present_address,
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
        "message": "Teacher updated successfully",
        "data": teacher,
    })))
}

#[delete("/delete/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let teacher = db::teachers::delete_teacher(&state.db_pool, path.into_inner()).await?;
    if let Some(photo) = &teacher.photo {
        uploads::delete_photo(&state.config.uploads_dir, photo);
    }
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Teacher deleted successfully",
    })))
}

#[derive(Deserialize)]
pub struct TeacherLogin {
    email: String,
    password: String,
    school_code: String,
}

#[post("/login")]
pub async fn login_handler(
    web::Json(body): web::Json<TeacherLogin>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.school_code.trim().is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    let teacher = db::teachers::find_teacher_login(
        &state.db_pool,
        &body.email.to_lowercase(),
        &body.school_code,
    )
    .await?;
    let Some(teacher) = teacher else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !auth::verify_password(&body.password, &teacher.pwd_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let claims = Claims::new(
        PrincipalKind::Teacher,
        teacher.id,
        &teacher.employee_id,
        Some(&teacher.school_code),
        state.config.token_ttl_secs,
    );
    let token = auth::sign_token(&claims, &state.config.token_secret)?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "data": teacher,
    })))
}

#[get("/profile")]
pub async fn profile_handler(
    principal: AuthedPrincipal,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let claims = principal.0.require(PrincipalKind::Teacher)?;
    let teacher = db::teachers::get_teacher(&state.db_pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": teacher })))
}

#[derive(Deserialize)]
pub struct EditProfile {
    fullname: Option<String>,
    subject: Option<String>,
    qualification: Option<String>,
    experience: Option<String>,
    dateofbirth: Option<String>,
    mobile_no: Option<String>,
    present_address: Option<String>,
    photo: Option<String>,
}

/// Self-service profile edit; identity fields (employee_id, email,
/// school_code) are deliberately not editable here.
#[put("/profile/update")]
pub async fn profile_update_handler(
    principal: AuthedPrincipal,
    web::Json(body): web::Json<EditProfile>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let claims = principal.0.require(PrincipalKind::Teacher)?;
    let old = db::teachers::get_teacher(&state.db_pool, claims.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;

    let photo =
        uploads::resolve_photo(&state.config.uploads_dir, "teacher", body.photo.as_deref())?;

    let teacher = db::teachers::update_teacher(
        &state.db_pool,
        claims.id,
        UpdateTeacher {
            fullname: body.fullname,
            subject: body.subject,
            qualification: body.qualification,
            experience: body.experience,
            dateofbirth: body.dateofbirth,
            mobile_no: body.mobile_no,
            present_address: body.present_address,
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
        "data": teacher,
    })))
}
