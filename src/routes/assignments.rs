use actix_web::{
    delete, get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, assignments::NewAssignment};
use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    school_code: String,
    standard: Option<String>,
    teacher_name: Option<String>,
}

#[get("/assignments")]
pub async fn list_handler(
    query: web::Query<ListQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let assignments = db::assignments::list_assignments(
        &state.db_pool,
        &query.school_code,
        query.standard.as_deref(),
        query.teacher_name.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": assignments.len(),
        "data": assignments,
    })))
}

#[derive(Deserialize)]
pub struct AssignBody {
    school_code: String,
    standard: String,
    section: String,
    teacher_id: i64,
}

#[post("/assign")]
pub async fn assign_handler(
    web::Json(body): web::Json<AssignBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.school_code.trim().is_empty()
        || body.standard.trim().is_empty()
        || body.section.trim().is_empty()
    {
        return Err(AppError::Validation(
            "school_code, standard, section and teacher_id are required".to_string(),
        ));
    }

    let teacher = db::teachers::get_teacher(&state.db_pool, body.teacher_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;
    if teacher.school_code != body.school_code {
        return Err(AppError::Validation(
            "Teacher belongs to a different school".to_string(),
        ));
    }

    let assignment = db::assignments::assign_teacher(
        &state.db_pool,
        NewAssignment {
            school_code: body.school_code,
            standard: body.standard,
            section: body.section,
            teacher_id: teacher.id,
            teacher_name: teacher.fullname,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Teacher assigned successfully",
        "data": assignment,
    })))
}

#[derive(Deserialize)]
pub struct EditBody {
    standard: String,
    section: String,
    teacher_id: i64,
}

#[put("/edit/{id}")]
pub async fn edit_handler(
    path: web::Path<i64>,
    web::Json(body): web::Json<EditBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.standard.trim().is_empty() || body.section.trim().is_empty() {
        return Err(AppError::Validation(
            "standard, section and teacher_id are required".to_string(),
        ));
    }

    let teacher = db::teachers::get_teacher(&state.db_pool, body.teacher_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;

    let assignment = db::assignments::edit_assignment(
        &state.db_pool,
        path.into_inner(),
        &body.standard,
        &body.section,
        teacher.id,
        &teacher.fullname,
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Assignment updated successfully",
        "data": assignment,
    })))
}

#[delete("/delete/{id}")]
pub async fn delete_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    db::assignments::delete_assignment(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Assignment deleted successfully",
    })))
}

#[derive(Deserialize)]
pub struct RosterQuery {
    school_code: String,
    standard: String,
    section: String,
}

/// Class roster for the class-teacher view.
#[get("/students")]
pub async fn roster_handler(
    query: web::Query<RosterQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let students = db::students::class_roster(
        &state.db_pool,
        &query.school_code,
        &query.standard,
        &query.section,
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "count": students.len(),
        "students": students,
    })))
}
