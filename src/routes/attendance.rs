use actix_web::{
    get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, attendance::AttendanceMark};
use crate::errors::AppError;
use crate::structs::{AttendanceStatus, PersonType};
use crate::AppState;

#[derive(Deserialize)]
pub struct MarkBody {
    school_code: String,
    person_id: String,
    #[serde(rename = "type")]
    person_type: String,
    date: String,
    status: String,
    marked_by: String,
}

fn validate_mark(body: &MarkBody) -> Result<AttendanceMark, AppError> {
    if body.school_code.trim().is_empty()
        || body.person_id.trim().is_empty()
        || body.person_type.trim().is_empty()
        || body.date.trim().is_empty()
        || body.status.trim().is_empty()
        || body.marked_by.trim().is_empty()
    {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    let status = AttendanceStatus::parse(&body.status)?;
    let person_type = PersonType::parse(&body.person_type)?;
    if NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err(AppError::Validation(
            "date must be in YYYY-MM-DD format".to_string(),
        ));
    }
    Ok(AttendanceMark {
        school_code: body.school_code.clone(),
        person_id: body.person_id.clone(),
        person_type: person_type.as_str().to_string(),
        date: body.date.clone(),
        status: status.as_str().to_string(),
        marked_by: body.marked_by.clone(),
    })
}

#[post("/add")]
pub async fn add_handler(
    web::Json(body): web::Json<MarkBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let mark = validate_mark(&body)?;
    db::attendance::add_attendance(&state.db_pool, &mark).await?;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Attendance added successfully",
    })))
}

#[put("/update")]
pub async fn update_handler(
    web::Json(body): web::Json<MarkBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let mark = validate_mark(&body)?;
    db::attendance::update_attendance(&state.db_pool, &mark).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Attendance updated successfully",
    })))
}

#[derive(Deserialize)]
pub struct ViewQuery {
    school_code: String,
    date: String,
    #[serde(rename = "type")]
    person_type: String,
}

#[get("/view")]
pub async fn view_handler(
    query: web::Query<ViewQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let person_type = PersonType::parse(&query.person_type)?;
    let records = db::attendance::view_by_date(
        &state.db_pool,
        &query.school_code,
        &query.date,
        person_type.as_str(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": records.len(),
        "data": records,
    })))
}

#[derive(Deserialize)]
pub struct CheckQuery {
    school_code: String,
    person_id: String,
    date: String,
    #[serde(rename = "type")]
    person_type: String,
}

#[get("/check")]
pub async fn check_handler(
    query: web::Query<CheckQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let person_type = PersonType::parse(&query.person_type)?;
    let record = db::attendance::check_attendance(
        &state.db_pool,
        &query.school_code,
        &query.person_id,
        &query.date,
        person_type.as_str(),
    )
    .await?;
    Ok(match record {
        Some(record) => HttpResponse::Ok().json(json!({
            "success": true,
            "exists": true,
            "record": record,
        })),
        None => HttpResponse::Ok().json(json!({
            "success": true,
            "exists": false,
        })),
    })
}

#[derive(Deserialize)]
pub struct SummaryQuery {
    from: Option<String>,
    to: Option<String>,
}

#[get("/summary/{school_code}/{person_id}")]
pub async fn summary_handler(
    path: web::Path<(String, String)>,
    query: web::Query<SummaryQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (school_code, person_id) = path.into_inner();
    for bound in [&query.from, &query.to].into_iter().flatten() {
        if NaiveDate::parse_from_str(bound, "%Y-%m-%d").is_err() {
            return Err(AppError::Validation(
                "from/to must be in YYYY-MM-DD format".to_string(),
            ));
        }
    }
    let counts = db::attendance::summary(
        &state.db_pool,
        &school_code,
        &person_id,
        query.from.as_deref(),
        query.to.as_deref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "summary": counts,
    })))
}
