use actix_web::{
    get, post, put,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{
    self,
    fees::{NewFeeMaster, NewPayment, NewPaymentItem, PayPendingRequest},
};
use crate::errors::AppError;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateMaster {
    admission_id: String,
    school_code: String,
    total_fee_amount: f64,
    remarks: Option<String>,
}

#[post("/master/create")]
pub async fn create_master_handler(
    web::Json(body): web::Json<CreateMaster>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.admission_id.trim().is_empty() || body.school_code.trim().is_empty() {
        return Err(AppError::Validation(
            "admission_id and school_code are required".to_string(),
        ));
    }

    let student =
        db::students::find_by_admission(&state.db_pool, &body.admission_id, &body.school_code)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

    let (fee_master_id, created) = db::fees::create_master(
        &state.db_pool,
        NewFeeMaster {
            admission_id: body.admission_id,
            student_id: student.id,
            school_code: body.school_code,
            total_fee_amount: body.total_fee_amount,
            remarks: body.remarks,
        },
    )
    .await?;

    let message = if created {
        "Fee master created"
    } else {
        "Fee master already exists"
    };
    let response = json!({
        "success": true,
        "message": message,
        "fee_master_id": fee_master_id,
    });
    Ok(if created {
        HttpResponse::Created().json(response)
    } else {
        HttpResponse::Ok().json(response)
    })
}

#[derive(Deserialize)]
pub struct EditMaster {
    total_fee_amount: f64,
}

#[put("/master/{id}")]
pub async fn update_master_handler(
    path: web::Path<i64>,
    web::Json(body): web::Json<EditMaster>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let master =
        db::fees::update_master_total(&state.db_pool, path.into_inner(), body.total_fee_amount)
            .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Fee master updated successfully",
        "data": master,
    })))
}

#[derive(Deserialize)]
pub struct PayItem {
    fee_head: String,
    amount: f64,
    note: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
pub struct PayBody {
    admission_id: String,
    school_code: String,
    paying_now: f64,
    due_date: Option<String>,
    fine_amount: Option<f64>,
    remarks: Option<String>,
    #[serde(default)]
    items: Vec<PayItem>,
}

#[post("/pay")]
pub async fn pay_handler(
    web::Json(body): web::Json<PayBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.admission_id.trim().is_empty() || body.school_code.trim().is_empty() {
        return Err(AppError::Validation(
            "admission_id and school_code are required".to_string(),
        ));
    }

    let payment = db::fees::add_payment(
        &state.db_pool,
        state.config.overpayment,
        NewPayment {
            admission_id: body.admission_id,
            school_code: body.school_code,
            paying_now: body.paying_now,
            due_date: body.due_date,
            fine_amount: body.fine_amount,
            remarks: body.remarks,
            items: body
                .items
                .into_iter()
                .map(|i| NewPaymentItem {
                    fee_head: i.fee_head,
                    amount: i.amount,
                    note: i.note,
                    status: i.status,
                })
                .collect(),
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Payment added successfully",
        "data": payment,
    })))
}

#[get("/summary/{admission_id}/{school_code}")]
pub async fn summary_handler(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (admission_id, school_code) = path.into_inner();
    let summary = db::fees::summary(&state.db_pool, &admission_id, &school_code).await?;
    Ok(match summary {
        Some(summary) => HttpResponse::Ok().json(json!({
            "success": true,
            "exists": true,
            "summary": summary,
        })),
        None => HttpResponse::Ok().json(json!({
            "success": true,
            "exists": false,
            "summary": {},
        })),
    })
}

#[get("/history/{admission_id}/{school_code}")]
pub async fn history_handler(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (admission_id, school_code) = path.into_inner();
    let history = db::fees::history(&state.db_pool, &admission_id, &school_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": history.len(),
        "data": history,
    })))
}

#[get("/receipt/{payment_id}")]
pub async fn receipt_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let receipt = db::fees::receipt(&state.db_pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "fee_master": receipt.fee_master,
        "payment": receipt.payment,
        "items": receipt.items,
        "summary": receipt.summary,
    })))
}

#[derive(Deserialize)]
pub struct SchoolQuery {
    school_code: String,
}

#[get("/pending-fees/{admission_id}")]
pub async fn pending_fees_handler(
    path: web::Path<String>,
    query: web::Query<SchoolQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let items =
        db::fees::pending_items(&state.db_pool, &path.into_inner(), &query.school_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": items.len(),
        "data": items,
    })))
}

#[derive(Deserialize)]
pub struct PayPendingBody {
    admission_id: String,
    school_code: String,
    item_ids: Vec<i64>,
    due_date: Option<String>,
}

#[post("/pay-pending")]
pub async fn pay_pending_handler(
    web::Json(body): web::Json<PayPendingBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    if body.admission_id.trim().is_empty() || body.school_code.trim().is_empty() {
        return Err(AppError::Validation(
            "admission_id and school_code are required".to_string(),
        ));
    }

    let payment = db::fees::pay_pending(
        &state.db_pool,
        state.config.overpayment,
        PayPendingRequest {
            admission_id: body.admission_id,
            school_code: body.school_code,
            item_ids: body.item_ids,
            due_date: body.due_date,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Pending fees settled successfully",
        "data": payment,
    })))
}

#[get("/pending-count/{admission_id}")]
pub async fn pending_count_handler(
    path: web::Path<String>,
    query: web::Query<SchoolQuery>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let count =
        db::fees::pending_count(&state.db_pool, &path.into_inner(), &query.school_code).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "count": count })))
}

#[get("/outstanding/{admission_id}/{school_code}")]
pub async fn outstanding_handler(
    path: web::Path<(String, String)>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    let (admission_id, school_code) = path.into_inner();
    let rows = db::fees::outstanding(&state.db_pool, &admission_id, &school_code).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "total": rows.len(),
        "data": rows,
    })))
}

#[derive(Deserialize)]
pub struct WaiveFineBody {
    payment_id: i64,
    approved_by: String,
}

#[post("/waive-fine")]
pub async fn waive_fine_handler(
    web::Json(body): web::Json<WaiveFineBody>,
    state: Data<AppState>,
) -> Result<impl Responder, AppError> {
    db::fees::waive_fine(&state.db_pool, body.payment_id, &body.approved_by).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Fine waived successfully",
    })))
}
