use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::OverpaymentPolicy;
use crate::errors::AppError;
use crate::structs::{FeeMaster, FeePayment, FeePaymentItem};

pub const ITEM_PAID: &str = "PAID";
pub const ITEM_PENDING: &str = "PENDING";

pub struct NewFeeMaster {
    pub admission_id: String,
    pub student_id: i64,
    pub school_code: String,
    pub total_fee_amount: f64,
    pub remarks: Option<String>,
}

pub struct NewPaymentItem {
    pub fee_head: String,
    pub amount: f64,
    pub note: Option<String>,
    pub status: Option<String>,
}

pub struct NewPayment {
    pub admission_id: String,
    pub school_code: String,
    pub paying_now: f64,
    pub due_date: Option<String>,
    pub fine_amount: Option<f64>,
    pub remarks: Option<String>,
    pub items: Vec<NewPaymentItem>,
}

#[derive(Serialize, Debug, Clone)]
pub struct FeeSummary {
    pub total_fee_amount: f64,
    pub total_paid: f64,
    pub pending: f64,
    pub last_due_date: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct PaymentWithItems {
    #[serde(flatten)]
    pub payment: FeePayment,
    pub items: Vec<FeePaymentItem>,
}

#[derive(Serialize, Debug, Clone)]
pub struct Receipt {
    pub fee_master: FeeMaster,
    pub payment: FeePayment,
    pub items: Vec<FeePaymentItem>,
    pub summary: FeeSummary,
}

#[derive(Serialize, Debug, Clone, sqlx::FromRow)]
pub struct OutstandingRow {
    pub payment_id: i64,
    pub month: String,
    pub pending: f64,
    pub fine_amount: f64,
    pub fine_waived_by: Option<String>,
}

/// The ledger recurrence. `previous` is the balance before this payment;
/// the result is what the inserted row records as `pending_after`. Always
/// evaluated server-side from stored rows, never from client figures.
pub fn next_pending(
    previous: f64,
    paying_now: f64,
    policy: OverpaymentPolicy,
) -> Result<f64, AppError> {
    if paying_now <= 0.0 {
        return Err(AppError::Validation(
            "paying_now must be a positive amount".to_string(),
        ));
    }
    if paying_now > previous {
        return match policy {
            OverpaymentPolicy::Reject => Err(AppError::Validation(
                "Payment exceeds pending balance".to_string(),
            )),
            OverpaymentPolicy::Clamp => Ok(0.0),
        };
    }
    Ok(previous - paying_now)
}

fn validate_due_date(due_date: &str) -> Result<(), AppError> {
    chrono::NaiveDate::parse_from_str(due_date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::Validation("due_date must be YYYY-MM-DD".to_string()))
}

/// A positive remaining balance needs a due date; a settled ledger must not
/// keep one dangling.
fn due_date_for(pending_after: f64, requested: Option<String>) -> Result<Option<String>, AppError> {
    if pending_after > 0.0 {
        let due = requested.ok_or_else(|| {
            AppError::Validation("due_date is required while a balance remains pending".to_string())
        })?;
        validate_due_date(&due)?;
        Ok(Some(due))
    } else {
        Ok(None)
    }
}

fn validate_item(item: &NewPaymentItem) -> Result<&'static str, AppError> {
    if item.fee_head.trim().is_empty() {
        return Err(AppError::Validation("fee_head is required".to_string()));
    }
    if item.amount <= 0.0 {
        return Err(AppError::Validation(
            "item amount must be a positive amount".to_string(),
        ));
    }
    match item.status.as_deref() {
        None | Some(ITEM_PAID) => Ok(ITEM_PAID),
        Some(ITEM_PENDING) => Ok(ITEM_PENDING),
        Some(other) => Err(AppError::Validation(format!(
            "Invalid item status: {other}"
        ))),
    }
}

/// Idempotent: a second create for the same (admission, school) returns the
/// existing master id. The bool reports whether a row was inserted.
pub async fn create_master(
    pool: &SqlitePool,
    master: NewFeeMaster,
) -> Result<(i64, bool), AppError> {
    if master.total_fee_amount <= 0.0 {
        return Err(AppError::Validation(
            "total_fee_amount must be a positive amount".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM fee_master WHERE admission_id = $1 AND school_code = $2",
    )
    .bind(&master.admission_id)
    .bind(&master.school_code)
    .fetch_optional(pool)
    .await?;
    if let Some(id) = existing {
        return Ok((id, false));
    }

    let created_at = super::now_string();
    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO fee_master (admission_id, student_id, school_code, total_fee_amount, remarks, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&master.admission_id)
    .bind(master.student_id)
    .bind(&master.school_code)
    .bind(master.total_fee_amount)
    .bind(&master.remarks)
    .bind(&created_at)
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(id) => {
            log::info!(
                "Fee master {} created for {} in {}",
                id,
                master.admission_id,
                master.school_code
            );
            Ok((id, true))
        }
        // Two concurrent creates: the loser reads back the winner's row.
        Err(e) if crate::errors::is_unique_violation(&e) => {
            let id = sqlx::query_scalar::<_, i64>(
                "SELECT id FROM fee_master WHERE admission_id = $1 AND school_code = $2",
            )
            .bind(&master.admission_id)
            .bind(&master.school_code)
            .fetch_one(pool)
            .await?;
            Ok((id, false))
        }
        Err(e) => Err(AppError::Sqlx(e)),
    }
}

/// The contracted total is frozen once any payment exists; recomputing every
/// historical pending figure is not worth the ambiguity it would introduce.
pub async fn update_master_total(
    pool: &SqlitePool,
    id: i64,
    total_fee_amount: f64,
) -> Result<FeeMaster, AppError> {
    if total_fee_amount <= 0.0 {
        return Err(AppError::Validation(
            "total_fee_amount must be a positive amount".to_string(),
        ));
    }
    let payments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM fee_payments WHERE fee_master_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;
    if payments > 0 {
        return Err(AppError::Conflict(
            "Total fee cannot be changed once payments exist".to_string(),
        ));
    }
    let row = sqlx::query_as::<_, FeeMaster>(
        "UPDATE fee_master SET total_fee_amount = $1 WHERE id = $2 RETURNING *",
    )
    .bind(total_fee_amount)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Fee master not found".to_string()))?;
    Ok(row)
}

async fn master_for<'e, E>(
    executor: E,
    admission_id: &str,
    school_code: &str,
) -> Result<Option<FeeMaster>, AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let master = sqlx::query_as::<_, FeeMaster>(
        "SELECT * FROM fee_master WHERE admission_id = $1 AND school_code = $2",
    )
    .bind(admission_id)
    .bind(school_code)
    .fetch_optional(executor)
    .await?;
    Ok(master)
}

async fn latest_pending<'e, E>(executor: E, fee_master_id: i64) -> Result<Option<f64>, AppError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let pending = sqlx::query_scalar::<_, f64>(
        "SELECT pending_after FROM fee_payments WHERE fee_master_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(fee_master_id)
    .fetch_optional(executor)
    .await?;
    Ok(pending)
}

/// Records one payment event. The read-latest-pending, insert-payment,
/// insert-items sequence runs in a single transaction so concurrent payments
/// for the same master cannot lose updates.
pub async fn add_payment(
    pool: &SqlitePool,
    policy: OverpaymentPolicy,
    payment: NewPayment,
) -> Result<FeePayment, AppError> {
    let item_statuses = payment
        .items
        .iter()
        .map(validate_item)
        .collect::<Result<Vec<_>, _>>()?;

    let mut tx = pool.begin().await?;

    let master = master_for(&mut *tx, &payment.admission_id, &payment.school_code)
        .await?
        .ok_or_else(|| {
            AppError::Validation("Fee master not found. Create master first.".to_string())
        })?;

    let previous = latest_pending(&mut *tx, master.id)
        .await?
        .unwrap_or(master.total_fee_amount);
    let pending_after = next_pending(previous, payment.paying_now, policy)?;
    let due_date = due_date_for(pending_after, payment.due_date)?;

    let now = super::now_string();
    let inserted = sqlx::query_as::<_, FeePayment>(
        "INSERT INTO fee_payments (fee_master_id, admission_id, student_id, school_code, \
         paying_now, pending_after, payment_date, due_date, fine_amount, remarks, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
    )
    .bind(master.id)
    .bind(&payment.admission_id)
    .bind(master.student_id)
    .bind(&payment.school_code)
    .bind(payment.paying_now)
    .bind(pending_after)
    .bind(super::today_string())
    .bind(&due_date)
    .bind(payment.fine_amount.unwrap_or(0.0))
    .bind(&payment.remarks)
    .bind(&now)
    .fetch_one(&mut *tx)
    .await?;

    for (item, status) in payment.items.iter().zip(item_statuses) {
        sqlx::query(
            "INSERT INTO fee_payment_items (payment_id, fee_master_id, fee_head, amount, note, status) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(inserted.id)
        .bind(master.id)
        .bind(&item.fee_head)
        .bind(item.amount)
        .bind(&item.note)
        .bind(status)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    log::info!(
        "Payment {} of {} recorded for {} ({} pending)",
        inserted.id,
        inserted.paying_now,
        inserted.admission_id,
        inserted.pending_after
    );
    Ok(inserted)
}

pub async fn summary(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<Option<FeeSummary>, AppError> {
    let Some(master) = master_for(pool, admission_id, school_code).await? else {
        return Ok(None);
    };
    Ok(Some(summary_for_master(pool, &master).await?))
}

async fn summary_for_master(pool: &SqlitePool, master: &FeeMaster) -> Result<FeeSummary, AppError> {
    let total_paid = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(paying_now), 0.0) FROM fee_payments WHERE fee_master_id = $1",
    )
    .bind(master.id)
    .fetch_one(pool)
    .await?;
    let pending = latest_pending(pool, master.id)
        .await?
        .unwrap_or(master.total_fee_amount);
    let last_due_date = sqlx::query_scalar::<_, Option<String>>(
        "SELECT due_date FROM fee_payments WHERE fee_master_id = $1 ORDER BY id DESC LIMIT 1",
    )
    .bind(master.id)
    .fetch_optional(pool)
    .await?
    .flatten();

    Ok(FeeSummary {
        total_fee_amount: master.total_fee_amount,
        total_paid,
        pending,
        last_due_date,
    })
}

pub async fn history(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<Vec<PaymentWithItems>, AppError> {
    let Some(master) = master_for(pool, admission_id, school_code).await? else {
        return Ok(Vec::new());
    };

    let payments = sqlx::query_as::<_, FeePayment>(
        "SELECT * FROM fee_payments WHERE fee_master_id = $1 ORDER BY id DESC",
    )
    .bind(master.id)
    .fetch_all(pool)
    .await?;
    let items = sqlx::query_as::<_, FeePaymentItem>(
        "SELECT * FROM fee_payment_items WHERE fee_master_id = $1 ORDER BY id",
    )
    .bind(master.id)
    .fetch_all(pool)
    .await?;

    let history = payments
        .into_iter()
        .map(|payment| {
            let items = items
                .iter()
                .filter(|i| i.payment_id == payment.id)
                .cloned()
                .collect();
            PaymentWithItems { payment, items }
        })
        .collect();
    Ok(history)
}

pub async fn receipt(pool: &SqlitePool, payment_id: i64) -> Result<Receipt, AppError> {
    let payment =
        sqlx::query_as::<_, FeePayment>("SELECT * FROM fee_payments WHERE id = $1")
            .bind(payment_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;
    let master = sqlx::query_as::<_, FeeMaster>("SELECT * FROM fee_master WHERE id = $1")
        .bind(payment.fee_master_id)
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, FeePaymentItem>(
        "SELECT * FROM fee_payment_items WHERE payment_id = $1 ORDER BY id",
    )
    .bind(payment_id)
    .fetch_all(pool)
    .await?;
    let summary = summary_for_master(pool, &master).await?;
    Ok(Receipt {
        fee_master: master,
        payment,
        items,
        summary,
    })
}

pub async fn pending_items(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<Vec<FeePaymentItem>, AppError> {
    let items = sqlx::query_as::<_, FeePaymentItem>(
        "SELECT i.* FROM fee_payment_items i \
         JOIN fee_master m ON m.id = i.fee_master_id \
         WHERE m.admission_id = $1 AND m.school_code = $2 AND i.status = 'PENDING' \
         ORDER BY i.id",
    )
    .bind(admission_id)
    .bind(school_code)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn pending_count(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM fee_payment_items i \
         JOIN fee_master m ON m.id = i.fee_master_id \
         WHERE m.admission_id = $1 AND m.school_code = $2 AND i.status = 'PENDING'",
    )
    .bind(admission_id)
    .bind(school_code)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub struct PayPendingRequest {
    pub admission_id: String,
    pub school_code: String,
    pub item_ids: Vec<i64>,
    pub due_date: Option<String>,
}

/// Settles a selection of PENDING items: one payment row summing their
/// amounts, the items flipped to PAID and stamped with the settling payment.
/// The whole sequence commits or rolls back as a unit, so a rejected item
/// leaves nothing half-done.
pub async fn pay_pending(
    pool: &SqlitePool,
    policy: OverpaymentPolicy,
    request: PayPendingRequest,
) -> Result<FeePayment, AppError> {
    if request.item_ids.is_empty() {
        return Err(AppError::Validation("item_ids is required".to_string()));
    }

    let placeholders: Vec<String> = (0..request.item_ids.len())
        .map(|i| format!("${}", i + 1))
        .collect();
    let in_clause = placeholders.join(", ");

    let mut tx = pool.begin().await?;

    let master = master_for(&mut *tx, &request.admission_id, &request.school_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Fee master not found".to_string()))?;

    let sql = format!(
        "SELECT * FROM fee_payment_items WHERE id IN ({in_clause}) ORDER BY id"
    );
    let mut q = sqlx::query_as::<_, FeePaymentItem>(&sql);
    for id in &request.item_ids {
        q = q.bind(id);
    }
    let items = q.fetch_all(&mut *tx).await?;

    if items.len() != request.item_ids.len() {
        return Err(AppError::NotFound(
            "One or more fee items not found".to_string(),
        ));
    }
    if items.iter().any(|i| i.fee_master_id != master.id) {
        return Err(AppError::Validation(
            "Items belong to a different fee ledger".to_string(),
        ));
    }
    if items.iter().any(|i| i.status != ITEM_PENDING) {
        return Err(AppError::Conflict("Item already paid".to_string()));
    }

    let paying_now: f64 = items.iter().map(|i| i.amount).sum();
    let previous = latest_pending(&mut *tx, master.id)
        .await?
        .unwrap_or(master.total_fee_amount);
    let pending_after = next_pending(previous, paying_now, policy)?;
    let due_date = due_date_for(pending_after, request.due_date)?;

    let now = super::now_string();
    let payment = sqlx::query_as::<_, FeePayment>(
        "INSERT INTO fee_payments (fee_master_id, admission_id, student_id, school_code, \
         paying_now, pending_after, payment_date, due_date, fine_amount, remarks, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9, $10) RETURNING *",
    )
    .bind(master.id)
    .bind(&request.admission_id)
    .bind(master.student_id)
    .bind(&request.school_code)
    .bind(paying_now)
    .bind(pending_after)
    .bind(super::today_string())
    .bind(&due_date)
    .bind(format!("Settlement of {} pending item(s)", items.len()))
    .bind(&now)
    .fetch_one(&mut *tx)
    .await?;

    let sql = format!(
        "UPDATE fee_payment_items SET status = 'PAID', settled_by_payment_id = ${} \
         WHERE id IN ({in_clause})",
        request.item_ids.len() + 1
    );
    let mut q = sqlx::query(&sql);
    for id in &request.item_ids {
        q = q.bind(id);
    }
    q = q.bind(payment.id);
    q.execute(&mut *tx).await?;

    tx.commit().await?;
    log::info!(
        "Settled {} pending item(s) for {} with payment {}",
        request.item_ids.len(),
        request.admission_id,
        payment.id
    );
    Ok(payment)
}

/// Outstanding dues keyed by the month of the due date, carrying the fine
/// column the approver can waive. A settled ledger reports nothing; the
/// pending balance only ever walks down, so the latest payment decides.
pub async fn outstanding(
    pool: &SqlitePool,
    admission_id: &str,
    school_code: &str,
) -> Result<Vec<OutstandingRow>, AppError> {
    let Some(master) = master_for(pool, admission_id, school_code).await? else {
        return Ok(Vec::new());
    };
    let pending = latest_pending(pool, master.id)
        .await?
        .unwrap_or(master.total_fee_amount);
    if pending <= 0.0 {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, OutstandingRow>(
        "SELECT id AS payment_id, substr(due_date, 1, 7) AS month, \
           pending_after AS pending, fine_amount, fine_waived_by \
         FROM fee_payments \
         WHERE fee_master_id = $1 AND pending_after > 0 AND due_date IS NOT NULL \
         ORDER BY due_date",
    )
    .bind(master.id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn waive_fine(
    pool: &SqlitePool,
    payment_id: i64,
    approved_by: &str,
) -> Result<(), AppError> {
    if approved_by.trim().is_empty() {
        return Err(AppError::Validation(
            "approved_by is required to waive a fine".to_string(),
        ));
    }
    let result = sqlx::query("UPDATE fee_payments SET fine_waived_by = $1 WHERE id = $2")
        .bind(approved_by)
        .bind(payment_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Payment not found".to_string()));
    }
    log::info!("Fine on payment {} waived by {}", payment_id, approved_by);
    Ok(())
}
