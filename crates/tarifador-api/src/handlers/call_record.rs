//! Call record handlers
//!
//! HTTP handlers for registering call legs. A single endpoint takes both
//! start and end legs; the reconciler pairs them up and settles completed
//! calls onto the subscriber's bill.

use crate::dto::call_record::{CallRecordRequest, CallRecordResponse};
use crate::Reconciler;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tarifador_auth::AuthenticatedUser;
use tarifador_core::AppError;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Register one leg of a call
///
/// PUT /api/v1/call_records
///
/// Returns 201 with the stored leg. Resubmitting a leg the exchange
/// already reported updates it in place and reprices any bill the call
/// was settled onto.
#[instrument(skip(reconciler, user, req))]
pub async fn put_call_record(
    reconciler: web::Data<Arc<Reconciler>>,
    user: AuthenticatedUser,
    req: web::Json<CallRecordRequest>,
) -> Result<HttpResponse, AppError> {
    // Validate request
    req.validate().map_err(|e| {
        warn!("Call record validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let req = req.into_inner();
    let record = reconciler
        .submit(
            req.call_id,
            req.call_type,
            req.timestamp,
            req.source,
            req.destination,
        )
        .await?;

    info!(
        call_id = record.call_id,
        call_type = %record.call_type,
        username = %user.username,
        "Call record registered"
    );

    Ok(HttpResponse::Created().json(CallRecordResponse::from(record)))
}

/// Configure call record routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/call_records", web::put().to(put_call_record));
}
