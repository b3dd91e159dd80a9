//! Phone bill handlers
//!
//! HTTP handlers for the bill lookup endpoint. Bill reads are public;
//! subscribers check their own bills without an account.

use crate::dto::phone_bill::{PhoneBillListResponse, PhoneBillQuery};
use crate::Billing;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tarifador_core::AppError;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Look up a subscriber's bill for one reference period
///
/// GET /api/v1/phone_bill?phone_number=...&reference_period=MM/YYYY
///
/// The reference period is optional and defaults to the previous month,
/// the most recent period guaranteed to be closed. A subscriber or
/// period with no bill yields an empty list.
#[instrument(skip(billing, query))]
pub async fn get_phone_bill(
    billing: web::Data<Arc<Billing>>,
    query: web::Query<PhoneBillQuery>,
) -> Result<HttpResponse, AppError> {
    // Validate request
    query.validate().map_err(|e| {
        warn!("Phone bill query validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let bill = billing
        .find_bill(&query.phone_number, query.reference_period.as_deref())
        .await?;

    debug!(
        phone_number = %query.phone_number,
        found = bill.is_some(),
        "Phone bill lookup"
    );

    Ok(HttpResponse::Ok().json(PhoneBillListResponse::from(bill)))
}

/// Configure phone bill routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/phone_bill", web::get().to(get_phone_bill));
}
