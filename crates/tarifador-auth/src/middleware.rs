//! Request authentication extractor

use crate::jwt::JwtService;
use crate::Claims;
use actix_web::error::ErrorUnauthorized;
use actix_web::http::header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use std::sync::Arc;
use tarifador_core::error::AppError;
use tracing::{debug, warn};
use uuid::Uuid;

/// The caller a valid token identifies
///
/// Add it as a handler parameter to require authentication on a route;
/// extraction fails with 401 when the request carries no usable token.
///
/// # Examples
///
/// ```no_run
/// use actix_web::HttpResponse;
/// use tarifador_auth::middleware::AuthenticatedUser;
///
/// async fn whoami(user: AuthenticatedUser) -> HttpResponse {
///     HttpResponse::Ok().json(serde_json::json!({
///         "username": user.username,
///         "user_id": user.user_id,
///     }))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Username the token was issued to
    pub username: String,

    /// Id of that user
    pub user_id: Uuid,

    /// The full decoded claims
    pub claims: Claims,
}

/// Token lookup: `Authorization: Bearer` first, `token` cookie second
fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);

    bearer.or_else(|| req.cookie("token").map(|cookie| cookie.value().to_owned()))
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let jwt = req
        .app_data::<web::Data<Arc<JwtService>>>()
        .ok_or_else(|| {
            warn!("No JwtService in app data; authentication cannot run");
            AppError::Unauthorized("authentication is not configured".to_string())
        })?;

    let token = token_from_request(req).ok_or_else(|| {
        debug!("Request carries no access token");
        AppError::Unauthorized("no access token provided".to_string())
    })?;

    let claims = jwt.validate_token(&token).map_err(|e| {
        warn!(error = %e, "Rejected request token");
        e
    })?;

    debug!(username = %claims.sub, "Request authenticated");

    Ok(AuthenticatedUser {
        username: claims.sub.clone(),
        user_id: claims.uid,
        claims,
    })
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(ErrorUnauthorized))
    }
}
