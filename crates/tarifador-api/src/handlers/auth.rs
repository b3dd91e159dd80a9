//! Authentication handlers
//!
//! HTTP handlers for the registration and token endpoints. Call record
//! submissions require a token; bill reads do not.

use crate::dto::auth::{RegisterRequest, RegisterResponse, TokenRequest, TokenResponse};
use actix_web::{cookie::Cookie, web, HttpResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tarifador_auth::{AuthenticatedUser, JwtService, PasswordService};
use tarifador_core::models::User;
use tarifador_core::traits::UserStore;
use tarifador_core::AppError;
use tarifador_db::PgUserStore;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Register a new API user
///
/// POST /api/v1/auth/register
#[instrument(skip(pool, password_service, req))]
pub async fn register(
    pool: web::Data<PgPool>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    // Validate request
    req.validate().map_err(|e| {
        warn!("Register validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(username = %req.username, "Processing registration request");

    // Hash password
    let password_hash = password_service.hash_password(&req.password)?;

    let new_user = User::new(req.username.clone(), password_hash);

    let user_store = PgUserStore::new(pool.get_ref().clone());
    let created_user = user_store.save(&new_user).await?;

    info!(
        username = %created_user.username,
        id = %created_user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(RegisterResponse {
        id: created_user.id,
        username: created_user.username,
    }))
}

/// Exchange credentials for an access token
///
/// POST /api/v1/auth/token
#[instrument(skip(pool, jwt_service, password_service, req))]
pub async fn token(
    pool: web::Data<PgPool>,
    jwt_service: web::Data<Arc<JwtService>>,
    password_service: web::Data<Arc<PasswordService>>,
    req: web::Json<TokenRequest>,
) -> Result<HttpResponse, AppError> {
    // Validate request
    req.validate().map_err(|e| {
        warn!("Token request validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let username = req.username.trim();
    let password = &req.password;

    debug!(username = %username, "Processing token request");

    // Find user in database
    let user_store = PgUserStore::new(pool.get_ref().clone());
    let user = user_store.find_by_username(username).await?.ok_or_else(|| {
        info!(username = %username, "Token request failed: user not found");
        AppError::UserNotFound(username.to_string())
    })?;

    // Check if user is active
    if !user.can_login() {
        warn!(username = %username, "Token request failed: user is inactive");
        return Err(AppError::InvalidCredentials);
    }

    // Verify password
    let password_valid = password_service.verify_password(password, &user.password_hash)?;

    if !password_valid {
        info!(username = %username, "Token request failed: invalid password");
        return Err(AppError::InvalidCredentials);
    }

    // Generate JWT token
    let access_token = jwt_service.create_token_for_user(&user.username, user.id)?;
    let expires_in = jwt_service.expiration_secs();

    info!(username = %username, "Token issued");

    // Set cookie with token
    let cookie = Cookie::build("token", access_token.clone())
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(actix_web::cookie::time::Duration::seconds(expires_in))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(TokenResponse::new(access_token, user.id, user.username)))
}

/// Re-issue a token for the authenticated user
///
/// POST /api/v1/auth/refresh
#[instrument(skip(jwt_service, user))]
pub async fn refresh(
    jwt_service: web::Data<Arc<JwtService>>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    debug!(username = %user.username, "Refreshing access token");

    let access_token = jwt_service.create_token_for_user(&user.username, user.user_id)?;
    let expires_in = jwt_service.expiration_secs();

    info!(username = %user.username, "Token refreshed");

    let cookie = Cookie::build("token", access_token.clone())
        .path("/")
        .http_only(true)
        .secure(false) // Set to true in production with HTTPS
        .max_age(actix_web::cookie::time::Duration::seconds(expires_in))
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(TokenResponse::new(access_token, user.user_id, user.username)))
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/token", web::post().to(token))
            .route("/refresh", web::post().to(refresh)),
    );
}
