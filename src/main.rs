//! Tarifador server binary
//!
//! Wires the rating pipeline to its HTTP surface: call legs arrive on
//! `/api/v1/call_records`, priced bills are served from
//! `/api/v1/phone_bill`, and access tokens come from the auth routes.

use actix_cors::Cors;
use actix_web::{http::header, middleware, web, App, HttpResponse, HttpServer, Scope};
use std::sync::Arc;
use tarifador_api::{
    configure_auth, configure_call_records, configure_phone_bills, Billing, Reconciler,
};
use tarifador_auth::{JwtService, PasswordService};
use tarifador_core::models::Tariff;
use tarifador_core::AppConfig;
use tarifador_db::{create_pool, PgCallRecordStore, PgPhoneBillStore};
use tarifador_services::{BillingService, CallReconciler};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "tarifador",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn index_redirect() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/api/v1/health"))
        .finish()
}

/// All versioned API routes under one scope
fn api_scope() -> Scope {
    web::scope("/api/v1")
        .route("/health", web::get().to(health))
        .configure(configure_auth)
        .configure(configure_call_records)
        .configure(configure_phone_bills)
}

/// `RUST_LOG` wins when set; otherwise everything logs at info with
/// sqlx quieted down
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    info!("Tarifador v{} starting", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load().expect("Failed to load configuration");
    let tariff = Tariff::from_config(&config.tariff).expect("Invalid tariff configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    info!("Database ready, migrations applied");

    let jwt_service = Arc::new(JwtService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_expiration_secs,
    ));
    let password_service = Arc::new(PasswordService::new());

    // One billing service and one reconciler for the whole process. Both
    // hold in-memory lock registries, so sharing a single instance across
    // workers is what makes per-call and per-bill serialization hold.
    let billing: Arc<Billing> = Arc::new(BillingService::new(
        Arc::new(PgPhoneBillStore::new(pool.clone())),
        tariff,
    ));
    let reconciler: Arc<Reconciler> = Arc::new(CallReconciler::new(
        Arc::new(PgCallRecordStore::new(pool.clone())),
        billing.clone(),
    ));

    let allowed_origins: Vec<String> = config
        .server
        .cors_origins
        .split(',')
        .map(|origin| origin.trim().to_string())
        .collect();

    let bind_addr = config.server_addr();
    let workers = config.server.workers;
    info!(%bind_addr, workers, "Starting HTTP server");

    HttpServer::new(move || {
        let origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                origin
                    .to_str()
                    .map(|o| origins.iter().any(|allowed| allowed == o))
                    .unwrap_or(false)
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                header::AUTHORIZATION,
                header::ACCEPT,
                header::CONTENT_TYPE,
                header::COOKIE,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .app_data(web::Data::new(billing.clone()))
            .app_data(web::Data::new(reconciler.clone()))
            // Malformed query strings come back as 400 instead of the
            // default plain-text response
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let body = serde_json::json!({
                    "error": "invalid_query",
                    "message": err.to_string(),
                });
                actix_web::error::InternalError::from_response(
                    err,
                    HttpResponse::BadRequest().json(body),
                )
                .into()
            }))
            .wrap(cors)
            .wrap(middleware::Logger::new("%a \"%r\" -> %s %Dms"))
            .wrap(middleware::Compress::default())
            .wrap(middleware::NormalizePath::trim())
            .service(api_scope())
            .route("/", web::get().to(index_redirect))
    })
    .workers(workers)
    .bind(&bind_addr)?
    .run()
    .await
}
