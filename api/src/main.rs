// api/src/main.rs

use learnhub_api::catalog::PgCourseCatalog;
use learnhub_api::config::{AppConfig, LogFormat, PaymentProvider};
use learnhub_api::errors::AppError;
use learnhub_api::ledger::PgRegistrationLedger;
use learnhub_api::orchestrator::Orchestrator;
use learnhub_api::pipelines;
use learnhub_api::services::payment::mock::MockGateway;
use learnhub_api::services::payment::paypal::PaypalGateway;
use learnhub_api::services::payment::PaymentGateway;
use learnhub_api::services::token_service::TokenService;
use learnhub_api::state::{AppState, EnrollmentServices};
use learnhub_api::web::configure_app_routes;

use actix_web::{web as actix_data, App, HttpServer};
use learnhub_flow::Flow;
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

/// Logs a startup failure and turns it into the `io::Error` main returns.
fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
  tracing::error!(error = %err, "{}", context);
  io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn build_gateway(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>, AppError> {
  match (config.payment_provider, config.paypal.as_ref()) {
    (PaymentProvider::Paypal, Some(paypal)) => Ok(Arc::new(PaypalGateway::new(paypal)?)),
    (PaymentProvider::Paypal, None) => Err(AppError::Config("PayPal settings are missing.".to_string())),
    (PaymentProvider::Mock, _) => {
      tracing::warn!("Using the mock payment processor; no real payments will be captured.");
      Ok(Arc::new(MockGateway::new()))
    }
  }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
  init_tracing(AppConfig::log_format_from_env());
  tracing::info!("Starting LearnHub API server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => return Err(startup_error("Failed to load application configuration", e)),
  };

  let db_pool = match PgPoolOptions::new()
    .max_connections(app_config.database_max_connections)
    .connect(app_config.database_url.expose_secret())
    .await
  {
    Ok(pool) => {
      tracing::info!("Successfully connected to the database.");
      pool
    }
    Err(e) => return Err(startup_error("Failed to connect to the database", e)),
  };

  if app_config.run_migrations {
    if let Err(e) = sqlx::migrate!("./migrations").run(&db_pool).await {
      return Err(startup_error("Failed to run database migrations", e));
    }
    tracing::info!("Database migrations applied.");
  }

  let gateway = build_gateway(&app_config).map_err(|e| startup_error("Failed to set up the payment processor", e))?;
  let services = EnrollmentServices {
    ledger: Arc::new(PgRegistrationLedger::new(db_pool.clone())),
    catalog: Arc::new(PgCourseCatalog::new(db_pool.clone())),
    gateway,
  };

  let flow = Arc::new(Flow::<AppError>::new());
  pipelines::register_all_pipelines(&flow);

  let tokens = Arc::new(TokenService::new(
    SecretString::from(app_config.jwt_access_secret.expose_secret().to_string()),
    SecretString::from(app_config.jwt_refresh_secret.expose_secret().to_string()),
    app_config.access_token_ttl,
    app_config.refresh_token_ttl,
  ));

  let app_state = AppState {
    db_pool,
    flow: flow.clone(),
    config: app_config.clone(),
    tokens,
    orchestrator: Orchestrator::new(flow, services),
  };

  let server_address = app_config.server_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
