// api/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProvider {
  Paypal,
  Mock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Debug)]
pub struct PaypalConfig {
  pub api_base: String,
  pub client_id: SecretString,
  pub secret: SecretString,
  pub timeout: Duration,
}

/// Held behind an `Arc`; secrets are not `Clone`.
#[derive(Debug)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: SecretString,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub jwt_access_secret: SecretString,
  pub jwt_refresh_secret: SecretString,
  pub access_token_ttl: Duration,
  pub refresh_token_ttl: Duration,

  pub payment_provider: PaymentProvider,
  /// Present when `payment_provider` is `Paypal`.
  pub paypal: Option<PaypalConfig>,

  pub mail_sender: String,
  pub cookie_secure: bool,
  pub log_format: LogFormat,
}

fn parse_var<T>(name: &str, raw: String) -> Result<T>
where
  T: std::str::FromStr,
  T::Err: std::fmt::Display,
{
  raw
    .parse::<T>()
    .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let get_or = |var_name: &str, default: &str| env::var(var_name).unwrap_or_else(|_| default.to_string());

    let server_host = get_or("SERVER_HOST", "127.0.0.1");
    let server_port = parse_var::<u16>("SERVER_PORT", get_or("SERVER_PORT", "8080"))?;
    let database_url = SecretString::from(get_env("DATABASE_URL")?);
    let database_max_connections =
      parse_var::<u32>("DATABASE_MAX_CONNECTIONS", get_or("DATABASE_MAX_CONNECTIONS", "10"))?;
    let run_migrations = parse_var::<bool>("RUN_MIGRATIONS", get_or("RUN_MIGRATIONS", "true"))?;

    let jwt_access_secret = SecretString::from(get_env("JWT_ACCESS_SECRET")?);
    let jwt_refresh_secret = SecretString::from(get_env("JWT_REFRESH_SECRET")?);
    let access_token_ttl =
      Duration::from_secs(parse_var::<u64>("ACCESS_TOKEN_TTL_SECS", get_or("ACCESS_TOKEN_TTL_SECS", "900"))?);
    let refresh_days = parse_var::<u64>("REFRESH_TOKEN_TTL_DAYS", get_or("REFRESH_TOKEN_TTL_DAYS", "30"))?;
    let refresh_token_ttl = Duration::from_secs(refresh_days * 24 * 60 * 60);

    let payment_provider = match get_or("PAYMENT_PROVIDER", "paypal").to_lowercase().as_str() {
      "paypal" => PaymentProvider::Paypal,
      "mock" => PaymentProvider::Mock,
      other => {
        return Err(AppError::Config(format!(
          "Invalid PAYMENT_PROVIDER '{}': expected 'paypal' or 'mock'",
          other
        )))
      }
    };
    let paypal = match payment_provider {
      PaymentProvider::Paypal => Some(PaypalConfig {
        api_base: get_or("PAYPAL_API_BASE", "https://api-m.sandbox.paypal.com")
          .trim_end_matches('/')
          .to_string(),
        client_id: SecretString::from(get_env("PAYPAL_CLIENT_ID")?),
        secret: SecretString::from(get_env("PAYPAL_SECRET")?),
        timeout: Duration::from_secs(parse_var::<u64>("PAYPAL_TIMEOUT_SECS", get_or("PAYPAL_TIMEOUT_SECS", "15"))?),
      }),
      PaymentProvider::Mock => None,
    };

    let mail_sender = get_or("MAIL_SENDER", "noreply@learnhub.local");
    let cookie_secure = parse_var::<bool>("COOKIE_SECURE", get_or("COOKIE_SECURE", "false"))?;
    let log_format = Self::log_format_from_env();

    tracing::info!(
      %server_host,
      server_port,
      ?payment_provider,
      run_migrations,
      "Application configuration loaded successfully."
    );

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      run_migrations,
      jwt_access_secret,
      jwt_refresh_secret,
      access_token_ttl,
      refresh_token_ttl,
      payment_provider,
      paypal,
      mail_sender,
      cookie_secure,
      log_format,
    })
  }

  /// Read before the subscriber is installed, so it cannot fail loudly.
  pub fn log_format_from_env() -> LogFormat {
    match env::var("LOG_FORMAT").map(|v| v.to_lowercase()) {
      Ok(v) if v == "json" => LogFormat::Json,
      _ => LogFormat::Text,
    }
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}
