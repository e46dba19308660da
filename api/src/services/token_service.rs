// api/src/services/token_service.rs

//! HS256 access and refresh tokens.

use crate::errors::AppError;
use crate::models::Role;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
  pub sub: Uuid,
  pub role: Role,
  pub iat: i64,
  pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
  pub sub: Uuid,
  pub iat: i64,
  pub exp: i64,
}

pub struct TokenService {
  access_secret: SecretString,
  refresh_secret: SecretString,
  access_ttl: Duration,
  refresh_ttl: Duration,
}

impl TokenService {
  pub fn new(access_secret: SecretString, refresh_secret: SecretString, access_ttl: Duration, refresh_ttl: Duration) -> Self {
    Self {
      access_secret,
      refresh_secret,
      access_ttl,
      refresh_ttl,
    }
  }

  pub fn refresh_ttl(&self) -> Duration {
    self.refresh_ttl
  }

  fn window(ttl: Duration) -> (i64, i64) {
    let iat = Utc::now().timestamp();
    (iat, iat + ttl.as_secs() as i64)
  }

  pub fn issue_access(&self, user_id: Uuid, role: Role) -> Result<String, AppError> {
    let (iat, exp) = Self::window(self.access_ttl);
    let claims = AccessClaims { sub: user_id, role, iat, exp };
    sign(&claims, &self.access_secret)
  }

  pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
    let (iat, exp) = Self::window(self.refresh_ttl);
    let claims = RefreshClaims { sub: user_id, iat, exp };
    sign(&claims, &self.refresh_secret)
  }

  /// Invalid or expired tokens are `Forbidden`: the caller did present credentials.
  pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AppError> {
    verify(token, &self.access_secret)
  }

  pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AppError> {
    verify(token, &self.refresh_secret)
  }
}

fn sign<C: Serialize>(claims: &C, secret: &SecretString) -> Result<String, AppError> {
  encode(
    &Header::new(Algorithm::HS256),
    claims,
    &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
  )
  .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

fn verify<C: for<'de> Deserialize<'de>>(token: &str, secret: &SecretString) -> Result<C, AppError> {
  decode::<C>(
    token,
    &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
    &Validation::new(Algorithm::HS256),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    debug!(error = %e, "Token rejected.");
    AppError::Forbidden("Invalid or expired token.".to_string())
  })
}
