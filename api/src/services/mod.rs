// api/src/services/mod.rs

pub mod auth_service;
pub mod email_mock;
pub mod payment;
pub mod token_service;
