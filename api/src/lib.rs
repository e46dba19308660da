// api/src/lib.rs

//! LearnHub HTTP backend: accounts, course catalog and the enrollment/payment
//! flow, served with actix-web over Postgres.

pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;
