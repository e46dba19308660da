// api/tests/api_tests.rs

//! HTTP-level checks of the enrollment and payment routes. The database pool is
//! lazy and never reached: these routes only talk to the in-memory services.

mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::TestHarness;
use learnhub_api::config::{AppConfig, LogFormat, PaymentProvider};
use learnhub_api::errors::AppError;
use learnhub_api::ledger::RegistrationLedger;
use learnhub_api::models::{RegistrationStatus, Role};
use learnhub_api::services::token_service::TokenService;
use learnhub_api::state::AppState;
use learnhub_api::web::configure_app_routes;
use learnhub_flow::Flow;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const ACCESS_SECRET: &str = "api-tests-access-secret";
const REFRESH_SECRET: &str = "api-tests-refresh-secret";

fn test_config() -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    database_url: SecretString::from("postgres://unused@localhost/unused".to_string()),
    database_max_connections: 1,
    run_migrations: false,
    jwt_access_secret: SecretString::from(ACCESS_SECRET.to_string()),
    jwt_refresh_secret: SecretString::from(REFRESH_SECRET.to_string()),
    access_token_ttl: Duration::from_secs(900),
    refresh_token_ttl: Duration::from_secs(86_400),
    payment_provider: PaymentProvider::Mock,
    paypal: None,
    mail_sender: "noreply@test.local".to_string(),
    cookie_secure: false,
    log_format: LogFormat::Text,
  }
}

fn test_state(h: &TestHarness) -> AppState {
  let db_pool = PgPoolOptions::new()
    .connect_lazy("postgres://unused@localhost/unused")
    .expect("lazy pool");
  AppState {
    db_pool,
    flow: Arc::new(Flow::<AppError>::new()),
    config: Arc::new(test_config()),
    tokens: Arc::new(TokenService::new(
      SecretString::from(ACCESS_SECRET.to_string()),
      SecretString::from(REFRESH_SECRET.to_string()),
      Duration::from_secs(900),
      Duration::from_secs(86_400),
    )),
    orchestrator: h.orchestrator.clone(),
  }
}

fn bearer(state: &AppState, user_id: Uuid, role: Role) -> (&'static str, String) {
  let token = state.tokens.issue_access(user_id, role).unwrap();
  ("Authorization", format!("Bearer {}", token))
}

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

#[actix_rt::test]
async fn health_check_answers_ok() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);

  let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_rt::test]
async fn missing_token_is_401_and_bad_token_is_403() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let course_id = h.paid_course(dec!(20.00));

  let req = test::TestRequest::post()
    .uri("/api/register-course/register")
    .set_json(json!({ "courseId": course_id }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::post()
    .uri("/api/register-course/register")
    .insert_header(("Authorization", "Bearer not.a.jwt"))
    .set_json(json!({ "courseId": course_id }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Forbidden");
  assert_eq!(h.ledger.count_all().await.unwrap(), 0);
}

#[actix_rt::test]
async fn register_course_statuses() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let user_id = Uuid::new_v4();
  let course_id = h.paid_course(dec!(20.00));

  let register = |course: Uuid| {
    test::TestRequest::post()
      .uri("/api/register-course/register")
      .insert_header(bearer(&state, user_id, Role::User))
      .set_json(json!({ "courseId": course }))
      .to_request()
  };

  let resp = test::call_service(&app, register(course_id)).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["status"], "Pending");
  assert_eq!(body["courseId"], json!(course_id));

  let resp = test::call_service(&app, register(course_id)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "Conflict");

  let resp = test::call_service(&app, register(Uuid::new_v4())).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::post()
    .uri("/api/register-course/register")
    .insert_header(bearer(&state, user_id, Role::User))
    .set_json(json!({ "courseId": "nope" }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "ValidationError");
}

#[actix_rt::test]
async fn free_course_registration_is_confirmed_and_counted() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let admin_id = Uuid::new_v4();
  let course_id = h.free_course();

  let total = |app_state: &AppState| {
    test::TestRequest::get()
      .uri("/api/register-course/admin/get-total-registrations")
      .insert_header(bearer(app_state, admin_id, Role::Admin))
      .to_request()
  };
  let before: Value = test::call_and_read_body_json(&app, total(&state)).await;
  assert_eq!(before["totalRegistrations"], 0);

  let req = test::TestRequest::post()
    .uri("/api/register-course/register")
    .insert_header(bearer(&state, Uuid::new_v4(), Role::User))
    .set_json(json!({ "courseId": course_id }))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["status"], "Confirmed");

  let after: Value = test::call_and_read_body_json(&app, total(&state)).await;
  assert_eq!(after["totalRegistrations"], 1);
  assert_eq!(h.gateway.create_calls() + h.gateway.capture_calls(), 0);
}

#[actix_rt::test]
async fn get_registration_and_malformed_path() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let user_id = Uuid::new_v4();
  let course_id = h.paid_course(dec!(20.00));
  h.orchestrator.enroll(user_id, course_id).await.unwrap();

  let req = test::TestRequest::get()
    .uri(&format!("/api/register-course/get-registration/{}", course_id))
    .insert_header(bearer(&state, user_id, Role::User))
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(body["userId"], json!(user_id));

  let req = test::TestRequest::get()
    .uri(&format!("/api/register-course/get-registration/{}", Uuid::new_v4()))
    .insert_header(bearer(&state, user_id, Role::User))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri("/api/register-course/get-registration/not-a-uuid")
    .insert_header(bearer(&state, user_id, Role::User))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn admin_routes_require_the_admin_role() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let course_id = h.paid_course(dec!(20.00));
  let registration = h.orchestrator.enroll(Uuid::new_v4(), course_id).await.unwrap();

  let req = test::TestRequest::get()
    .uri("/api/register-course/admin/registrations")
    .insert_header(bearer(&state, Uuid::new_v4(), Role::User))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let override_to = |status: &str, role: Role| {
    test::TestRequest::patch()
      .uri(&format!("/api/register-course/admin/registrations/{}", registration.id))
      .insert_header(bearer(&state, Uuid::new_v4(), role))
      .set_json(json!({ "status": status }))
      .to_request()
  };

  let resp = test::call_service(&app, override_to("Cancelled", Role::User)).await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = test::call_service(&app, override_to("Pending", Role::Admin)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = test::call_service(&app, override_to("Cancelled", Role::Admin)).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(h.status_of(registration.id).await, RegistrationStatus::Cancelled);

  let resp = test::call_service(&app, override_to("Confirmed", Role::Admin)).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn create_order_returns_the_processor_order() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);

  let req = test::TestRequest::post()
    .uri("/api/paypal/create-order")
    .insert_header(bearer(&state, Uuid::new_v4(), Role::User))
    .set_json(json!({ "amount": 20.0 }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["id"].as_str().is_some());
  assert_eq!(body["purchase_units"][0]["amount"]["value"], "20.00");
}

#[actix_rt::test]
async fn capture_maps_outcomes_to_statuses() {
  let cases = [
    ("COMPLETED", StatusCode::OK, RegistrationStatus::Confirmed),
    ("PENDING", StatusCode::ACCEPTED, RegistrationStatus::Pending),
    ("DECLINED", StatusCode::BAD_REQUEST, RegistrationStatus::Pending),
    ("FAILED", StatusCode::BAD_REQUEST, RegistrationStatus::Pending),
    ("SOMETHING_NEW", StatusCode::INTERNAL_SERVER_ERROR, RegistrationStatus::Pending),
  ];

  for (raw_status, expected_http, expected_status) in cases {
    let h = TestHarness::new();
    let state = test_state(&h);
    let app = init_app!(state);
    let user_id = Uuid::new_v4();
    let course_id = h.paid_course(dec!(20.00));
    let registration = h.orchestrator.enroll(user_id, course_id).await.unwrap();
    h.gateway.set_capture_status(raw_status);

    let req = test::TestRequest::post()
      .uri(&format!("/api/paypal/capture-order/{}", registration.id))
      .insert_header(bearer(&state, user_id, Role::User))
      .set_json(json!({ "paymentId": "PAY-123" }))
      .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), expected_http, "processor status {raw_status}");
    assert_eq!(h.status_of(registration.id).await, expected_status);
  }
}

#[actix_rt::test]
async fn capture_rejects_bad_input_and_unknown_registrations() {
  let h = TestHarness::new();
  let state = test_state(&h);
  let app = init_app!(state);
  let user_id = Uuid::new_v4();

  let capture = |path_id: String| {
    test::TestRequest::post()
      .uri(&format!("/api/paypal/capture-order/{}", path_id))
      .insert_header(bearer(&state, user_id, Role::User))
      .set_json(json!({ "paymentId": "PAY-123" }))
      .to_request()
  };

  let resp = test::call_service(&app, capture("not-a-uuid".to_string())).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["error"], "ValidationError");

  let resp = test::call_service(&app, capture(Uuid::new_v4().to_string())).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  assert_eq!(h.gateway.capture_calls(), 0);
}
