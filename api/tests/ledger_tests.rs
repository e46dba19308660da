// api/tests/ledger_tests.rs

mod common;

use learnhub_api::errors::AppError;
use learnhub_api::ledger::{InMemoryRegistrationLedger, RegistrationLedger};
use learnhub_api::models::{PriceInfo, RegistrationStatus};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn paid() -> PriceInfo {
  PriceInfo::new(dec!(20.00), None)
}

#[tokio::test]
async fn create_picks_initial_status_from_price() {
  common::setup_tracing();
  let ledger = InMemoryRegistrationLedger::new();
  let free = ledger
    .create(Uuid::new_v4(), Uuid::new_v4(), &PriceInfo::new(dec!(0), None))
    .await
    .unwrap();
  let pending = ledger.create(Uuid::new_v4(), Uuid::new_v4(), &paid()).await.unwrap();
  assert_eq!(free.status, RegistrationStatus::Confirmed);
  assert_eq!(pending.status, RegistrationStatus::Pending);
}

#[tokio::test]
async fn get_by_user_returns_the_latest_attempt() {
  let ledger = InMemoryRegistrationLedger::new();
  let (user_id, course_id) = (Uuid::new_v4(), Uuid::new_v4());

  let first = ledger.create(user_id, course_id, &paid()).await.unwrap();
  ledger.set_status(first.id, RegistrationStatus::Cancelled).await.unwrap();
  let second = ledger.create(user_id, course_id, &paid()).await.unwrap();

  let latest = ledger.get_by_user(user_id, course_id).await.unwrap().unwrap();
  assert_eq!(latest.id, second.id);
  assert!(ledger.get_by_user(user_id, Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn set_status_on_unknown_id_is_not_found() {
  let ledger = InMemoryRegistrationLedger::new();
  let err = ledger
    .set_status(Uuid::new_v4(), RegistrationStatus::Confirmed)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn reactivating_a_cancelled_row_respects_the_active_limit() {
  let ledger = InMemoryRegistrationLedger::new();
  let (user_id, course_id) = (Uuid::new_v4(), Uuid::new_v4());
  let old = ledger.create(user_id, course_id, &paid()).await.unwrap();
  ledger.set_status(old.id, RegistrationStatus::Cancelled).await.unwrap();
  ledger.create(user_id, course_id, &paid()).await.unwrap();

  let err = ledger
    .set_status(old.id, RegistrationStatus::Pending)
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn confirm_payment_semantics() {
  let ledger = InMemoryRegistrationLedger::new();
  let registration = ledger.create(Uuid::new_v4(), Uuid::new_v4(), &paid()).await.unwrap();

  let confirmed = ledger.confirm_payment(registration.id).await.unwrap();
  assert_eq!(confirmed.status, RegistrationStatus::Confirmed);
  let again = ledger.confirm_payment(registration.id).await.unwrap();
  assert_eq!(again.updated_at, confirmed.updated_at);

  let other = ledger.create(Uuid::new_v4(), Uuid::new_v4(), &paid()).await.unwrap();
  ledger.set_status(other.id, RegistrationStatus::Cancelled).await.unwrap();
  assert!(matches!(
    ledger.confirm_payment(other.id).await,
    Err(AppError::Conflict(_))
  ));
  assert!(matches!(
    ledger.confirm_payment(Uuid::new_v4()).await,
    Err(AppError::NotFound(_))
  ));
}

#[tokio::test]
async fn reporting_reads() {
  let ledger = InMemoryRegistrationLedger::new();
  let course_id = Uuid::new_v4();
  let user_id = Uuid::new_v4();

  let a = ledger.create(user_id, course_id, &paid()).await.unwrap();
  let b = ledger.create(Uuid::new_v4(), course_id, &paid()).await.unwrap();
  let c = ledger
    .create(user_id, Uuid::new_v4(), &PriceInfo::new(dec!(0), None))
    .await
    .unwrap();

  assert_eq!(ledger.count_all().await.unwrap(), 3);

  let newest_first: Vec<Uuid> = ledger.list_all(true).await.unwrap().iter().map(|r| r.id).collect();
  let oldest_first: Vec<Uuid> = ledger.list_all(false).await.unwrap().iter().map(|r| r.id).collect();
  assert_eq!(oldest_first.first(), Some(&a.id));
  assert_eq!(newest_first.first(), Some(&c.id));

  let for_course: Vec<Uuid> = ledger.list_for_course(course_id).await.unwrap().iter().map(|r| r.id).collect();
  assert_eq!(for_course.len(), 2);
  assert!(for_course.contains(&a.id) && for_course.contains(&b.id));

  let confirmed = ledger.list_confirmed_for_user(user_id).await.unwrap();
  assert_eq!(confirmed.len(), 1);
  assert_eq!(confirmed[0].id, c.id);
}
