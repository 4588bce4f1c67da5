// Integration tests for the Register / VerifyAndActivate workflow
//
// Runs the workflow end to end against the in-memory backend, with
// recording notifier and publisher doubles from `common`.

mod common;

use account_service::db::{MemoryBackend, MemoryOp, UserStore};
use account_service::models::activation::is_well_formed_code;
use account_service::models::UserStatus;
use account_service::services::ACTIVATION_EMAIL_SUBJECT;
use account_service::AccountError;
use chrono::{Duration, Utc};
use common::{BlindLookupUsers, Harness, ReissueAfterLookup};
use std::sync::Arc;

#[tokio::test]
async fn test_register_then_activate_happy_path() {
    let h = Harness::new();

    let receipt = h.service.register("a@x.com", "P4ssword").await.unwrap();

    let user = h.user("a@x.com").await.unwrap();
    assert_eq!(user.id, receipt.user_id);
    assert_eq!(user.status, UserStatus::Inactive);
    assert!(user.activated_at.is_none());

    let mails = h.notifier.sent();
    assert_eq!(mails.len(), 1);
    assert_eq!(mails[0].to, "a@x.com");
    assert_eq!(mails[0].subject, ACTIVATION_EMAIL_SUBJECT);
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    assert!(is_well_formed_code(&code));

    let record = h.db.activation_for_user(user.id).await.unwrap();
    assert_eq!(record.expires_at - record.created_at, Duration::minutes(5));
    assert_eq!(record.expires_at, receipt.expires_at);

    h.service.verify_and_activate(&code).await.unwrap();

    let user = h.user("a@x.com").await.unwrap();
    assert_eq!(user.status, UserStatus::Active);
    assert!(user.activated_at.is_some());
    assert!(h.db.activation_for_user(user.id).await.is_none());

    let events = h.publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, "user-activated");
    assert_eq!(events[0].key, user.id.to_string());
    assert_eq!(events[0].payload["user_id"], user.id);
    assert_eq!(
        events[0].payload["activate_time"],
        user.activated_at.unwrap().timestamp()
    );

    // Codes are single use
    let err = h.service.verify_and_activate(&code).await.unwrap_err();
    assert!(matches!(err, AccountError::InvalidOrExpired));
    assert_eq!(h.publisher.events().len(), 1);
}

#[tokio::test]
async fn test_register_active_email_fails_without_writes() {
    let h = Harness::new();
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    h.service.verify_and_activate(&code).await.unwrap();

    let writes = h.db.write_count().await;
    let mails = h.notifier.sent().len();

    let err = h.service.register("a@x.com", "P4ssword").await.unwrap_err();

    assert!(matches!(err, AccountError::AlreadyExists));
    assert_eq!(h.db.write_count().await, writes);
    assert_eq!(h.notifier.sent().len(), mails);
}

#[tokio::test]
async fn test_unknown_code_fails_without_writes() {
    let h = Harness::new();
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    let unknown = if code == "000000" { "000001" } else { "000000" };
    let writes = h.db.write_count().await;

    let err = h.service.verify_and_activate(unknown).await.unwrap_err();

    assert!(matches!(err, AccountError::InvalidOrExpired));
    assert_eq!(h.db.write_count().await, writes);
    assert!(h.publisher.events().is_empty());
}

#[tokio::test]
async fn test_expired_code_fails_and_record_is_kept() {
    let h = Harness::new();
    let receipt = h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    assert!(
        h.db
            .set_activation_expiry(receipt.user_id, Utc::now() - Duration::seconds(1))
            .await
    );

    let err = h.service.verify_and_activate(&code).await.unwrap_err();

    assert!(matches!(err, AccountError::InvalidOrExpired));
    let record = h.db.activation_for_user(receipt.user_id).await.unwrap();
    assert_eq!(record.code, code);
    assert_eq!(
        h.user("a@x.com").await.unwrap().status,
        UserStatus::Inactive
    );

    // A fresh registration supersedes the stale record
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let fresh = h.notifier.last_code_for("a@x.com").unwrap();
    h.service.verify_and_activate(&fresh).await.unwrap();
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_second_registration_invalidates_first_code() {
    let h = Harness::sequential();

    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let first = h.notifier.last_code_for("a@x.com").unwrap();
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let second = h.notifier.last_code_for("a@x.com").unwrap();

    assert_ne!(first, second);
    assert_eq!(h.db.user_count().await, 1);

    let err = h.service.verify_and_activate(&first).await.unwrap_err();
    assert!(matches!(err, AccountError::InvalidOrExpired));

    h.service.verify_and_activate(&second).await.unwrap();
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_publish_failure_rolls_back_activation() {
    let h = Harness::new();
    let receipt = h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    h.publisher.set_failing(true);

    let err = h.service.verify_and_activate(&code).await.unwrap_err();

    assert_eq!(err.step(), Some("publish user activated event"));
    let user = h.user("a@x.com").await.unwrap();
    assert_eq!(user.status, UserStatus::Inactive);
    assert!(user.activated_at.is_none());
    assert!(h.db.activation_for_user(receipt.user_id).await.is_some());

    // Once the broker is back the same code still works
    h.publisher.set_failing(false);
    h.service.verify_and_activate(&code).await.unwrap();
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Active);
    assert_eq!(h.publisher.events().len(), 1);
}

#[tokio::test]
async fn test_code_replaced_after_lookup_is_rejected() {
    let db = MemoryBackend::new();
    let h = Harness::with_activations(
        db.clone(),
        Arc::new(ReissueAfterLookup::new(db.clone(), "222222")),
    );
    let receipt = h.service.register("a@x.com", "P4ssword").await.unwrap();
    let old = h.notifier.last_code_for("a@x.com").unwrap();

    let err = h.service.verify_and_activate(&old).await.unwrap_err();

    assert!(matches!(err, AccountError::InvalidOrExpired));
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Inactive);
    assert!(h.publisher.events().is_empty());
    let current = db.activation_for_user(receipt.user_id).await.unwrap();
    assert_eq!(current.code, "222222");

    // The reissued code still activates
    h.service.verify_and_activate("222222").await.unwrap();
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Active);
    assert_eq!(h.publisher.events().len(), 1);
}

#[tokio::test]
async fn test_delete_failure_rolls_back_user_update() {
    let h = Harness::new();
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();
    h.db.fail(MemoryOp::DeleteActivation);

    let err = h.service.verify_and_activate(&code).await.unwrap_err();

    assert_eq!(err.step(), Some("delete activation"));
    assert_eq!(
        h.user("a@x.com").await.unwrap().status,
        UserStatus::Inactive
    );
    assert!(h.publisher.events().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_verify_activates_once() {
    let h = Harness::new();
    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let code = h.notifier.last_code_for("a@x.com").unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = Arc::clone(&h.service);
            let code = code.clone();
            tokio::spawn(async move { service.verify_and_activate(&code).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(AccountError::InvalidOrExpired) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 1);
    assert_eq!(h.publisher.events().len(), 1);
    assert_eq!(h.user("a@x.com").await.unwrap().status, UserStatus::Active);
}

#[tokio::test]
async fn test_losing_concurrent_create_reports_already_exists() {
    let db = MemoryBackend::new();
    let h = Harness::with_users(db.clone(), Arc::new(BlindLookupUsers(db.clone())));

    h.service.register("a@x.com", "P4ssword").await.unwrap();
    let err = h.service.register("a@x.com", "P4ssword").await.unwrap_err();

    assert!(matches!(err, AccountError::AlreadyExists));
    assert_eq!(db.user_count().await, 1);
    assert_eq!(h.notifier.sent().len(), 1);
}

#[tokio::test]
async fn test_code_less_user_is_repaired_by_retry() {
    let h = Harness::new();
    h.db.fail(MemoryOp::ReplaceActivation);

    let err = h.service.register("a@x.com", "P4ssword").await.unwrap_err();
    assert_eq!(err.step(), Some("replace activation"));

    // Inactive, code-less user left behind
    let user = h.user("a@x.com").await.unwrap();
    assert_eq!(user.status, UserStatus::Inactive);
    assert!(h.db.activation_for_user(user.id).await.is_none());
    assert!(h.notifier.sent().is_empty());

    h.db.recover(MemoryOp::ReplaceActivation);
    let receipt = h.service.register("a@x.com", "P4ssword").await.unwrap();
    assert_eq!(receipt.user_id, user.id);

    let code = h.notifier.last_code_for("a@x.com").unwrap();
    h.service.verify_and_activate(&code).await.unwrap();
    let user = UserStore::get_by_id(&h.db, user.id).await.unwrap().unwrap();
    assert!(user.is_active());
}
