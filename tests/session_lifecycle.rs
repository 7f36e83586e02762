//! Integration tests for the Login / Validate / Refresh / Logout lifecycle.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use cerberus_auth::SessionService;
use cerberus_cache::memory::MemoryCacheProvider;
use cerberus_core::config::{AuthConfig, SessionConfig};
use cerberus_core::error::ErrorKind;
use cerberus_core::types::Deadline;

use helpers::{Fault, FaultyCache, deadline, user};

fn memory_service() -> SessionService {
    helpers::service(Arc::new(MemoryCacheProvider::default()))
}

#[tokio::test]
async fn test_u42_scenario() {
    let auth = AuthConfig {
        jwt_access_ttl_minutes: 15,
        jwt_refresh_ttl_hours: 1,
        ..helpers::auth_config()
    };
    let service = SessionService::from_config(
        &auth,
        &SessionConfig::default(),
        Arc::new(MemoryCacheProvider::default()),
    )
    .unwrap();
    let u42 = user("u-42");

    let first = service.login(&u42, deadline()).await.unwrap();
    assert!(service.validate(&u42, &first.access_token, deadline()).await.unwrap());

    let second = service
        .refresh(&u42, &first.refresh_token, deadline())
        .await
        .unwrap();
    assert!(!service.validate(&u42, &first.access_token, deadline()).await.unwrap());
    assert!(service.validate(&u42, &second.access_token, deadline()).await.unwrap());

    let outcome = service.logout(&u42, deadline()).await;
    assert!(outcome.is_clean());
    assert!(!service.validate(&u42, &second.access_token, deadline()).await.unwrap());
}

#[tokio::test]
async fn test_refresh_rotates_both_credentials() {
    let service = memory_service();
    let u = user("rotator");

    let first = service.login(&u, deadline()).await.unwrap();
    let second = service
        .refresh(&u, &first.refresh_token, deadline())
        .await
        .unwrap();

    assert_ne!(first.access_token, second.access_token);
    assert_ne!(first.refresh_token, second.refresh_token);
}

#[tokio::test]
async fn test_consumed_refresh_token_cannot_be_replayed() {
    let service = memory_service();
    let u = user("replayer");

    let first = service.login(&u, deadline()).await.unwrap();
    let second = service
        .refresh(&u, &first.refresh_token, deadline())
        .await
        .unwrap();

    let err = service
        .refresh(&u, &first.refresh_token, deadline())
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::CredentialMismatch | ErrorKind::SessionNotFound
    ));
    assert!(err.is_unauthenticated());

    // The replay attempt leaves the current session alone.
    assert!(service.validate(&u, &second.access_token, deadline()).await.unwrap());
}

#[tokio::test]
async fn test_wrong_refresh_token_does_not_mutate_session() {
    let service = memory_service();
    let u = user("careful");

    let pair = service.login(&u, deadline()).await.unwrap();
    let err = service
        .refresh(&u, "d3JvbmcgcmVmcmVzaCB0b2tlbg==", deadline())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CredentialMismatch);

    assert!(service.validate(&u, &pair.access_token, deadline()).await.unwrap());
    service
        .refresh(&u, &pair.refresh_token, deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_refresh_without_session() {
    let service = memory_service();
    let err = service
        .refresh(&user("stranger"), "anything", deadline())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionNotFound);
}

#[tokio::test]
async fn test_relogin_invalidates_prior_session() {
    let service = memory_service();
    let u = user("twice");

    let first = service.login(&u, deadline()).await.unwrap();
    let second = service.login(&u, deadline()).await.unwrap();

    assert!(!service.validate(&u, &first.access_token, deadline()).await.unwrap());
    assert!(service.validate(&u, &second.access_token, deadline()).await.unwrap());

    let err = service
        .refresh(&u, &first.refresh_token, deadline())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::CredentialMismatch);
}

#[tokio::test]
async fn test_sessions_of_different_users_are_independent() {
    let service = memory_service();
    let alice = user("alice");
    let bob = user("bob");

    let a = service.login(&alice, deadline()).await.unwrap();
    let b = service.login(&bob, deadline()).await.unwrap();
    service.logout(&alice, deadline()).await;

    assert!(!service.validate(&alice, &a.access_token, deadline()).await.unwrap());
    assert!(service.validate(&bob, &b.access_token, deadline()).await.unwrap());
}

#[tokio::test]
async fn test_failed_refresh_write_removes_access_token() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-7");

    cache.fault_set("refresh:", Fault::Fail);
    let err = service.login(&u, deadline()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    assert!(err.is_infrastructure());

    assert_eq!(cache.raw_get("access:u-7").await, None);
    assert_eq!(cache.raw_get("refresh:u-7").await, None);
}

#[tokio::test]
async fn test_failed_access_write_aborts_before_refresh() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-8");

    cache.fault_set("access:", Fault::Fail);
    let err = service.login(&u, deadline()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    assert_eq!(cache.raw_get("refresh:u-8").await, None);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_refresh_write_times_out_and_compensates() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-9");

    cache.fault_set("refresh:", Fault::Stall);
    let err = service.login(&u, deadline()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);

    assert_eq!(cache.raw_get("access:u-9").await, None);
    let deletes = cache.deletes();
    assert_eq!(deletes.last().map(String::as_str), Some("access:u-9"));
}

#[tokio::test]
async fn test_failed_compensation_is_reported_as_original_error() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-10");

    cache.fault_set("refresh:", Fault::Fail);
    cache.fault_delete("access:", Fault::Fail);
    let err = service.login(&u, deadline()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
    assert!(err.message.contains("refresh:u-10"));
}

#[tokio::test]
async fn test_login_survives_failed_pre_revoke() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-11");

    cache.fault_delete("access:", Fault::Fail);
    let pair = service.login(&u, deadline()).await.unwrap();
    assert!(service.validate(&u, &pair.access_token, deadline()).await.unwrap());
}

#[tokio::test]
async fn test_logout_reports_backend_failures() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-12");

    let pair = service.login(&u, deadline()).await.unwrap();
    cache.fault_delete("refresh:", Fault::Fail);

    let outcome = service.logout(&u, deadline()).await;
    assert!(!outcome.is_clean());
    assert_eq!(outcome.failures.len(), 1);

    // The access slot is still deleted.
    assert!(!service.validate(&u, &pair.access_token, deadline()).await.unwrap());

    let err = service.revoke(&u, deadline()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);
}

#[tokio::test]
async fn test_refresh_aborts_when_consumed_token_cannot_be_deleted() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-13");

    let pair = service.login(&u, deadline()).await.unwrap();
    cache.fault_delete("refresh:", Fault::Fail);

    let err = service
        .refresh(&u, &pair.refresh_token, deadline())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Backend);

    cache.heal();
    service
        .refresh(&u, &pair.refresh_token, deadline())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_concurrent_refresh_with_same_secret_succeeds_once() {
    let service = memory_service();
    let u = user("racer");
    let pair = service.login(&u, deadline()).await.unwrap();

    let (a, b) = tokio::join!(
        service.refresh(&u, &pair.refresh_token, deadline()),
        service.refresh(&u, &pair.refresh_token, deadline()),
    );

    assert_eq!(
        [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
}

#[tokio::test]
async fn test_concurrent_logins_leave_one_consistent_pair() {
    let service = memory_service();
    let u = user("dup");

    let (a, b) = tokio::join!(
        service.login(&u, deadline()),
        service.login(&u, deadline()),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let a_active = service.validate(&u, &a.access_token, deadline()).await.unwrap();
    let b_active = service.validate(&u, &b.access_token, deadline()).await.unwrap();
    assert!(a_active ^ b_active);

    let winner = if a_active { &a } else { &b };
    service
        .refresh(&u, &winner.refresh_token, deadline())
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_validate_does_not_wait_for_user_lock() {
    let cache = FaultyCache::new();
    let service = helpers::service(cache.clone());
    let u = user("u-14");
    let pair = service.login(&u, deadline()).await.unwrap();

    // A stalled logout holds the user lock until its deadline.
    cache.fault_delete("refresh:", Fault::Stall);
    let stalled = {
        let service = service.clone();
        let u = u.clone();
        tokio::spawn(async move {
            service
                .logout(&u, Deadline::after(Duration::from_secs(30)))
                .await
        })
    };
    while cache.raw_get("access:u-14").await.is_some() {
        tokio::task::yield_now().await;
    }

    let active = service
        .validate(&u, &pair.access_token, deadline())
        .await
        .unwrap();
    assert!(!active);
    assert!(!stalled.is_finished());

    let outcome = stalled.await.unwrap();
    assert_eq!(outcome.failures[0].1.kind, ErrorKind::Timeout);
}

#[tokio::test(start_paused = true)]
async fn test_logout_deletes_when_user_lock_is_busy() {
    let cache = FaultyCache::new();
    cache.set_latency(Duration::from_millis(1));
    let service = helpers::service(cache.clone());
    let u = user("u-16");

    // A login stalls on its refresh write while holding the user lock.
    cache.fault_set("refresh:", Fault::Stall);
    let login = {
        let service = service.clone();
        let u = u.clone();
        tokio::spawn(async move {
            service
                .login(&u, Deadline::after(Duration::from_secs(30)))
                .await
        })
    };
    while cache.raw_get("access:u-16").await.is_none() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let outcome = service
        .logout(&u, Deadline::after(Duration::from_millis(200)))
        .await;
    assert!(outcome.is_clean(), "failures: {:?}", outcome.failures);
    assert_eq!(cache.raw_get("access:u-16").await, None);
    assert!(!login.is_finished());

    let err = login.await.unwrap().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(cache.raw_get("access:u-16").await, None);
}

#[tokio::test]
async fn test_authenticate_and_refresh_with_access() {
    let service = memory_service();
    let u = user("u-15");
    let first = service.login(&u, deadline()).await.unwrap();

    assert_eq!(
        service.authenticate(&first.access_token, deadline()).await.unwrap(),
        Some(u.clone())
    );

    let second = service
        .refresh_with_access(&first.access_token, &first.refresh_token, deadline())
        .await
        .unwrap();
    assert_eq!(
        service.authenticate(&first.access_token, deadline()).await.unwrap(),
        None
    );
    assert_eq!(
        service.authenticate(&second.access_token, deadline()).await.unwrap(),
        Some(u)
    );
}

#[tokio::test]
async fn test_unserialized_service_keeps_base_contract() {
    let session = SessionConfig {
        serialize_per_user: false,
        ..SessionConfig::default()
    };
    let service = helpers::service_with(Arc::new(MemoryCacheProvider::default()), session);
    let u = user("free");

    let first = service.login(&u, deadline()).await.unwrap();
    let second = service
        .refresh(&u, &first.refresh_token, deadline())
        .await
        .unwrap();
    assert!(service.validate(&u, &second.access_token, deadline()).await.unwrap());
    assert!(service.logout(&u, deadline()).await.is_clean());
}
