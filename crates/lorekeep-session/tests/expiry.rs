//! Integration tests for the expiry monitor using real JWT-shaped tokens.

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lorekeep_session::{
    Credential, ExpiryConfig, ExpiryMonitor, ExpiryOutcome, ManualClock, NotificationCenter,
};

// =========================================================================
// Helpers
// =========================================================================

const NOW: u64 = 1_750_000_000;

fn jwt(payload: &str) -> Credential {
    Credential::new(format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
        URL_SAFE_NO_PAD.encode(payload)
    ))
}

fn jwt_expiring_at(exp: u64) -> Credential {
    jwt(&format!(r#"{{"sub":"u1","exp":{exp}}}"#))
}

struct Recorded {
    navigations: Arc<Mutex<Vec<String>>>,
    logouts: Arc<Mutex<u32>>,
    notifications: Arc<NotificationCenter>,
}

fn monitor() -> (ExpiryMonitor, Recorded) {
    let navigations = Arc::new(Mutex::new(Vec::new()));
    let logouts = Arc::new(Mutex::new(0));
    let notifications = Arc::new(NotificationCenter::new());

    let nav = Arc::clone(&navigations);
    let out = Arc::clone(&logouts);
    let monitor = ExpiryMonitor::new(
        ExpiryConfig::default(),
        Arc::new(move |p: &str| nav.lock().unwrap().push(p.to_string())),
        notifications.clone(),
        Arc::new(move || *out.lock().unwrap() += 1),
    )
    .with_clock(Arc::new(ManualClock::new(NOW)));

    (
        monitor,
        Recorded {
            navigations,
            logouts,
            notifications,
        },
    )
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_expired_primary_without_fallback_logs_out_to_login() {
    let (monitor, rec) = monitor();
    let primary = jwt_expiring_at(NOW - 10);

    let outcome = monitor.evaluate(Some(&primary), None, "/home");

    assert_eq!(outcome, ExpiryOutcome::LoggedOut);
    assert_eq!(*rec.logouts.lock().unwrap(), 1);
    assert_eq!(*rec.navigations.lock().unwrap(), vec!["/login"]);
}

#[test]
fn test_valid_primary_with_expired_fallback_takes_no_action() {
    let (monitor, rec) = monitor();
    let primary = jwt_expiring_at(NOW + 3600);
    let fallback = jwt_expiring_at(NOW - 5);

    let outcome = monitor.evaluate(Some(&primary), Some(&fallback), "/home");

    assert_eq!(outcome, ExpiryOutcome::Valid);
    assert_eq!(*rec.logouts.lock().unwrap(), 0);
    assert!(rec.navigations.lock().unwrap().is_empty());
}

#[test]
fn test_both_expired_fire_once_and_repeat_is_suppressed() {
    let (monitor, rec) = monitor();
    let primary = jwt_expiring_at(NOW - 100);
    let fallback = jwt_expiring_at(NOW - 1);

    monitor.evaluate(Some(&primary), Some(&fallback), "/home");
    monitor.evaluate(Some(&primary), Some(&fallback), "/characters");

    assert_eq!(*rec.logouts.lock().unwrap(), 1);
    assert_eq!(rec.navigations.lock().unwrap().len(), 1);
    let active = rec.notifications.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "session-expired");
}

#[test]
fn test_register_route_is_always_noop() {
    let (monitor, rec) = monitor();
    let primary = jwt_expiring_at(NOW - 10);

    for _ in 0..3 {
        assert_eq!(
            monitor.evaluate(Some(&primary), None, "/register"),
            ExpiryOutcome::Exempt
        );
    }

    assert_eq!(*rec.logouts.lock().unwrap(), 0);
    assert!(rec.notifications.active().is_empty());
}

#[test]
fn test_jwt_without_exp_claim_is_expired() {
    let (monitor, rec) = monitor();
    let primary = jwt(r#"{"sub":"u1"}"#);

    let outcome = monitor.evaluate(Some(&primary), None, "/home");

    assert_eq!(outcome, ExpiryOutcome::LoggedOut);
    assert_eq!(*rec.logouts.lock().unwrap(), 1);
}

#[test]
fn test_malformed_token_is_expired() {
    let (monitor, _rec) = monitor();
    let primary = Credential::new("not-a-jwt");

    assert_eq!(
        monitor.evaluate(Some(&primary), None, "/home"),
        ExpiryOutcome::LoggedOut
    );
}

#[test]
fn test_fallback_only_valid_keeps_session() {
    let (monitor, _rec) = monitor();
    let fallback = jwt_expiring_at(NOW + 60);

    assert_eq!(
        monitor.evaluate(None, Some(&fallback), "/home"),
        ExpiryOutcome::Valid
    );
}
