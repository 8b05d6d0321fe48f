//! End-to-end tests for `SessionContext`: real JWTs, the standard stores,
//! snapshot persistence, and the connection provider alongside.

use std::sync::{Arc, Mutex};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lorekeep::prelude::*;
use lorekeep::{ConnectionId, DomainCache, ManualClock, MemoryStore, StoreHandle, StoreKind};

const NOW: u64 = 1_700_000_000;

// =========================================================================
// Helpers
// =========================================================================

fn jwt(exp: u64) -> Credential {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
    Credential::new(format!("{header}.{payload}.sig"))
}

fn user(id: &str, roles: &[&str]) -> Identity {
    Identity::authenticated(SubjectId::new(id).unwrap(), RoleSet::new(roles.iter().copied()))
}

fn context_at(clock: &Arc<ManualClock>) -> Arc<SessionContext> {
    SessionContext::builder()
        .clock(clock.clone())
        .build()
        .unwrap()
}

fn fill_all(ctx: &SessionContext, owner: &str) {
    for store in ctx.stores().all() {
        store
            .update(|data| {
                data.insert("owner".into(), serde_json::json!(owner));
            })
            .unwrap();
    }
}

fn all_empty(ctx: &SessionContext) -> bool {
    ctx.stores().all().iter().all(|s| s.get().is_empty())
}

// =========================================================================
// Identity transitions
// =========================================================================

#[test]
fn test_switching_accounts_leaves_no_data_of_previous_user() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    fill_all(&ctx, "u1");

    ctx.login(user("u2", &["player"]), Some(jwt(NOW + 3600)), None);

    assert!(all_empty(&ctx));
    for store in ctx.stores().all() {
        assert_eq!(store.tagged_identity(), Some(SubjectId::new("u2").unwrap()));
    }
}

#[test]
fn test_relogin_as_same_user_keeps_cached_data() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 60)), None);
    fill_all(&ctx, "u1");

    // A token refresh re-commits the same identity.
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);

    assert!(!all_empty(&ctx));
    assert_eq!(ctx.coordinator().transitions(), 1);
}

#[test]
fn test_promotion_to_admin_resets_stores() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    fill_all(&ctx, "u1");

    ctx.login(user("u1", &["player", "admin"]), Some(jwt(NOW + 3600)), None);

    assert!(all_empty(&ctx));
    assert!(ctx.identity().roles().is_admin());
}

// =========================================================================
// Expiry
// =========================================================================

#[test]
fn test_expired_jwt_on_navigation_logs_out_and_clears_stores() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 60)), None);
    fill_all(&ctx, "u1");
    clock.advance(70);

    let outcome = ctx.on_route_change("/home");

    assert_eq!(outcome, ExpiryOutcome::LoggedOut);
    assert_eq!(ctx.current_route(), "/login");
    assert!(all_empty(&ctx));
    let notifications = ctx.notifications().unwrap();
    assert_eq!(notifications.active().len(), 1);

    // Navigating again with nothing held changes nothing.
    assert_eq!(ctx.on_route_change("/home"), ExpiryOutcome::NoCredentials);
    assert_eq!(notifications.active().len(), 1);
}

#[test]
fn test_valid_fallback_keeps_session_alive() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    ctx.login(
        user("u1", &["player"]),
        Some(jwt(NOW - 10)),
        Some(jwt(NOW + 3600)),
    );

    assert_eq!(ctx.on_route_change("/home"), ExpiryOutcome::Valid);
    assert!(ctx.identity().is_authenticated());
}

#[test]
fn test_register_route_tolerates_dead_credentials() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = SessionContext::builder()
        .clock(clock.clone())
        .initial_credentials(Some(jwt(NOW - 10)), None)
        .build()
        .unwrap();

    assert_eq!(ctx.on_route_change("/register"), ExpiryOutcome::Exempt);
    assert_eq!(ctx.current_route(), "/register");
    assert!(ctx.notifications().unwrap().active().is_empty());
}

#[test]
fn test_malformed_token_logs_out() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);

    let outcome = ctx.login(
        user("u1", &["player"]),
        Some(Credential::new("not-a-jwt")),
        None,
    );

    assert_eq!(outcome, ExpiryOutcome::LoggedOut);
    assert!(!ctx.identity().is_authenticated());
}

#[test]
fn test_relogin_with_same_dead_token_is_logged_out_again() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    let dead = jwt(NOW - 10);

    let first = ctx.login(user("u1", &["player"]), Some(dead.clone()), None);
    let second = ctx.login(user("u1", &["player"]), Some(dead), None);
    let third = ctx.on_route_change("/characters");

    assert_eq!(first, ExpiryOutcome::LoggedOut);
    assert_eq!(second, ExpiryOutcome::LoggedOut);
    assert_eq!(third, ExpiryOutcome::NoCredentials);
    assert!(!ctx.identity().is_authenticated());
    assert!(ctx.credentials().is_empty());
    assert_eq!(ctx.notifications().unwrap().active().len(), 1);
}

#[test]
fn test_refresh_back_to_dead_token_is_logged_out_again() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    let dead = jwt(NOW - 10);
    ctx.login(user("u1", &["player"]), Some(dead.clone()), None);
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);

    let outcome = ctx.replace_credentials(Some(dead), None);

    assert_eq!(outcome, ExpiryOutcome::LoggedOut);
    assert!(!ctx.identity().is_authenticated());
}

// =========================================================================
// Persistence
// =========================================================================

#[test]
fn test_restart_restores_snapshots_for_same_user_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        persist_dir: Some(dir.path().to_path_buf()),
    };
    let clock = Arc::new(ManualClock::new(NOW));

    let first = SessionContext::builder()
        .clock(clock.clone())
        .store_config(config.clone())
        .build()
        .unwrap();
    first.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    fill_all(&first, "u1");
    drop(first);

    // Same user comes back: data is there.
    let same = SessionContext::builder()
        .clock(clock.clone())
        .store_config(config.clone())
        .initial_identity(user("u1", &["player"]))
        .build()
        .unwrap();
    assert!(!all_empty(&same));
    drop(same);

    // Someone else starts the app: nothing of u1's is loaded.
    let other = SessionContext::builder()
        .clock(clock)
        .store_config(config)
        .initial_identity(user("u2", &["player"]))
        .build()
        .unwrap();
    assert!(all_empty(&other));
}

#[test]
fn test_logout_erases_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig {
        persist_dir: Some(dir.path().to_path_buf()),
    };
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = SessionContext::builder()
        .clock(clock)
        .store_config(config)
        .build()
        .unwrap();
    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    fill_all(&ctx, "u1");

    ctx.logout();

    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 0);
}

// =========================================================================
// Extra admin stores
// =========================================================================

fn audit_store_of(owner: &str) -> Arc<MemoryStore<DomainCache>> {
    let store = Arc::new(MemoryStore::<DomainCache>::new("admin_audit", StoreKind::Admin));
    store.tag_identity(Some(&SubjectId::new(owner).unwrap()));
    store
        .update(|data| {
            data.insert("owner".into(), serde_json::json!(owner));
        })
        .unwrap();
    store
}

#[test]
fn test_extra_admin_store_of_other_subject_is_reset_at_build() {
    let clock = Arc::new(ManualClock::new(NOW));
    let audit = audit_store_of("u1");

    let _ctx = SessionContext::builder()
        .clock(clock)
        .initial_identity(user("u2", &["admin"]))
        .admin_store(audit.clone())
        .build()
        .unwrap();

    assert!(audit.get().is_empty());
    assert_eq!(audit.tagged_identity(), Some(SubjectId::new("u2").unwrap()));
}

#[test]
fn test_extra_admin_store_of_same_subject_survives_build_until_switch() {
    let clock = Arc::new(ManualClock::new(NOW));
    let audit = audit_store_of("u1");

    let ctx = SessionContext::builder()
        .clock(clock)
        .initial_identity(user("u1", &["admin"]))
        .admin_store(audit.clone())
        .build()
        .unwrap();
    assert_eq!(audit.get().len(), 1);

    ctx.login(user("u2", &["admin"]), Some(jwt(NOW + 3600)), None);

    assert!(audit.get().is_empty());
    assert_eq!(audit.tagged_identity(), Some(SubjectId::new("u2").unwrap()));
}

// =========================================================================
// Connection alongside the session
// =========================================================================

#[derive(Debug)]
struct FakeChannel;

#[test]
fn test_identity_change_does_not_tear_down_connection() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    let provider = ConnectionProvider::<FakeChannel>::new();
    let scope = provider.mount(FakeChannel).unwrap();
    scope.set_connected(true);
    scope.set_connection_id(Some(ConnectionId::new("c-1")));
    let reader = provider.context();

    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    ctx.logout();

    assert!(reader.is_connected().unwrap());
    assert_eq!(reader.connection_id().unwrap(), Some(ConnectionId::new("c-1")));
}

#[test]
fn test_subscribers_observe_transitions_in_order() {
    let clock = Arc::new(ManualClock::new(NOW));
    let ctx = context_at(&clock);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _sub = ctx.signal().subscribe(move |_, next| {
        sink.lock().unwrap().push(next.to_string());
    });

    ctx.login(user("u1", &["player"]), Some(jwt(NOW + 3600)), None);
    ctx.logout();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1], "<anonymous>");
}
