//! A scripted walk through a client session: sign in, browse, let the
//! token expire, and watch the session layer clean up.
//!
//! Run with `RUST_LOG=debug cargo run -p table-client` to see every
//! decision the coordinator and the monitor make.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lorekeep::prelude::*;
use lorekeep::{ClaimDecoder, ConnectionId, ManualClock, SessionError, TokenClaims};

// ---------------------------------------------------------------------------
// Dev backend stand-ins
// ---------------------------------------------------------------------------

/// Tokens of the form `dev:<exp>`, as issued by the local dev backend.
struct DevTokenDecoder;

impl ClaimDecoder for DevTokenDecoder {
    fn decode(&self, token: &str) -> Result<TokenClaims, SessionError> {
        let exp = token
            .strip_prefix("dev:")
            .and_then(|s| s.parse::<f64>().ok())
            .ok_or_else(|| SessionError::DecodeFailure(format!("not a dev token: {token}")))?;
        Ok(TokenClaims {
            exp: Some(exp),
            ..TokenClaims::default()
        })
    }
}

/// The real-time channel a real client would get from its pub/sub library.
#[derive(Debug)]
struct TableChannel {
    table: String,
}

fn dev_token(exp: u64) -> Credential {
    Credential::new(format!("dev:{exp}"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lorekeep::telemetry::init_tracing();

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let clock = Arc::new(ManualClock::new(now));

    let ctx = SessionContext::builder()
        .clock(clock.clone())
        .decoder(DevTokenDecoder)
        .navigator(|path: &str| eprintln!("  [router] -> {path}"))
        .build()?;

    // The connection lives outside the session: it survives logins and
    // logouts and is only unmounted when the app shuts down.
    let provider = ConnectionProvider::<TableChannel>::new();
    let scope = provider.mount(TableChannel {
        table: "friday-night".into(),
    })?;
    scope.push_status(true, Some(ConnectionId::new("a1b2")));
    let connection = provider.context();

    eprintln!("signing in as gm-7");
    let gm = Identity::authenticated(SubjectId::new("gm-7")?, RoleSet::new(["player", "gm"]));
    ctx.login(gm, Some(dev_token(now + 300)), Some(dev_token(now + 600)));
    ctx.on_route_change("/campaigns");

    ctx.stores().campaign.update(|campaigns| {
        campaigns.insert(
            "c-1".into(),
            serde_json::json!({"name": "Curse of the Salt Marsh", "players": 4}),
        );
    })?;
    eprintln!(
        "  campaigns cached: {}, connected to {} as {:?}",
        ctx.stores().campaign.get().len(),
        connection.connection()?.table,
        connection.connection_id()?,
    );

    let _watch = ctx.spawn_expiry_watch(WatchConfig {
        interval: Duration::from_millis(200),
        initial_jitter: Duration::from_millis(50),
    });

    eprintln!("ten minutes pass at the table...");
    clock.advance(700);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let notifications = ctx
        .notifications()
        .map(|center| center.active())
        .unwrap_or_default();
    eprintln!(
        "  identity: {}, route: {}, campaigns cached: {}, notifications: {}",
        ctx.identity(),
        ctx.current_route(),
        ctx.stores().campaign.get().len(),
        notifications.len(),
    );
    eprintln!("  still connected: {}", connection.is_connected()?);

    drop(scope);
    eprintln!(
        "  after unmount, reading the connection gives: {}",
        connection.current().err().map(|e| e.to_string()).unwrap_or_default()
    );

    Ok(())
}
