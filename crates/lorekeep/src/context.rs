//! `SessionContext` and its builder.
//!
//! The context is created once at startup and owns every piece of the
//! session lifecycle: the identity signal, the standard stores and their
//! registry, the invalidation coordinator, the held credentials, and the
//! expiry monitor. Screens get an `Arc<SessionContext>` and go through it
//! for login, logout, and route changes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lorekeep_identity::{Identity, IdentitySignal};
use lorekeep_session::{
    ClaimDecoder, Clock, Credential, ExpiryConfig, ExpiryMonitor, ExpiryOutcome,
    InvalidationCoordinator, Navigator, NotificationCenter, Notifier, SessionTerminator,
};
use lorekeep_store::{StoreHandle, StoreRegistry};

use crate::credentials::{CredentialHolder, HeldCredentials};
use crate::stores::{StandardStores, StoreConfig};
use crate::watch::{ExpiryWatch, WatchConfig};
use crate::LorekeepError;

/// Route the context assumes until the app reports one.
const INITIAL_ROUTE: &str = "/";

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`SessionContext`].
///
/// # Example
///
/// ```rust
/// use lorekeep::prelude::*;
///
/// let ctx = SessionContext::builder()
///     .expiry_config(ExpiryConfig {
///         login_route: "/sign-in".into(),
///         ..ExpiryConfig::default()
///     })
///     .navigator(|path: &str| println!("navigate to {path}"))
///     .build()?;
///
/// assert!(!ctx.identity().is_authenticated());
/// # Ok::<(), LorekeepError>(())
/// ```
pub struct SessionContextBuilder {
    expiry_config: ExpiryConfig,
    store_config: StoreConfig,
    navigator: Option<Arc<dyn Navigator>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    decoder: Option<Box<dyn ClaimDecoder>>,
    initial_identity: Identity,
    initial_credentials: HeldCredentials,
    initial_route: String,
    admin_stores: Vec<Arc<dyn StoreHandle>>,
}

impl SessionContextBuilder {
    /// Creates a builder with default settings: in-memory stores, a
    /// [`NotificationCenter`] for notifications, a navigator that only
    /// records the route, the system clock and the JWT decoder.
    pub fn new() -> Self {
        Self {
            expiry_config: ExpiryConfig::default(),
            store_config: StoreConfig::default(),
            navigator: None,
            notifier: None,
            clock: None,
            decoder: None,
            initial_identity: Identity::unauthenticated(),
            initial_credentials: HeldCredentials::default(),
            initial_route: INITIAL_ROUTE.to_string(),
            admin_stores: Vec::new(),
        }
    }

    /// Sets the expiry monitor configuration.
    pub fn expiry_config(mut self, config: ExpiryConfig) -> Self {
        self.expiry_config = config;
        self
    }

    /// Sets the store configuration (snapshot directory).
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Sets the app's router. Called after the context records the route.
    pub fn navigator(mut self, navigator: impl Navigator) -> Self {
        self.navigator = Some(Arc::new(navigator));
        self
    }

    /// Replaces the default [`NotificationCenter`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replaces the JWT claim decoder.
    pub fn decoder(mut self, decoder: impl ClaimDecoder) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Identity to start with, e.g. one restored from a previous run.
    ///
    /// Store snapshots are only reloaded when they belong to this
    /// identity's subject.
    pub fn initial_identity(mut self, identity: Identity) -> Self {
        self.initial_identity = identity;
        self
    }

    /// Credentials to start with.
    pub fn initial_credentials(
        mut self,
        primary: Option<Credential>,
        fallback: Option<Credential>,
    ) -> Self {
        self.initial_credentials = HeldCredentials::new(primary, fallback);
        self
    }

    pub fn initial_route(mut self, route: impl Into<String>) -> Self {
        self.initial_route = route.into();
        self
    }

    /// Registers an extra admin-scoped store after the standard six.
    ///
    /// Only [`StoreKind::Admin`](lorekeep_store::StoreKind::Admin) stores
    /// can follow the standard set; anything else fails in
    /// [`build`](Self::build).
    ///
    /// The context never loads snapshots for these stores. A caller that
    /// wants cached content back restores the store itself before `build`;
    /// content tagged with anyone but the initial subject is dropped.
    pub fn admin_store(mut self, store: Arc<dyn StoreHandle>) -> Self {
        self.admin_stores.push(store);
        self
    }

    /// Builds the context.
    ///
    /// Restores store snapshots for the initial identity, resets extra
    /// admin stores holding another subject's content, registers the
    /// stores, and attaches the invalidation coordinator to the identity
    /// signal. No expiry check runs until the first route or credential
    /// change.
    pub fn build(self) -> Result<Arc<SessionContext>, LorekeepError> {
        let subject = self.initial_identity.subject().cloned();

        let stores = StandardStores::new(&self.store_config);
        let restored = stores.restore(subject.as_ref());
        for store in &self.admin_stores {
            if store.tagged_identity() != subject {
                store.reset()?;
            }
            store.tag_identity(subject.as_ref());
        }
        let registry = stores.registry(&self.admin_stores)?;

        let signal = IdentitySignal::with_identity(self.initial_identity);
        let coordinator = Arc::new(InvalidationCoordinator::new(registry));
        coordinator.attach(&signal);

        let credentials = Arc::new(CredentialHolder::new(self.initial_credentials));
        let route = Arc::new(Mutex::new(self.initial_route));

        let (notifier, notification_center): (Arc<dyn Notifier>, _) = match self.notifier {
            Some(notifier) => (notifier, None),
            None => {
                let center = Arc::new(NotificationCenter::new());
                (Arc::clone(&center) as Arc<dyn Notifier>, Some(center))
            }
        };

        let navigator = Arc::new(RouteTracker {
            route: Arc::clone(&route),
            inner: self.navigator,
        });

        // Forced logout: drop the credentials first so nothing reading
        // them during the fan-out sees a dead token.
        let terminator: Arc<dyn SessionTerminator> = {
            let credentials = Arc::clone(&credentials);
            let signal = signal.clone();
            Arc::new(move || {
                credentials.clear();
                signal.replace(Identity::unauthenticated());
            })
        };

        let mut monitor = ExpiryMonitor::new(self.expiry_config, navigator, notifier, terminator);
        if let Some(clock) = self.clock {
            monitor = monitor.with_clock(clock);
        }
        if let Some(decoder) = self.decoder {
            monitor = monitor.with_decoder(decoder);
        }

        tracing::info!(
            identity = %signal.current(),
            stores = coordinator.registry().len(),
            restored = restored.len(),
            persistent = self.store_config.persist_dir.is_some(),
            "session context ready"
        );

        Ok(Arc::new(SessionContext {
            signal,
            stores,
            coordinator,
            monitor,
            credentials,
            route,
            notification_center,
        }))
    }
}

impl Default for SessionContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Records the route before handing it to the app's navigator, so the
/// context always knows where the user is.
struct RouteTracker {
    route: Arc<Mutex<String>>,
    inner: Option<Arc<dyn Navigator>>,
}

impl Navigator for RouteTracker {
    fn navigate(&self, path: &str) {
        *lock(&self.route) = path.to_string();
        if let Some(inner) = &self.inner {
            inner.navigate(path);
        }
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The process-wide session state.
pub struct SessionContext {
    signal: IdentitySignal,
    stores: StandardStores,
    coordinator: Arc<InvalidationCoordinator>,
    monitor: ExpiryMonitor,
    credentials: Arc<CredentialHolder>,
    route: Arc<Mutex<String>>,
    /// Present when the builder created the default notifier.
    notification_center: Option<Arc<NotificationCenter>>,
}

impl SessionContext {
    /// Returns a builder for configuring the context.
    pub fn builder() -> SessionContextBuilder {
        SessionContextBuilder::new()
    }

    /// The current identity.
    pub fn identity(&self) -> Identity {
        self.signal.current()
    }

    /// The identity signal, for components that subscribe to changes.
    pub fn signal(&self) -> &IdentitySignal {
        &self.signal
    }

    pub fn stores(&self) -> &StandardStores {
        &self.stores
    }

    pub fn registry(&self) -> &StoreRegistry {
        self.coordinator.registry()
    }

    pub fn coordinator(&self) -> &Arc<InvalidationCoordinator> {
        &self.coordinator
    }

    pub fn monitor(&self) -> &ExpiryMonitor {
        &self.monitor
    }

    /// The default notification center, or `None` when a custom notifier
    /// was configured.
    pub fn notifications(&self) -> Option<&Arc<NotificationCenter>> {
        self.notification_center.as_ref()
    }

    /// A copy of the held credentials.
    pub fn credentials(&self) -> HeldCredentials {
        self.credentials.get()
    }

    /// The last route reported by the app or navigated to on logout.
    pub fn current_route(&self) -> String {
        lock(&self.route).clone()
    }

    /// Signs `identity` in with the given credentials.
    ///
    /// Credentials are stored before the identity is committed, so the
    /// store fan-out already sees the new session's tokens. The held
    /// credentials changed, so the expiry latch is rearmed and expiry is
    /// evaluated right after: logging in with tokens that are already
    /// dead is logged out again.
    pub fn login(
        &self,
        identity: Identity,
        primary: Option<Credential>,
        fallback: Option<Credential>,
    ) -> ExpiryOutcome {
        tracing::info!(identity = %identity, "login");
        self.credentials
            .replace(HeldCredentials::new(primary, fallback));
        self.monitor.rearm();
        self.signal.replace(identity);
        self.check_expiry()
    }

    /// Signs out: drops the credentials and commits the unauthenticated
    /// identity.
    ///
    /// Does not evaluate expiry and does not navigate; where to go after
    /// a voluntary logout is the caller's call.
    pub fn logout(&self) {
        tracing::info!(identity = %self.signal.current(), "logout");
        self.credentials.clear();
        self.monitor.rearm();
        self.signal.replace(Identity::unauthenticated());
    }

    /// Replaces the held credentials (refresh) and evaluates expiry.
    pub fn replace_credentials(
        &self,
        primary: Option<Credential>,
        fallback: Option<Credential>,
    ) -> ExpiryOutcome {
        self.credentials
            .replace(HeldCredentials::new(primary, fallback));
        self.monitor.rearm();
        self.check_expiry()
    }

    /// Reports a route change from the app's router and evaluates
    /// expiry on the new route.
    pub fn on_route_change(&self, route: &str) -> ExpiryOutcome {
        *lock(&self.route) = route.to_string();
        self.guard_token_expiry(route)
    }

    /// Evaluates the held credentials as seen from `route`.
    pub fn guard_token_expiry(&self, route: &str) -> ExpiryOutcome {
        let held = self.credentials.get();
        self.monitor
            .evaluate(held.primary.as_ref(), held.fallback.as_ref(), route)
    }

    /// Evaluates the held credentials on the current route.
    pub fn check_expiry(&self) -> ExpiryOutcome {
        let route = self.current_route();
        self.guard_token_expiry(&route)
    }

    /// Starts a background task that calls [`check_expiry`](Self::check_expiry)
    /// every `config.interval`.
    ///
    /// The task holds only a weak reference: it ends once the context is
    /// dropped, or when the returned [`ExpiryWatch`] is dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn_expiry_watch(self: &Arc<Self>, config: WatchConfig) -> ExpiryWatch {
        ExpiryWatch::spawn(Arc::downgrade(self), config)
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("identity", &self.signal.current())
            .field("route", &self.current_route())
            .field("coordinator", &self.coordinator)
            .field("credentials", &self.credentials.get())
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// =========================================================================
// Tests
// =========================================================================
