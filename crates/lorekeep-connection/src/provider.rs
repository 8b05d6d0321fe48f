//! The provider, its scope (the single writer), and read-only contexts.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::{ConnectionError, ConnectionId};

// ---------------------------------------------------------------------------
// ConnectionSnapshot
// ---------------------------------------------------------------------------

/// The published state of the connection at one point in time.
///
/// Consumers get the connection behind an `Arc`, so they can call its
/// `&self` methods but can't replace it. Only the [`ConnectionScope`]
/// publishes new snapshots.
pub struct ConnectionSnapshot<C> {
    pub connection: Arc<C>,
    pub is_connected: bool,
    pub connection_id: Option<ConnectionId>,
}

// Manual impls: deriving would demand `C: Clone` / `C: Debug`, and the
// external connection type is usually neither.
impl<C> Clone for ConnectionSnapshot<C> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            is_connected: self.is_connected,
            connection_id: self.connection_id.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ConnectionSnapshot<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSnapshot")
            .field("is_connected", &self.is_connected)
            .field("connection_id", &self.connection_id)
            .finish_non_exhaustive()
    }
}

/// `None` while nothing is mounted.
type Slot<C> = Option<ConnectionSnapshot<C>>;

// ---------------------------------------------------------------------------
// ConnectionProvider
// ---------------------------------------------------------------------------

/// Owns the channel through which the connection handle is published.
///
/// One provider per process. It starts unmounted: every context reads
/// [`ConnectionError::NotProvisioned`] until [`mount`](Self::mount) is
/// called.
pub struct ConnectionProvider<C> {
    tx: Arc<watch::Sender<Slot<C>>>,
    mounted: Arc<AtomicBool>,
}

impl<C: Send + Sync + 'static> ConnectionProvider<C> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            mounted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A read-only view for consumers.
    pub fn context(&self) -> ConnectionContext<C> {
        ConnectionContext {
            rx: self.tx.subscribe(),
        }
    }

    /// Provisions `connection` and returns the scope that owns it.
    ///
    /// The connection starts out as not connected and without an id; the
    /// caller pushes both once the external library reports them.
    ///
    /// # Errors
    /// [`ConnectionError::AlreadyMounted`] if a scope is still alive.
    pub fn mount(&self, connection: C) -> Result<ConnectionScope<C>, ConnectionError> {
        if self.mounted.swap(true, Ordering::AcqRel) {
            return Err(ConnectionError::AlreadyMounted);
        }

        self.tx.send_replace(Some(ConnectionSnapshot {
            connection: Arc::new(connection),
            is_connected: false,
            connection_id: None,
        }));
        tracing::info!("connection scope mounted");

        Ok(ConnectionScope {
            tx: Arc::clone(&self.tx),
            mounted: Arc::clone(&self.mounted),
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }
}

impl<C: Send + Sync + 'static> Default for ConnectionProvider<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for ConnectionProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("mounted", &self.mounted.load(Ordering::Acquire))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ConnectionScope
// ---------------------------------------------------------------------------

/// The single writer for the connection handle.
///
/// Alive while the connection is provisioned. Dropping the scope
/// unpublishes the handle, and contexts go back to `NotProvisioned`.
pub struct ConnectionScope<C> {
    tx: Arc<watch::Sender<Slot<C>>>,
    mounted: Arc<AtomicBool>,
}

impl<C: Send + Sync + 'static> ConnectionScope<C> {
    /// Publishes a new liveness flag.
    pub fn set_connected(&self, is_connected: bool) {
        self.modify(|snapshot| snapshot.is_connected = is_connected);
        tracing::debug!(is_connected, "connection liveness updated");
    }

    /// Publishes a new connection id (or clears it).
    pub fn set_connection_id(&self, connection_id: Option<ConnectionId>) {
        tracing::debug!(connection_id = ?connection_id, "connection id updated");
        self.modify(|snapshot| snapshot.connection_id = connection_id);
    }

    /// Publishes liveness and id together, as one update.
    pub fn push_status(&self, is_connected: bool, connection_id: Option<ConnectionId>) {
        self.modify(|snapshot| {
            snapshot.is_connected = is_connected;
            snapshot.connection_id = connection_id;
        });
    }

    /// Swaps in a new connection object, keeping liveness and id.
    ///
    /// Consumers holding an older snapshot keep their `Arc` to the old
    /// object until they re-read.
    pub fn replace_connection(&self, connection: C) {
        let connection = Arc::new(connection);
        self.modify(|snapshot| snapshot.connection = connection);
        tracing::info!("connection object replaced");
    }

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Result<ConnectionSnapshot<C>, ConnectionError> {
        self.tx
            .borrow()
            .clone()
            .ok_or(ConnectionError::NotProvisioned)
    }

    fn modify(&self, f: impl FnOnce(&mut ConnectionSnapshot<C>)) {
        self.tx.send_modify(|slot| {
            if let Some(snapshot) = slot.as_mut() {
                f(snapshot);
            }
        });
    }
}

impl<C> Drop for ConnectionScope<C> {
    fn drop(&mut self) {
        self.tx.send_replace(None);
        self.mounted.store(false, Ordering::Release);
        tracing::info!("connection scope unmounted");
    }
}

impl<C> std::fmt::Debug for ConnectionScope<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionScope").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// ConnectionContext
// ---------------------------------------------------------------------------

/// Read-only access to the published connection handle.
///
/// Reads always return the latest pushed value. Clone freely; each clone
/// tracks change notifications independently.
pub struct ConnectionContext<C> {
    rx: watch::Receiver<Slot<C>>,
}

impl<C> Clone for ConnectionContext<C> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<C: Send + Sync + 'static> ConnectionContext<C> {
    /// The current snapshot.
    ///
    /// # Errors
    /// [`ConnectionError::NotProvisioned`] outside an active scope.
    pub fn current(&self) -> Result<ConnectionSnapshot<C>, ConnectionError> {
        self.rx
            .borrow()
            .clone()
            .ok_or(ConnectionError::NotProvisioned)
    }

    pub fn connection(&self) -> Result<Arc<C>, ConnectionError> {
        self.current().map(|s| s.connection)
    }

    pub fn is_connected(&self) -> Result<bool, ConnectionError> {
        self.current().map(|s| s.is_connected)
    }

    pub fn connection_id(&self) -> Result<Option<ConnectionId>, ConnectionError> {
        self.current().map(|s| s.connection_id)
    }

    /// Waits until the provider publishes a new value (including
    /// unmounting).
    ///
    /// # Errors
    /// [`ConnectionError::ProviderClosed`] once the provider and every
    /// scope are gone.
    pub async fn changed(&mut self) -> Result<(), ConnectionError> {
        self.rx
            .changed()
            .await
            .map_err(|_| ConnectionError::ProviderClosed)
    }
}

impl<C> std::fmt::Debug for ConnectionContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("provisioned", &self.rx.borrow().is_some())
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
