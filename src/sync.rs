//! Client-side auth state synchronization.
//!
//! One `AuthSynchronizer` exists per tab. It owns the tab's `AuthState` behind a
//! `tokio::sync::watch` channel: the sender is the single writer, UI components hold
//! receivers. Every publish re-reads the indicator while holding the channel's write
//! lock, so concurrent `check_auth` calls from focus, navigation and storage callbacks
//! serialize and the last one wins with the freshest read.
//!
//! Tabs of one profile share a `ClientCookies` jar and a `StorageBus`. A tab that
//! commits a login or logout emits a sentinel event; the other tabs resynchronize
//! when their listener task receives it. Until then they may briefly disagree.

use std::sync::{Arc, Mutex};

use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    classify,
    indicator::IndicatorSource,
    models::{AuthState, IdentityClass},
};

/// Storage key whose change means "auth state may have changed, re-check".
pub const SENTINEL_KEY: &str = "portal-gate:auth-sync";

const BUS_CAPACITY: usize = 64;

pub type TabId = Uuid;

/// StorageEvent
///
/// A cross-tab storage change. Carries no state: receivers re-read the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub origin: TabId,
}

/// StorageBus
///
/// Broadcast channel standing in for the browser's `storage` event.
#[derive(Debug, Clone)]
pub struct StorageBus {
    tx: broadcast::Sender<StorageEvent>,
}

impl StorageBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.tx.subscribe()
    }

    /// Publishes a change of `key`. Having no listening tab is not an error.
    pub fn emit(&self, key: &str, origin: TabId) {
        let _ = self.tx.send(StorageEvent {
            key: key.to_string(),
            origin,
        });
    }

    pub fn signal_auth_change(&self, origin: TabId) {
        self.emit(SENTINEL_KEY, origin);
    }
}

impl Default for StorageBus {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner<S: ?Sized> {
    tab: TabId,
    path: Mutex<String>,
    state: watch::Sender<AuthState>,
    store: Arc<S>,
}

/// AuthSynchronizer
///
/// Cheap to clone; clones share the same state and tab identity.
pub struct AuthSynchronizer<S: ?Sized> {
    inner: Arc<Inner<S>>,
}

impl<S: ?Sized> Clone for AuthSynchronizer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> AuthSynchronizer<S>
where
    S: IndicatorSource + ?Sized + 'static,
{
    /// Creates an uninitialized synchronizer for a tab currently showing `path`.
    pub fn new(store: Arc<S>, path: &str) -> Self {
        let (state, _) = watch::channel(AuthState::uninitialized());
        Self {
            inner: Arc::new(Inner {
                tab: Uuid::new_v4(),
                path: Mutex::new(path.to_string()),
                state,
                store,
            }),
        }
    }

    pub fn tab(&self) -> TabId {
        self.inner.tab
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.inner.store)
    }

    pub fn current_path(&self) -> String {
        match self.inner.path.lock() {
            Ok(path) => path.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// The latest published state.
    pub fn snapshot(&self) -> AuthState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// initialize
    ///
    /// First read of the page lifecycle. Marks the state initialized whatever the read
    /// yields: an unreadable indicator is published as anonymous.
    pub fn initialize(&self) -> AuthState {
        let state = self.publish_with(true, |sync| sync.derive());
        tracing::debug!(
            tab = %self.tab(),
            authenticated = state.is_authenticated(),
            "auth state initialized"
        );
        state
    }

    /// check_auth
    ///
    /// Re-derives the state from the indicator. Idempotent: without a cookie change
    /// the published value stays equal and subscribers are not woken.
    pub fn check_auth(&self) -> AuthState {
        self.publish_with(false, |sync| sync.derive())
    }

    /// navigate
    ///
    /// Records the path the tab now shows, then resynchronizes.
    pub fn navigate(&self, path: &str) -> AuthState {
        match self.inner.path.lock() {
            Ok(mut current) => *current = path.to_string(),
            Err(poisoned) => *poisoned.into_inner() = path.to_string(),
        }
        self.check_auth()
    }

    /// Publishes anonymous regardless of the jar. Used by the logout paths.
    pub(crate) fn sign_out(&self) -> AuthState {
        self.publish_with(false, |_| None)
    }

    /// listen
    ///
    /// Spawns the tab's storage listener. Events emitted by this tab are ignored,
    /// like a browser never delivers `storage` events to the tab that wrote.
    /// A lagged receiver resynchronizes once instead of replaying missed events.
    /// Returns `None` outside a tokio runtime; the tab then only resyncs on navigation.
    pub fn listen(&self, bus: &StorageBus) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(tab = %self.tab(), "no async runtime, storage listener not started");
            return None;
        };
        let mut events = bus.subscribe();
        let sync = self.clone();

        Some(runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.origin == sync.tab() || event.key != SENTINEL_KEY {
                            continue;
                        }
                        let state = sync.check_auth();
                        tracing::debug!(
                            tab = %sync.tab(),
                            from = %event.origin,
                            authenticated = state.is_authenticated(),
                            "auth state resynchronized from storage event"
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(tab = %sync.tab(), skipped, "storage listener lagged");
                        sync.check_auth();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }

    fn derive(&self) -> Option<IdentityClass> {
        let path = self.current_path();
        // Mid login/signup a stale indicator must not flip the tab to authenticated.
        if classify::is_auth_flow(&path) {
            return None;
        }
        self.inner.store.read()
    }

    fn publish_with(
        &self,
        mark_initialized: bool,
        class: impl FnOnce(&Self) -> Option<IdentityClass>,
    ) -> AuthState {
        let mut published = AuthState::uninitialized();
        self.inner.state.send_if_modified(|current| {
            let next = AuthState::new(class(self), current.is_initialized() || mark_initialized);
            published = next;
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
        published
    }
}
