//! Session lifecycle: usable-session checks, login and logout transitions, and the
//! federated-login callback.
//!
//! Login and logout are the only writers of session state. Each commits to the
//! cookie jar, republishes through the tab's synchronizer and signals the other
//! tabs. The remote logout call is fire-and-forget; local state never waits for it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::{
    classify,
    guard::authorize,
    indicator::IndicatorStore,
    models::{AuthState, CallbackQuery, CallbackStatus, IdentityClass, RedirectDecision},
    provider::ProviderState,
    surfaces,
    sync::{AuthSynchronizer, StorageBus},
};

const MAX_REASON_LEN: usize = 64;

/// CallbackOutcome
///
/// Where a federated-login callback leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    SignedIn {
        class: IdentityClass,
        redirect_to: String,
    },
    Signup {
        class: Option<IdentityClass>,
        redirect_to: String,
    },
    Failed {
        reason: String,
        redirect_to: String,
    },
}

/// LogoutOutcome
///
/// Result of a local logout. `remote` is the detached provider call, if one was made;
/// awaiting it is optional and only useful in tests.
#[derive(Debug)]
pub struct LogoutOutcome {
    pub redirect_to: &'static str,
    pub state: AuthState,
    pub remote: Option<JoinHandle<()>>,
}

/// logout_target
///
/// Login surface to show once a session of `class` has ended.
pub fn logout_target(class: Option<IdentityClass>) -> &'static str {
    class.map_or(surfaces::GENERIC_LOGIN, surfaces::login_surface)
}

/// spawn_remote_logout
///
/// Detaches the provider logout call. Failures are logged and otherwise ignored:
/// the local session is already gone by the time this runs.
pub fn spawn_remote_logout(
    provider: ProviderState,
    class: IdentityClass,
    cookie_header: Option<String>,
) -> Option<JoinHandle<()>> {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!(%class, "no async runtime, remote logout skipped");
        return None;
    };

    Some(runtime.spawn(async move {
        match provider.logout(class, cookie_header).await {
            Ok(()) => tracing::debug!(%class, "remote logout acknowledged"),
            Err(e) => tracing::warn!(
                error = %e,
                %class,
                "remote logout failed, local session already cleared"
            ),
        }
    }))
}

fn sanitize_reason(raw: &str) -> String {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_REASON_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        raw.to_string()
    } else {
        "provider_error".to_string()
    }
}

fn failed(reason: &str, diagnostic: &str) -> CallbackOutcome {
    tracing::warn!(reason, diagnostic, "federated login callback rejected");
    CallbackOutcome::Failed {
        reason: reason.to_string(),
        redirect_to: surfaces::login_error(reason),
    }
}

/// resolve_callback
///
/// Pure interpretation of the callback parameters. Only `status=success` with a known
/// class signs in; anything missing or unexpected is a failure routed to the generic
/// login surface. A return-to path is honored only when it is same-origin and the
/// new session may actually open it.
pub fn resolve_callback(query: &CallbackQuery) -> CallbackOutcome {
    let status = match query.status.as_deref().map(str::parse::<CallbackStatus>) {
        Some(Ok(status)) => status,
        Some(Err(e)) => return failed("invalid_status", &e),
        None => return failed("missing_status", "callback without status parameter"),
    };

    let class = query.user_type.as_deref().map(str::parse::<IdentityClass>);

    match status {
        CallbackStatus::Success => match class {
            Some(Ok(class)) => {
                let redirect_to = query
                    .redirect
                    .as_deref()
                    .and_then(surfaces::sanitize_return_to)
                    .filter(|path| authorize(path, Some(class)) == RedirectDecision::Allow)
                    .filter(|path| !classify::is_auth_flow(path))
                    .unwrap_or_else(|| surfaces::home_surface(class).to_string());
                CallbackOutcome::SignedIn { class, redirect_to }
            }
            Some(Err(e)) => failed("invalid_user_type", &e.to_string()),
            None => failed("missing_user_type", "success callback without user_type"),
        },
        CallbackStatus::Signup => match class {
            Some(Ok(class)) => CallbackOutcome::Signup {
                class: Some(class),
                redirect_to: surfaces::signup_surface(class).to_string(),
            },
            Some(Err(e)) => failed("invalid_user_type", &e.to_string()),
            None => CallbackOutcome::Signup {
                class: None,
                redirect_to: surfaces::GENERIC_SIGNUP.to_string(),
            },
        },
        CallbackStatus::Error => {
            let reason = sanitize_reason(query.error.as_deref().unwrap_or_default());
            failed(&reason, "identity provider reported an error")
        }
    }
}

/// SessionLifecycle
///
/// Client-side owner of the login/logout transitions for one tab.
pub struct SessionLifecycle<S: ?Sized> {
    store: Arc<S>,
    sync: AuthSynchronizer<S>,
    provider: ProviderState,
    bus: StorageBus,
}

impl<S> SessionLifecycle<S>
where
    S: IndicatorStore + ?Sized + 'static,
{
    pub fn new(sync: AuthSynchronizer<S>, provider: ProviderState, bus: StorageBus) -> Self {
        Self {
            store: sync.store(),
            sync,
            provider,
            bus,
        }
    }

    pub fn synchronizer(&self) -> &AuthSynchronizer<S> {
        &self.sync
    }

    /// has_usable_session
    ///
    /// An indicator is present and not locally known to be expired. Without expiry
    /// metadata the session is assumed valid until an API call answers unauthorized
    /// (see `on_unauthorized`).
    pub fn has_usable_session(&self) -> bool {
        self.store.read().is_some()
    }

    /// The class of the current session, if any.
    pub fn identity_class(&self) -> Option<IdentityClass> {
        self.store.read()
    }

    /// login
    ///
    /// Local commit after the identity provider has already authenticated the user.
    pub fn login(&self, class: IdentityClass) -> AuthState {
        self.commit(class, None)
    }

    /// login_until
    ///
    /// Like `login`, with local expiry metadata taken from the provider.
    pub fn login_until(&self, class: IdentityClass, expires_at: DateTime<Utc>) -> AuthState {
        let expires_at = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()).ok();
        self.commit(class, expires_at)
    }

    /// logout
    ///
    /// Reads the class first (it decides the login surface), clears the indicator,
    /// publishes anonymous, signals other tabs, then detaches the remote logout.
    /// The client's provider attaches the credential from its own cookie store
    /// (`HttpIdentityProvider::with_cookie_store`), so no header is passed here.
    pub fn logout(&self) -> LogoutOutcome {
        let class = self.store.read();
        let state = self.end_local_session();

        let remote = class.and_then(|class| {
            spawn_remote_logout(Arc::clone(&self.provider), class, None)
        });

        tracing::info!(class = ?class, "logged out");
        LogoutOutcome {
            redirect_to: logout_target(class),
            state,
            remote,
        }
    }

    /// on_unauthorized
    ///
    /// Reaction to an API call answered with 401: the credential is gone even if the
    /// indicator is not. Clears local state and returns the login surface for the
    /// ended session, carrying the current path as return-to.
    pub fn on_unauthorized(&self) -> String {
        let class = self.store.read();
        self.end_local_session();

        let surface = logout_target(class);
        let path = self.sync.current_path();
        tracing::info!(class = ?class, %path, "session rejected by api, cleared locally");

        if classify::is_auth_flow(&path) {
            surface.to_string()
        } else {
            surfaces::with_return_to(surface, &classify::normalize_path(&path))
        }
    }

    /// complete_federated_login
    ///
    /// Applies a provider callback on the client and returns where to navigate next.
    pub fn complete_federated_login(&self, query: &CallbackQuery) -> String {
        match resolve_callback(query) {
            CallbackOutcome::SignedIn { class, redirect_to } => {
                self.login(class);
                redirect_to
            }
            CallbackOutcome::Signup { redirect_to, .. } => redirect_to,
            CallbackOutcome::Failed { redirect_to, .. } => {
                self.end_local_session();
                redirect_to
            }
        }
    }

    fn commit(&self, class: IdentityClass, expires_at: Option<OffsetDateTime>) -> AuthState {
        if let Err(e) = self.store.write(class, expires_at) {
            tracing::warn!(error = %e, %class, "failed to write session indicator");
        }
        let state = self.sync.check_auth();
        self.bus.signal_auth_change(self.sync.tab());
        tracing::info!(%class, "session committed");
        state
    }

    fn end_local_session(&self) -> AuthState {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear session indicator");
        }
        let state = self.sync.sign_out();
        self.bus.signal_auth_change(self.sync.tab());
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_reason_keeps_short_codes() {
        assert_eq!(sanitize_reason("access_denied"), "access_denied");
        assert_eq!(sanitize_reason("invalid-grant"), "invalid-grant");
    }

    #[test]
    fn sanitize_reason_replaces_everything_else() {
        assert_eq!(sanitize_reason(""), "provider_error");
        assert_eq!(sanitize_reason("a b"), "provider_error");
        assert_eq!(sanitize_reason("x&next=//evil"), "provider_error");
        assert_eq!(sanitize_reason(&"a".repeat(65)), "provider_error");
    }

    #[test]
    fn logout_target_defaults_to_generic_login() {
        assert_eq!(logout_target(None), surfaces::GENERIC_LOGIN);
        assert_eq!(logout_target(Some(IdentityClass::Company)), "/company-login");
    }
}
