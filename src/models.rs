use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::UnknownIdentityClass;

// --- Identity ---

/// IdentityClass
///
/// The coarse role carried by a session. Anonymous visitors have no class at all,
/// so "anonymous" is modelled as `Option::<IdentityClass>::None` everywhere.
/// Raw cookie strings are converted here and nowhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum IdentityClass {
    Individual,
    Company,
    Admin,
}

impl IdentityClass {
    pub const ALL: [IdentityClass; 3] = [Self::Individual, Self::Company, Self::Admin];

    /// The exact value stored in the indicator cookie.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for IdentityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentityClass {
    type Err = UnknownIdentityClass;

    /// Exact, case-sensitive match. Anything else is rejected (fail closed).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "individual" => Ok(Self::Individual),
            "company" => Ok(Self::Company),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownIdentityClass(other.to_string())),
        }
    }
}

// --- Client Auth State ---

/// AuthState
///
/// The published client-side view of the session. Only the synchronizer produces
/// new values; everybody else holds a copy or a `watch::Receiver`.
///
/// `is_authenticated` is derived from `identity_class`, so the two cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthState {
    is_authenticated: bool,
    identity_class: Option<IdentityClass>,
    is_initialized: bool,
}

impl AuthState {
    /// State before the first indicator read of a page lifecycle.
    pub const fn uninitialized() -> Self {
        Self {
            is_authenticated: false,
            identity_class: None,
            is_initialized: false,
        }
    }

    pub const fn new(identity_class: Option<IdentityClass>, is_initialized: bool) -> Self {
        Self {
            is_authenticated: identity_class.is_some(),
            identity_class,
            is_initialized,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn identity_class(&self) -> Option<IdentityClass> {
        self.identity_class
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::uninitialized()
    }
}

// --- Routing ---

/// RouteClassification
///
/// Computed per request path. Every path has exactly one classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClassification {
    /// Reachable by anyone.
    Public,
    /// Login and signup surfaces, only meant for visitors without a session.
    AuthOnly,
    /// Requires a session of the given class.
    Protected(IdentityClass),
}

/// RedirectDecision
///
/// The outcome of authorizing a single request. Never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    Allow,
    /// Same-origin target path, optionally carrying a `redirect` query parameter.
    RedirectTo(String),
}

// --- Federated Login Callback ---

/// CallbackStatus
///
/// The status value the identity provider attaches to a federated-login callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStatus {
    Success,
    Signup,
    Error,
}

impl FromStr for CallbackStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "success" => Ok(Self::Success),
            "signup" => Ok(Self::Signup),
            "error" => Ok(Self::Error),
            other => Err(format!("unexpected callback status {other:?}")),
        }
    }
}

/// CallbackQuery
///
/// Raw query parameters of `GET /auth/callback`. Every field is optional because
/// missing parameters are an outcome to route, not a request to reject.
#[derive(Debug, Clone, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// `success`, `signup` or `error`.
    pub status: Option<String>,
    /// Identity class granted by the provider (`individual`, `company`, `admin`).
    pub user_type: Option<String>,
    /// Same-origin path to continue to after a successful login.
    pub redirect: Option<String>,
    /// Provider-supplied error code when `status=error`.
    pub error: Option<String>,
}

// --- Response Payloads ---

/// SessionView
///
/// Response of `GET /session`: the identity the edge derives from the indicator cookie.
/// This is a hint for rendering, never an authorization for data access.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub is_authenticated: bool,
    pub identity_class: Option<IdentityClass>,
}

/// LogoutResponse
///
/// Response of `POST /logout`. Logout always succeeds from the caller's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LogoutResponse {
    pub redirect_to: String,
}
