use std::sync::{Arc, RwLock};

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use crate::{error::StoreError, models::IdentityClass};

/// The one client-readable cookie this subsystem owns. It carries the identity
/// class only; the real credential is a separate HttpOnly cookie that is never read here.
pub const INDICATOR_COOKIE: &str = "user_type";

pub const DEFAULT_MAX_AGE_DAYS: i64 = 7;
/// Browsers cap cookie lifetimes at 400 days.
pub const MAX_AGE_CAP_DAYS: i64 = 400;

/// CookieSettings
///
/// Attributes applied whenever the indicator cookie is written or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    pub max_age_days: i64,
    pub secure: bool,
}

impl CookieSettings {
    /// Configured lifetime, clamped to `0..=MAX_AGE_CAP_DAYS` days.
    pub fn max_age(&self) -> Duration {
        Duration::days(self.max_age_days.clamp(0, MAX_AGE_CAP_DAYS))
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_MAX_AGE_DAYS,
            secure: false,
        }
    }
}

/// parse_indicator
///
/// The single parsing rule shared by every adapter. Unknown values are logged and
/// read as anonymous; an empty value is a removed cookie and is read silently.
pub fn parse_indicator(raw: Option<&str>) -> Option<IdentityClass> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<IdentityClass>() {
        Ok(class) => Some(class),
        Err(e) => {
            tracing::warn!(error = %e, "malformed session indicator, treating as anonymous");
            None
        }
    }
}

/// indicator_cookie
///
/// Lax same-site so the cookie survives top-level navigation from external links,
/// path `/`, bounded lifetime. Not HttpOnly: the client must be able to read it.
pub fn indicator_cookie(class: IdentityClass, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((INDICATOR_COOKIE, class.as_str()))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(settings.max_age())
        .build()
}

/// removal_cookie
///
/// Overwrites the indicator with an already-expired empty value.
pub fn removal_cookie(settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build((INDICATOR_COOKIE, ""))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(Duration::ZERO)
        .build()
}

// --- Adapter Contracts ---

/// IndicatorSource
///
/// Read access to the indicator. Implemented by both the request-scoped server
/// adapter and the client-side jar.
pub trait IndicatorSource: Send + Sync {
    /// The raw cookie value, if the cookie is present.
    fn read_raw(&self) -> Result<Option<String>, StoreError>;

    /// read
    ///
    /// Typed read. Never fails: an unreadable jar or an unknown value is anonymous.
    fn read(&self) -> Option<IdentityClass> {
        match self.read_raw() {
            Ok(raw) => parse_indicator(raw.as_deref()),
            Err(e) => {
                tracing::warn!(error = %e, "session indicator unreadable, treating as anonymous");
                None
            }
        }
    }
}

/// IndicatorStore
///
/// Read/write access. Only the client-side context can write; the server side
/// answers with Set-Cookie headers built from `indicator_cookie`/`removal_cookie`.
pub trait IndicatorStore: IndicatorSource {
    /// Writes the indicator. `expires_at` shortens the lifetime below the configured
    /// maximum when the identity provider told us when the session ends.
    fn write(
        &self,
        class: IdentityClass,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

// --- Server Adapter (read-only) ---

/// RequestIndicator
///
/// Indicator view of an incoming request's `Cookie` header.
#[derive(Debug, Clone, Default)]
pub struct RequestIndicator {
    jar: CookieJar,
}

impl RequestIndicator {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            jar: CookieJar::from_headers(headers),
        }
    }

    pub fn from_jar(jar: CookieJar) -> Self {
        Self { jar }
    }
}

impl IndicatorSource for RequestIndicator {
    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        Ok(self
            .jar
            .get(INDICATOR_COOKIE)
            .map(|cookie| cookie.value().to_string()))
    }
}

// --- Client Adapter (read/write) ---

/// ClientCookies
///
/// The cookie jar of one client profile. Every tab of the profile holds a clone,
/// so a write in one tab is immediately visible to reads in every other tab, like
/// a browser's `document.cookie`. Expired cookies read as absent.
#[derive(Debug, Clone, Default)]
pub struct ClientCookies {
    jar: Arc<RwLock<CookieJar>>,
    settings: CookieSettings,
}

impl ClientCookies {
    pub fn new(settings: CookieSettings) -> Self {
        Self {
            jar: Arc::new(RwLock::new(CookieJar::new())),
            settings,
        }
    }

    /// Stores a raw value as-is, bypassing the typed writer. Used to replay
    /// whatever the identity provider set on the client.
    pub fn set_raw(&self, value: &str) -> Result<(), StoreError> {
        let cookie = Cookie::build((INDICATOR_COOKIE, value.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .build();
        self.replace(|jar| jar.add(cookie))
    }

    fn replace(&self, update: impl FnOnce(CookieJar) -> CookieJar) -> Result<(), StoreError> {
        let mut jar = self.jar.write().map_err(|_| StoreError::Poisoned)?;
        *jar = update(jar.clone());
        Ok(())
    }
}

impl IndicatorSource for ClientCookies {
    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        let jar = self.jar.read().map_err(|_| StoreError::Poisoned)?;
        let Some(cookie) = jar.get(INDICATOR_COOKIE) else {
            return Ok(None);
        };
        if let Some(expires) = cookie.expires_datetime() {
            if expires <= OffsetDateTime::now_utc() {
                return Ok(None);
            }
        }
        Ok(Some(cookie.value().to_string()))
    }
}

impl IndicatorStore for ClientCookies {
    fn write(
        &self,
        class: IdentityClass,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), StoreError> {
        let max_expiry = OffsetDateTime::now_utc().checked_add(self.settings.max_age());
        let expiry = match (expires_at, max_expiry) {
            (Some(at), Some(max)) => Some(at.min(max)),
            (at, max) => at.or(max),
        };

        let mut cookie = indicator_cookie(class, &self.settings);
        if let Some(expiry) = expiry {
            cookie.set_expires(expiry);
        }
        self.replace(|jar| jar.add(cookie))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.replace(|jar| jar.remove(Cookie::from(INDICATOR_COOKIE)))
    }
}
