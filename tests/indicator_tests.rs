use axum::http::{HeaderMap, HeaderValue, header};
use axum_extra::extract::cookie::SameSite;
use portal_gate::{
    ClientCookies, IdentityClass, IndicatorSource, IndicatorStore, RequestIndicator,
    error::StoreError,
    indicator::{CookieSettings, INDICATOR_COOKIE, indicator_cookie, parse_indicator, removal_cookie},
};
use time::{Duration, OffsetDateTime};

// --- Parsing ---

#[test]
fn test_parse_known_classes() {
    assert_eq!(parse_indicator(Some("individual")), Some(IdentityClass::Individual));
    assert_eq!(parse_indicator(Some("company")), Some(IdentityClass::Company));
    assert_eq!(parse_indicator(Some("admin")), Some(IdentityClass::Admin));
}

#[test]
fn test_parse_fails_closed() {
    for raw in ["Admin", "ADMIN", "admin ", " company", "anonymous", "root", "company;admin", "null", "\u{0}"] {
        assert_eq!(parse_indicator(Some(raw)), None, "{raw:?} must read as anonymous");
    }
    assert_eq!(parse_indicator(Some("")), None);
    assert_eq!(parse_indicator(None), None);
}

// --- Cookie Attributes ---

#[test]
fn test_indicator_cookie_attributes() {
    let cookie = indicator_cookie(IdentityClass::Company, &CookieSettings::default());

    assert_eq!(cookie.name(), INDICATOR_COOKIE);
    assert_eq!(cookie.value(), "company");
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    // The client must be able to read it.
    assert_ne!(cookie.http_only(), Some(true));
}

#[test]
fn test_secure_flag_follows_settings() {
    let settings = CookieSettings {
        max_age_days: 1,
        secure: true,
    };
    let cookie = indicator_cookie(IdentityClass::Admin, &settings);
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.max_age(), Some(Duration::days(1)));
}

#[test]
fn test_removal_cookie_expires_immediately() {
    let cookie = removal_cookie(&CookieSettings::default());
    assert_eq!(cookie.name(), INDICATOR_COOKIE);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.path(), Some("/"));
}

// --- Server Adapter ---

#[test]
fn test_request_indicator_reads_cookie_header() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_static("session=opaque-credential; user_type=individual"),
    );

    let indicator = RequestIndicator::from_headers(&headers);
    assert_eq!(indicator.read(), Some(IdentityClass::Individual));
    assert_eq!(indicator.read_raw().unwrap().as_deref(), Some("individual"));
}

#[test]
fn test_request_indicator_without_cookie() {
    let indicator = RequestIndicator::from_headers(&HeaderMap::new());
    assert_eq!(indicator.read(), None);
}

// --- Client Adapter ---

#[test]
fn test_client_write_read_clear() {
    let cookies = ClientCookies::new(CookieSettings::default());
    assert_eq!(cookies.read(), None);

    cookies.write(IdentityClass::Company, None).unwrap();
    assert_eq!(cookies.read(), Some(IdentityClass::Company));

    cookies.write(IdentityClass::Admin, None).unwrap();
    assert_eq!(cookies.read(), Some(IdentityClass::Admin));

    cookies.clear().unwrap();
    assert_eq!(cookies.read(), None);
    assert_eq!(cookies.read_raw().unwrap(), None);
}

#[test]
fn test_client_clones_share_one_jar() {
    let tab_a = ClientCookies::new(CookieSettings::default());
    let tab_b = tab_a.clone();

    tab_a.write(IdentityClass::Individual, None).unwrap();
    assert_eq!(tab_b.read(), Some(IdentityClass::Individual));

    tab_b.clear().unwrap();
    assert_eq!(tab_a.read(), None);
}

#[test]
fn test_client_expired_indicator_reads_absent() {
    let cookies = ClientCookies::new(CookieSettings::default());
    let past = OffsetDateTime::now_utc() - Duration::minutes(1);

    cookies.write(IdentityClass::Company, Some(past)).unwrap();
    assert_eq!(cookies.read(), None);
}

#[test]
fn test_client_future_expiry_is_honored() {
    let cookies = ClientCookies::new(CookieSettings::default());
    let soon = OffsetDateTime::now_utc() + Duration::hours(1);

    cookies.write(IdentityClass::Company, Some(soon)).unwrap();
    assert_eq!(cookies.read(), Some(IdentityClass::Company));
}

#[test]
fn test_client_write_with_oversized_lifetime_is_capped() {
    let settings = CookieSettings {
        max_age_days: 1_000_000_000_000,
        secure: false,
    };
    let cookies = ClientCookies::new(settings);

    cookies.write(IdentityClass::Company, None).unwrap();
    assert_eq!(cookies.read(), Some(IdentityClass::Company));
    assert_eq!(
        indicator_cookie(IdentityClass::Company, &settings).max_age(),
        Some(Duration::days(400))
    );
}

#[test]
fn test_client_malformed_raw_value_reads_anonymous() {
    let cookies = ClientCookies::new(CookieSettings::default());
    cookies.set_raw("superuser").unwrap();

    assert_eq!(cookies.read_raw().unwrap().as_deref(), Some("superuser"));
    assert_eq!(cookies.read(), None);
}

// --- Failure Degradation ---

struct BrokenJar;

impl IndicatorSource for BrokenJar {
    fn read_raw(&self) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("cookies disabled".to_string()))
    }
}

#[test]
fn test_unreadable_jar_reads_anonymous() {
    assert_eq!(BrokenJar.read(), None);
}
