use portal_gate::{
    AppConfig, AppState, IdentityClass, MockIdentityProvider, create_router, models::SessionView,
};
use reqwest::{StatusCode, header, redirect::Policy};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
    pub provider: MockIdentityProvider,
}

async fn spawn_app(provider: MockIdentityProvider) -> TestApp {
    let state = AppState {
        provider: Arc::new(provider.clone()),
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address, provider }
}

// Redirects are the subject under test, so the client must not follow them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app(MockIdentityProvider::new()).await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_login_browse_logout_journey() {
    let app = spawn_app(MockIdentityProvider::new()).await;
    let client = client();

    // 1. Anonymous visitor asks for a company page.
    let resp = client
        .get(format!("{}/company/jobs", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        resp.headers()[header::LOCATION],
        "/company-login?redirect=/company/jobs"
    );

    // 2. Provider calls back with a company session and the return-to path.
    let resp = client
        .get(format!(
            "{}/auth/callback?status=success&user_type=company&redirect=/company/jobs",
            app.address
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()[header::LOCATION], "/company/jobs");
    let set_cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    let indicator = set_cookie.split(';').next().unwrap().to_string();
    assert_eq!(indicator, "user_type=company");

    // 3. The page is now reachable and the session is visible.
    let resp = client
        .get(format!("{}/company/jobs", app.address))
        .header(header::COOKIE, &indicator)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let view: SessionView = client
        .get(format!("{}/session", app.address))
        .header(header::COOKIE, &indicator)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view.identity_class, Some(IdentityClass::Company));

    // 4. Logout clears the indicator and reaches the provider eventually.
    let resp = client
        .post(format!("{}/logout", app.address))
        .header(header::COOKIE, &indicator)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let mut calls = Vec::new();
    for _ in 0..100 {
        calls = app.provider.calls();
        if !calls.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(calls, vec![IdentityClass::Company]);
}
