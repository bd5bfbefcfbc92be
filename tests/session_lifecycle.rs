//! End-to-end tests for the session lifecycle against an in-process mock
//! of the fund's authentication API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use rpps_admin::api::ApiClient;
use rpps_admin::auth::{AuthError, LoginOutcome, SessionManager, SessionStore};
use rpps_admin::models::{LoginCredentials, UserProfile};

const ACCESS: &str = "acc-1";
const REFRESH: &str = "ref-1";

fn profile_json() -> Value {
    json!({
        "id": 7,
        "username": "gestor",
        "email": "gestor@fundo.gov.br",
        "first_name": "Maria",
        "last_name": "Souza",
        "is_staff": true,
        "is_superuser": false,
        "is_admin": true
    })
}

fn profile() -> UserProfile {
    serde_json::from_value(profile_json()).unwrap()
}

fn credentials(password: &str) -> LoginCredentials {
    LoginCredentials {
        username: "gestor".to_string(),
        password: password.to_string(),
    }
}

/// Serve the router on an ephemeral port, returning the base URL.
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn login_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "gestor" && body["password"] == "segredo" {
        (
            StatusCode::OK,
            Json(json!({
                "access_token": ACCESS,
                "refresh_token": REFRESH,
                "user": profile_json(),
                "message": "Login realizado com sucesso"
            })),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"non_field_errors": ["Credenciais inválidas."]})),
        )
    }
}

async fn refresh_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["refresh_token"] == "abc" {
        (StatusCode::OK, Json(json!({"access_token": "new123"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Token inválido"})))
    }
}

/// Profile endpoint accepting exactly one access token.
fn profile_route(accepted: &'static str) -> Router {
    Router::new().route(
        "/auth/profile/",
        get(move |headers: HeaderMap| async move {
            if bearer(&headers) == Some(accepted) {
                (StatusCode::OK, Json(profile_json()))
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({"detail": "token inválido"})))
            }
        }),
    )
}

fn logout_ok_route() -> Router {
    Router::new().route(
        "/auth/logout/",
        post(|| async { (StatusCode::OK, Json(json!({"message": "ok"}))) }),
    )
}

fn manager(base_url: &str, dir: &TempDir) -> SessionManager {
    let client = ApiClient::new(base_url).unwrap();
    let store = SessionStore::new(dir.path().to_path_buf());
    SessionManager::new(client, store)
}

fn store(dir: &TempDir) -> SessionStore {
    SessionStore::new(dir.path().to_path_buf())
}

#[tokio::test]
async fn login_success_authenticates_and_persists_tokens() {
    let base = spawn(Router::new().route("/auth/login/", post(login_handler))).await;
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&base, &dir);

    let outcome = manager.login(&credentials("segredo")).await;
    assert_eq!(outcome, LoginOutcome::Success);

    let session = manager.session();
    assert!(session.is_authenticated);
    assert!(!session.loading);
    assert_eq!(session.user, Some(profile()));

    // Persisted entries match the endpoint response exactly
    let store = store(&dir);
    assert_eq!(store.access_token().unwrap().as_deref(), Some(ACCESS));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some(REFRESH));
    assert_eq!(store.cached_profile().unwrap(), Some(profile()));
}

#[tokio::test]
async fn login_rejection_surfaces_message_and_persists_nothing() {
    let base = spawn(Router::new().route("/auth/login/", post(login_handler))).await;
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&base, &dir);

    let outcome = manager.login(&credentials("errada")).await;
    assert_eq!(
        outcome,
        LoginOutcome::Failed("Credenciais inválidas.".to_string())
    );

    let session = manager.session();
    assert!(!session.is_authenticated);
    assert!(!session.loading);

    let store = store(&dir);
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
}

#[tokio::test]
async fn initialize_without_persisted_state_resolves_unauthenticated() {
    // No routes: any request would fail, so this also proves no call is made
    let base = spawn(Router::new()).await;
    let dir = TempDir::new().unwrap();
    let mut manager = manager(&base, &dir);

    assert!(manager.session().loading);
    manager.initialize().await;

    let session = manager.session();
    assert!(!session.is_authenticated);
    assert!(!session.loading);
    assert_eq!(session.user, None);
}

#[tokio::test]
async fn initialize_replaces_cached_profile_with_fresh_fetch() {
    let base = spawn(profile_route(ACCESS)).await;
    let dir = TempDir::new().unwrap();

    // Seed storage with a stale cached profile
    let mut stale = profile();
    stale.email = Some("antigo@fundo.gov.br".to_string());
    store(&dir).store_login(ACCESS, REFRESH, &stale).unwrap();

    let mut manager = manager(&base, &dir);
    manager.initialize().await;

    let session = manager.session();
    assert!(session.is_authenticated);
    assert!(!session.loading);
    assert_eq!(session.user, Some(profile()));
}

#[tokio::test]
async fn initialize_with_rejected_token_clears_everything() {
    let base = spawn(profile_route("some-other-token").merge(logout_ok_route())).await;
    let dir = TempDir::new().unwrap();
    store(&dir).store_login(ACCESS, REFRESH, &profile()).unwrap();

    let mut manager = manager(&base, &dir);
    manager.initialize().await;

    let session = manager.session();
    assert!(!session.is_authenticated);
    assert!(!session.loading);
    assert_eq!(session.user, None);

    let store = store(&dir);
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert!(store.cached_profile().unwrap().is_none());
}

#[tokio::test]
async fn initialize_with_unparsable_cached_profile_logs_out() {
    let base = spawn(logout_ok_route()).await;
    let dir = TempDir::new().unwrap();
    store(&dir).store_login(ACCESS, REFRESH, &profile()).unwrap();
    std::fs::write(dir.path().join("user_data"), "{not json").unwrap();

    let mut manager = manager(&base, &dir);
    manager.initialize().await;

    assert!(!manager.session().is_authenticated);
    assert_eq!(store(&dir).access_token().unwrap(), None);
}

#[tokio::test]
async fn logout_clears_state_even_when_remote_call_fails() {
    let failing_logout = Router::new().route(
        "/auth/logout/",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"}))) }),
    );
    let base = spawn(failing_logout).await;
    let dir = TempDir::new().unwrap();
    store(&dir).store_login(ACCESS, REFRESH, &profile()).unwrap();

    let mut manager = manager(&base, &dir);
    manager.logout().await;

    let session = manager.session();
    assert!(!session.is_authenticated);
    assert!(!session.loading);
    assert_eq!(session.user, None);

    let store = store(&dir);
    assert_eq!(store.access_token().unwrap(), None);
    assert_eq!(store.refresh_token().unwrap(), None);
    assert!(store.cached_profile().unwrap().is_none());
}

#[tokio::test]
async fn refresh_without_token_fails_fast_and_never_hits_endpoint() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = Router::new().route(
        "/auth/refresh/",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (StatusCode::OK, Json(json!({"access_token": "should-not-happen"})))
            }
        }),
    );
    let base = spawn(router).await;
    let dir = TempDir::new().unwrap();

    let mut manager = manager(&base, &dir);
    let result = manager.refresh_access_token().await;

    assert!(matches!(result, Err(AuthError::MissingRefreshToken)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!manager.session().is_authenticated);
}

#[tokio::test]
async fn refresh_persists_new_access_token_and_keeps_refresh_token() {
    let base = spawn(Router::new().route("/auth/refresh/", post(refresh_handler))).await;
    let dir = TempDir::new().unwrap();
    store(&dir).store_login("old-access", "abc", &profile()).unwrap();

    let mut manager = manager(&base, &dir);
    let token = manager.refresh_access_token().await.unwrap();

    assert_eq!(token, "new123");
    let store = store(&dir);
    assert_eq!(store.access_token().unwrap().as_deref(), Some("new123"));
    assert_eq!(store.refresh_token().unwrap().as_deref(), Some("abc"));
}

#[tokio::test]
async fn rejected_refresh_logs_out_and_propagates() {
    let router = Router::new()
        .route("/auth/refresh/", post(refresh_handler))
        .merge(logout_ok_route());
    let base = spawn(router).await;
    let dir = TempDir::new().unwrap();
    store(&dir)
        .store_login("old-access", "blacklisted", &profile())
        .unwrap();

    let mut manager = manager(&base, &dir);
    let result = manager.refresh_access_token().await;

    assert!(matches!(result, Err(AuthError::Api(_))));
    assert!(!manager.session().is_authenticated);
    assert_eq!(store(&dir).refresh_token().unwrap(), None);
}

#[tokio::test]
async fn login_then_initialize_round_trips_the_session() {
    let router = Router::new()
        .route("/auth/login/", post(login_handler))
        .merge(profile_route(ACCESS));
    let base = spawn(router).await;
    let dir = TempDir::new().unwrap();

    let mut first = manager(&base, &dir);
    assert!(first.login(&credentials("segredo")).await.is_success());
    let after_login = first.snapshot();

    // A fresh process restoring from the same storage converges to the
    // identical authenticated session
    let mut second = manager(&base, &dir);
    second.initialize().await;

    assert_eq!(second.snapshot(), after_login);
}

#[tokio::test]
async fn get_with_refresh_retries_once_after_renewing_the_token() {
    let router = Router::new()
        .route("/auth/refresh/", post(refresh_handler))
        .merge(profile_route("new123"));
    let base = spawn(router).await;
    let dir = TempDir::new().unwrap();
    store(&dir).store_login("stale", "abc", &profile()).unwrap();

    // The stale access token is rejected by the profile endpoint; the
    // request succeeds only through the refresh-and-retry path
    let mut manager = manager(&base, &dir);
    let fetched: UserProfile = manager.get_with_refresh("/auth/profile/").await.unwrap();
    assert_eq!(fetched, profile());
    assert_eq!(store(&dir).access_token().unwrap().as_deref(), Some("new123"));
}
