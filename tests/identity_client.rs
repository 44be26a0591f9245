use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;
use zentora::identity::{
    Credentials, GoTrueClient, IdentityProvider, ProviderError, ResendOptions, ResendRequest,
    ResendTarget, ResendType,
};

const API_KEY: &str = "anon-key";

#[derive(Debug, Clone)]
struct Captured {
    path: &'static str,
    query: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
    user_agent: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct FakeGoTrue {
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl FakeGoTrue {
    fn capture(
        &self,
        path: &'static str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Value,
    ) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(Captured {
                path,
                query,
                apikey: header("apikey"),
                authorization: header("authorization"),
                user_agent: header("user-agent"),
                body,
            });
        }
    }

    fn last(&self) -> Option<Captured> {
        self.seen.lock().ok().and_then(|seen| seen.last().cloned())
    }
}

fn user_body(email: &str) -> Value {
    json!({
        "id": "0b5c7a6e-1f3d-4a57-9d0e-6c1c1e1c8a11",
        "aud": "authenticated",
        "email": email,
        "created_at": "2025-01-01T12:00:00Z"
    })
}

async fn signup(
    State(fake): State<FakeGoTrue>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    fake.capture("signup", query, &headers, body);

    if email == "taken@example.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"code": 422, "error_code": "user_already_exists", "msg": "User already registered"})),
        );
    }

    (StatusCode::OK, Json(user_body(&email)))
}

async fn token(
    State(fake): State<FakeGoTrue>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();
    fake.capture("token", query, &headers, body);

    if password != "correct horse" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": "header.payload.signature",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r3fr3sh",
            "user": user_body(&email)
        })),
    )
}

async fn resend(
    State(fake): State<FakeGoTrue>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    fake.capture("resend", query, &headers, body);
    Json(json!({"message_id": "msg-42"}))
}

async fn broken() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "upstream down")
}

async fn spawn(router: Router) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

async fn fake_gotrue() -> Result<(FakeGoTrue, GoTrueClient)> {
    let fake = FakeGoTrue::default();
    let router = Router::new()
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/resend", post(resend))
        .route("/auth/v1/health", get(|| async { Json(json!({"name": "GoTrue"})) }))
        .with_state(fake.clone());

    let base_url = spawn(router).await?;
    let client = GoTrueClient::new(
        &base_url,
        &SecretString::from(API_KEY.to_string()),
        Duration::from_secs(5),
    )?;
    Ok((fake, client))
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials::new(email.to_string(), SecretString::from(password.to_string()))
}

#[tokio::test]
async fn sign_up_sends_key_and_credentials() -> Result<()> {
    let (fake, client) = fake_gotrue().await?;

    let response = client
        .sign_up(&credentials("alice@example.com", "s3cret!"))
        .await?;
    assert!(response.session.is_none());
    assert_eq!(
        response.user.and_then(|u| u.email).as_deref(),
        Some("alice@example.com")
    );

    let seen = fake.last().ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert_eq!(seen.path, "signup");
    assert_eq!(seen.apikey.as_deref(), Some(API_KEY));
    assert_eq!(seen.authorization.as_deref(), Some("Bearer anon-key"));
    assert!(
        seen.user_agent
            .is_some_and(|ua| ua.starts_with(env!("CARGO_PKG_NAME")))
    );
    assert_eq!(
        seen.body,
        json!({"email": "alice@example.com", "password": "s3cret!"})
    );
    Ok(())
}

#[tokio::test]
async fn sign_up_relays_provider_message() -> Result<()> {
    let (_fake, client) = fake_gotrue().await?;

    let result = client
        .sign_up(&credentials("taken@example.com", "s3cret!"))
        .await;

    match result {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(message, "User already registered");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn password_grant_returns_session() -> Result<()> {
    let (fake, client) = fake_gotrue().await?;

    let response = client
        .sign_in_with_password(&credentials("alice@example.com", "correct horse"))
        .await?;
    assert!(response.session.is_some());
    assert!(response.user.is_some());

    let seen = fake.last().ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert_eq!(seen.path, "token");
    assert_eq!(
        seen.query.get("grant_type").map(String::as_str),
        Some("password")
    );
    Ok(())
}

#[tokio::test]
async fn password_grant_uses_error_description() -> Result<()> {
    let (_fake, client) = fake_gotrue().await?;

    let result = client
        .sign_in_with_password(&credentials("alice@example.com", "wrong"))
        .await;

    match result {
        Err(ProviderError::Api { status, message }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "Invalid login credentials");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn resend_email_carries_redirect_and_captcha() -> Result<()> {
    let (fake, client) = fake_gotrue().await?;

    let request = ResendRequest {
        kind: ResendType::Signup,
        target: ResendTarget::Email("alice@example.com".to_string()),
        options: ResendOptions {
            email_redirect_to: Some("https://app.zentora.dev/welcome".to_string()),
            captcha_token: Some("hcaptcha-token".to_string()),
        },
    };
    let response = client.resend(&request).await?;
    assert_eq!(response.message_id.as_deref(), Some("msg-42"));

    let seen = fake.last().ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert_eq!(
        seen.query.get("redirect_to").map(String::as_str),
        Some("https://app.zentora.dev/welcome")
    );
    assert_eq!(seen.body["type"], "signup");
    assert_eq!(seen.body["email"], "alice@example.com");
    assert_eq!(
        seen.body["gotrue_meta_security"]["captcha_token"],
        "hcaptcha-token"
    );
    Ok(())
}

#[tokio::test]
async fn resend_sms_targets_phone() -> Result<()> {
    let (fake, client) = fake_gotrue().await?;

    let request = ResendRequest {
        kind: ResendType::Sms,
        target: ResendTarget::Phone("+15555550100".to_string()),
        options: ResendOptions::default(),
    };
    client.resend(&request).await?;

    let seen = fake.last().ok_or_else(|| anyhow::anyhow!("no request"))?;
    assert_eq!(seen.body["type"], "sms");
    assert_eq!(seen.body["phone"], "+15555550100");
    assert!(seen.body.get("email").is_none());
    assert!(!seen.query.contains_key("redirect_to"));
    Ok(())
}

#[tokio::test]
async fn health_probe() -> Result<()> {
    let (_fake, client) = fake_gotrue().await?;
    client.health().await?;

    let base_url = spawn(Router::new().route("/auth/v1/health", get(broken))).await?;
    let client = GoTrueClient::new(
        &base_url,
        &SecretString::from(API_KEY.to_string()),
        Duration::from_secs(5),
    )?;
    let result = client.health().await;
    assert!(matches!(
        result,
        Err(ProviderError::Api { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE
    ));
    Ok(())
}

#[tokio::test]
async fn unreachable_provider_is_a_request_error() -> Result<()> {
    // bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = GoTrueClient::new(
        &format!("http://{addr}"),
        &SecretString::from(API_KEY.to_string()),
        Duration::from_secs(2),
    )?;
    let result = client
        .sign_up(&credentials("alice@example.com", "s3cret!"))
        .await;
    assert!(matches!(result, Err(ProviderError::Request(_))));
    Ok(())
}
