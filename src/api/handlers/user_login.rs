use crate::{
    api::{
        error::{ApiError, Envelope, ErrorDetail},
        handlers::{credentials, types::UserLogin},
    },
    identity::IdentityProvider,
    serializer::{Value, serialize},
};
use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/api/v1/auth/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful, data holds user and session", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Invalid payload or credentials", body = ErrorDetail),
        (status = 401, description = "No session issued", body = ErrorDetail),
        (status = 422, description = "Invalid email or password", body = ErrorDetail),
        (status = 502, description = "Identity provider unavailable", body = ErrorDetail),
    ),
    tag= "auth"
)]
// axum handler for login
#[instrument(skip_all)]
pub async fn login(
    provider: Extension<Arc<dyn IdentityProvider>>,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Json(request) = payload?;
    let credentials = credentials(&request.email, request.password)?;

    let response = provider.sign_in_with_password(&credentials).await?;

    if response.session.is_none() {
        debug!("provider returned no session for {}", credentials.email);
        return Err(ApiError::Unauthorized("Invalid login credentials".to_string()));
    }

    let data = serialize(&Value::record(response))?;

    Ok(Json(Envelope::new("Login successful", data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::stub::StubProvider;
    use anyhow::Result;
    use axum::{http::StatusCode, response::IntoResponse};
    use secrecy::SecretString;
    use serde_json::json;

    fn payload(email: &str, password: &str) -> Result<Json<UserLogin>, JsonRejection> {
        Ok(Json(UserLogin {
            email: email.to_string(),
            password: SecretString::from(password.to_string()),
        }))
    }

    fn provider(stub: StubProvider) -> Extension<Arc<dyn IdentityProvider>> {
        Extension(Arc::new(stub))
    }

    #[tokio::test]
    async fn login_returns_user_and_session() -> Result<()> {
        let stub = StubProvider {
            auth: Some(json!({
                "access_token": "jwt",
                "token_type": "bearer",
                "expires_in": 3600,
                "expires_at": 1_735_736_400,
                "refresh_token": "refresh",
                "user": {
                    "id": "u1",
                    "email": "alice@example.com",
                    "last_sign_in_at": "2025-01-01T12:00:00Z"
                }
            })),
            ..StubProvider::default()
        };

        let Json(envelope) = login(provider(stub), payload("alice@example.com", "pw")).await?;

        assert_eq!(envelope.message, "Login successful");
        assert_eq!(envelope.data["user"]["id"], json!("u1"));
        assert_eq!(envelope.data["session"]["access_token"], json!("jwt"));
        assert_eq!(
            envelope.data["session"]["user"]["last_sign_in_at"],
            json!("2025-01-01T12:00:00+00:00")
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_without_session_is_unauthorized() {
        let stub = StubProvider {
            auth: Some(json!({"id": "u1"})),
            ..StubProvider::default()
        };
        let response = login(provider(stub), payload("alice@example.com", "pw"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_relays_invalid_credentials() -> Result<()> {
        let stub = StubProvider {
            failure: Some((StatusCode::BAD_REQUEST, "Invalid login credentials".to_string())),
            ..StubProvider::default()
        };
        let response = login(provider(stub), payload("alice@example.com", "wrong"))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert_eq!(body, json!({"detail": "Invalid login credentials"}));
        Ok(())
    }

    #[tokio::test]
    async fn login_requires_password() {
        let response = login(provider(StubProvider::default()), payload("alice@example.com", ""))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
