use crate::{
    api::{
        error::{ApiError, Envelope, ErrorDetail},
        handlers::{credentials, types::UserRegister},
    },
    identity::IdentityProvider,
    serializer::{Value, serialize},
};
use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[utoipa::path(
    post,
    path= "/api/v1/auth/register",
    request_body = UserRegister,
    responses (
        (status = 200, description = "Registration successful", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Invalid payload or registration rejected", body = ErrorDetail),
        (status = 422, description = "Invalid email or password", body = ErrorDetail),
        (status = 502, description = "Identity provider unavailable", body = ErrorDetail),
    ),
    tag= "auth"
)]
// axum handler for register
#[instrument(skip_all)]
pub async fn register(
    provider: Extension<Arc<dyn IdentityProvider>>,
    payload: Result<Json<UserRegister>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Json(request) = payload?;
    let credentials = credentials(&request.email, request.password)?;

    debug!("registering {}", credentials.email);

    let response = provider.sign_up(&credentials).await?;

    let Some(user) = response.user else {
        return Err(ApiError::BadRequest(
            "Identity provider did not return a user".to_string(),
        ));
    };

    info!(user_id = %user.id, "user registered");

    let data = serialize(&Value::record(user))?;

    Ok(Json(Envelope::new("User registered successfully", data)))
}
