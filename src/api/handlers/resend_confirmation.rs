use crate::{
    api::{
        error::{ApiError, Envelope, ErrorDetail},
        handlers::{normalize_email, types::ResendConfirmation, valid_email, valid_phone},
    },
    identity::{IdentityProvider, ResendOptions, ResendRequest, ResendTarget},
    serializer::{Value, serialize},
};
use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    post,
    path= "/api/v1/auth/resend",
    request_body = ResendConfirmation,
    responses (
        (status = 200, description = "Confirmation resent", body = Envelope, content_type = "application/json"),
        (status = 400, description = "Invalid payload or resend rejected", body = ErrorDetail),
        (status = 422, description = "Missing or invalid email/phone for the channel", body = ErrorDetail),
        (status = 429, description = "Too many resend requests", body = ErrorDetail),
        (status = 502, description = "Identity provider unavailable", body = ErrorDetail),
    ),
    tag= "auth"
)]
// axum handler for resend confirmation
#[instrument(skip_all)]
pub async fn resend(
    provider: Extension<Arc<dyn IdentityProvider>>,
    payload: Result<Json<ResendConfirmation>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Json(request) = payload?;
    let request = resend_request(request)?;

    debug!(resend_type = %request.kind, "resending confirmation");

    let response = provider.resend(&request).await?;

    let data = serialize(&Value::record(response))?;

    Ok(Json(Envelope::new("Confirmation resent successfully", data)))
}

fn resend_request(request: ResendConfirmation) -> Result<ResendRequest, ApiError> {
    let kind = request.kind;

    let email = request.email.map(|email| normalize_email(&email));
    let phone = request.phone.map(|phone| phone.trim().to_string());

    let Some(target) = ResendTarget::for_type(kind, email, phone) else {
        let channel = if kind.uses_phone() { "phone" } else { "email" };
        return Err(ApiError::Validation(format!(
            "{channel} is required for {kind}"
        )));
    };

    match &target {
        ResendTarget::Email(email) if !valid_email(email) => {
            return Err(ApiError::Validation("Invalid email".to_string()));
        }
        ResendTarget::Phone(phone) if !valid_phone(phone) => {
            return Err(ApiError::Validation("Invalid phone".to_string()));
        }
        _ => {}
    }

    let options = request
        .options
        .as_ref()
        .map(ResendOptions::from_map)
        .unwrap_or_default();

    Ok(ResendRequest {
        kind,
        target,
        options,
    })
}
