//! Records returned by the identity provider.
//!
//! Each record implements [`FieldExposing`] so handlers can hand it straight
//! to the serializer.

use crate::serializer::{FieldExposing, Value};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use utoipa::ToSchema;

use super::ProviderError;

/// Email/password pair forwarded to the provider.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: String, password: SecretString) -> Self {
        Self { email, password }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub identity_id: Option<String>,
    pub user_id: String,
    pub provider: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub identity_data: Map<String, JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl FieldExposing for Identity {
    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            field("id", self.id.clone()),
            field("identity_id", self.identity_id.clone()),
            field("user_id", self.user_id.clone()),
            field("provider", self.provider.clone()),
            field("email", self.email.clone()),
            field("identity_data", Value::mapping(self.identity_data.clone())),
            field("created_at", self.created_at),
            field("updated_at", self.updated_at),
            field("last_sign_in_at", self.last_sign_in_at),
        ]
    }

    fn type_name(&self) -> &'static str {
        "Identity"
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub phone_confirmed_at: Option<DateTime<Utc>>,
    pub confirmation_sent_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub app_metadata: Map<String, JsonValue>,
    #[serde(default)]
    pub user_metadata: Map<String, JsonValue>,
    #[serde(default)]
    pub identities: Vec<Identity>,
}

impl FieldExposing for User {
    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            field("id", self.id.clone()),
            field("aud", self.aud.clone()),
            field("role", self.role.clone()),
            field("email", self.email.clone()),
            field("phone", self.phone.clone()),
            field("email_confirmed_at", self.email_confirmed_at),
            field("phone_confirmed_at", self.phone_confirmed_at),
            field("confirmation_sent_at", self.confirmation_sent_at),
            field("confirmed_at", self.confirmed_at),
            field("last_sign_in_at", self.last_sign_in_at),
            field("created_at", self.created_at),
            field("updated_at", self.updated_at),
            field("is_anonymous", self.is_anonymous),
            field("app_metadata", Value::mapping(self.app_metadata.clone())),
            field("user_metadata", Value::mapping(self.user_metadata.clone())),
            field(
                "identities",
                Value::Sequence(self.identities.iter().cloned().map(Value::record).collect()),
            ),
        ]
    }

    fn type_name(&self) -> &'static str {
        "User"
    }
}

#[derive(Clone, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    #[serde(default)]
    pub provider_token: Option<String>,
    #[serde(default)]
    pub provider_refresh_token: Option<String>,
    pub user: User,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("refresh_token", &"***")
            .field("user", &self.user.id)
            .finish_non_exhaustive()
    }
}

impl FieldExposing for Session {
    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            field("access_token", self.access_token.clone()),
            field("token_type", self.token_type.clone()),
            field("expires_in", self.expires_in),
            field("expires_at", self.expires_at),
            field("refresh_token", self.refresh_token.clone()),
            field("provider_token", self.provider_token.clone()),
            field("provider_refresh_token", self.provider_refresh_token.clone()),
            field("user", Value::record(self.user.clone())),
        ]
    }

    fn type_name(&self) -> &'static str {
        "Session"
    }
}

/// Result of a signup or password grant.
///
/// Signup with email confirmation enabled yields a user and no session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl AuthResponse {
    /// Decode a provider body: a session when it carries `access_token`,
    /// a bare user when it carries `id`, empty otherwise.
    ///
    /// # Errors
    /// Returns `ProviderError::Decode` if the body does not match the detected shape.
    pub fn from_json(body: JsonValue) -> Result<Self, ProviderError> {
        if body.get("access_token").is_some() {
            let session: Session = serde_json::from_value(body)
                .map_err(|e| ProviderError::Decode(format!("session: {e}")))?;
            Ok(Self {
                user: Some(session.user.clone()),
                session: Some(session),
            })
        } else if body.get("id").is_some() {
            let user: User = serde_json::from_value(body)
                .map_err(|e| ProviderError::Decode(format!("user: {e}")))?;
            Ok(Self {
                user: Some(user),
                session: None,
            })
        } else {
            Ok(Self::default())
        }
    }
}

impl FieldExposing for AuthResponse {
    fn fields(&self) -> Vec<(String, Value)> {
        vec![
            field("user", self.user.clone().map(Value::record)),
            field("session", self.session.clone().map(Value::record)),
        ]
    }

    fn type_name(&self) -> &'static str {
        "AuthResponse"
    }
}

/// Result of a confirmation resend.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OtpResponse {
    #[serde(default)]
    pub message_id: Option<String>,
}

impl FieldExposing for OtpResponse {
    fn fields(&self) -> Vec<(String, Value)> {
        vec![field("message_id", self.message_id.clone())]
    }

    fn type_name(&self) -> &'static str {
        "OtpResponse"
    }
}

/// Confirmation channels accepted by the provider's resend endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResendType {
    Signup,
    EmailChange,
    PhoneChange,
    Sms,
}

impl ResendType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::EmailChange => "email_change",
            Self::PhoneChange => "phone_change",
            Self::Sms => "sms",
        }
    }

    /// `sms` and `phone_change` target a phone number, the rest an email.
    #[must_use]
    pub const fn uses_phone(self) -> bool {
        matches!(self, Self::PhoneChange | Self::Sms)
    }
}

impl fmt::Display for ResendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendTarget {
    Email(String),
    Phone(String),
}

impl ResendTarget {
    /// Pick the target the channel needs; `None` when it was not supplied.
    #[must_use]
    pub fn for_type(kind: ResendType, email: Option<String>, phone: Option<String>) -> Option<Self> {
        if kind.uses_phone() {
            phone.filter(|p| !p.is_empty()).map(Self::Phone)
        } else {
            email.filter(|e| !e.is_empty()).map(Self::Email)
        }
    }
}

/// Options understood by the resend endpoint; unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResendOptions {
    pub email_redirect_to: Option<String>,
    pub captcha_token: Option<String>,
}

impl ResendOptions {
    #[must_use]
    pub fn from_map(options: &Map<String, JsonValue>) -> Self {
        let text = |key: &str| {
            options
                .get(key)
                .and_then(JsonValue::as_str)
                .map(str::to_string)
        };

        Self {
            email_redirect_to: text("email_redirect_to"),
            captcha_token: text("captcha_token"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResendRequest {
    pub kind: ResendType,
    pub target: ResendTarget,
    pub options: ResendOptions,
}

fn field(name: &str, value: impl Into<Value>) -> (String, Value) {
    (name.to_string(), value.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::serialize;
    use anyhow::Result;
    use serde_json::json;

    fn user_json() -> JsonValue {
        json!({
            "id": "0b5c7a6e-1f3d-4a57-9d0e-6c1c1e1c8a11",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "alice@example.com",
            "phone": "",
            "confirmation_sent_at": "2025-01-01T12:00:00Z",
            "created_at": "2025-01-01T12:00:00.123456Z",
            "updated_at": "2025-01-01T12:00:00.123456Z",
            "app_metadata": {"provider": "email", "providers": ["email"]},
            "user_metadata": {},
            "identities": [{
                "id": "0b5c7a6e-1f3d-4a57-9d0e-6c1c1e1c8a11",
                "identity_id": "4d1f2c1a-9a6e-4b7b-8d1e-2f2a3b4c5d6e",
                "user_id": "0b5c7a6e-1f3d-4a57-9d0e-6c1c1e1c8a11",
                "provider": "email",
                "identity_data": {"email": "alice@example.com", "email_verified": false},
                "created_at": "2025-01-01T12:00:00Z",
                "updated_at": "2025-01-01T12:00:00Z",
                "last_sign_in_at": "2025-01-01T12:00:00Z"
            }]
        })
    }

    #[test]
    fn bare_user_body_decodes_as_user() -> Result<()> {
        let response = AuthResponse::from_json(user_json())?;
        assert!(response.session.is_none());
        let email = response.user.and_then(|u| u.email);
        assert_eq!(email.as_deref(), Some("alice@example.com"));
        Ok(())
    }

    #[test]
    fn session_body_exposes_nested_user() -> Result<()> {
        let body = json!({
            "access_token": "header.payload.signature",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_735_736_400,
            "refresh_token": "r3fr3sh",
            "user": user_json(),
        });
        let response = AuthResponse::from_json(body)?;
        assert!(response.session.is_some());
        assert_eq!(
            response.user.map(|u| u.id),
            Some("0b5c7a6e-1f3d-4a57-9d0e-6c1c1e1c8a11".to_string())
        );
        Ok(())
    }

    #[test]
    fn unknown_body_is_empty() -> Result<()> {
        assert_eq!(AuthResponse::from_json(json!({}))?, AuthResponse::default());
        Ok(())
    }

    #[test]
    fn malformed_session_is_a_decode_error() {
        let result = AuthResponse::from_json(json!({"access_token": 1}));
        assert!(matches!(result, Err(ProviderError::Decode(_))));
    }

    #[test]
    fn user_serializes_with_iso_timestamps() -> Result<()> {
        let response = AuthResponse::from_json(user_json())?;
        let user = response.user.ok_or_else(|| anyhow::anyhow!("missing user"))?;
        let out = serialize(&Value::record(user))?;

        assert_eq!(out["email"], json!("alice@example.com"));
        assert_eq!(out["confirmation_sent_at"], json!("2025-01-01T12:00:00+00:00"));
        assert_eq!(out["created_at"], json!("2025-01-01T12:00:00.123456+00:00"));
        assert_eq!(out["email_confirmed_at"], JsonValue::Null);
        assert_eq!(out["app_metadata"]["providers"], json!(["email"]));
        assert_eq!(out["identities"][0]["provider"], json!("email"));
        assert_eq!(
            out["identities"][0]["last_sign_in_at"],
            json!("2025-01-01T12:00:00+00:00")
        );
        Ok(())
    }

    #[test]
    fn session_debug_hides_tokens() -> Result<()> {
        let body = json!({
            "access_token": "secret-access",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "secret-refresh",
            "user": user_json(),
        });
        let session = AuthResponse::from_json(body)?.session;
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        Ok(())
    }

    #[test]
    fn resend_target_follows_channel() {
        let email = Some("a@b.com".to_string());
        let phone = Some("+15555550100".to_string());

        assert_eq!(
            ResendTarget::for_type(ResendType::Signup, email.clone(), phone.clone()),
            Some(ResendTarget::Email("a@b.com".to_string()))
        );
        assert_eq!(
            ResendTarget::for_type(ResendType::Sms, email.clone(), phone),
            Some(ResendTarget::Phone("+15555550100".to_string()))
        );
        assert_eq!(ResendTarget::for_type(ResendType::PhoneChange, email, None), None);
        assert_eq!(
            ResendTarget::for_type(ResendType::EmailChange, Some(String::new()), None),
            None
        );
    }

    #[test]
    fn resend_options_pick_known_keys() {
        let options = json!({
            "email_redirect_to": "https://app.example.com/welcome",
            "captcha_token": "hcaptcha",
            "data": {"ignored": true}
        });
        let parsed = options
            .as_object()
            .map(ResendOptions::from_map)
            .unwrap_or_default();
        assert_eq!(
            parsed.email_redirect_to.as_deref(),
            Some("https://app.example.com/welcome")
        );
        assert_eq!(parsed.captcha_token.as_deref(), Some("hcaptcha"));
    }

    #[test]
    fn resend_type_wire_names() -> Result<()> {
        assert_eq!(serde_json::to_value(ResendType::EmailChange)?, json!("email_change"));
        let kind: ResendType = serde_json::from_value(json!("phone_change"))?;
        assert_eq!(kind, ResendType::PhoneChange);
        assert!(serde_json::from_value::<ResendType>(json!("magiclink")).is_err());
        Ok(())
    }
}
