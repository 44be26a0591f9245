use super::{
    AuthResponse, Credentials, IdentityProvider, OtpResponse, ProviderError, ResendRequest,
    ResendTarget,
};
use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{Instrument, debug, info_span, instrument};
use url::Url;

const SIGNUP_PATH: &str = "auth/v1/signup";
const TOKEN_PATH: &str = "auth/v1/token";
const RESEND_PATH: &str = "auth/v1/resend";
const HEALTH_PATH: &str = "auth/v1/health";

// keys carrying a human readable error, in lookup order
const ERROR_MESSAGE_KEYS: [&str; 4] = ["msg", "error_description", "message", "error"];

/// HTTP client for a GoTrue-compatible auth API.
///
/// The API key is baked into the client's default headers (marked sensitive)
/// and is not kept anywhere else.
#[derive(Clone, Debug)]
pub struct GoTrueClient {
    base_url: Url,
    client: Client,
}

impl GoTrueClient {
    /// Build a client for `base_url` authenticating with `api_key`.
    ///
    /// # Errors
    /// Returns `ProviderError::Config` if the URL is not http(s) with a host or
    /// the key is not a valid header value, and `ProviderError::Request` if the
    /// HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: &SecretString,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let base_url = normalize_base_url(base_url)?;

        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .default_headers(auth_headers(api_key)?)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::Config(format!("invalid endpoint {path}: {e}")))
    }

    async fn post(
        &self,
        operation: &'static str,
        url: Url,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let span = info_span!(
            "identity.request",
            identity.operation = operation,
            http.method = "POST",
            http.url = %redacted(&url)
        );

        async {
            let response = self.client.post(url).json(body).send().await?;
            decode(response).await
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip_all)]
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthResponse, ProviderError> {
        let url = self.endpoint(SIGNUP_PATH)?;
        let body = credentials_body(credentials);
        let response = self.post("sign_up", url, &body).await?;
        AuthResponse::from_json(response)
    }

    #[instrument(skip_all)]
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthResponse, ProviderError> {
        let mut url = self.endpoint(TOKEN_PATH)?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = credentials_body(credentials);
        let response = self.post("sign_in_with_password", url, &body).await?;
        AuthResponse::from_json(response)
    }

    #[instrument(skip_all, fields(resend_type = %request.kind))]
    async fn resend(&self, request: &ResendRequest) -> Result<OtpResponse, ProviderError> {
        let mut url = self.endpoint(RESEND_PATH)?;
        if let (ResendTarget::Email(_), Some(redirect)) =
            (&request.target, &request.options.email_redirect_to)
        {
            url.query_pairs_mut().append_pair("redirect_to", redirect);
        }

        let body = resend_body(request);
        let response = self.post("resend", url, &body).await?;
        serde_json::from_value(response)
            .map_err(|e| ProviderError::Decode(format!("resend: {e}")))
    }

    async fn health(&self) -> Result<(), ProviderError> {
        let url = self.endpoint(HEALTH_PATH)?;
        let span = info_span!(
            "identity.request",
            identity.operation = "health",
            http.method = "GET"
        );
        let response = self.client.get(url).send().instrument(span).await?;
        decode(response).await.map(|_| ())
    }
}

fn normalize_base_url(base_url: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ProviderError::Config(format!("invalid identity URL {base_url}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProviderError::Config(format!(
            "identity URL must use http or https: {base_url}"
        )));
    }

    if url.host_str().is_none() {
        return Err(ProviderError::Config(format!(
            "identity URL must include a host: {base_url}"
        )));
    }

    // `Url::join` drops the last segment unless the path ends with a slash
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn auth_headers(api_key: &SecretString) -> Result<HeaderMap, ProviderError> {
    let key = api_key.expose_secret();

    let mut apikey = HeaderValue::from_str(key)
        .map_err(|_| ProviderError::Config("identity key is not a valid header value".into()))?;
    apikey.set_sensitive(true);

    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
        .map_err(|_| ProviderError::Config("identity key is not a valid header value".into()))?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("apikey"), apikey);
    headers.insert(AUTHORIZATION, bearer);

    Ok(headers)
}

fn credentials_body(credentials: &Credentials) -> Value {
    json!({
        "email": credentials.email,
        "password": credentials.password.expose_secret(),
    })
}

fn resend_body(request: &ResendRequest) -> Value {
    let mut body = Map::new();
    body.insert("type".into(), Value::from(request.kind.as_str()));

    match &request.target {
        ResendTarget::Email(email) => body.insert("email".into(), Value::from(email.as_str())),
        ResendTarget::Phone(phone) => body.insert("phone".into(), Value::from(phone.as_str())),
    };

    body.insert(
        "gotrue_meta_security".into(),
        json!({ "captcha_token": request.options.captcha_token }),
    );

    Value::Object(body)
}

async fn decode(response: Response) -> Result<Value, ProviderError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = error_message(status, &bytes);
        debug!("identity provider error {}: {}", status, message);
        return Err(ProviderError::Api { status, message });
    }

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            ERROR_MESSAGE_KEYS
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
        })
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        })
}

// the query string can carry redirect targets; keep spans to scheme/host/path
fn redacted(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.path()
    )
}
