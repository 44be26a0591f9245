//! Health probe for zentora.
//!
//! `/health` reports build metadata plus identity provider reachability.
//! `OPTIONS` returns the same status and headers with an empty body.

use crate::{GIT_COMMIT_HASH, identity::IdentityProvider};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{Duration, timeout};
use tracing::{Instrument, debug, error, info_span, warn};
use utoipa::ToSchema;

const HEALTH_PROVIDER_TIMEOUT_SECONDS: u64 = 2;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    identity_provider: String,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Identity provider is reachable", body = Health),
        (status = 503, description = "Identity provider is unreachable", body = Health)
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(
    method: Method,
    provider: Extension<Arc<dyn IdentityProvider>>,
) -> impl IntoResponse {
    let provider_healthy = probe_provider(provider.0.as_ref()).await;

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity_provider: if provider_healthy {
            "ok".to_string()
        } else {
            "error".to_string()
        },
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        })
        .unwrap_or_else(|()| HeaderMap::new());

    if provider_healthy {
        debug!("Identity provider is healthy");
        (StatusCode::OK, headers, body)
    } else {
        debug!("Identity provider is unhealthy");
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

async fn probe_provider(provider: &dyn IdentityProvider) -> bool {
    let span = info_span!("identity.health");

    match timeout(
        Duration::from_secs(HEALTH_PROVIDER_TIMEOUT_SECONDS),
        provider.health().instrument(span),
    )
    .await
    {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            error!("Identity provider health check failed: {}", err);
            false
        }
        Err(_) => {
            warn!("Identity provider health check timed out");
            false
        }
    }
}
