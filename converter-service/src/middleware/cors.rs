use crate::config::{CorsConfig, CorsMode};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

const WILDCARD: &str = "*";

/// Which browser origins may call the API. Built once at startup.
#[derive(Debug, Clone)]
pub enum CorsPolicy {
    /// Any origin, without credentials.
    Permissive,
    /// Listed origins only, with credentials. A `*` entry admits every origin.
    AllowList(Arc<Vec<String>>),
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        match config.mode {
            CorsMode::Permissive => CorsPolicy::Permissive,
            CorsMode::AllowList => CorsPolicy::AllowList(Arc::new(config.allowed_origins.clone())),
        }
    }

    /// Requests without an `Origin` (curl, server-to-server) always pass.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (CorsPolicy::Permissive, _) | (_, None) => true,
            (CorsPolicy::AllowList(origins), Some(origin)) => origins
                .iter()
                .any(|allowed| allowed == WILDCARD || allowed == origin),
        }
    }

    /// Response-header half of the policy; rejection is done by [`enforce_origin`].
    pub fn layer(&self) -> CorsLayer {
        match self {
            CorsPolicy::Permissive => CorsLayer::permissive(),
            CorsPolicy::AllowList(origins) => {
                // Credentialed responses may not use `*`, so a wildcard list echoes the caller.
                let allow_origin = if origins.iter().any(|o| o == WILDCARD) {
                    AllowOrigin::mirror_request()
                } else {
                    AllowOrigin::list(origins.iter().filter_map(|o| {
                        o.parse::<HeaderValue>()
                            .map_err(|e| {
                                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                            })
                            .ok()
                    }))
                };

                CorsLayer::new()
                    .allow_origin(allow_origin)
                    .allow_credentials(true)
                    .allow_methods([
                        Method::GET,
                        Method::HEAD,
                        Method::PUT,
                        Method::PATCH,
                        Method::POST,
                        Method::DELETE,
                    ])
                    .allow_headers(AllowHeaders::mirror_request())
            }
        }
    }
}

/// Rejects requests whose `Origin` the policy does not admit, before routing.
pub async fn enforce_origin(
    State(policy): State<CorsPolicy>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    if !policy.allows(origin.as_deref()) {
        let origin = origin.unwrap_or_default();
        tracing::warn!(origin = %origin, "Blocked request from disallowed origin");
        return Err(AppError::CorsRejected(origin));
    }

    Ok(next.run(req).await)
}
