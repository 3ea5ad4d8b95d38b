//! Origin allow-list.
//!
//! Requests carrying an `Origin` outside the list are refused before they
//! reach any handler. Requests without an `Origin` (curl, server-to-server,
//! same-origin navigations) are let through.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct AllowedOrigins(Arc<Vec<HeaderValue>>);

impl AllowedOrigins {
    pub fn new(origins: &[String]) -> Self {
        let parsed = origins
            .iter()
            .filter(|o| {
                // tower-http rejects a wildcard inside an explicit list.
                let wildcard = o.as_str() == "*";
                if wildcard {
                    warn!("Ignoring wildcard entry in CORS allow-list");
                }
                !wildcard
            })
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin '{}'", o);
                    None
                }
            })
            .collect();
        Self(Arc::new(parsed))
    }

    pub fn permits(&self, origin: Option<&HeaderValue>) -> bool {
        match origin {
            None => true,
            Some(origin) => self.0.iter().any(|allowed| allowed == origin),
        }
    }
}

/// Wraps `router` with the gate (outer) and the CORS header layer (inner).
pub fn apply(router: Router, allowed: AllowedOrigins) -> Router {
    router
        .layer(cors_layer(&allowed))
        .layer(middleware::from_fn_with_state(allowed, cors_gate))
}

async fn cors_gate(
    State(allowed): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN);
    if !allowed.permits(origin) {
        warn!(
            "Rejecting {} {} from origin {:?}: not allowed by CORS",
            request.method(),
            request.uri().path(),
            origin
        );
        return (StatusCode::FORBIDDEN, "Not allowed by CORS").into_response();
    }
    if let Some(origin) = origin {
        debug!("CORS origin accepted: {:?}", origin);
    }
    next.run(request).await
}

fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed.0.iter().cloned()))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false)
}
