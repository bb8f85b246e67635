//! Edge redirector service.
//!
//! # Responsibilities
//! - Rewrite path-form gateway URLs to their canonical subdomain form
//!   before the request ever reaches the worker
//! - Pass everything else through to the upstream origin unchanged,
//!   attaching the edge cache policy to the response
//! - Swap in hot-reloaded configuration without dropping connections
//!
//! # Design Decisions
//! - Unrecognized or malformed identifiers pass through; the upstream owns
//!   error handling
//! - The redirect decision reuses the exact library translation the worker
//!   uses, so both emit byte-identical targets

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::config::schema::EdgeConfig;
use crate::edge::cache::cache_decision;
use crate::gateway::request::GatewayRequest;
use crate::gateway::translate::{to_subdomain_url, SubdomainRedirect};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<EdgeConfig>>,
    pub client: Client<HttpConnector, Body>,
}

/// The edge redirector HTTP server.
pub struct EdgeServer {
    router: Router,
    state: AppState,
}

impl EdgeServer {
    /// Create a server from the initial configuration.
    pub fn new(config: EdgeConfig) -> Self {
        let request_timeout = Duration::from_secs(config.upstream.request_secs);
        let state = AppState {
            config: Arc::new(ArcSwap::from_pointee(config)),
            client: Client::builder(TokioExecutor::new()).build(HttpConnector::new()),
        };

        let router = Router::new()
            .route("/", any(edge_handler))
            .route("/{*path}", any(edge_handler))
            .with_state(state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(request_timeout)),
            );

        Self { router, state }
    }

    /// Run until the shutdown signal fires, applying config updates as
    /// they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "edge redirector starting");

        let swap_target = self.state.config.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                swap_target.store(Arc::new(config));
                tracing::info!("edge configuration swapped");
            }
        });

        let app = self.router.into_make_service();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("edge redirector shutting down");
            })
            .await?;

        tracing::info!("edge redirector stopped");
        Ok(())
    }
}

/// Translate-or-passthrough for one request.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let config = state.config.load_full();
    let start = Instant::now();

    let url = request_url(&request);

    if let Some(url) = &url {
        if let Some(redirect) = to_subdomain_url(url) {
            if let Some(req) = GatewayRequest::from_path_url(url) {
                metrics::record_redirect(req.namespace.as_str());
            }
            tracing::debug!(
                from = %url,
                to = %redirect.location,
                "redirecting path request to isolated origin"
            );
            return redirect_response(&redirect);
        }
    }

    let response = passthrough(&state, &config, request).await;

    if let Some(url) = &url {
        let status = response.status().as_u16();
        metrics::record_passthrough(status, start);
        return with_cache_headers(response, url, status, &config);
    }
    response
}

fn redirect_response(redirect: &SubdomainRedirect) -> Response {
    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    if let Ok(location) = HeaderValue::from_str(redirect.location.as_str()) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(redirect.cache_control),
    );
    response
}

/// Forward the request to the upstream origin.
async fn passthrough(
    state: &AppState,
    config: &EdgeConfig,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let uri = format!("http://{}{}", config.upstream.address, path_and_query);

    let mut upstream = Request::builder().method(parts.method.clone()).uri(uri);
    if let Some(headers) = upstream.headers_mut() {
        for (key, value) in parts.headers.iter() {
            headers.insert(key.clone(), value.clone());
        }
    }

    let upstream = match upstream.body(body) {
        Ok(req) => req,
        Err(err) => {
            tracing::error!(error = %err, "failed to build upstream request");
            return (StatusCode::BAD_GATEWAY, "upstream request failed").into_response();
        }
    };

    match state.client.request(upstream).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body)).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, upstream = %config.upstream.address, "upstream error");
            (StatusCode::BAD_GATEWAY, "upstream request failed").into_response()
        }
    }
}

/// Attach the cache policy decision to a passthrough response.
fn with_cache_headers(
    mut response: Response,
    url: &Url,
    status: u16,
    config: &EdgeConfig,
) -> Response {
    let decision = cache_decision(url, status, &config.cache);

    let cache_control = if decision.is_cacheable() {
        format!("public, s-maxage={}", decision.ttl.as_secs())
    } else {
        "no-store".to_string()
    };
    if let Ok(value) = HeaderValue::from_str(&cache_control) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
    if let Ok(value) = HeaderValue::from_str(&decision.key) {
        response.headers_mut().insert("x-edge-cache-key", value);
    }
    response
}

/// Reconstruct the full request URL from the Host header and URI.
fn request_url(request: &Request<Body>) -> Option<Url> {
    let host = request.headers().get(header::HOST)?.to_str().ok()?;
    let scheme = request
        .headers()
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Url::parse(&format!("{scheme}://{host}{path_and_query}")).ok()
}
