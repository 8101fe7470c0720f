use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod request_id;
pub mod security;
pub mod validation;
mod web;

pub use config::{ApiIngressConfig, RateLimitConfig, SlowDownConfig};
pub use error::{ApiError, FieldError};
pub use validation::ValidatedJson;

use rate_limit::{RateLimiter, SlowDown};
use runtime::ServerConfig;

/// Implemented by every module that exposes REST routes.
pub trait RestfulModule: Send + Sync {
    fn register_rest(&self, router: Router) -> Result<Router>;
}

/// Owns the HTTP surface: route assembly, the shared middleware stack and
/// the listener.
pub struct ApiIngress {
    config: ApiIngressConfig,
    bind_addr: String,
    production: bool,
    rate_limiter: Option<Arc<RateLimiter>>,
    slow_down: Option<Arc<SlowDown>>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig, server: &ServerConfig) -> Self {
        let bind_addr = config
            .bind_addr
            .clone()
            .unwrap_or_else(|| format!("{}:{}", server.host, server.port));
        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiter::from_config(&config.rate_limit, config.trust_proxy)));
        let slow_down = config
            .slow_down
            .enabled
            .then(|| Arc::new(SlowDown::from_config(&config.slow_down, config.trust_proxy)));
        Self {
            bind_addr,
            production: server.is_production(),
            rate_limiter,
            slow_down,
            config,
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    /// Collect module routes and wrap them in the middleware stack.
    pub fn build_router(&self, modules: &[&dyn RestfulModule]) -> Result<Router> {
        let mut router = Router::new().route("/health", get(web::health_check));
        for module in modules {
            router = module.register_rest(router)?;
        }
        router = router.fallback(web::not_found);

        // Layers are listed innermost first; the last one added sees the request first.
        router = router.layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes));
        router = router.layer(CatchPanicLayer::custom(panic_response));
        router = router.layer(TimeoutLayer::new(Duration::from_secs(
            self.config.request_timeout_secs,
        )));
        if let Some(slow) = &self.slow_down {
            router = router.layer(from_fn_with_state(slow.clone(), rate_limit::slow_down));
        }
        if let Some(limiter) = &self.rate_limiter {
            router = router.layer(from_fn_with_state(limiter.clone(), rate_limit::rate_limit));
        }
        if let Some(cors) = cors_layer(&self.config)? {
            router = router.layer(cors);
        }
        if self.config.security_headers {
            router = security::apply(router, self.production);
        }

        let x_request_id = request_id::header();
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(request_id::create_trace_layer());
        router = router.layer(PropagateRequestIdLayer::new(x_request_id.clone()));
        router = router.layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId));

        Ok(router)
    }

    pub async fn bind(&self) -> Result<TcpListener> {
        let addr: SocketAddr = self
            .bind_addr
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_addr))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;
        tracing::info!(addr = %listener.local_addr()?, "HTTP server bound");
        Ok(listener)
    }

    /// Serve until `cancel` fires, then stop accepting and drain in-flight requests.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(limiter) = &self.rate_limiter {
            rate_limit::spawn_sweeper(limiter.counter.clone(), cancel.child_token());
        }
        if let Some(slow) = &self.slow_down {
            rate_limit::spawn_sweeper(slow.counter.clone(), cancel.child_token());
        }

        let shutdown = {
            let cancel = cancel.clone();
            async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            }
        };

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
    }
}

fn cors_layer(cfg: &ApiIngressConfig) -> Result<Option<CorsLayer>> {
    if cfg.cors_allowed_origins.is_empty() {
        return Ok(None);
    }
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(cfg.cors_max_age_secs));

    // Credentials cannot be combined with a wildcard origin.
    if cfg.cors_allowed_origins.iter().any(|o| o == "*") {
        return Ok(Some(base.allow_origin(AnyOrigin)));
    }
    let origins = cfg
        .cors_allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(
        base.allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true),
    ))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
