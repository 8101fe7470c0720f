//! Per-client fixed-window counters and the two middlewares built on them:
//! a hard limiter (429 once the window budget is spent) and a slow-down
//! that delays requests past a threshold.
//!
//! State is process-local and starts empty on restart.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{RateLimitConfig, SlowDownConfig};
use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of recording one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Requests seen in the current window, this one included.
    pub count: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

#[derive(Debug)]
pub struct FixedWindowCounter {
    window: Duration,
    windows: DashMap<String, Window>,
}

impl FixedWindowCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            windows: DashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count a request for `key`, opening a fresh window if the previous one elapsed.
    pub fn hit(&self, key: &str) -> Hit {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(1);
        Hit {
            count: entry.count,
            reset_after: self.window.saturating_sub(now.duration_since(entry.started)),
        }
    }

    /// Drop windows that have elapsed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}

/// Periodically purge elapsed windows until `cancel` fires.
pub fn spawn_sweeper(
    counter: Arc<FixedWindowCounter>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(counter.window());
        tick.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {
                    let removed = counter.purge_expired();
                    if removed > 0 {
                        tracing::debug!(removed, remaining = counter.tracked_clients(), "purged rate-limit windows");
                    }
                }
            }
        }
    })
}

/// Client key: first `X-Forwarded-For` hop when the proxy is trusted,
/// otherwise the socket peer address.
pub fn client_key(req: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct RateLimiter {
    pub counter: Arc<FixedWindowCounter>,
    pub max_requests: u32,
    pub message: String,
    pub trust_proxy: bool,
}

impl RateLimiter {
    pub fn from_config(cfg: &RateLimitConfig, trust_proxy: bool) -> Self {
        Self {
            counter: Arc::new(FixedWindowCounter::new(Duration::from_secs(cfg.window_secs))),
            max_requests: cfg.max_requests,
            message: cfg.message.clone(),
            trust_proxy,
        }
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req, limiter.trust_proxy);
    let hit = limiter.counter.hit(&key);
    let remaining = limiter.max_requests.saturating_sub(hit.count);
    let reset_secs = hit.reset_after.as_secs().max(1);

    let mut response = if hit.count > limiter.max_requests {
        tracing::warn!(client = %key, count = hit.count, "rate limit exceeded");
        let mut resp = ApiError::TooManyRequests(limiter.message.clone()).into_response();
        resp.headers_mut()
            .insert(axum::http::header::RETRY_AFTER, HeaderValue::from(reset_secs));
        resp
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static("ratelimit-limit"),
        HeaderValue::from(limiter.max_requests),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
    headers.insert(
        HeaderName::from_static("ratelimit-reset"),
        HeaderValue::from(reset_secs),
    );
    response
}

pub struct SlowDown {
    pub counter: Arc<FixedWindowCounter>,
    pub delay_after: u32,
    pub delay_step: Duration,
    pub max_delay: Duration,
    pub trust_proxy: bool,
}

impl SlowDown {
    pub fn from_config(cfg: &SlowDownConfig, trust_proxy: bool) -> Self {
        Self {
            counter: Arc::new(FixedWindowCounter::new(Duration::from_secs(cfg.window_secs))),
            delay_after: cfg.delay_after,
            delay_step: Duration::from_millis(cfg.delay_step_ms),
            max_delay: Duration::from_millis(cfg.max_delay_ms),
            trust_proxy,
        }
    }

    /// Delay for the `count`-th request of a window: zero up to `delay_after`,
    /// then `step` per request over the threshold, capped at `max_delay`.
    pub fn delay_for(&self, count: u32) -> Duration {
        let excess = count.saturating_sub(self.delay_after);
        self.delay_step.saturating_mul(excess).min(self.max_delay)
    }
}

pub async fn slow_down(State(slow): State<Arc<SlowDown>>, req: Request, next: Next) -> Response {
    let key = client_key(&req, slow.trust_proxy);
    let hit = slow.counter.hit(&key);
    let delay = slow.delay_for(hit.count);
    if !delay.is_zero() {
        tracing::debug!(client = %key, count = hit.count, delay_ms = delay.as_millis() as u64, "slowing down client");
        tokio::time::sleep(delay).await;
    }
    next.run(req).await
}
