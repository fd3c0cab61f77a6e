//! Request ids and the quota guard in front of upstream-backed routes.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 64;

/// Request id stored as a request extension and echoed in every envelope.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_owned)
}

/// Reuses the caller's `x-request-id` when it is usable, otherwise mints a
/// `UUIDv4`. The id is set on the response header as well.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = incoming_request_id(req.headers()).unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

#[derive(Debug)]
struct Window {
    opened_at: Instant,
    used: u32,
}

impl Window {
    /// Takes one slot at `now`. When the window is exhausted, returns how
    /// long until it reopens.
    fn take(&mut self, limit: u32, length: Duration, now: Instant) -> Result<(), Duration> {
        if now.saturating_duration_since(self.opened_at) >= length {
            self.opened_at = now;
            self.used = 0;
        }
        if self.used >= limit {
            let elapsed = now.saturating_duration_since(self.opened_at);
            return Err(length.saturating_sub(elapsed));
        }
        self.used += 1;
        Ok(())
    }
}

/// Shared fixed-window budget for routes that spend e-Stat, Gemini or
/// Places quota.
#[derive(Debug, Clone)]
pub struct QuotaGuard {
    limit: u32,
    length: Duration,
    window: Arc<Mutex<Window>>,
}

impl QuotaGuard {
    #[must_use]
    pub fn new(limit: u32, length: Duration) -> Self {
        Self {
            limit,
            length,
            window: Arc::new(Mutex::new(Window {
                opened_at: Instant::now(),
                used: 0,
            })),
        }
    }

    /// `None` when `limit` is zero, which turns the guard off.
    #[must_use]
    pub fn per_minute(limit: u32) -> Option<Self> {
        (limit > 0).then(|| Self::new(limit, Duration::from_secs(60)))
    }
}

/// Whole seconds for `Retry-After`, never below one.
fn retry_after_secs(wait: Duration) -> u64 {
    (wait.as_secs() + u64::from(wait.subsec_nanos() > 0)).max(1)
}

pub async fn guard_upstream_quota(
    State(guard): State<QuotaGuard>,
    req: Request,
    next: Next,
) -> Response {
    let verdict = guard
        .window
        .lock()
        .await
        .take(guard.limit, guard.length, Instant::now());

    match verdict {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            let req_id = req
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.clone())
                .unwrap_or_default();
            let secs = retry_after_secs(wait);
            tracing::warn!(
                path = %req.uri().path(),
                retry_after = secs,
                "upstream quota exhausted"
            );

            let mut res = ApiError::new(
                req_id,
                "rate_limited",
                format!("too many requests; retry in {secs}s"),
            )
            .into_response();
            res.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
            res
        }
    }
}
