//! Fixed-window request budget per client address.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::debug;
use parking_lot::Mutex;

use crate::config::RateLimitConfig;
use crate::error::AnalyticsError;
use crate::server::AppState;

/// Above this many tracked clients, expired windows are swept on the next check.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window(),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, client: &str) -> Decision {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> Decision {
        let mut clients = self.clients.lock();
        if clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client.to_owned()).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                hits: 0,
            };
        }
        entry.hits = entry.hits.saturating_add(1);

        if entry.hits > self.max_requests {
            Decision::Limited {
                retry_after: self
                    .window
                    .saturating_sub(now.duration_since(entry.started)),
            }
        } else {
            Decision::Allowed {
                remaining: self.max_requests - entry.hits,
            }
        }
    }
}

fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects the request before the handler runs once the client's budget is spent.
pub async fn enforce(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    let client = client_key(&req);
    match state.limiter.check(&client) {
        Decision::Limited { retry_after } => {
            debug!("Rate limit hit for {} on {}", client, req.uri().path());
            let retry_after_secs =
                retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            AnalyticsError::RateLimited { retry_after_secs }.into_response()
        }
        Decision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.limiter.max_requests()),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
    }
}
