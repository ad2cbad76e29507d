use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::Instant;

use super::{error::ApiError, AppState};
use crate::config::RateLimitOptions;

/// Number of tracked clients above which expired windows are swept
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed window request counter per client key
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    options: RateLimitOptions,
}

impl RateLimiter {
    pub fn new(options: RateLimitOptions) -> Self {
        Self {
            windows: DashMap::new(),
            options,
        }
    }

    /// Count one request for `key`. `Err` carries the seconds left in the
    /// current window.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), u64> {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let window = self.options.window;
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.options.max_requests {
            let left = window.saturating_sub(now.duration_since(entry.started));
            return Err(left.as_secs().max(1));
        }

        entry.count += 1;
        Ok(())
    }

    fn sweep(&self, now: Instant) {
        let window = self.options.window;
        self.windows
            .retain(|_, w| now.duration_since(w.started) < window);
    }
}

fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = client_key(&request);

    if let Err(retry_after_secs) = state.limiter.check(&key) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return ApiError::TooManyRequests { retry_after_secs }.into_response();
    }

    next.run(request).await
}
