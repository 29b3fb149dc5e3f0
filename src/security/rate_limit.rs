//! Fixed-window rate limiting keyed by caller identifier.
//!
//! The limiter is per-process: every running instance owns its own map, so
//! the limit is approximate across a horizontally scaled deployment.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitConfig;
use crate::http::response::SaveError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Per-identifier counter for the current window.
#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    window_start: Instant,
    count: u32,
    /// Insertion sequence, used to evict the oldest entries first.
    seq: u64,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_in: Option<Duration>,
}

impl RateLimitDecision {
    /// `reset_in` rounded up to whole seconds, as sent in `Retry-After`.
    pub fn reset_in_secs(&self) -> u64 {
        self.reset_in
            .map(|d| d.as_millis().div_ceil(1000) as u64)
            .unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct Entries {
    records: HashMap<String, RateLimitRecord>,
    next_seq: u64,
}

/// Bounded fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    entries: Mutex<Entries>,
    window: Duration,
    max_requests: u32,
    max_entries: usize,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            max_entries: config.max_entries,
        }
    }

    /// Number of identifiers currently tracked.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Admit or reject one request from `identifier`.
    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.check_at(identifier, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, identifier: &str, now: Instant) -> RateLimitDecision {
        let mut entries = self.lock();
        self.evict(&mut entries, now);

        let limit = self.max_requests;
        let window = self.window;

        if let Some(record) = entries.records.get_mut(identifier) {
            let elapsed = now.saturating_duration_since(record.window_start);
            // A window covers its closing instant; it expires once elapsed exceeds it.
            if elapsed <= window {
                if record.count >= limit {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_in: Some(window - elapsed),
                    };
                }
                record.count += 1;
                return RateLimitDecision {
                    allowed: true,
                    remaining: limit - record.count,
                    reset_in: None,
                };
            }
        }

        let seq = entries.next_seq;
        entries.next_seq += 1;
        entries.records.insert(
            identifier.to_string(),
            RateLimitRecord {
                window_start: now,
                count: 1,
                seq,
            },
        );

        // A brand-new identifier may push the map one past the cap.
        if entries.records.len() > self.max_entries {
            self.evict_oldest(&mut entries);
        }

        RateLimitDecision {
            allowed: true,
            remaining: limit.saturating_sub(1),
            reset_in: None,
        }
    }

    fn evict(&self, entries: &mut Entries, now: Instant) {
        let window = self.window;
        entries
            .records
            .retain(|_, r| now.saturating_duration_since(r.window_start) <= window);

        if entries.records.len() > self.max_entries {
            self.evict_oldest(entries);
        }
    }

    fn evict_oldest(&self, entries: &mut Entries) {
        let excess = entries.records.len().saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }

        let mut by_age: Vec<(u64, String)> = entries
            .records
            .iter()
            .map(|(k, r)| (r.seq, k.clone()))
            .collect();
        by_age.sort_unstable_by_key(|(seq, _)| *seq);

        for (_, key) in by_age.into_iter().take(excess) {
            entries.records.remove(&key);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Identify the caller: edge-supplied client IP first, then the first
/// `X-Forwarded-For` hop, then the socket peer.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header("cf-connecting-ip") {
        return ip.to_string();
    }
    if let Some(first) = header("x-forwarded-for").and_then(|v| v.split(',').next()) {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Admission control for writes. Other methods pass through untouched.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() != Method::POST {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_identifier(request.headers(), peer);

    let decision = state.limiter.check(&key);
    if decision.allowed {
        return next.run(request).await;
    }

    tracing::warn!(client = %key, reset_in = ?decision.reset_in, "Rate limit exceeded");
    metrics::record_rate_limited();
    SaveError::RateLimited {
        reset_in_secs: decision.reset_in_secs(),
    }
    .into_response()
}
