//! Gateway counters, served as JSON at `/metrics`.
//!
//! Two groups: HTTP requests bucketed by status class, and live sockets.
//! Readers take a [`MetricsSnapshot`]; the atomics stay private.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};

#[derive(Debug, Default)]
struct HttpCounters {
    handled: AtomicU64,
    ok: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    latency_ms_sum: AtomicU64,
}

#[derive(Debug, Default)]
struct LiveCounters {
    open_sockets: AtomicU64,
    rejected_topics: AtomicU64,
    values_pushed: AtomicU64,
}

/// Shared by the tracing layer and every live socket.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    http: HttpCounters,
    live: LiveCounters,
}

/// Point-in-time copy of [`GatewayMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub http: HttpSnapshot,
    pub live: LiveSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpSnapshot {
    pub handled: u64,
    pub ok: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub mean_latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub open_sockets: u64,
    pub rejected_topics: u64,
    pub values_pushed: u64,
}

impl GatewayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished request. Rejected envelopes (`failed: true`) are
    /// sent with 200 and count as ok.
    pub fn record_request(&self, status: u16, latency_ms: u64) {
        let http = &self.http;
        http.handled.fetch_add(1, Relaxed);
        http.latency_ms_sum.fetch_add(latency_ms, Relaxed);
        let bucket = match status {
            400..=499 => &http.client_errors,
            500.. => &http.server_errors,
            _ => &http.ok,
        };
        bucket.fetch_add(1, Relaxed);
    }

    pub fn socket_opened(&self) {
        self.live.open_sockets.fetch_add(1, Relaxed);
    }

    pub fn socket_closed(&self) {
        // Saturating: a close without a matching open leaves the gauge at zero.
        let _ = self
            .live
            .open_sockets
            .fetch_update(Relaxed, Relaxed, |n| n.checked_sub(1));
    }

    /// The hub refused the requested topic.
    pub fn topic_rejected(&self) {
        self.live.rejected_topics.fetch_add(1, Relaxed);
    }

    pub fn value_pushed(&self) {
        self.live.values_pushed.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let http = &self.http;
        let handled = http.handled.load(Relaxed);
        let mean_latency_ms = match handled {
            0 => 0.0,
            n => http.latency_ms_sum.load(Relaxed) as f64 / n as f64,
        };
        MetricsSnapshot {
            http: HttpSnapshot {
                handled,
                ok: http.ok.load(Relaxed),
                client_errors: http.client_errors.load(Relaxed),
                server_errors: http.server_errors.load(Relaxed),
                mean_latency_ms,
            },
            live: LiveSnapshot {
                open_sockets: self.live.open_sockets.load(Relaxed),
                rejected_topics: self.live.rejected_topics.load(Relaxed),
                values_pushed: self.live.values_pushed.load(Relaxed),
            },
        }
    }
}
