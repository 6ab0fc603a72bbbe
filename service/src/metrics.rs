//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Lock-free metrics for the weather lookup service
//!
//! Counters are kept locally as atomics for snapshots and are also forwarded
//! to the `metrics` facade so an installed recorder can export them.

use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free service metrics
#[derive(Debug)]
pub struct ServerMetrics {
    // Connection counts
    total_connections: AtomicU64,
    active_connections: AtomicU64,

    // Cache
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,

    // Outcomes
    replies_sent: AtomicU64,
    protocol_errors: AtomicU64,
    fetch_errors: AtomicU64,
    accept_errors: AtomicU64,

    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            active_connections: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            fetch_errors: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Record a new connection being opened
    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
        counter!("skycache.connections.total").increment(1);
        gauge!("skycache.connections.active").increment(1.0);
    }

    /// Record a connection being closed
    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
        gauge!("skycache.connections.active").decrement(1.0);
    }

    /// Get the current number of active connections
    pub fn active_connections(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Get the total number of connections since creation
    pub fn total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    /// Record a lookup served from the store
    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        counter!("skycache.cache.hits").increment(1);
    }

    /// Record a lookup that went to the resolver
    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        counter!("skycache.cache.misses").increment(1);
    }

    /// Record a reply line written to a client
    pub fn reply_sent(&self) {
        self.replies_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a malformed request
    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
        counter!("skycache.protocol.errors").increment(1);
    }

    /// Record a resolver failure
    pub fn fetch_error(&self) {
        self.fetch_errors.fetch_add(1, Ordering::Relaxed);
        counter!("skycache.fetch.errors").increment(1);
    }

    /// Record a failed accept
    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a point-in-time view of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

/// A snapshot of service metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total connections accepted
    pub total_connections: u64,
    /// Connections currently being handled
    pub active_connections: u64,
    /// Lookups served from the store
    pub cache_hits: u64,
    /// Lookups forwarded to the resolver
    pub cache_misses: u64,
    /// Reply lines written
    pub replies_sent: u64,
    /// Requests dropped as malformed
    pub protocol_errors: u64,
    /// Requests dropped after a resolver failure
    pub fetch_errors: u64,
    /// Failed accepts
    pub accept_errors: u64,
    /// Time since the metrics were created
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Fraction of lookups served from the store
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.cache_hits + self.cache_misses;
        if lookups == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / lookups as f64
    }

    /// Requests that ended without a reply
    pub fn dropped_requests(&self) -> u64 {
        self.protocol_errors + self.fetch_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_connection_tracking() {
        let metrics = ServerMetrics::new();

        metrics.connection_opened();
        metrics.connection_opened();
        assert_eq!(metrics.active_connections(), 2);
        assert_eq!(metrics.total_connections(), 2);

        metrics.connection_closed();
        assert_eq!(metrics.active_connections(), 1);
        assert_eq!(metrics.total_connections(), 2);
    }

    #[test]
    fn test_cache_tracking() {
        let metrics = ServerMetrics::new();
        assert_eq!(metrics.snapshot().hit_ratio(), 0.0);

        metrics.cache_miss();
        metrics.cache_hit();
        metrics.cache_hit();
        metrics.cache_hit();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.hit_ratio(), 0.75);
    }

    #[test]
    fn test_error_tracking() {
        let metrics = ServerMetrics::new();

        metrics.protocol_error();
        metrics.fetch_error();
        metrics.accept_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.dropped_requests(), 2);
        assert_eq!(snapshot.accept_errors, 1);
    }

    #[test]
    fn test_concurrent_updates() {
        let metrics = std::sync::Arc::new(ServerMetrics::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.connection_opened();
                        metrics.cache_hit();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_connections, 1000);
        assert_eq!(snapshot.cache_hits, 1000);
    }
}
