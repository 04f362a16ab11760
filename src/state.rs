use crate::config::AppConfig;
use portable_atomic::{AtomicU64, Ordering};

// ── Request Counters ──

/// Lock-free request counters, readable from any handler.
#[derive(Debug, Default)]
pub struct RequestCounters {
    pub requests_served: AtomicU64,
    pub requests_failed: AtomicU64,
    pub simulations_run: AtomicU64,
    pub lattice_nodes_built: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    pub requests_served: u64,
    pub requests_failed: u64,
    pub simulations_run: u64,
    pub lattice_nodes_built: u64,
}

impl RequestCounters {
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            requests_served: self.requests_served.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            simulations_run: self.simulations_run.load(Ordering::Relaxed),
            lattice_nodes_built: self.lattice_nodes_built.load(Ordering::Relaxed),
        }
    }
}

// ── Shared Adapter State ──

/// Read-only configuration plus counters, shared by every handler behind an `Arc`.
/// Engines are never stored here; each request builds its own.
#[derive(Debug)]
pub struct AppState {
    pub config: AppConfig,
    pub counters: RequestCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self { config, counters: RequestCounters::default() }
    }

    #[inline]
    pub fn record_success(&self) {
        self.counters.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_failure(&self) {
        self.counters.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_simulations(&self, count: usize) {
        self.counters.simulations_run.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_lattice(&self, steps: usize) {
        let nodes = (steps as u64 + 1) * (steps as u64 + 2) / 2;
        self.counters.lattice_nodes_built.fetch_add(nodes, Ordering::Relaxed);
    }
}
