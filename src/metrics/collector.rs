//! Metrics collection and registry.

use crate::rng::{HealthStatus, MobileRng, RngStats};
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Metric registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of generator state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether `initialize` has succeeded.
    pub initialized: bool,
    /// Whether the entropy startup tests have passed.
    pub entropy_startup_complete: bool,
    /// Current DRBG reseed counter.
    pub reseed_counter: u64,
    /// Lifetime generator counters.
    pub stats: RngStats,
}

impl MetricsSnapshot {
    /// Combines a health check with the lifetime counters.
    pub fn from_parts(health: &HealthStatus, stats: RngStats) -> Self {
        Self {
            initialized: health.initialized,
            entropy_startup_complete: health.entropy_startup_complete,
            reseed_counter: health.reseed_counter,
            stats,
        }
    }

    /// Takes a snapshot of a live generator.
    pub fn capture(rng: &MobileRng) -> Self {
        Self::from_parts(&rng.health_check(), rng.stats())
    }
}

/// Prometheus metrics registry for generator monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    // State gauges
    initialized: IntGauge,
    entropy_startup_complete: IntGauge,
    reseed_counter: IntGauge,

    // Lifetime counters
    generate_total: IntCounter,
    bytes_total: IntCounter,
    reseed_total: IntCounter,
    auto_reseed_total: IntCounter,
    forced_reseed_total: IntCounter,
    failure_total: IntCounter,
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsRegistry {
    /// Creates a new registry with all generator metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let initialized = IntGauge::new(
            "lwr_drbg_initialized",
            "Whether the generator is initialized (1=yes, 0=no)",
        )?;
        let entropy_startup_complete = IntGauge::new(
            "lwr_drbg_entropy_startup_complete",
            "Whether entropy startup health tests have passed (1=yes, 0=no)",
        )?;
        let reseed_counter = IntGauge::new(
            "lwr_drbg_reseed_counter",
            "Generate calls since the last DRBG update",
        )?;

        let generate_total = IntCounter::new(
            "lwr_drbg_generate_total",
            "Successful generate calls",
        )?;
        let bytes_total = IntCounter::new(
            "lwr_drbg_bytes_generated_total",
            "Bytes returned by successful generate calls",
        )?;
        let reseed_total = IntCounter::new("lwr_drbg_reseed_total", "Completed reseeds")?;
        let auto_reseed_total = IntCounter::new(
            "lwr_drbg_auto_reseed_total",
            "Reseeds triggered by the soft threshold",
        )?;
        let forced_reseed_total = IntCounter::new(
            "lwr_drbg_forced_reseed_total",
            "Reseeds forced by the DRBG reseed interval",
        )?;
        let failure_total = IntCounter::new(
            "lwr_drbg_generate_failures_total",
            "Generate calls that returned an error status",
        )?;

        registry.register(Box::new(initialized.clone()))?;
        registry.register(Box::new(entropy_startup_complete.clone()))?;
        registry.register(Box::new(reseed_counter.clone()))?;
        registry.register(Box::new(generate_total.clone()))?;
        registry.register(Box::new(bytes_total.clone()))?;
        registry.register(Box::new(reseed_total.clone()))?;
        registry.register(Box::new(auto_reseed_total.clone()))?;
        registry.register(Box::new(forced_reseed_total.clone()))?;
        registry.register(Box::new(failure_total.clone()))?;

        Ok(Self {
            registry,
            initialized,
            entropy_startup_complete,
            reseed_counter,
            generate_total,
            bytes_total,
            reseed_total,
            auto_reseed_total,
            forced_reseed_total,
            failure_total,
        })
    }

    /// Updates all metrics from a snapshot.
    ///
    /// Counters only move forward; a snapshot older than the last one
    /// leaves them unchanged.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.initialized.set(i64::from(snapshot.initialized));
        self.entropy_startup_complete
            .set(i64::from(snapshot.entropy_startup_complete));
        self.reseed_counter
            .set(i64::try_from(snapshot.reseed_counter).unwrap_or(i64::MAX));

        let stats = &snapshot.stats;
        advance(&self.generate_total, stats.generate_calls);
        advance(&self.bytes_total, stats.bytes_generated);
        advance(&self.reseed_total, stats.reseeds);
        advance(&self.auto_reseed_total, stats.auto_reseeds);
        advance(&self.forced_reseed_total, stats.forced_reseeds);
        advance(&self.failure_total, stats.failures);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
