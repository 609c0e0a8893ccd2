//! Generator lifecycle: initialization, reseed policy and
//! anti-rollback checkpointing.
//!
//! # Boot
//!
//! ```text
//! checkpoint?  ──yes──▶ seed = XOF(token || fresh, INIT_DOMAIN)
//!     │
//!     no ─────────────▶ seed = fresh
//!                         │
//!                         ▼
//!                   drbg.update(seed)
//! ```
//!
//! # Reseed
//!
//! Fresh entropy (plus optional caller data) is absorbed, then a
//! checkpoint token is drawn from the rotated DRBG and persisted with
//! the counter. The token is never the active secret.

use super::status::{GenerateStatus, HealthStatus, RngStats, MODULE_NAME};
use crate::conditioning::Conditioner;
use crate::config::{ConfigError, FileConfig, PolicyConfig};
use crate::persistence::StateStore;
use crate::reseeding::{DrbgError, Generation, LwrDrbgCore};
use crate::source::{EntropyHealthError, EntropySourceManager};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use zeroize::Zeroizing;

/// Domain separator for combining a checkpoint token with fresh entropy.
const INIT_DOMAIN: &[u8] = b"lwr-drbg-init-v1";

/// Width of the warm-start seed.
const INIT_SEED_BITS: usize = 256;

#[derive(Debug, Error)]
enum RngError {
    #[error("generator not initialized")]
    NotInitialized,
    #[error("entropy source failure: {0}")]
    Entropy(#[from] EntropyHealthError),
    #[error("DRBG failure: {0}")]
    Drbg(#[from] DrbgError),
    #[error("DRBG still requires reseed after reseeding")]
    ReseedLoop,
}

struct Session {
    entropy: EntropySourceManager,
    drbg: LwrDrbgCore,
    store: Box<dyn StateStore>,
    conditioner: Conditioner,
    policy: PolicyConfig,
    initialized: bool,
    stats: RngStats,
}

impl Session {
    fn initialize(&mut self) -> Result<(), RngError> {
        let checkpoint = self.store.load();
        let fresh = Zeroizing::new(self.entropy.get_entropy(self.policy.seed_entropy_bytes)?);

        let seed = match &checkpoint {
            Some(checkpoint) => {
                tracing::info!(
                    reseed_counter = checkpoint.reseed_counter(),
                    saved_at = %checkpoint.timestamp(),
                    "Warm start from checkpoint"
                );
                let mut combined = Zeroizing::new(checkpoint.token().to_vec());
                combined.extend_from_slice(&fresh);
                Zeroizing::new(self.conditioner.condition(&combined, INIT_DOMAIN, INIT_SEED_BITS))
            }
            None => {
                tracing::info!("Cold start: no valid checkpoint");
                fresh
            }
        };

        self.drbg.update(&seed);
        self.initialized = true;
        Ok(())
    }

    fn reseed(&mut self, external: Option<&[u8]>) -> Result<(), RngError> {
        if !self.initialized {
            return Err(RngError::NotInitialized);
        }

        let mut material =
            Zeroizing::new(self.entropy.get_entropy(self.policy.seed_entropy_bytes)?);
        if let Some(external) = external {
            material.extend_from_slice(external);
        }

        self.drbg.update(&material);
        self.stats.reseeds += 1;
        self.checkpoint()?;

        tracing::debug!(
            reseeds = self.stats.reseeds,
            external = external.is_some(),
            "Reseed complete"
        );
        Ok(())
    }

    /// Draws a token from the rotated DRBG and persists it.
    ///
    /// Store failures are logged; the reseed itself already happened.
    fn checkpoint(&mut self) -> Result<(), RngError> {
        let token = match self.drbg.generate(self.policy.checkpoint_token_bytes)? {
            Generation::Output(token) => Zeroizing::new(token),
            Generation::ReseedRequired => return Err(RngError::ReseedLoop),
        };

        if let Err(e) = self.store.save(&token, self.drbg.reseed_counter()) {
            tracing::warn!(error = %e, "Checkpoint not persisted; continuing");
        }
        Ok(())
    }

    fn generate(&mut self, num_bytes: usize) -> Result<Vec<u8>, RngError> {
        if !self.initialized {
            return Err(RngError::NotInitialized);
        }

        let output = match self.drbg.generate(num_bytes)? {
            Generation::Output(output) => output,
            Generation::ReseedRequired => {
                tracing::info!(
                    reseed_counter = self.drbg.reseed_counter(),
                    "Reseed interval reached; reseeding before retry"
                );
                self.reseed(None)?;
                self.stats.forced_reseeds += 1;
                self.drbg
                    .generate(num_bytes)?
                    .into_output()
                    .ok_or(RngError::ReseedLoop)?
            }
        };

        self.stats.generate_calls += 1;
        self.stats.bytes_generated += num_bytes as u64;

        if self.drbg.reseed_counter() > self.policy.soft_reseed_threshold {
            tracing::debug!(
                reseed_counter = self.drbg.reseed_counter(),
                threshold = self.policy.soft_reseed_threshold,
                "Soft reseed threshold passed"
            );
            match self.reseed(None) {
                Ok(()) => self.stats.auto_reseeds += 1,
                Err(e) => tracing::warn!(error = %e, "Proactive reseed failed"),
            }
        }

        Ok(output)
    }

    fn health(&self) -> HealthStatus {
        HealthStatus {
            module: MODULE_NAME,
            initialized: self.initialized,
            reseed_counter: self.drbg.reseed_counter(),
            entropy_startup_complete: self.entropy.startup_complete(),
            entropy_source: self.entropy.collector_name().to_string(),
        }
    }
}

/// Thread-safe random generator with persistent anti-rollback state.
///
/// All operations serialize on one internal lock. Public methods never
/// panic and report failures through their return values.
///
/// # Example
///
/// ```no_run
/// use lwr_drbg::{FileConfig, MobileRng};
///
/// let rng = MobileRng::from_config(&FileConfig::default()).unwrap();
/// assert!(rng.initialize());
///
/// let (bytes, status) = rng.generate(32);
/// assert!(status.is_success());
/// assert_eq!(bytes.len(), 32);
/// ```
pub struct MobileRng {
    session: Mutex<Session>,
}

impl MobileRng {
    /// Assembles a generator from explicit components.
    pub fn new(
        entropy: EntropySourceManager,
        drbg: LwrDrbgCore,
        store: Box<dyn StateStore>,
        conditioner: Conditioner,
        policy: PolicyConfig,
    ) -> Self {
        Self {
            session: Mutex::new(Session {
                entropy,
                drbg,
                store,
                conditioner,
                policy,
                initialized: false,
                stats: RngStats::default(),
            }),
        }
    }

    /// Builds a generator with the file store named in `config`.
    pub fn from_config(config: &FileConfig) -> Result<Self, ConfigError> {
        Self::with_store(config, Box::new(config.store.build()))
    }

    /// Builds a generator from `config` around a caller-supplied store.
    pub fn with_store(config: &FileConfig, store: Box<dyn StateStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let conditioner = config.drbg.conditioner();
        Ok(Self::new(
            config.entropy.build_manager(conditioner),
            config.drbg.build()?,
            store,
            conditioner,
            config.policy,
        ))
    }

    fn lock(&self) -> Option<MutexGuard<'_, Session>> {
        match self.session.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::error!("Generator lock poisoned; refusing to operate");
                None
            }
        }
    }

    /// Seeds the DRBG from fresh entropy, folding in the checkpoint
    /// token when a valid one is stored.
    ///
    /// Returns false if the entropy source fails its health tests.
    /// May be called again to re-initialize.
    pub fn initialize(&self) -> bool {
        let Some(mut session) = self.lock() else {
            return false;
        };
        match session.initialize() {
            Ok(()) => {
                tracing::info!(module = MODULE_NAME, "Generator initialized");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Initialization failed");
                false
            }
        }
    }

    /// Absorbs fresh entropy and optional caller data, then writes a
    /// new checkpoint.
    ///
    /// Returns false if not initialized or if entropy collection fails.
    /// A failed checkpoint write does not fail the reseed.
    pub fn reseed(&self, external_entropy: Option<&[u8]>) -> bool {
        let Some(mut session) = self.lock() else {
            return false;
        };
        match session.reseed(external_entropy) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Reseed failed");
                false
            }
        }
    }

    /// Produces `num_bytes` random bytes.
    ///
    /// Bytes are empty whenever the status is not
    /// [`GenerateStatus::Success`]. A DRBG reseed demand is serviced
    /// transparently with one retry.
    pub fn generate(&self, num_bytes: usize) -> (Vec<u8>, GenerateStatus) {
        let Some(mut session) = self.lock() else {
            return (Vec::new(), GenerateStatus::InternalFailure);
        };
        match session.generate(num_bytes) {
            Ok(output) => (output, GenerateStatus::Success),
            Err(RngError::NotInitialized) => {
                session.stats.failures += 1;
                tracing::warn!("Generate called before initialization");
                (Vec::new(), GenerateStatus::NotInitialized)
            }
            Err(e) => {
                session.stats.failures += 1;
                tracing::error!(error = %e, "Generate failed");
                (Vec::new(), GenerateStatus::InternalFailure)
            }
        }
    }

    /// Reports initialization, counter and entropy startup state.
    pub fn health_check(&self) -> HealthStatus {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .health()
    }

    /// Lifetime counters.
    pub fn stats(&self) -> RngStats {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stats
    }
}

impl std::fmt::Debug for MobileRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobileRng")
            .field("health", &self.health_check())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DrbgConfig;
    use crate::persistence::{CheckpointRecord, MemoryStateStore, StoreError};
    use crate::source::{
        CollectorError, ConstantCollector, CounterCollector, NoiseCollector,
    };
    use std::sync::Arc;

    /// Healthy for a fixed number of samples, then fails.
    struct FadingCollector {
        inner: CounterCollector,
        remaining: usize,
    }

    impl NoiseCollector for FadingCollector {
        fn name(&self) -> &str {
            "fading"
        }

        fn sample(&mut self) -> Result<Vec<u8>, CollectorError> {
            if self.remaining == 0 {
                return Err(CollectorError::Exhausted);
            }
            self.remaining -= 1;
            self.inner.sample()
        }
    }

    struct BrokenStore;

    impl StateStore for BrokenStore {
        fn load(&self) -> Option<crate::persistence::Checkpoint> {
            None
        }

        fn save(&mut self, _token: &[u8], _reseed_counter: u64) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: "unwritable".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn small_drbg(reseed_interval: u64) -> DrbgConfig {
        DrbgConfig {
            k: 2,
            n: 16,
            reseed_interval,
            ..DrbgConfig::default()
        }
    }

    fn build(
        collector: Box<dyn NoiseCollector>,
        store: Box<dyn StateStore>,
        policy: PolicyConfig,
        reseed_interval: u64,
    ) -> MobileRng {
        let drbg = small_drbg(reseed_interval);
        let conditioner = drbg.conditioner();
        MobileRng::new(
            EntropySourceManager::new(collector, conditioner),
            drbg.build().unwrap(),
            store,
            conditioner,
            policy,
        )
    }

    fn healthy(store: MemoryStateStore) -> MobileRng {
        build(
            Box::new(CounterCollector::new(1, 16)),
            Box::new(store),
            PolicyConfig::default(),
            1_000_000,
        )
    }

    #[test]
    fn test_generate_before_initialize() {
        let rng = healthy(MemoryStateStore::new());
        let (bytes, status) = rng.generate(32);
        assert!(bytes.is_empty());
        assert_eq!(status.code(), -1);
        assert_eq!(rng.stats().failures, 1);
    }

    #[test]
    fn test_reseed_before_initialize() {
        let rng = healthy(MemoryStateStore::new());
        assert!(!rng.reseed(None));
    }

    #[test]
    fn test_cold_start_and_generate() {
        let rng = healthy(MemoryStateStore::new());
        assert!(rng.initialize());

        let (bytes, status) = rng.generate(32);
        assert_eq!(status, GenerateStatus::Success);
        assert_eq!(bytes.len(), 32);

        let health = rng.health_check();
        assert_eq!(health.module, MODULE_NAME);
        assert!(health.initialized);
        assert!(health.entropy_startup_complete);
        assert_eq!(health.reseed_counter, 2);
        assert_eq!(health.entropy_source, "counter");
    }

    #[test]
    fn test_stuck_source_blocks_initialize() {
        let rng = build(
            Box::new(ConstantCollector::new(vec![0u8; 16])),
            Box::new(MemoryStateStore::new()),
            PolicyConfig::default(),
            1_000_000,
        );
        assert!(!rng.initialize());
        assert!(!rng.health_check().initialized);
        assert_eq!(rng.generate(16).1, GenerateStatus::NotInitialized);
    }

    #[test]
    fn test_initialize_does_not_write_checkpoint() {
        let store = MemoryStateStore::new();
        let rng = healthy(store.clone());
        assert!(rng.initialize());
        assert!(store.record().is_none());
    }

    #[test]
    fn test_reseed_writes_checkpoint() {
        let store = MemoryStateStore::new();
        let rng = healthy(store.clone());
        assert!(rng.initialize());
        assert!(rng.reseed(Some(b"user entropy".as_slice())));

        let checkpoint = store.load().unwrap();
        assert_eq!(checkpoint.token().len(), 32);
        // update sets 1, the token draw advances to 2
        assert_eq!(checkpoint.reseed_counter(), 2);
        assert_eq!(rng.stats().reseeds, 1);
    }

    #[test]
    fn test_checkpoint_token_differs_from_output() {
        let store = MemoryStateStore::new();
        let rng = healthy(store.clone());
        assert!(rng.initialize());
        assert!(rng.reseed(None));

        let token = store.load().unwrap().token().to_vec();
        let (bytes, _) = rng.generate(32);
        assert_ne!(bytes, token);
    }

    #[test]
    fn test_warm_start_changes_stream() {
        let store = MemoryStateStore::new();
        store.set_record(Some(CheckpointRecord::seal(&[0x42; 32], 2)));

        let warm = healthy(store);
        let cold = healthy(MemoryStateStore::new());
        assert!(warm.initialize());
        assert!(cold.initialize());

        assert_ne!(warm.generate(32).0, cold.generate(32).0);
    }

    #[test]
    fn test_tampered_checkpoint_means_cold_start() {
        let mut record = CheckpointRecord::seal(&[0x42; 32], 2);
        record.checksum ^= 1;
        let tampered = MemoryStateStore::new();
        tampered.set_record(Some(record));

        let a = healthy(tampered);
        let b = healthy(MemoryStateStore::new());
        assert!(a.initialize());
        assert!(b.initialize());

        // Same collector sequence and no usable checkpoint: identical streams
        assert_eq!(a.generate(32).0, b.generate(32).0);
    }

    #[test]
    fn test_soft_threshold_triggers_reseed() {
        let policy = PolicyConfig {
            soft_reseed_threshold: 5,
            ..PolicyConfig::default()
        };
        let rng = build(
            Box::new(CounterCollector::new(7, 16)),
            Box::new(MemoryStateStore::new()),
            policy,
            1_000_000,
        );
        assert!(rng.initialize());

        for _ in 0..20 {
            let (bytes, status) = rng.generate(16);
            assert!(status.is_success());
            assert_eq!(bytes.len(), 16);
            assert!(rng.health_check().reseed_counter <= 5);
        }
        let stats = rng.stats();
        assert!(stats.auto_reseeds >= 3);
        assert_eq!(stats.forced_reseeds, 0);
    }

    #[test]
    fn test_hard_interval_reseeds_and_retries() {
        let policy = PolicyConfig {
            soft_reseed_threshold: u64::MAX,
            ..PolicyConfig::default()
        };
        let rng = build(
            Box::new(CounterCollector::new(7, 16)),
            Box::new(MemoryStateStore::new()),
            policy,
            3,
        );
        assert!(rng.initialize());

        for _ in 0..10 {
            let (bytes, status) = rng.generate(24);
            assert_eq!(status, GenerateStatus::Success);
            assert_eq!(bytes.len(), 24);
        }
        let stats = rng.stats();
        assert!(stats.forced_reseeds >= 2);
        assert_eq!(stats.auto_reseeds, 0);
        assert_eq!(stats.generate_calls, 10);
    }

    #[test]
    fn test_failed_forced_reseed_is_internal_failure() {
        // Enough samples for startup plus one seeding only
        let collector = FadingCollector {
            inner: CounterCollector::new(3, 16),
            remaining: 64 + 12,
        };
        let policy = PolicyConfig {
            soft_reseed_threshold: u64::MAX,
            ..PolicyConfig::default()
        };
        let rng = build(Box::new(collector), Box::new(MemoryStateStore::new()), policy, 3);
        assert!(rng.initialize());

        // Counter runs 1 -> 4 within the interval without touching the source
        for _ in 0..3 {
            assert_eq!(rng.generate(16).1, GenerateStatus::Success);
        }

        let (bytes, status) = rng.generate(16);
        assert!(bytes.is_empty());
        assert_eq!(status.code(), -2);

        let stats = rng.stats();
        assert_eq!(stats.forced_reseeds, 0);
        assert_eq!(stats.reseeds, 0);
        assert_eq!(stats.generate_calls, 3);
        assert_eq!(stats.failures, 1);
        assert!(!rng.reseed(None));
    }

    #[test]
    fn test_minimum_interval_keeps_generating() {
        let policy = PolicyConfig {
            soft_reseed_threshold: u64::MAX,
            ..PolicyConfig::default()
        };
        let rng = build(
            Box::new(CounterCollector::new(5, 16)),
            Box::new(MemoryStateStore::new()),
            policy,
            2,
        );
        assert!(rng.initialize());

        for _ in 0..6 {
            assert_eq!(rng.generate(16).1, GenerateStatus::Success);
        }
        assert!(rng.stats().forced_reseeds >= 2);
    }

    #[test]
    fn test_failed_soft_reseed_still_returns_output() {
        let collector = FadingCollector {
            inner: CounterCollector::new(3, 16),
            remaining: 64 + 12,
        };
        let policy = PolicyConfig {
            soft_reseed_threshold: 1,
            ..PolicyConfig::default()
        };
        let rng = build(Box::new(collector), Box::new(MemoryStateStore::new()), policy, 1_000);
        assert!(rng.initialize());

        let (bytes, status) = rng.generate(16);
        assert!(status.is_success());
        assert_eq!(bytes.len(), 16);
        assert_eq!(rng.stats().auto_reseeds, 0);
    }

    #[test]
    fn test_store_failure_does_not_fail_reseed() {
        let rng = build(
            Box::new(CounterCollector::new(1, 16)),
            Box::new(BrokenStore),
            PolicyConfig::default(),
            1_000,
        );
        assert!(rng.initialize());
        assert!(rng.reseed(None));
        assert!(rng.generate(8).1.is_success());
    }

    #[test]
    fn test_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MobileRng>();

        let rng = Arc::new(healthy(MemoryStateStore::new()));
        assert!(rng.initialize());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let rng = Arc::clone(&rng);
                std::thread::spawn(move || {
                    (0..10)
                        .map(|_| rng.generate(16))
                        .all(|(bytes, status)| status.is_success() && bytes.len() == 16)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(rng.stats().generate_calls, 40);
    }

    #[test]
    fn test_with_store_validates_config() {
        let mut config = FileConfig::default();
        config.drbg.p = 1;
        let result = MobileRng::with_store(&config, Box::new(MemoryStateStore::new()));
        assert!(matches!(result, Err(ConfigError::InvalidLattice(_))));
    }
}
