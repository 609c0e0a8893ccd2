//! Generator configuration.
//!
//! Every table is optional in the TOML file; missing values fall back
//! to the defaults below. Lattice parameters are validated before any
//! component is built.

use crate::analysis::{DEFAULT_APT_CUTOFF, DEFAULT_APT_WINDOW, DEFAULT_RCT_CUTOFF};
use crate::conditioning::{Conditioner, XofAlgorithm};
use crate::persistence::FileStateStore;
use crate::reseeding::{
    DrbgError, LatticeError, LwrDrbgCore, LwrParams, DEFAULT_MATRIX_SEED, DEFAULT_RESEED_INTERVAL,
};
use crate::source::{
    CollectorKind, EntropySourceManager, JitterCollector, NoiseCollector, OsRngCollector,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Lattice dimensions or moduli out of range.
    #[error("invalid lattice parameters: {0}")]
    InvalidLattice(#[from] LatticeError),
    /// RCT/APT cutoffs or window unusable.
    #[error("invalid health test settings: {0}")]
    InvalidHealthTest(String),
    /// Collector block size unusable.
    #[error("invalid collector settings: {0}")]
    InvalidCollector(String),
    /// Reseed interval or policy values unusable.
    #[error("invalid reseed policy: {0}")]
    InvalidPolicy(String),
    /// DRBG construction failed.
    #[error("failed to build DRBG: {0}")]
    Drbg(#[from] DrbgError),
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Noise collection and health test settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntropyConfig {
    /// Which raw noise collector to use.
    pub collector: CollectorKind,
    /// Timing deltas per jitter sample.
    pub jitter_deltas: usize,
    /// Bytes per OS RNG sample.
    pub os_block_bytes: usize,
    /// Repetition count test cutoff.
    pub rct_cutoff: u32,
    /// Adaptive proportion test window size.
    pub apt_window: u32,
    /// Adaptive proportion test cutoff.
    pub apt_cutoff: u32,
}

impl Default for EntropyConfig {
    fn default() -> Self {
        Self {
            collector: CollectorKind::default(),
            jitter_deltas: JitterCollector::DEFAULT_DELTAS,
            os_block_bytes: OsRngCollector::DEFAULT_BLOCK_LEN,
            rct_cutoff: DEFAULT_RCT_CUTOFF,
            apt_window: DEFAULT_APT_WINDOW,
            apt_cutoff: DEFAULT_APT_CUTOFF,
        }
    }
}

impl EntropyConfig {
    /// Validates the collector and health test settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rct_cutoff < 2 {
            return Err(ConfigError::InvalidHealthTest(
                "rct_cutoff must be at least 2".into(),
            ));
        }
        if self.apt_window == 0 || self.apt_cutoff == 0 {
            return Err(ConfigError::InvalidHealthTest(
                "apt_window and apt_cutoff must be non-zero".into(),
            ));
        }
        if self.apt_cutoff > self.apt_window {
            return Err(ConfigError::InvalidHealthTest(
                "apt_cutoff cannot exceed apt_window".into(),
            ));
        }
        match self.collector {
            CollectorKind::Jitter if self.jitter_deltas == 0 => Err(
                ConfigError::InvalidCollector("jitter_deltas must be non-zero".into()),
            ),
            CollectorKind::Os if self.os_block_bytes == 0 => Err(ConfigError::InvalidCollector(
                "os_block_bytes must be non-zero".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Instantiates the configured collector.
    pub fn build_collector(&self) -> Box<dyn NoiseCollector> {
        match self.collector {
            CollectorKind::Jitter => Box::new(JitterCollector::new(self.jitter_deltas)),
            CollectorKind::Os => Box::new(OsRngCollector::new(self.os_block_bytes)),
        }
    }

    /// Builds an entropy source manager around the configured collector.
    pub fn build_manager(&self, conditioner: Conditioner) -> EntropySourceManager {
        EntropySourceManager::with_cutoffs(
            self.build_collector(),
            conditioner,
            self.rct_cutoff,
            self.apt_window,
            self.apt_cutoff,
        )
    }
}

/// DRBG core settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrbgConfig {
    /// Module rank.
    pub k: usize,
    /// Ring degree.
    pub n: usize,
    /// Large modulus.
    pub q: u32,
    /// Rounding modulus.
    pub p: u32,
    /// Seed for the public matrix.
    pub matrix_seed: u64,
    /// Hard limit on generate calls between reseeds.
    pub reseed_interval: u64,
    /// Extendable-output function used for all conditioning.
    pub xof: XofAlgorithm,
}

impl Default for DrbgConfig {
    fn default() -> Self {
        let params = LwrParams::default();
        Self {
            k: params.k,
            n: params.n,
            q: params.q,
            p: params.p,
            matrix_seed: DEFAULT_MATRIX_SEED,
            reseed_interval: DEFAULT_RESEED_INTERVAL,
            xof: XofAlgorithm::default(),
        }
    }
}

impl DrbgConfig {
    /// Lattice parameters described by this table.
    pub fn params(&self) -> LwrParams {
        LwrParams {
            k: self.k,
            n: self.n,
            q: self.q,
            p: self.p,
        }
    }

    /// Conditioner for the configured XOF.
    pub fn conditioner(&self) -> Conditioner {
        Conditioner::new(self.xof)
    }

    /// Validates the lattice parameters and interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params().validate()?;
        // Every reseed spends one generate call on the checkpoint token,
        // so an interval of 1 leaves nothing for the retry.
        if self.reseed_interval < 2 {
            return Err(ConfigError::InvalidPolicy(
                "reseed_interval must be at least 2".into(),
            ));
        }
        Ok(())
    }

    /// Builds an unseeded DRBG core.
    pub fn build(&self) -> Result<LwrDrbgCore, ConfigError> {
        Ok(LwrDrbgCore::with_matrix_seed(
            self.params(),
            self.matrix_seed,
            self.conditioner(),
            self.reseed_interval,
        )?)
    }
}

/// Orchestrator reseed policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Reseed proactively once the counter passes this value.
    pub soft_reseed_threshold: u64,
    /// Fresh entropy bytes gathered per seeding.
    pub seed_entropy_bytes: usize,
    /// Size of the persisted checkpoint token.
    pub checkpoint_token_bytes: usize,
}

impl PolicyConfig {
    /// Default soft reseed threshold.
    pub const DEFAULT_SOFT_RESEED_THRESHOLD: u64 = 1000;
    /// Default entropy bytes per seeding.
    pub const DEFAULT_SEED_ENTROPY_BYTES: usize = 48;
    /// Default checkpoint token length.
    pub const DEFAULT_CHECKPOINT_TOKEN_BYTES: usize = 32;

    /// Validates the policy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.seed_entropy_bytes < 16 {
            return Err(ConfigError::InvalidPolicy(
                "seed_entropy_bytes must be at least 16".into(),
            ));
        }
        if self.checkpoint_token_bytes == 0 {
            return Err(ConfigError::InvalidPolicy(
                "checkpoint_token_bytes must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            soft_reseed_threshold: Self::DEFAULT_SOFT_RESEED_THRESHOLD,
            seed_entropy_bytes: Self::DEFAULT_SEED_ENTROPY_BYTES,
            checkpoint_token_bytes: Self::DEFAULT_CHECKPOINT_TOKEN_BYTES,
        }
    }
}

/// Checkpoint storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Checkpoint file location.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(FileStateStore::DEFAULT_PATH),
        }
    }
}

impl StoreConfig {
    /// Builds the file-backed store.
    pub fn build(&self) -> FileStateStore {
        FileStateStore::new(&self.path)
    }
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[entropy]` table.
    #[serde(default)]
    pub entropy: EntropyConfig,
    /// `[drbg]` table.
    #[serde(default)]
    pub drbg: DrbgConfig,
    /// `[policy]` table.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// `[store]` table.
    #[serde(default)]
    pub store: StoreConfig,
}

impl FileConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.entropy.validate()?;
        self.drbg.validate()?;
        self.policy.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_reference_parameters() {
        let config = FileConfig::default();
        assert_eq!(config.drbg.params(), LwrParams::default());
        assert_eq!(config.drbg.matrix_seed, 42);
        assert_eq!(config.entropy.rct_cutoff, 20);
        assert_eq!(config.entropy.apt_window, 512);
        assert_eq!(config.entropy.apt_cutoff, 13);
        assert_eq!(config.policy.soft_reseed_threshold, 1000);
        assert_eq!(config.policy.seed_entropy_bytes, 48);
        assert_eq!(config.store.path, PathBuf::from("secure_state.json"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = FileConfig::from_toml("").unwrap();
        assert_eq!(config.drbg.reseed_interval, DEFAULT_RESEED_INTERVAL);
        assert_eq!(config.entropy.collector, CollectorKind::Jitter);
    }

    #[test]
    fn test_partial_tables() {
        let config = FileConfig::from_toml(
            r#"
            [entropy]
            collector = "os"

            [drbg]
            k = 2
            n = 16
            xof = "blake3"

            [policy]
            soft_reseed_threshold = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.entropy.collector, CollectorKind::Os);
        assert_eq!(config.entropy.rct_cutoff, DEFAULT_RCT_CUTOFF);
        assert_eq!(config.drbg.params().dimension(), 32);
        assert_eq!(config.drbg.q, 3329);
        assert_eq!(config.drbg.xof, XofAlgorithm::Blake3);
        assert_eq!(config.policy.soft_reseed_threshold, 10);
        assert_eq!(config.policy.seed_entropy_bytes, 48);
    }

    #[test]
    fn test_invalid_lattice_rejected() {
        let result = FileConfig::from_toml("[drbg]\np = 4000\n");
        assert!(matches!(result, Err(ConfigError::InvalidLattice(_))));
    }

    #[test]
    fn test_interval_too_short_for_checkpoint_rejected() {
        let mut config = FileConfig::default();
        for interval in [0, 1] {
            config.drbg.reseed_interval = interval;
            assert!(matches!(config.validate(), Err(ConfigError::InvalidPolicy(_))));
        }

        config.drbg.reseed_interval = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apt_cutoff_above_window_rejected() {
        let mut config = FileConfig::default();
        config.entropy.apt_window = 8;
        config.entropy.apt_cutoff = 9;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHealthTest(_))));
    }

    #[test]
    fn test_short_seed_rejected() {
        let mut config = FileConfig::default();
        config.policy.seed_entropy_bytes = 8;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPolicy(_))));
    }

    #[test]
    fn test_unknown_collector_rejected() {
        let result = FileConfig::from_toml("[entropy]\ncollector = \"camera\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = FileConfig::from_file("/nonexistent/lwr-drbg.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError(_))));
    }

    #[test]
    fn test_build_components() {
        let mut config = FileConfig::default();
        config.entropy.collector = CollectorKind::Os;
        config.drbg.k = 1;
        config.drbg.n = 8;

        let manager = config.entropy.build_manager(config.drbg.conditioner());
        assert_eq!(manager.collector_name(), "os");
        assert!(!manager.startup_complete());

        let core = config.drbg.build().unwrap();
        assert_eq!(core.params().dimension(), 8);
    }
}
