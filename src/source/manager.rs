//! Entropy source manager.
//!
//! Orchestrates collector → health tests → conditioner. Health tests
//! always run on the raw samples: conditioning first would mask the
//! very defects they exist to detect.

use super::collector::{CollectorError, NoiseCollector};
use crate::analysis::{
    AdaptiveProportionTest, HealthReport, RepetitionCountTest, DEFAULT_APT_CUTOFF,
    DEFAULT_APT_WINDOW, DEFAULT_RCT_CUTOFF,
};
use crate::conditioning::Conditioner;
use thiserror::Error;
use zeroize::Zeroizing;

/// Number of samples examined by the startup tests.
pub const STARTUP_SAMPLES: usize = 64;

/// Domain separator for conditioned entropy output.
const ENTROPY_DOMAIN: &[u8] = b"lwr-drbg-entropy-source-v1";

/// Health failures of the entropy source.
///
/// Always fatal to the current operation; no partial or degraded
/// entropy is ever returned alongside one of these.
#[derive(Debug, Error)]
pub enum EntropyHealthError {
    /// The startup run rejected the source.
    #[error("startup health tests failed: {0}")]
    Startup(HealthReport),
    /// A run of identical samples reached the RCT cutoff.
    #[error("continuous repetition count test failed")]
    ContinuousRct,
    /// A window's target sample exceeded the APT cutoff.
    #[error("continuous adaptive proportion test failed")]
    ContinuousApt,
    /// The collector itself returned an error.
    #[error("noise collector failed: {0}")]
    Collector(#[from] CollectorError),
}

/// Produces vetted, whitened entropy from a raw noise collector.
pub struct EntropySourceManager {
    collector: Box<dyn NoiseCollector>,
    conditioner: Conditioner,
    rct: RepetitionCountTest,
    apt: AdaptiveProportionTest,
    /// Set once by a successful startup run, never cleared.
    startup_complete: bool,
}

impl EntropySourceManager {
    /// Creates a manager with the default health test parameters.
    pub fn new(collector: Box<dyn NoiseCollector>, conditioner: Conditioner) -> Self {
        Self::with_cutoffs(
            collector,
            conditioner,
            DEFAULT_RCT_CUTOFF,
            DEFAULT_APT_WINDOW,
            DEFAULT_APT_CUTOFF,
        )
    }

    /// Creates a manager with explicit health test parameters.
    pub fn with_cutoffs(
        collector: Box<dyn NoiseCollector>,
        conditioner: Conditioner,
        rct_cutoff: u32,
        apt_window: u32,
        apt_cutoff: u32,
    ) -> Self {
        Self {
            collector,
            conditioner,
            rct: RepetitionCountTest::new(rct_cutoff),
            apt: AdaptiveProportionTest::new(apt_window, apt_cutoff),
            startup_complete: false,
        }
    }

    /// Runs [`STARTUP_SAMPLES`] samples through both health tests.
    ///
    /// The first failing sample aborts the run. Only a complete passing
    /// run marks startup as done. Collector failures are errors rather
    /// than health verdicts.
    pub fn startup_tests(&mut self) -> Result<HealthReport, CollectorError> {
        for index in 0..STARTUP_SAMPLES {
            let sample = self.collector.sample()?;

            if !self.rct.update(&sample) {
                tracing::warn!(sample = index, collector = self.collector.name(), "Startup RCT failed");
                return Ok(HealthReport::rct_failed("startup RCT failed"));
            }
            if !self.apt.update(&sample) {
                tracing::warn!(sample = index, collector = self.collector.name(), "Startup APT failed");
                return Ok(HealthReport::apt_failed("startup APT failed"));
            }
        }

        self.startup_complete = true;
        tracing::info!(
            samples = STARTUP_SAMPLES,
            collector = self.collector.name(),
            "Entropy source startup tests passed"
        );
        Ok(HealthReport::all_passed("startup OK"))
    }

    /// Returns exactly `out_len` bytes of health-tested, conditioned
    /// entropy.
    ///
    /// Runs the startup tests first if they have not yet passed.
    /// Collects `max(1, out_len / 8) * 2` raw sample blocks.
    pub fn get_entropy(&mut self, out_len: usize) -> Result<Vec<u8>, EntropyHealthError> {
        if !self.startup_complete {
            let report = self.startup_tests()?;
            if !report.passed() {
                return Err(EntropyHealthError::Startup(report));
            }
        }

        let rounds = (out_len / 8).max(1) * 2;
        let raw = self.collect_raw(rounds)?;

        tracing::trace!(rounds, raw_bytes = raw.len(), out_len, "Conditioning raw entropy");

        Ok(self.conditioner.condition(&raw, ENTROPY_DOMAIN, out_len * 8))
    }

    /// Draws `rounds` health-tested blocks into a buffer wiped on drop.
    fn collect_raw(&mut self, rounds: usize) -> Result<Zeroizing<Vec<u8>>, EntropyHealthError> {
        let mut raw = Zeroizing::new(Vec::new());

        for _ in 0..rounds {
            let sample = Zeroizing::new(self.collector.sample()?);

            if !self.rct.update(&sample) {
                tracing::warn!(collector = self.collector.name(), "Continuous RCT failed");
                return Err(EntropyHealthError::ContinuousRct);
            }
            if !self.apt.update(&sample) {
                tracing::warn!(collector = self.collector.name(), "Continuous APT failed");
                return Err(EntropyHealthError::ContinuousApt);
            }

            raw.extend_from_slice(&sample);
        }

        Ok(raw)
    }

    /// Returns true once the startup tests have passed.
    pub fn startup_complete(&self) -> bool {
        self.startup_complete
    }

    /// Name of the underlying collector.
    pub fn collector_name(&self) -> &str {
        self.collector.name()
    }
}

impl std::fmt::Debug for EntropySourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropySourceManager")
            .field("collector", &self.collector.name())
            .field("conditioner", &self.conditioner)
            .field("startup_complete", &self.startup_complete)
            .finish_non_exhaustive()
    }
}
