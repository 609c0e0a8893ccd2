//! Noise collectors.
//!
//! A collector only promises to return a block of raw bytes per call.
//! Randomness quality is judged downstream by the health tests, never
//! by the collector itself.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

/// Errors that can occur while sampling a noise source.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The underlying device or syscall failed.
    #[error("noise source unavailable: {0}")]
    Unavailable(String),
    /// The source has no more samples to give.
    #[error("noise source exhausted")]
    Exhausted,
}

/// Capability interface for raw noise sources.
///
/// Implementations may be physical (timer jitter), delegated (OS RNG)
/// or synthetic test doubles.
pub trait NoiseCollector: Send {
    /// Short identifier for logs and diagnostics.
    fn name(&self) -> &str;

    /// Collects one fixed-size sample block.
    fn sample(&mut self) -> Result<Vec<u8>, CollectorError>;
}

/// Selects a collector implementation from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectorKind {
    /// CPU timer jitter.
    #[default]
    Jitter,
    /// Operating system RNG.
    Os,
}

/// Timer-jitter collector.
///
/// Each block is `deltas` consecutive monotonic-clock deltas packed as
/// little-endian `u64`. A short data-dependent spin between reads
/// amplifies cache, scheduler and interrupt jitter.
#[derive(Debug, Clone)]
pub struct JitterCollector {
    deltas: usize,
    accumulator: u64,
}

impl JitterCollector {
    /// Default number of deltas per block.
    pub const DEFAULT_DELTAS: usize = 32;

    /// Creates a collector producing `deltas` deltas per block.
    pub fn new(deltas: usize) -> Self {
        Self {
            deltas: deltas.max(1),
            accumulator: 0,
        }
    }

    fn spin(&self, round: usize) {
        let spin_count = 64 + (self.accumulator & 0xFF) as usize;
        let mut x = (round as u64).wrapping_mul(0x6C62_272E_07BB_0142);
        for _ in 0..spin_count {
            x = x.wrapping_mul(0x5DEE_CE66D).wrapping_add(0xB);
        }
        std::hint::black_box(x);
    }
}

impl Default for JitterCollector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELTAS)
    }
}

impl NoiseCollector for JitterCollector {
    fn name(&self) -> &str {
        "jitter"
    }

    fn sample(&mut self) -> Result<Vec<u8>, CollectorError> {
        let mut block = Vec::with_capacity(self.deltas * 8);
        let mut last = Instant::now();

        for round in 0..self.deltas {
            self.spin(round);
            let now = Instant::now();
            // Truncation to 64 bits is intentional
            let delta = now.duration_since(last).as_nanos() as u64;
            self.accumulator = self.accumulator.wrapping_add(delta);
            block.extend_from_slice(&delta.to_le_bytes());
            last = now;
        }

        Ok(block)
    }
}

/// Collector delegating to the operating system RNG.
#[derive(Debug, Clone)]
pub struct OsRngCollector {
    block_len: usize,
}

impl OsRngCollector {
    /// Default block size in bytes.
    pub const DEFAULT_BLOCK_LEN: usize = 32;

    /// Creates a collector producing `block_len`-byte blocks.
    pub fn new(block_len: usize) -> Self {
        Self {
            block_len: block_len.max(1),
        }
    }
}

impl Default for OsRngCollector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_LEN)
    }
}

impl NoiseCollector for OsRngCollector {
    fn name(&self) -> &str {
        "os"
    }

    fn sample(&mut self) -> Result<Vec<u8>, CollectorError> {
        let mut block = vec![0u8; self.block_len];
        OsRng
            .try_fill_bytes(&mut block)
            .map_err(|e| CollectorError::Unavailable(e.to_string()))?;
        Ok(block)
    }
}

/// Test double: a frozen source returning the same block forever.
#[derive(Debug, Clone)]
pub struct ConstantCollector {
    block: Vec<u8>,
}

impl ConstantCollector {
    /// Creates a collector that always returns `block`.
    pub fn new(block: Vec<u8>) -> Self {
        Self { block }
    }
}

impl NoiseCollector for ConstantCollector {
    fn name(&self) -> &str {
        "constant"
    }

    fn sample(&mut self) -> Result<Vec<u8>, CollectorError> {
        Ok(self.block.clone())
    }
}

/// Test double: deterministic, pairwise-distinct blocks.
///
/// Block `i` is the little-endian encoding of `start + i` repeated to
/// fill the block, so every sample passes both health tests.
#[derive(Debug, Clone)]
pub struct CounterCollector {
    next: u64,
    block_len: usize,
}

impl CounterCollector {
    /// Creates a collector counting up from `start`; blocks are at least 8 bytes.
    pub fn new(start: u64, block_len: usize) -> Self {
        Self {
            next: start,
            block_len: block_len.max(8),
        }
    }
}

impl NoiseCollector for CounterCollector {
    fn name(&self) -> &str {
        "counter"
    }

    fn sample(&mut self) -> Result<Vec<u8>, CollectorError> {
        let bytes = self.next.to_le_bytes();
        self.next = self.next.wrapping_add(1);
        Ok(bytes.iter().copied().cycle().take(self.block_len).collect())
    }
}
