//! LWR-DRBG Library
//!
//! A deterministic random bit generator built on the Module Learning
//! With Rounding problem, fed by a health-tested entropy source and
//! protected against state rollback by a persisted checkpoint.
//!
//! # Architecture
//!
//! ```text
//! source (collector → RCT/APT → conditioning) → reseeding (LWR DRBG) → rng
//!                                                      ↕
//!                                               persistence
//! ```
//!
//! # Design Principles
//!
//! - **Fail-closed**: No output is produced from an entropy source that
//!   fails its health tests
//! - **Forward secrecy**: The secret vector is rotated after every output
//! - **Mandatory reseeding**: The DRBG refuses to generate past its
//!   reseed interval
//! - **Checkpoint is not the key**: Persisted state is a token drawn
//!   after rotation, never the live secret
//!
//! # Example
//!
//! ```no_run
//! use lwr_drbg::{FileConfig, GenerateStatus, MobileRng};
//!
//! let rng = MobileRng::from_config(&FileConfig::default()).unwrap();
//! if rng.initialize() {
//!     let (bytes, status) = rng.generate(32);
//!     assert_eq!(status, GenerateStatus::Success);
//!     assert_eq!(bytes.len(), 32);
//!
//!     // Mix in caller-provided entropy and persist a fresh checkpoint
//!     rng.reseed(Some(b"touch events".as_slice()));
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod conditioning;
pub mod config;
pub mod metrics;
pub mod persistence;
pub mod reseeding;
pub mod rng;
pub mod source;

// Re-export commonly used types at crate root
pub use analysis::{AdaptiveProportionTest, HealthReport, RepetitionCountTest};
pub use conditioning::{Conditioner, XofAlgorithm};
pub use config::{ConfigError, FileConfig};
pub use persistence::{FileStateStore, MemoryStateStore, StateStore};
pub use reseeding::{Generation, LwrDrbgCore, LwrParams};
pub use rng::{GenerateStatus, HealthStatus, MobileRng, RngStats};
pub use source::{CollectorKind, EntropySourceManager, NoiseCollector};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
