//! Prometheus metrics for generator monitoring.
//!
//! # Metrics Exposed
//!
//! ## State
//! - `lwr_drbg_initialized` - 1 once `initialize` has succeeded
//! - `lwr_drbg_entropy_startup_complete` - 1 once startup health tests passed
//! - `lwr_drbg_reseed_counter` - Generate calls since the last DRBG update
//!
//! ## Counters
//! - `lwr_drbg_generate_total` - Successful generate calls
//! - `lwr_drbg_bytes_generated_total` - Bytes handed out
//! - `lwr_drbg_reseed_total` - Completed reseeds
//! - `lwr_drbg_auto_reseed_total` - Soft-threshold reseeds
//! - `lwr_drbg_forced_reseed_total` - Reseeds forced by the reseed interval
//! - `lwr_drbg_generate_failures_total` - Failed generate calls
//!
//! # Example
//!
//! ```no_run
//! use lwr_drbg::metrics::{MetricsRegistry, MetricsSnapshot};
//! use lwr_drbg::{FileConfig, MobileRng};
//!
//! let rng = MobileRng::from_config(&FileConfig::default()).unwrap();
//! rng.initialize();
//!
//! let registry = MetricsRegistry::new().unwrap();
//! registry.update(&MetricsSnapshot::capture(&rng));
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
