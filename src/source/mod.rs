//! Raw noise collection and vetted entropy retrieval.
//!
//! Collectors are treated as untrusted sources of raw bytes. The
//! [`EntropySourceManager`] gates all output behind startup and
//! continuous health tests before conditioning.

mod collector;
mod manager;

pub use collector::{
    CollectorError, CollectorKind, ConstantCollector, CounterCollector, JitterCollector,
    NoiseCollector, OsRngCollector,
};
pub use manager::{EntropyHealthError, EntropySourceManager, STARTUP_SAMPLES};
