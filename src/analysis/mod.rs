//! Online entropy health testing.
//!
//! This module provides the SP 800-90B style Repetition Count and
//! Adaptive Proportion tests, applied to raw noise samples before any
//! conditioning, and the report type produced by a test run.

mod health;
mod report;

pub use health::{
    AdaptiveProportionTest, RepetitionCountTest, DEFAULT_APT_CUTOFF, DEFAULT_APT_WINDOW,
    DEFAULT_RCT_CUTOFF,
};
pub use report::HealthReport;
