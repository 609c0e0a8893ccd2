//! Status values reported by [`MobileRng`](super::MobileRng).

use serde::Serialize;

/// Module identity reported by health checks.
pub const MODULE_NAME: &str = "MobileRNG-LWR";

/// Result code of a generate call.
///
/// The numeric codes are stable for callers that only see integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(i32)]
pub enum GenerateStatus {
    /// Output has exactly the requested length.
    Success = 0,
    /// `initialize` has not succeeded yet.
    NotInitialized = -1,
    /// Entropy or DRBG failure; no output was produced.
    InternalFailure = -2,
}

impl GenerateStatus {
    /// Integer status code: 0, -1 or -2.
    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns true for [`GenerateStatus::Success`].
    #[inline]
    pub fn is_success(self) -> bool {
        self == GenerateStatus::Success
    }
}

impl std::fmt::Display for GenerateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            GenerateStatus::Success => "success",
            GenerateStatus::NotInitialized => "not initialized",
            GenerateStatus::InternalFailure => "internal failure",
        };
        write!(f, "{} ({})", label, self.code())
    }
}

/// Snapshot returned by `health_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// Module identity, always [`MODULE_NAME`].
    pub module: &'static str,
    /// Whether `initialize` has succeeded.
    pub initialized: bool,
    /// Generate calls since the last DRBG update.
    pub reseed_counter: u64,
    /// Whether the entropy startup tests have passed.
    pub entropy_startup_complete: bool,
    /// Name of the raw noise collector.
    pub entropy_source: String,
}

/// Lifetime counters of one generator instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RngStats {
    /// Successful generate calls.
    pub generate_calls: u64,
    /// Bytes handed out by successful generate calls.
    pub bytes_generated: u64,
    /// Completed reseeds, whatever triggered them.
    pub reseeds: u64,
    /// Reseeds triggered by the soft threshold.
    pub auto_reseeds: u64,
    /// Reseeds forced by the DRBG's hard interval.
    pub forced_reseeds: u64,
    /// Generate calls that returned an error code.
    pub failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GenerateStatus::Success.code(), 0);
        assert_eq!(GenerateStatus::NotInitialized.code(), -1);
        assert_eq!(GenerateStatus::InternalFailure.code(), -2);
        assert!(GenerateStatus::Success.is_success());
        assert!(!GenerateStatus::InternalFailure.is_success());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(GenerateStatus::NotInitialized.to_string(), "not initialized (-1)");
    }

    #[test]
    fn test_health_status_serializes() {
        let status = HealthStatus {
            module: MODULE_NAME,
            initialized: true,
            reseed_counter: 3,
            entropy_startup_complete: true,
            entropy_source: "os".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["module"], "MobileRNG-LWR");
        assert_eq!(json["reseed_counter"], 3);
    }
}
