//! Health test outcome.

/// Result of one health test run.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    passed: bool,
    rct_passed: bool,
    apt_passed: bool,
    reason: String,
}

impl HealthReport {
    /// Report for a run in which every sample passed.
    pub fn all_passed(reason: impl Into<String>) -> Self {
        Self {
            passed: true,
            rct_passed: true,
            apt_passed: true,
            reason: reason.into(),
        }
    }

    /// Report for a run aborted by the repetition count test.
    pub fn rct_failed(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            rct_passed: false,
            apt_passed: true,
            reason: reason.into(),
        }
    }

    /// Report for a run aborted by the adaptive proportion test.
    pub fn apt_failed(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            rct_passed: true,
            apt_passed: false,
            reason: reason.into(),
        }
    }

    /// Overall verdict.
    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Whether the repetition count test passed.
    #[inline]
    pub fn rct_passed(&self) -> bool {
        self.rct_passed
    }

    /// Whether the adaptive proportion test passed.
    #[inline]
    pub fn apt_passed(&self) -> bool {
        self.apt_passed
    }

    /// Human-readable reason.
    #[inline]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (rct={}, apt={})",
            self.reason,
            if self.rct_passed { "ok" } else { "fail" },
            if self.apt_passed { "ok" } else { "fail" }
        )
    }
}
