//! Continuous health tests per NIST SP 800-90B §4.4.
//!
//! Both tests treat a sample block as an opaque, byte-for-byte
//! comparable unit. Repetition and bias are measured over whole
//! blocks, never over individual bits.

/// Default RCT cutoff.
pub const DEFAULT_RCT_CUTOFF: u32 = 20;

/// Default APT window size in samples.
pub const DEFAULT_APT_WINDOW: u32 = 512;

/// Default APT cutoff.
pub const DEFAULT_APT_CUTOFF: u32 = 13;

/// Repetition Count Test.
///
/// Detects a stuck or frozen noise source. Runs indefinitely with O(1)
/// memory and no window boundary.
#[derive(Debug, Clone)]
pub struct RepetitionCountTest {
    /// Failure once the run length reaches this value.
    cutoff: u32,
    /// Most recently seen sample.
    last: Option<Vec<u8>>,
    /// Length of the current run of `last`.
    count: u32,
}

impl RepetitionCountTest {
    /// Creates a new RCT with the given cutoff.
    pub fn new(cutoff: u32) -> Self {
        Self {
            cutoff,
            last: None,
            count: 0,
        }
    }

    /// Feeds one sample. Returns `false` when the run of identical
    /// samples reaches the cutoff.
    pub fn update(&mut self, sample: &[u8]) -> bool {
        if self.last.as_deref() != Some(sample) {
            self.last = Some(sample.to_vec());
            self.count = 1;
            return true;
        }

        self.count = self.count.saturating_add(1);
        if self.count >= self.cutoff {
            tracing::trace!(run = self.count, cutoff = self.cutoff, "RCT cutoff reached");
            return false;
        }
        true
    }

    /// Returns the cutoff.
    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }

    /// Returns the current run length.
    pub fn run_length(&self) -> u32 {
        self.count
    }
}

impl Default for RepetitionCountTest {
    fn default() -> Self {
        Self::new(DEFAULT_RCT_CUTOFF)
    }
}

/// Adaptive Proportion Test.
///
/// The first sample of each window becomes the target; matches are
/// tallied and the verdict `target_count <= cutoff` is delivered only
/// when the window completes. Mid-window calls always pass.
#[derive(Debug, Clone)]
pub struct AdaptiveProportionTest {
    window: u32,
    cutoff: u32,
    sample_count: u32,
    target: Option<Vec<u8>>,
    target_count: u32,
}

impl AdaptiveProportionTest {
    /// Creates a new APT. A zero window is treated as one.
    pub fn new(window: u32, cutoff: u32) -> Self {
        Self {
            window: window.max(1),
            cutoff,
            sample_count: 0,
            target: None,
            target_count: 0,
        }
    }

    /// Feeds one sample. Returns `false` only at a window boundary
    /// whose target occurred more than `cutoff` times.
    pub fn update(&mut self, sample: &[u8]) -> bool {
        self.sample_count += 1;

        if self.target.is_none() {
            self.target = Some(sample.to_vec());
            self.target_count = 1;
        } else if self.target.as_deref() == Some(sample) {
            self.target_count += 1;
        }

        if self.sample_count < self.window {
            return true;
        }

        let passed = self.target_count <= self.cutoff;
        if !passed {
            tracing::trace!(
                target_count = self.target_count,
                cutoff = self.cutoff,
                "APT window failed"
            );
        }

        // Counters reset regardless of verdict
        self.sample_count = 0;
        self.target = None;
        self.target_count = 0;

        passed
    }

    /// Returns the window size.
    pub fn window(&self) -> u32 {
        self.window
    }

    /// Returns the cutoff.
    pub fn cutoff(&self) -> u32 {
        self.cutoff
    }

    /// Samples seen in the current window.
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Occurrences of the current window's target.
    pub fn target_count(&self) -> u32 {
        self.target_count
    }
}

impl Default for AdaptiveProportionTest {
    fn default() -> Self {
        Self::new(DEFAULT_APT_WINDOW, DEFAULT_APT_CUTOFF)
    }
}
