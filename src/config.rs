/// Bounds and tuning knobs shared by the calibration and recovery stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackConfig {
    /// Largest filler length tried while discovering block size or
    /// localising the prefix.
    pub max_probes: usize,
    /// Random-prefix retries allowed when a CBC sweep has several hits.
    pub max_retries: usize,
    /// Repeated windows, beyond the distinct count, needed to call it ECB.
    pub ecb_threshold: usize,
    /// Fan candidate sweeps out over rayon when using the `*_parallel` entry
    /// points.
    pub parallel: bool,
    /// Seed for the retry prefixes. `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl AttackConfig {
    pub const DEFAULT_MAX_PROBES: usize = 256;
    pub const DEFAULT_MAX_RETRIES: usize = 16;

    pub fn with_max_probes(mut self, max_probes: usize) -> Self {
        self.max_probes = max_probes;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_ecb_threshold(mut self, ecb_threshold: usize) -> Self {
        self.ecb_threshold = ecb_threshold;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            max_probes: Self::DEFAULT_MAX_PROBES,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            ecb_threshold: 1,
            parallel: false,
            seed: None,
        }
    }
}
