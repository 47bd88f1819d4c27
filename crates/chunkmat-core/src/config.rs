//! Parallel tuning knobs
//
// Thread count follows rayon's global pool; set RAYON_NUM_THREADS to change it.

/// Default minimum number of scalar operations per parallel task.
pub const MINIMUM_PARALLEL_GRAIN_SIZE: usize = 1000;

/// Environment variable read by [`Tuning::from_env`].
pub const GRAIN_SIZE_ENV: &str = "CHUNKMAT_MIN_GRAIN_SIZE";

/// Tuning parameters for parallel zero-fill and multiply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tuning {
    /// Baseline grain size; scaled by row density for element ranges and
    /// divided by the chunk size for chunk-row ranges.
    pub minimum_parallel_grain_size: usize,
}

impl Tuning {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            minimum_parallel_grain_size: MINIMUM_PARALLEL_GRAIN_SIZE,
        }
    }

    /// Set the baseline grain size. Zero is clamped to one.
    #[inline]
    #[must_use]
    pub const fn with_minimum_parallel_grain_size(mut self, grain: usize) -> Self {
        self.minimum_parallel_grain_size = if grain == 0 { 1 } else { grain };
        self
    }

    /// Read the grain size from `CHUNKMAT_MIN_GRAIN_SIZE`, falling back to
    /// the default when unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(GRAIN_SIZE_ENV) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(grain) if grain > 0 => Self::new().with_minimum_parallel_grain_size(grain),
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid {}", GRAIN_SIZE_ENV);
                    Self::new()
                }
            },
            Err(_) => Self::new(),
        }
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self::new()
    }
}
