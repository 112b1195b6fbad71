//! Random trigger selection inside a daily window.

use chrono::{Duration, NaiveDateTime};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::window::TimeWindow;

/// Source of uniform random offsets.
pub trait RandomSource: Send {
    /// Uniform value in `[0, span)`. Only called with `span > 0`.
    fn below(&mut self, span: u64) -> u64;
}

impl RandomSource for Mcg128Xsl64 {
    fn below(&mut self, span: u64) -> u64 {
        self.gen_range(0..span)
    }
}

/// Picks one trigger instant per call.
pub struct WindowPicker {
    rng: Box<dyn RandomSource>,
}

impl WindowPicker {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    /// Reproducible picker.
    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(Mcg128Xsl64::seed_from_u64(seed)))
    }

    /// Picker seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(Box::new(Mcg128Xsl64::from_entropy()))
    }

    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Uniform instant in `[max(now, start), end)` on the date of `now`.
    ///
    /// Returns `None` when that interval is empty: the window is inverted,
    /// zero-width, or already over for today.
    pub fn pick_instant(&mut self, window: &TimeWindow, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let (start, end) = window.resolve(now);
        let lower = now.max(start);
        if lower >= end {
            return None;
        }

        let span_ms = (end - lower).num_milliseconds();
        if span_ms <= 0 {
            // Less than a millisecond of room left.
            return Some(lower);
        }
        let offset = self.rng.below(span_ms as u64);
        Some(lower + Duration::milliseconds(offset as i64))
    }
}

impl std::fmt::Debug for WindowPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowPicker").finish_non_exhaustive()
    }
}
