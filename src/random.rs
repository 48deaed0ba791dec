//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Datamk.
//! The Datamk project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Datamk Random Module
//!
//! Seeded random numbers and the two continuous distributions used by the
//! random sources.
//!
//! One [`DmRng`] is owned by a run session and threaded into every pull, so a
//! run is reproducible from its seed alone. A generator created without a seed
//! is seeded from the wall clock and is not reproducible.
//!
//! ## Usage Example
//!
//! ```rust
//! use datamk::random::{DmDistribution, DmRng, DmTriangular};
//!
//! let mut rng = DmRng::with_seed(42);
//! let n = rng.random(1, 7).unwrap();
//! assert!((1..7).contains(&n));
//!
//! let skewed = DmTriangular::new(0.0, 10.0, 100.0).unwrap();
//! let v = skewed.next_real(&mut rng);
//! assert!((0.0..=100.0).contains(&v));
//! ```

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::{DmError, Result};

/// Session random number generator.
#[derive(Debug, Clone)]
pub struct DmRng {
    rng: StdRng,
    seed: u64,
}

impl Default for DmRng {
    fn default() -> Self {
        Self::from_clock()
    }
}

impl DmRng {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seeds from the wall clock.
    pub fn from_clock() -> Self {
        Self::with_seed(Utc::now().timestamp_nanos_opt().unwrap_or_default().unsigned_abs())
    }

    /// Seed this generator was created with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns an integer in `[begin, end)`.
    pub fn random(&mut self, begin: i64, end: i64) -> Result<i64> {
        if begin >= end {
            return Err(DmError::InvalidRange { begin, end });
        }
        Ok(self.rng.gen_range(begin..end))
    }

    /// Returns a non-negative raw value, used for `raw % n` selection.
    pub fn raw(&mut self) -> usize {
        self.rng.gen_range(0..=i32::MAX) as usize
    }

    /// Uniform sample from `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Continuous distribution sampled with a session generator.
pub trait DmDistribution {
    fn next_real(&self, rng: &mut DmRng) -> f64;

    /// Truncating integer sample.
    fn next_int(&self, rng: &mut DmRng) -> i64 {
        self.next_real(rng) as i64
    }
}

/// Uniform distribution over `[begin, end)`.
#[derive(Debug, Clone, Copy)]
pub struct DmUniform {
    begin: f64,
    end: f64,
}

impl DmUniform {
    pub fn new(begin: f64, end: f64) -> Result<Self> {
        if !(begin < end) {
            return Err(DmError::InvalidRange {
                begin: begin as i64,
                end: end as i64,
            });
        }
        Ok(Self { begin, end })
    }
}

impl DmDistribution for DmUniform {
    fn next_real(&self, rng: &mut DmRng) -> f64 {
        self.begin + (self.end - self.begin) * rng.unit()
    }
}

/// Triangular distribution over `[begin, end]` peaking at `mode`.
#[derive(Debug, Clone, Copy)]
pub struct DmTriangular {
    begin: f64,
    mode: f64,
    end: f64,
}

impl DmTriangular {
    pub fn new(begin: f64, mode: f64, end: f64) -> Result<Self> {
        if !(begin <= mode && mode <= end) || begin >= end {
            return Err(DmError::value(format!(
                "Invalid triangular distribution {begin} <= {mode} <= {end}"
            )));
        }
        Ok(Self { begin, mode, end })
    }
}

impl DmDistribution for DmTriangular {
    fn next_real(&self, rng: &mut DmRng) -> f64 {
        let (a, c, b) = (self.begin, self.mode, self.end);
        let u = rng.unit();
        let split = (c - a) / (b - a);
        if u < split {
            a + (u * (b - a) * (c - a)).sqrt()
        } else {
            b - ((1.0 - u) * (b - a) * (b - c)).sqrt()
        }
    }
}
