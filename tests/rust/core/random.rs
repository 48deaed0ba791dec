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

//! # Datamk Core Tests - Random
//!
//! Seeding and distribution tests. A fixed seed must reproduce a whole run
//! byte for byte.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test random
//! ```

use datamk::io::DmFileManager;
use datamk::{DmDistribution, DmModelManager, DmRng, DmRunMode, DmSeed, DmSession, DmTriangular, DmUniform};
use proptest::prelude::*;

const SCRIPT: &str = "<csvt>\
    <gen count='25'>\
      <rand_int begin='1' end='7'/>\
      <rand_real begin='0' end='1' places='3'/>\
      <rows values='red,green,blue'/>\
      <masked mask='AA-09'/>\
    </gen>\
  </csvt>";

fn run(seed: u64) -> Vec<String> {
    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(SCRIPT, "random.xml", DmRunMode::GenForm)
        .unwrap();
    let (files, out) = DmFileManager::capture();
    let mut session = DmSession::new(DmRng::with_seed(seed), files);
    manager.run_models(&mut session).unwrap();
    out.lines()
}

/// Tests that a fixed seed reproduces the same output.
#[test]
fn test_same_seed_same_output() {
    let first = run(1234);
    assert_eq!(first.len(), 25);
    assert_eq!(first, run(1234));
    assert_ne!(first, run(4321));
}

/// Tests that sampled values respect the declared ranges.
#[test]
fn test_script_values_in_range() {
    for line in run(99) {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 4);
        let die: i64 = fields[0].parse().unwrap();
        assert!((1..7).contains(&die), "rand_int out of range: {die}");
        let real: f64 = fields[1].parse().unwrap();
        assert!((0.0..=1.0).contains(&real));
        assert_eq!(fields[1].split('.').nth(1).map(str::len), Some(3));
        assert!(["red", "green", "blue"].contains(&fields[2]));

        let masked: Vec<char> = fields[3].chars().collect();
        assert_eq!(masked.len(), 5);
        assert!(masked[0].is_ascii_uppercase() && masked[1].is_ascii_uppercase());
        assert_eq!(masked[2], '-');
        assert!(masked[3].is_ascii_digit());
        assert!(('1'..='9').contains(&masked[4]));
    }
}

/// Tests random seed parsing for the command line.
#[test]
fn test_seed_parsing() {
    assert!(matches!("42".parse::<DmSeed>(), Ok(DmSeed::Fixed(42))));
    assert!(matches!("time".parse::<DmSeed>(), Ok(DmSeed::Time)));
    let err = "soon".parse::<DmSeed>().unwrap_err();
    assert_eq!(err.to_string(), "Invalid value for random seed: soon");
    assert_eq!(DmSeed::Fixed(5).rng().seed(), 5);
}

/// Tests that a triangular distribution leans towards its mode.
#[test]
fn test_triangular_skews_to_mode() {
    let mut rng = DmRng::with_seed(8);
    let t = DmTriangular::new(0.0, 1.0, 10.0).unwrap();
    let below = (0..2000).filter(|_| t.next_real(&mut rng) < 5.0).count();
    // P(x < 5) is about 0.72 for this shape
    assert!(below > 1200, "only {below} of 2000 samples below the midpoint");
    assert!(DmTriangular::new(0.0, 11.0, 10.0).is_err());
}

proptest! {
    /// Integer draws always fall in the half-open range.
    #[test]
    fn random_stays_in_half_open_range(seed in any::<u64>(), begin in -1000i64..1000, width in 1i64..500) {
        let mut rng = DmRng::with_seed(seed);
        for _ in 0..20 {
            let v = rng.random(begin, begin + width).unwrap();
            prop_assert!(v >= begin && v < begin + width);
        }
    }

    /// Uniform samples stay within their bounds.
    #[test]
    fn uniform_stays_in_bounds(seed in any::<u64>(), begin in -50.0f64..50.0, width in 0.5f64..100.0) {
        let mut rng = DmRng::with_seed(seed);
        let u = DmUniform::new(begin, begin + width).unwrap();
        for _ in 0..20 {
            let v = u.next_real(&mut rng);
            prop_assert!(v >= begin && v <= begin + width);
        }
    }
}
