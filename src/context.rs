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

//! # Datamk Context Module
//!
//! Run-wide state shared by every pull of a generation pass.
//!
//! A [`DmSession`] owns the random generator, the named memory bank and the
//! output streams. Sources never reach for globals; each pull receives a
//! [`DmContext`] borrowing the session together with a [`DmGeneratorLookup`]
//! that resolves generator names to their buffered rows.
//!
//! [`DmRunConfig`] collects the settings a run is started with.
//!
//! ## Usage Example
//!
//! ```rust
//! use datamk::context::{DmRunConfig, DmRunMode, DmSeed, DmSession};
//!
//! let config = DmRunConfig::new().seed(DmSeed::Fixed(42)).mode(DmRunMode::GenOnly);
//! let mut session = DmSession::from_config(&config);
//! let ctx = session.context(&());
//! assert_eq!(ctx.rng.seed(), 42);
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DmError, Result};
use crate::io::DmFileManager;
use crate::logging::DmLogConfig;
use crate::random::DmRng;
use crate::row::DmRow;

/// Resolves generator names to their retained rows.
///
/// Lookups happen on every pull, never at build time, so a generator may refer
/// to one declared later in the script as long as that one has run first.
pub trait DmGeneratorLookup {
    /// Number of buffered rows of the named generator, `None` when unknown.
    fn generator_size(&self, name: &str) -> Result<Option<usize>>;

    /// Row `index` of the named generator, `None` when the name is unknown.
    fn generator_row(&self, name: &str, index: usize) -> Result<Option<DmRow>>;
}

/// A lookup that knows no generators.
impl DmGeneratorLookup for () {
    fn generator_size(&self, _name: &str) -> Result<Option<usize>> {
        Ok(None)
    }

    fn generator_row(&self, _name: &str, _index: usize) -> Result<Option<DmRow>> {
        Ok(None)
    }
}

/// Which rows a memory keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DmMemoryMode {
    All,
    First,
    Last,
}

impl FromStr for DmMemoryMode {
    type Err = DmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => Err(DmError::value(format!("invalid mode '{other}'"))),
        }
    }
}

/// Named row memories filled by `remember` and read by `recall`.
#[derive(Debug, Default)]
pub struct DmMemoryBank {
    slots: HashMap<String, Vec<DmRow>>,
}

impl DmMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` known before any row has been stored under it.
    pub fn declare(&mut self, name: &str) {
        self.slots.entry(name.to_string()).or_default();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn store(&mut self, name: &str, mode: DmMemoryMode, row: DmRow) {
        let slot = self.slots.entry(name.to_string()).or_default();
        match mode {
            DmMemoryMode::All => slot.push(row),
            DmMemoryMode::First if slot.is_empty() => slot.push(row),
            DmMemoryMode::First => {}
            DmMemoryMode::Last => {
                slot.clear();
                slot.push(row);
            }
        }
    }

    pub fn rows(&self, name: &str) -> Option<&[DmRow]> {
        self.slots.get(name).map(Vec::as_slice)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Owned run state.
#[derive(Debug, Default)]
pub struct DmSession {
    pub rng: DmRng,
    pub memory: DmMemoryBank,
    pub files: DmFileManager,
}

impl DmSession {
    pub fn new(rng: DmRng, files: DmFileManager) -> Self {
        Self {
            rng,
            memory: DmMemoryBank::new(),
            files,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(DmRng::with_seed(seed), DmFileManager::default())
    }

    pub fn from_config(config: &DmRunConfig) -> Self {
        let mut session = Self::new(config.seed.rng(), DmFileManager::default());
        session.files.set_muted(config.mode == DmRunMode::GenOnly);
        session
    }

    /// Borrows the session for a pass that resolves names through `generators`.
    pub fn context<'a>(&'a mut self, generators: &'a dyn DmGeneratorLookup) -> DmContext<'a> {
        DmContext {
            rng: &mut self.rng,
            memory: &mut self.memory,
            files: &mut self.files,
            generators,
        }
    }
}

/// Per-pull view of the session.
pub struct DmContext<'a> {
    pub rng: &'a mut DmRng,
    pub memory: &'a mut DmMemoryBank,
    pub files: &'a mut DmFileManager,
    pub generators: &'a dyn DmGeneratorLookup,
}

/// How a model is run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmRunMode {
    /// Build and validate only.
    CheckOnly,
    /// Generate with all output suppressed.
    GenOnly,
    /// Generate and write output.
    #[default]
    GenForm,
}

/// Random seed selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DmSeed {
    Fixed(u64),
    #[default]
    Time,
}

impl DmSeed {
    pub fn rng(&self) -> DmRng {
        match self {
            DmSeed::Fixed(n) => DmRng::with_seed(*n),
            DmSeed::Time => DmRng::from_clock(),
        }
    }
}

impl FromStr for DmSeed {
    type Err = DmError;

    /// Accepts an integer or `time`.
    fn from_str(s: &str) -> Result<Self> {
        if s == "time" {
            return Ok(DmSeed::Time);
        }
        s.parse::<i64>()
            .map(|n| DmSeed::Fixed(n as u64))
            .map_err(|_| DmError::value(format!("Invalid value for random seed: {s}")))
    }
}

/// Settings a run is started with.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DmRunConfig {
    pub seed: DmSeed,
    pub mode: DmRunMode,
    pub log: DmLogConfig,
}

impl DmRunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: DmSeed) -> Self {
        self.seed = seed;
        self
    }

    pub fn mode(mut self, mode: DmRunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn log(mut self, log: DmLogConfig) -> Self {
        self.log = log;
        self
    }
}
