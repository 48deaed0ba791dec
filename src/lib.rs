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

//! # Datamk Core Library
//!
//! Datamk generates synthetic CSV test data from declarative XML scripts. A
//! script names generators; each generator is a tree of sources that is
//! pulled once per output row.
//!
//! ## Module Overview
//!
//! - **row**: copy-on-write [`DmRow`] values and row comparison
//! - **fields**: 1-based field lists used for ordering, projection and keys
//! - **random**: seeded generator plus uniform and triangular distributions
//! - **config**: script element tree, parser and validation helpers
//! - **source**: the pull protocol plus composite and materialising bases
//! - **sources**: every built-in tag
//! - **registry**: tag name to factory maps and the tree builder
//! - **generator** / **model** / **manager**: orchestration of a run
//! - **context**: session state (random generator, memories, output)
//! - **io**: output stream routing and CSV data files
//! - **logging**: the `log` sink used by the driver
//!
//! ## Quick Start
//!
//! ```rust
//! use datamk::{DmModelManager, DmRunMode, DmSession};
//!
//! let mut manager = DmModelManager::new();
//! manager
//!     .add_model_from_str(
//!         "<csvt>\
//!            <gen name='people' count='3'>\
//!              <counter/>\
//!              <rows values='alice,bob,carol' random='no'/>\
//!            </gen>\
//!          </csvt>",
//!         "people.xml",
//!         DmRunMode::GenForm,
//!     )
//!     .unwrap();
//! manager.run_models(&mut DmSession::with_seed(1)).unwrap();
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DmError>`. Script problems are reported
//! with the tag, file and line they were found at.

pub mod config;
pub mod context;
pub mod errors;
pub mod fields;
pub mod generator;
pub mod io;
pub mod logging;
pub mod manager;
pub mod model;
pub mod random;
pub mod registry;
pub mod row;
pub mod source;
pub mod sources;

pub use config::{parse_file, parse_str, DmElement};
pub use context::{DmContext, DmGeneratorLookup, DmRunConfig, DmRunMode, DmSeed, DmSession};
pub use errors::{DmError, Result};
pub use fields::{DmFieldList, DmFieldPairs};
pub use generator::DmGenerator;
pub use io::DmFileManager;
pub use manager::DmModelManager;
pub use model::DmModel;
pub use random::{DmDistribution, DmRng, DmTriangular, DmUniform};
pub use registry::{DmBuilder, DmRegistry};
pub use row::{compare_rows, DmRow};
pub use source::{DmBoxedSource, DmComposite, DmIntermediate, DmSource, DM_NOSIZE};
