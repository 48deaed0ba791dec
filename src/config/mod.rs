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

//! # Datamk Script Configuration Module
//!
//! Generation scripts are XML documents rooted at a `csvt` tag. This module
//! parses them into [`DmElement`] trees and provides the validation helpers
//! used by tag factories.
//!
//! ## Module Structure
//!
//! - [`element`]: Element tree and the `quick-xml` based parser
//! - [`checks`]: Attribute and child validation, typed attribute getters
//!
//! ## Script Shape
//!
//! ```xml
//! <csvt>
//!   <def name="rows" value="10"/>
//!   <gen name="people" count="10">
//!     <counter/>
//!     <rows values="alice,bob,carol"/>
//!   </gen>
//! </csvt>
//! ```

pub mod checks;
pub mod element;

pub use checks::*;
pub use element::{parse_file, parse_str, DmElement, DmNode};

/// Root tag of every script.
pub const DM_ROOT_TAG: &str = "csvt";
pub const GEN_TAG: &str = "gen";
pub const DEF_TAG: &str = "def";
pub const ECHO_TAG: &str = "echo";
pub const INCLUDE_TAG: &str = "include";

pub const ORDER_ATTRIB: &str = "order";
pub const COUNT_ATTRIB: &str = "count";
pub const FILE_ATTRIB: &str = "file";
pub const RANDOM_ATTRIB: &str = "random";
pub const BEGIN_ATTRIB: &str = "begin";
pub const END_ATTRIB: &str = "end";
pub const FIELDS_ATTRIB: &str = "fields";
pub const INC_ATTRIB: &str = "inc";
pub const DEBUG_ATTRIB: &str = "debug";
pub const NAME_ATTRIB: &str = "name";
pub const GEN_ATTRIB: &str = "gen";
pub const MIN_ATTRIB: &str = "min";
pub const MAX_ATTRIB: &str = "max";
pub const VALUE_ATTRIB: &str = "value";
pub const VALUES_ATTRIB: &str = "values";
pub const OUTPUT_ATTRIB: &str = "output";
pub const MODE_ATTRIB: &str = "mode";

pub const YES_STR: &str = "yes";
pub const NO_STR: &str = "no";
pub const ALL_STR: &str = "all";

/// Splits a comma list into trimmed, non-empty entries.
pub fn comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
