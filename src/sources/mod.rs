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

//! # Sources Module
//!
//! This module contains every built-in tag that can appear inside a `gen`.
//! Each submodule exposes one factory per tag, registered by
//! [`register_defaults`].
//!
//! ## Source Categories
//!
//! - **rows**: literal rows (`row`, `rows`) and CSV files (`datafile`)
//! - **compose**: concatenation (`compose`) and field joining (`merge`)
//! - **sequence**: `counter`, `int_seq`, `real_seq`, `rand_int`, `rand_real`
//! - **dates** / **times**: calendar and time-of-day sequences and samples
//! - **mask**: character-class masks (`mask`) and template masks (`masked`)
//! - **product**: cartesian product (`product`) and set union (`union`)
//! - **unique**: duplicate suppression
//! - **group**: sort-and-group with member resets
//! - **many2many**: joins of two generators (`m2m`)
//! - **pick**: round-robin or weighted choice among children
//! - **range**: runs of consecutive rows
//! - **shuffle**: random permutation
//! - **select**: discriminated choice (`select` / `case`)
//! - **memory**: named stores (`remember` / `recall`)
//! - **eval**: expression evaluation through a pluggable compiler

pub mod compose;
pub mod dates;
pub mod eval;
pub mod group;
pub mod many2many;
pub mod mask;
pub mod memory;
pub mod pick;
pub mod product;
pub mod range;
pub mod rows;
pub mod select;
pub mod sequence;
pub mod shuffle;
pub mod times;
pub mod unique;

use crate::registry::{DmRegistry, DmSourceFactory};

/// Tag name and factory of every built-in source.
const BUILTIN_SOURCES: &[(&str, DmSourceFactory)] = &[
    ("row", rows::row_factory),
    ("rows", rows::rows_factory),
    ("datafile", rows::datafile_factory),
    ("compose", compose::compose_factory),
    ("merge", compose::merge_factory),
    ("counter", sequence::counter_factory),
    ("int_seq", sequence::int_seq_factory),
    ("real_seq", sequence::real_seq_factory),
    ("rand_int", sequence::rand_int_factory),
    ("rand_real", sequence::rand_real_factory),
    ("date_seq", dates::date_seq_factory),
    ("rand_date", dates::rand_date_factory),
    ("random_date", dates::rand_date_factory),
    ("time_seq", times::time_seq_factory),
    ("rand_time", times::rand_time_factory),
    ("mask", mask::mask_factory),
    ("masked", mask::masked_factory),
    ("product", product::product_factory),
    ("union", product::union_factory),
    ("unique", unique::unique_factory),
    ("group", group::group_factory),
    ("m2m", many2many::m2m_factory),
    ("pick", pick::pick_factory),
    ("range", range::range_factory),
    ("shuffle", shuffle::shuffle_factory),
    ("select", select::select_factory),
    (select::CASE_TAG, select::case_factory),
    ("remember", memory::remember_factory),
    ("recall", memory::recall_factory),
    ("eval", eval::eval_factory),
];

/// Registers every built-in source tag.
pub fn register_defaults(registry: &mut DmRegistry) {
    for (tag, factory) in BUILTIN_SOURCES {
        registry.register_source(tag, *factory);
    }
}
