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

//! # Datamk Many-To-Many Source
//!
//! `m2m` joins rows of two previously run generators, named by its `left` and
//! `right` children. Each side contributes the columns listed in its `fields`
//! attribute (the first column by default).
//!
//! ```xml
//! <m2m random="no">
//!   <left gen="people" fields="1"/>
//!   <right gen="roles"/>
//! </m2m>
//! ```
//!
//! ## Modes
//!
//! - **Sequential**: pairs are enumerated row-major over
//!   `left_size x right_size` and wrap around.
//! - **Random**: each pull draws a random pair.
//!
//! With `unique="yes"` (the default) no pair is produced twice. Sequential
//! mode fails once every pair has been used; random mode fails after
//! [`DM_M2M_DRAWS`] draws in a row hit pairs already produced.

use std::collections::HashSet;

use crate::config::{
    allow_attrs, forbid_children, get_bool, get_fields, get_order, require_attrs,
    require_child_count, DmElement, FIELDS_ATTRIB, GEN_ATTRIB, ORDER_ATTRIB, RANDOM_ATTRIB,
    YES_STR,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmOrder, DmSource, DM_NOSIZE};

const LEFT_TAG: &str = "left";
const RIGHT_TAG: &str = "right";
const UNIQUE_ATTRIB: &str = "unique";

/// Draws attempted per random pull before giving up on finding a new pair.
pub const DM_M2M_DRAWS: usize = 21;

/// One side of the join.
#[derive(Debug, Clone)]
pub struct DmSide {
    generator: String,
    fields: DmFieldList,
}

impl DmSide {
    fn from_element(e: &DmElement) -> Result<Self> {
        forbid_children(e)?;
        require_attrs(e, &[GEN_ATTRIB])?;
        allow_attrs(e, &[GEN_ATTRIB, FIELDS_ATTRIB])?;
        let fields = match e.has_attr(FIELDS_ATTRIB) {
            true => get_fields(e, FIELDS_ATTRIB)?,
            false => DmFieldList::from_indices(vec![0]),
        };
        Ok(Self {
            generator: e.attr_or(GEN_ATTRIB, "").to_string(),
            fields,
        })
    }

    fn size(&self, ctx: &DmContext<'_>) -> Result<usize> {
        let size = ctx
            .generators
            .generator_size(&self.generator)?
            .ok_or_else(|| {
                DmError::unresolved(format!("Unknown generator: {}", self.generator))
            })?;
        if size == 0 {
            return Err(DmError::empty_result(format!(
                "Generator '{}' has no data",
                self.generator
            )));
        }
        Ok(size)
    }

    fn row(&self, ctx: &DmContext<'_>, index: usize) -> Result<DmRow> {
        let row = ctx
            .generators
            .generator_row(&self.generator, index)?
            .ok_or_else(|| {
                DmError::unresolved(format!("Unknown generator: {}", self.generator))
            })?;
        Ok(self.fields.order_row(&row))
    }
}

pub struct DmManyToMany {
    left: DmSide,
    right: DmSide,
    random: bool,
    unique: bool,
    produced: usize,
    pairs: HashSet<DmRow>,
    order: DmOrder,
}

impl DmManyToMany {
    fn join(&self, ctx: &DmContext<'_>, li: usize, ri: usize) -> Result<DmRow> {
        let mut row = self.left.row(ctx, li)?;
        row.append_row(&self.right.row(ctx, ri)?);
        Ok(row)
    }

    fn next_sequential(
        &mut self,
        ctx: &DmContext<'_>,
        lsize: usize,
        rsize: usize,
    ) -> Result<DmRow> {
        let total = lsize * rsize;
        if self.unique && self.produced >= total {
            return Err(DmError::duplicate_exhausted("Duplicate in many to many"));
        }
        // Row-major walk: the right cursor advances on every row and wraps,
        // the left cursor advances each time the right one wraps.
        let k = self.produced % total;
        self.produced += 1;
        self.join(ctx, k / rsize, k % rsize)
    }

    fn next_random(
        &mut self,
        ctx: &mut DmContext<'_>,
        lsize: usize,
        rsize: usize,
    ) -> Result<DmRow> {
        let draws = if self.unique { DM_M2M_DRAWS } else { 1 };
        for _ in 0..draws {
            let li = ctx.rng.random(0, lsize as i64)? as usize;
            let ri = ctx.rng.random(0, rsize as i64)? as usize;
            let row = self.join(ctx, li, ri)?;
            if !self.unique || self.pairs.insert(row.clone()) {
                return Ok(row);
            }
        }
        Err(DmError::duplicate_exhausted(
            "Duplicate row in many to many",
        ))
    }
}

impl DmSource for DmManyToMany {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let lsize = self.left.size(ctx)?;
        let rsize = self.right.size(ctx)?;
        let row = if self.random {
            self.next_random(ctx, lsize, rsize)?
        } else {
            self.next_sequential(ctx, lsize, rsize)?
        };
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(DM_NOSIZE)
    }

    fn reset(&mut self) {
        self.produced = 0;
    }

    fn discard(&mut self) {
        self.produced = 0;
        self.pairs.clear();
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "m2m"
    }
}

pub fn m2m_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_child_count(e, 2)?;
    allow_attrs(e, &[ORDER_ATTRIB, UNIQUE_ATTRIB, RANDOM_ATTRIB])?;
    let mut left = None;
    let mut right = None;
    for child in e.child_elements() {
        let slot = match child.name() {
            LEFT_TAG => &mut left,
            RIGHT_TAG => &mut right,
            other => {
                return Err(DmError::config(format!("Invalid tag name {other}"), child));
            }
        };
        if slot.is_some() {
            return Err(DmError::config(format!("Duplicate {} tag", child.name()), child));
        }
        *slot = Some(DmSide::from_element(child)?);
    }
    let (Some(left), Some(right)) = (left, right) else {
        return Err(DmError::config("requires one left and one right tag", e));
    };
    Ok(Box::new(DmManyToMany {
        left,
        right,
        random: get_bool(e, RANDOM_ATTRIB, YES_STR)?,
        unique: get_bool(e, UNIQUE_ATTRIB, YES_STR)?,
        produced: 0,
        pairs: HashSet::new(),
        order: DmOrder::new(get_order(e)?),
    }))
}
