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

//! # Datamk Range Source
//!
//! `range` pulls a run of `n` rows from its children, with `n` drawn from
//! `width="min[,max]"`, and returns the first and last of the run joined
//! into one row. With `fill="yes"` every row of the run is kept.
//!
//! `continue="yes"` chains runs: the last row of one run becomes the first
//! row of the next, which is how consecutive date or time ranges are built.
//! The joined row may be ragged when widths vary.

use crate::config::{
    allow_attrs, comma_list, get_bool, get_order, require_attrs, require_children, DmElement,
    NO_STR, ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const WIDTH_ATTRIB: &str = "width";
const FILL_ATTRIB: &str = "fill";
const CONTINUE_ATTRIB: &str = "continue";

pub struct DmRange {
    inner: DmComposite,
    min: i64,
    max_exclusive: i64,
    fill: bool,
    chain: bool,
    carry: Option<DmRow>,
}

impl DmSource for DmRange {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let n = ctx.rng.random(self.min, self.max_exclusive)?;
        let mut row = match self.carry.take() {
            Some(carried) if self.chain => carried,
            _ => self.inner.concat(ctx)?,
        };
        for i in 1..n {
            let next = self.inner.concat(ctx)?;
            let final_pull = i == n - 1;
            if self.fill || final_pull {
                row.append_row(&next);
            }
            if self.chain && final_pull {
                self.carry = Some(next);
            }
        }
        Ok(self.inner.finish(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn reset(&mut self) {
        self.carry = None;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.carry = None;
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "range"
    }
}

/// Reads `width` as `min[,max]`; `max` defaults to `min`. Returns the
/// half-open bounds passed to the random draw.
fn get_width(e: &DmElement) -> Result<(i64, i64)> {
    let parts = comma_list(e.attr_or(WIDTH_ATTRIB, ""));
    let invalid = || DmError::config("Invalid width", e);
    if parts.is_empty() || parts.len() > 2 {
        return Err(invalid());
    }
    let min = parts[0].parse::<i64>().map_err(|_| invalid())?;
    let max = match parts.get(1) {
        Some(text) => text.parse::<i64>().map_err(|_| invalid())?,
        None => min,
    };
    if min < 1 || max < min {
        return Err(invalid());
    }
    let max_exclusive = max
        .checked_add(1)
        .ok_or_else(|| DmError::config(format!("Width {max} is too large"), e))?;
    Ok((min, max_exclusive))
}

pub fn range_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    require_attrs(e, &[WIDTH_ATTRIB])?;
    allow_attrs(e, &[ORDER_ATTRIB, WIDTH_ATTRIB, FILL_ATTRIB, CONTINUE_ATTRIB])?;
    let (min, max_exclusive) = get_width(e)?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmRange {
        inner,
        min,
        max_exclusive,
        fill: get_bool(e, FILL_ATTRIB, NO_STR)?,
        chain: get_bool(e, CONTINUE_ATTRIB, NO_STR)?,
        carry: None,
    }))
}
