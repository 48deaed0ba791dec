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

//! `pick` pulls each row from a single child: in turn, uniformly at random,
//! or weighted by the percentages in `distribute`.

use crate::config::{
    allow_attrs, comma_list, get_order, get_random, require_children, DmElement, ORDER_ATTRIB,
    RANDOM_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const DISTRIBUTE_ATTRIB: &str = "distribute";

pub struct DmPick {
    inner: DmComposite,
    random: bool,
    weights: Vec<i64>,
    pos: usize,
}

impl DmPick {
    fn choose(&mut self, ctx: &mut DmContext<'_>) -> Result<usize> {
        let n = self.inner.child_count();
        if n == 0 {
            return Err(DmError::value("pick has no child sources"));
        }
        if !self.random {
            let i = self.pos % n;
            self.pos = (i + 1) % n;
            return Ok(i);
        }
        if self.weights.is_empty() {
            return Ok(ctx.rng.raw() % n);
        }
        let roll = ctx.rng.random(0, 100)?;
        let mut total = 0;
        for (i, weight) in self.weights.iter().enumerate() {
            total += weight;
            if roll < total {
                return Ok(i);
            }
        }
        Ok(n - 1)
    }
}

impl DmSource for DmPick {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let i = self.choose(ctx)?;
        let row = match self.inner.child_mut(i) {
            Some(child) => child.get(ctx)?,
            None => return Err(DmError::IndexOutOfRange { index: i, len: 0 }),
        };
        Ok(self.inner.finish(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "pick"
    }
}

/// Parses `distribute`: positive integers summing to 100.
fn get_weights(e: &DmElement) -> Result<Vec<i64>> {
    let mut weights = Vec::new();
    for value in comma_list(e.attr_or(DISTRIBUTE_ATTRIB, "")) {
        let n = value
            .parse::<i64>()
            .map_err(|_| DmError::config(format!("{value} not integer"), e))?;
        if n <= 0 {
            return Err(DmError::config(
                "Distribution value cannot be zero or less",
                e,
            ));
        }
        weights.push(n);
    }
    if !weights.is_empty() && weights.iter().sum::<i64>() != 100 {
        return Err(DmError::config("Values must total 100%", e));
    }
    Ok(weights)
}

pub fn pick_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    allow_attrs(e, &[RANDOM_ATTRIB, ORDER_ATTRIB, DISTRIBUTE_ATTRIB])?;
    require_children(e)?;
    let random = get_random(e, true)?;
    let weights = get_weights(e)?;
    if !weights.is_empty() && !random {
        return Err(DmError::config("Cannot have distribution", e));
    }
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    if !weights.is_empty() && weights.len() != inner.child_count() {
        return Err(DmError::config(
            "Distribution does not match source count",
            e,
        ));
    }
    Ok(Box::new(DmPick {
        inner,
        random,
        weights,
        pos: 0,
    }))
}
