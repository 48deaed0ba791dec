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

//! # Datamk Memory Sources
//!
//! `remember` passes its children's rows through while storing them in the
//! session's memory bank under a name. `recall` replays rows stored under a
//! name, or the buffered rows of a generator with that name when no memory
//! exists.
//!
//! Names resolve on every pull, so a `recall` may appear before the tag that
//! fills it as long as that tag runs first.

use crate::config::{
    allow_attrs, forbid_children, get_fields, get_order, get_random, require_attrs,
    require_children, DmElement, FIELDS_ATTRIB, MODE_ATTRIB, NAME_ATTRIB, ORDER_ATTRIB,
    RANDOM_ATTRIB,
};
use crate::context::{DmContext, DmMemoryMode};
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmOrder, DmSource};

pub struct DmRemember {
    inner: DmComposite,
    name: String,
    mode: DmMemoryMode,
    fields: DmFieldList,
}

impl DmSource for DmRemember {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let row = self.inner.get(ctx)?;
        let row = if self.fields.is_empty() {
            row
        } else {
            row.iter()
                .enumerate()
                .filter(|(i, _)| self.fields.contains(*i))
                .map(|(_, v)| v)
                .collect()
        };
        ctx.memory.store(&self.name, self.mode, row.clone());
        Ok(row)
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        self.inner.size(ctx)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "remember"
    }
}

pub fn remember_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    require_attrs(e, &[NAME_ATTRIB])?;
    allow_attrs(e, &[NAME_ATTRIB, MODE_ATTRIB, FIELDS_ATTRIB])?;
    let name = e.attr_or(NAME_ATTRIB, "").to_string();
    let mode = e
        .attr_or(MODE_ATTRIB, "all")
        .parse::<DmMemoryMode>()
        .map_err(|err| err.at(e))?;
    b.declare_memory(&name, e)?;
    let mut inner = DmComposite::new(e.name(), DmFieldList::default());
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmRemember {
        inner,
        name,
        mode,
        fields: get_fields(e, FIELDS_ATTRIB)?,
    }))
}

/// Replays a memory or a generator's rows.
pub struct DmRecall {
    name: String,
    random: bool,
    pos: usize,
    order: DmOrder,
}

impl DmRecall {
    fn resolved_size(&self, ctx: &DmContext<'_>) -> Result<usize> {
        if let Some(rows) = ctx.memory.rows(&self.name) {
            return Ok(rows.len());
        }
        ctx.generators.generator_size(&self.name)?.ok_or_else(|| {
            DmError::unresolved(format!("Cannot find memory/generator named '{}'", self.name))
        })
    }
}

impl DmSource for DmRecall {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let size = self.resolved_size(ctx)?;
        let from_memory = ctx.memory.contains(&self.name);
        if size == 0 {
            return Err(match from_memory {
                true => DmError::empty_result(format!("Memory '{}' is empty", self.name)),
                false => DmError::empty_result(format!("Generator '{}' has no data", self.name)),
            });
        }
        if self.random {
            self.pos = ctx.rng.raw() % size;
        }
        let index = self.pos % size;
        let row = match ctx.memory.rows(&self.name) {
            Some(rows) => rows[index].clone(),
            None => ctx
                .generators
                .generator_row(&self.name, index)?
                .ok_or(DmError::IndexOutOfRange { index, len: size })?,
        };
        self.pos = (index + 1) % size;
        Ok(self.order.apply(row))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(self.resolved_size(ctx)? as i64)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "recall"
    }
}

pub fn recall_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    require_attrs(e, &[NAME_ATTRIB])?;
    allow_attrs(e, &[ORDER_ATTRIB, NAME_ATTRIB, RANDOM_ATTRIB])?;
    Ok(Box::new(DmRecall {
        name: e.attr_or(NAME_ATTRIB, "").to_string(),
        random: get_random(e, true)?,
        pos: 0,
        order: DmOrder::new(get_order(e)?),
    }))
}
