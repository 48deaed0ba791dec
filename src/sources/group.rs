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

//! # Datamk Group Source
//!
//! The first child supplies group rows; they are drawn in full, stably sorted
//! on `fields`, and handed out in that order. Every time the group key
//! changes, the remaining children are reset so that their sequences restart
//! for the new group. `reset` lists (1-based, over all children) which of them
//! to rewind; without it all of them are.
//!
//! Keys compare as strings, so `10` sorts before `9`.

use crate::config::{
    allow_attrs, get_fields, get_order, require_children, DmElement, FIELDS_ATTRIB, ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;
use crate::registry::DmBuilder;
use crate::row::{compare_rows, DmRow};
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const RESET_ATTRIB: &str = "reset";

pub struct DmGroup {
    inner: DmComposite,
    fields: DmFieldList,
    reset: DmFieldList,
    sorted: Vec<DmRow>,
    pos: usize,
    key: Option<DmRow>,
}

impl DmGroup {
    fn populate(&mut self, ctx: &mut DmContext<'_>) -> Result<()> {
        if !self.sorted.is_empty() {
            return Ok(());
        }
        let Some(group) = self.inner.child_mut(0) else {
            return Err(DmError::value("group requires a child source"));
        };
        let size = group.size(ctx)?;
        let mut rows = (0..size.max(0))
            .map(|_| group.get(ctx))
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Err(DmError::empty_result("Empty result set"));
        }
        let fields = self.fields.indices();
        rows.sort_by(|a, b| compare_rows(a, b, fields));
        self.sorted = rows;
        self.pos = 0;
        Ok(())
    }

    fn rewind_members(&mut self) {
        let reset = &self.reset;
        for (i, child) in self.inner.children_mut().iter_mut().enumerate().skip(1) {
            if reset.is_empty() || reset.contains(i) {
                child.reset();
            }
        }
    }
}

impl DmSource for DmGroup {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        self.populate(ctx)?;
        let mut row = self.sorted[self.pos].clone();
        self.pos = (self.pos + 1) % self.sorted.len();

        let changed = match &self.key {
            Some(key) => compare_rows(key, &row, self.fields.indices()).is_ne(),
            None => true,
        };
        if changed {
            self.rewind_members();
            self.key = Some(row.clone());
        }
        for child in self.inner.children_mut().iter_mut().skip(1) {
            let part = child.get(ctx)?;
            row.append_row(&part);
        }
        Ok(self.inner.finish(row))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        match self.inner.child_mut(0) {
            Some(group) => group.size(ctx),
            None => Ok(0),
        }
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.key = None;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.sorted.clear();
        self.pos = 0;
        self.key = None;
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "group"
    }
}

pub fn group_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB, FIELDS_ATTRIB, RESET_ATTRIB])?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmGroup {
        inner,
        fields: get_fields(e, FIELDS_ATTRIB)?,
        reset: get_fields(e, RESET_ATTRIB)?,
        sorted: Vec::new(),
        pos: 0,
        key: None,
    }))
}
