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

//! # Datamk Source Module
//!
//! This module defines the pull protocol every node of a generation tree
//! implements, and the two reusable building blocks most tags are made of.
//!
//! ## Design Principles
//!
//! - **Pull based**: [`DmSource::get`] produces exactly one row per call and
//!   advances the node's state. Nothing is pushed.
//! - **Sizing is a hint**: [`DmSource::size`] reports a cardinality, or
//!   [`DM_NOSIZE`] when the node has none. Asking for the size may cause a
//!   node to materialise its rows.
//! - **Single ownership**: a parent owns its children outright. Cross-tree
//!   references are resolved by name through the [`DmContext`].
//!
//! ## Building Blocks
//!
//! - [`DmComposite`]: concatenates its children's rows, then reorders
//! - [`DmIntermediate`]: materialises a result set once through a
//!   [`DmPopulate`] hook and replays it sequentially or at random

use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;
use crate::row::DmRow;

/// Size reported by sources that have no cardinality.
pub const DM_NOSIZE: i64 = -1;

/// A node of a generation tree.
pub trait DmSource {
    /// Pulls the next row.
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow>;

    /// Cardinality hint, or [`DM_NOSIZE`].
    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64>;

    /// Rewinds sequential cursors, keeping materialised rows.
    fn reset(&mut self) {}

    /// Releases materialised rows and other buffered state.
    fn discard(&mut self) {}

    /// Most recently produced row.
    fn last(&self) -> &DmRow;

    /// Tag this node was built from.
    fn tag(&self) -> &str;
}

pub type DmBoxedSource = Box<dyn DmSource>;

/// Output reordering plus the last-row cache every source carries.
#[derive(Clone, Debug, Default)]
pub struct DmOrder {
    fields: DmFieldList,
    last: DmRow,
}

impl DmOrder {
    pub fn new(fields: DmFieldList) -> Self {
        Self {
            fields,
            last: DmRow::new(),
        }
    }

    /// Reorders `row` and remembers the result as the last row.
    pub fn apply(&mut self, row: DmRow) -> DmRow {
        let ordered = self.fields.order_row(&row);
        self.last = ordered.clone();
        ordered
    }

    pub fn last(&self) -> &DmRow {
        &self.last
    }
}

/// A source that owns an ordered list of children.
pub struct DmComposite {
    tag: String,
    order: DmOrder,
    children: Vec<DmBoxedSource>,
}

impl DmComposite {
    pub fn new(tag: impl Into<String>, order: DmFieldList) -> Self {
        Self {
            tag: tag.into(),
            order: DmOrder::new(order),
            children: Vec::new(),
        }
    }

    pub fn push(&mut self, child: DmBoxedSource) {
        self.children.push(child);
    }

    pub fn with_child(mut self, child: DmBoxedSource) -> Self {
        self.push(child);
        self
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn children_mut(&mut self) -> &mut [DmBoxedSource] {
        &mut self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut DmBoxedSource> {
        self.children.get_mut(index)
    }

    /// Pulls one row from every child, in order, and joins them unordered.
    pub fn concat(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let mut row = DmRow::new();
        for child in self.children.iter_mut() {
            let part = child.get(ctx)?;
            row.append_row(&part);
        }
        Ok(row)
    }

    /// Largest child size, or [`DM_NOSIZE`] without children.
    pub fn max_size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        let mut size = DM_NOSIZE;
        for child in self.children.iter_mut() {
            size = size.max(child.size(ctx)?);
        }
        Ok(size)
    }

    /// Applies this node's `order` and records the last row.
    pub fn finish(&mut self, row: DmRow) -> DmRow {
        self.order.apply(row)
    }
}

impl DmSource for DmComposite {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let row = self.concat(ctx)?;
        Ok(self.finish(row))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        self.max_size(ctx)
    }

    fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
    }

    fn discard(&mut self) {
        for child in self.children.iter_mut() {
            child.discard();
        }
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        &self.tag
    }
}

/// Materialisation hook of an [`DmIntermediate`].
pub trait DmPopulate {
    /// Produces the full result set from the node's children.
    fn populate(&mut self, children: &mut DmComposite, ctx: &mut DmContext<'_>)
        -> Result<Vec<DmRow>>;
}

/// A composite that materialises its rows before first use.
pub struct DmIntermediate<P> {
    inner: DmComposite,
    populator: P,
    random: bool,
    rows: Vec<DmRow>,
    pos: usize,
}

impl<P: DmPopulate> DmIntermediate<P> {
    pub fn new(inner: DmComposite, random: bool, populator: P) -> Self {
        Self {
            inner,
            populator,
            random,
            rows: Vec::new(),
            pos: 0,
        }
    }

    fn ensure_populated(&mut self, ctx: &mut DmContext<'_>) -> Result<()> {
        if self.rows.is_empty() {
            self.rows = self.populator.populate(&mut self.inner, ctx)?;
            self.pos = 0;
        }
        Ok(())
    }

    /// Materialised rows; empty until the first `get` or `size`.
    pub fn rows(&self) -> &[DmRow] {
        &self.rows
    }
}

impl<P: DmPopulate> DmSource for DmIntermediate<P> {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        self.ensure_populated(ctx)?;
        if self.rows.is_empty() {
            return Err(DmError::empty_result("Empty result set"));
        }
        let row = if self.random {
            self.rows[ctx.rng.raw() % self.rows.len()].clone()
        } else {
            let row = self.rows[self.pos].clone();
            self.pos = (self.pos + 1) % self.rows.len();
            row
        };
        Ok(self.inner.finish(row))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        self.ensure_populated(ctx)?;
        Ok(self.rows.len() as i64)
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.rows.clear();
        self.pos = 0;
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        self.inner.tag()
    }
}
