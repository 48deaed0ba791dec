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

//! # Datamk Set Sources
//!
//! `product` and `union` both materialise their result before the first row
//! is handed out, then replay it sequentially or at random.
//!
//! - **product**: every row of the first child joined with every row of the
//!   second, row-major
//! - **union**: the distinct rows of all children, in first-seen order
//!
//! Every child must report a positive size; the reported number of rows is
//! pulled from each.

use log::debug;

use crate::config::{
    allow_attrs, get_order, get_random, require_child_count, require_children, DmElement,
    ORDER_ATTRIB, RANDOM_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmIntermediate, DmPopulate, DmSource};

/// Pulls `child.size()` rows from a child that must have a positive size.
fn drain(
    child: &mut DmBoxedSource,
    position: usize,
    ctx: &mut DmContext<'_>,
) -> Result<Vec<DmRow>> {
    let size = child.size(ctx)?;
    if size <= 0 {
        return Err(DmError::value(format!(
            "source {} <{}> has no size",
            position + 1,
            child.tag()
        )));
    }
    (0..size).map(|_| child.get(ctx)).collect()
}

#[derive(Debug, Default)]
pub struct DmProduct;

impl DmPopulate for DmProduct {
    fn populate(
        &mut self,
        children: &mut DmComposite,
        ctx: &mut DmContext<'_>,
    ) -> Result<Vec<DmRow>> {
        let [left, right] = children.children_mut() else {
            return Err(DmError::value("product requires exactly two child sources"));
        };
        let outer = drain(left, 0, ctx)?;
        let inner = drain(right, 1, ctx)?;
        let mut rows = Vec::with_capacity(outer.len() * inner.len());
        for l in &outer {
            for r in &inner {
                let mut row = l.clone();
                row.append_row(r);
                rows.push(row);
            }
        }
        left.discard();
        right.discard();
        debug!("product materialised {} rows", rows.len());
        Ok(rows)
    }
}

pub fn product_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB, RANDOM_ATTRIB])?;
    require_child_count(e, 2)?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmIntermediate::new(inner, get_random(e, false)?, DmProduct)))
}

#[derive(Debug, Default)]
pub struct DmUnion;

impl DmPopulate for DmUnion {
    fn populate(
        &mut self,
        children: &mut DmComposite,
        ctx: &mut DmContext<'_>,
    ) -> Result<Vec<DmRow>> {
        let mut rows: Vec<DmRow> = Vec::new();
        for (i, child) in children.children_mut().iter_mut().enumerate() {
            for row in drain(child, i, ctx)? {
                if !rows.contains(&row) {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }
}

pub fn union_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB, RANDOM_ATTRIB])?;
    if e.child_elements().count() < 2 {
        return Err(DmError::config("requires at least two child sources", e));
    }
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmIntermediate::new(inner, get_random(e, false)?, DmUnion)))
}
