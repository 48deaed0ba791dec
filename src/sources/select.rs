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

//! # Datamk Select Source
//!
//! `select` pulls a discriminator row from its first child and compares its
//! first field against the `values` of each following `case`, in order. The
//! first matching case is pulled and its row appended to the discriminator.
//! A case without `values` matches anything and serves as the default.
//!
//! ```xml
//! <select>
//!   <rows values="foo,bar"/>
//!   <case values="foo"><row values="was foo"/></case>
//!   <case><row values="something else"/></case>
//! </select>
//! ```
//!
//! `case` is only meaningful inside `select`; the registry maps it to a
//! factory that rejects it anywhere else.

use crate::config::{
    allow_attrs, comma_list, get_order, require_children, DmElement, ORDER_ATTRIB, VALUES_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmOrder, DmSource};

pub const CASE_TAG: &str = "case";

/// A branch of a `select`.
pub struct DmCase {
    values: Vec<String>,
    inner: DmComposite,
}

impl DmCase {
    fn from_element(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<Self> {
        allow_attrs(e, &[ORDER_ATTRIB, VALUES_ATTRIB])?;
        require_children(e)?;
        let mut inner = DmComposite::new(e.name(), get_order(e)?);
        b.add_children(e, &mut inner)?;
        Ok(Self {
            values: comma_list(e.attr_or(VALUES_ATTRIB, "")),
            inner,
        })
    }

    /// Matches on the first field of `row`.
    pub fn matches(&self, row: &DmRow) -> bool {
        if self.values.is_empty() {
            return true;
        }
        row.get(0)
            .is_some_and(|first| self.values.iter().any(|v| v == first))
    }
}

pub struct DmSelect {
    discriminator: DmBoxedSource,
    cases: Vec<DmCase>,
    order: DmOrder,
}

impl DmSource for DmSelect {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let mut row = self.discriminator.get(ctx)?;
        let Some(case) = self.cases.iter_mut().find(|c| c.matches(&row)) else {
            return Err(DmError::value(format!(
                "No matching case for '{}'",
                row.get(0).unwrap_or("")
            )));
        };
        let part = case.inner.get(ctx)?;
        row.append_row(&part);
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn reset(&mut self) {
        self.discriminator.reset();
        for case in self.cases.iter_mut() {
            case.inner.reset();
        }
    }

    fn discard(&mut self) {
        self.discriminator.discard();
        for case in self.cases.iter_mut() {
            case.inner.discard();
        }
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "select"
    }
}

pub fn select_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    allow_attrs(e, &[ORDER_ATTRIB])?;
    require_children(e)?;
    let kids: Vec<&DmElement> = e.child_elements().collect();
    let well_formed = kids.len() >= 2
        && kids[0].name() != CASE_TAG
        && kids[1..].iter().all(|k| k.name() == CASE_TAG);
    if !well_formed {
        return Err(DmError::config("Invalid select structure", e));
    }
    let discriminator = b.build_source(kids[0])?;
    let cases = kids[1..]
        .iter()
        .map(|k| DmCase::from_element(k, b))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(DmSelect {
        discriminator,
        cases,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Rejects a `case` reached through ordinary child construction.
pub fn case_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    Err(DmError::config("case must be part of select", e))
}
