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

//! # Datamk Unique Source
//!
//! Suppresses rows already produced, comparing only the `fields` columns when
//! given.
//!
//! The source has two modes, chosen by how it is first used:
//!
//! - **Sized**: asking for the size drains the children once (pulling as many
//!   rows as they report), keeps the first occurrence of each row, and from
//!   then on replays that set in order.
//! - **Streaming**: pulled without sizing, each `get` draws up to `retry + 1`
//!   rows looking for one not seen before and fails with
//!   [`DmError::DuplicateExhausted`] when none turns up.
//!
//! Rows streamed before a later size request are kept, so both orders end
//! with the same set of rows.

use std::collections::HashSet;

use crate::config::{
    allow_attrs, get_fields, get_int, get_order, require_children, DmElement, FIELDS_ATTRIB,
    ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;
use crate::registry::DmBuilder;
use crate::row::{row_key, DmRow};
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const RETRY_ATTRIB: &str = "retry";
/// Default number of extra pulls before giving up.
pub const DM_UNIQUE_RETRY: i64 = 100;

pub struct DmUnique {
    inner: DmComposite,
    fields: DmFieldList,
    attempts: usize,
    seen: HashSet<(usize, Vec<String>)>,
    rows: Vec<DmRow>,
    sized: bool,
    pos: usize,
}

impl DmUnique {
    /// Records `row`, returning false when an equal row was already seen.
    fn insert(&mut self, row: &DmRow) -> bool {
        self.seen.insert(row_key(row, self.fields.indices()))
    }
}

impl DmSource for DmUnique {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        if self.sized {
            if self.rows.is_empty() {
                return Err(DmError::empty_result("Empty result set"));
            }
            let row = self.rows[self.pos].clone();
            self.pos = (self.pos + 1) % self.rows.len();
            return Ok(self.inner.finish(row));
        }
        for _ in 0..self.attempts {
            let row = self.inner.concat(ctx)?;
            if self.insert(&row) {
                self.rows.push(row.clone());
                return Ok(self.inner.finish(row));
            }
        }
        Err(DmError::duplicate_exhausted(
            "cannot find enough unique values",
        ))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        if self.sized {
            return Ok(self.rows.len() as i64);
        }
        let n = self.inner.max_size(ctx)?;
        for _ in 0..n.max(0) {
            let row = self.inner.concat(ctx)?;
            if self.insert(&row) {
                self.rows.push(row);
            }
        }
        self.sized = true;
        self.pos = 0;
        if self.rows.is_empty() {
            return Err(DmError::empty_result("Empty result set"));
        }
        Ok(self.rows.len() as i64)
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.rows.clear();
        self.seen.clear();
        self.sized = false;
        self.pos = 0;
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "unique"
    }
}

pub fn unique_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB, FIELDS_ATTRIB, RETRY_ATTRIB])?;
    let retry = get_int(e, RETRY_ATTRIB, Some(&DM_UNIQUE_RETRY.to_string()))?;
    if retry < 0 {
        return Err(DmError::config("'retry' cannot be negative", e));
    }
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmUnique {
        inner,
        fields: get_fields(e, FIELDS_ATTRIB)?,
        attempts: retry as usize + 1,
        seen: HashSet::new(),
        rows: Vec::new(),
        sized: false,
        pos: 0,
    }))
}
