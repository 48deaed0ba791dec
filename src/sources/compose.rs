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

//! Plain concatenation (`compose`) and field merging (`merge`).

use crate::config::{allow_attrs, get_order, require_children, DmElement, ORDER_ATTRIB};
use crate::context::DmContext;
use crate::errors::Result;
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const SEP_ATTRIB: &str = "sep";

pub fn compose_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB])?;
    let mut composite = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut composite)?;
    Ok(Box::new(composite))
}

/// Joins the non-empty fields of its children into a single field.
pub struct DmMerge {
    inner: DmComposite,
    sep: String,
}

impl DmSource for DmMerge {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let row = self.inner.concat(ctx)?;
        let joined = row
            .iter()
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(&self.sep);
        Ok(self.inner.finish(DmRow::from_fields([joined])))
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
        "merge"
    }
}

pub fn merge_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB, SEP_ATTRIB])?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmMerge {
        inner,
        sep: e.attr_or(SEP_ATTRIB, " ").to_string(),
    }))
}
