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

//! `shuffle` materialises its children's rows and deals them out in random
//! order, each row exactly once per pass. A new pass starts when the deck
//! runs out.

use crate::config::{allow_attrs, get_order, require_children, DmElement, ORDER_ATTRIB};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmSource};

pub struct DmShuffle {
    inner: DmComposite,
    deck: Vec<DmRow>,
    /// Rows `[0, remaining)` have not been dealt in this pass.
    remaining: usize,
}

impl DmShuffle {
    fn populate(&mut self, ctx: &mut DmContext<'_>) -> Result<()> {
        if !self.deck.is_empty() {
            return Ok(());
        }
        let size = self.inner.max_size(ctx)?;
        for _ in 0..size.max(0) {
            let row = self.inner.concat(ctx)?;
            self.deck.push(row);
        }
        if self.deck.is_empty() {
            return Err(DmError::empty_result("Empty result set"));
        }
        self.remaining = 0;
        Ok(())
    }
}

impl DmSource for DmShuffle {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        self.populate(ctx)?;
        if self.remaining == 0 {
            self.remaining = self.deck.len();
        }
        let i = ctx.rng.random(0, self.remaining as i64)? as usize;
        self.remaining -= 1;
        self.deck.swap(i, self.remaining);
        let row = self.deck[self.remaining].clone();
        Ok(self.inner.finish(row))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        self.populate(ctx)?;
        Ok(self.deck.len() as i64)
    }

    fn reset(&mut self) {
        self.remaining = 0;
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.deck.clear();
        self.remaining = 0;
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "shuffle"
    }
}

pub fn shuffle_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    allow_attrs(e, &[ORDER_ATTRIB])?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmShuffle {
        inner,
        deck: Vec::new(),
        remaining: 0,
    }))
}
