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

//! # Datamk Generator Module
//!
//! A generator is a named top-level `gen` tag. Each row it emits is the
//! concatenation of one pull from every child source. Emitted rows are kept
//! in a shared buffer so that `recall` and `m2m` tags in later generators can
//! look them up by name and index.
//!
//! ## Row Count
//!
//! `count` fixes the number of rows. When it is absent (or `all`), the count
//! is the largest size reported by the children; children without a size
//! contribute nothing.
//!
//! ## Output
//!
//! - `fields` writes a header line before the first row
//! - `group` sorts the buffered rows on the listed columns (stable, string
//!   comparison) and writes them only after generation completes
//! - `output` names the output stream, `hide="yes"` selects the null sink
//! - `debug="yes"` echoes begin/end banners and every row to the debug stream

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::config::{
    allow_attrs, comma_list, get_bool, get_count, get_fields, get_output_file, require_children,
    DmElement, COUNT_ATTRIB, DEBUG_ATTRIB, FIELDS_ATTRIB, NAME_ATTRIB, NO_STR, OUTPUT_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::Result;
use crate::fields::DmFieldList;
use crate::io::DM_HIDE_NAME;
use crate::registry::DmBuilder;
use crate::row::{compare_rows, DmRow};
use crate::source::{DmComposite, DmSource};

const GROUP_ATTRIB: &str = "group";
const HIDE_ATTRIB: &str = "hide";

/// Rows emitted by a generator, shared with name lookups.
pub type DmRowBuffer = Rc<RefCell<Vec<DmRow>>>;

pub struct DmGenerator {
    name: String,
    count: Option<usize>,
    debug: bool,
    output: String,
    header: Vec<String>,
    group: DmFieldList,
    sources: DmComposite,
    rows: DmRowBuffer,
}

impl DmGenerator {
    pub fn new(name: impl Into<String>, sources: DmComposite) -> Self {
        Self {
            name: name.into(),
            count: None,
            debug: false,
            output: String::new(),
            header: Vec::new(),
            group: DmFieldList::default(),
            sources,
            rows: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn with_count(mut self, count: Option<usize>) -> Self {
        self.count = count;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_header(mut self, header: Vec<String>) -> Self {
        self.header = header;
        self
    }

    pub fn with_group(mut self, group: DmFieldList) -> Self {
        self.group = group;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Handle to the emitted rows.
    pub fn buffer(&self) -> DmRowBuffer {
        Rc::clone(&self.rows)
    }

    pub fn size(&self) -> usize {
        self.rows.borrow().len()
    }

    pub fn row_at(&self, index: usize) -> Option<DmRow> {
        self.rows.borrow().get(index).cloned()
    }

    fn row_count(&mut self, ctx: &mut DmContext<'_>) -> Result<usize> {
        if let Some(n) = self.count {
            return Ok(n);
        }
        let size = self.sources.max_size(ctx)?;
        if size < 0 {
            warn!(
                "generator '{}' has no count and no sized sources; producing no rows",
                self.name
            );
        }
        Ok(size.max(0) as usize)
    }

    /// Produces this generator's rows, replacing any from a previous run.
    pub fn generate(&mut self, ctx: &mut DmContext<'_>) -> Result<usize> {
        let n = self.row_count(ctx)?;
        self.rows.borrow_mut().clear();
        if self.debug {
            ctx.files.write_debug(&format!("----- begin {}", self.name))?;
        }
        if !self.header.is_empty() {
            let header = DmRow::from_fields(self.header.iter().map(String::as_str));
            if self.debug {
                ctx.files.write_debug(&header.debug_row())?;
            }
            ctx.files.write_row(&self.output, &header)?;
        }

        let grouped = !self.group.is_empty();
        for _ in 0..n {
            let row = self.sources.get(ctx)?;
            if self.debug {
                ctx.files.write_debug(&row.debug_row())?;
            }
            if !grouped {
                ctx.files.write_row(&self.output, &row)?;
            }
            self.rows.borrow_mut().push(row);
        }
        if grouped {
            let mut rows = self.rows.borrow_mut();
            rows.sort_by(|a, b| compare_rows(a, b, self.group.indices()));
            for row in rows.iter() {
                ctx.files.write_row(&self.output, row)?;
            }
        }

        if self.debug {
            ctx.files.write_debug(&format!("----- end   {}", self.name))?;
        }
        debug!("generator '{}' produced {} rows", self.name, n);
        Ok(n)
    }

    /// Lets the sources release intermediate results; emitted rows stay.
    pub fn discard(&mut self) {
        self.sources.discard();
    }
}

pub fn generator_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmGenerator> {
    require_children(e)?;
    allow_attrs(
        e,
        &[
            NAME_ATTRIB,
            COUNT_ATTRIB,
            GROUP_ATTRIB,
            DEBUG_ATTRIB,
            HIDE_ATTRIB,
            OUTPUT_ATTRIB,
            FIELDS_ATTRIB,
        ],
    )?;
    let output = match get_bool(e, HIDE_ATTRIB, NO_STR)? {
        true => DM_HIDE_NAME.to_string(),
        false => get_output_file(e),
    };
    let mut sources = DmComposite::new(e.name(), DmFieldList::default());
    b.add_children(e, &mut sources)?;
    Ok(DmGenerator::new(e.attr_or(NAME_ATTRIB, ""), sources)
        .with_count(get_count(e)?)
        .with_debug(get_bool(e, DEBUG_ATTRIB, NO_STR)?)
        .with_output(output)
        .with_header(comma_list(e.attr_or(FIELDS_ATTRIB, "")))
        .with_group(get_fields(e, GROUP_ATTRIB)?))
}
