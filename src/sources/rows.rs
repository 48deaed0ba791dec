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

//! Literal row sources: `row`, `rows` and `datafile`.

use std::path::PathBuf;

use crate::config::{
    allow_attrs, allow_child_tags, comma_list, forbid_children, get_int, get_order, get_random,
    require_attrs, DmElement, FILE_ATTRIB, ORDER_ATTRIB, RANDOM_ATTRIB, VALUES_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::io::{load_csv_rows, resolve_path};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmOrder, DmSource};

const FREQ_ATTRIB: &str = "freq";

/// A single fixed row.
pub struct DmRowSource {
    row: DmRow,
    order: DmOrder,
}

impl DmSource for DmRowSource {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        Ok(self.order.apply(self.row.clone()))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "row"
    }
}

/// `values` plus one value per text line; an empty tag yields one empty field.
pub fn row_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    allow_child_tags(e, &[])?;
    allow_attrs(e, &[ORDER_ATTRIB, VALUES_ATTRIB])?;
    let mut values = comma_list(e.attr_or(VALUES_ATTRIB, ""));
    values.extend(e.child_lines());
    let mut row = DmRow::from_fields(values);
    if row.is_empty() {
        row.push("");
    }
    Ok(Box::new(DmRowSource {
        row,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// A fixed list of rows, optionally weighted.
pub struct DmRowsSource {
    rows: Vec<DmRow>,
    freqs: Vec<i64>,
    random: bool,
    pos: usize,
    order: DmOrder,
}

impl DmRowsSource {
    fn weighted(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let n = ctx.rng.random(0, 100)?;
        let mut sum = 0;
        for (row, freq) in self.rows.iter().zip(self.freqs.iter()) {
            sum += freq;
            if n < sum {
                return Ok(row.clone());
            }
        }
        Err(DmError::value("frequency selection out of range"))
    }
}

impl DmSource for DmRowsSource {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let row = if self.random && !self.freqs.is_empty() {
            self.weighted(ctx)?
        } else if self.random {
            self.rows[ctx.rng.raw() % self.rows.len()].clone()
        } else {
            let row = self.rows[self.pos].clone();
            self.pos = (self.pos + 1) % self.rows.len();
            row
        };
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(self.rows.len() as i64)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "rows"
    }
}

pub fn rows_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    allow_child_tags(e, &[])?;
    allow_attrs(e, &[ORDER_ATTRIB, VALUES_ATTRIB, RANDOM_ATTRIB, FREQ_ATTRIB])?;

    let freq = get_int(e, FREQ_ATTRIB, Some("0"))?;
    if e.has_attr(FREQ_ATTRIB) && freq < 1 {
        return Err(DmError::config(
            format!("Invalid frequency column {freq}"),
            e,
        ));
    }
    let mut rows = Vec::new();
    for value in comma_list(e.attr_or(VALUES_ATTRIB, "")) {
        rows.push(DmRow::from_csv(&value).map_err(|err| err.at(e))?);
    }
    for line in e.child_lines() {
        rows.push(DmRow::from_csv(&line).map_err(|err| err.at(e))?);
    }
    if rows.is_empty() {
        rows.push(DmRow::from_fields([""]));
    }

    let mut freqs = Vec::new();
    if freq > 0 {
        let column = (freq - 1) as usize;
        let mut sum = 0;
        for row in rows.iter_mut() {
            let weight = row
                .get(column)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    DmError::config(format!("No valid frequency value in row {row}"), e)
                })?;
            if !(0..=100).contains(&weight) {
                return Err(DmError::config(
                    format!("Frequency value must be in range 0 to 100 {row}"),
                    e,
                ));
            }
            row.erase(column)?;
            freqs.push(weight);
            sum += weight;
        }
        if sum != 100 {
            return Err(DmError::config("Frequencies must sum to 100%", e));
        }
    }

    Ok(Box::new(DmRowsSource {
        rows,
        freqs,
        random: get_random(e, true)?,
        pos: 0,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Rows read lazily from a CSV file.
pub struct DmDataFile {
    path: PathBuf,
    lines: Vec<DmRow>,
    random: bool,
    pos: usize,
    order: DmOrder,
}

impl DmDataFile {
    fn populate(&mut self) -> Result<()> {
        if !self.lines.is_empty() {
            return Ok(());
        }
        self.lines = load_csv_rows(&self.path)?;
        self.pos = 0;
        if self.lines.is_empty() {
            return Err(DmError::empty_result(format!(
                "File {} is empty",
                self.path.display()
            )));
        }
        Ok(())
    }
}

impl DmSource for DmDataFile {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        self.populate()?;
        let row = if self.random {
            self.lines[ctx.rng.raw() % self.lines.len()].clone()
        } else {
            let row = self.lines[self.pos].clone();
            self.pos = (self.pos + 1) % self.lines.len();
            row
        };
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        self.populate()?;
        Ok(self.lines.len() as i64)
    }

    fn reset(&mut self) {
        self.pos = 0;
    }

    fn discard(&mut self) {
        self.lines.clear();
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "datafile"
    }
}

pub fn datafile_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    require_attrs(e, &[FILE_ATTRIB])?;
    allow_attrs(e, &[FILE_ATTRIB, ORDER_ATTRIB, RANDOM_ATTRIB])?;
    Ok(Box::new(DmDataFile {
        path: resolve_path(e.attr_or(FILE_ATTRIB, ""), e.file()),
        lines: Vec::new(),
        random: get_random(e, true)?,
        pos: 0,
        order: DmOrder::new(get_order(e)?),
    }))
}
