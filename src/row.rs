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

//! # Datamk Row Module
//!
//! This module provides [`DmRow`], the unit of data pulled through every
//! source tree. A row is an ordered tuple of string fields.
//!
//! ## Design Principles
//!
//! - **Value semantics**: Cloning a row is O(1). Storage is shared behind an
//!   `Rc` and copied on the first mutation of a shared row, so holders of
//!   earlier clones never observe a change.
//! - **Self append**: Appending a row to a clone of itself snapshots the
//!   source fields before the destination is mutated.
//! - **CSV aware**: Rows parse from and render to single CSV lines using the
//!   `csv` crate with minimal quoting.
//!
//! ## Usage Example
//!
//! ```rust
//! use datamk::row::DmRow;
//!
//! let mut row = DmRow::from_csv("one,two").unwrap();
//! let copy = row.clone();
//! row.push("three");
//!
//! assert_eq!(row.len(), 3);
//! assert_eq!(copy.len(), 2);
//! assert_eq!(row.as_csv(), "one,two,three");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::errors::{DmError, Result};

/// Copy-on-write row of string fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DmRow {
    fields: Rc<Vec<String>>,
}

impl DmRow {
    /// Creates a row with zero fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a row owning `fields`.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Rc::new(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Parses a single CSV line into a row.
    ///
    /// An empty line yields a row holding one empty field, matching how a
    /// blank value list is read elsewhere in a script.
    pub fn from_csv(line: &str) -> Result<Self> {
        let mut row = Self::new();
        row.append_csv(line)?;
        Ok(row)
    }

    /// Appends every value of the CSV `line` as a new field.
    pub fn append_csv(&mut self, line: &str) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let mut parsed = Vec::new();
        if let Some(record) = reader.records().next() {
            parsed.extend(record?.iter().map(str::to_string));
        }
        if parsed.is_empty() {
            parsed.push(String::new());
        }
        Rc::make_mut(&mut self.fields).extend(parsed);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field at `index`, failing when it is out of range.
    pub fn at(&self, index: usize) -> Result<&str> {
        self.fields
            .get(index)
            .map(String::as_str)
            .ok_or(DmError::IndexOutOfRange {
                index,
                len: self.len(),
            })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Appends a single value.
    pub fn push(&mut self, value: impl Into<String>) {
        Rc::make_mut(&mut self.fields).push(value.into());
    }

    /// Appends all fields of `other`.
    ///
    /// `other` may share storage with `self`; its fields are pinned by an
    /// extra handle before `self` is made unique.
    pub fn append_row(&mut self, other: &DmRow) {
        let source = Rc::clone(&other.fields);
        Rc::make_mut(&mut self.fields).extend(source.iter().cloned());
    }

    /// Removes the field at `index`.
    pub fn erase(&mut self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(DmError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Rc::make_mut(&mut self.fields).remove(index);
        Ok(())
    }

    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.fields = Rc::new(Vec::new());
        }
    }

    /// Returns true when the two rows share the same storage.
    pub fn shares_storage(&self, other: &DmRow) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }

    /// Renders the row as one CSV line, quoting only where needed.
    pub fn as_csv(&self) -> String {
        let mut line = String::new();
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&quote_field(field));
        }
        line
    }

    /// Renders the row as `[1:v][2:v]` for debug banners.
    pub fn debug_row(&self) -> String {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("[{}:{}]", i + 1, f))
            .collect()
    }
}

fn quote_field(field: &str) -> String {
    if field.is_empty() {
        return String::new();
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    if writer.write_field(field).is_err() {
        return field.to_string();
    }
    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => field.to_string(),
    }
}

impl fmt::Display for DmRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in self.fields.iter() {
            write!(f, "[{field}]")?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for DmRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_fields(iter)
    }
}

/// Compares two rows over an optional index subset.
///
/// Fields are compared lexicographically; `fields` restricts the comparison
/// to the listed zero-based indices when non-empty, visited in column order.
/// When every compared field is equal, a strictly longer left row compares
/// greater, and a left row that is shorter or equal in length compares less
/// or equal respectively. Listed indices beyond the shorter row are skipped.
pub fn compare_rows(r1: &DmRow, r2: &DmRow, fields: &[usize]) -> Ordering {
    let compared = |limit: usize| -> Ordering {
        for i in 0..limit {
            if !fields.is_empty() && !fields.contains(&i) {
                continue;
            }
            let ord = r1.fields[i].cmp(&r2.fields[i]);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    };

    if r1.len() <= r2.len() {
        match compared(r1.len()) {
            Ordering::Equal if r1.len() < r2.len() => Ordering::Less,
            ord => ord,
        }
    } else {
        match compared(r2.len()) {
            Ordering::Equal => Ordering::Greater,
            ord => ord,
        }
    }
}

/// Hashable key under which two rows are equal exactly when
/// [`compare_rows`] reports them equal for the same `fields`.
pub fn row_key(row: &DmRow, fields: &[usize]) -> (usize, Vec<String>) {
    let values = row
        .fields
        .iter()
        .enumerate()
        .filter(|(i, _)| fields.is_empty() || fields.contains(i))
        .map(|(_, v)| v.clone())
        .collect();
    (row.len(), values)
}
