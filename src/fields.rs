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

//! # Datamk Field Selection Module
//!
//! Field lists are written in scripts as 1-based comma lists (`"3,1,2"`) and
//! held here as zero-based indices. They drive column reordering (`order`),
//! key selection (`fields`) and join pairing (`1:1,2:4`).

use crate::config::comma_list;
use crate::errors::{DmError, Result};
use crate::row::DmRow;

fn validate_field(text: &str) -> Result<usize> {
    match text.parse::<i64>() {
        Ok(n) if n > 0 => Ok((n - 1) as usize),
        _ => Err(DmError::InvalidFieldIndex(text.to_string())),
    }
}

/// Ordered zero-based column indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DmFieldList {
    fields: Vec<usize>,
}

impl DmFieldList {
    /// Parses a 1-based comma list. An empty list selects all fields.
    pub fn parse(spec: &str) -> Result<Self> {
        let fields = comma_list(spec)
            .iter()
            .map(|f| validate_field(f))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }

    pub fn from_indices(fields: Vec<usize>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn at(&self, i: usize) -> Option<usize> {
        self.fields.get(i).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.fields.contains(&index)
    }

    pub fn indices(&self) -> &[usize] {
        &self.fields
    }

    /// Builds a row holding one value per listed index, using an empty
    /// string for indices past the end of `row`.
    pub fn order_row(&self, row: &DmRow) -> DmRow {
        self.order_row_with(row, "")
    }

    pub fn order_row_with(&self, row: &DmRow, fallback: &str) -> DmRow {
        if self.fields.is_empty() {
            return row.clone();
        }
        self.fields
            .iter()
            .map(|&idx| row.get(idx).unwrap_or(fallback).to_string())
            .collect()
    }
}

/// Left/right column pairs used to join two rows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DmFieldPairs {
    left: Vec<usize>,
    right: Vec<usize>,
}

impl DmFieldPairs {
    /// Parses `"1:1,3:4"` style pair lists.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut pairs = Self::default();
        for pair in comma_list(spec) {
            let parts: Vec<&str> = pair.split(':').map(str::trim).collect();
            if parts.len() != 2 {
                return Err(DmError::InvalidPairSpec(pair));
            }
            pairs.left.push(validate_field(parts[0])?);
            pairs.right.push(validate_field(parts[1])?);
        }
        Ok(pairs)
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left(&self) -> &[usize] {
        &self.left
    }

    pub fn right(&self) -> &[usize] {
        &self.right
    }
}
