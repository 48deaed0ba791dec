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

//! # Datamk Error Module
//!
//! This module defines the error types used throughout Datamk for consistent
//! error handling and reporting.
//!
//! ## Error Categories
//!
//! - **Config**: Malformed script structure, reported with tag, file and line
//! - **Value**: Invalid numeric, date or time literals and ranges
//! - **DuplicateExhausted**: Retry or combinatorial bound hit while deduplicating
//! - **EmptyResultSet**: A materialising source produced no rows
//! - **UnresolvedReference**: A named memory or generator could not be found
//! - **IndexOutOfRange**: Row or field bounds violated
//! - **InvalidFieldIndex / InvalidPairSpec**: Bad field list literals
//! - **InvalidRange**: Random range with `begin >= end`
//! - **UnknownTag**: No factory registered for a tag
//! - **TooManyIncludes**: Include expansion did not terminate
//! - **Io / Csv / Xml**: Failures from the surrounding collaborators
//!
//! Construction errors abort the build of a model. Run-time errors abort the
//! generation pass of the current model. Nothing is silently recovered.
//!
//! ## Usage
//!
//! ```rust
//! use datamk::errors::{DmError, Result};
//!
//! fn places(n: i32) -> Result<usize> {
//!     if !(0..=10).contains(&n) {
//!         return Err(DmError::value(format!("Invalid number of decimal places: {n}")));
//!     }
//!     Ok(n as usize)
//! }
//! ```

use std::io;

use thiserror::Error;

use crate::config::DmElement;

/// Convenience result type used throughout Datamk.
pub type Result<T> = std::result::Result<T, DmError>;

/// Canonical error enumeration for Datamk.
#[derive(Debug, Error)]
pub enum DmError {
    /// Script structure errors, always tied to the offending tag.
    #[error("XML tag '{tag}' {message} in {file} at line {line}")]
    Config {
        tag: String,
        message: String,
        file: String,
        line: usize,
    },

    /// Invalid literal or range values.
    #[error("{0}")]
    Value(String),

    #[error("{0}")]
    DuplicateExhausted(String),

    #[error("{0}")]
    EmptyResultSet(String),

    #[error("{0}")]
    UnresolvedReference(String),

    #[error("index {index} out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid field index '{0}'")]
    InvalidFieldIndex(String),

    #[error("invalid field pair '{0}'")]
    InvalidPairSpec(String),

    #[error("Invalid random number range [{begin}, {end})")]
    InvalidRange { begin: i64, end: i64 },

    #[error("Unknown tag: {0}")]
    UnknownTag(String),

    #[error("Too many includes")]
    TooManyIncludes,

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    #[error("csv error: {0}")]
    Csv(String),

    /// Parser errors, including include files.
    #[error("XML parser error: {0}")]
    Xml(String),
}

impl From<io::Error> for DmError {
    fn from(err: io::Error) -> Self {
        DmError::Io(err.to_string())
    }
}

impl From<csv::Error> for DmError {
    fn from(err: csv::Error) -> Self {
        DmError::Csv(err.to_string())
    }
}

impl From<quick_xml::Error> for DmError {
    fn from(err: quick_xml::Error) -> Self {
        DmError::Xml(err.to_string())
    }
}

impl DmError {
    /// Helper to construct a config error located at `element`.
    pub fn config(message: impl Into<String>, element: &DmElement) -> Self {
        DmError::Config {
            tag: element.name().to_string(),
            message: message.into(),
            file: element.file().to_string(),
            line: element.line(),
        }
    }

    /// Helper to construct value errors.
    pub fn value<T: Into<String>>(message: T) -> Self {
        DmError::Value(message.into())
    }

    pub fn duplicate_exhausted<T: Into<String>>(message: T) -> Self {
        DmError::DuplicateExhausted(message.into())
    }

    pub fn empty_result<T: Into<String>>(message: T) -> Self {
        DmError::EmptyResultSet(message.into())
    }

    pub fn unresolved<T: Into<String>>(message: T) -> Self {
        DmError::UnresolvedReference(message.into())
    }

    /// Re-anchors a value-style error at `element`, leaving located errors alone.
    pub fn at(self, element: &DmElement) -> Self {
        match self {
            DmError::Config { .. } => self,
            other => DmError::config(other.to_string(), element),
        }
    }
}
