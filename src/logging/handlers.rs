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

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;

use crate::errors::{DmError, Result};

/// Destination for formatted log lines.
pub trait DmLogHandler {
    fn handle(&self, line: &str);

    fn flush(&self) {}
}

/// Writes to stderr so log lines never mix with generated rows on stdout.
pub struct DmStderrHandler;

impl DmLogHandler for DmStderrHandler {
    fn handle(&self, line: &str) {
        let _ = writeln!(io::stderr().lock(), "{line}");
    }
}

/// Appends to a log file.
pub struct DmFileHandler {
    file: Mutex<File>,
}

impl DmFileHandler {
    pub fn open(path: &str) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| DmError::Io(format!("Cannot open log file {path}: {e}")))?;
        Ok(DmFileHandler {
            file: Mutex::new(file),
        })
    }
}

impl DmLogHandler for DmFileHandler {
    fn handle(&self, line: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "{line}");
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}
