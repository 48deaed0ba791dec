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

//! # Datamk IO Module
//!
//! Output stream routing and data file loading.
//!
//! [`DmFileManager`] maps output names used by generators to writable sinks:
//!
//! - `""` is the default output, normally stdout
//! - `"hide"` is a null sink
//! - any other name is a file, created on first use and kept open for the run
//!
//! A muted manager accepts writes and discards them, which is how generate-only
//! runs keep rows for cross references without producing output.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::errors::{DmError, Result};
use crate::row::DmRow;

/// Name of the null sink.
pub const DM_HIDE_NAME: &str = "hide";
/// Name of the default output.
pub const DM_STDOUT_NAME: &str = "";

/// Shared in-memory sink, handy for capturing output in tests and embedders.
#[derive(Clone, Debug, Default)]
pub struct DmCapture {
    buffer: Rc<RefCell<Vec<u8>>>,
}

impl DmCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for DmCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes output names to sinks.
pub struct DmFileManager {
    default_out: Box<dyn Write>,
    debug_out: Box<dyn Write>,
    streams: HashMap<String, Box<dyn Write>>,
    muted: bool,
}

impl Default for DmFileManager {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

impl std::fmt::Debug for DmFileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DmFileManager")
            .field("streams", &self.streams.keys().collect::<Vec<_>>())
            .field("muted", &self.muted)
            .finish()
    }
}

impl DmFileManager {
    /// Creates a manager writing the default output to `default_out`.
    pub fn new(default_out: Box<dyn Write>) -> Self {
        Self {
            default_out,
            debug_out: Box::new(io::stderr()),
            streams: HashMap::new(),
            muted: false,
        }
    }

    /// Creates a manager whose default and debug output are captured.
    pub fn capture() -> (Self, DmCapture) {
        let capture = DmCapture::new();
        let mut manager = Self::new(Box::new(capture.clone()));
        manager.debug_out = Box::new(capture.clone());
        (manager, capture)
    }

    pub fn set_debug_output(&mut self, out: Box<dyn Write>) {
        self.debug_out = out;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Returns the sink for `name`, opening a file on first use.
    pub fn stream(&mut self, name: &str) -> Result<&mut dyn Write> {
        if name == DM_STDOUT_NAME {
            return Ok(self.default_out.as_mut());
        }
        if !self.streams.contains_key(name) {
            let sink: Box<dyn Write> = if name == DM_HIDE_NAME {
                Box::new(io::sink())
            } else {
                let file = File::create(name)
                    .map_err(|_| DmError::Io(format!("Cannot open output file {name}")))?;
                debug!("opened output file {name}");
                Box::new(BufWriter::new(file))
            };
            self.streams.insert(name.to_string(), sink);
        }
        match self.streams.get_mut(name) {
            Some(sink) => Ok(sink.as_mut()),
            None => Err(DmError::Io(format!("Cannot open output file {name}"))),
        }
    }

    /// Writes `line` plus a newline to the named sink.
    pub fn write_line(&mut self, name: &str, line: &str) -> Result<()> {
        if self.muted {
            return Ok(());
        }
        let out = self.stream(name)?;
        writeln!(out, "{line}")?;
        Ok(())
    }

    pub fn write_row(&mut self, name: &str, row: &DmRow) -> Result<()> {
        self.write_line(name, &row.as_csv())
    }

    /// Writes a diagnostic line to the debug stream.
    pub fn write_debug(&mut self, line: &str) -> Result<()> {
        writeln!(self.debug_out, "{line}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.default_out.flush()?;
        self.debug_out.flush()?;
        for sink in self.streams.values_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Flushes and closes every named stream.
    pub fn clear(&mut self) -> Result<()> {
        self.flush()?;
        self.streams.clear();
        Ok(())
    }
}

/// Resolves `name` against the working directory, then the directory of
/// `relative_to` (usually the script that mentions it).
pub fn resolve_path(name: &str, relative_to: &str) -> PathBuf {
    let direct = PathBuf::from(name);
    if direct.is_absolute() || direct.exists() {
        return direct;
    }
    match Path::new(relative_to).parent() {
        Some(dir) if dir.join(name).exists() => dir.join(name),
        _ => direct,
    }
}

/// Loads the non-empty lines of a CSV file as rows.
pub fn load_csv_rows(path: impl AsRef<Path>) -> Result<Vec<DmRow>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| DmError::Io(format!("Cannot open file {}: {e}", path.display())))?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        rows.push(DmRow::from_csv(line)?);
    }
    Ok(rows)
}
