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

//! # Datamk Logging Module
//!
//! Library code logs through the `log` facade. This module provides the sink
//! installed by the command line driver: [`DmLogger`] filters by level, formats
//! each record as text or JSON and hands the line to a handler writing to
//! stderr or a log file.
//!
//! ## Module Structure
//!
//! - [`config`]: Serde based [`DmLogConfig`]
//! - [`formatters`]: Text and JSON line formatting
//! - [`handlers`]: Stderr and file destinations

pub mod config;
pub mod formatters;
pub mod handlers;

pub use config::DmLogConfig;

use std::sync::OnceLock;

use log::{LevelFilter, Log, Metadata, Record};

use crate::errors::Result;
use formatters::{DmJsonFormatter, DmLogLine, DmTextFormatter};
use handlers::{DmFileHandler, DmLogHandler, DmStderrHandler};

/// `log::Log` implementation backing the driver.
pub struct DmLogger {
    level: LevelFilter,
    json: bool,
    handler: Box<dyn DmLogHandler + Send + Sync>,
}

impl DmLogger {
    pub fn new(config: &DmLogConfig) -> Result<Self> {
        let handler: Box<dyn DmLogHandler + Send + Sync> = match &config.file_path {
            Some(path) => Box::new(DmFileHandler::open(path)?),
            None => Box::new(DmStderrHandler),
        };
        Ok(DmLogger {
            level: config.level_filter(),
            json: config.json,
            handler,
        })
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Formats a record the way it will be written.
    pub fn format(&self, record: &Record<'_>) -> String {
        let line = DmLogLine::from_record(record);
        if self.json {
            DmJsonFormatter::format(&line)
        } else {
            DmTextFormatter::format(&line)
        }
    }
}

impl Log for DmLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            self.handler.handle(&self.format(record));
        }
    }

    fn flush(&self) {
        self.handler.flush();
    }
}

static LOGGER: OnceLock<DmLogger> = OnceLock::new();

/// Installs the process logger. Later calls keep the first logger.
pub fn init(config: &DmLogConfig) -> Result<()> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = DmLogger::new(config)?;
    let logger = LOGGER.get_or_init(|| logger);
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level());
    }
    Ok(())
}
