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

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Configuration for the Datamk logger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmLogConfig {
    /// Minimum level, one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// Emit one JSON object per line instead of text.
    pub json: bool,
    /// Append to this file instead of writing to stderr.
    pub file_path: Option<String>,
}

impl Default for DmLogConfig {
    fn default() -> Self {
        DmLogConfig {
            level: "WARN".to_string(),
            json: false,
            file_path: None,
        }
    }
}

impl DmLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn file_path(mut self, path: Option<String>) -> Self {
        self.file_path = path;
        self
    }

    /// Parsed level; unknown names fall back to `warn`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_ascii_uppercase().as_str() {
            "WARNING" => LevelFilter::Warn,
            other => other.parse().unwrap_or(LevelFilter::Warn),
        }
    }

    /// Reads a config from JSON, keeping defaults for missing or bad fields.
    pub fn from_json(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}
