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

//! # Datamk Model Manager Module
//!
//! The manager loads scripts into models and runs them.
//!
//! ## Loading
//!
//! 1. Parse the script and check that its root tag is `csvt`
//! 2. Expand `include` tags, one at a time, until none are left; more than
//!    [`DM_MAX_INCLUDES`] expansions fail with [`DmError::TooManyIncludes`]
//! 3. Build the model through the tag registry
//!
//! An included document whose root is itself `csvt` contributes its children;
//! any other root element replaces the `include` tag as is. Include paths are
//! tried as given and then next to the including file.
//!
//! ## Name Resolution
//!
//! Generators are referred to as `model.generator` or just `generator`. A bare
//! name is looked up in the running model first and then in every model in
//! load order. Lookups go through shared row buffers, so a source may read any
//! generator that has already run, including the one it belongs to.
//!
//! ## Usage Example
//!
//! ```rust
//! use datamk::context::{DmRunMode, DmSession};
//! use datamk::manager::DmModelManager;
//!
//! let mut manager = DmModelManager::new();
//! manager
//!     .add_model_from_str(
//!         "<csvt><gen count='2'><int_seq begin='1' end='9'/></gen></csvt>",
//!         "inline.xml",
//!         DmRunMode::GenForm,
//!     )
//!     .unwrap();
//! manager.run_models(&mut DmSession::with_seed(7)).unwrap();
//! ```

use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};

use crate::config::{
    parse_file, parse_str, DmElement, DmNode, DM_ROOT_TAG, FILE_ATTRIB, INCLUDE_TAG,
};
use crate::context::{DmGeneratorLookup, DmRunMode, DmSession};
use crate::errors::{DmError, Result};
use crate::generator::{DmGenerator, DmRowBuffer};
use crate::io::resolve_path;
use crate::model::{build_model, DmModel};
use crate::registry::{DmBuilder, DmRegistry};
use crate::row::DmRow;

/// Upper bound on include expansions per script.
pub const DM_MAX_INCLUDES: usize = 50;

const NAME_SEP: char = '.';

/// Splits `model.generator` or `generator` into its parts.
fn split_name(name: &str) -> Result<(Option<&str>, &str)> {
    let parts: Vec<&str> = name.split(NAME_SEP).collect();
    match parts.as_slice() {
        [generator] => Ok((None, *generator)),
        [model, generator] => Ok((Some(*model), *generator)),
        _ => Err(DmError::value(format!("Invalid generator name '{name}'"))),
    }
}

/// Generator rows of every loaded model, keyed by model and generator name.
pub struct DmGeneratorIndex {
    current: String,
    entries: Vec<(String, String, DmRowBuffer)>,
}

impl DmGeneratorIndex {
    pub fn from_models<'m>(models: impl IntoIterator<Item = &'m DmModel>) -> Self {
        let mut entries = Vec::new();
        for model in models {
            for g in model.generators().filter(|g| !g.name().is_empty()) {
                entries.push((model.name().to_string(), g.name().to_string(), g.buffer()));
            }
        }
        Self {
            current: String::new(),
            entries,
        }
    }

    /// Sets the model whose generators win for bare names.
    pub fn set_current(&mut self, model: &str) {
        self.current = model.to_string();
    }

    fn resolve(&self, name: &str) -> Result<Option<&DmRowBuffer>> {
        let found = match split_name(name)? {
            (Some(model), generator) => self
                .entries
                .iter()
                .find(|(m, g, _)| m == model && g == generator),
            (None, generator) => self
                .entries
                .iter()
                .find(|(m, g, _)| *m == self.current && g == generator)
                .or_else(|| self.entries.iter().find(|(_, g, _)| g == generator)),
        };
        Ok(found.map(|(_, _, rows)| rows))
    }
}

impl DmGeneratorLookup for DmGeneratorIndex {
    fn generator_size(&self, name: &str) -> Result<Option<usize>> {
        match self.resolve(name)? {
            Some(rows) => {
                let rows = rows.try_borrow().map_err(|_| {
                    DmError::unresolved(format!("Generator '{name}' is being written"))
                })?;
                Ok(Some(rows.len()))
            }
            None => Ok(None),
        }
    }

    fn generator_row(&self, name: &str, index: usize) -> Result<Option<DmRow>> {
        match self.resolve(name)? {
            Some(rows) => {
                let rows = rows.try_borrow().map_err(|_| {
                    DmError::unresolved(format!("Generator '{name}' is being written"))
                })?;
                rows.get(index).cloned().map(Some).ok_or(DmError::IndexOutOfRange {
                    index,
                    len: rows.len(),
                })
            }
            None => Ok(None),
        }
    }
}

/// Reads the document an `include` tag names.
fn read_include(e: &DmElement) -> Result<Vec<DmNode>> {
    if e.child_count() != 0 {
        return Err(DmError::config("include cannot have content", e));
    }
    let file = e.attr_or(FILE_ATTRIB, "");
    if file.is_empty() {
        return Err(DmError::config("No include file specified", e));
    }
    let path = resolve_path(file, e.file());
    debug!("including {}", path.display());
    let included = parse_file(&path)?;
    if included.name() == DM_ROOT_TAG {
        Ok(included.children().to_vec())
    } else {
        Ok(vec![DmNode::Element(included)])
    }
}

/// Replaces the first `include` found below `e`, depth first.
fn expand_include(e: &mut DmElement) -> Result<bool> {
    let children = e.children_mut();
    for i in 0..children.len() {
        let DmNode::Element(child) = &mut children[i] else {
            continue;
        };
        if child.name() == INCLUDE_TAG {
            let nodes = read_include(child)?;
            let _ = children.splice(i..=i, nodes);
            return Ok(true);
        }
        if expand_include(child)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Expands every include of a parsed script.
pub fn expand_includes(root: &mut DmElement) -> Result<usize> {
    let mut count = 0;
    while expand_include(root)? {
        count += 1;
        if count > DM_MAX_INCLUDES {
            return Err(DmError::TooManyIncludes);
        }
    }
    Ok(count)
}

/// Loaded models and the registry they are built with.
pub struct DmModelManager {
    registry: DmRegistry,
    models: Vec<(DmModel, DmRunMode)>,
    memory_names: HashSet<String>,
}

impl Default for DmModelManager {
    fn default() -> Self {
        Self::with_registry(DmRegistry::with_defaults())
    }
}

impl DmModelManager {
    /// Creates a manager using every built-in tag.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: DmRegistry) -> Self {
        Self {
            registry,
            models: Vec::new(),
            memory_names: HashSet::new(),
        }
    }

    pub fn registry(&self) -> &DmRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DmRegistry {
        &mut self.registry
    }

    pub fn models(&self) -> impl Iterator<Item = &DmModel> {
        self.models.iter().map(|(model, _)| model)
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn find_model(&self, name: &str) -> Option<&DmModel> {
        self.models().find(|m| m.name() == name)
    }

    /// Adds a model, rejecting a second model with the same name.
    pub fn add_model(&mut self, model: DmModel, mode: DmRunMode) -> Result<()> {
        if self.find_model(model.name()).is_some() {
            return Err(DmError::value(format!(
                "Duplicate model name '{}'",
                model.name()
            )));
        }
        self.models.push((model, mode));
        Ok(())
    }

    pub fn add_model_from_file(&mut self, path: impl AsRef<Path>, mode: DmRunMode) -> Result<()> {
        let root = parse_file(path.as_ref())?;
        self.add_model_from_tree(root, mode)
    }

    pub fn add_model_from_str(&mut self, text: &str, file: &str, mode: DmRunMode) -> Result<()> {
        let root = parse_str(text, file)?;
        self.add_model_from_tree(root, mode)
    }

    /// Checks the root, expands includes and builds the model.
    pub fn add_model_from_tree(&mut self, mut root: DmElement, mode: DmRunMode) -> Result<()> {
        if root.name() != DM_ROOT_TAG {
            return Err(DmError::value(format!(
                "Expected tag '{DM_ROOT_TAG}' but found '{}'",
                root.name()
            )));
        }
        let includes = expand_includes(&mut root)?;
        if includes > 0 {
            info!("expanded {includes} include(s) in {}", root.file());
        }

        let names = std::mem::take(&mut self.memory_names);
        let mut builder = DmBuilder::with_memory_names(&self.registry, names);
        let built = build_model(&root, &mut builder);
        self.memory_names = builder.into_memory_names();
        let model = built?;
        info!(
            "loaded model '{}' with {} entries from {}",
            model.name(),
            model.entry_count(),
            root.file()
        );
        self.add_model(model, mode)
    }

    /// Finds a generator by `model.generator` or bare name.
    pub fn find_gen(&self, name: &str) -> Result<Option<&DmGenerator>> {
        let found = match split_name(name)? {
            (Some(model), generator) => self
                .find_model(model)
                .and_then(|m| m.find_gen(generator)),
            (None, generator) => self.models().find_map(|m| m.find_gen(generator)),
        };
        Ok(found)
    }

    /// Runs every model not loaded as check-only, in load order.
    pub fn run_models(&mut self, session: &mut DmSession) -> Result<()> {
        for name in &self.memory_names {
            session.memory.declare(name);
        }
        let mut index = DmGeneratorIndex::from_models(self.models.iter().map(|(m, _)| m));
        for (model, mode) in self.models.iter_mut() {
            if *mode == DmRunMode::CheckOnly {
                info!("model '{}' checked, not run", model.name());
                continue;
            }
            session.files.set_muted(*mode == DmRunMode::GenOnly);
            index.set_current(model.name());
            info!("running model '{}'", model.name());
            let mut ctx = session.context(&index);
            model.generate(&mut ctx)?;
        }
        session.files.flush()
    }
}
