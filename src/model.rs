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

//! # Datamk Model Module
//!
//! A model is the content of one `csvt` document: an ordered list of entries
//! (generators and `echo` texts) plus a table of `def` values. Generating a
//! model runs every entry once, in declaration order, and lets each one
//! release intermediate state as soon as it has finished.

use std::collections::HashMap;

use log::debug;

use crate::config::{
    allow_attrs, forbid_children, require_attrs, DmElement, DEF_TAG, ECHO_TAG, GEN_TAG,
    NAME_ATTRIB, VALUE_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::generator::DmGenerator;
use crate::io::DM_STDOUT_NAME;
use crate::registry::DmBuilder;

/// A top-level model entry.
pub enum DmModelEntry {
    Generator(DmGenerator),
    Echoer(String),
}

impl DmModelEntry {
    fn generate(&mut self, ctx: &mut DmContext<'_>) -> Result<()> {
        match self {
            DmModelEntry::Generator(g) => {
                g.generate(ctx)?;
            }
            DmModelEntry::Echoer(text) => ctx.files.write_line(DM_STDOUT_NAME, text)?,
        }
        Ok(())
    }

    fn discard(&mut self) {
        if let DmModelEntry::Generator(g) = self {
            g.discard();
        }
    }
}

#[derive(Default)]
pub struct DmModel {
    name: String,
    entries: Vec<DmModelEntry>,
    defs: HashMap<String, String>,
}

impl DmModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[DmModelEntry] {
        &self.entries
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn add_entry(&mut self, entry: DmModelEntry) {
        self.entries.push(entry);
    }

    pub fn generators(&self) -> impl Iterator<Item = &DmGenerator> {
        self.entries.iter().filter_map(|entry| match entry {
            DmModelEntry::Generator(g) => Some(g),
            DmModelEntry::Echoer(_) => None,
        })
    }

    /// Generators are matched by exact, case sensitive name.
    pub fn find_gen(&self, name: &str) -> Option<&DmGenerator> {
        self.generators().find(|g| g.name() == name)
    }

    /// Defines `name`, replacing any earlier value.
    pub fn add_def(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.defs.insert(name.into(), value.into());
    }

    pub fn get_def_value(&self, name: &str) -> Result<&str> {
        self.defs
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DmError::value(format!("Unknown define: '{name}'")))
    }

    /// Runs every entry once, in order.
    pub fn generate(&mut self, ctx: &mut DmContext<'_>) -> Result<()> {
        debug!("generating model '{}'", self.name);
        for entry in self.entries.iter_mut() {
            entry.generate(ctx)?;
            entry.discard();
        }
        Ok(())
    }
}

/// Builds a model from the children of a `csvt` root element.
pub fn build_model(root: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmModel> {
    let mut model = DmModel::new(root.attr_or(NAME_ATTRIB, ""));
    for child in root.child_elements() {
        match child.name() {
            GEN_TAG => build_generator(&mut model, child, b)?,
            ECHO_TAG => {
                allow_attrs(child, &[])?;
                model.add_entry(DmModelEntry::Echoer(child.child_text()));
            }
            DEF_TAG => add_define(&mut model, child)?,
            other => {
                return Err(DmError::config(
                    format!("Invalid top-level tag '{other}'"),
                    child,
                ));
            }
        }
    }
    Ok(model)
}

fn build_generator(model: &mut DmModel, e: &DmElement, b: &mut DmBuilder<'_>) -> Result<()> {
    let generator = b.build_generator(e)?;
    if !generator.name().is_empty() && model.find_gen(generator.name()).is_some() {
        return Err(DmError::config(
            format!("duplicate name '{}'", generator.name()),
            e,
        ));
    }
    model.add_entry(DmModelEntry::Generator(generator));
    Ok(())
}

fn add_define(model: &mut DmModel, e: &DmElement) -> Result<()> {
    require_attrs(e, &[NAME_ATTRIB, VALUE_ATTRIB])?;
    forbid_children(e)?;
    let name = e.attr_or(NAME_ATTRIB, "");
    if name.is_empty() {
        return Err(DmError::config("'name' attribute cannot be empty", e));
    }
    model.add_def(name, e.attr_or(VALUE_ATTRIB, ""));
    Ok(())
}
