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

//! # Datamk Tag Registry Module
//!
//! This module maps script tag names to factory functions and drives the
//! construction of source trees from parsed scripts.
//!
//! ## Registry Operations
//!
//! - Register source and generator factories by tag name
//! - Install an optional expression compiler for the `eval` tag
//! - Build a source (and, recursively, its children) from a [`DmElement`]
//!
//! Registering a name twice is accepted; the later factory replaces the
//! earlier one.

use std::collections::{HashMap, HashSet};

use log::trace;

use crate::config::DmElement;
use crate::errors::{DmError, Result};
use crate::generator::{self, DmGenerator};
use crate::source::{DmBoxedSource, DmComposite};
use crate::sources::{self, eval::DmExpressionCompiler};

/// Builds a source from its tag.
pub type DmSourceFactory = fn(&DmElement, &mut DmBuilder<'_>) -> Result<DmBoxedSource>;

/// Builds a generator from its tag.
pub type DmGeneratorFactory = fn(&DmElement, &mut DmBuilder<'_>) -> Result<DmGenerator>;

/// Registry mapping tag names to factories.
#[derive(Debug, Default, Clone)]
pub struct DmRegistry {
    sources: HashMap<String, DmSourceFactory>,
    generators: HashMap<String, DmGeneratorFactory>,
    expressions: Option<DmExpressionCompiler>,
}

impl DmRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in tag.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    pub fn register_defaults(&mut self) {
        self.register_generator(crate::config::GEN_TAG, generator::generator_factory);
        sources::register_defaults(self);
    }

    pub fn register_source(&mut self, tag: &str, factory: DmSourceFactory) {
        self.sources.insert(tag.to_string(), factory);
    }

    pub fn register_generator(&mut self, tag: &str, factory: DmGeneratorFactory) {
        self.generators.insert(tag.to_string(), factory);
    }

    pub fn set_expression_compiler(&mut self, compiler: DmExpressionCompiler) {
        self.expressions = Some(compiler);
    }

    pub fn expression_compiler(&self) -> Option<DmExpressionCompiler> {
        self.expressions
    }

    pub fn source_factory(&self, tag: &str) -> Result<DmSourceFactory> {
        self.sources
            .get(tag)
            .copied()
            .ok_or_else(|| DmError::UnknownTag(tag.to_string()))
    }

    pub fn generator_factory(&self, tag: &str) -> Result<DmGeneratorFactory> {
        self.generators
            .get(tag)
            .copied()
            .ok_or_else(|| DmError::UnknownTag(tag.to_string()))
    }

    pub fn has_source(&self, tag: &str) -> bool {
        self.sources.contains_key(tag)
    }

    pub fn source_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

/// Construction state for one or more scripts.
///
/// Memory names are tracked here so that a second `remember` with the same
/// name is rejected while the script is being built.
pub struct DmBuilder<'r> {
    registry: &'r DmRegistry,
    memory_names: HashSet<String>,
}

impl<'r> DmBuilder<'r> {
    pub fn new(registry: &'r DmRegistry) -> Self {
        Self::with_memory_names(registry, HashSet::new())
    }

    pub fn with_memory_names(registry: &'r DmRegistry, memory_names: HashSet<String>) -> Self {
        Self {
            registry,
            memory_names,
        }
    }

    pub fn registry(&self) -> &'r DmRegistry {
        self.registry
    }

    pub fn into_memory_names(self) -> HashSet<String> {
        self.memory_names
    }

    /// Records a memory name, failing on duplicates.
    pub fn declare_memory(&mut self, name: &str, e: &DmElement) -> Result<()> {
        if !self.memory_names.insert(name.to_string()) {
            return Err(DmError::config(format!("duplicate memory name '{name}'"), e));
        }
        Ok(())
    }

    /// Builds the source described by `e`.
    pub fn build_source(&mut self, e: &DmElement) -> Result<DmBoxedSource> {
        let factory = self.registry.source_factory(e.name()).map_err(|err| err.at(e))?;
        trace!("building <{}> from {}:{}", e.name(), e.file(), e.line());
        factory(e, self)
    }

    /// Builds every child element of `e` into `composite`, in document order.
    pub fn add_children(&mut self, e: &DmElement, composite: &mut DmComposite) -> Result<()> {
        for child in e.child_elements() {
            let source = self.build_source(child)?;
            composite.push(source);
        }
        Ok(())
    }

    pub fn build_generator(&mut self, e: &DmElement) -> Result<DmGenerator> {
        let factory = self
            .registry
            .generator_factory(e.name())
            .map_err(|err| err.at(e))?;
        factory(e, self)
    }
}
