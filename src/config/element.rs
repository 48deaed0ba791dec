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

//! # Datamk Script Element Tree
//!
//! Generation scripts are read with `quick-xml` into a small owned tree of
//! [`DmElement`] values. Each element keeps its attributes in document order,
//! its element and text children in document order, and the file and line it
//! was read from so that construction errors can point at the offending tag.
//!
//! Text children made only of whitespace are dropped while parsing.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::{DmError, Result};

/// Child node of a script element.
#[derive(Debug, Clone, PartialEq)]
pub enum DmNode {
    Element(DmElement),
    Text(String),
}

/// A parsed script tag.
#[derive(Debug, Clone, PartialEq)]
pub struct DmElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<DmNode>,
    file: String,
    line: usize,
}

impl DmElement {
    pub fn new(name: impl Into<String>, file: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            file: file.into(),
            line,
        }
    }

    /// Builder-style attribute setter, used when assembling trees by hand.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: DmElement) -> Self {
        self.children.push(DmNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DmNode::Text(text.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(n, _)| n == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, or `default` when the attribute is absent.
    pub fn attr_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.attr(name).unwrap_or(default)
    }

    pub fn children(&self) -> &[DmNode] {
        &self.children
    }

    /// Number of element and text children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &DmElement> {
        self.children.iter().filter_map(|c| match c {
            DmNode::Element(e) => Some(e),
            DmNode::Text(_) => None,
        })
    }

    pub fn child_texts(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|c| match c {
            DmNode::Text(t) => Some(t.as_str()),
            DmNode::Element(_) => None,
        })
    }

    pub fn find_child(&self, name: &str) -> Option<&DmElement> {
        self.child_elements().find(|e| e.name == name)
    }

    /// All text children joined with newlines.
    pub fn child_text(&self) -> String {
        self.child_texts().collect::<Vec<_>>().join("\n")
    }

    /// Trimmed, non-empty lines of all text children.
    pub fn child_lines(&self) -> Vec<String> {
        self.child_texts()
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<DmNode> {
        &mut self.children
    }
}

/// Reads and parses a script file.
pub fn parse_file(path: &Path) -> Result<DmElement> {
    let text = fs::read_to_string(path).map_err(|e| {
        DmError::Xml(format!("Cannot open file {}: {e}", path.display()))
    })?;
    parse_str(&text, &path.display().to_string())
}

/// Parses script text, tagging elements with `file` for diagnostics.
pub fn parse_str(text: &str, file: &str) -> Result<DmElement> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<DmElement> = Vec::new();
    let mut root: Option<DmElement> = None;
    let mut lines = LineCounter::new(text);

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            DmError::Xml(format!("{e} in {file} at line {}", lines.line_at(offset)))
        })?;
        match event {
            Event::Start(start) => {
                let element = open_element(&start, file, lines.line_at(offset))?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&start, file, lines.line_at(offset))?;
                attach(&mut stack, &mut root, element, file)?;
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element, file)?;
                }
            }
            Event::Text(t) => {
                let value = t
                    .unescape()
                    .map_err(|e| DmError::Xml(e.to_string()))?
                    .into_owned();
                push_text(&mut stack, value);
            }
            Event::CData(t) => {
                let value = String::from_utf8_lossy(&t.into_inner()).into_owned();
                push_text(&mut stack, value);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(DmError::Xml(format!("unexpected end of document in {file}")));
    }
    root.ok_or_else(|| DmError::Xml(format!("no root element in {file}")))
}

fn open_element(start: &BytesStart<'_>, file: &str, line: usize) -> Result<DmElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = DmElement::new(name, file, line);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DmError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DmError::Xml(e.to_string()))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [DmElement],
    root: &mut Option<DmElement>,
    element: DmElement,
    file: &str,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(DmNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DmError::Xml(format!(
                "multiple root elements in {file} at line {}",
                element.line
            )))
        }
    }
    Ok(())
}

fn push_text(stack: &mut [DmElement], value: String) {
    if value.trim().is_empty() {
        return;
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(DmNode::Text(value));
    }
}

/// Maps byte offsets to 1-based line numbers, scanning forward only.
struct LineCounter<'a> {
    text: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0, line: 1 }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.text.len());
        if offset > self.pos {
            self.line += self.text.as_bytes()[self.pos..offset]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.pos = offset;
        }
        self.line
    }
}
