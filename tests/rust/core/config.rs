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

//! # Datamk Core Tests - Config
//!
//! This module contains tests for script parsing, the shared validation
//! helpers and the way script errors are located.
//!
//! ## Test Categories
//!
//! - **Parsing Tests**: Verify element trees built from text and files
//! - **Validation Tests**: Verify attribute and child checks
//! - **Location Tests**: Verify that errors name the tag, file and line
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test config
//! ```

use std::fs;

use datamk::config::{comma_list, get_count, get_fields, get_order, require_attrs};
use datamk::{parse_file, parse_str, DmError, DmModelManager, DmRegistry, DmRunMode};

fn load(xml: &str) -> datamk::Result<()> {
    let mut manager = DmModelManager::new();
    manager.add_model_from_str(xml, "script.xml", DmRunMode::CheckOnly)
}

/// Tests comma list splitting.
///
/// Verifies that entries are trimmed and empty entries dropped.
#[test]
fn test_comma_list() {
    assert_eq!(comma_list(" a, b ,,c "), vec!["a", "b", "c"]);
    assert!(comma_list("").is_empty());
    assert!(comma_list(" , ").is_empty());
}

/// Tests parsing a script from disk.
#[test]
fn test_parse_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.xml");
    fs::write(
        &path,
        "<csvt name='people'>\n  <gen name='p' count='3'>\n    <counter/>\n  </gen>\n</csvt>\n",
    )
    .unwrap();

    let root = parse_file(&path).unwrap();
    assert_eq!(root.name(), "csvt");
    assert_eq!(root.attr("name"), Some("people"));
    let gen = root.find_child("gen").unwrap();
    assert_eq!(gen.line(), 2);
    assert_eq!(gen.file(), path.display().to_string());
}

/// Tests that a missing script is reported as a parser error.
#[test]
fn test_parse_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = parse_file(&dir.path().join("absent.xml")).unwrap_err();
    assert!(matches!(err, DmError::Xml(ref m) if m.contains("Cannot open file")));
}

/// Tests attribute helpers on a parsed element.
#[test]
fn test_attribute_helpers() {
    let e = parse_str("<rows order='2,1' fields='3' count='10'/>", "h.xml").unwrap();
    assert_eq!(get_order(&e).unwrap().indices(), [1, 0]);
    assert_eq!(get_fields(&e, "fields").unwrap().indices(), [2]);
    assert_eq!(get_count(&e).unwrap(), Some(10));

    let bad = parse_str("<rows order='2,x'/>", "h.xml").unwrap();
    let err = get_order(&bad).unwrap_err();
    assert!(matches!(err, DmError::Config { ref tag, line: 1, .. } if tag == "rows"));

    let err = require_attrs(&e, &["values"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "XML tag 'rows' missing attribute 'values' in h.xml at line 1"
    );
}

/// Tests that build errors carry the location of the offending tag.
#[test]
fn test_errors_are_located() {
    let err = load("<csvt>\n<gen count='2'>\n  <int_seq begin='1'/>\n</gen>\n</csvt>").unwrap_err();
    assert_eq!(
        err.to_string(),
        "XML tag 'int_seq' missing attribute 'end' in script.xml at line 3"
    );

    let err = load("<csvt><gen><int_seq begin='1' end='5' step='2'/></gen></csvt>").unwrap_err();
    assert!(err.to_string().contains("invalid attribute 'step'"));

    let err = load("<csvt><gen count='many'><counter/></gen></csvt>").unwrap_err();
    assert!(err.to_string().contains("expected integer value for 'count'"));
}

/// Tests that unknown tags are rejected.
#[test]
fn test_unknown_tag() {
    let err = load("<csvt>\n<gen count='1'>\n<sparkle/>\n</gen></csvt>").unwrap_err();
    assert!(matches!(
        err,
        DmError::Config { ref tag, ref file, line: 3, .. } if tag == "sparkle" && file == "script.xml"
    ));
    assert_eq!(
        err.to_string(),
        "XML tag 'sparkle' Unknown tag: sparkle in script.xml at line 3"
    );
}

/// Tests validation of boolean and increment attributes.
#[test]
fn test_value_validation() {
    let err = load("<csvt><gen><rows random='maybe' values='a'/></gen></csvt>").unwrap_err();
    assert!(err
        .to_string()
        .contains("invalid boolean value 'maybe' for attribute 'random'"));

    let err = load("<csvt><gen><int_seq begin='1' end='5' inc='0'/></gen></csvt>").unwrap_err();
    assert!(err.to_string().contains("increment cannot be zero"));

    let err = load("<csvt><gen><int_seq begin='5' end='1'/></gen></csvt>").unwrap_err();
    assert!(err.to_string().contains("invalid begin/end/inc combination"));
}

/// Tests that a generator without content is rejected.
#[test]
fn test_generator_requires_content() {
    let err = load("<csvt><gen name='empty'/></csvt>").unwrap_err();
    assert!(err.to_string().contains("missing content"));
}

/// Tests the default tag table.
#[test]
fn test_registry_defaults() {
    let registry = DmRegistry::with_defaults();
    for tag in ["row", "rows", "int_seq", "m2m", "random_date", "rand_date", "eval"] {
        assert!(registry.has_source(tag), "missing {tag}");
    }
    assert!(!registry.has_source("gen"));
    assert!(registry.expression_compiler().is_none());
    assert!(DmRegistry::new().source_tags().is_empty());
}
