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

//! # Datamk Model Tests - Manager
//!
//! This module contains end-to-end tests for loading and running scripts
//! through the model manager.
//!
//! ## Test Categories
//!
//! - **Include Tests**: Verify include resolution and the expansion limit
//! - **Run Mode Tests**: Verify check-only and muted generation
//! - **Name Tests**: Verify generator lookup across models
//! - **Output Tests**: Verify headers, echo text and named output files
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test model
//! ```

use std::fs;
use std::path::Path;

use datamk::io::{DmCapture, DmFileManager};
use datamk::{DmError, DmModelManager, DmRng, DmRunMode, DmSession};

fn session(seed: u64) -> (DmSession, DmCapture) {
    let (files, out) = DmFileManager::capture();
    (DmSession::new(DmRng::with_seed(seed), files), out)
}

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

/// Tests that includes resolve next to the including script.
///
/// Verifies that a `csvt` include contributes its children and any other
/// root element is inserted as is.
#[test]
fn test_includes_are_spliced() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "parts/defs.xml",
        "<csvt><echo>id,name</echo><include file='more.xml'/></csvt>",
    );
    write(
        dir.path(),
        "parts/more.xml",
        "<gen count='2'><counter/><row values='n'/></gen>",
    );
    write(
        dir.path(),
        "main.xml",
        "<csvt name='main'>\n  <include file='parts/defs.xml'/>\n</csvt>",
    );

    let mut manager = DmModelManager::new();
    manager
        .add_model_from_file(dir.path().join("main.xml"), DmRunMode::GenForm)
        .unwrap();
    assert_eq!(manager.find_model("main").unwrap().entry_count(), 2);

    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();
    assert_eq!(out.lines(), vec!["id,name", "1,n", "2,n"]);
}

/// Tests that a self-including script stops at the expansion limit.
#[test]
fn test_include_loop_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "loop.xml", "<csvt><include file='loop.xml'/></csvt>");

    let mut manager = DmModelManager::new();
    let err = manager
        .add_model_from_file(dir.path().join("loop.xml"), DmRunMode::GenForm)
        .unwrap_err();
    assert!(matches!(err, DmError::TooManyIncludes));
    assert_eq!(manager.model_count(), 0);
}

/// Tests include errors.
#[test]
fn test_include_errors() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "bad.xml", "<csvt><include file='missing.xml'/></csvt>");
    let mut manager = DmModelManager::new();
    let err = manager
        .add_model_from_file(dir.path().join("bad.xml"), DmRunMode::GenForm)
        .unwrap_err();
    assert!(matches!(err, DmError::Xml(ref m) if m.contains("Cannot open file")));

    let err = manager
        .add_model_from_str(
            "<csvt><include file='x.xml'><row/></include></csvt>",
            "inline.xml",
            DmRunMode::GenForm,
        )
        .unwrap_err();
    assert!(err.to_string().contains("include cannot have content"));
}

/// Tests that a check-only model is built but never run.
#[test]
fn test_check_only_writes_nothing() {
    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(
            "<csvt><echo>hello</echo><gen name='g' count='3'><counter/></gen></csvt>",
            "check.xml",
            DmRunMode::CheckOnly,
        )
        .unwrap();
    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();
    assert!(out.contents().is_empty());
    assert_eq!(manager.find_gen("g").unwrap().unwrap().size(), 0);
}

/// Tests that generate-only runs keep rows but write nothing.
#[test]
fn test_gen_only_is_muted() {
    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(
            "<csvt><echo>hello</echo><gen name='g' count='3'><counter/></gen></csvt>",
            "quiet.xml",
            DmRunMode::GenOnly,
        )
        .unwrap();
    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();
    assert!(out.contents().is_empty());
    let g = manager.find_gen("g").unwrap().unwrap();
    assert_eq!(g.size(), 3);
    assert_eq!(g.row_at(2).unwrap().as_csv(), "3");
}

/// Tests `model.generator` references between models.
#[test]
fn test_cross_model_references() {
    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(
            "<csvt name='db'><gen name='people' count='2'><rows random='no' values='ann,bob'/></gen></csvt>",
            "db.xml",
            DmRunMode::GenOnly,
        )
        .unwrap();
    manager
        .add_model_from_str(
            "<csvt name='report'>\
               <gen name='people' count='1'><row values='local'/></gen>\
               <gen count='2'><recall name='db.people' random='no'/></gen>\
               <gen count='1'><recall name='people'/></gen>\
             </csvt>",
            "report.xml",
            DmRunMode::GenForm,
        )
        .unwrap();

    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();
    assert_eq!(out.lines(), vec!["local", "ann", "bob", "local"]);

    assert_eq!(manager.model_count(), 2);
    assert_eq!(manager.find_gen("db.people").unwrap().unwrap().size(), 2);
    assert!(manager.find_gen("nobody.people").unwrap().is_none());
    assert!(manager.find_gen("a.b.c").is_err());
}

/// Tests model level structure errors.
#[test]
fn test_model_errors() {
    let mut manager = DmModelManager::new();
    let err = manager
        .add_model_from_str("<data/>", "x.xml", DmRunMode::GenForm)
        .unwrap_err();
    assert_eq!(err.to_string(), "Expected tag 'csvt' but found 'data'");

    let err = manager
        .add_model_from_str(
            "<csvt><gen name='g'><row/></gen><gen name='g'><row/></gen></csvt>",
            "dup.xml",
            DmRunMode::GenForm,
        )
        .unwrap_err();
    assert!(err.to_string().contains("duplicate name 'g'"));

    let err = manager
        .add_model_from_str("<csvt><table/></csvt>", "t.xml", DmRunMode::GenForm)
        .unwrap_err();
    assert!(err.to_string().contains("Invalid top-level tag 'table'"));
}

/// Tests headers, echo lines and output to a named file.
#[test]
fn test_named_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("out.csv");
    let script = format!(
        "<csvt>\
           <echo>start</echo>\
           <gen count='2' fields='n,tag' output='{}'>\
             <int_seq begin='5' end='9'/><row values='a b'/>\
           </gen>\
         </csvt>",
        target.display()
    );

    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(&script, "files.xml", DmRunMode::GenForm)
        .unwrap();
    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();

    assert_eq!(out.lines(), vec!["start"]);
    assert_eq!(fs::read_to_string(&target).unwrap(), "n,tag\n5,a b\n6,a b\n");
}

/// Tests that a generator without a count or sized sources produces no rows.
#[test]
fn test_unsized_generator_is_empty() {
    let mut manager = DmModelManager::new();
    manager
        .add_model_from_str(
            "<csvt><gen name='free'><masked mask='0'/></gen></csvt>",
            "free.xml",
            DmRunMode::GenForm,
        )
        .unwrap();
    let (mut session, out) = session(1);
    manager.run_models(&mut session).unwrap();
    assert!(out.lines().is_empty());
    assert_eq!(manager.find_gen("free").unwrap().unwrap().size(), 0);
}
