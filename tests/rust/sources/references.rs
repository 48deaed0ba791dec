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

//! # Datamk Source Tests - References
//!
//! Sources that read rows produced elsewhere in the run: named memories
//! (`remember` / `recall`) and joins of earlier generators (`m2m`).
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test references
//! ```

use std::collections::HashSet;

use datamk::io::DmFileManager;
use datamk::{DmError, DmModelManager, DmRng, DmRunMode, DmSession};

const PEOPLE_AND_ROLES: &str = "\
    <gen name='people' count='3' hide='yes'>\
      <counter/>\
      <rows random='no' values='ann,bob,cy'/>\
    </gen>\
    <gen name='roles' count='2' hide='yes'>\
      <rows random='no' values='admin,user'/>\
    </gen>";

fn run_script(xml: &str, seed: u64) -> datamk::Result<Vec<String>> {
    let mut manager = DmModelManager::new();
    manager.add_model_from_str(xml, "references.xml", DmRunMode::GenForm)?;
    let (files, out) = DmFileManager::capture();
    let mut session = DmSession::new(DmRng::with_seed(seed), files);
    manager.run_models(&mut session)?;
    Ok(out.lines())
}

/// Tests replaying remembered rows in a later generator.
#[test]
fn test_remember_then_recall() {
    let lines = run_script(
        "<csvt>\
           <gen count='3'><remember name='ids'><counter/></remember></gen>\
           <gen count='4'><recall name='ids' random='no'/></gen>\
         </csvt>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["1", "2", "3", "1", "2", "3", "1"]);
}

/// Tests the first and last memory modes and remembered field subsets.
#[test]
fn test_remember_modes() {
    let lines = run_script(
        "<csvt>\
           <gen count='3' hide='yes'>\
             <remember name='head' mode='first'><counter/></remember>\
             <remember name='tail' mode='last' fields='2'><row values='x,y'/></remember>\
           </gen>\
           <gen count='2'><recall name='head'/><recall name='tail'/></gen>\
         </csvt>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["1,y", "1,y"]);
}

/// Tests that a recall without a memory reads a generator's rows.
#[test]
fn test_recall_generator_rows() {
    let lines = run_script(
        &format!(
            "<csvt>{PEOPLE_AND_ROLES}\
               <gen count='4'><recall name='people' random='no' order='2'/></gen>\
             </csvt>"
        ),
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["ann", "bob", "cy", "ann"]);
}

/// Tests name resolution failures.
#[test]
fn test_recall_errors() {
    let err = run_script(
        "<csvt><gen count='1'><recall name='nobody'/></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(matches!(err, DmError::UnresolvedReference(_)));
    assert_eq!(
        err.to_string(),
        "Cannot find memory/generator named 'nobody'"
    );

    let err = run_script(
        "<csvt>\
           <gen count='1'><recall name='later'/></gen>\
           <gen count='1'><remember name='later'><counter/></remember></gen>\
         </csvt>",
        1,
    )
    .unwrap_err();
    assert!(matches!(err, DmError::EmptyResultSet(ref m) if m == "Memory 'later' is empty"));

    let err = run_script(
        "<csvt>\
           <gen count='1'><remember name='m'><counter/></remember></gen>\
           <gen count='1'><remember name='m'><counter/></remember></gen>\
         </csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("duplicate memory name 'm'"));
}

/// Tests sequential many-to-many pairs in row-major order.
#[test]
fn test_m2m_sequential() {
    let lines = run_script(
        &format!(
            "<csvt>{PEOPLE_AND_ROLES}\
               <gen count='6'>\
                 <m2m random='no'><left gen='people'/><right gen='roles'/></m2m>\
               </gen>\
             </csvt>"
        ),
        1,
    )
    .unwrap();
    assert_eq!(
        lines,
        vec!["1,admin", "1,user", "2,admin", "2,user", "3,admin", "3,user"]
    );
}

/// Tests that unique sequential pairs run out after left x right rows.
#[test]
fn test_m2m_exhausts_pairs() {
    let err = run_script(
        &format!(
            "<csvt>{PEOPLE_AND_ROLES}\
               <gen count='7'>\
                 <m2m random='no'><left gen='people'/><right gen='roles'/></m2m>\
               </gen>\
             </csvt>"
        ),
        1,
    )
    .unwrap_err();
    assert!(matches!(err, DmError::DuplicateExhausted(ref m) if m == "Duplicate in many to many"));

    let lines = run_script(
        &format!(
            "<csvt>{PEOPLE_AND_ROLES}\
               <gen count='7'>\
                 <m2m random='no' unique='no'><left gen='people'/><right gen='roles'/></m2m>\
               </gen>\
             </csvt>"
        ),
        1,
    )
    .unwrap();
    assert_eq!(lines.last().map(String::as_str), Some("1,admin"));
}

/// Tests random pairs with selected fields stay distinct.
#[test]
fn test_m2m_random_unique() {
    let lines = run_script(
        &format!(
            "<csvt>{PEOPLE_AND_ROLES}\
               <gen count='3'>\
                 <m2m><left gen='people' fields='2,1'/><right gen='roles'/></m2m>\
               </gen>\
             </csvt>"
        ),
        9,
    )
    .unwrap();
    let distinct: HashSet<&String> = lines.iter().collect();
    assert_eq!(distinct.len(), 3);
    for line in &lines {
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(fields.len(), 3);
        assert!(["ann", "bob", "cy"].contains(&fields[0]));
        assert!(["admin", "user"].contains(&fields[2]));
    }
}

/// Tests join structure and reference errors.
#[test]
fn test_m2m_errors() {
    let err = run_script(
        "<csvt><gen count='1'><m2m><left gen='ghost'/><right gen='ghost'/></m2m></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Unknown generator: ghost");

    let err = run_script(
        "<csvt><gen count='1'><m2m><left gen='a'/><left gen='b'/></m2m></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Duplicate left tag"));
}
