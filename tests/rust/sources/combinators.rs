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

//! # Datamk Source Tests - Combinators
//!
//! This module contains tests for sources that combine the rows of their
//! children: set operations, duplicate suppression, grouping, choice, runs,
//! permutation and discriminated selection.
//!
//! ## Test Categories
//!
//! - **Set Tests**: product, union and unique
//! - **Ordering Tests**: group, shuffle and range
//! - **Choice Tests**: pick, select and merge
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test combinators
//! ```

use std::collections::HashSet;

use datamk::io::DmFileManager;
use datamk::{DmError, DmModelManager, DmRng, DmRunMode, DmSession};

fn run_script(xml: &str, seed: u64) -> datamk::Result<Vec<String>> {
    let mut manager = DmModelManager::new();
    manager.add_model_from_str(xml, "combinators.xml", DmRunMode::GenForm)?;
    let (files, out) = DmFileManager::capture();
    let mut session = DmSession::new(DmRng::with_seed(seed), files);
    manager.run_models(&mut session)?;
    Ok(out.lines())
}

fn gen(count: &str, body: &str, seed: u64) -> datamk::Result<Vec<String>> {
    run_script(&format!("<csvt><gen count='{count}'>{body}</gen></csvt>"), seed)
}

/// Tests the cartesian product in row-major order.
#[test]
fn test_product_row_major() {
    let lines = gen(
        "all",
        "<product>\
           <rows random='no' values='a,b'/>\
           <rows random='no' values='1,2,3'/>\
         </product>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["a,1", "a,2", "a,3", "b,1", "b,2", "b,3"]);
}

/// Tests that a product child without a size is rejected.
#[test]
fn test_product_needs_sized_children() {
    let err = gen("2", "<product><rows values='a'/><masked mask='0'/></product>", 1).unwrap_err();
    assert_eq!(err.to_string(), "source 2 <masked> has no size");
}

/// Tests that union keeps first-seen order and drops repeats.
#[test]
fn test_union_first_seen_order() {
    let lines = gen(
        "all",
        "<union>\
           <rows random='no' values='1,3,2'/>\
           <rows random='no' values='2,4,3'/>\
         </union>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["1", "3", "2", "4"]);
}

/// Tests a sized unique over a subset of fields.
#[test]
fn test_unique_sized_on_fields() {
    let lines = gen(
        "all",
        "<unique fields='1'><rows random='no'>\n a,1\n a,2\n b,3\n</rows></unique>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["a,1", "b,3"]);
}

/// Tests that sized and streaming unique agree on the distinct rows.
///
/// Without a count the generator sizes the source first. With a count the
/// rows are pulled one at a time until the distinct ones run out.
#[test]
fn test_unique_same_rows_either_order() {
    let body = "<unique><rows random='no'>\n1,2\nthree\n1,2\n</rows></unique>";
    let sized = run_script(&format!("<csvt><gen>{body}</gen></csvt>"), 1).unwrap();
    assert_eq!(sized, vec!["1,2", "three"]);

    let streamed = gen("2", body, 1).unwrap();
    assert_eq!(streamed, sized);

    let err = gen("3", body, 1).unwrap_err();
    assert!(matches!(err, DmError::DuplicateExhausted(_)));
}

/// Tests that a streaming unique gives up after its retries.
#[test]
fn test_unique_exhausts() {
    let err = gen(
        "3",
        "<unique retry='5'><rows random='no' values='a,b'/></unique>",
        1,
    )
    .unwrap_err();
    assert!(matches!(err, DmError::DuplicateExhausted(_)));
}

/// Tests that group sorts on its key and restarts members per group.
#[test]
fn test_group_resets_members() {
    let lines = gen(
        "all",
        "<group fields='1'>\
           <rows random='no' values='b,a,b,a'/>\
           <counter/>\
         </group>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["a,1", "a,2", "b,1", "b,2"]);
}

/// Tests that group only rewinds the members it lists.
#[test]
fn test_group_partial_reset() {
    let lines = gen(
        "all",
        "<group fields='1' reset='3'>\
           <rows random='no' values='x,y,x'/>\
           <counter/>\
           <counter begin='10'/>\
         </group>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["x,1,10", "x,2,11", "y,3,10"]);
}

/// Tests round robin and weighted picks.
#[test]
fn test_pick() {
    let lines = gen(
        "4",
        "<pick random='no'><row values='x'/><row values='y'/></pick>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["x", "y", "x", "y"]);

    let lines = gen(
        "40",
        "<pick distribute='99,1'><row values='often'/><row values='rare'/></pick>",
        5,
    )
    .unwrap();
    assert!(lines.iter().filter(|l| *l == "often").count() > 30);

    let err = gen("1", "<pick distribute='50,50'><row/></pick>", 1).unwrap_err();
    assert!(err
        .to_string()
        .contains("Distribution does not match source count"));
    let err = gen("1", "<pick random='no' distribute='100'><row/></pick>", 1).unwrap_err();
    assert!(err.to_string().contains("Cannot have distribution"));
}

/// Tests runs of rows reduced to their first and last members.
#[test]
fn test_range() {
    let lines = gen(
        "2",
        "<range width='3'><int_seq begin='1' end='100'/></range>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["1,3", "4,6"]);

    let lines = gen(
        "2",
        "<range width='2' continue='yes'>\
           <date_seq begin='2020-01-01' end='2020-12-31'/>\
         </range>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["2020-01-01,2020-01-02", "2020-01-02,2020-01-03"]);

    let lines = gen(
        "1",
        "<range width='3' fill='yes'><int_seq begin='1' end='9'/></range>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["1,2,3"]);
}

/// Tests that shuffle deals every row once per pass, reproducibly.
#[test]
fn test_shuffle() {
    let body = "<shuffle><int_seq begin='1' end='6'/></shuffle>";
    let first = gen("12", body, 77).unwrap();
    assert_eq!(first, gen("12", body, 77).unwrap());

    let expected: HashSet<String> = (1..=6).map(|n| n.to_string()).collect();
    for pass in first.chunks(6) {
        let dealt: HashSet<String> = pass.iter().cloned().collect();
        assert_eq!(dealt, expected);
    }
}

/// Tests discriminated selection with a default case.
#[test]
fn test_select() {
    let lines = gen(
        "3",
        "<select>\
           <rows random='no' values='foo,bar,baz'/>\
           <case values='foo'><row values='was foo'/></case>\
           <case values='bar,baz'><counter/></case>\
         </select>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["foo,was foo", "bar,1", "baz,2"]);

    let err = gen(
        "2",
        "<select>\
           <rows random='no' values='foo,qux'/>\
           <case values='foo'><row/></case>\
         </select>",
        1,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "No matching case for 'qux'");

    let err = gen("1", "<case><row/></case>", 1).unwrap_err();
    assert!(err.to_string().contains("case must be part of select"));
}

/// Tests field merging and concatenation order.
#[test]
fn test_merge_and_compose() {
    let lines = gen(
        "1",
        "<merge sep='-'><row values='a,,b'/><row values='c'/></merge>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["a-b-c"]);

    let lines = gen(
        "1",
        "<compose order='3,1'><row values='a,b'/><row values='c'/></compose>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["c,a"]);
}
