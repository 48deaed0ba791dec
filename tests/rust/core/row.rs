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

//! # Datamk Core Tests - Row
//!
//! This module contains tests for copy-on-write rows, the row comparison
//! contract and 1-based field lists.
//!
//! ## Test Categories
//!
//! - **Sharing Tests**: Verify that copies stay isolated after mutation
//! - **Comparison Tests**: Verify ordering over all fields and field subsets
//! - **Field List Tests**: Verify parsing and column reordering
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test row
//! ```

use std::cmp::Ordering;

use datamk::{compare_rows, DmError, DmFieldList, DmFieldPairs, DmRow};
use proptest::prelude::*;

fn row(csv: &str) -> DmRow {
    DmRow::from_csv(csv).unwrap()
}

proptest! {
    /// Mutating a copy never changes the row it was copied from.
    #[test]
    fn copies_are_isolated(values in prop::collection::vec("[a-z]{0,6}", 0..8), extra in "[a-z]{1,4}") {
        let original = DmRow::from_fields(values.clone());
        let mut copy = original.clone();
        prop_assert!(copy.shares_storage(&original));

        copy.push(extra.clone());
        prop_assert!(!copy.shares_storage(&original));
        prop_assert_eq!(original.fields(), values.as_slice());
        prop_assert_eq!(copy.len(), values.len() + 1);
        prop_assert_eq!(copy.get(values.len()), Some(extra.as_str()));
    }

    /// A row always compares equal to itself, over any field subset.
    #[test]
    fn row_equals_itself(values in prop::collection::vec("[a-z0-9]{0,4}", 1..6)) {
        let r = DmRow::from_fields(values);
        prop_assert_eq!(compare_rows(&r, &r, &[]), Ordering::Equal);
        prop_assert_eq!(compare_rows(&r, &r, &[0]), Ordering::Equal);
    }
}

/// Tests appending a row to itself.
///
/// Verifies that the fields are doubled rather than read while being written.
#[test]
fn test_append_to_self() {
    let mut r = row("a,b");
    let alias = r.clone();
    r.append_row(&alias);
    assert_eq!(r.as_csv(), "a,b,a,b");
    assert_eq!(alias.as_csv(), "a,b");

    let mut solo = row("x");
    let same = solo.clone();
    solo.append_row(&same);
    assert_eq!(solo.fields(), ["x", "x"]);
}

/// Tests erasing fields and the out of range error.
#[test]
fn test_erase_and_index_errors() {
    let mut r = row("one,two,three");
    r.erase(1).unwrap();
    assert_eq!(r.as_csv(), "one,three");
    assert!(matches!(
        r.erase(5),
        Err(DmError::IndexOutOfRange { index: 5, len: 2 })
    ));
    assert!(r.at(2).is_err());
    r.clear();
    assert!(r.is_empty());
}

/// Tests lexicographic comparison and the length rule.
///
/// Verifies that a longer row with an equal prefix compares greater.
#[test]
fn test_compare_rows_length_rule() {
    let long = row("one,two,three");
    let short = row("one,two");
    assert_eq!(compare_rows(&long, &short, &[]), Ordering::Greater);
    assert_eq!(compare_rows(&short, &long, &[]), Ordering::Less);
    assert_eq!(compare_rows(&row("b"), &row("a,z"), &[]), Ordering::Greater);
}

/// Tests comparison limited to a field subset.
#[test]
fn test_compare_rows_on_fields() {
    let a = row("1,x,9");
    let b = row("1,y,0");
    assert_eq!(compare_rows(&a, &b, &[0]), Ordering::Equal);
    assert_eq!(compare_rows(&a, &b, &[1]), Ordering::Less);
    assert_eq!(compare_rows(&a, &b, &[2]), Ordering::Greater);
    // string comparison, not numeric
    assert_eq!(compare_rows(&row("10"), &row("9"), &[]), Ordering::Less);
}

/// Tests CSV rendering with quoting only where needed.
#[test]
fn test_csv_rendering() {
    let r = DmRow::from_fields(["plain", "with,comma", "", "say \"hi\""]);
    assert_eq!(r.as_csv(), "plain,\"with,comma\",,\"say \"\"hi\"\"\"");
    assert_eq!(r.debug_row(), "[1:plain][2:with,comma][3:][4:say \"hi\"]");
}

/// Tests field list parsing and reordering with missing columns.
#[test]
fn test_field_list_orders_row() {
    let fields = DmFieldList::parse("3,1,2,99").unwrap();
    assert_eq!(fields.indices(), [2, 0, 1, 98]);
    let ordered = fields.order_row(&row("one,two,three"));
    assert_eq!(ordered.fields(), ["three", "one", "two", ""]);

    assert!(DmFieldList::parse("").unwrap().is_empty());
    assert!(matches!(
        DmFieldList::parse("1,0"),
        Err(DmError::InvalidFieldIndex(f)) if f == "0"
    ));
    assert!(DmFieldList::parse("a").is_err());
}

/// Tests join pair parsing.
#[test]
fn test_field_pairs() {
    let pairs = DmFieldPairs::parse("1:1, 3:4").unwrap();
    assert_eq!(pairs.left(), [0, 2]);
    assert_eq!(pairs.right(), [0, 3]);
    assert!(matches!(
        DmFieldPairs::parse("1:2:3"),
        Err(DmError::InvalidPairSpec(_))
    ));
}
