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

//! # Datamk Source Tests - Sequences
//!
//! This module contains tests for the leaf sources: literal rows, counters,
//! numeric, date and time sequences, and masks.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test sequences
//! ```

use std::fs;

use datamk::io::DmFileManager;
use datamk::{DmModelManager, DmRng, DmRunMode, DmSession};

fn run_script(xml: &str, seed: u64) -> datamk::Result<Vec<String>> {
    let mut manager = DmModelManager::new();
    manager.add_model_from_str(xml, "sequences.xml", DmRunMode::GenForm)?;
    let (files, out) = DmFileManager::capture();
    let mut session = DmSession::new(DmRng::with_seed(seed), files);
    manager.run_models(&mut session)?;
    Ok(out.lines())
}

fn gen(count: usize, body: &str) -> Vec<String> {
    run_script(&format!("<csvt><gen count='{count}'>{body}</gen></csvt>"), 1).unwrap()
}

/// Tests that an integer sequence wraps back to its beginning.
#[test]
fn test_int_seq_wraps() {
    let lines = gen(12, "<int_seq begin='1' end='10'/>");
    let expected: Vec<String> = (1..=10).chain(1..=2).map(|n| n.to_string()).collect();
    assert_eq!(lines, expected);
}

/// Tests descending sequences with an increment that does not land on the end.
#[test]
fn test_int_seq_descending() {
    assert_eq!(gen(5, "<int_seq begin='10' end='1' inc='-4'/>"), vec!["10", "6", "2", "10", "6"]);
}

/// Tests that a sequence ending at the largest integer still wraps.
#[test]
fn test_int_seq_wraps_at_max() {
    assert_eq!(
        gen(
            4,
            "<int_seq begin='9223372036854775805' end='9223372036854775807' inc='2'/>"
        ),
        vec![
            "9223372036854775805",
            "9223372036854775807",
            "9223372036854775805",
            "9223372036854775807"
        ]
    );
}

/// Tests that a sequence spanning the whole integer range can be sized.
#[test]
fn test_int_seq_full_range() {
    let lines = run_script(
        "<csvt><gen>\
           <int_seq begin='-9223372036854775807' end='9223372036854775807' inc='9223372036854775807'/>\
         </gen></csvt>",
        1,
    )
    .unwrap();
    assert_eq!(lines, vec!["-9223372036854775807", "0", "9223372036854775807"]);
}

/// Tests that a generator without a count uses the sequence size.
#[test]
fn test_sequence_sizes_the_generator() {
    let lines = run_script("<csvt><gen><int_seq begin='0' end='20' inc='5'/></gen></csvt>", 1).unwrap();
    assert_eq!(lines, vec!["0", "5", "10", "15", "20"]);
}

/// Tests the unbounded counter and column ordering.
#[test]
fn test_counter() {
    assert_eq!(gen(3, "<counter begin='100' inc='10'/>"), vec!["100", "110", "120"]);
    assert_eq!(
        gen(2, "<compose order='2,1'><counter/><row values='x'/></compose>"),
        vec!["x,1", "x,2"]
    );
}

/// Tests real sequences and decimal places.
#[test]
fn test_real_seq() {
    assert_eq!(
        gen(4, "<real_seq begin='0' end='1' inc='0.5'/>"),
        vec!["0.00", "0.50", "1.00", "0.00"]
    );
    assert_eq!(gen(1, "<real_seq begin='1' end='2' places='0'/>"), vec!["1"]);
    let err = run_script("<csvt><gen><real_seq begin='0' end='1' places='11'/></gen></csvt>", 1)
        .unwrap_err();
    assert!(err.to_string().contains("Invalid number of decimal places: 11"));
}

/// Tests literal rows, value lists and text content.
#[test]
fn test_row_and_rows() {
    assert_eq!(gen(2, "<row values='a,b'/>"), vec!["a,b", "a,b"]);
    assert_eq!(gen(1, "<row/>"), vec![""]);
    assert_eq!(
        gen(4, "<rows random='no'>\n  x,1\n  \"y,z\",2\n</rows>"),
        vec!["x,1", "\"y,z\",2", "x,1", "\"y,z\",2"]
    );
}

/// Tests weighted rows, where a zero weight is never chosen.
#[test]
fn test_rows_frequency() {
    let lines = gen(50, "<rows freq='2'>\n  common,100\n  never,0\n</rows>");
    assert!(lines.iter().all(|l| l == "common"));

    let err = run_script(
        "<csvt><gen><rows freq='2'>\n a,30\n b,30\n</rows></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Frequencies must sum to 100%"));
}

/// Tests that bad frequency columns and weights are reported.
#[test]
fn test_rows_frequency_errors() {
    for freq in ["0", "-2"] {
        let err = run_script(
            &format!("<csvt><gen><rows freq='{freq}'>\n a,100\n</rows></gen></csvt>"),
            1,
        )
        .unwrap_err();
        assert!(
            err.to_string().starts_with("XML tag 'rows' Invalid frequency column"),
            "{err}"
        );
    }

    let err = run_script(
        "<csvt><gen><rows freq='2'>\n a,110\n b,-10\n</rows></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Frequency value must be in range 0 to 100"));
}

/// Tests reading rows from a data file next to the script.
#[test]
fn test_datafile_relative_to_script() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("names.csv"), "ann,1\nbob,2\n").unwrap();
    let script = dir.path().join("names.xml");
    fs::write(
        &script,
        "<csvt><gen><datafile file='names.csv' random='no'/></gen></csvt>",
    )
    .unwrap();

    let mut manager = DmModelManager::new();
    manager.add_model_from_file(&script, DmRunMode::GenForm).unwrap();
    let (files, out) = DmFileManager::capture();
    manager
        .run_models(&mut DmSession::new(DmRng::with_seed(1), files))
        .unwrap();
    assert_eq!(out.lines(), vec!["ann,1", "bob,2"]);
}

/// Tests daily and calendar month date steps.
#[test]
fn test_date_seq() {
    assert_eq!(
        gen(4, "<date_seq begin='2020-02-27' end='2020-03-01'/>"),
        vec!["2020-02-27", "2020-02-28", "2020-02-29", "2020-03-01"]
    );
    assert_eq!(
        gen(3, "<date_seq begin='2021-01-31' end='2021-12-31' inc_type='months'/>"),
        vec!["2021-01-31", "2021-02-28", "2021-03-28"]
    );
    assert_eq!(
        gen(3, "<date_seq begin='2020-01-01' end='2020-01-15' inc='1' inc_type='weeks'/>"),
        vec!["2020-01-01", "2020-01-08", "2020-01-15"]
    );
    let err = run_script(
        "<csvt><gen><date_seq begin='2020-01-01' inc_type='hours'/></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("'hours' not valid increment type"));
}

/// Tests that a date sequence wraps after its end date.
#[test]
fn test_date_seq_wraps() {
    assert_eq!(
        gen(3, "<date_seq begin='2020-01-01' end='2020-01-02'/>"),
        vec!["2020-01-01", "2020-01-02", "2020-01-01"]
    );
}

/// Tests random dates stay inside their range.
#[test]
fn test_rand_date_in_range() {
    for line in gen(40, "<rand_date begin='2020-03-01' end='2020-03-05'/>") {
        assert!(line.as_str() >= "2020-03-01" && line.as_str() < "2020-03-05", "{line}");
    }
    for line in gen(10, "<random_date begin='2020-03-01' end='2020-03-01'/>") {
        assert_eq!(line, "2020-03-01");
    }
}

/// Tests time sequences and random times.
#[test]
fn test_times() {
    assert_eq!(
        gen(4, "<time_seq begin='23:59:58' end='23:59:59'/>"),
        vec!["23:59:58", "23:59:59", "23:59:58", "23:59:59"]
    );
    assert_eq!(
        gen(3, "<time_seq begin='08:00:00' end='09:00:00' inc='1800'/>"),
        vec!["08:00:00", "08:30:00", "09:00:00"]
    );
    for line in gen(30, "<rand_time begin='12:00:00' end='12:01:00'/>") {
        assert!(line.starts_with("12:00:"), "{line}");
    }
    let err = run_script(
        "<csvt><gen><time_seq begin='10:00:00' end='09:00:00'/></gen></csvt>",
        1,
    )
    .unwrap_err();
    assert!(err.to_string().contains("begin must be before end"));
}

/// Tests character class masks.
#[test]
fn test_mask() {
    for line in gen(20, "<mask value='ID-[0-9]*3[a-c]*1:2'/>") {
        let rest = line.strip_prefix("ID-").unwrap();
        let (digits, letters) = rest.split_at(3);
        assert!(digits.chars().all(|c| c.is_ascii_digit()), "{line}");
        assert!((1..=2).contains(&letters.len()), "{line}");
        assert!(letters.chars().all(|c| ('a'..='c').contains(&c)), "{line}");
    }
    let err = run_script("<csvt><gen><mask value='[z-a]'/></gen></csvt>", 1).unwrap_err();
    assert!(err.to_string().starts_with("XML tag 'mask'"));
}

/// Tests template masks with escapes.
#[test]
fn test_masked() {
    for line in gen(20, "<masked mask='\\A-Aa-90'/>") {
        let chars: Vec<char> = line.chars().collect();
        assert_eq!(chars.len(), 7, "{line}");
        assert_eq!(chars[0], 'A');
        assert_eq!(chars[1], '-');
        assert!(chars[2].is_ascii_uppercase());
        assert!(chars[3].is_ascii_lowercase());
        assert_eq!(chars[4], '-');
        assert!(chars[5] != '0' && chars[5].is_ascii_digit());
        assert!(chars[6].is_ascii_digit());
    }
}
