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

//! # Datamk Mask Sources
//!
//! Two tags generate single-field strings from a pattern.
//!
//! ## `mask`
//!
//! Each mask token is a literal character or a bracketed character class,
//! optionally followed by a repeat count:
//!
//! - `[a-z0-9_]`: one character drawn from the expanded class
//! - `x*3`: exactly three slots
//! - `x*2:5`: between two and five slots
//! - `x?4`: four optional slots, each present with even odds
//!
//! A backslash escapes the following character. Malformed classes and counts
//! are rejected when the tag is built.
//!
//! ## `masked`
//!
//! Position-for-position substitution: `A` an uppercase letter, `a` a
//! lowercase letter, `0` any digit, `9` a non-zero digit, `\x` the literal `x`.
//! Everything else is copied.

use std::iter::Peekable;
use std::vec::IntoIter;

use crate::config::{
    allow_attrs, forbid_children, get_order, require_attrs, DmElement, ORDER_ATTRIB,
    VALUE_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::random::DmRng;
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmOrder, DmSource, DM_NOSIZE};

const MASK_ATTRIB: &str = "mask";

/// One encoded mask position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmMaskSlot {
    pub min: usize,
    pub max: usize,
    pub optional: bool,
    pub charset: Vec<char>,
}

impl DmMaskSlot {
    fn generate(&self, rng: &mut DmRng, out: &mut String) -> Result<()> {
        let count = if self.min == self.max {
            self.min
        } else {
            self.min + rng.random(0, (1 + self.max - self.min) as i64)? as usize
        };
        for _ in 0..count {
            if !self.optional || rng.random(0, 2)? != 0 {
                let i = rng.random(0, self.charset.len() as i64)? as usize;
                out.push(self.charset[i]);
            }
        }
        Ok(())
    }
}

/// Characters of a mask, each flagged as escaped or not.
type DmMaskChars = Peekable<IntoIter<(char, bool)>>;

fn mask_chars(mask: &str) -> DmMaskChars {
    let mut out = Vec::new();
    let mut chars = mask.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => out.push((next, true)),
                None => out.push(('\\', false)),
            },
            other => out.push((other, false)),
        }
    }
    out.into_iter().peekable()
}

fn expand_range(begin: char, end: char) -> Result<Vec<char>> {
    if begin >= end {
        return Err(DmError::value(format!("Invalid range {begin}-{end}")));
    }
    Ok((begin..=end).collect())
}

/// Reads a class body up to the closing `]`.
fn read_class(src: &mut DmMaskChars) -> Result<Vec<char>> {
    let mut set = Vec::new();
    while let Some((c, escaped)) = src.next() {
        if c == ']' && !escaped {
            if set.is_empty() {
                break;
            }
            return Ok(set);
        }
        if c == '-' && !escaped {
            continue;
        }
        match src.peek() {
            Some(&('-', false)) => {
                src.next();
                match src.next() {
                    Some((end, _)) => set.extend(expand_range(c, end)?),
                    None => break,
                }
            }
            _ => set.push(c),
        }
    }
    Err(DmError::value("Invalid range"))
}

fn read_number(src: &mut DmMaskChars) -> Result<usize> {
    let mut digits = String::new();
    while let Some(&(c, false)) = src.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        src.next();
    }
    digits
        .parse::<usize>()
        .map_err(|_| DmError::value("Invalid character count"))
}

fn read_count(src: &mut DmMaskChars) -> Result<(usize, usize)> {
    let min = read_number(src)?;
    let mut max = min;
    if let Some(&(':', false)) = src.peek() {
        src.next();
        max = read_number(src)?;
    }
    if min > max || max == 0 {
        return Err(DmError::value("Invalid character count"));
    }
    Ok((min, max))
}

/// Encodes a mask pattern into slots.
pub fn encode_mask(mask: &str) -> Result<Vec<DmMaskSlot>> {
    let mut src = mask_chars(mask);
    let mut slots = Vec::new();
    while let Some((c, escaped)) = src.next() {
        let charset = if c == '[' && !escaped {
            read_class(&mut src)?
        } else {
            vec![c]
        };
        let (mut min, mut max, mut optional) = (1, 1, false);
        if let Some(&(r, false)) = src.peek() {
            if r == '*' || r == '?' {
                src.next();
                optional = r == '?';
                (min, max) = read_count(&mut src)?;
            }
        }
        slots.push(DmMaskSlot {
            min,
            max,
            optional,
            charset,
        });
    }
    Ok(slots)
}

pub struct DmMask {
    slots: Vec<DmMaskSlot>,
    order: DmOrder,
}

impl DmSource for DmMask {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let mut value = String::new();
        for slot in &self.slots {
            slot.generate(ctx.rng, &mut value)?;
        }
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "mask"
    }
}

pub fn mask_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    require_attrs(e, &[VALUE_ATTRIB])?;
    allow_attrs(e, &[VALUE_ATTRIB])?;
    let slots = encode_mask(e.attr_or(VALUE_ATTRIB, "")).map_err(|err| err.at(e))?;
    Ok(Box::new(DmMask {
        slots,
        order: DmOrder::default(),
    }))
}

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const NONZERO: &[u8] = b"123456789";

pub struct DmMasked {
    mask: Vec<char>,
    order: DmOrder,
}

impl DmSource for DmMasked {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let mut value = String::with_capacity(self.mask.len());
        let mut chars = self.mask.iter().copied();
        while let Some(c) = chars.next() {
            let class = match c {
                '\\' => {
                    value.push(chars.next().unwrap_or('\\'));
                    continue;
                }
                'A' => UPPER,
                'a' => LOWER,
                '0' => DIGITS,
                '9' => NONZERO,
                other => {
                    value.push(other);
                    continue;
                }
            };
            value.push(class[ctx.rng.raw() % class.len()] as char);
        }
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(DM_NOSIZE)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "masked"
    }
}

pub fn masked_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    require_attrs(e, &[MASK_ATTRIB])?;
    allow_attrs(e, &[MASK_ATTRIB, ORDER_ATTRIB])?;
    Ok(Box::new(DmMasked {
        mask: e.attr_or(MASK_ATTRIB, "").chars().collect(),
        order: DmOrder::new(get_order(e)?),
    }))
}
