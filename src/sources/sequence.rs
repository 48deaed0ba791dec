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

//! # Datamk Numeric Sources
//!
//! Counters, wrapping integer and real sequences, and random numbers drawn
//! from the session generator.
//!
//! ## Sequence Semantics
//!
//! A sequence returns its current value and then advances by `inc`. When the
//! next value would pass `end` the sequence restarts at `begin`, so with
//! `begin=1 end=10` the values run `1, 2, ..., 10, 1, 2, ...`. Descending
//! sequences use a negative `inc` and wrap when passing below `end`.
//!
//! ## Random Semantics
//!
//! `rand_int` and `rand_real` sample uniformly over `[begin, end)`, or from a
//! triangular distribution when `mode` is given. Without a range the whole
//! non-negative domain is used.

use crate::config::{
    allow_attrs, allow_child_tags, forbid_children, get_int, get_order, get_real,
    require_attrs, DmElement, BEGIN_ATTRIB, END_ATTRIB, INC_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::random::{DmDistribution, DmTriangular, DmUniform};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmOrder, DmSource};

const PLACES_ATTRIB: &str = "places";

/// Uniform over `[begin, end)`, or triangular when a mode is given.
pub(crate) fn distribution(
    begin: f64,
    end: f64,
    mode: Option<f64>,
) -> Result<Box<dyn DmDistribution>> {
    Ok(match mode {
        Some(mode) => Box::new(DmTriangular::new(begin, mode, end)?),
        None => Box::new(DmUniform::new(begin, end)?),
    })
}

/// Unbounded counter.
pub struct DmCounter {
    begin: i64,
    value: i64,
    inc: i64,
    order: DmOrder,
}

impl DmSource for DmCounter {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let value = self.value.to_string();
        self.value = self.value.wrapping_add(self.inc);
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn reset(&mut self) {
        self.value = self.begin;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "counter"
    }
}

pub fn counter_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    allow_attrs(e, &[BEGIN_ATTRIB, INC_ATTRIB, ORDER_ATTRIB])?;
    allow_child_tags(e, &[])?;
    let begin = get_int(e, BEGIN_ATTRIB, Some("1"))?;
    Ok(Box::new(DmCounter {
        begin,
        value: begin,
        inc: get_int(e, INC_ATTRIB, Some("1"))?,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Rejects a zero increment or one pointing away from `end`.
fn check_increment<T: PartialOrd + Default>(e: &DmElement, begin: T, end: T, inc: T) -> Result<()> {
    let zero = T::default();
    if inc == zero {
        return Err(DmError::config("increment cannot be zero", e));
    }
    if (begin < end && inc < zero) || (begin > end && inc > zero) {
        return Err(DmError::config("invalid begin/end/inc combination", e));
    }
    Ok(())
}

/// Wrapping integer sequence.
pub struct DmIntSeq {
    begin: i64,
    now: i64,
    end: i64,
    inc: i64,
    order: DmOrder,
}

impl DmSource for DmIntSeq {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let value = self.now.to_string();
        self.now = match self.now.checked_add(self.inc) {
            Some(next) if self.inc > 0 && next <= self.end => next,
            Some(next) if self.inc < 0 && next >= self.end => next,
            _ => self.begin,
        };
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        let steps = self.begin.abs_diff(self.end) / self.inc.unsigned_abs();
        Ok(i64::try_from(steps.saturating_add(1)).unwrap_or(i64::MAX))
    }

    fn reset(&mut self) {
        self.now = self.begin;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "int_seq"
    }
}

pub fn int_seq_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB, INC_ATTRIB, ORDER_ATTRIB])?;
    require_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB])?;
    let begin = get_int(e, BEGIN_ATTRIB, None)?;
    let end = get_int(e, END_ATTRIB, None)?;
    let inc = get_int(e, INC_ATTRIB, Some("1"))?;
    check_increment(e, begin, end, inc)?;
    Ok(Box::new(DmIntSeq {
        begin,
        now: begin,
        end,
        inc,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Formats `value` with a fixed number of decimal places.
pub fn format_real(value: f64, places: usize) -> String {
    format!("{value:.places$}")
}

fn get_places(e: &DmElement) -> Result<usize> {
    let places = get_int(e, PLACES_ATTRIB, Some("2"))?;
    if !(0..=10).contains(&places) {
        return Err(DmError::config(
            format!("Invalid number of decimal places: {places}"),
            e,
        ));
    }
    Ok(places as usize)
}

/// Wrapping real sequence.
pub struct DmRealSeq {
    begin: f64,
    now: f64,
    end: f64,
    inc: f64,
    places: usize,
    order: DmOrder,
}

impl DmSource for DmRealSeq {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let value = format_real(self.now, self.places);
        let next = self.now + self.inc;
        let past_end = if self.inc > 0.0 { next > self.end } else { next < self.end };
        self.now = if past_end { self.begin } else { next };
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1 + ((self.begin - self.end).abs() / self.inc.abs()) as i64)
    }

    fn reset(&mut self) {
        self.now = self.begin;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "real_seq"
    }
}

pub fn real_seq_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(
        e,
        &[BEGIN_ATTRIB, END_ATTRIB, INC_ATTRIB, ORDER_ATTRIB, PLACES_ATTRIB],
    )?;
    require_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB])?;
    let begin = get_real(e, BEGIN_ATTRIB, None)?;
    let end = get_real(e, END_ATTRIB, None)?;
    let inc = get_real(e, INC_ATTRIB, Some("1.0"))?;
    let places = get_places(e)?;
    check_increment(e, begin, end, inc)?;
    Ok(Box::new(DmRealSeq {
        begin,
        now: begin,
        end,
        inc,
        places,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Random number source; `places` of `None` means integer output.
pub struct DmRandNumber {
    dist: Box<dyn DmDistribution>,
    places: Option<usize>,
    order: DmOrder,
}

impl DmSource for DmRandNumber {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let value = match self.places {
            Some(places) => format_real(self.dist.next_real(ctx.rng), places),
            None => self.dist.next_int(ctx.rng).to_string(),
        };
        Ok(self.order.apply(DmRow::from_fields([value])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        match self.places {
            Some(_) => "rand_real",
            None => "rand_int",
        }
    }
}

/// Reads `begin`/`end` (both or neither) and an optional `mode`.
fn random_range(
    e: &DmElement,
    read: fn(&DmElement, &str) -> Result<f64>,
    domain_end: f64,
) -> Result<Box<dyn DmDistribution>> {
    let (begin, end) = if e.has_attr(BEGIN_ATTRIB) || e.has_attr(END_ATTRIB) {
        let begin = read(e, BEGIN_ATTRIB)?;
        let end = read(e, END_ATTRIB)?;
        if begin >= end {
            return Err(DmError::config("'begin' must be less than 'end'", e));
        }
        (begin, end)
    } else {
        (0.0, domain_end)
    };
    let mode = match e.has_attr(MODE_ATTRIB) {
        true => {
            let mode = read(e, MODE_ATTRIB)?;
            if mode < begin || mode > end {
                return Err(DmError::config(format!("Bad mode value: {mode}"), e));
            }
            Some(mode)
        }
        false => None,
    };
    distribution(begin, end, mode).map_err(|err| err.at(e))
}

pub fn rand_int_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB])?;
    let dist = random_range(
        e,
        |e, a| get_int(e, a, None).map(|v| v as f64),
        i32::MAX as f64,
    )?;
    Ok(Box::new(DmRandNumber {
        dist,
        places: None,
        order: DmOrder::new(get_order(e)?),
    }))
}

pub fn rand_real_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(
        e,
        &[BEGIN_ATTRIB, END_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB, PLACES_ATTRIB],
    )?;
    let places = get_places(e)?;
    let dist = random_range(e, |e, a| get_real(e, a, None), f64::MAX)?;
    Ok(Box::new(DmRandNumber {
        dist,
        places: Some(places),
        order: DmOrder::new(get_order(e)?),
    }))
}
