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

//! # Datamk Date Sources
//!
//! `date_seq` steps through calendar dates in `YYYY-MM-DD` form; `rand_date`
//! (also registered as `random_date`) draws dates from a range.
//!
//! Month and year steps are calendar steps: stepping one month from
//! `2020-01-31` lands on `2020-02-29`, the last valid day.

use chrono::{Datelike, Days, Months, NaiveDate, Utc};

use crate::config::{
    allow_attrs, forbid_children, get_int, get_order, require_attrs, DmElement, BEGIN_ATTRIB,
    END_ATTRIB, INC_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::random::DmDistribution;
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmOrder, DmSource};

use super::sequence::distribution;

const INC_TYPE_ATTRIB: &str = "inc_type";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Unit of a `date_seq` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmDateStep {
    Days,
    Weeks,
    Months,
    Years,
}

impl DmDateStep {
    fn parse(text: &str, e: &DmElement) -> Result<Self> {
        match text {
            "days" => Ok(DmDateStep::Days),
            "weeks" => Ok(DmDateStep::Weeks),
            "months" => Ok(DmDateStep::Months),
            "years" => Ok(DmDateStep::Years),
            other => Err(DmError::config(
                format!("'{other}' not valid increment type"),
                e,
            )),
        }
    }

    fn advance(self, date: NaiveDate, inc: u32) -> Option<NaiveDate> {
        match self {
            DmDateStep::Days => date.checked_add_days(Days::new(inc.into())),
            DmDateStep::Weeks => date.checked_add_days(Days::new(7 * u64::from(inc))),
            DmDateStep::Months => date.checked_add_months(Months::new(inc)),
            DmDateStep::Years => date.checked_add_months(Months::new(12 * inc)),
        }
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn get_date(e: &DmElement, attr: &str, default: &str) -> Result<NaiveDate> {
    let text = e.attr_or(attr, default);
    parse_date(text).ok_or_else(|| DmError::config(format!("invalid date '{text}'"), e))
}

/// Whole calendar months from `from` to `to`.
fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    let months = i64::from(to.year() - from.year()) * 12 + i64::from(to.month())
        - i64::from(from.month());
    if to.day() < from.day() {
        months - 1
    } else {
        months
    }
}

/// Calendar date sequence. With `begin == end` it never wraps.
pub struct DmDateSeq {
    begin: NaiveDate,
    now: NaiveDate,
    end: NaiveDate,
    inc: u32,
    step: DmDateStep,
    order: DmOrder,
}

impl DmSource for DmDateSeq {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        if self.now > self.end && self.begin != self.end {
            self.now = self.begin;
        }
        let row = DmRow::from_fields([format_date(self.now)]);
        self.now = self
            .step
            .advance(self.now, self.inc)
            .ok_or_else(|| DmError::value(format!("Date out of range after {}", self.now)))?;
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        if self.begin == self.end {
            return Ok(1);
        }
        let inc = i64::from(self.inc);
        let days = (self.end - self.begin).num_days();
        Ok(1 + match self.step {
            DmDateStep::Days => days / inc,
            DmDateStep::Weeks => days / (7 * inc),
            DmDateStep::Months => months_between(self.begin, self.end) / inc,
            DmDateStep::Years => months_between(self.begin, self.end) / (12 * inc),
        })
    }

    fn reset(&mut self) {
        self.now = self.begin;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "date_seq"
    }
}

pub fn date_seq_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    require_attrs(e, &[BEGIN_ATTRIB])?;
    allow_attrs(
        e,
        &[BEGIN_ATTRIB, END_ATTRIB, INC_ATTRIB, INC_TYPE_ATTRIB, ORDER_ATTRIB],
    )?;
    let begin = get_date(e, BEGIN_ATTRIB, "")?;
    let end = get_date(e, END_ATTRIB, &format_date(begin))?;
    if end < begin {
        return Err(DmError::config("Invalid begin/end values", e));
    }
    let inc = get_int(e, INC_ATTRIB, Some("1"))?;
    if !(1..=i64::from(u32::MAX)).contains(&inc) {
        return Err(DmError::config("'inc' must be greater than zero", e));
    }
    let step = DmDateStep::parse(e.attr_or(INC_TYPE_ATTRIB, "days"), e)?;
    Ok(Box::new(DmDateSeq {
        begin,
        now: begin,
        end,
        inc: inc as u32,
        step,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Random date in `[begin, end)`, or always `begin` when the range is one day.
pub struct DmRandDate {
    begin: NaiveDate,
    dist: Box<dyn DmDistribution>,
    order: DmOrder,
}

impl DmSource for DmRandDate {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let offset = self.dist.next_int(ctx.rng).max(0) as u64;
        let date = self
            .begin
            .checked_add_days(Days::new(offset))
            .ok_or_else(|| DmError::value("Random date out of range"))?;
        Ok(self.order.apply(DmRow::from_fields([format_date(date)])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "rand_date"
    }
}

/// Without a range the current calendar year is used.
pub fn rand_date_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB])?;
    let (begin, end) = if e.has_attr(BEGIN_ATTRIB) || e.has_attr(END_ATTRIB) {
        require_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB])?;
        (get_date(e, BEGIN_ATTRIB, "")?, get_date(e, END_ATTRIB, "")?)
    } else {
        let year = Utc::now().year();
        let first = |y| {
            NaiveDate::from_ymd_opt(y, 1, 1)
                .ok_or_else(|| DmError::config(format!("invalid year {y}"), e))
        };
        (first(year)?, first(year + 1)?)
    };
    if end < begin {
        return Err(DmError::config("Invalid begin/end values", e));
    }
    let mode = match e.has_attr(MODE_ATTRIB) {
        true => {
            let mode = get_date(e, MODE_ATTRIB, "")?;
            if mode < begin || mode > end {
                return Err(DmError::config("Invalid modal value", e));
            }
            Some((mode - begin).num_days() as f64)
        }
        false => None,
    };
    let span = ((end - begin).num_days().max(1)) as f64;
    let dist = distribution(0.0, span, mode).map_err(|err| err.at(e))?;
    Ok(Box::new(DmRandDate {
        begin,
        dist,
        order: DmOrder::new(get_order(e)?),
    }))
}
