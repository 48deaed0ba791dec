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

//! Time of day sources, `time_seq` and `rand_time`, in `hh:mm:ss` form.

use chrono::NaiveTime;

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

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Parses `h:m:s` into seconds since midnight.
pub fn parse_time(text: &str) -> Result<i64> {
    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(DmError::value(format!("Invalid time format: {text}")));
    }
    let component = |c: &str, max: i64| -> Result<i64> {
        match c.trim().parse::<i64>() {
            Ok(n) if (0..max).contains(&n) => Ok(n),
            _ => Err(DmError::value(format!("Invalid time component: {c}"))),
        }
    };
    Ok(component(parts[0], 24)? * 3600 + component(parts[1], 60)? * 60 + component(parts[2], 60)?)
}

/// Formats seconds since midnight, wrapping into a single day.
pub fn format_time(secs: i64) -> String {
    let secs = secs.rem_euclid(SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

fn get_time(e: &DmElement, attr: &str) -> Result<i64> {
    parse_time(e.attr_or(attr, "")).map_err(|err| err.at(e))
}

pub struct DmTimeSeq {
    begin: i64,
    now: i64,
    end: i64,
    inc: i64,
    order: DmOrder,
}

impl DmSource for DmTimeSeq {
    fn get(&mut self, _ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let row = DmRow::from_fields([format_time(self.now)]);
        self.now += self.inc;
        if self.now > self.end {
            self.now = self.begin;
        }
        Ok(self.order.apply(row))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1 + (self.end - self.begin) / self.inc)
    }

    fn reset(&mut self) {
        self.now = self.begin;
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "time_seq"
    }
}

pub fn time_seq_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB, INC_ATTRIB, ORDER_ATTRIB])?;
    require_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB])?;
    let begin = get_time(e, BEGIN_ATTRIB)?;
    let end = get_time(e, END_ATTRIB)?;
    if begin >= end {
        return Err(DmError::config("begin must be before end", e));
    }
    let inc = get_int(e, INC_ATTRIB, Some("1"))?;
    if inc <= 0 || inc >= SECONDS_PER_DAY {
        return Err(DmError::config(format!("Invalid increment: {inc}"), e));
    }
    Ok(Box::new(DmTimeSeq {
        begin,
        now: begin,
        end,
        inc,
        order: DmOrder::new(get_order(e)?),
    }))
}

/// Random time; samples are offsets from `begin`.
pub struct DmRandTime {
    begin: i64,
    dist: Box<dyn DmDistribution>,
    order: DmOrder,
}

impl DmSource for DmRandTime {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let secs = self.begin + self.dist.next_int(ctx.rng);
        Ok(self.order.apply(DmRow::from_fields([format_time(secs)])))
    }

    fn size(&mut self, _ctx: &mut DmContext<'_>) -> Result<i64> {
        Ok(1)
    }

    fn last(&self) -> &DmRow {
        self.order.last()
    }

    fn tag(&self) -> &str {
        "rand_time"
    }
}

/// Without a range the whole day is used.
pub fn rand_time_factory(e: &DmElement, _b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    forbid_children(e)?;
    allow_attrs(e, &[BEGIN_ATTRIB, END_ATTRIB, MODE_ATTRIB, ORDER_ATTRIB])?;
    let (begin, end) = if e.has_attr(BEGIN_ATTRIB) || e.has_attr(END_ATTRIB) {
        let begin = get_time(e, BEGIN_ATTRIB)?;
        let end = get_time(e, END_ATTRIB)?;
        if begin >= end {
            return Err(DmError::config("begin must be before end", e));
        }
        (begin, end)
    } else {
        (0, SECONDS_PER_DAY)
    };
    let mode = match e.has_attr(MODE_ATTRIB) {
        true => {
            let mode = get_time(e, MODE_ATTRIB)?;
            if mode < begin || mode > end {
                return Err(DmError::config("Invalid modal value", e));
            }
            Some((mode - begin) as f64)
        }
        false => None,
    };
    let dist = distribution(0.0, (end - begin) as f64, mode).map_err(|err| err.at(e))?;
    Ok(Box::new(DmRandTime {
        begin,
        dist,
        order: DmOrder::new(get_order(e)?),
    }))
}
