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

//! # Datamk Tag Validation Helpers
//!
//! Structural checks and typed attribute getters shared by every tag factory.
//! All failures are [`DmError::Config`] values located at the checked tag.

use super::element::DmElement;
use super::{ALL_STR, COUNT_ATTRIB, NO_STR, ORDER_ATTRIB, OUTPUT_ATTRIB, RANDOM_ATTRIB, YES_STR};
use crate::errors::{DmError, Result};
use crate::fields::DmFieldList;

pub fn require_attrs(e: &DmElement, attrs: &[&str]) -> Result<()> {
    match attrs.iter().find(|a| !e.has_attr(a)) {
        Some(missing) => Err(DmError::config(format!("missing attribute '{missing}'"), e)),
        None => Ok(()),
    }
}

pub fn allow_attrs(e: &DmElement, attrs: &[&str]) -> Result<()> {
    match e.attrs().iter().find(|(n, _)| !attrs.contains(&n.as_str())) {
        Some((name, _)) => Err(DmError::config(format!("invalid attribute '{name}'"), e)),
        None => Ok(()),
    }
}

pub fn forbid_attrs(e: &DmElement, attrs: &[&str]) -> Result<()> {
    match e.attrs().iter().find(|(n, _)| attrs.contains(&n.as_str())) {
        Some((name, _)) => Err(DmError::config(format!("invalid attribute '{name}'"), e)),
        None => Ok(()),
    }
}

pub fn require_child_tags(e: &DmElement, tags: &[&str]) -> Result<()> {
    match tags.iter().find(|t| e.find_child(t).is_none()) {
        Some(tag) => Err(DmError::config(
            format!("required child tag '{tag}' not found"),
            e,
        )),
        None => Ok(()),
    }
}

pub fn allow_child_tags(e: &DmElement, tags: &[&str]) -> Result<()> {
    match e.child_elements().find(|c| !tags.contains(&c.name())) {
        Some(child) => Err(DmError::config(
            format!("invalid child tag '{}'", child.name()),
            e,
        )),
        None => Ok(()),
    }
}

pub fn require_child_count(e: &DmElement, n: usize) -> Result<()> {
    if e.child_count() != n {
        return Err(DmError::config(format!("requires exactly {n} child elements"), e));
    }
    Ok(())
}

pub fn require_children(e: &DmElement) -> Result<()> {
    if e.child_count() == 0 {
        return Err(DmError::config("missing content", e));
    }
    Ok(())
}

pub fn forbid_children(e: &DmElement) -> Result<()> {
    if e.child_count() != 0 {
        return Err(DmError::config("cannot have content", e));
    }
    Ok(())
}

/// Integer attribute, falling back to `default` when absent.
pub fn get_int(e: &DmElement, attr: &str, default: Option<&str>) -> Result<i64> {
    let text = e.attr(attr).or(default).unwrap_or("");
    text.trim()
        .parse::<i64>()
        .map_err(|_| DmError::config(format!("expected integer value for '{attr}'"), e))
}

/// Real attribute, falling back to `default` when absent.
pub fn get_real(e: &DmElement, attr: &str, default: Option<&str>) -> Result<f64> {
    let text = e.attr(attr).or(default).unwrap_or("");
    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DmError::config(
            format!("expected real number value for '{attr}'"),
            e,
        )),
    }
}

/// `yes`/`no` attribute.
pub fn get_bool(e: &DmElement, attr: &str, default: &str) -> Result<bool> {
    let text = e.attr_or(attr, default);
    match text {
        YES_STR => Ok(true),
        NO_STR => Ok(false),
        other => Err(DmError::config(
            format!("invalid boolean value '{other}' for attribute '{attr}'"),
            e,
        )),
    }
}

/// The `random` flag, with the caller's default.
pub fn get_random(e: &DmElement, default: bool) -> Result<bool> {
    get_bool(e, RANDOM_ATTRIB, if default { YES_STR } else { NO_STR })
}

/// The `count` attribute; `None` stands for `all`.
pub fn get_count(e: &DmElement) -> Result<Option<usize>> {
    let text = e.attr_or(COUNT_ATTRIB, ALL_STR);
    if text == ALL_STR {
        return Ok(None);
    }
    let n = get_int(e, COUNT_ATTRIB, None)?;
    if n < 0 {
        return Err(DmError::config(format!("'{COUNT_ATTRIB}' cannot be negative"), e));
    }
    Ok(Some(n as usize))
}

/// Field list read from `attr`, located at `e` on failure.
pub fn get_fields(e: &DmElement, attr: &str) -> Result<DmFieldList> {
    DmFieldList::parse(e.attr_or(attr, "")).map_err(|err| err.at(e))
}

/// The `order` attribute as a field list.
pub fn get_order(e: &DmElement) -> Result<DmFieldList> {
    get_fields(e, ORDER_ATTRIB)
}

/// Output stream name; empty means the default output.
pub fn get_output_file(e: &DmElement) -> String {
    e.attr_or(OUTPUT_ATTRIB, "").to_string()
}
