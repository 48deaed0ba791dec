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

//! # Datamk Eval Source
//!
//! `eval` feeds the fields of its children's row to a compiled expression as
//! positional parameters and outputs the values the expression emits.
//!
//! No expression language ships with the crate. An embedding application
//! installs one with [`DmRegistry::set_expression_compiler`]; without it an
//! `eval` tag is rejected when the script is built.
//!
//! [`DmRegistry::set_expression_compiler`]: crate::registry::DmRegistry::set_expression_compiler

use crate::config::{
    allow_attrs, get_order, require_attrs, require_children, DmElement, ORDER_ATTRIB,
};
use crate::context::DmContext;
use crate::errors::{DmError, Result};
use crate::registry::DmBuilder;
use crate::row::DmRow;
use crate::source::{DmBoxedSource, DmComposite, DmSource};

const EXPR_ATTRIB: &str = "expr";

/// A compiled expression.
pub trait DmExpression {
    /// Evaluates against positional parameters, returning the emitted values.
    fn evaluate(&mut self, params: &[String]) -> Result<Vec<String>>;
}

/// Compiles expression text, failing on syntax errors.
pub type DmExpressionCompiler = fn(&str) -> Result<Box<dyn DmExpression>>;

pub struct DmEval {
    inner: DmComposite,
    expr: Box<dyn DmExpression>,
}

impl DmSource for DmEval {
    fn get(&mut self, ctx: &mut DmContext<'_>) -> Result<DmRow> {
        let input = self.inner.concat(ctx)?;
        let output = self.expr.evaluate(input.fields())?;
        Ok(self.inner.finish(DmRow::from_fields(output)))
    }

    fn size(&mut self, ctx: &mut DmContext<'_>) -> Result<i64> {
        self.inner.max_size(ctx)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn discard(&mut self) {
        self.inner.discard();
    }

    fn last(&self) -> &DmRow {
        self.inner.last()
    }

    fn tag(&self) -> &str {
        "eval"
    }
}

pub fn eval_factory(e: &DmElement, b: &mut DmBuilder<'_>) -> Result<DmBoxedSource> {
    require_children(e)?;
    require_attrs(e, &[EXPR_ATTRIB])?;
    allow_attrs(e, &[ORDER_ATTRIB, EXPR_ATTRIB])?;
    let Some(compile) = b.registry().expression_compiler() else {
        return Err(DmError::config("no expression evaluator installed", e));
    };
    let expr = compile(e.attr_or(EXPR_ATTRIB, ""))
        .map_err(|err| DmError::config(format!("Invalid expression: {err}"), e))?;
    let mut inner = DmComposite::new(e.name(), get_order(e)?);
    b.add_children(e, &mut inner)?;
    Ok(Box::new(DmEval { inner, expr }))
}
