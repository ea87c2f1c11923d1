//! Core `Function` trait and the lazy argument handle.

use std::borrow::Cow;
use std::sync::Arc;

use formulet_common::{EngineError, Value};
use formulet_parse::AstNode;

use crate::interpreter::Interpreter;
use crate::locale::Locale;

pub type CowValue<'a> = Cow<'a, Value>;

/// A lazily-evaluated function argument.
///
/// Built-ins receive handles rather than values so that conditional
/// functions (`IF`, `IFS`, `SWITCH`) evaluate only the branch they select.
pub struct ArgumentHandle<'a, 'b> {
    node: &'a AstNode,
    interp: &'a Interpreter<'b>,
}

impl<'a, 'b> ArgumentHandle<'a, 'b> {
    pub(crate) fn new(node: &'a AstNode, interp: &'a Interpreter<'b>) -> Self {
        Self { node, interp }
    }

    /// Evaluate this argument. Literals are borrowed, everything else is
    /// computed on demand.
    pub fn value(&self) -> Result<CowValue<'_>, EngineError> {
        if let AstNode::Literal(v) = self.node {
            return Ok(Cow::Borrowed(v));
        }
        self.interp.evaluate(self.node).map(Cow::Owned)
    }

    pub fn ast(&self) -> &'a AstNode {
        self.node
    }
}

/* ─────────────────────── Evaluation context ───────────────────────── */

pub trait ParamProvider: Sync {
    fn param(&self, name: &str) -> Option<&Value>;
}

pub trait FunctionProvider: Sync {
    fn function(&self, name: &str) -> Option<Arc<dyn Function>>;
}

/// Everything the interpreter needs at evaluation time.
pub trait EvalContext: ParamProvider + FunctionProvider {
    fn locale(&self) -> Locale {
        Locale::invariant()
    }
}

impl<T> EvalContext for T where T: ParamProvider + FunctionProvider {}

/* ───────────────────────── Function trait ─────────────────────────── */

/// A spreadsheet-style callable. Object-safe; registered by name.
pub trait Function: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn min_args(&self) -> usize {
        0
    }

    fn variadic(&self) -> bool {
        false
    }

    /// Fixed maximum arity; `None` when variadic.
    fn max_args(&self) -> Option<usize> {
        if self.variadic() {
            None
        } else {
            Some(self.min_args())
        }
    }

    fn eval<'a, 'b>(
        &self,
        args: &'a [ArgumentHandle<'a, 'b>],
        ctx: &dyn EvalContext,
    ) -> Result<Value, EngineError>;
}
