use crate::coercion::{loose_eq, to_logical, to_number};
use crate::environment::Params;
use crate::function::{ArgumentHandle, EvalContext, FunctionProvider, ParamProvider};
use crate::function_registry::{self, FunctionRegistry};
use formulet_common::{EngineError, Value};
use formulet_parse::{AstNode, BinOp, UnaryOp};
use std::sync::Arc;

/// One evaluation's view of the world: the caller's parameters plus the
/// function lookup chain (host overlay first, global built-ins second).
pub struct Session<'a> {
    params: &'a Params,
    overlay: Option<&'a FunctionRegistry>,
}

impl<'a> Session<'a> {
    pub fn new(params: &'a Params, overlay: Option<&'a FunctionRegistry>) -> Self {
        Self { params, overlay }
    }
}

impl ParamProvider for Session<'_> {
    fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

impl FunctionProvider for Session<'_> {
    fn function(&self, name: &str) -> Option<Arc<dyn crate::function::Function>> {
        if let Some(overlay) = self.overlay {
            if let Some(f) = overlay.get(name) {
                return Some(f);
            }
        }
        function_registry::get(name)
    }
}

pub struct Interpreter<'a> {
    pub context: &'a dyn EvalContext,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a dyn EvalContext) -> Self {
        Self { context }
    }

    /* ===================  public  =================== */
    pub fn evaluate(&self, node: &AstNode) -> Result<Value, EngineError> {
        match node {
            AstNode::Literal(v) => Ok(v.clone()),
            AstNode::ParamRef(name) => self.eval_param_ref(name),
            AstNode::UnaryOp { op, expr } => self.eval_unary(*op, expr),
            AstNode::BinaryOp { op, left, right } => self.eval_binary(*op, left, right),
            AstNode::Call { name, args } => self.eval_call(name, args),
            AstNode::IfError { inner, fallback } => Ok(match self.evaluate(inner) {
                Ok(v) => v,
                Err(_) => Value::Text(fallback.clone()),
            }),
        }
    }

    /* ===================  parameter refs  =================== */
    // References resolve lazily to the raw bound value; each consumer's
    // argument contract drives scalar/sequence coercion. A bare `@x` bound
    // to null therefore evaluates to null, which is a valid result.
    fn eval_param_ref(&self, name: &str) -> Result<Value, EngineError> {
        self.context.param(name).cloned().ok_or_else(|| {
            EngineError::new_ref().with_message(format!("Unknown parameter '@{name}'"))
        })
    }

    /* ===================  unary ops  =================== */
    fn eval_unary(&self, op: UnaryOp, expr: &AstNode) -> Result<Value, EngineError> {
        let v = self.evaluate(expr)?;
        match op {
            UnaryOp::Plus => Ok(Value::Number(to_number(&v)?)),
            UnaryOp::Neg => Ok(Value::Number(-to_number(&v)?)),
            UnaryOp::Not => Ok(Value::Bool(!to_logical(&v)?)),
        }
    }

    /* ===================  binary ops  =================== */
    fn eval_binary(
        &self,
        op: BinOp,
        left: &AstNode,
        right: &AstNode,
    ) -> Result<Value, EngineError> {
        // Boolean operators short-circuit; the right operand must not be
        // evaluated when the left already decides.
        match op {
            BinOp::And => {
                if !to_logical(&self.evaluate(left)?)? {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(to_logical(&self.evaluate(right)?)?));
            }
            BinOp::Or => {
                if to_logical(&self.evaluate(left)?)? {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(to_logical(&self.evaluate(right)?)?));
            }
            _ => {}
        }

        let l = self.evaluate(left)?;
        let r = self.evaluate(right)?;

        match op {
            BinOp::Eq => Ok(Value::Bool(loose_eq(&l, &r))),
            BinOp::Ne => Ok(Value::Bool(!loose_eq(&l, &r))),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => self.compare(op, &l, &r),
            BinOp::Add => Ok(Value::Number(to_number(&l)? + to_number(&r)?)),
            BinOp::Sub => Ok(Value::Number(to_number(&l)? - to_number(&r)?)),
            BinOp::Mul => Ok(Value::Number(to_number(&l)? * to_number(&r)?)),
            BinOp::Div => {
                let d = to_number(&r)?;
                if d == 0.0 {
                    return Err(EngineError::new_div());
                }
                Ok(Value::Number(to_number(&l)? / d))
            }
            BinOp::Rem => {
                let d = to_number(&r)?;
                if d == 0.0 {
                    return Err(EngineError::new_div());
                }
                Ok(Value::Number(to_number(&l)? % d))
            }
            BinOp::Pow => Ok(Value::Number(power(to_number(&l)?, to_number(&r)?)?)),
            BinOp::And | BinOp::Or => unreachable!("handled above"),
        }
    }

    /// Relational comparison: numeric when both operands coerce, string
    /// (case-insensitive) when both are text, `#VALUE!` otherwise.
    fn compare(&self, op: BinOp, l: &Value, r: &Value) -> Result<Value, EngineError> {
        if let (Value::Text(a), Value::Text(b)) = (l, r) {
            let ord = a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase());
            let res = match op {
                BinOp::Lt => ord.is_lt(),
                BinOp::Le => ord.is_le(),
                BinOp::Gt => ord.is_gt(),
                BinOp::Ge => ord.is_ge(),
                _ => unreachable!(),
            };
            return Ok(Value::Bool(res));
        }
        let a = to_number(l)?;
        let b = to_number(r)?;
        let res = match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            BinOp::Ge => a >= b,
            _ => unreachable!(),
        };
        Ok(Value::Bool(res))
    }

    /* ===================  function calls  =================== */
    fn eval_call(&self, name: &str, args: &[AstNode]) -> Result<Value, EngineError> {
        let Some(fun) = self.context.function(name) else {
            return Err(
                EngineError::new_name().with_message(format!("Unknown function '{name}'"))
            );
        };
        if args.len() < fun.min_args() {
            return Err(EngineError::new_value().with_message(format!(
                "{} expects at least {} argument(s), got {}",
                fun.name(),
                fun.min_args(),
                args.len()
            )));
        }
        if let Some(max) = fun.max_args() {
            if args.len() > max {
                return Err(EngineError::new_value().with_message(format!(
                    "{} expects at most {} argument(s), got {}",
                    fun.name(),
                    max,
                    args.len()
                )));
            }
        }
        let handles: Vec<ArgumentHandle> =
            args.iter().map(|n| ArgumentHandle::new(n, self)).collect();
        fun.eval(&handles, self.context)
    }
}

/// Exponentiation with spreadsheet error mapping.
pub(crate) fn power(base: f64, exp: f64) -> Result<f64, EngineError> {
    if base == 0.0 && exp < 0.0 {
        return Err(EngineError::new_num()
            .with_message("Zero cannot be raised to a negative power"));
    }
    if base < 0.0 && exp.fract() != 0.0 {
        return Err(EngineError::new_num()
            .with_message("Negative base with fractional exponent"));
    }
    let r = base.powf(exp);
    if !r.is_finite() {
        return Err(EngineError::new_num());
    }
    Ok(r)
}
