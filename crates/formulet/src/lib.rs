//! Formulet — sandboxed formula evaluation over named parameters.
//!
//! An expression is a single spreadsheet-style formula (`SUM`, `IF`,
//! `VLOOKUP`, infix arithmetic, `@name` parameter references). Evaluation
//! is a pure function of the expression text and the caller-supplied
//! environment: a textual safety gate runs first, the parsed AST is cached
//! process-wide, and the interpreter resolves `@name` references against
//! [`Params`].
//!
//! ```
//! use formulet::{Engine, Params, Value};
//!
//! let engine = Engine::new();
//! let params = Params::new().with("data", vec![10i64, 20, 30]);
//! let result = engine.evaluate("AVERAGE(@data)", &params)?;
//! assert_eq!(result, Value::Number(20.0));
//! # Ok::<(), formulet::EngineError>(())
//! ```
//!
//! Errors carry a spreadsheet-compatible kind (`#VALUE!`, `#REF!`,
//! `#NUM!`, `#DIV/0!`, `#N/A`, `#NAME?`) so hosts can catch by kind:
//!
//! ```
//! use formulet::{Engine, ErrorKind, Params};
//!
//! let engine = Engine::new();
//! let err = engine.evaluate("10/0", &Params::new()).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::Div);
//! assert_eq!(err.code(), "#DIV/0!");
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;

pub use formulet_common::{EngineError, ErrorKind, Value};
pub use formulet_eval::{
    ArgumentHandle, EvalContext, Function, FunctionRegistry, Locale, Params,
};
pub use formulet_parse::{AstNode, ParserError, TokenizerError};

use formulet_eval::builtins::criteria;
use formulet_eval::{CompileCache, Interpreter, Session, guard};

/// Occupancy of the process-wide caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries in the source-text → AST cache.
    pub compiled_scripts: usize,
    /// Entries in the parsed-criterion cache used by the `*IF` aggregates.
    pub options_cache: usize,
}

/// The evaluation engine: a compile cache plus the evaluate pipeline
/// (safety gate → parse → interpret).
///
/// `Engine` is `Sync`; concurrent `evaluate` calls are safe. Two calls
/// that miss the cache on the same key may both parse; the later insert
/// wins and the loser's work is discarded.
pub struct Engine {
    cache: CompileCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            cache: CompileCache::default(),
        }
    }

    pub fn with_max_cache_size(max_size: usize) -> Self {
        Self {
            cache: CompileCache::new(max_size),
        }
    }

    /// Evaluate an expression against a parameter environment.
    pub fn evaluate(&self, expression: &str, params: &Params) -> Result<Value, EngineError> {
        self.evaluate_with_registry(expression, params, None)
    }

    /// Evaluate with an additional host-provided function registry. The
    /// registry is consulted before the built-in library.
    pub fn evaluate_with_registry(
        &self,
        expression: &str,
        params: &Params,
        registry: Option<&FunctionRegistry>,
    ) -> Result<Value, EngineError> {
        guard::check(expression)?;
        let ast = match self.cache.get(expression) {
            Some(ast) => ast,
            None => {
                let parsed = formulet_parse::parse(expression).map_err(|e| {
                    EngineError::new(ErrorKind::Compile).with_message(e.to_string())
                })?;
                let parsed = Arc::new(parsed);
                self.cache.insert(expression.to_string(), Arc::clone(&parsed));
                parsed
            }
        };
        tracing::debug!(expression, "evaluating formula");
        let session = Session::new(params, registry);
        Interpreter::new(&session).evaluate(&ast)
    }

    /// Async entry point. Evaluation completes synchronously; the future
    /// exists for callers that expect non-blocking call sites.
    pub async fn evaluate_async(
        &self,
        expression: &str,
        params: &Params,
    ) -> Result<Value, EngineError> {
        self.evaluate(expression, params)
    }

    pub async fn evaluate_async_with_registry(
        &self,
        expression: &str,
        params: &Params,
        registry: Option<&FunctionRegistry>,
    ) -> Result<Value, EngineError> {
        self.evaluate_with_registry(expression, params, registry)
    }

    /* ───────────────────────── cache surface ───────────────────────── */

    pub fn max_cache_size(&self) -> usize {
        self.cache.max_size()
    }

    pub fn set_max_cache_size(&self, max_size: usize) {
        self.cache.set_max_size(max_size);
    }

    /// Empty both the compiled-script cache and the criterion cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
        criteria::clear_criteria_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            compiled_scripts: self.cache.len(),
            options_cache: criteria::criteria_cache_len(),
        }
    }
}

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::new);

/// The process-wide default engine backing the free functions.
pub fn default_engine() -> &'static Engine {
    &DEFAULT_ENGINE
}

/// Evaluate on the default engine.
pub async fn evaluate(expression: &str, params: &Params) -> Result<Value, EngineError> {
    DEFAULT_ENGINE.evaluate(expression, params)
}

/// Evaluate on the default engine with a host function registry.
pub async fn evaluate_with_registry(
    expression: &str,
    params: &Params,
    registry: Option<&FunctionRegistry>,
) -> Result<Value, EngineError> {
    DEFAULT_ENGINE.evaluate_with_registry(expression, params, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The criterion cache is process-wide; tests that clear or inspect it
    // must not overlap.
    static GLOBAL_CACHE_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn evaluate_pipeline_end_to_end() {
        let engine = Engine::new();
        let params = Params::new().with("x", 4i64);
        assert_eq!(
            engine.evaluate("SQRT(@x) + 1", &params).unwrap(),
            Value::Number(3.0)
        );
    }

    #[test]
    fn default_parameters_are_empty() {
        let engine = Engine::new();
        assert_eq!(
            engine.evaluate("SUM(1,2,3)", &Params::new()).unwrap(),
            Value::Number(6.0)
        );
    }

    #[test]
    fn unsafe_input_is_rejected_before_parsing() {
        let engine = Engine::new();
        let err = engine.evaluate("1; DROP TABLE", &Params::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Unsafe);
    }

    #[test]
    fn compile_failures_are_compile_kind() {
        let engine = Engine::new();
        let err = engine.evaluate("SUM(1,", &Params::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Compile);
    }

    #[test]
    fn cache_populates_and_clears() {
        let _guard = GLOBAL_CACHE_LOCK.lock().unwrap();
        let engine = Engine::new();
        engine.clear_cache();
        let _ = engine.evaluate("1+1", &Params::new()).unwrap();
        let _ = engine.evaluate("1+1", &Params::new()).unwrap();
        assert_eq!(engine.cache_stats().compiled_scripts, 1);
        let _ = engine.evaluate("2+2", &Params::new()).unwrap();
        assert_eq!(engine.cache_stats().compiled_scripts, 2);
        engine.clear_cache();
        assert_eq!(engine.cache_stats().compiled_scripts, 0);
    }

    #[test]
    fn failed_parses_are_not_cached() {
        let engine = Engine::new();
        let _ = engine.evaluate("1 +", &Params::new());
        assert_eq!(engine.cache_stats().compiled_scripts, 0);
    }

    #[test]
    fn criteria_cache_shows_up_in_stats() {
        let _guard = GLOBAL_CACHE_LOCK.lock().unwrap();
        let engine = Engine::new();
        engine.clear_cache();
        let params = Params::new().with("a", vec![1i64, 2, 3]);
        let _ = engine.evaluate("COUNTIF(@a, \">1\")", &params).unwrap();
        assert!(engine.cache_stats().options_cache >= 1);
    }

    #[test]
    fn max_cache_size_is_configurable() {
        let engine = Engine::with_max_cache_size(5);
        assert_eq!(engine.max_cache_size(), 5);
        for i in 0..6 {
            let _ = engine.evaluate(&format!("1+{i}"), &Params::new()).unwrap();
        }
        // Exceeding the bound evicted a batch of the oldest entries.
        assert!(engine.cache_stats().compiled_scripts < 6);
        engine.set_max_cache_size(100);
        assert_eq!(engine.max_cache_size(), 100);
    }

    #[test]
    fn cached_and_uncached_evaluations_agree() {
        let engine = Engine::new();
        let params = Params::new().with("n", 7i64);
        let first = engine.evaluate("@n * 2", &params).unwrap();
        let second = engine.evaluate("@n * 2", &params).unwrap();
        assert_eq!(first, second);
        // Same text, different environment: the cache keys on text only.
        let other = Params::new().with("n", 9i64);
        assert_eq!(
            engine.evaluate("@n * 2", &other).unwrap(),
            Value::Number(18.0)
        );
    }

    #[tokio::test]
    async fn async_wrapper_matches_sync_path() {
        let engine = Engine::new();
        let params = Params::new().with("data", vec![10i64, 20, 30]);
        let via_async = engine.evaluate_async("AVERAGE(@data)", &params).await.unwrap();
        let via_sync = engine.evaluate("AVERAGE(@data)", &params).unwrap();
        assert_eq!(via_async, via_sync);
    }

    #[tokio::test]
    async fn free_functions_use_the_default_engine() {
        let params = Params::new();
        assert_eq!(
            evaluate("IFERROR(10/0, \"ERR\")", &params).await.unwrap(),
            Value::Text("ERR".into())
        );
    }

    mod registry {
        use super::*;
        use std::sync::Arc;

        #[derive(Debug)]
        struct AnswerFn;

        impl Function for AnswerFn {
            fn name(&self) -> &'static str {
                "ANSWER"
            }
            fn eval<'a, 'b>(
                &self,
                _args: &'a [ArgumentHandle<'a, 'b>],
                _ctx: &dyn EvalContext,
            ) -> Result<Value, EngineError> {
                Ok(Value::Number(42.0))
            }
        }

        #[test]
        fn custom_registry_augments_builtins() {
            let engine = Engine::new();
            let registry = FunctionRegistry::new();
            registry.register(Arc::new(AnswerFn));
            assert_eq!(
                engine
                    .evaluate_with_registry("ANSWER() + SUM(1,1)", &Params::new(), Some(&registry))
                    .unwrap(),
                Value::Number(44.0)
            );
            // Without the registry the name is unknown.
            assert_eq!(
                engine.evaluate("ANSWER()", &Params::new()).unwrap_err().kind,
                ErrorKind::Name
            );
        }
    }
}
