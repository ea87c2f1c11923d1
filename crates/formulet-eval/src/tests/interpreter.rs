use super::{evaluate, number};
use crate::environment::Params;
use formulet_common::{ErrorKind, Value};

fn empty() -> Params {
    Params::new()
}

#[test]
fn basic_arithmetic() {
    assert_eq!(number(evaluate("1+2", &empty())), 3.0);
    assert_eq!(number(evaluate("3-1", &empty())), 2.0);
    assert_eq!(number(evaluate("2*3", &empty())), 6.0);
    assert_eq!(number(evaluate("6/2", &empty())), 3.0);
    assert_eq!(number(evaluate("2^3", &empty())), 8.0);
    assert_eq!(number(evaluate("7%3", &empty())), 1.0);
}

#[test]
fn order_of_operations() {
    assert_eq!(number(evaluate("1+2*3", &empty())), 7.0);
    assert_eq!(number(evaluate("(1+2)*3", &empty())), 9.0);
    assert_eq!(number(evaluate("2^3+1", &empty())), 9.0);
    assert_eq!(number(evaluate("2^(3+1)", &empty())), 16.0);
    // Right-associative power: 2^(3^2)
    assert_eq!(number(evaluate("2^3^2", &empty())), 512.0);
}

#[test]
fn unary_operators() {
    assert_eq!(number(evaluate("-5", &empty())), -5.0);
    assert_eq!(number(evaluate("+5", &empty())), 5.0);
    assert_eq!(number(evaluate("--5", &empty())), 5.0);
    assert_eq!(evaluate("!true", &empty()).unwrap(), Value::Bool(false));
    assert_eq!(evaluate("!0", &empty()).unwrap(), Value::Bool(true));
}

#[test]
fn value_coercion() {
    assert_eq!(number(evaluate("true+1", &empty())), 2.0);
    assert_eq!(number(evaluate("false+1", &empty())), 1.0);
    assert_eq!(number(evaluate("\"5\"+2", &empty())), 7.0);
    let err = evaluate("\"x\"+2", &empty()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Value);
}

#[test]
fn division_and_modulo_by_zero() {
    assert_eq!(evaluate("10/0", &empty()).unwrap_err().kind, ErrorKind::Div);
    assert_eq!(evaluate("10%0", &empty()).unwrap_err().kind, ErrorKind::Div);
}

#[test]
fn power_error_cases() {
    assert_eq!(evaluate("0 ^ -1", &empty()).unwrap_err().kind, ErrorKind::Num);
    assert_eq!(
        evaluate("(-2) ^ 0.5", &empty()).unwrap_err().kind,
        ErrorKind::Num
    );
}

#[test]
fn comparisons() {
    assert_eq!(evaluate("2 < 3", &empty()).unwrap(), Value::Bool(true));
    assert_eq!(evaluate("3 <= 3", &empty()).unwrap(), Value::Bool(true));
    assert_eq!(evaluate("2 > 3", &empty()).unwrap(), Value::Bool(false));
    assert_eq!(evaluate("\"b\" > \"a\"", &empty()).unwrap(), Value::Bool(true));
    assert_eq!(
        evaluate("\"abc\" == \"abc\"", &empty()).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(evaluate("1 == true", &empty()).unwrap(), Value::Bool(false));
    assert_eq!(evaluate("1 != 2", &empty()).unwrap(), Value::Bool(true));
    // Mixed numeric-ish relational comparison coerces.
    assert_eq!(evaluate("\"10\" > 9", &empty()).unwrap(), Value::Bool(true));
}

#[test]
fn boolean_operators_short_circuit() {
    assert_eq!(
        evaluate("true && false", &empty()).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(evaluate("1 || 0", &empty()).unwrap(), Value::Bool(true));
    // The right side would raise; short-circuit means it never runs.
    assert_eq!(
        evaluate("true || (1/0)", &empty()).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        evaluate("false && (1/0)", &empty()).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        evaluate("false || (1/0)", &empty()).unwrap_err().kind,
        ErrorKind::Div
    );
}

#[test]
fn parameter_references() {
    let params = Params::new().with("x", 2i64).with("y", 3i64);
    assert_eq!(number(evaluate("@x + @y", &params)), 5.0);
    assert_eq!(number(evaluate("@x * @x", &params)), 4.0);
}

#[test]
fn parameter_key_matching_is_exact() {
    let params = Params::new().with("Rate", 2i64);
    assert_eq!(number(evaluate("@Rate", &params)), 2.0);
    assert_eq!(
        evaluate("@rate", &params).unwrap_err().kind,
        ErrorKind::Ref
    );
}

#[test]
fn unknown_parameter_is_ref() {
    assert_eq!(evaluate("@nope", &empty()).unwrap_err().kind, ErrorKind::Ref);
}

#[test]
fn unknown_function_is_name() {
    assert_eq!(
        evaluate("NOPE(1)", &empty()).unwrap_err().kind,
        ErrorKind::Name
    );
}

#[test]
fn null_parameter_is_a_valid_top_level_result() {
    let params = Params::new().with("x", Value::Null);
    assert_eq!(evaluate("@x", &params).unwrap(), Value::Null);
}

#[test]
fn null_in_arithmetic_is_na() {
    let params = Params::new().with("x", Value::Null);
    assert_eq!(evaluate("@x + 1", &params).unwrap_err().kind, ErrorKind::Na);
}

#[test]
fn sequence_in_arithmetic_is_value_error() {
    let params = Params::new().with("a", vec![1i64, 2]);
    assert_eq!(
        evaluate("@a + 1", &params).unwrap_err().kind,
        ErrorKind::Value
    );
}

#[test]
fn iferror_catches_any_error() {
    assert_eq!(
        evaluate("IFERROR(10/0, \"ERR\")", &empty()).unwrap(),
        Value::Text("ERR".into())
    );
    assert_eq!(
        evaluate("IFERROR(@missing, \"no param\")", &empty()).unwrap(),
        Value::Text("no param".into())
    );
    assert_eq!(
        evaluate("IFERROR(SQRT(0-1), \"neg\")", &empty()).unwrap(),
        Value::Text("neg".into())
    );
}

#[test]
fn iferror_neutral_when_protected_expression_succeeds() {
    assert_eq!(number(evaluate("IFERROR(2+3, \"X\")", &empty())), 5.0);
    let params = Params::new().with("x", Value::Null);
    assert_eq!(
        evaluate("IFERROR(@x, \"X\")", &params).unwrap(),
        Value::Null
    );
}

#[test]
fn iferror_nests_to_arbitrary_depth() {
    assert_eq!(
        evaluate("IFERROR(IFERROR(10/0, \"inner\"), \"outer\")", &empty()).unwrap(),
        Value::Text("inner".into())
    );
    // The inner catch yields "a"; "a" + 1 then fails and the outer
    // IFERROR catches that too.
    assert_eq!(
        evaluate("IFERROR(IFERROR(1/0, 'a') + 1, 'b')", &empty()).unwrap(),
        Value::Text("b".into())
    );
}

#[test]
fn function_names_match_case_insensitively() {
    assert_eq!(number(evaluate("sum(1,2)", &empty())), 3.0);
    assert_eq!(number(evaluate("Sum(1,2)", &empty())), 3.0);
}

#[test]
fn arity_is_enforced() {
    assert_eq!(
        evaluate("SQRT()", &empty()).unwrap_err().kind,
        ErrorKind::Value
    );
    assert_eq!(
        evaluate("SQRT(1,2)", &empty()).unwrap_err().kind,
        ErrorKind::Value
    );
    assert_eq!(
        evaluate("ROUND(1)", &empty()).unwrap_err().kind,
        ErrorKind::Value
    );
}

#[test]
fn errors_propagate_through_function_arguments() {
    assert_eq!(
        evaluate("SUM(1, 1/0)", &empty()).unwrap_err().kind,
        ErrorKind::Div
    );
    assert_eq!(
        evaluate("ABS(@missing)", &empty()).unwrap_err().kind,
        ErrorKind::Ref
    );
}

#[test]
fn repeated_evaluation_is_pure() {
    let params = Params::new().with("data", vec![10i64, 20, 30]);
    let first = evaluate("AVERAGE(@data) + SUM(1,2)", &params).unwrap();
    for _ in 0..5 {
        assert_eq!(
            evaluate("AVERAGE(@data) + SUM(1,2)", &params).unwrap(),
            first
        );
    }
}

#[test]
fn compile_errors_surface_as_compile_kind() {
    assert_eq!(
        evaluate("1 +", &empty()).unwrap_err().kind,
        ErrorKind::Compile
    );
    assert_eq!(
        evaluate("1 << 2", &empty()).unwrap_err().kind,
        ErrorKind::Compile
    );
    assert_eq!(
        evaluate("IFERROR(1/0, 1+1)", &empty()).unwrap_err().kind,
        ErrorKind::Compile
    );
}
