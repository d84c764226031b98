//! Restricted code executor.
//!
//! Runs model-generated code against an allowlisted environment: ~20 safe
//! builtins plus the `math` module, and nothing else. Two modes are tried
//! in order — the source is first parsed as a single expression and its
//! value rendered; if that parse fails, it is run as an
//! indentation-structured statement sequence and only captured `print`
//! output matters.
//!
//! The global namespace is a lookup function, immutable by construction.
//! Local bindings and the output buffer live inside one [`execute`] call
//! and are dropped when it returns, so concurrent calls cannot share or
//! interleave anything.

mod ast;
mod builtins;
mod interp;
mod parser;
mod token;
mod value;

pub use builtins::{Builtin, MathFunc};
pub use interp::Interpreter;
pub use value::Value;

use crate::error::EvalError;

/// Executes `code` and returns its textual outcome: trimmed captured
/// output if any was produced, else the repr of a non-`None` expression
/// value, else the literal `"None"`.
pub fn execute(code: &str) -> Result<String, EvalError> {
    match parser::parse_expression(code) {
        Ok(expr) => {
            let mut interp = Interpreter::new();
            let result = interp.eval(&expr)?;
            let output = interp.take_output();
            let trimmed = output.trim();
            if !trimmed.is_empty() {
                Ok(trimmed.to_string())
            } else if result != Value::None {
                Ok(result.repr())
            } else {
                Ok("None".to_string())
            }
        }
        Err(_) => {
            let stmts = parser::parse_program(code).map_err(as_execution_fault)?;
            let mut interp = Interpreter::new();
            interp.run(&stmts)?;
            let output = interp.take_output();
            let trimmed = output.trim();
            if trimmed.is_empty() {
                Ok("None".to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
    }
}

// In statement mode a malformed source is a compile fault of the submitted
// code, reported under the same kind as its runtime faults.
fn as_execution_fault(err: EvalError) -> EvalError {
    match err {
        EvalError::Parse(message) => EvalError::ExecutionFault(format!("invalid syntax: {message}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_output_is_captured() {
        assert_eq!(execute("print(1+1)").unwrap(), "2");
    }

    #[test]
    fn expression_value_is_rendered_without_print() {
        assert_eq!(execute("sum([1,2,3])").unwrap(), "6");
    }

    #[test]
    fn bare_expression_repr() {
        assert_eq!(execute("1 + 2 * 3").unwrap(), "7");
        assert_eq!(execute("10 / 4").unwrap(), "2.5");
        assert_eq!(execute("'a' + 'b'").unwrap(), "'ab'");
        assert_eq!(execute("[1, 2] + [3]").unwrap(), "[1, 2, 3]");
        assert_eq!(execute("(1,)").unwrap(), "(1,)");
        assert_eq!(execute("{'a': 1}").unwrap(), "{'a': 1}");
    }

    #[test]
    fn output_beats_expression_value() {
        assert_eq!(execute("print('hello')").unwrap(), "hello");
    }

    #[test]
    fn none_expression_renders_as_none_literal() {
        assert_eq!(execute("None").unwrap(), "None");
    }

    #[test]
    fn statements_with_no_output_return_none_literal() {
        assert_eq!(execute("x = 1\ny = x + 1").unwrap(), "None");
    }

    #[test]
    fn statement_sequence_with_output() {
        let code = "total = 0\nfor i in range(5):\n    total += i\nprint(total)";
        assert_eq!(execute(code).unwrap(), "10");
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let code = "\
n = 0
acc = 0
while True:
    n += 1
    if n > 10:
        break
    if n % 2 == 0:
        continue
    acc += n
print(acc)";
        assert_eq!(execute(code).unwrap(), "25");
    }

    #[test]
    fn if_elif_else() {
        let code = "\
x = 7
if x < 5:
    print('small')
elif x < 10:
    print('medium')
else:
    print('large')";
        assert_eq!(execute(code).unwrap(), "medium");
    }

    #[test]
    fn list_comprehension() {
        assert_eq!(
            execute("[x * x for x in range(5) if x % 2 == 1]").unwrap(),
            "[1, 9]"
        );
    }

    #[test]
    fn comprehension_variable_does_not_leak() {
        assert!(matches!(
            execute("[x for x in range(3)]\nprint(x)"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn math_module_is_reachable() {
        assert_eq!(execute("math.sqrt(16)").unwrap(), "4.0");
        assert_eq!(execute("math.floor(2.7)").unwrap(), "2");
    }

    #[test]
    fn import_is_an_execution_fault() {
        assert!(matches!(
            execute("import os"),
            Err(EvalError::ExecutionFault(_))
        ));
        assert!(matches!(
            execute("from os import path"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn function_definitions_are_rejected() {
        assert!(matches!(
            execute("def f():\n    pass"),
            Err(EvalError::ExecutionFault(_))
        ));
        assert!(matches!(
            execute("f = lambda x: x"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn dangerous_names_do_not_resolve() {
        for code in ["open('/etc/passwd')", "__import__('os')", "eval('1')", "exec('1')"] {
            assert!(
                matches!(execute(code), Err(EvalError::ExecutionFault(_))),
                "{code} must not resolve"
            );
        }
    }

    #[test]
    fn attribute_escape_hatches_are_closed() {
        assert!(matches!(
            execute("(1).__class__"),
            Err(EvalError::ExecutionFault(_))
        ));
        assert!(matches!(
            execute("'x'.upper()"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn division_by_zero_is_a_runtime_fault() {
        assert!(matches!(execute("1 / 0"), Err(EvalError::RuntimeFault(_))));
        assert!(matches!(execute("1 // 0"), Err(EvalError::RuntimeFault(_))));
        assert!(matches!(execute("1 % 0"), Err(EvalError::RuntimeFault(_))));
    }

    #[test]
    fn type_errors_are_execution_faults() {
        assert!(matches!(
            execute("1 + 'a'"),
            Err(EvalError::ExecutionFault(_))
        ));
        assert!(matches!(
            execute("len(5)"),
            Err(EvalError::ExecutionFault(_))
        ));
        assert!(matches!(
            execute("[1] < 'a'"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn integer_overflow_is_a_fault_not_a_wrap() {
        assert!(matches!(
            execute("9223372036854775807 + 1"),
            Err(EvalError::RuntimeFault(_))
        ));
    }

    #[test]
    fn failed_calls_return_no_partial_output() {
        // Output produced before the fault is discarded with it.
        let result = execute("print('before')\nboom()");
        assert!(matches!(result, Err(EvalError::ExecutionFault(_))));
    }

    #[test]
    fn locals_do_not_survive_between_calls() {
        assert_eq!(execute("x = 41\nprint(x + 1)").unwrap(), "42");
        assert!(matches!(
            execute("print(x)"),
            Err(EvalError::ExecutionFault(_))
        ));
    }

    #[test]
    fn executing_twice_is_idempotent() {
        let code = "acc = []\nfor i in range(3):\n    acc = acc + [i]\nprint(acc)";
        assert_eq!(execute(code).unwrap(), execute(code).unwrap());
    }

    #[test]
    fn floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(execute("-7 // 2").unwrap(), "-4");
        assert_eq!(execute("-7 % 2").unwrap(), "1");
        assert_eq!(execute("7 % -2").unwrap(), "-1");
    }

    #[test]
    fn booleans_participate_in_arithmetic() {
        assert_eq!(execute("True + True").unwrap(), "2");
        assert_eq!(execute("sum([True, False, True])").unwrap(), "2");
    }

    #[test]
    fn boolean_operators_return_operands() {
        assert_eq!(execute("0 or 'fallback'").unwrap(), "'fallback'");
        assert_eq!(execute("1 and 2").unwrap(), "2");
        assert_eq!(execute("not []").unwrap(), "True");
    }

    #[test]
    fn membership_and_comparison() {
        assert_eq!(execute("3 in [1, 2, 3]").unwrap(), "True");
        assert_eq!(execute("'ell' in 'hello'").unwrap(), "True");
        assert_eq!(execute("5 not in range(3)").unwrap(), "True");
        assert_eq!(execute("1 == 1.0").unwrap(), "True");
        assert_eq!(execute("1 == 'a'").unwrap(), "False");
    }

    #[test]
    fn builtin_surface() {
        assert_eq!(execute("max([3, 1, 2])").unwrap(), "3");
        assert_eq!(execute("min(4, 2, 8)").unwrap(), "2");
        assert_eq!(execute("len('hello')").unwrap(), "5");
        assert_eq!(execute("list(zip([1, 2], ['a', 'b']))").unwrap(), "[(1, 'a'), (2, 'b')]");
        assert_eq!(execute("list(enumerate(['a', 'b']))").unwrap(), "[(0, 'a'), (1, 'b')]");
        assert_eq!(execute("abs(-5)").unwrap(), "5");
        assert_eq!(execute("pow(2, 10)").unwrap(), "1024");
        assert_eq!(execute("round(2.5)").unwrap(), "2");
        assert_eq!(execute("int('12')").unwrap(), "12");
        assert_eq!(execute("float('2.5')").unwrap(), "2.5");
        assert_eq!(execute("bool([])").unwrap(), "False");
    }

    #[test]
    fn subscripts_and_item_assignment() {
        assert_eq!(execute("[10, 20, 30][-1]").unwrap(), "30");
        assert_eq!(execute("{'a': 1}['a']").unwrap(), "1");
        let code = "d = {}\nd['k'] = 7\nxs = [0, 0]\nxs[1] = 5\nprint(d['k'], xs)";
        assert_eq!(execute(code).unwrap(), "7 [0, 5]");
    }

    #[test]
    fn multiple_prints_preserve_order() {
        assert_eq!(execute("print(1)\nprint(2)\nprint(3)").unwrap(), "1\n2\n3");
    }

    #[test]
    fn empty_source_runs_to_none() {
        assert_eq!(execute("").unwrap(), "None");
        assert_eq!(execute("# just a comment").unwrap(), "None");
    }

    #[test]
    fn range_materialization_is_bounded() {
        assert!(matches!(
            execute("list(range(100000000))"),
            Err(EvalError::ExecutionFault(_))
        ));
    }
}
