//! Integer arithmetic and comparison commands.
//!
//! There is no numeric type in the language; these `(1 ← 2)` functions
//! decode their string operands with the shared integer grammar and
//! re-encode the result in decimal.

use std::rc::Rc;
use tglng::error::EvalError;
use tglng::prelude::*;
use tglng::text::parse_integer_str;

fn operand(value: &str) -> Result<i64, EvalError> {
    parse_integer_str(value)
        .ok_or_else(|| EvalError::new(format!("invalid integer for operator: {value}")))
}

fn bool_str(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

macro_rules! int_function {
    ($name:ident, $lhs:ident, $rhs:ident, $result:expr) => {
        fn $name(
            out: &mut [String],
            input: &[String],
            _: &mut Interpreter,
            _: u32,
        ) -> Result<(), EvalError> {
            let $lhs = operand(&input[0])?;
            let $rhs = operand(&input[1])?;
            out[0] = $result;
            Ok(())
        }
    };
}

int_function![add, a, b, a.wrapping_add(b).to_string()];
int_function![sub, a, b, a.wrapping_sub(b).to_string()];
int_function![mul, a, b, a.wrapping_mul(b).to_string()];
int_function![equ, a, b, bool_str(a == b)];
int_function![neq, a, b, bool_str(a != b)];
int_function![slt, a, b, bool_str(a < b)];
int_function![sgt, a, b, bool_str(a > b)];
int_function![leq, a, b, bool_str(a <= b)];
int_function![geq, a, b, bool_str(a >= b)];

fn div(out: &mut [String], input: &[String], _: &mut Interpreter, _: u32) -> Result<(), EvalError> {
    let a = operand(&input[0])?;
    let b = operand(&input[1])?;
    if b == 0 {
        return Err(EvalError::new("divide by zero"));
    }
    out[0] = a.wrapping_div(b).to_string();
    Ok(())
}

fn modulo(
    out: &mut [String],
    input: &[String],
    _: &mut Interpreter,
    _: u32,
) -> Result<(), EvalError> {
    let a = operand(&input[0])?;
    let b = operand(&input[1])?;
    if b == 0 {
        return Err(EvalError::new("divide by zero"));
    }
    out[0] = a.wrapping_rem(b).to_string();
    Ok(())
}

pub fn register(interp: &mut Interpreter) {
    interp.bind_long("num-add", Rc::new(FunctionParser::new(1, 2, add)));
    interp.bind_long("num-sub", Rc::new(FunctionParser::new(1, 2, sub)));
    interp.bind_long("num-mul", Rc::new(FunctionParser::new(1, 2, mul)));
    interp.bind_long("num-div", Rc::new(FunctionParser::new(1, 2, div)));
    interp.bind_long("num-mod", Rc::new(FunctionParser::new(1, 2, modulo)));
    interp.bind_long("num-equ", Rc::new(FunctionParser::new(1, 2, equ)));
    interp.bind_long("num-neq", Rc::new(FunctionParser::new(1, 2, neq)));
    interp.bind_long("num-slt", Rc::new(FunctionParser::new(1, 2, slt)));
    interp.bind_long("num-sgt", Rc::new(FunctionParser::new(1, 2, sgt)));
    interp.bind_long("num-leq", Rc::new(FunctionParser::new(1, 2, leq)));
    interp.bind_long("num-geq", Rc::new(FunctionParser::new(1, 2, geq)));
}

#[cfg(test)]
mod tests {
    use crate::{exec_failure_test, exec_test};

    exec_test![addition, "`num-add(1, 2)", "3"];
    exec_test![subtraction_negative_result, "`num-sub(1, 2)", "-1"];
    exec_test![multiplication, "`num-mul(-3, 4)", "-12"];
    exec_test![division_truncates, "`num-div(7, 2)", "3"];
    exec_test![modulo, "`num-mod(7, 2)", "1"];
    exec_failure_test![divide_by_zero, "`num-div(1, 0)"];
    exec_failure_test![modulo_by_zero, "`num-mod(1, 0)"];
    exec_test![base_prefixed_operands, "`num-add(0x10, 0b10)", "18"];
    exec_test![comparisons, "`num-slt(3, 5)`num-sgt(3, 5)`num-equ(3, 3)", "101"];
    exec_test![ordering_edges, "`num-leq(5, 5)`num-geq(4, 5)`num-neq(4, 5)", "101"];
    exec_test![nested_arithmetic, "`num-mul(`num-add(1, 2), 4)", "12"];
    exec_failure_test![non_numeric_operand, "`num-add(x, 1)"];
}
