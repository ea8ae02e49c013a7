//! Arithmetic and comparison
//!
//! Prefix natives (add, subtract, and friends) plus the infix operator words bound
//! to the same implementations. The operators carry the INFIX flag and are
//! reached only through lookahead; left-to-right, no precedence.

use crate::eval::{Emit, Evaluator};
use crate::natives::param_of;
use lith_core::{Error, INFIX, Kind, Value};

const NUMERIC: &[Kind] = &[Kind::Integer, Kind::Decimal];
const COMPARABLE: &[Kind] = &[
    Kind::Integer,
    Kind::Decimal,
    Kind::Text,
    Kind::Logic,
    Kind::None,
    Kind::Word,
    Kind::Block,
];

pub(crate) fn install(ev: &mut Evaluator) {
    let math2 = || vec![param_of("value1", NUMERIC), param_of("value2", NUMERIC)];
    let cmp2 = || vec![param_of("value1", COMPARABLE), param_of("value2", COMPARABLE)];

    ev.register_native("add", math2(), 0, native_add);
    ev.register_native("subtract", math2(), 0, native_subtract);
    ev.register_native("multiply", math2(), 0, native_multiply);
    ev.register_native("divide", math2(), 0, native_divide);
    ev.register_native("equal?", cmp2(), 0, native_equal);
    ev.register_native("lesser?", cmp2(), 0, native_lesser);
    ev.register_native("greater?", cmp2(), 0, native_greater);

    // Operator bindings: same bodies, infix dispatch.
    ev.register_native("+", math2(), INFIX, native_add);
    ev.register_native("-", math2(), INFIX, native_subtract);
    ev.register_native("*", math2(), INFIX, native_multiply);
    ev.register_native("/", math2(), INFIX, native_divide);
    ev.register_native("=", cmp2(), INFIX, native_equal);
    ev.register_native("<", cmp2(), INFIX, native_lesser);
    ev.register_native(">", cmp2(), INFIX, native_greater);
}

enum Pair {
    Ints(i64, i64),
    Decs(f64, f64),
}

fn numeric_pair(a: &Value, b: &Value) -> Result<Pair, Error> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(Pair::Ints(*x, *y)),
        (Value::Integer(x), Value::Decimal(y)) => Ok(Pair::Decs(*x as f64, *y)),
        (Value::Decimal(x), Value::Integer(y)) => Ok(Pair::Decs(*x, *y as f64)),
        (Value::Decimal(x), Value::Decimal(y)) => Ok(Pair::Decs(*x, *y)),
        _ => Err(Error::misc("math on non-numeric values")),
    }
}

fn native_add(ev: &mut Evaluator) -> Result<Emit, Error> {
    let v = match numeric_pair(&ev.arg(0), &ev.arg(1))? {
        Pair::Ints(x, y) => Value::Integer(x.wrapping_add(y)),
        Pair::Decs(x, y) => Value::Decimal(x + y),
    };
    Ok(Emit::Value(v))
}

fn native_subtract(ev: &mut Evaluator) -> Result<Emit, Error> {
    let v = match numeric_pair(&ev.arg(0), &ev.arg(1))? {
        Pair::Ints(x, y) => Value::Integer(x.wrapping_sub(y)),
        Pair::Decs(x, y) => Value::Decimal(x - y),
    };
    Ok(Emit::Value(v))
}

fn native_multiply(ev: &mut Evaluator) -> Result<Emit, Error> {
    let v = match numeric_pair(&ev.arg(0), &ev.arg(1))? {
        Pair::Ints(x, y) => Value::Integer(x.wrapping_mul(y)),
        Pair::Decs(x, y) => Value::Decimal(x * y),
    };
    Ok(Emit::Value(v))
}

fn native_divide(ev: &mut Evaluator) -> Result<Emit, Error> {
    let v = match numeric_pair(&ev.arg(0), &ev.arg(1))? {
        Pair::Ints(_, 0) => return Err(Error::misc("divide by zero")),
        Pair::Ints(x, y) if x % y == 0 => Value::Integer(x / y),
        Pair::Ints(x, y) => Value::Decimal(x as f64 / y as f64),
        Pair::Decs(x, y) => Value::Decimal(x / y),
    };
    Ok(Emit::Value(v))
}

fn native_equal(ev: &mut Evaluator) -> Result<Emit, Error> {
    Ok(Emit::Value(Value::Logic(ev.arg(0) == ev.arg(1))))
}

fn ordering(a: &Value, b: &Value) -> Result<std::cmp::Ordering, Error> {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => Ok(x.cmp(y)),
        _ => match numeric_pair(a, b).map_err(|_| Error::misc("values cannot be compared"))? {
            Pair::Ints(x, y) => Ok(x.cmp(&y)),
            Pair::Decs(x, y) => x
                .partial_cmp(&y)
                .ok_or_else(|| Error::misc("values cannot be compared")),
        },
    }
}

fn native_lesser(ev: &mut Evaluator) -> Result<Emit, Error> {
    let ord = ordering(&ev.arg(0), &ev.arg(1))?;
    Ok(Emit::Value(Value::Logic(ord == std::cmp::Ordering::Less)))
}

fn native_greater(ev: &mut Evaluator) -> Result<Emit, Error> {
    let ord = ordering(&ev.arg(0), &ev.arg(1))?;
    Ok(Emit::Value(Value::Logic(ord == std::cmp::Ordering::Greater)))
}
