//! Runtime values.
//!
//! [`Value`] is the one closed type every expression evaluates to.  The three
//! callable variants are exposed through the [`Callable`] view, so the call
//! path in the interpreter never cares which kind it is invoking.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::class::{LoxClass, LoxInstance};
use crate::error::RuntimeError;
use crate::function::{LoxFunction, NativeFunction};
use crate::interpreter::Interpreter;
use crate::token::Token;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    NativeFunction(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// View this value as something callable, if it is one.
    pub fn as_callable(&self) -> Option<Callable<'_>> {
        match self {
            Value::NativeFunction(native) => Some(Callable::Native(native)),
            Value::Function(function) => Some(Callable::Function(function)),
            Value::Class(class) => Some(Callable::Class(class)),
            Value::Nil
            | Value::Bool(_)
            | Value::Number(_)
            | Value::String(_)
            | Value::Instance(_) => None,
        }
    }
}

/// Primitives compare by value, objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write_number(f, *n),

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction(_) => write!(f, "<native fn>"),

            Value::Function(function) => write!(f, "<fn {}>", function.name()),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => write!(f, "{} instance", instance.borrow().class.name),
        }
    }
}

/// Fixed notation for decimal exponents in `-4..16`, otherwise `1.5e+20`
/// style.  Integral values print without a fraction.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return write!(f, "NaN");
    }
    if n.is_infinite() {
        return write!(f, "{}Infinity", if n < 0.0 { "-" } else { "" });
    }
    if n == 0.0 {
        return write!(f, "{:.0}", n);
    }

    // Shortest round-trip digits, e.g. "1.5e20".
    let scientific: String = format!("{:e}", n);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        write!(f, "{}", n)
    } else if mantissa.contains('.') {
        write!(f, "{}e{:+03}", mantissa, exponent)
    } else {
        write!(f, "{}.0e{:+03}", mantissa, exponent)
    }
}

/// Borrowed view of the three callable kinds.
#[derive(Debug, Clone, Copy)]
pub enum Callable<'v> {
    Native(&'v NativeFunction),
    Function(&'v Rc<LoxFunction>),
    Class(&'v Rc<LoxClass>),
}

impl Callable<'_> {
    /// Number of arguments the callee expects.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already‑evaluated arguments.  Arity has been checked by
    /// the caller; `paren` locates errors raised by natives.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, RuntimeError> {
        match self {
            Callable::Native(native) => native.call(&arguments, paren),
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::Class(class) => LoxClass::construct(class, interpreter, arguments),
        }
    }
}
