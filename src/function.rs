//! User‑defined and native functions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// A built‑in function implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl NativeFunction {
    pub(crate) fn call(&self, arguments: &[Value], paren: &Token) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        (self.func)(arguments).map_err(|message| RuntimeError::type_error(paren, message))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// `clock()`: wall‑clock milliseconds since the Unix epoch.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value]| Ok(Value::Number(Utc::now().timestamp_millis() as f64)),
    }
}

/// A closure: a declaration plus the environment it was declared in.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure has `this` bound to `instance`.
    ///
    /// The original function is untouched; the new closure is one scope
    /// nested inside the original one.
    pub fn bind(&self, instance: &Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(Rc::clone(instance)));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling function '{}'", self.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow = interpreter
            .execute_block(&self.declaration.body, Rc::new(RefCell::new(environment)))?;

        if self.is_initializer {
            // `init` always yields the instance, even after a bare `return;`.
            return Environment::get_at(&self.closure, 0, "this").ok_or_else(|| {
                RuntimeError::UndefinedVariable {
                    name: "this".to_string(),
                    line: self.declaration.name.line,
                }
            });
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
