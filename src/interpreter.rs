//! Tree‑walking evaluator.
//!
//! The interpreter executes statements for effect and evaluates expressions to
//! [`Value`]s.  It relies on the distances recorded by the
//! [`Resolver`](crate::resolver::Resolver): a reference with a recorded
//! distance is read from exactly that scope, anything else from the globals.
//!
//! `return` is not an error here.  Statement execution yields a [`Flow`] and
//! only a function call turns `Flow::Return` back into a value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::class::{LoxClass, LoxInstance, INITIALIZER};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId, ExprVisitor, LiteralValue};
use crate::function::{self, LoxFunction};
use crate::stmt::{FunctionDecl, Stmt, StmtVisitor};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fall through to the next statement.
    Normal,
    /// A `return` is unwinding to the nearest function call.
    Return(Value),
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` statements write to `out`, and
    /// defines native functions such as `clock`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        let clock = function::clock();
        debug!("Defining native function '{}'", clock.name);
        globals
            .borrow_mut()
            .define(clock.name, Value::NativeFunction(Rc::new(clock)));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
        }
    }

    /// Record that the reference `id` binds `depth` scopes out from where it
    /// is used.  Called by the resolver.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").
    ///
    /// Stops at the first runtime error; statements after it do not run.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            self.execute(stmt)?;
        }

        self.out.flush()?;
        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        expr.accept(self)
    }

    fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        stmt.accept(self)
    }

    /// Run `statements` with `environment` as the current scope, restoring
    /// the previous scope on every exit path.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> IResult<Flow> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => {
                debug!("Reading '{}' at distance {}", name.lexeme, distance);
                Environment::get_at(&self.environment, distance, &name.lexeme)
                    .ok_or_else(|| RuntimeError::undefined_variable(name))
            }
            None => self.globals.borrow().get(name),
        }
    }
}

fn number_operand(operator: &Token, operand: &Value) -> IResult<f64> {
    match operand {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::type_error(operator, "Operand must be a number.")),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_error(operator, "Operands must be numbers.")),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

impl ExprVisitor<IResult<Value>> for Interpreter {
    fn visit_literal(&mut self, value: &LiteralValue) -> IResult<Value> {
        Ok(match value {
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Str(s) => Value::String(s.clone()),
            LiteralValue::True => Value::Bool(true),
            LiteralValue::False => Value::Bool(false),
            LiteralValue::Nil => Value::Nil,
        })
    }

    fn visit_grouping(&mut self, inner: &Expr) -> IResult<Value> {
        self.evaluate(inner)
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => Ok(Value::Number(-number_operand(operator, &right)?)),
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(RuntimeError::type_error(operator, "Invalid unary operator.")),
        }
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;
        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::type_error(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a * b))
            }

            // IEEE‑754: x / 0 is ±inf or NaN, not an error.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left, &right)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(RuntimeError::type_error(operator, "Invalid binary operator.")),
        }
    }

    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left = self.evaluate(left)?;

        let short_circuit = match operator.token_type {
            TokenType::OR => left.is_truthy(),
            _ => !left.is_truthy(),
        };

        if short_circuit {
            Ok(left)
        } else {
            self.evaluate(right)
        }
    }

    fn visit_variable(&mut self, id: ExprId, name: &Token) -> IResult<Value> {
        self.look_up_variable(id, name)
    }

    fn visit_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> IResult<Value> {
        let value = self.evaluate(value)?;

        match self.locals.get(&id) {
            Some(&distance) => {
                Environment::assign_at(&self.environment, distance, name, value.clone())?
            }
            None => self.globals.borrow_mut().assign(name, value.clone())?,
        }

        debug!("Assigned {} to '{}'", value, name.lexeme);
        Ok(value)
    }

    fn visit_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> IResult<Value> {
        let callee = self.evaluate(callee)?;

        let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }

        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::type_error(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if values.len() != callable.arity() {
            return Err(RuntimeError::type_error(
                paren,
                format!(
                    "Expected {} arguments, but got {}.",
                    callable.arity(),
                    values.len()
                ),
            ));
        }

        let result = callable.call(self, values, paren)?;
        debug!("Call to {} returned {}", callee, result);
        Ok(result)
    }

    fn visit_get(&mut self, object: &Expr, name: &Token) -> IResult<Value> {
        match self.evaluate(object)? {
            Value::Instance(instance) => LoxInstance::get(&instance, name),
            _ => Err(RuntimeError::type_error(
                name,
                "Only instances have properties.",
            )),
        }
    }

    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> IResult<Value> {
        let Value::Instance(instance) = self.evaluate(object)? else {
            return Err(RuntimeError::type_error(name, "Only instances have fields."));
        };

        let value = self.evaluate(value)?;
        instance.borrow_mut().set(name, value.clone());

        Ok(value)
    }

    fn visit_this(&mut self, id: ExprId, keyword: &Token) -> IResult<Value> {
        self.look_up_variable(id, keyword)
    }

    fn visit_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance = *self
            .locals
            .get(&id)
            .ok_or_else(|| RuntimeError::undefined_variable(keyword))?;

        let Some(Value::Class(superclass)) =
            Environment::get_at(&self.environment, distance, "super")
        else {
            return Err(RuntimeError::undefined_variable(keyword));
        };

        // `this` lives in the scope the method was bound in, one inside `super`.
        let object = distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"));
        let Some(Value::Instance(instance)) = object else {
            return Err(RuntimeError::UndefinedVariable {
                name: "this".to_string(),
                line: keyword.line,
            });
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(Rc::new(found.bind(&instance)))),
            None => Err(RuntimeError::undefined_property(method)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

impl StmtVisitor<IResult<Flow>> for Interpreter {
    fn visit_expression_stmt(&mut self, expr: &Expr) -> IResult<Flow> {
        self.evaluate(expr)?;
        Ok(Flow::Normal)
    }

    fn visit_print_stmt(&mut self, expr: &Expr) -> IResult<Flow> {
        let value = self.evaluate(expr)?;
        writeln!(self.out, "{}", value)?;
        Ok(Flow::Normal)
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> IResult<Flow> {
        let value = match initializer {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };

        self.environment.borrow_mut().define(&name.lexeme, value);
        Ok(Flow::Normal)
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let environment = Environment::with_enclosing(Rc::clone(&self.environment));
        self.execute_block(statements, Rc::new(RefCell::new(environment)))
    }

    fn visit_if_stmt(
        &mut self,
        condition: &Expr,
        then_branch: &Stmt,
        else_branch: Option<&Stmt>,
    ) -> IResult<Flow> {
        if self.evaluate(condition)?.is_truthy() {
            self.execute(then_branch)
        } else if let Some(else_branch) = else_branch {
            self.execute(else_branch)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> IResult<Flow> {
        while self.evaluate(condition)?.is_truthy() {
            if let Flow::Return(value) = self.execute(body)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn visit_for_stmt(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> IResult<Flow> {
        if let Some(initializer) = initializer {
            self.execute(initializer)?;
        }

        loop {
            if let Some(condition) = condition {
                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }
            }

            if let Flow::Return(value) = self.execute(body)? {
                return Ok(Flow::Return(value));
            }

            if let Some(increment) = increment {
                self.evaluate(increment)?;
            }
        }

        Ok(Flow::Normal)
    }

    fn visit_function_stmt(&mut self, declaration: &Rc<FunctionDecl>) -> IResult<Flow> {
        debug!("Defining function '{}'", declaration.name.lexeme);

        let function = LoxFunction::new(
            Rc::clone(declaration),
            Rc::clone(&self.environment),
            false,
        );

        self.environment
            .borrow_mut()
            .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
        Ok(Flow::Normal)
    }

    fn visit_return_stmt(&mut self, _keyword: &Token, value: Option<&Expr>) -> IResult<Flow> {
        let value = match value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Nil,
        };

        debug!("Returning value: {}", value);
        Ok(Flow::Return(value))
    }

    fn visit_class_stmt(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<Flow> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    return Err(RuntimeError::Type {
                        message: "Superclass must be a class.".to_string(),
                        line: expr.line().unwrap_or(name.line),
                    })
                }
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods of a subclass close over an extra scope holding `super`.
        let enclosing: Option<Rc<RefCell<Environment>>> = match &superclass {
            Some(superclass) => {
                let mut environment = Environment::with_enclosing(Rc::clone(&self.environment));
                environment.define("super", Value::Class(Rc::clone(superclass)));

                Some(std::mem::replace(
                    &mut self.environment,
                    Rc::new(RefCell::new(environment)),
                ))
            }
            None => None,
        };

        let methods: HashMap<String, Rc<LoxFunction>> = methods
            .iter()
            .map(|declaration| {
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    declaration.name.lexeme == INITIALIZER,
                );

                (declaration.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

        if let Some(previous) = enclosing {
            self.environment = previous;
        }

        self.environment
            .borrow_mut()
            .assign(name, Value::Class(Rc::new(class)))?;
        Ok(Flow::Normal)
    }
}
