//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<String,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, forward‑read in initializer, invalid
//!    `return`, `this`/`super` outside a class).
//! 3. Tell the interpreter, for *each* variable occurrence that binds locally,
//!    at what depth it binds, so the interpreter never falls back to dynamic
//!    lookup that would see a later shadowing local.  Anything left unresolved
//!    is a global.
//!
//! Errors are collected rather than returned early, so one pass reports as many
//! as it can.  The caller must not interpret a program whose resolve failed.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::class::INITIALIZER;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId, ExprVisitor, LiteralValue};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt, StmtVisitor};
use crate::token::Token;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body are we in?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'interp> {
    interpreter: &'interp mut Interpreter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'interp> Resolver<'interp> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'interp mut Interpreter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements.
    ///
    /// Every static error found is returned together in
    /// [`LoxError::Diagnostics`].
    pub fn resolve(mut self, statements: &[Stmt]) -> Result<()> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            Ok(())
        } else {
            info!("Resolve pass found {} error(s)", self.errors.len());
            Err(LoxError::Diagnostics(self.errors))
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            stmt.accept(self);
        }
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        expr.accept(self);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.errors.push(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.
    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&declaration.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Bind a name in the innermost scope without a source token (`this`,
    /// `super`).
    fn define_implicit(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this reference as a local at depth `d`, or leave it unrecorded
    /// (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        // innermost → outermost
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statement resolution
// ─────────────────────────────────────────────────────────────────────────────

impl StmtVisitor<()> for Resolver<'_> {
    fn visit_expression_stmt(&mut self, expr: &Expr) {
        self.resolve_expr(expr);
    }

    fn visit_print_stmt(&mut self, expr: &Expr) {
        self.resolve_expr(expr);
    }

    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) {
        // declare → resolve initializer → define
        self.declare(name);
        if let Some(expr) = initializer {
            self.resolve_expr(expr);
        }
        self.define(name);
    }

    fn visit_block_stmt(&mut self, statements: &[Stmt]) {
        self.begin_scope();
        self.resolve_stmts(statements);
        self.end_scope();
    }

    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        self.resolve_expr(condition);
        then_branch.accept(self);
        if let Some(else_branch) = else_branch {
            else_branch.accept(self);
        }
    }

    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) {
        self.resolve_expr(condition);
        body.accept(self);
    }

    // The loop shares the enclosing scope; the interpreter opens none either.
    fn visit_for_stmt(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) {
        if let Some(initializer) = initializer {
            initializer.accept(self);
        }
        if let Some(condition) = condition {
            self.resolve_expr(condition);
        }
        if let Some(increment) = increment {
            self.resolve_expr(increment);
        }
        body.accept(self);
    }

    fn visit_function_stmt(&mut self, declaration: &Rc<FunctionDecl>) {
        // name is visible *inside* its own body
        self.declare(&declaration.name);
        self.define(&declaration.name);
        self.resolve_function(declaration, FunctionType::Function);
    }

    fn visit_return_stmt(&mut self, keyword: &Token, value: Option<&Expr>) {
        if self.current_function == FunctionType::None {
            self.error(keyword, "Can't return from top-level code.");
        }

        if let Some(expr) = value {
            if self.current_function == FunctionType::Initializer {
                self.error(keyword, "Can't return a value from an initializer.");
            }
            self.resolve_expr(expr);
        }
    }

    fn visit_class_stmt(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.define_implicit("super");
        }

        self.begin_scope();
        self.define_implicit("this");

        for method in methods {
            let kind = if method.name.lexeme == INITIALIZER {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Expression resolution
// ─────────────────────────────────────────────────────────────────────────────

impl ExprVisitor<()> for Resolver<'_> {
    fn visit_literal(&mut self, _value: &LiteralValue) {}

    fn visit_grouping(&mut self, inner: &Expr) {
        self.resolve_expr(inner);
    }

    fn visit_unary(&mut self, _operator: &Token, right: &Expr) {
        self.resolve_expr(right);
    }

    fn visit_binary(&mut self, left: &Expr, _operator: &Token, right: &Expr) {
        self.resolve_expr(left);
        self.resolve_expr(right);
    }

    fn visit_logical(&mut self, left: &Expr, _operator: &Token, right: &Expr) {
        self.resolve_expr(left);
        self.resolve_expr(right);
    }

    fn visit_variable(&mut self, id: ExprId, name: &Token) {
        // Cannot read in own initializer
        let declared_only = self
            .scopes
            .last()
            .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

        if declared_only {
            self.error(name, "Can't read local variable in its own initializer.");
            return;
        }

        self.resolve_local(id, name);
    }

    fn visit_assign(&mut self, id: ExprId, name: &Token, value: &Expr) {
        // First resolve RHS, then bind LHS
        self.resolve_expr(value);
        self.resolve_local(id, name);
    }

    fn visit_call(&mut self, callee: &Expr, _paren: &Token, arguments: &[Expr]) {
        self.resolve_expr(callee);
        for argument in arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_get(&mut self, object: &Expr, _name: &Token) {
        self.resolve_expr(object);
    }

    fn visit_set(&mut self, object: &Expr, _name: &Token, value: &Expr) {
        self.resolve_expr(value);
        self.resolve_expr(object);
    }

    fn visit_this(&mut self, id: ExprId, keyword: &Token) {
        if self.current_class == ClassType::None {
            self.error(keyword, "Can't use 'this' outside of a class.");
            return;
        }

        self.resolve_local(id, keyword);
    }

    fn visit_super(&mut self, id: ExprId, keyword: &Token, _method: &Token) {
        match self.current_class {
            ClassType::None => self.error(keyword, "Can't use 'super' outside of a class."),
            ClassType::Class => {
                self.error(keyword, "Can't use 'super' in a class with no superclass.")
            }
            ClassType::Subclass => self.resolve_local(id, keyword),
        }
    }
}
