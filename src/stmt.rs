use std::rc::Rc;

use crate::expr::Expr;
use crate::token::Token;

/// A `fun` declaration or class method.
///
/// Shared behind an `Rc` so every runtime function value (including each
/// bound copy of a method) points at the same declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`crate::parser::Parser::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While {
        condition: Expr,
        body: Box<Stmt>,
    },

    /// Runs in the enclosing scope: no extra environment for the clauses.
    For {
        initializer: Option<Box<Stmt>>, // var or expression statement
        condition: Option<Expr>,        // absent ⇒ true
        increment: Option<Expr>,
        body: Box<Stmt>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,
        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}

/// Double‑dispatch target for [`Stmt::accept`].
pub trait StmtVisitor<R> {
    fn visit_expression_stmt(&mut self, expr: &Expr) -> R;
    fn visit_print_stmt(&mut self, expr: &Expr) -> R;
    fn visit_var_stmt(&mut self, name: &Token, initializer: Option<&Expr>) -> R;
    fn visit_block_stmt(&mut self, statements: &[Stmt]) -> R;
    fn visit_if_stmt(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>)
        -> R;
    fn visit_while_stmt(&mut self, condition: &Expr, body: &Stmt) -> R;
    fn visit_for_stmt(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
    ) -> R;
    fn visit_function_stmt(&mut self, declaration: &Rc<FunctionDecl>) -> R;
    fn visit_return_stmt(&mut self, keyword: &Token, value: Option<&Expr>) -> R;
    fn visit_class_stmt(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> R;
}

impl Stmt {
    /// Invoke the visitor method matching this node's variant.
    pub fn accept<R, V: StmtVisitor<R>>(&self, visitor: &mut V) -> R {
        match self {
            Stmt::Expression(expr) => visitor.visit_expression_stmt(expr),
            Stmt::Print(expr) => visitor.visit_print_stmt(expr),
            Stmt::Var { name, initializer } => visitor.visit_var_stmt(name, initializer.as_ref()),
            Stmt::Block(statements) => visitor.visit_block_stmt(statements),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => visitor.visit_if_stmt(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => visitor.visit_while_stmt(condition, body),
            Stmt::For {
                initializer,
                condition,
                increment,
                body,
            } => visitor.visit_for_stmt(
                initializer.as_deref(),
                condition.as_ref(),
                increment.as_ref(),
                body,
            ),
            Stmt::Function(declaration) => visitor.visit_function_stmt(declaration),
            Stmt::Return { keyword, value } => visitor.visit_return_stmt(keyword, value.as_ref()),
            Stmt::Class {
                name,
                superclass,
                methods,
            } => visitor.visit_class_stmt(name, superclass.as_ref(), methods),
        }
    }
}
