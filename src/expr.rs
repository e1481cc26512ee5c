//! Expression nodes of the Lox syntax tree.
//!
//! Nodes are immutable once the parser builds them.  The four *reference*
//! variants (`Variable`, `Assign`, `This`, `Super`) carry an [`ExprId`] that
//! keys the resolver's side table of scope distances; nothing else about a
//! node is used as identity.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Opaque identity of a reference expression.
///
/// Ids come from one process‑wide counter, so trees parsed at different times
/// (e.g. successive REPL lines) never collide in the interpreter's side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    /// Allocate a never‑before‑seen id.
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
///
/// The parser copies the value out of the token so the tree does not depend
/// on the token buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    /// Integral lexemes such as `"3"` are still parsed as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        /// The operator token (`!` or `-`).
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token, // `AND` or `OR`
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    /// *Example:* `clock()` or `add(1, 2)`
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Token },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

/// Double‑dispatch target for [`Expr::accept`].
///
/// Every method is required, so a visitor that forgets a variant does not
/// compile.
pub trait ExprVisitor<R> {
    fn visit_literal(&mut self, value: &LiteralValue) -> R;
    fn visit_grouping(&mut self, inner: &Expr) -> R;
    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> R;
    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> R;
    fn visit_variable(&mut self, id: ExprId, name: &Token) -> R;
    fn visit_assign(&mut self, id: ExprId, name: &Token, value: &Expr) -> R;
    fn visit_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> R;
    fn visit_get(&mut self, object: &Expr, name: &Token) -> R;
    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> R;
    fn visit_this(&mut self, id: ExprId, keyword: &Token) -> R;
    fn visit_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> R;
}

impl Expr {
    /// Invoke the visitor method matching this node's variant.
    pub fn accept<R, V: ExprVisitor<R>>(&self, visitor: &mut V) -> R {
        match self {
            Expr::Literal(value) => visitor.visit_literal(value),
            Expr::Grouping(inner) => visitor.visit_grouping(inner),
            Expr::Unary { operator, right } => visitor.visit_unary(operator, right),
            Expr::Binary {
                left,
                operator,
                right,
            } => visitor.visit_binary(left, operator, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => visitor.visit_logical(left, operator, right),
            Expr::Variable { id, name } => visitor.visit_variable(*id, name),
            Expr::Assign { id, name, value } => visitor.visit_assign(*id, name, value),
            Expr::Call {
                callee,
                paren,
                arguments,
            } => visitor.visit_call(callee, paren, arguments),
            Expr::Get { object, name } => visitor.visit_get(object, name),
            Expr::Set {
                object,
                name,
                value,
            } => visitor.visit_set(object, name, value),
            Expr::This { id, keyword } => visitor.visit_this(*id, keyword),
            Expr::Super {
                id,
                keyword,
                method,
            } => visitor.visit_super(*id, keyword, method),
        }
    }

    /// Source line of the node, used for diagnostics about whole expressions.
    ///
    /// Literals keep no token, so they have no line.
    pub fn line(&self) -> Option<usize> {
        match self {
            Expr::Literal(_) => None,

            Expr::Grouping(expr) => expr.line(),

            Expr::Unary { operator, .. }
            | Expr::Binary { operator, .. }
            | Expr::Logical { operator, .. } => Some(operator.line),

            Expr::Variable { name, .. } | Expr::Assign { name, .. } => Some(name.line),

            Expr::Call { paren, .. } => Some(paren.line),

            Expr::Get { name, .. } | Expr::Set { name, .. } => Some(name.line),

            Expr::This { keyword, .. } | Expr::Super { keyword, .. } => Some(keyword.line),
        }
    }
}
