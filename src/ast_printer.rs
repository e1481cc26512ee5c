use crate::expr::{Expr, ExprId, ExprVisitor, LiteralValue};
use crate::token::Token;

/// Converts an expression to the Crafting‑Interpreters parenthesized prefix
/// form, e.g. `(* (- 123.0) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        expr.accept(&mut AstPrinter)
    }

    fn parenthesize(&mut self, name: &str, exprs: &[&Expr]) -> String {
        let mut s = format!("({}", name);
        for expr in exprs {
            s.push(' ');
            s.push_str(&expr.accept(self));
        }
        s.push(')');
        s
    }
}

impl ExprVisitor<String> for AstPrinter {
    fn visit_literal(&mut self, value: &LiteralValue) -> String {
        match value {
            LiteralValue::True => "true".into(),

            LiteralValue::False => "false".into(),

            LiteralValue::Nil => "nil".into(),

            LiteralValue::Str(s) => s.clone(),

            LiteralValue::Number(n) => {
                if n.fract() == 0.0 {
                    // 3 → 3.0
                    format!("{:.1}", n)
                } else {
                    n.to_string()
                }
            }
        }
    }

    fn visit_grouping(&mut self, inner: &Expr) -> String {
        self.parenthesize("group", &[inner])
    }

    fn visit_unary(&mut self, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_logical(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        self.parenthesize(&operator.lexeme, &[left, right])
    }

    fn visit_variable(&mut self, _id: ExprId, name: &Token) -> String {
        name.lexeme.clone()
    }

    fn visit_assign(&mut self, _id: ExprId, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!("= {}", name.lexeme), &[value])
    }

    fn visit_call(&mut self, callee: &Expr, _paren: &Token, arguments: &[Expr]) -> String {
        let mut exprs: Vec<&Expr> = Vec::with_capacity(arguments.len() + 1);
        exprs.push(callee);
        exprs.extend(arguments);
        self.parenthesize("call", &exprs)
    }

    fn visit_get(&mut self, object: &Expr, name: &Token) -> String {
        self.parenthesize(&format!(". {}", name.lexeme), &[object])
    }

    fn visit_set(&mut self, object: &Expr, name: &Token, value: &Expr) -> String {
        self.parenthesize(&format!("= . {}", name.lexeme), &[object, value])
    }

    fn visit_this(&mut self, _id: ExprId, _keyword: &Token) -> String {
        "this".into()
    }

    fn visit_super(&mut self, _id: ExprId, _keyword: &Token, method: &Token) -> String {
        format!("(super {})", method.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;
    use pretty_assertions::assert_eq;

    fn number(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(LiteralValue::Number(n)))
    }

    #[test]
    fn prints_nested_prefix_form() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::MINUS, "-", 1),
                right: number(123.0),
            }),
            operator: Token::new(TokenType::STAR, "*", 1),
            right: Box::new(Expr::Grouping(number(45.67))),
        };

        assert_eq!(AstPrinter::print(&expr), "(* (- 123.0) (group 45.67))");
    }

    #[test]
    fn prints_calls_with_arguments() {
        let expr = Expr::Call {
            callee: Box::new(Expr::Variable {
                id: ExprId::fresh(),
                name: Token::new(TokenType::IDENTIFIER, "f", 1),
            }),
            paren: Token::new(TokenType::RIGHT_PAREN, ")", 1),
            arguments: vec![Expr::Literal(LiteralValue::Nil), Expr::Literal(LiteralValue::True)],
        };

        assert_eq!(AstPrinter::print(&expr), "(call f nil true)");
    }
}
