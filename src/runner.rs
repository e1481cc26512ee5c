//! Source‑to‑effect pipeline shared by the CLI subcommands and the REPL.
//!
//! `scan → parse → resolve → interpret`.  Every stage before interpretation
//! reports all of its errors at once; a program with any static error never
//! starts running.

use log::{debug, info};

use crate::error::{LoxError, Result};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_all;
use crate::stmt::Stmt;
use crate::value::Value;

/// Lexical errors first, then the parser's, in source order within each.
fn collect(mut lex_errors: Vec<LoxError>, parsed: Result<Vec<Stmt>>) -> Result<Vec<Stmt>> {
    match parsed {
        Ok(statements) if lex_errors.is_empty() => Ok(statements),
        Ok(_) => Err(LoxError::Diagnostics(lex_errors)),
        Err(LoxError::Diagnostics(parse_errors)) => {
            lex_errors.extend(parse_errors);
            Err(LoxError::Diagnostics(lex_errors))
        }
        Err(e) => Err(e),
    }
}

/// Scan and parse a whole program.
pub fn parse_program(source: &str) -> Result<Vec<Stmt>> {
    let (tokens, lex_errors) = scan_all(source);
    let parsed = Parser::new(&tokens).parse();

    collect(lex_errors, parsed)
}

/// Scan and parse a single expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let (tokens, lex_errors) = scan_all(source);
    let parsed = Parser::new(&tokens).parse_expression();

    if !lex_errors.is_empty() {
        return Err(LoxError::Diagnostics(lex_errors));
    }

    parsed
}

/// Evaluate a single expression against the interpreter's globals.
pub fn evaluate(source: &str, interpreter: &mut Interpreter) -> Result<Value> {
    let expr = parse_expression(source)?;
    debug!("Evaluating expression: {:?}", expr);

    Ok(interpreter.evaluate(&expr)?)
}

/// Run a program.  State defined at the top level stays in `interpreter`, so
/// successive calls (REPL lines) see each other's globals.
pub fn run(source: &str, interpreter: &mut Interpreter) -> Result<()> {
    let program = parse_program(source)?;
    info!("Parsed {} statement(s)", program.len());

    Resolver::new(interpreter).resolve(&program)?;
    interpreter.interpret(&program)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lexical_and_syntax_errors_are_reported_together() {
        let err = parse_program("var a = @;\nprint ;").unwrap_err();

        match err {
            LoxError::Diagnostics(errors) => {
                assert_eq!(errors.len(), 3);
                assert!(matches!(errors[0], LoxError::Lex { .. }));
                assert!(matches!(errors[1], LoxError::Parse { .. }));
            }
            other => panic!("expected diagnostics, got {:?}", other),
        }
    }

    #[test]
    fn static_errors_block_execution() {
        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));

        let err = run("print 1; { var a = a; }", &mut interpreter).unwrap_err();
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn evaluate_reads_globals_from_earlier_runs() {
        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
        run("var x = 20;", &mut interpreter).unwrap();

        let value = evaluate("x + 1", &mut interpreter).unwrap();
        assert_eq!(value, Value::Number(21.0));
    }
}
