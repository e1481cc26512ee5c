//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) must convert their
//! internal failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic inter‑operation
//! with `anyhow`, while still preserving rich diagnostic detail.
//!
//! Three tiers never mix: syntax errors (`Lex`/`Parse`), static resolution
//! errors (`Resolve`) and runtime errors ([`RuntimeError`]).  The first two are
//! *reported* in batches through [`LoxError::Diagnostics`]; a runtime error
//! aborts the current run on its own.
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::warn;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error{location}: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// ` at 'lexeme'`, ` at end`, or empty.
        location: String,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Every static error collected by one scanner/parser/resolver pass.
    #[error("{}", join_lines(.0))]
    Diagnostics(Vec<LoxError>),

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

fn join_lines(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        warn!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            line,
            location: String::new(),
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        warn!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: token.location(),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        warn!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: token.location(),
        }
    }

    /// Process exit code for this error, following the `sysexits.h` values
    /// used by the reference Lox implementations.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. }
            | LoxError::Parse { .. }
            | LoxError::Resolve { .. }
            | LoxError::Diagnostics(_) => 65,
            LoxError::Runtime(_) => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
        }
    }
}

/// A failure while executing a resolved program.
///
/// Each variant remembers the source line of the offending token.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    /// Operand, arity, callability and inheritance mismatches.
    #[error("{message}\n[line {line}]")]
    Type { message: String, line: usize },

    /// Writing the output of a `print` statement failed.
    #[error("Output error: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn undefined_variable(name: &Token) -> Self {
        RuntimeError::UndefinedVariable {
            name: name.lexeme.clone(),
            line: name.line,
        }
    }

    pub fn undefined_property(name: &Token) -> Self {
        RuntimeError::UndefinedProperty {
            name: name.lexeme.clone(),
            line: name.line,
        }
    }

    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Type {
            message: msg.into(),
            line: token.line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
