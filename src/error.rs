//! Error types shared by every stage of the interpreter.
//!
//! The scanner, parser, resolver, and evaluator all funnel their failures
//! into [`SableError`], so the crate gets a single `Result` alias and one
//! `Display` rendering per error class: static diagnostics come out as
//! `[line N] Error: message`, runtime failures as `message [line N]`.
//! Nothing here writes to stderr or picks exit codes; reporting belongs to
//! the driver.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SableError {
    /// Scanner failure: a stray character or an unterminated string.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    /// Parser failure.  The parser collects these and synchronizes rather
    /// than letting them escape `parse()`.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Static rule broken during the resolver pass.
    #[error("[line {line}] Error: {message}")]
    Resolve { message: String, line: usize },

    /// Evaluation failure, carrying the line of the offending token.
    #[error("{message} [line {line}]")]
    Runtime { message: String, line: usize },

    /// I/O failure from the driver, passed through unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Source bytes that were not valid UTF-8.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl SableError {
    /// Scanner failure at `line`.
    pub fn lex(line: usize, message: impl Into<String>) -> Self {
        SableError::Lex {
            message: message.into(),
            line,
        }
    }

    /// Parser failure at `line`.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        SableError::Parse {
            message: message.into(),
            line,
        }
    }

    /// Resolver failure at `line`.
    pub fn resolve(line: usize, message: impl Into<String>) -> Self {
        SableError::Resolve {
            message: message.into(),
            line,
        }
    }

    /// Evaluator failure at `line`.
    pub fn runtime(line: usize, message: impl Into<String>) -> Self {
        SableError::Runtime {
            message: message.into(),
            line,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SableError>;
