use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Identity for expression nodes that take part in resolution.
///
/// Two syntactically identical references at different source positions must
/// be distinct keys in the resolution map, so ids are minted from a
/// process-wide counter at parse time.  The counter is never reset; REPL
/// lines parsed later cannot collide with ids held by closures retained from
/// earlier lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub enum Expr {
    /// `true`, `false`, `nil`, number and string literals; the token carries
    /// the payload.
    Literal(Token),

    /// `( expression )`
    Grouping(Box<Expr>),

    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `and` / `or`, short-circuiting.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// Closing parenthesis, kept for error line reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    Get {
        object: Box<Expr>,
        name: Token,
    },

    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}
