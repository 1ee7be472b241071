use log::debug;
use std::fmt;
use std::mem;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    COMMA,
    DOT,
    MINUS,
    PLUS,
    SEMICOLON,
    SLASH,
    STAR,

    // One or two character tokens.
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    CLASS,
    ELSE,
    FALSE,
    FUNCTION,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VARIABLE,
    WHILE,

    // Special Characters
    EOF,
}

impl PartialEq for TokenType {
    /// Equality on the lexical category alone: two `NUMBER`s compare equal
    /// whatever their payloads.  The parser matches on categories.
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize) -> Self {
        debug!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type, lexeme, line
        );
        Self {
            token_type,
            lexeme,
            line,
        }
    }
}

impl fmt::Display for Token {
    /// `TYPE lexeme literal` — the tokenizer debugging format.  Integral
    /// number literals keep a forced `.0`; tokens without a literal print
    /// `null`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_type {
            TokenType::STRING(literal) => write!(f, "STRING {} {}", self.lexeme, literal),

            TokenType::NUMBER(literal) => {
                if literal.fract() == 0.0 {
                    write!(f, "NUMBER {} {:.1}", self.lexeme, literal)
                } else {
                    write!(f, "NUMBER {} {}", self.lexeme, literal)
                }
            }

            other => write!(f, "{:?} {} null", other, self.lexeme),
        }
    }
}
