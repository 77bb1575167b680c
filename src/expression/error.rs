//! Expression errors

use thiserror::Error;

/// Errors raised while compiling expression source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("invalid arity for {name}: expected {expected}, got {found}")]
    Arity {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("unresolved identifier: {0}")]
    UnresolvedIdentifier(String),

    #[error("cannot assign to constant `{0}`")]
    ReadOnly(String),

    #[error("`{0}` outside of a loop")]
    MisplacedControl(&'static str),

    #[error("duplicate variable name: {0}")]
    DuplicateVariable(String),

    #[error("expression nested too deeply at position {position}")]
    NestingTooDeep { position: usize },
}

/// Errors raised while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("variable `{0}` read before assignment")]
    UnboundVariable(String),

    #[error("loop iteration limit of {0} exceeded")]
    LoopLimitExceeded(u64),

    #[error("evaluation deadline exceeded")]
    DeadlineExceeded,

    #[error("expression produced a non-finite coordinate")]
    NonFiniteResult,
}
