use thiserror::Error;

use crate::syntax::Expression;

pub type LispResult<T> = Result<T, LispError>;

#[derive(Error, Debug)]
pub enum LispError {
    #[error("unbound symbol: `{0}` is not defined")]
    UnboundSymbol(String),
    #[error("not callable: {0} is neither a primitive nor a lambda")]
    NotCallable(Expression),
    #[error("arity mismatch: expected {expected} arguments but was given {actual}")]
    ArityMismatch { expected: String, actual: usize },
    #[error("type mismatch: expected {expected_type}, got {value} of type {actual_type}")]
    TypeMismatch {
        expected_type: &'static str,
        actual_type: &'static str,
        value: Expression,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    NumericOverflow,
    #[error("numeric format error: `{0}` is not a number")]
    NumericFormat(String),
    #[error("syntax error: unexpected end of input")]
    UnexpectedEof,
    #[error("syntax error: unexpected `{0}`")]
    UnexpectedToken(String),
    #[error("syntax error: {0}")]
    Syntax(String),
}

impl LispError {
    pub fn arity(expected: impl ToString, actual: usize) -> Self {
        LispError::ArityMismatch {
            expected: expected.to_string(),
            actual,
        }
    }
}

impl Expression {
    pub fn type_error(self, expected_type: &'static str) -> LispError {
        LispError::TypeMismatch {
            expected_type,
            actual_type: self.type_name(),
            value: self,
        }
    }
}

/// Destructures an argument list of a fixed length.
pub trait Args {
    type Output<const N: usize>;

    fn take<const N: usize>(self) -> LispResult<Self::Output<N>>;
}

impl Args for Vec<Expression> {
    type Output<const N: usize> = [Expression; N];

    fn take<const N: usize>(self) -> LispResult<[Expression; N]> {
        let actual = self.len();
        self.try_into().map_err(|_| LispError::arity(N, actual))
    }
}

impl<'a> Args for &'a [Expression] {
    type Output<const N: usize> = &'a [Expression; N];

    fn take<const N: usize>(self) -> LispResult<&'a [Expression; N]> {
        self.try_into().map_err(|_| LispError::arity(N, self.len()))
    }
}
