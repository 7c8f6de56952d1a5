use std::{fmt::Display, rc::Rc};

use derivative::Derivative;
use enum_map::{Enum, EnumMap};
use itertools::Itertools;

use crate::{config::CaseFold, functions::BaseFunction, interpreter::ContextRef, number::Number};

/// Keywords handled structurally by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum Operator {
    If,
    Cond,
    Setq,
    Define,
    Set,
    Nth,
    Lambda,
    Quote,
    Begin,
}

impl Operator {
    pub const TEXT: EnumMap<Self, &'static str> = EnumMap::from_array([
        "if", "cond", "setq", "define", "set!", "nth", "lambda", "quote", "begin",
    ]);

    /// Keyword recognition ignores case so it works under every case folding.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::TEXT
            .iter()
            .find(|(_, text)| text.eq_ignore_ascii_case(name))
            .map(|(op, _)| op)
    }
}

#[derive(Derivative, Clone, Copy)]
#[derivative(Debug, PartialEq)]
pub struct Primitive {
    pub name: &'static str,
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    pub func: BaseFunction,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Expression>,
    /// The frame that was current when the `lambda` was evaluated.
    #[derivative(Debug = "ignore")]
    pub env: ContextRef,
}

#[derive(Derivative, Clone)]
#[derivative(PartialEq, Debug)]
pub enum Expression {
    Symbol(String),
    Number(Number),
    String(String),
    List(Vec<Expression>),
    Primitive(Primitive),
    Closure(#[derivative(PartialEq(compare_with = "Rc::ptr_eq"))] Rc<Closure>),
}

impl Expression {
    pub const TRUE: &'static str = "true";
    pub const FALSE: &'static str = "false";
    pub const ERROR: &'static str = "error";

    pub fn nil() -> Self {
        Expression::List(Vec::new())
    }

    pub fn boolean(b: bool) -> Self {
        Expression::Symbol(if b { Self::TRUE } else { Self::FALSE }.to_string())
    }

    pub fn error() -> Self {
        Expression::Symbol(Self::ERROR.to_string())
    }

    /// Renders a bare `true`, `false` or `error` produced by a primitive in
    /// the namespace's case. Any other value is returned unchanged.
    pub fn fold_sentinel(self, case: CaseFold) -> Self {
        match self {
            Expression::Symbol(name)
                if [Self::TRUE, Self::FALSE, Self::ERROR].contains(&name.as_str()) =>
            {
                Expression::Symbol(case.apply(&name))
            }
            e => e,
        }
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Expression::Symbol(name.into())
    }

    pub fn integer(x: i64) -> Self {
        Expression::Number(Number::Integer(x))
    }

    /// Everything except the `false` sentinel counts as true.
    pub fn truthy(&self) -> bool {
        !matches!(self, Expression::Symbol(s) if s.eq_ignore_ascii_case(Self::FALSE))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Expression::List(list) if list.is_empty())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Expression::Symbol(_) => "symbol",
            Expression::Number(Number::Integer(_)) => "integer",
            Expression::Number(Number::Float(_)) => "float",
            Expression::String(_) => "string",
            Expression::List(_) => "list",
            Expression::Primitive(_) => "primitive",
            Expression::Closure(_) => "lambda",
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Symbol(name) => write!(f, "{name}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(list) => write!(f, "({})", list.iter().join(" ")),
            Self::Primitive(_) => write!(f, "<proc>"),
            Self::Closure(_) => write!(f, "<lambda>"),
        }
    }
}

impl From<Vec<Expression>> for Expression {
    fn from(value: Vec<Expression>) -> Self {
        Expression::List(value)
    }
}

impl From<Number> for Expression {
    fn from(value: Number) -> Self {
        Expression::Number(value)
    }
}
