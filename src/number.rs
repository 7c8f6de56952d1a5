//! The two-level numeric tower.
//!
//! A number is an integer unless its literal carries a decimal point. Any
//! operation that sees a single floating point operand is carried out
//! entirely in floating point.

use std::{cmp::Ordering, fmt::Display, num::IntErrorKind};

use crate::error::{LispError, LispResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn parse(text: &str) -> LispResult<Self> {
        if text.contains('.') {
            let x = text
                .parse()
                .map_err(|_| LispError::NumericFormat(text.to_owned()))?;
            return finite(x).map(Number::Float);
        }
        text.parse().map(Number::Integer).map_err(|err| match err.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => LispError::NumericOverflow,
            _ => LispError::NumericFormat(text.to_owned()),
        })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Integer(x) => x as f64,
            Number::Float(x) => x,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }

    pub fn is_negative(&self) -> bool {
        match *self {
            Number::Integer(x) => x < 0,
            Number::Float(x) => x < 0.0,
        }
    }

    fn compare(&self, other: &Self, float: bool) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) if !float => Some(a.cmp(b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(x) => write!(f, "{x}"),
            // The mantissa always carries a decimal point so the text reads
            // back as a float: `1e20` renders as `1.0e20`.
            Self::Float(x) => {
                let text = format!("{x:?}");
                match text.split_once('e') {
                    Some((mantissa, exponent)) if !mantissa.contains('.') => {
                        write!(f, "{mantissa}.0e{exponent}")
                    }
                    _ => f.write_str(&text),
                }
            }
        }
    }
}

pub struct Arithmetic {
    pub integer: fn(i64, i64) -> LispResult<i64>,
    pub float: fn(f64, f64) -> LispResult<f64>,
}

pub const ADD: Arithmetic = Arithmetic {
    integer: |a, b| a.checked_add(b).ok_or(LispError::NumericOverflow),
    float: |a, b| finite(a + b),
};

pub const SUB: Arithmetic = Arithmetic {
    integer: |a, b| a.checked_sub(b).ok_or(LispError::NumericOverflow),
    float: |a, b| finite(a - b),
};

pub const MUL: Arithmetic = Arithmetic {
    integer: |a, b| a.checked_mul(b).ok_or(LispError::NumericOverflow),
    float: |a, b| finite(a * b),
};

pub const DIV: Arithmetic = Arithmetic {
    integer: |a, b| match b {
        0 => Err(LispError::DivisionByZero),
        b => a.checked_div(b).ok_or(LispError::NumericOverflow),
    },
    float: |a, b| {
        if b == 0.0 {
            Err(LispError::DivisionByZero)
        } else {
            finite(a / b)
        }
    },
};

fn finite(x: f64) -> LispResult<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(LispError::NumericOverflow)
    }
}

/// Folds `op` left to right over at least one number.
pub fn fold(numbers: &[Number], op: &Arithmetic) -> LispResult<Number> {
    let Some((first, rest)) = numbers.split_first() else {
        return Err(LispError::arity(">= 1", 0));
    };
    if numbers.iter().any(Number::is_float) {
        rest.iter()
            .try_fold(first.as_f64(), |a, b| (op.float)(a, b.as_f64()))
            .map(Number::Float)
    } else {
        let int = |n: &Number| match *n {
            Number::Integer(x) => x,
            Number::Float(x) => x as i64,
        };
        rest.iter()
            .try_fold(int(first), |a, b| (op.integer)(a, int(b)))
            .map(Number::Integer)
    }
}

/// True iff `holds` accepts the ordering of every adjacent pair.
pub fn chain(numbers: &[Number], holds: fn(Ordering) -> bool) -> bool {
    let float = numbers.iter().any(Number::is_float);
    numbers
        .windows(2)
        .all(|pair| pair[0].compare(&pair[1], float).is_some_and(holds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(Number::parse("42").unwrap(), Number::Integer(42));
        assert_eq!(Number::parse("-7").unwrap(), Number::Integer(-7));
        assert_eq!(Number::parse("2.5").unwrap(), Number::Float(2.5));
        assert!(matches!(
            Number::parse("12abc"),
            Err(LispError::NumericFormat(_))
        ));
        assert!(matches!(
            Number::parse("99999999999999999999"),
            Err(LispError::NumericOverflow)
        ));
        assert_eq!(Number::parse("1.0e20").unwrap(), Number::Float(1e20));
        assert!(matches!(
            Number::parse("1.0e999"),
            Err(LispError::NumericOverflow)
        ));
        assert!(matches!(
            Number::parse("-1.0e999"),
            Err(LispError::NumericOverflow)
        ));
    }

    #[test]
    fn test_promotion() {
        use Number::{Float, Integer};
        assert_eq!(fold(&[Integer(2), Integer(2)], &ADD).unwrap(), Integer(4));
        assert_eq!(fold(&[Float(1.5), Integer(2)], &ADD).unwrap(), Float(3.5));
        assert_eq!(fold(&[Integer(7), Integer(2)], &DIV).unwrap(), Integer(3));
        assert_eq!(fold(&[Integer(7), Float(2.0)], &DIV).unwrap(), Float(3.5));
    }

    #[test]
    fn test_failures() {
        use Number::{Float, Integer};
        assert!(matches!(
            fold(&[Integer(1), Integer(0)], &DIV),
            Err(LispError::DivisionByZero)
        ));
        assert!(matches!(
            fold(&[Float(1.0), Integer(0)], &DIV),
            Err(LispError::DivisionByZero)
        ));
        assert!(matches!(
            fold(&[Integer(i64::MAX), Integer(1)], &ADD),
            Err(LispError::NumericOverflow)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Number::Integer(4).to_string(), "4");
        assert_eq!(Number::Float(4.0).to_string(), "4.0");
        assert_eq!(Number::Float(3.5).to_string(), "3.5");
        assert_eq!(Number::Float(1e20).to_string(), "1.0e20");
        assert_eq!(Number::Float(1e-5).to_string(), "1.0e-5");
        assert_eq!(Number::Float(-2.5e-7).to_string(), "-2.5e-7");
        for x in [1e20, 1e-5, 6.02e23, -3.0e-9] {
            let text = Number::Float(x).to_string();
            assert_eq!(Number::parse(&text).unwrap(), Number::Float(x), "{text}");
        }
    }

    #[test]
    fn test_chain() {
        use Number::{Float, Integer};
        assert!(chain(&[Integer(1), Integer(2), Integer(3)], Ordering::is_lt));
        assert!(!chain(&[Integer(1), Integer(3), Integer(2)], Ordering::is_lt));
        assert!(chain(&[Integer(2), Float(2.0)], Ordering::is_eq));
        assert!(chain(&[Integer(5)], Ordering::is_gt));
    }
}
