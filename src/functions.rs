use std::{cmp::Ordering, collections::HashMap};

use lazy_static::lazy_static;
use literally::hmap;
use log::debug;

use crate::{
    error::{Args, LispError, LispResult},
    interpreter::ExprResult,
    number::{self, Number},
    syntax::Expression,
};

pub type BaseFunction = fn(Vec<Expression>) -> ExprResult;

pub mod operators {
    use std::rc::Rc;

    use enum_map::{enum_map, EnumMap};
    use lazy_static::lazy_static;

    use crate::{
        error::{Args, LispError},
        interpreter::{ContextRef, ExprResult},
        number::Number,
        syntax::{Closure, Expression, Operator},
    };

    /// Receives its operands unevaluated.
    pub type SpecialForm = fn(&[Expression], &ContextRef) -> ExprResult;

    lazy_static! {
        pub static ref OPERATORS: EnumMap<Operator, SpecialForm> = enum_map! {
            Operator::If => op_if as SpecialForm,
            Operator::Cond => op_cond as SpecialForm,
            Operator::Setq => op_setq as SpecialForm,
            Operator::Define => op_setq as SpecialForm,
            Operator::Set => op_set as SpecialForm,
            Operator::Nth => op_nth as SpecialForm,
            Operator::Lambda => op_lambda as SpecialForm,
            Operator::Quote => op_quote as SpecialForm,
            Operator::Begin => op_begin as SpecialForm,
        };
    }

    fn sequence(exprs: &[Expression], context: &ContextRef) -> ExprResult {
        let mut return_value = Expression::nil();
        for expr in exprs {
            return_value = expr.eval(context)?;
        }
        Ok(return_value)
    }

    fn op_if(args: &[Expression], context: &ContextRef) -> ExprResult {
        let (condition, if_true, if_false) = match args {
            [condition, if_true] => (condition, if_true, None),
            [condition, if_true, if_false] => (condition, if_true, Some(if_false)),
            _ => return Err(LispError::arity("2-3", args.len())),
        };
        if condition.eval(context)?.truthy() {
            if_true.eval(context)
        } else {
            if_false.map_or_else(|| Ok(Expression::nil()), |expr| expr.eval(context))
        }
    }

    fn op_cond(args: &[Expression], context: &ContextRef) -> ExprResult {
        for clause in args {
            match clause.as_list()? {
                [] => return Err(clause.clone().type_error("non-empty clause")),
                [default] => return default.eval(context),
                [test, body @ ..] => {
                    if test.eval(context)?.truthy() {
                        return sequence(body, context);
                    }
                }
            }
        }
        Ok(Expression::nil())
    }

    fn op_setq(args: &[Expression], context: &ContextRef) -> ExprResult {
        let [name, expr] = args.take()?;
        let name = name.clone().into_name()?;
        let value = expr.eval(context)?;
        context.set(name, value.clone());
        Ok(value)
    }

    fn op_set(args: &[Expression], context: &ContextRef) -> ExprResult {
        let [name, expr] = args.take()?;
        let name = name.clone().into_name()?;
        let value = expr.eval(context)?;
        context.assign(&name, value.clone())?;
        Ok(value)
    }

    fn op_nth(args: &[Expression], context: &ContextRef) -> ExprResult {
        let [index, list] = args.take()?;
        let index = match index.eval(context)? {
            Expression::Number(Number::Integer(i)) => i,
            e => return Err(e.type_error("integer")),
        };
        let list = list.eval(context)?.into_list()?;
        Ok(usize::try_from(index)
            .ok()
            .and_then(|i| list.into_iter().nth(i))
            .unwrap_or_else(Expression::nil))
    }

    fn op_lambda(args: &[Expression], context: &ContextRef) -> ExprResult {
        let Some((params, body)) = args.split_first().filter(|(_, body)| !body.is_empty()) else {
            return Err(LispError::arity(">= 2", args.len()));
        };
        let params = params
            .as_list()?
            .iter()
            .cloned()
            .map(Expression::into_name)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Expression::Closure(Rc::new(Closure {
            params,
            body: body.to_vec(),
            env: context.clone(),
        })))
    }

    fn op_quote(args: &[Expression], _context: &ContextRef) -> ExprResult {
        let [expr] = args.take()?;
        Ok(expr.clone())
    }

    fn op_begin(args: &[Expression], context: &ContextRef) -> ExprResult {
        sequence(args, context)
    }
}

macro_rules! arith_op {
    ( $op:expr, unary: $identity:expr, nullary: $nullary:expr ) => {
        |args: Vec<Expression>| -> ExprResult {
            let mut numbers = numbers(args)?;
            match numbers.len() {
                0 => $nullary
                    .map(Expression::integer)
                    .ok_or_else(|| LispError::arity(">= 1", 0)),
                n => {
                    if n == 1 {
                        numbers.insert(0, Number::Integer($identity));
                    }
                    number::fold(&numbers, &$op).map(Expression::Number)
                }
            }
        }
    };
}

macro_rules! compare_op {
    ( $holds:expr ) => {
        |args: Vec<Expression>| -> ExprResult {
            if args.is_empty() {
                return Err(LispError::arity(">= 1", 0));
            }
            Ok(Expression::boolean(number::chain(&numbers(args)?, $holds)))
        }
    };
}

lazy_static! {
    pub static ref FUNCTIONS: HashMap<&'static str, BaseFunction> = hmap! {
        "+" => arith_op!(number::ADD, unary: 0, nullary: Some(0)) as BaseFunction,
        "*" => arith_op!(number::MUL, unary: 1, nullary: Some(1)) as BaseFunction,
        "-" => arith_op!(number::SUB, unary: 0, nullary: None) as BaseFunction,
        "/" => arith_op!(number::DIV, unary: 1, nullary: None) as BaseFunction,
        ">" => compare_op!(Ordering::is_gt) as BaseFunction,
        "<" => compare_op!(Ordering::is_lt) as BaseFunction,
        ">=" => compare_op!(Ordering::is_ge) as BaseFunction,
        "<=" => compare_op!(Ordering::is_le) as BaseFunction,
        "=" => compare_op!(Ordering::is_eq) as BaseFunction,
        "car" => fn_car as BaseFunction,
        "cdr" => fn_cdr as BaseFunction,
        "cons" => fn_cons as BaseFunction,
        "append" => fn_append as BaseFunction,
        "list" => fn_list as BaseFunction,
        "length" => fn_length as BaseFunction,
        "null" => fn_null as BaseFunction,
        "null?" => fn_null as BaseFunction,
        "reverse" => fn_reverse as BaseFunction,
        "member" => fn_member as BaseFunction,
        "assoc" => fn_assoc as BaseFunction,
        "remove" => fn_remove as BaseFunction,
        "subst" => fn_subst as BaseFunction,
        "atom" => fn_atom as BaseFunction,
        "numberp" => fn_numberp as BaseFunction,
        "stringp" => fn_stringp as BaseFunction,
        "zerop" => fn_zerop as BaseFunction,
        "minusp" => fn_minusp as BaseFunction,
        "equal" => fn_equal as BaseFunction,
        "not" => fn_not as BaseFunction,
        "print" => fn_print as BaseFunction,
    };
}

impl Expression {
    pub fn into_number(self) -> LispResult<Number> {
        match self {
            Self::Number(n) => Ok(n),
            e => Err(e.type_error("number")),
        }
    }
}

fn numbers(args: Vec<Expression>) -> LispResult<Vec<Number>> {
    args.into_iter().map(Expression::into_number).collect()
}

fn fn_car(args: Vec<Expression>) -> ExprResult {
    let [list] = args.take()?;
    match list {
        Expression::List(mut list) if !list.is_empty() => Ok(list.swap_remove(0)),
        e => Err(e.type_error("non-empty list")),
    }
}

/// Lists shorter than two elements have an empty tail.
fn fn_cdr(args: Vec<Expression>) -> ExprResult {
    let [list] = args.take()?;
    let mut list = list.into_list()?;
    if list.len() < 2 {
        return Ok(Expression::nil());
    }
    list.remove(0);
    Ok(Expression::List(list))
}

/// Prepends to a list. Without pairs, consing onto an atom yields the
/// two-element list of both.
fn fn_cons(args: Vec<Expression>) -> ExprResult {
    let [head, tail] = args.take()?;
    Ok(Expression::List(match tail {
        Expression::List(mut list) => {
            list.insert(0, head);
            list
        }
        atom => vec![head, atom],
    }))
}

fn fn_append(args: Vec<Expression>) -> ExprResult {
    if args.len() < 2 {
        return Err(LispError::arity(">= 2", args.len()));
    }
    let mut result = Vec::new();
    for list in args {
        result.extend(list.into_list()?);
    }
    Ok(Expression::List(result))
}

fn fn_list(args: Vec<Expression>) -> ExprResult {
    Ok(Expression::List(args))
}

fn fn_length(args: Vec<Expression>) -> ExprResult {
    let [list] = args.take()?;
    let len = list.into_list()?.len();
    i64::try_from(len)
        .map(Expression::integer)
        .map_err(|_| LispError::NumericOverflow)
}

fn fn_null(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(Expression::boolean(value.is_nil()))
}

fn fn_reverse(args: Vec<Expression>) -> ExprResult {
    let [list] = args.take()?;
    let mut list = list.into_list()?;
    list.reverse();
    Ok(Expression::List(list))
}

/// The tail of the list starting at the first element equal to the key.
fn fn_member(args: Vec<Expression>) -> ExprResult {
    let [key, list] = args.take()?;
    let list = list.into_list()?;
    Ok(match list.iter().position(|item| *item == key) {
        Some(i) => Expression::List(list[i..].to_vec()),
        None => Expression::nil(),
    })
}

fn fn_assoc(args: Vec<Expression>) -> ExprResult {
    let [key, alist] = args.take()?;
    Ok(alist
        .into_list()?
        .into_iter()
        .find(|entry| matches!(entry, Expression::List(pair) if pair.first() == Some(&key)))
        .unwrap_or_else(Expression::nil))
}

fn fn_remove(args: Vec<Expression>) -> ExprResult {
    let [key, list] = args.take()?;
    Ok(Expression::List(
        list.into_list()?
            .into_iter()
            .filter(|item| *item != key)
            .collect(),
    ))
}

fn fn_subst(args: Vec<Expression>) -> ExprResult {
    let [new, old, list] = args.take()?;
    Ok(Expression::List(
        list.into_list()?
            .into_iter()
            .map(|item| if item == old { new.clone() } else { item })
            .collect(),
    ))
}

/// Anything but a non-empty list.
fn fn_atom(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(Expression::boolean(
        !matches!(value, Expression::List(list) if !list.is_empty()),
    ))
}

fn fn_numberp(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(Expression::boolean(matches!(value, Expression::Number(_))))
}

fn fn_stringp(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(Expression::boolean(matches!(value, Expression::String(_))))
}

// `zerop` and `minusp` answer the `error` sentinel for non-numbers.

fn fn_zerop(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(match value {
        Expression::Number(n) => Expression::boolean(n.is_zero()),
        _ => Expression::error(),
    })
}

fn fn_minusp(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(match value {
        Expression::Number(n) => Expression::boolean(n.is_negative()),
        _ => Expression::error(),
    })
}

fn fn_equal(args: Vec<Expression>) -> ExprResult {
    let [a, b] = args.take()?;
    Ok(Expression::boolean(a == b))
}

fn fn_not(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    Ok(Expression::boolean(!value.truthy()))
}

fn fn_print(args: Vec<Expression>) -> ExprResult {
    let [value] = args.take()?;
    debug!("print {value}");
    Ok(value)
}
