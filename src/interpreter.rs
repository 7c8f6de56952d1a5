use std::{cell::RefCell, collections::HashMap, rc::Rc};

use log::{debug, info, trace};

use crate::{
    config::{CaseFold, Config},
    error::{LispError, LispResult},
    functions::{operators::OPERATORS, FUNCTIONS},
    parser::{tokenize_input, Reader},
    syntax::{Closure, Expression, Operator, Primitive},
};

pub type ExprResult = Result<Expression, LispError>;

pub type ContextRef = Rc<Context>;

/// One frame of the lexical environment, chained to the frame it was
/// created in.
pub struct Context {
    names: RefCell<HashMap<String, Expression>>,
    parent: Option<ContextRef>,
    case: CaseFold,
}

impl Context {
    pub fn new() -> ContextRef {
        Self::root(CaseFold::default())
    }

    fn root(case: CaseFold) -> ContextRef {
        Rc::new(Self {
            names: RefCell::new(HashMap::new()),
            parent: None,
            case,
        })
    }

    /// A root frame holding the primitive library and the sentinels, with
    /// every name folded by `case`.
    pub fn global(case: CaseFold) -> ContextRef {
        let context = Self::root(case);
        for (&name, &func) in FUNCTIONS.iter() {
            context.set(case.apply(name), Expression::Primitive(Primitive { name, func }));
        }
        context.set(case.apply("nil"), Expression::nil());
        for sentinel in [Expression::TRUE, Expression::FALSE, Expression::ERROR] {
            context.set(case.apply(sentinel), Expression::symbol(case.apply(sentinel)));
        }
        info!("bootstrapped root namespace with {} primitives", FUNCTIONS.len());
        context
    }

    pub fn case(&self) -> CaseFold {
        self.case
    }

    pub fn get(&self, name: &str) -> ExprResult {
        if let Some(value) = self.names.borrow().get(name) {
            return Ok(value.clone());
        }
        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(LispError::UnboundSymbol(name.to_string())),
        }
    }

    /// Binds `name` in this frame, never in a parent.
    pub fn set(&self, name: String, value: Expression) {
        self.names.borrow_mut().insert(name, value);
    }

    /// Rebinds the nearest existing binding of `name`.
    pub fn assign(&self, name: &str, value: Expression) -> LispResult<()> {
        if let Some(slot) = self.names.borrow_mut().get_mut(name) {
            *slot = value;
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(LispError::UnboundSymbol(name.to_string())),
        }
    }

    pub fn scope(self: &ContextRef) -> ContextRef {
        Rc::new(Self {
            names: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
            case: self.case,
        })
    }

    /// A new frame binding `params` to `args` one to one.
    pub fn bind(self: &ContextRef, params: &[String], args: Vec<Expression>) -> LispResult<ContextRef> {
        if params.len() != args.len() {
            return Err(LispError::arity(params.len(), args.len()));
        }
        let context = self.scope();
        for (name, arg) in params.iter().zip(args) {
            context.set(name.clone(), arg);
        }
        Ok(context)
    }
}

impl Closure {
    pub fn call(&self, args: Vec<Expression>) -> ExprResult {
        debug!("calling lambda ({}) with {} arguments", self.params.join(" "), args.len());
        let context = self.env.bind(&self.params, args)?;
        let mut return_value = Expression::nil();
        for expr in &self.body {
            return_value = expr.eval(&context)?;
        }
        Ok(return_value)
    }
}

impl Expression {
    pub fn into_list(self) -> LispResult<Vec<Expression>> {
        match self {
            Self::List(list) => Ok(list),
            e => Err(e.type_error("list")),
        }
    }

    pub fn as_list(&self) -> LispResult<&[Expression]> {
        match self {
            Self::List(list) => Ok(list),
            e => Err(e.clone().type_error("list")),
        }
    }

    pub fn into_name(self) -> LispResult<String> {
        match self {
            Self::Symbol(name) => Ok(name),
            e => Err(e.type_error("symbol")),
        }
    }

    fn operator(&self) -> Option<Operator> {
        match self {
            Self::Symbol(name) => Operator::from_name(name),
            _ => None,
        }
    }

    pub fn eval(&self, context: &ContextRef) -> ExprResult {
        trace!("eval {self}");
        match self {
            Self::Symbol(name) => context.get(name),
            Self::List(list) => match list.split_first() {
                None => Ok(Self::nil()),
                Some((head, args)) => {
                    if let Some(op) = head.operator() {
                        debug!("special form `{}`", Operator::TEXT[op]);
                        return OPERATORS[op](args, context);
                    }
                    let f = head.eval(context)?;
                    let args = args
                        .iter()
                        .map(|expr| expr.eval(context))
                        .collect::<LispResult<Vec<_>>>()?;
                    Ok(f.apply(args)?.fold_sentinel(context.case))
                }
            },
            e => Ok(e.clone()),
        }
    }

    pub fn apply(self, args: Vec<Expression>) -> ExprResult {
        match self {
            Self::Primitive(p) => (p.func)(args),
            Self::Closure(closure) => closure.call(args),
            e => Err(LispError::NotCallable(e)),
        }
    }
}

/// The evaluator's outer surface: one persistent root namespace plus the
/// reader configured for it.
pub struct Interpreter {
    context: ContextRef,
    reader: Reader,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        Self {
            context: Context::global(config.case_fold),
            reader: Reader::new(config.case_fold),
        }
    }

    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    /// Reads every form on `line`, asking `more` for continuation lines while
    /// parentheses are unbalanced.
    pub fn read<F>(&self, line: &str, more: F) -> LispResult<Vec<Expression>>
    where
        F: FnMut() -> Option<String>,
    {
        let mut tokens = tokenize_input(line, more)?;
        self.reader.read_all(&mut tokens)
    }

    pub fn eval(&self, expr: &Expression) -> ExprResult {
        expr.eval(&self.context)
    }

    /// Reads and evaluates the forms on `line` in order, stopping at the
    /// first failure.
    pub fn execute<F>(&self, line: &str, more: F) -> LispResult<Vec<Expression>>
    where
        F: FnMut() -> Option<String>,
    {
        self.read(line, more)?
            .iter()
            .map(|expr| self.eval(expr))
            .collect()
    }

    /// Evaluates a complete input and returns the value of its last form,
    /// or `nil` when it holds none.
    pub fn eval_str(&self, input: &str) -> ExprResult {
        Ok(self
            .execute(input, || None)?
            .pop()
            .unwrap_or_else(Expression::nil))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
