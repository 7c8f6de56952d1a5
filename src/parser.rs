use std::collections::VecDeque;

use log::debug;

use crate::{
    config::CaseFold,
    error::{LispError, LispResult},
    number::Number,
    syntax::{Expression, Operator},
};

pub use tokens::{tokenize, Token, TokenSpan};

pub mod tokens {
    use std::ops::Range;

    use winnow::{
        combinator::{alt, preceded, repeat, terminated},
        error::ContextError,
        token::{one_of, take_while},
        Located, PResult, Parser,
    };

    use crate::error::{LispError, LispResult};

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Token {
        Open,
        Close,
        Quote,
        /// `"`, always followed by a [`Token::StringBody`].
        StringMark,
        /// Everything after a `"` up to the next parenthesis.
        StringBody(String),
        Sharp,
        Atom(String),
    }

    impl Token {
        pub fn text(&self) -> &str {
            match self {
                Token::Open => "(",
                Token::Close => ")",
                Token::Quote => "'",
                Token::StringMark => "\"",
                Token::Sharp => "#",
                Token::StringBody(s) | Token::Atom(s) => s,
            }
        }
    }

    pub type TokenSpan = (Token, Range<usize>);

    type Input<'a> = Located<&'a str>;

    fn is_separator(c: char) -> bool {
        c.is_whitespace()
    }

    fn is_delimiter(c: char) -> bool {
        c == '(' || c == ')'
    }

    fn separator(input: &mut Input<'_>) -> PResult<(), ContextError> {
        take_while(0.., is_separator).void().parse_next(input)
    }

    fn atom(input: &mut Input<'_>) -> PResult<Token, ContextError> {
        take_while(1.., |c: char| !is_separator(c) && !is_delimiter(c))
            .map(|s: &str| Token::Atom(s.to_owned()))
            .parse_next(input)
    }

    fn single(input: &mut Input<'_>) -> PResult<Vec<TokenSpan>, ContextError> {
        alt((
            one_of('(').value(Token::Open),
            one_of(')').value(Token::Close),
            one_of('\'').value(Token::Quote),
            one_of('#').value(Token::Sharp),
            atom,
        ))
        .with_span()
        .map(|span| vec![span])
        .parse_next(input)
    }

    /// A `"` and the raw run after it, spaces included. The closing quote
    /// stays part of the run; trailing whitespace does not.
    fn string(input: &mut Input<'_>) -> PResult<Vec<TokenSpan>, ContextError> {
        let mark = one_of('"')
            .value(Token::StringMark)
            .with_span()
            .parse_next(input)?;
        let body = take_while(0.., |c: char| !is_delimiter(c))
            .map(|s: &str| Token::StringBody(s.trim_end().to_owned()))
            .with_span()
            .parse_next(input)?;
        Ok(vec![mark, body])
    }

    pub fn tokenize(line: &str) -> LispResult<Vec<TokenSpan>> {
        terminated(
            repeat(0.., preceded(separator, alt((string, single)))),
            separator,
        )
        .parse(Located::new(line))
        .map(|groups: Vec<Vec<TokenSpan>>| groups.into_iter().flatten().collect())
        .map_err(|err| LispError::Syntax(format!("unrecognized input at offset {}", err.offset())))
    }

    /// Open minus close parentheses.
    pub fn depth(tokens: &[TokenSpan]) -> isize {
        tokens
            .iter()
            .map(|(token, _)| match token {
                Token::Open => 1,
                Token::Close => -1,
                _ => 0,
            })
            .sum()
    }
}

/// Tokenizes `line`, pulling further lines from `more` while more
/// parentheses are open than closed.
pub fn tokenize_input<F>(line: &str, mut more: F) -> LispResult<VecDeque<Token>>
where
    F: FnMut() -> Option<String>,
{
    let mut spans = tokenize(line)?;
    let mut depth = tokens::depth(&spans);
    while depth > 0 {
        debug!("{depth} unclosed parentheses, reading another line");
        let next = more().ok_or(LispError::UnexpectedEof)?;
        let next = tokenize(&next)?;
        depth += tokens::depth(&next);
        spans.extend(next);
    }
    Ok(spans.into_iter().map(|(token, _)| token).collect())
}

/// Builds expressions from tokens, expanding reader shorthand on the way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reader {
    case: CaseFold,
}

impl Reader {
    pub fn new(case: CaseFold) -> Self {
        Self { case }
    }

    pub fn read_all(&self, tokens: &mut VecDeque<Token>) -> LispResult<Vec<Expression>> {
        let mut exprs = Vec::new();
        while !tokens.is_empty() {
            exprs.push(self.read(tokens)?);
        }
        Ok(exprs)
    }

    pub fn read(&self, tokens: &mut VecDeque<Token>) -> LispResult<Expression> {
        match tokens.pop_front().ok_or(LispError::UnexpectedEof)? {
            Token::Open => {
                let mut list = Vec::new();
                loop {
                    match tokens.front() {
                        None => return Err(LispError::UnexpectedEof),
                        Some(Token::Close) => break,
                        Some(_) => list.push(self.read(tokens)?),
                    }
                }
                tokens.pop_front();
                Ok(Expression::List(expand_accessor(list)))
            }
            Token::Close => Err(LispError::UnexpectedToken(")".to_string())),
            Token::Quote => Ok(Expression::List(vec![
                Expression::Symbol(self.case.apply(Operator::TEXT[Operator::Quote])),
                self.read(tokens)?,
            ])),
            Token::StringMark => match tokens.pop_front() {
                Some(Token::StringBody(body)) => {
                    let text = body.strip_suffix('"').unwrap_or(&body);
                    Ok(Expression::String(text.to_owned()))
                }
                Some(token) => Err(LispError::UnexpectedToken(token.text().to_owned())),
                None => Err(LispError::UnexpectedEof),
            },
            Token::StringBody(body) => Err(LispError::UnexpectedToken(body)),
            Token::Sharp => self.read(tokens),
            Token::Atom(text) => self.atom(&text),
        }
    }

    pub fn atom(&self, token: &str) -> LispResult<Expression> {
        if is_numeric(token) {
            Number::parse(token).map(Expression::Number)
        } else if token.contains('"') {
            Ok(Expression::String(token.to_owned()))
        } else {
            Ok(Expression::Symbol(self.case.apply(token)))
        }
    }
}

/// A digit, or a minus sign followed by a digit.
pub fn is_numeric(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some('-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some(c) => c.is_ascii_digit(),
        None => false,
    }
}

/// `ca[ad]+r` and `cd[ad]+r` accessor names, which expand into nested
/// `car`/`cdr` calls.
fn is_compound_accessor(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let Some(letters) = lower
        .strip_prefix('c')
        .and_then(|rest| rest.strip_suffix('r'))
    else {
        return false;
    };
    letters.len() >= 2 && letters.chars().all(|c| c == 'a' || c == 'd')
}

/// Rewrites `(cXY..r args)` into `(cXr (cY..r args))` until only `car` and
/// `cdr` heads remain. Each step removes one letter.
fn expand_accessor(mut list: Vec<Expression>) -> Vec<Expression> {
    let name = match list.first() {
        Some(Expression::Symbol(name)) if is_compound_accessor(name) => name.clone(),
        _ => return list,
    };
    let outer = format!("{}{}", &name[..2], &name[name.len() - 1..]);
    let inner = format!("{}{}", &name[..1], &name[2..]);
    list[0] = Expression::Symbol(inner);
    vec![
        Expression::Symbol(outer),
        Expression::List(expand_accessor(list)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(tokens: &[TokenSpan]) -> Vec<&str> {
        tokens.iter().map(|(token, _)| token.text()).collect()
    }

    fn read(input: &str) -> Expression {
        let mut tokens = tokenize_input(input, || None).unwrap();
        Reader::default().read(&mut tokens).unwrap()
    }

    fn sym(name: &str) -> Expression {
        Expression::symbol(name)
    }

    #[test]
    fn test_tokenize() {
        let tokens = tokenize("(+ 1   (* 2 3))").unwrap();
        assert_eq!(atoms(&tokens), ["(", "+", "1", "(", "*", "2", "3", ")", ")"]);
        assert_eq!(tokens[1].1, 1..2);

        let tokens = tokenize("'(a b) #car").unwrap();
        assert_eq!(atoms(&tokens), ["'", "(", "a", "b", ")", "#", "car"]);
        assert_eq!(tokens[0].0, Token::Quote);
        assert_eq!(tokens[5].0, Token::Sharp);

        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_string_region() {
        let tokens = tokenize("(print \"hello world\" )").unwrap();
        assert_eq!(
            tokens.iter().map(|(t, _)| t.clone()).collect::<Vec<_>>(),
            [
                Token::Open,
                Token::Atom("print".to_string()),
                Token::StringMark,
                Token::StringBody("hello world\"".to_string()),
                Token::Close,
            ]
        );
    }

    #[test]
    fn test_continuation_lines() {
        let mut lines = vec!["(+ 3".to_string(), "4))".to_string()].into_iter();
        let tokens = tokenize_input("(list 1", || lines.next()).unwrap();
        assert_eq!(tokens.len(), 9);
        assert_eq!(lines.next(), None);

        assert!(matches!(
            tokenize_input("(list 1", || None),
            Err(LispError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_atoms() {
        let reader = Reader::default();
        assert_eq!(reader.atom("42").unwrap(), Expression::integer(42));
        assert_eq!(reader.atom("-3").unwrap(), Expression::integer(-3));
        assert_eq!(
            reader.atom("2.5").unwrap(),
            Expression::Number(Number::Float(2.5))
        );
        assert_eq!(reader.atom("-").unwrap(), sym("-"));
        assert_eq!(reader.atom("Foo").unwrap(), sym("foo"));
        assert_eq!(
            reader.atom("ab\"c").unwrap(),
            Expression::String("ab\"c".to_string())
        );
        assert!(matches!(
            reader.atom("3x"),
            Err(LispError::NumericFormat(_))
        ));
        assert_eq!(Reader::new(CaseFold::Upper).atom("car").unwrap(), sym("CAR"));
    }

    #[test]
    fn test_read_lists() {
        assert_eq!(
            read("(a (b 1) ())"),
            Expression::List(vec![
                sym("a"),
                Expression::List(vec![sym("b"), Expression::integer(1)]),
                Expression::nil(),
            ])
        );
    }

    #[test]
    fn test_reader_macros() {
        assert_eq!(
            read("'(1 2)"),
            Expression::List(vec![
                sym("quote"),
                Expression::List(vec![Expression::integer(1), Expression::integer(2)]),
            ])
        );
        assert_eq!(read("\"hi there\""), Expression::String("hi there".to_string()));
        assert_eq!(read("\"unterminated"), Expression::String("unterminated".to_string()));
        assert_eq!(read("#car"), sym("car"));
    }

    #[test]
    fn test_accessor_expansion() {
        assert_eq!(read("(caddr x)"), read("(car (cdr (cdr x)))"));
        assert_eq!(read("(cadar x)"), read("(car (cdr (car x)))"));
        assert_eq!(read("(cdar x)"), read("(cdr (car x))"));
        assert_eq!(read("(car x)"), Expression::List(vec![sym("car"), sym("x")]));
        assert_eq!(read("(card x)"), Expression::List(vec![sym("card"), sym("x")]));
    }

    #[test]
    fn test_read_errors() {
        let reader = Reader::default();
        let mut tokens = VecDeque::from([Token::Close]);
        assert!(matches!(
            reader.read(&mut tokens),
            Err(LispError::UnexpectedToken(_))
        ));
        let mut tokens = VecDeque::from([Token::Open, Token::Atom("a".to_string())]);
        assert!(matches!(reader.read(&mut tokens), Err(LispError::UnexpectedEof)));
    }
}
