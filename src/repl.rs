use std::borrow::Cow;

use colored::{ColoredString, Colorize};
use rustyline::{
    highlight::Highlighter, history::DefaultHistory, validate::Validator, Completer, Editor,
    Helper, Hinter,
};

use crate::{
    parser::{is_numeric, tokenize, Token, TokenSpan},
    syntax::Operator,
};

pub type Repl = Editor<LispHelper, DefaultHistory>;

#[derive(Helper, Completer, Hinter)]
pub struct LispHelper;

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        match tokenize(line) {
            Ok(tokens) => Cow::Owned(highlight_tokens(&tokens, line)),
            Err(_) => Cow::Borrowed(line),
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

// Continuation lines are requested by the lexer, not by the editor.
impl Validator for LispHelper {}

fn highlight_tokens(tokens: &[TokenSpan], s: &str) -> String {
    let mut next_start = 0;
    let mut highlighted = String::new();
    for (token, span) in tokens {
        if next_start < span.start {
            highlighted.push_str(&s[next_start..span.start]);
        }
        highlighted.push_str(&highlight_token(token, &s[span.clone()]).to_string());
        next_start = span.end;
    }
    if next_start < s.len() {
        highlighted.push_str(&s[next_start..]);
    }
    highlighted
}

fn highlight_token(token: &Token, s: &str) -> ColoredString {
    match token {
        Token::Quote | Token::Sharp => s.bright_blue(),
        Token::StringMark | Token::StringBody(_) => s.green(),
        Token::Atom(atom) if Operator::from_name(atom).is_some() => s.magenta(),
        Token::Atom(atom) if is_numeric(atom) => s.yellow(),
        Token::Atom(_) => s.blue(),
        _ => s.normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_keeps_text() {
        colored::control::set_override(false);
        let line = "(if  'x \"a b\" 12)";
        let tokens = tokenize(line).unwrap();
        assert_eq!(highlight_tokens(&tokens, line), line);
    }
}
