//! A minimal PDDL s-expression reader: tokenizer plus recursive-descent
//! parser producing a generic `SExpr` tree.
//!
//! Grounded on `parsing/sexpr.rs`'s `tokenize`/`read` pair and its
//! `ListIter` pop helpers, with the teacher's `Input`/`Span`/`Loc`/`ErrLoc`
//! machinery dropped: that system exists to report precise source spans
//! back through a CP-solver's constraint diagnostics, which this ambient
//! parser (just enough PDDL to make the `gg` binary runnable) doesn't need
//! — line numbers in the error message are enough here.

use anyhow::{bail, Context, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SExpr {
    Atom(String),
    List(Vec<SExpr>),
}

impl SExpr {
    pub fn as_atom(&self) -> Result<&str> {
        match self {
            SExpr::Atom(a) => Ok(a),
            SExpr::List(_) => bail!("expected an atom, found a list"),
        }
    }

    pub fn as_list(&self) -> Result<&[SExpr]> {
        match self {
            SExpr::List(l) => Ok(l),
            SExpr::Atom(a) => bail!("expected a list, found atom `{a}`"),
        }
    }
}

struct Token {
    text: String,
    line: usize,
}

fn tokenize(src: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    for (line_no, line) in src.lines().enumerate() {
        let line_no = line_no + 1;
        let code = match line.find(';') {
            Some(i) => &line[..i],
            None => line,
        };
        let mut chars = code.char_indices().peekable();
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }
            if c == '(' || c == ')' {
                tokens.push(Token {
                    text: c.to_string(),
                    line: line_no,
                });
                chars.next();
                continue;
            }
            let start = i;
            let mut end = i + c.len_utf8();
            chars.next();
            while let Some(&(j, c2)) = chars.peek() {
                if c2.is_whitespace() || c2 == '(' || c2 == ')' {
                    break;
                }
                end = j + c2.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                text: code[start..end].to_string(),
                line: line_no,
            });
        }
    }
    tokens
}

struct Reader {
    tokens: Vec<Token>,
    pos: usize,
}

impl Reader {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        if self.pos < self.tokens.len() {
            let t = self.tokens.remove(self.pos);
            Some(t)
        } else {
            None
        }
    }

    fn read_one(&mut self) -> Result<SExpr> {
        let tok = self
            .next()
            .context("unexpected end of input while reading an expression")?;
        match tok.text.as_str() {
            "(" => {
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        None => bail!("unterminated list starting near line {}", tok.line),
                        Some(t) if t.text == ")" => {
                            self.next();
                            break;
                        }
                        _ => items.push(self.read_one()?),
                    }
                }
                Ok(SExpr::List(items))
            }
            ")" => bail!("unexpected `)` at line {}", tok.line),
            atom => Ok(SExpr::Atom(atom.to_string())),
        }
    }
}

/// Parses `src` as a sequence of top-level s-expressions (a PDDL file is
/// normally exactly one, `(define ...)`, but this accepts any number).
pub fn parse_all(src: &str) -> Result<Vec<SExpr>> {
    let tokens = tokenize(src);
    let mut reader = Reader { tokens, pos: 0 };
    let mut exprs = Vec::new();
    while reader.peek().is_some() {
        exprs.push(reader.read_one()?);
    }
    Ok(exprs)
}

/// Parses `src` expecting exactly one top-level s-expression.
pub fn parse_one(src: &str) -> Result<SExpr> {
    let mut exprs = parse_all(src)?;
    if exprs.len() != 1 {
        bail!("expected exactly one top-level expression, found {}", exprs.len());
    }
    Ok(exprs.remove(0))
}

/// Helpers for consuming a `VecDeque<SExpr>` left-to-right while parsing a
/// list's elements, named to avoid shadowing `VecDeque`'s own
/// `Option`-returning `pop_front`.
pub trait ListExt {
    fn take_front(&mut self) -> Result<SExpr>;
    fn take_atom(&mut self) -> Result<String>;
}

impl ListExt for std::collections::VecDeque<SExpr> {
    fn take_front(&mut self) -> Result<SExpr> {
        std::collections::VecDeque::pop_front(self).context("expected another element, found none")
    }

    fn take_atom(&mut self) -> Result<String> {
        Ok(self.take_front()?.as_atom()?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_lists_and_atoms() {
        let expr = parse_one("(define (domain d) (:action a :parameters (?x)))").unwrap();
        let list = expr.as_list().unwrap();
        assert_eq!(list[0].as_atom().unwrap(), "define");
        assert_eq!(list.len(), 3);
        let action = list[2].as_list().unwrap();
        assert_eq!(action[0].as_atom().unwrap(), ":action");
    }

    #[test]
    fn strips_line_comments() {
        let expr = parse_one("(foo ; a trailing comment\n bar)").unwrap();
        let list = expr.as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].as_atom().unwrap(), "bar");
    }

    #[test]
    fn unterminated_list_is_an_error() {
        assert!(parse_one("(foo bar").is_err());
    }

    #[test]
    fn rejects_more_than_one_top_level_expression() {
        assert!(parse_one("(foo) (bar)").is_err());
    }
}
