//! Content expressions: the `"block+"` / `"text*"` strings node specs use
//! to declare what they may contain.
//!
//! Grammar is a whitespace-separated sequence of terms, each a node or
//! group name with an optional `*`, `+`, or `?` suffix. Reference checking
//! against declared names happens in the schema builder, which knows the
//! full name/group tables.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid content expression `{expr}`: {reason}")]
pub struct ContentExprError {
    pub expr: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rep {
    One,
    ZeroOrOne,
    ZeroOrMore,
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Term {
    pub name: String,
    pub rep: Rep,
}

/// A parsed content expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    source: String,
    terms: Vec<Term>,
}

impl ContentExpr {
    pub fn parse(source: &str) -> Result<Self, ContentExprError> {
        let err = |reason: &str| ContentExprError {
            expr: source.to_owned(),
            reason: reason.to_owned(),
        };
        let mut terms = Vec::new();
        for raw in source.split_whitespace() {
            let (name, rep) = match raw.as_bytes().last() {
                Some(b'*') => (&raw[..raw.len() - 1], Rep::ZeroOrMore),
                Some(b'+') => (&raw[..raw.len() - 1], Rep::OneOrMore),
                Some(b'?') => (&raw[..raw.len() - 1], Rep::ZeroOrOne),
                _ => (raw, Rep::One),
            };
            if name.is_empty() {
                return Err(err("empty term"));
            }
            let mut chars = name.chars();
            let head_ok = chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
            if !head_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(err(&format!("bad term `{raw}`")));
            }
            terms.push(Term {
                name: name.to_owned(),
                rep,
            });
        }
        if terms.is_empty() {
            return Err(err("no terms"));
        }
        Ok(Self {
            source: source.to_owned(),
            terms,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Node or group names the expression refers to.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|t| t.name.as_str())
    }

    pub(crate) fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether content may be empty (every term admits zero occurrences).
    pub fn allows_empty(&self) -> bool {
        self.terms
            .iter()
            .all(|t| matches!(t.rep, Rep::ZeroOrMore | Rep::ZeroOrOne))
    }
}
