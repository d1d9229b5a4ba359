//! Replacement templates with capture-group interpolation.
//!
//! Syntax:
//! - `$name` / `${name}`: named group
//! - `$1` / `${1}`: numbered group (`$0` is the whole match)
//! - `$$`: a literal `$`
//!
//! A `$` that does not start a valid reference is kept literally, so JS
//! interpolations like `${$var.message}` read naturally: the `${` is literal
//! text and `$var` is the reference. A bare JS `${name}` IS a reference to
//! `name`; write it as `$${name}` to keep it literal.

use std::fmt;

/// A reference from a template to a capture group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupRef::Index(i) => write!(f, "{}", i),
            GroupRef::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Group(GroupRef),
}

/// A parsed replacement template.
#[derive(Debug, Clone)]
pub struct ReplacementTemplate {
    parts: Vec<Part>,
}

impl ReplacementTemplate {
    pub fn parse(source: &str) -> Self {
        Self {
            parts: parse_parts(source),
        }
    }

    /// Group references in template order.
    pub fn references(&self) -> impl Iterator<Item = &GroupRef> {
        self.parts.iter().filter_map(|part| match part {
            Part::Group(group) => Some(group),
            Part::Literal(_) => None,
        })
    }

    /// Append the rendered template to `out`. Groups that did not
    /// participate in the match render as empty text.
    pub fn render_into<'h>(&self, out: &mut String, lookup: impl Fn(&GroupRef) -> Option<&'h str>) {
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Group(group) => {
                    if let Some(value) = lookup(group) {
                        out.push_str(value);
                    }
                }
            }
        }
    }
}

fn parse_parts(source: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = source;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            literal.push('$');
            rest = tail;
            continue;
        }

        match parse_reference(after) {
            Some((group, consumed)) => {
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Part::Group(group));
                rest = &after[consumed..];
            }
            None => {
                literal.push('$');
                rest = after;
            }
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }

    parts
}

/// Parse the reference following a `$`. Returns the group and the number of
/// bytes consumed after the `$`.
fn parse_reference(s: &str) -> Option<(GroupRef, usize)> {
    if let Some(inner) = s.strip_prefix('{') {
        let end = inner.find('}')?;
        let group = braced_reference(&inner[..end])?;
        return Some((group, end + 2));
    }

    let first = *s.as_bytes().first()?;
    if first.is_ascii_digit() {
        let len = s.bytes().take_while(u8::is_ascii_digit).count();
        let index = s[..len].parse().ok()?;
        Some((GroupRef::Index(index), len))
    } else if first.is_ascii_alphabetic() || first == b'_' {
        let len = s
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        Some((GroupRef::Name(s[..len].to_string()), len))
    } else {
        None
    }
}

fn braced_reference(name: &str) -> Option<GroupRef> {
    if name.is_empty() {
        return None;
    }
    if name.bytes().all(|b| b.is_ascii_digit()) {
        return name.parse().ok().map(GroupRef::Index);
    }

    let mut bytes = name.bytes();
    let first = bytes.next()?;
    let valid = (first.is_ascii_alphabetic() || first == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_');
    valid.then(|| GroupRef::Name(name.to_string()))
}
