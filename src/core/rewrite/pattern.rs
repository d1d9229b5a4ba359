//! Rewrite rules: match expressions, scopes, guards.
//!
//! Match expressions use `regex` crate syntax plus `(?P=name)`
//! back-references. A back-reference is compiled into a copy of the named
//! group's body under a reserved name; a candidate match is accepted only
//! when the copy captured the same text as the original group.

use std::path::Path;

use glob_match::glob_match;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::template::{GroupRef, ReplacementTemplate};
use crate::error::{Error, Result};

/// Reserved prefix for the synthetic groups standing in for back-references.
const BACKREF_PREFIX: &str = "__backref";

/// Upper bound on passes for a `repeat` pattern.
const MAX_REPEAT_PASSES: usize = 64;

// ============================================================================
// Definitions
// ============================================================================

/// Which files a pattern applies to. Empty lists place no restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scope {
    /// File extensions without the dot (`ts`, `tsx`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    /// Globs the path must match at least one of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    /// Globs that exclude a path even when it is included.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Scope {
    pub fn extensions(extensions: &[&str]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn including(mut self, globs: &[&str]) -> Self {
        self.include.extend(globs.iter().map(|g| g.to_string()));
        self
    }

    pub fn excluding(mut self, globs: &[&str]) -> Self {
        self.exclude.extend(globs.iter().map(|g| g.to_string()));
        self
    }

    pub fn matches(&self, path: &Path) -> bool {
        if !self.extensions.is_empty() {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let known = self
                .extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext));
            if !known {
                return false;
            }
        }

        let normalized = normalize_path(path);

        if !self.include.is_empty() && !self.include.iter().any(|g| glob_match(g, &normalized)) {
            return false;
        }

        !self.exclude.iter().any(|g| glob_match(g, &normalized))
    }
}

/// Forward slashes, no leading `./` or `/`, so globs like `**/lib/*.ts` match.
fn normalize_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let mut trimmed = raw.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

/// Serializable form of a rewrite rule, as written in catalog files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternDef {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "match")]
    pub match_expression: String,
    #[serde(rename = "replace")]
    pub replacement: String,
    #[serde(default, skip_serializing_if = "is_default_scope")]
    pub scope: Scope,
    /// Let `.` cross line boundaries.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dot_all: bool,
    /// Run only when this expression matches the current text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_if: Option<String>,
    /// Skip when this expression matches the current text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_if: Option<String>,
    /// Run again over its own output until the text stops changing. For
    /// matches that consume context several occurrences share.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub repeat: bool,
}

fn is_default_scope(scope: &Scope) -> bool {
    *scope == Scope::default()
}

impl PatternDef {
    pub fn new(id: &str, match_expression: &str, replacement: &str) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            match_expression: match_expression.to_string(),
            replacement: replacement.to_string(),
            scope: Scope::default(),
            dot_all: false,
            only_if: None,
            skip_if: None,
            repeat: false,
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn dot_all(mut self) -> Self {
        self.dot_all = true;
        self
    }

    pub fn repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn only_if(mut self, expression: &str) -> Self {
        self.only_if = Some(expression.to_string());
        self
    }

    pub fn skip_if(mut self, expression: &str) -> Self {
        self.skip_if = Some(expression.to_string());
        self
    }
}

// ============================================================================
// Match expressions
// ============================================================================

#[derive(Debug, Clone)]
struct GroupSpan {
    open: usize,
    body: usize,
    close: usize,
    name: Option<String>,
}

#[derive(Debug, Clone)]
struct BackrefSpan {
    open: usize,
    close: usize,
    name: String,
}

#[derive(Debug, Default)]
struct Scan {
    groups: Vec<GroupSpan>,
    backrefs: Vec<BackrefSpan>,
    /// `(open, close)` of every group, capturing or not.
    enclosures: Vec<(usize, usize)>,
}

/// Locate capturing groups and `(?P=name)` back-references in an expression.
///
/// Only delimiters are interpreted; everything else is left for the regex
/// parser to reject.
fn scan(source: &str) -> std::result::Result<Scan, String> {
    let bytes = source.as_bytes();
    let mut result = Scan::default();
    // Open offset, plus the index into `result.groups` for capturing groups.
    let mut stack: Vec<(usize, Option<usize>)> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'[' => i = skip_class(bytes, i)?,
            b'(' => {
                let rest = &source[i + 1..];
                if let Some(tail) = rest.strip_prefix("?P=") {
                    let end = tail
                        .find(')')
                        .ok_or_else(|| "unterminated back-reference".to_string())?;
                    let close = i + 4 + end;
                    result.backrefs.push(BackrefSpan {
                        open: i,
                        close,
                        name: tail[..end].to_string(),
                    });
                    i = close + 1;
                    continue;
                }

                let named = rest.strip_prefix("?P<").or_else(|| rest.strip_prefix("?<"));
                if let Some(tail) = named {
                    let end = tail
                        .find('>')
                        .ok_or_else(|| "unterminated group name".to_string())?;
                    let body = i + 1 + (rest.len() - tail.len()) + end + 1;
                    result.groups.push(GroupSpan {
                        open: i,
                        body,
                        close: 0,
                        name: Some(tail[..end].to_string()),
                    });
                    stack.push((i, Some(result.groups.len() - 1)));
                    i = body;
                } else if rest.starts_with('?') {
                    stack.push((i, None));
                    i += 1;
                } else {
                    result.groups.push(GroupSpan {
                        open: i,
                        body: i + 1,
                        close: 0,
                        name: None,
                    });
                    stack.push((i, Some(result.groups.len() - 1)));
                    i += 1;
                }
            }
            b')' => {
                let Some((open, capture)) = stack.pop() else {
                    return Err(format!("unbalanced ')' at offset {}", i));
                };
                if let Some(index) = capture {
                    result.groups[index].close = i;
                }
                result.enclosures.push((open, i));
                i += 1;
            }
            _ => i += 1,
        }
    }

    if !stack.is_empty() {
        return Err("unclosed group".to_string());
    }

    Ok(result)
}

/// Return the offset just past the character class opening at `start`.
fn skip_class(bytes: &[u8], start: usize) -> std::result::Result<usize, String> {
    let mut j = start + 1;
    if bytes.get(j) == Some(&b'^') {
        j += 1;
    }
    // A leading ']' is a literal member.
    if bytes.get(j) == Some(&b']') {
        j += 1;
    }

    let mut depth = 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'[' => {
                depth += 1;
                j += 1;
            }
            b']' => {
                depth -= 1;
                j += 1;
                if depth == 0 {
                    return Ok(j);
                }
            }
            _ => j += 1,
        }
    }

    Err("unclosed character class".to_string())
}

/// Whether the quantifier starting at `at` allows more than one repetition.
fn repeats_at(source: &str, at: usize) -> bool {
    let rest = source.get(at..).unwrap_or("");
    match rest.as_bytes().first() {
        Some(b'*') | Some(b'+') => true,
        Some(b'{') => {
            let Some(end) = rest.find('}') else {
                return false;
            };
            let bounds = &rest[1..end];
            let upper = bounds.split_once(',').map_or(bounds, |(_, max)| max).trim();
            upper.is_empty() || upper.parse::<usize>().is_ok_and(|max| max > 1)
        }
        _ => false,
    }
}

/// Turn every capturing group in `body` into a non-capturing one.
fn strip_captures(body: &str) -> std::result::Result<String, String> {
    let scanned = scan(body)?;
    if !scanned.backrefs.is_empty() {
        return Err("back-references cannot be nested inside a referenced group".to_string());
    }

    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for group in &scanned.groups {
        out.push_str(&body[last..group.open]);
        out.push_str("(?:");
        last = group.body;
    }
    out.push_str(&body[last..]);
    Ok(out)
}

#[derive(Debug, Clone)]
struct Backref {
    synthetic: String,
    group: String,
}

/// A compiled match expression.
#[derive(Debug, Clone)]
pub struct MatchExpression {
    regex: Regex,
    backrefs: Vec<Backref>,
    /// Compiled group index for each group as numbered in the source.
    numbered: Vec<usize>,
    names: Vec<String>,
}

impl MatchExpression {
    pub fn compile(pattern_id: &str, source: &str, dot_all: bool) -> Result<Self> {
        let invalid = |e: String| Error::catalog_invalid_pattern(pattern_id, "match", e);
        let scanned = scan(source).map_err(invalid)?;

        let declared: Vec<String> = scanned.groups.iter().filter_map(|g| g.name.clone()).collect();
        if let Some(reserved) = declared.iter().find(|n| n.starts_with(BACKREF_PREFIX)) {
            return Err(invalid(format!("group name '{}' is reserved", reserved)));
        }

        let mut compiled = String::with_capacity(source.len());
        let mut backrefs = Vec::new();
        let mut last = 0;

        for (n, backref) in scanned.backrefs.iter().enumerate() {
            let target = scanned
                .groups
                .iter()
                .find(|g| g.name.as_deref() == Some(backref.name.as_str()))
                .ok_or_else(|| {
                    Error::catalog_unknown_group(pattern_id, &backref.name, declared.clone())
                })?;

            if target.open < backref.open && backref.open < target.close {
                return Err(invalid(format!(
                    "back-reference to '{}' sits inside the group it references",
                    backref.name
                )));
            }

            // The copy only keeps the last repetition, so earlier ones would go unchecked.
            let repeated = repeats_at(source, backref.close + 1)
                || scanned.enclosures.iter().any(|&(open, close)| {
                    open < backref.open && backref.close < close && repeats_at(source, close + 1)
                });
            if repeated {
                return Err(invalid(format!(
                    "back-reference to '{}' cannot be repeated by a quantifier",
                    backref.name
                )));
            }

            let body = strip_captures(&source[target.body..target.close]).map_err(invalid)?;
            let synthetic = format!("{}{}", BACKREF_PREFIX, n);

            compiled.push_str(&source[last..backref.open]);
            compiled.push_str(&format!("(?P<{}>{})", synthetic, body));
            last = backref.close + 1;

            backrefs.push(Backref {
                synthetic,
                group: backref.name.clone(),
            });
        }
        compiled.push_str(&source[last..]);

        let regex = RegexBuilder::new(&compiled)
            .dot_matches_new_line(dot_all)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        let mut numbered = vec![0];
        for (index, name) in regex.capture_names().enumerate().skip(1) {
            if name.is_some_and(|n| n.starts_with(BACKREF_PREFIX)) {
                continue;
            }
            numbered.push(index);
        }

        Ok(Self {
            regex,
            backrefs,
            numbered,
            names: declared,
        })
    }

    pub fn declares(&self, group: &GroupRef) -> bool {
        match group {
            GroupRef::Index(i) => *i < self.numbered.len(),
            GroupRef::Name(name) => self.names.iter().any(|n| n == name),
        }
    }

    /// Group names and numbers a template may reference.
    pub fn declared_groups(&self) -> Vec<String> {
        (0..self.numbered.len())
            .map(|i| i.to_string())
            .chain(self.names.iter().cloned())
            .collect()
    }

    fn group<'h>(&self, caps: &Captures<'h>, group: &GroupRef) -> Option<&'h str> {
        let found = match group {
            GroupRef::Index(i) => self.numbered.get(*i).and_then(|&index| caps.get(index)),
            GroupRef::Name(name) => caps.name(name),
        };
        found.map(|m| m.as_str())
    }

    fn accepts(&self, caps: &Captures<'_>) -> bool {
        self.backrefs.iter().all(|backref| {
            match caps.name(&backref.synthetic) {
                // The back-reference sat in an alternative that was not taken.
                None => true,
                Some(copy) => caps.name(&backref.group).map(|m| m.as_str()) == Some(copy.as_str()),
            }
        })
    }

    /// Replace every accepted, non-overlapping match, scanning left to right.
    ///
    /// Returns `None` when nothing matched.
    pub fn replace_all(&self, text: &str, template: &ReplacementTemplate) -> Option<(String, usize)> {
        let mut out = String::new();
        let mut last = 0;
        let mut count = 0;
        let mut at = 0;

        while at <= text.len() {
            let Some(caps) = self.regex.captures_at(text, at) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };

            if !self.accepts(&caps) {
                at = next_boundary(text, whole.start());
                continue;
            }

            out.push_str(&text[last..whole.start()]);
            template.render_into(&mut out, |group| self.group(&caps, group));
            last = whole.end();
            count += 1;

            at = if whole.as_str().is_empty() {
                next_boundary(text, whole.end())
            } else {
                whole.end()
            };
        }

        if count == 0 {
            return None;
        }

        out.push_str(&text[last..]);
        Some((out, count))
    }
}

/// Offset of the character after `from`, or past the end.
fn next_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}

// ============================================================================
// Patterns
// ============================================================================

/// A compiled rewrite rule.
#[derive(Debug, Clone)]
pub struct Pattern {
    def: PatternDef,
    expression: MatchExpression,
    template: ReplacementTemplate,
    only_if: Option<Regex>,
    skip_if: Option<Regex>,
}

impl Pattern {
    pub fn compile(def: PatternDef) -> Result<Self> {
        let expression = MatchExpression::compile(&def.id, &def.match_expression, def.dot_all)?;
        let template = ReplacementTemplate::parse(&def.replacement);
        let only_if = compile_guard(&def.id, "only_if", def.only_if.as_deref())?;
        let skip_if = compile_guard(&def.id, "skip_if", def.skip_if.as_deref())?;

        let pattern = Self {
            def,
            expression,
            template,
            only_if,
            skip_if,
        };
        pattern.check_template()?;
        Ok(pattern)
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn description(&self) -> &str {
        &self.def.description
    }

    pub fn scope(&self) -> &Scope {
        &self.def.scope
    }

    pub fn definition(&self) -> &PatternDef {
        &self.def
    }

    /// Every group the template references must be captured by the expression.
    pub fn check_template(&self) -> Result<()> {
        for group in self.template.references() {
            if !self.expression.declares(group) {
                return Err(Error::catalog_unknown_group(
                    self.id(),
                    group.to_string(),
                    self.expression.declared_groups(),
                ));
            }
        }
        Ok(())
    }

    pub fn applies_to(&self, path: &Path) -> bool {
        self.def.scope.matches(path)
    }

    /// Whether the guards allow this pattern to run against `text`.
    pub fn is_active(&self, text: &str) -> bool {
        if let Some(only_if) = &self.only_if {
            if !only_if.is_match(text) {
                return false;
            }
        }
        !self.skip_if.as_ref().is_some_and(|skip_if| skip_if.is_match(text))
    }

    /// Rewrite every occurrence in `text`. `None` when the pattern is
    /// inactive or nothing matched.
    pub fn rewrite(&self, text: &str) -> Option<(String, usize)> {
        if !self.is_active(text) {
            return None;
        }
        let (mut current, mut count) = self.expression.replace_all(text, &self.template)?;
        if !self.def.repeat || current == text {
            return Some((current, count));
        }
        for _ in 1..MAX_REPEAT_PASSES {
            if !self.is_active(&current) {
                break;
            }
            match self.expression.replace_all(&current, &self.template) {
                Some((next, more)) if next != current => {
                    current = next;
                    count += more;
                }
                _ => break,
            }
        }
        Some((current, count))
    }
}

fn compile_guard(pattern_id: &str, field: &str, source: Option<&str>) -> Result<Option<Regex>> {
    source
        .map(|s| {
            Regex::new(s).map_err(|e| Error::catalog_invalid_pattern(pattern_id, field, e.to_string()))
        })
        .transpose()
}
