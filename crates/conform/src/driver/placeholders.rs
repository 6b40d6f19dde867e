//! Rewrite `?` / `:name` placeholders into PostgreSQL `$n` form.
//!
//! The scanner skips single-quoted literals, double-quoted identifiers,
//! dollar-quoted bodies, line and block comments, and `::` casts. A repeated
//! `:name` reuses one slot. Mixing `?` and `:name` in one statement is rejected.

use crate::error::{OrmError, OrmResult};

/// Result of rewriting one SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// SQL with `$1, $2, ...` placeholders.
    pub sql: String,
    /// One entry per `$n` slot: the parameter name (without `:`), or `None` for `?`.
    pub slots: Vec<Option<String>>,
}

impl Rewritten {
    /// Slot index (0-based) for a named parameter, accepting a leading `:`.
    pub fn slot_for(&self, name: &str) -> Option<usize> {
        let name = name.strip_prefix(':').unwrap_or(name);
        self.slots.iter().position(|s| s.as_deref() == Some(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Positional,
    Named,
}

pub fn rewrite(sql: &str) -> OrmResult<Rewritten> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut slots: Vec<Option<String>> = Vec::new();
    let mut style: Option<Style> = None;
    let mut i = 0;

    let mut check_style = |found: Style| -> OrmResult<()> {
        match style {
            Some(s) if s != found => Err(OrmError::validation(
                "positional (?) and named (:name) placeholders cannot be mixed",
            )),
            _ => {
                style = Some(found);
                Ok(())
            }
        }
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let end = skip_quoted(&chars, i, c);
                out.extend(&chars[i..end]);
                i = end;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == '\n')
                    .map_or(chars.len(), |p| i + p);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let end = find_seq(&chars, i + 2, &['*', '/']).map_or(chars.len(), |p| p + 2);
                out.extend(&chars[i..end]);
                i = end;
            }
            '$' => {
                let end = skip_dollar_quoted(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '?' => {
                check_style(Style::Positional)?;
                slots.push(None);
                out.push('$');
                out.push_str(&slots.len().to_string());
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).is_some_and(|&ch| is_ident_start(ch))
                && (i == 0 || chars[i - 1] != ':') =>
            {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&ch| !is_ident_char(ch))
                    .map_or(chars.len(), |p| start + p);
                let name: String = chars[start..end].iter().collect();
                check_style(Style::Named)?;
                let slot = match slots.iter().position(|s| s.as_deref() == Some(name.as_str())) {
                    Some(existing) => existing + 1,
                    None => {
                        slots.push(Some(name));
                        slots.len()
                    }
                };
                out.push('$');
                out.push_str(&slot.to_string());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(Rewritten { sql: out, slots })
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// End index (exclusive) of a quoted run starting at `start`; doubled quotes escape.
fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// End index (exclusive) of a `$tag$ ... $tag$` body, or `start + 1` if `$` does not open one.
fn skip_dollar_quoted(chars: &[char], start: usize) -> usize {
    let tag_end = chars[start + 1..]
        .iter()
        .position(|&ch| !is_ident_char(ch))
        .map(|p| start + 1 + p);
    let Some(tag_end) = tag_end else {
        return start + 1;
    };
    if chars[tag_end] != '$' || chars.get(start + 1).is_some_and(|c| c.is_ascii_digit()) {
        return start + 1;
    }
    let tag = &chars[start..=tag_end];
    find_seq(chars, tag_end + 1, tag).map_or(chars.len(), |p| p + tag.len())
}

fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if from > chars.len() {
        return None;
    }
    chars[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| from + p)
}
