//! Bind values for a prepared statement.
//!
//! A [`Criteria`] is an ordered set of `(key, value)` entries. Its binding mode is
//! inferred from the shape of the key set: it is positional iff the keys are
//! exactly `{0, 1, .., n-1}`, and named otherwise.

use crate::value::Value;
use std::fmt;

/// Key of a single bind value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamKey {
    /// 0-based position.
    Index(usize),
    /// Parameter name, with or without the leading `:`.
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Name(n) => f.write_str(n),
        }
    }
}

impl From<usize> for ParamKey {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// How a [`Criteria`] is applied to a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindMode {
    Positional,
    Named,
}

/// Ordered bind values for one statement execution.
///
/// # Example
///
/// ```
/// use conform::{BindMode, Criteria};
///
/// let by_position = Criteria::positional([7_i64]);
/// assert_eq!(by_position.mode(), BindMode::Positional);
///
/// let by_name = Criteria::new().named("name", "Bob");
/// assert_eq!(by_name.mode(), BindMode::Named);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(ParamKey, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build densely indexed criteria from a list of values.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (ParamKey::Index(i), v.into()))
                .collect(),
        }
    }

    /// Set `key` to `value` (consuming version of [`Criteria::set`]).
    pub fn with(mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a named parameter.
    pub fn named(self, name: &str, value: impl Into<Value>) -> Self {
        self.with(ParamKey::Name(name.to_string()), value)
    }

    /// Insert or replace the value for `key`. Replacing keeps the original position.
    pub fn set(&mut self, key: impl Into<ParamKey>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Append a value at the next free position.
    pub fn push(&mut self, value: impl Into<Value>) -> &mut Self {
        let next = self
            .entries
            .iter()
            .filter_map(|(k, _)| match k {
                ParamKey::Index(i) => Some(i + 1),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.set(ParamKey::Index(next), value)
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Infer the binding mode from the key set.
    pub fn mode(&self) -> BindMode {
        let n = self.entries.len();
        let mut seen = vec![false; n];
        for (key, _) in &self.entries {
            match key {
                ParamKey::Index(i) if *i < n && !seen[*i] => seen[*i] = true,
                _ => return BindMode::Named,
            }
        }
        BindMode::Positional
    }
}

impl<K: Into<ParamKey>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut criteria = Criteria::new();
        for (k, v) in iter {
            criteria.set(k, v);
        }
        criteria
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_indices_are_positional() {
        assert_eq!(Criteria::positional([1_i64, 2, 3]).mode(), BindMode::Positional);
        let shuffled: Criteria = [(2_usize, "c"), (0, "a"), (1, "b")].into_iter().collect();
        assert_eq!(shuffled.mode(), BindMode::Positional);
    }

    #[test]
    fn empty_criteria_is_positional() {
        assert_eq!(Criteria::new().mode(), BindMode::Positional);
    }

    #[test]
    fn gaps_or_offsets_are_named() {
        let one_based: Criteria = [(1_usize, "a"), (2, "b")].into_iter().collect();
        assert_eq!(one_based.mode(), BindMode::Named);
        let gap: Criteria = [(0_usize, "a"), (2, "b")].into_iter().collect();
        assert_eq!(gap.mode(), BindMode::Named);
    }

    #[test]
    fn any_name_makes_it_named() {
        let mixed = Criteria::positional(["x"]).named("id", 3_i64);
        assert_eq!(mixed.mode(), BindMode::Named);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut c = Criteria::new().named("a", 1_i64).named("b", 2_i64);
        c.set("a", 10_i64);
        let keys: Vec<_> = c.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(c.get(&ParamKey::from("a")), Some(&Value::Integer(10)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn push_appends_next_index() {
        let mut c = Criteria::new();
        c.push("a").push("b");
        assert_eq!(c.get(&ParamKey::Index(1)), Some(&Value::Text("b".into())));
        assert_eq!(c.mode(), BindMode::Positional);
    }
}
