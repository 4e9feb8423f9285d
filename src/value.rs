//! # Value Module
//!
//! Named template values and their resolution.
//!
//! A value is either a [`ConstValue`], whose text is matched verbatim, or a
//! [`RegexpValue`], whose text is spliced into the header matcher as live
//! regular-expression syntax. Both may reference other values with
//! `{{name}}`; references are resolved case-insensitively and a leading `.`
//! is ignored, so `{{ .YEAR }}`, `{{year}}` and `{{YEAR}}` are the same value.
//!
//! Every value has two resolved texts:
//! - the *computed* text, used when building the matcher
//! - the *literal* text, used when rendering a suggested fix. For a regexp
//!   value this is its optional `example`; a regexp value without an example
//!   has no literal text and cannot be used in a fix.
//!
//! ## Example
//!
//! ```rust
//! use goheader::value::{Value, ValueSet};
//!
//! # fn main() -> Result<(), goheader::value::ValueError> {
//! let mut values = ValueSet::builtin(2025);
//! values.insert(Value::constant("COMPANY", "Acme {{YEAR}}"));
//! values.calculate()?;
//!
//! assert_eq!(values.get("company").and_then(|v| v.get()), Some("Acme 2025"));
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use thiserror::Error;

/// Opening marker of a reference inside a value.
pub const VALUE_LEFT_DELIM: &str = "{{";

/// Closing marker of a reference inside a value.
pub const VALUE_RIGHT_DELIM: &str = "}}";

pub const YEAR: &str = "YEAR";
pub const YEAR_RANGE: &str = "YEAR_RANGE";
pub const MOD_YEAR: &str = "MOD_YEAR";
pub const MOD_YEAR_RANGE: &str = "MOD_YEAR_RANGE";

/// Errors raised while resolving values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
  /// A value references itself, directly or through other values.
  #[error("recursive value: {}", chain.join(" -> "))]
  RecursiveValue {
    /// The reference chain, starting and ending with the same key.
    chain: Vec<String>,
  },

  /// A value references a name that is not declared.
  #[error("unknown value name '{reference}' referenced by '{key}'")]
  UnknownValue { key: String, reference: String },

  /// A `{{` without a matching `}}`.
  #[error("missed value ending in '{key}'")]
  MissedValueEnding { key: String },
}

/// Normalizes a value name for lookup: trims it, drops a leading `.` and
/// lowercases it.
pub fn normalize_key(key: &str) -> String {
  let trimmed = key.trim();
  trimmed.strip_prefix('.').unwrap_or(trimmed).trim().to_lowercase()
}

/// Returns `{{name}}`.
pub fn reference(name: &str) -> String {
  format!("{VALUE_LEFT_DELIM}{name}{VALUE_RIGHT_DELIM}")
}

/// Pattern matching either `YYYY` or `YYYY-<year>` where `<year>` is the
/// value named by `year_key`.
pub fn year_range_pattern(year_key: &str) -> String {
  let year = reference(year_key);
  format!(r"((\d{{4}}-{year})|({year}))")
}

/// A value whose computed text is matched literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstValue {
  key: String,
  raw: String,
  computed: Option<String>,
  literal: Option<String>,
}

/// A value whose computed text is a regular-expression fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexpValue {
  key: String,
  raw: String,
  /// Literal representative used when rendering fixes.
  example: Option<String>,
  computed: Option<String>,
  literal: Option<String>,
}

/// A named template value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Const(ConstValue),
  Regexp(RegexpValue),
}

impl Value {
  /// Creates a const value.
  pub fn constant(key: impl Into<String>, raw: impl Into<String>) -> Self {
    Self::Const(ConstValue {
      key: key.into(),
      raw: raw.into(),
      computed: None,
      literal: None,
    })
  }

  /// Creates a regexp value without a literal representative.
  pub fn regexp(key: impl Into<String>, raw: impl Into<String>) -> Self {
    Self::Regexp(RegexpValue {
      key: key.into(),
      raw: raw.into(),
      example: None,
      computed: None,
      literal: None,
    })
  }

  /// Creates a regexp value with a literal representative for fixes.
  ///
  /// The example may itself reference other values; those references resolve
  /// to the literal text of the referenced values.
  pub fn regexp_with_example(key: impl Into<String>, raw: impl Into<String>, example: impl Into<String>) -> Self {
    Self::Regexp(RegexpValue {
      key: key.into(),
      raw: raw.into(),
      example: Some(example.into()),
      computed: None,
      literal: None,
    })
  }

  /// The key as declared.
  pub fn key(&self) -> &str {
    match self {
      Self::Const(c) => &c.key,
      Self::Regexp(r) => &r.key,
    }
  }

  /// The unresolved text.
  pub fn raw(&self) -> &str {
    match self {
      Self::Const(c) => &c.raw,
      Self::Regexp(r) => &r.raw,
    }
  }

  pub const fn is_regexp(&self) -> bool {
    matches!(self, Self::Regexp(_))
  }

  /// The computed text, or `None` before [`calculate`](Self::calculate).
  pub fn get(&self) -> Option<&str> {
    match self {
      Self::Const(c) => c.computed.as_deref(),
      Self::Regexp(r) => r.computed.as_deref(),
    }
  }

  /// The literal text used for fixes.
  ///
  /// `None` for a regexp value without an example, for any value referencing
  /// such a value, and before [`calculate`](Self::calculate).
  pub fn literal(&self) -> Option<&str> {
    match self {
      Self::Const(c) => c.literal.as_deref(),
      Self::Regexp(r) => r.literal.as_deref(),
    }
  }

  /// Resolves this value's references against `values`.
  ///
  /// Calling it again recomputes from the raw text, so the result does not
  /// change between calls.
  ///
  /// # Errors
  ///
  /// Returns [`ValueError::RecursiveValue`] when the reference graph reachable
  /// from this value contains a cycle, and [`ValueError::UnknownValue`] or
  /// [`ValueError::MissedValueEnding`] for malformed references.
  pub fn calculate(&mut self, values: &ValueSet) -> Result<(), ValueError> {
    let key = normalize_key(self.key());
    let computed = values.resolve(&key, Some(self.raw()), TextKind::Pattern, &mut HashMap::new())?;
    let literal = values.resolve(&key, self.source(TextKind::Literal), TextKind::Literal, &mut HashMap::new())?;
    self.set_resolved(computed, literal);
    Ok(())
  }

  fn source(&self, kind: TextKind) -> Option<&str> {
    match (self, kind) {
      (_, TextKind::Pattern) => Some(self.raw()),
      (Self::Const(c), TextKind::Literal) => Some(&c.raw),
      (Self::Regexp(r), TextKind::Literal) => r.example.as_deref(),
    }
  }

  fn set_resolved(&mut self, computed: Option<String>, literal: Option<String>) {
    match self {
      Self::Const(c) => {
        c.computed = computed;
        c.literal = literal;
      }
      Self::Regexp(r) => {
        r.computed = computed;
        r.literal = literal;
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextKind {
  Pattern,
  Literal,
}

#[derive(Debug, Clone)]
enum Piece<'a> {
  Text(&'a str),
  Ref(String),
}

/// Splits `text` into literal pieces and normalized references.
fn split_references<'a>(key: &str, text: &'a str) -> Result<Vec<Piece<'a>>, ValueError> {
  let mut pieces = Vec::new();
  let mut rest = text;

  while let Some(start) = rest.find(VALUE_LEFT_DELIM) {
    pieces.push(Piece::Text(&rest[..start]));
    let after = &rest[start + VALUE_LEFT_DELIM.len()..];
    let end = after.find(VALUE_RIGHT_DELIM).ok_or_else(|| ValueError::MissedValueEnding {
      key: key.to_string(),
    })?;
    pieces.push(Piece::Ref(normalize_key(&after[..end])));
    rest = &after[end + VALUE_RIGHT_DELIM.len()..];
  }

  pieces.push(Piece::Text(rest));
  Ok(pieces)
}

/// One in-progress resolution on the explicit stack.
struct Frame<'a> {
  key: String,
  pieces: Vec<Piece<'a>>,
  next: usize,
  /// `None` once any piece turned out to have no text of the requested kind.
  out: Option<String>,
}

impl<'a> Frame<'a> {
  fn new(key: String, text: Option<&'a str>) -> Result<Self, ValueError> {
    match text {
      Some(text) => Ok(Self {
        pieces: split_references(&key, text)?,
        key,
        next: 0,
        out: Some(String::new()),
      }),
      None => Ok(Self {
        key,
        pieces: Vec::new(),
        next: 0,
        out: None,
      }),
    }
  }

  fn append(&mut self, text: Option<&str>) {
    match (&mut self.out, text) {
      (Some(out), Some(text)) => out.push_str(text),
      (out, None) => *out = None,
      (None, Some(_)) => {}
    }
    self.next += 1;
  }
}

/// A set of values keyed by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
  values: BTreeMap<String, Value>,
}

impl ValueSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates the built-in values for the given current year.
  ///
  /// - `YEAR`: the year, literally
  /// - `YEAR_RANGE`: `YYYY` or `YYYY-<YEAR>`, rendered as `YEAR` in fixes
  /// - `MOD_YEAR` / `MOD_YEAR_RANGE`: the per-file modification year and
  ///   range. They default to `YEAR` / `YEAR_RANGE` until replaced with
  ///   [`with_mod_year`](Self::with_mod_year).
  pub fn builtin(year: i32) -> Self {
    let mut values = Self::new();
    values.insert(Value::constant(YEAR, year.to_string()));
    values.insert(Value::regexp_with_example(
      YEAR_RANGE,
      year_range_pattern(YEAR),
      reference(YEAR),
    ));
    values.insert(Value::constant(MOD_YEAR, reference(YEAR)));
    values.insert(Value::regexp_with_example(
      MOD_YEAR_RANGE,
      reference(YEAR_RANGE),
      reference(YEAR),
    ));
    values
  }

  /// Inserts a value, replacing any value with the same normalized key.
  pub fn insert(&mut self, value: Value) -> Option<Value> {
    self.values.insert(normalize_key(value.key()), value)
  }

  /// Looks up a value by name, case-insensitively.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.values.get(&normalize_key(key))
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.values.contains_key(&normalize_key(key))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Iterates over `(normalized key, value)` pairs in key order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v))
  }

  /// Resolves every value in the set.
  ///
  /// Each value is resolved at most once per call; results are shared
  /// between values referencing the same name.
  ///
  /// # Errors
  ///
  /// Fails on the first cycle, unknown reference or unterminated reference.
  pub fn calculate(&mut self) -> Result<(), ValueError> {
    let mut computed = HashMap::new();
    let mut literals = HashMap::new();

    for (key, value) in &self.values {
      if !computed.contains_key(key) {
        let text = self.resolve(key, value.source(TextKind::Pattern), TextKind::Pattern, &mut computed)?;
        computed.insert(key.clone(), text);
      }
      if !literals.contains_key(key) {
        let text = self.resolve(key, value.source(TextKind::Literal), TextKind::Literal, &mut literals)?;
        literals.insert(key.clone(), text);
      }
    }

    for (key, value) in self.values.iter_mut() {
      value.set_resolved(
        computed.remove(key).flatten(),
        literals.remove(key).flatten(),
      );
    }

    Ok(())
  }

  /// Returns a resolved copy of this set with `MOD_YEAR` set to `year`.
  ///
  /// The set itself is left untouched, so it can be shared between workers
  /// computing different years concurrently.
  pub fn with_mod_year(&self, year: i32) -> Result<Self, ValueError> {
    let mut values = self.clone();
    values.insert(Value::constant(MOD_YEAR, year.to_string()));
    values.insert(Value::regexp_with_example(
      MOD_YEAR_RANGE,
      year_range_pattern(MOD_YEAR),
      reference(MOD_YEAR),
    ));
    values.calculate()?;
    Ok(values)
  }

  /// Returns `true` if any of `roots` reaches any of `targets` through
  /// references (raw text or example).
  ///
  /// Unknown names and malformed references are ignored here; they are
  /// reported by [`calculate`](Self::calculate).
  pub fn references_any<'r>(&self, roots: impl IntoIterator<Item = &'r str>, targets: &[&str]) -> bool {
    let targets: HashSet<String> = targets.iter().map(|t| normalize_key(t)).collect();
    let mut pending: Vec<String> = roots.into_iter().map(normalize_key).collect();
    let mut seen = HashSet::new();

    while let Some(key) = pending.pop() {
      if targets.contains(&key) {
        return true;
      }
      if !seen.insert(key.clone()) {
        continue;
      }
      let Some(value) = self.values.get(&key) else {
        continue;
      };
      for text in [value.source(TextKind::Pattern), value.source(TextKind::Literal)].into_iter().flatten() {
        if let Ok(pieces) = split_references(&key, text) {
          pending.extend(pieces.into_iter().filter_map(|piece| match piece {
            Piece::Ref(name) => Some(name),
            Piece::Text(_) => None,
          }));
        }
      }
    }

    false
  }

  /// Resolves `root_text` (the text of `root_key`) against the set.
  ///
  /// Resolution uses an explicit stack instead of recursion, and a
  /// `visiting` set holding the keys of the frames on that stack. Meeting a
  /// key that is already being visited is a cycle. `memo` caches finished
  /// keys across calls.
  fn resolve<'a>(
    &'a self,
    root_key: &str,
    root_text: Option<&'a str>,
    kind: TextKind,
    memo: &mut HashMap<String, Option<String>>,
  ) -> Result<Option<String>, ValueError> {
    let mut visiting = HashSet::from([root_key.to_string()]);
    let mut stack = vec![Frame::new(root_key.to_string(), root_text)?];

    while let Some(mut frame) = stack.pop() {
      let piece = frame.pieces.get(frame.next).cloned();
      match piece {
        Some(Piece::Text(text)) => {
          frame.append(Some(text));
          stack.push(frame);
        }
        Some(Piece::Ref(name)) => {
          if let Some(done) = memo.get(&name) {
            frame.append(done.as_deref());
            stack.push(frame);
            continue;
          }

          if visiting.contains(&name) {
            let mut chain: Vec<String> = stack
              .iter()
              .map(|f| f.key.as_str())
              .chain(std::iter::once(frame.key.as_str()))
              .skip_while(|k| *k != name)
              .map(|k| self.display_key(k))
              .collect();
            chain.push(self.display_key(&name));
            return Err(ValueError::RecursiveValue { chain });
          }

          let Some(value) = self.values.get(&name) else {
            return Err(ValueError::UnknownValue {
              key: self.display_key(&frame.key),
              reference: name,
            });
          };

          let child = Frame::new(name.clone(), value.source(kind))?;
          visiting.insert(name);
          stack.push(frame);
          stack.push(child);
        }
        None => {
          visiting.remove(&frame.key);
          match stack.last_mut() {
            Some(parent) => {
              parent.append(frame.out.as_deref());
              memo.insert(frame.key, frame.out);
            }
            None => return Ok(frame.out),
          }
        }
      }
    }

    Ok(None)
  }

  fn display_key(&self, key: &str) -> String {
    self
      .values
      .get(key)
      .map(|v| v.key().to_string())
      .unwrap_or_else(|| key.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_key() {
    assert_eq!(normalize_key(" .YEAR "), "year");
    assert_eq!(normalize_key("My Company"), "my company");
    assert_eq!(normalize_key("year_range"), "year_range");
  }

  #[test]
  fn test_builtin_values() {
    let mut values = ValueSet::builtin(2025);
    values.calculate().expect("builtins resolve");

    assert_eq!(values.get("YEAR").and_then(Value::get), Some("2025"));
    assert_eq!(
      values.get("year_range").and_then(Value::get),
      Some(r"((\d{4}-2025)|(2025))")
    );
    assert_eq!(values.get("YEAR_RANGE").and_then(Value::literal), Some("2025"));
    assert_eq!(values.get("MOD_YEAR").and_then(Value::get), Some("2025"));
    assert_eq!(values.get("MOD_YEAR_RANGE").and_then(Value::literal), Some("2025"));
  }

  #[test]
  fn test_const_calculate_is_idempotent() {
    let values = ValueSet::new();
    let mut value = Value::constant("COMPANY", "Acme Inc.");

    value.calculate(&values).expect("first calculate");
    let first = value.get().map(str::to_string);
    value.calculate(&values).expect("second calculate");
    value.calculate(&values).expect("third calculate");

    assert_eq!(first.as_deref(), Some("Acme Inc."));
    assert_eq!(value.get(), first.as_deref());
    assert_eq!(value.raw(), "Acme Inc.");
  }

  #[test]
  fn test_nested_references_resolve() {
    let mut values = ValueSet::new();
    values.insert(Value::regexp("A", "[{{ B }}{{ C }}]{{D}}"));
    values.insert(Value::constant("B", "a-"));
    values.insert(Value::regexp("C", "z"));
    values.insert(Value::constant("D", "{{E}}"));
    values.insert(Value::constant("E", "{7}"));
    values.calculate().expect("values resolve");

    assert_eq!(values.get("a").and_then(Value::get), Some("[a-z]{7}"));
    assert_eq!(values.get("D").and_then(Value::get), Some("{7}"));
  }

  #[test]
  fn test_dot_prefixed_reference() {
    let mut values = ValueSet::builtin(2030);
    values.insert(Value::constant("holder", "{{ .YEAR }} Acme"));
    values.calculate().expect("values resolve");

    assert_eq!(values.get("HOLDER").and_then(Value::get), Some("2030 Acme"));
  }

  #[test]
  fn test_self_reference_is_recursive() {
    let mut values = ValueSet::new();
    values.insert(Value::constant("A", "x {{A}}"));

    let err = values.calculate().expect_err("self reference must fail");
    assert_eq!(
      err,
      ValueError::RecursiveValue {
        chain: vec!["A".to_string(), "A".to_string()]
      }
    );
  }

  #[test]
  fn test_two_value_cycle_names_both_keys() {
    let mut values = ValueSet::new();
    values.insert(Value::constant("A", "{{B}}"));
    values.insert(Value::regexp("B", "{{A}}"));

    let err = values.calculate().expect_err("cycle must fail");
    let message = err.to_string();
    assert!(matches!(err, ValueError::RecursiveValue { .. }));
    assert!(message.contains('A'));
    assert!(message.contains('B'));
  }

  #[test]
  fn test_long_cycle_does_not_overflow() {
    let mut values = ValueSet::new();
    let n = 50_000;
    for i in 0..n {
      values.insert(Value::constant(format!("v{i}"), reference(&format!("v{}", (i + 1) % n))));
    }

    let err = values.calculate().expect_err("cycle must fail");
    match err {
      ValueError::RecursiveValue { chain } => {
        assert_eq!(chain.len(), n + 1);
        assert_eq!(chain.first(), chain.last());
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn test_unknown_reference() {
    let mut values = ValueSet::new();
    values.insert(Value::constant("A", "{{ missing }}"));

    let err = values.calculate().expect_err("unknown reference must fail");
    assert_eq!(
      err,
      ValueError::UnknownValue {
        key: "A".to_string(),
        reference: "missing".to_string()
      }
    );
  }

  #[test]
  fn test_missed_value_ending() {
    let mut values = ValueSet::new();
    values.insert(Value::constant("A", "{{ B"));

    let err = values.calculate().expect_err("unterminated reference must fail");
    assert!(matches!(err, ValueError::MissedValueEnding { .. }));
  }

  #[test]
  fn test_regexp_without_example_has_no_literal() {
    let mut values = ValueSet::new();
    values.insert(Value::regexp("AUTHOR", ".*"));
    values.insert(Value::constant("LINE", "by {{AUTHOR}}"));
    values.calculate().expect("values resolve");

    assert_eq!(values.get("AUTHOR").and_then(Value::get), Some(".*"));
    assert_eq!(values.get("AUTHOR").and_then(Value::literal), None);
    assert_eq!(values.get("LINE").and_then(Value::get), Some("by .*"));
    assert_eq!(values.get("LINE").and_then(Value::literal), None);
  }

  #[test]
  fn test_regexp_example_resolves_literals() {
    let mut values = ValueSet::builtin(2024);
    values.insert(Value::regexp_with_example("HOLDER", "{{YEAR_RANGE}} .+", "{{YEAR}} Acme"));
    values.calculate().expect("values resolve");

    assert_eq!(
      values.get("HOLDER").and_then(Value::get),
      Some(r"((\d{4}-2024)|(2024)) .+")
    );
    assert_eq!(values.get("HOLDER").and_then(Value::literal), Some("2024 Acme"));
  }

  #[test]
  fn test_with_mod_year_leaves_original_untouched() {
    let mut values = ValueSet::builtin(2025);
    values.calculate().expect("values resolve");

    let per_file = values.with_mod_year(2019).expect("per-file values resolve");

    assert_eq!(per_file.get("MOD_YEAR").and_then(Value::get), Some("2019"));
    assert_eq!(
      per_file.get("MOD_YEAR_RANGE").and_then(Value::get),
      Some(r"((\d{4}-2019)|(2019))")
    );
    assert_eq!(values.get("MOD_YEAR").and_then(Value::get), Some("2025"));
  }

  #[test]
  fn test_references_any() {
    let mut values = ValueSet::builtin(2025);
    values.insert(Value::constant("HOLDER", "{{MOD_YEAR}} Acme"));
    values.insert(Value::constant("PLAIN", "Acme"));

    assert!(values.references_any(["holder"], &[MOD_YEAR, MOD_YEAR_RANGE]));
    assert!(values.references_any(["MOD_YEAR_RANGE"], &[MOD_YEAR, MOD_YEAR_RANGE]));
    assert!(!values.references_any(["plain", "year_range"], &[MOD_YEAR, MOD_YEAR_RANGE]));
  }
}
