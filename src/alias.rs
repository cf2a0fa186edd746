//! Alias maps read from the `alias`, `browser` and `source` fields of package.json.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHasher;
use serde_json::{Map, Value};

use crate::glob;

/// Value of one alias entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasValue {
  /// `"key": false`, the module is replaced by the empty module.
  Disabled,
  /// `"key": "replacement"`
  Redirect(String),
}

impl AliasValue {
  fn from_json(value: &Value) -> Option<Self> {
    match value {
      Value::String(s) => Some(Self::Redirect(s.clone())),
      Value::Bool(false) => Some(Self::Disabled),
      _ => None,
    }
  }
}

#[derive(Debug)]
struct GlobAlias {
  pattern: Regex,
  template: String,
}

/// A package-scoped remapping table.
///
/// Glob keys are compiled once when the package.json is loaded and are tried in file order.
#[derive(Debug, Default)]
pub struct AliasMap {
  entries: IndexMap<String, AliasValue, BuildHasherDefault<FxHasher>>,
  globs: Vec<GlobAlias>,
}

impl AliasMap {
  pub(crate) fn from_json(map: &Map<String, Value>) -> Self {
    let mut alias_map = Self::default();
    for (key, value) in map {
      let Some(value) = AliasValue::from_json(value) else {
        continue;
      };
      if let AliasValue::Redirect(template) = &value {
        if glob::is_glob(key) {
          match glob::compile(key) {
            Ok(pattern) => alias_map.globs.push(GlobAlias { pattern, template: template.clone() }),
            Err(error) => tracing::trace!(%key, %error, "ignoring uncompilable alias glob"),
          }
        }
      }
      alias_map.entries.insert(key.clone(), value);
    }
    alias_map
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Exact entry for `key`.
  pub fn get(&self, key: &str) -> Option<&AliasValue> {
    self.entries.get(key)
  }

  /// Look `request` up: exact key first, then the first glob key that matches, with its captures
  /// substituted into the value.
  pub fn lookup(&self, request: &str) -> Option<AliasValue> {
    if let Some(value) = self.entries.get(request) {
      return Some(value.clone());
    }
    self.globs.iter().find_map(|alias| {
      alias
        .pattern
        .captures(request)
        .map(|captures| AliasValue::Redirect(glob::expand_template(&captures, &alias.template)))
    })
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn alias_map(value: &Value) -> AliasMap {
    AliasMap::from_json(value.as_object().unwrap())
  }

  #[test]
  fn exact_before_glob() {
    let map = alias_map(&json!({
      "./components/*.js": "./shared/$1.js",
      "./components/special.js": "./special.js",
    }));
    assert_eq!(map.lookup("./components/special.js"), Some(AliasValue::Redirect("./special.js".into())));
    assert_eq!(
      map.lookup("./components/button.js"),
      Some(AliasValue::Redirect("./shared/button.js".into()))
    );
    assert_eq!(map.lookup("./other.js"), None);
  }

  #[test]
  fn first_matching_glob_wins() {
    let map = alias_map(&json!({
      "lib/*": "first/$1",
      "lib/**": "second/$1",
    }));
    assert_eq!(map.lookup("lib/a"), Some(AliasValue::Redirect("first/a".into())));
    assert_eq!(map.lookup("lib/a/b"), Some(AliasValue::Redirect("second/a/b".into())));
  }

  #[test]
  fn disabled_and_ignored_values() {
    let map = alias_map(&json!({
      "fs": false,
      "path": true,
      "os": 1,
      "*.disabled": false,
    }));
    assert_eq!(map.lookup("fs"), Some(AliasValue::Disabled));
    assert_eq!(map.lookup("path"), None);
    assert_eq!(map.lookup("os"), None);
    // Only string values take part in glob matching.
    assert_eq!(map.lookup("x.disabled"), None);
    assert!(!map.is_empty());
    assert_eq!(map.get("fs"), Some(&AliasValue::Disabled));
  }
}
