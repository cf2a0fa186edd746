//! package.json definitions
//!
//! Only the fields the resolver consults are kept. Fields with a dynamic shape (`browser`,
//! `source`, alias values) are decided once, here, into tagged variants.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::{alias::AliasMap, path::PathUtil};

/// The "browser" field.
///
/// <https://github.com/defunctzombie/package-browser-field-spec>
#[derive(Debug, Default)]
pub enum BrowserField {
  #[default]
  None,
  /// `"browser": "./dist/browser.js"`, replaces the main entry.
  MainOverride(String),
  /// `"browser": { "./server.js": "./client.js", "fs": false }`
  AliasMap(AliasMap),
}

/// The "source" field, used by linked packages that should be built from source.
#[derive(Debug)]
pub enum SourceField {
  /// `"source": "src/index.ts"`
  Entry(String),
  /// `"source": { "./lib/*.js": "./src/$1.ts" }`
  AliasMap(AliasMap),
}

fn into_string(value: Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s),
    _ => None,
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPackageJson {
  name: Value,
  main: Value,
  module: Value,
  source: Value,
  browser: Value,
  alias: Value,
}

/// Deserialized package.json
#[derive(Debug, Default)]
pub struct PackageJson {
  /// Path to `package.json`. Contains the `package.json` filename.
  pub path: PathBuf,

  /// Realpath to `package.json`. Contains the `package.json` filename.
  pub realpath: PathBuf,

  /// The "name" field defines your package's name.
  ///
  /// <https://nodejs.org/api/packages.html#name>
  pub name: Option<String>,

  /// The "main" field defines the entry point of a package when imported by name via a node_modules lookup.
  ///
  /// <https://nodejs.org/api/packages.html#main>
  pub main: Option<String>,

  /// The "module" field, the ES module entry point.
  pub module: Option<String>,

  /// Only kept when the package.json is reached through a symlink.
  pub source: Option<SourceField>,

  pub browser: BrowserField,

  /// The "alias" field.
  pub alias: Option<AliasMap>,
}

impl PackageJson {
  /// # Errors
  ///
  /// * The content is not valid JSON.
  pub(crate) fn parse(path: PathBuf, realpath: PathBuf, json: &str) -> Result<Self, serde_json::Error> {
    let json = json.trim_start_matches('\u{feff}');
    let value: Value = serde_json::from_str(json)?;
    let raw = if value.is_object() {
      serde_json::from_value::<RawPackageJson>(value)?
    } else {
      RawPackageJson::default()
    };

    let linked = realpath != path;
    let source = match raw.source {
      Value::String(entry) => Some(SourceField::Entry(entry)),
      Value::Object(map) => Some(SourceField::AliasMap(AliasMap::from_json(&map))),
      _ => None,
    };
    let browser = match raw.browser {
      Value::String(entry) => BrowserField::MainOverride(entry),
      Value::Object(map) => BrowserField::AliasMap(AliasMap::from_json(&map)),
      _ => BrowserField::None,
    };
    let alias = match raw.alias {
      Value::Object(map) => Some(AliasMap::from_json(&map)),
      _ => None,
    };

    Ok(Self {
      name: into_string(raw.name),
      main: into_string(raw.main),
      module: into_string(raw.module),
      // A package is built from source only when it is linked into node_modules.
      source: if linked { source } else { None },
      browser,
      alias,
      path,
      realpath,
    })
  }

  /// Directory to `package.json`
  pub fn directory(&self) -> &Path {
    self.path.parent().unwrap_or_else(|| Path::new("/"))
  }

  /// Alias maps in lookup order: `source`, `alias`, `browser`.
  pub(crate) fn alias_maps(&self) -> impl Iterator<Item = &AliasMap> {
    let source = match &self.source {
      Some(SourceField::AliasMap(map)) => Some(map),
      _ => None,
    };
    let browser = match &self.browser {
      BrowserField::AliasMap(map) => Some(map),
      _ => None,
    };
    [source, self.alias.as_ref(), browser].into_iter().flatten()
  }

  /// The browser entry: a string `browser` field, or the entry keyed by the package's own name in
  /// an object `browser` field.
  fn browser_entry(&self) -> Option<&str> {
    match &self.browser {
      BrowserField::MainOverride(entry) => Some(entry),
      BrowserField::AliasMap(map) => match self.name.as_deref().and_then(|name| map.get(name)) {
        Some(crate::AliasValue::Redirect(entry)) if !entry.is_empty() => Some(entry),
        _ => None,
      },
      BrowserField::None => None,
    }
  }

  /// Absolute entry point candidates in priority order: `source`, `browser`, `module`, `main`.
  pub fn entries(&self) -> Vec<PathBuf> {
    let source = match &self.source {
      Some(SourceField::Entry(entry)) => Some(entry.as_str()),
      _ => None,
    };
    let dir = self.directory();
    [source, self.browser_entry(), self.module.as_deref(), self.main.as_deref()]
      .into_iter()
      .flatten()
      .map(|entry| {
        let entry = if matches!(entry, "" | "." | "./") { "index" } else { entry };
        dir.normalize_with(entry)
      })
      .collect()
  }
}
