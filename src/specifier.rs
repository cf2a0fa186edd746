//! Specifier classification, module name splitting and the extension probing plan.

use std::path::{Path, PathBuf};

use crate::path::normalize_request;

/// How a raw specifier is anchored, decided by its first character alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
  /// `/foo`, resolved against the project root.
  Absolute,
  /// `~/foo`, resolved against the nearest package root or the project root.
  Tilde,
  /// `./foo`, `../foo`
  Relative,
  /// `foo`, `@scope/foo/bar`, looked up in `node_modules`.
  Bare,
}

impl SpecifierKind {
  pub fn classify(specifier: &str) -> Self {
    match specifier.as_bytes().first() {
      Some(b'/') => Self::Absolute,
      Some(b'~') => Self::Tilde,
      Some(b'.') => Self::Relative,
      _ => Self::Bare,
    }
  }
}

/// A specifier after it has been anchored: either a concrete path or a module request that still
/// has to go through `node_modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Request {
  Path(PathBuf),
  Module(String),
}

impl Request {
  pub(crate) fn as_path(&self) -> Option<&Path> {
    match self {
      Self::Path(path) => Some(path),
      Self::Module(_) => None,
    }
  }
}

/// `(module name, sub path)` split of a bare specifier.
///
/// A leading `@scope` segment is merged with the following segment, so `@scope/pkg/sub/file`
/// has module name `@scope/pkg` and sub path `sub/file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleParts {
  pub module_name: String,
  pub sub_path: Option<String>,
}

impl ModuleParts {
  pub fn parse(request: &str) -> Self {
    let normalized = normalize_request(request);
    let mut split_at = normalized.find('/');
    if normalized.starts_with('@') {
      split_at = split_at.and_then(|first| normalized[first + 1..].find('/').map(|p| first + 1 + p));
    }
    match split_at {
      Some(index) => {
        let sub_path = &normalized[index + 1..];
        Self {
          module_name: normalized[..index].to_string(),
          sub_path: (!sub_path.is_empty()).then(|| sub_path.to_string()),
        }
      }
      None => Self { module_name: normalized, sub_path: None },
    }
  }
}

/// Ordered extension suffixes to probe.
///
/// The importer's own extension is moved to the front, then the empty suffix is prepended so the
/// exact path is always tried before any suffixed variant.
pub fn plan_extensions(extensions: &[String], importer: Option<&Path>) -> Vec<String> {
  let mut plan = Vec::with_capacity(extensions.len() + 2);
  plan.push(String::new());
  let importer_ext = importer
    .and_then(Path::extension)
    .map(|ext| format!(".{}", ext.to_string_lossy()));
  if let Some(ext) = &importer_ext {
    plan.push(ext.clone());
  }
  plan.extend(
    extensions
      .iter()
      .filter(|ext| importer_ext.as_ref() != Some(*ext))
      .cloned(),
  );
  plan
}
