use std::path::PathBuf;

use thiserror::Error;

/// All resolution errors
///
/// A specifier that simply does not resolve is not an error for [crate::ResolverGeneric::resolve],
/// it is `Ok(None)`. File system failures are never surfaced either, they count as "does not
/// exist" and resolution moves on to the next candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// Every candidate was exhausted. Only produced by [crate::ResolverGeneric::resolve_required].
  #[error("Cannot resolve '{specifier}'{}", from_importer(.importer.as_ref()))]
  NotFound {
    specifier: String,
    importer: Option<PathBuf>,
  },

  /// A package.json on the resolution path is not valid JSON.
  #[error("{0:?}")]
  JSON(JSONError),
}

fn from_importer(importer: Option<&PathBuf>) -> String {
  importer.map(|p| format!(" from '{}'", p.display())).unwrap_or_default()
}

/// Malformed package.json
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JSONError {
  pub path: PathBuf,
  pub message: String,
  pub line: usize,
  pub column: usize,
  pub content: Option<String>,
}

impl ResolveError {
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::NotFound { .. })
  }

  pub(crate) fn from_serde_json_error(
    path: PathBuf,
    error: &serde_json::Error,
    content: Option<String>,
  ) -> Self {
    Self::JSON(JSONError {
      path,
      message: error.to_string(),
      line: error.line(),
      column: error.column(),
      content,
    })
  }
}

#[test]
fn not_found_message() {
  let error = ResolveError::NotFound {
    specifier: "left-pad".into(),
    importer: Some(PathBuf::from("/app/src/index.js")),
  };
  assert!(error.is_not_found());
  assert_eq!(error.to_string(), "Cannot resolve 'left-pad' from '/app/src/index.js'");

  let error = ResolveError::NotFound { specifier: "./entry".into(), importer: None };
  assert_eq!(error.to_string(), "Cannot resolve './entry'");
}
