use std::{
  fmt,
  path::{Path, PathBuf},
  sync::Arc,
};

use crate::package_json::PackageJson;

/// One dependency edge of the module graph: `specifier` as written in `importer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
  pub specifier: String,
  /// `None` only for entry points.
  pub importer: Option<PathBuf>,
  /// The specifier comes from a URL position (e.g. `url()` in CSS, `<img src>` in HTML), where a
  /// bare `foo.png` means a sibling file rather than a package.
  pub is_url: bool,
}

impl Dependency {
  pub fn new<S: Into<String>, P: AsRef<Path>>(specifier: S, importer: P) -> Self {
    Self {
      specifier: specifier.into(),
      importer: Some(importer.as_ref().to_path_buf()),
      is_url: false,
    }
  }

  /// An entry point request, resolved against the project root.
  pub fn entry<S: Into<String>>(specifier: S) -> Self {
    Self { specifier: specifier.into(), importer: None, is_url: false }
  }

  #[must_use]
  pub fn with_url(mut self, is_url: bool) -> Self {
    self.is_url = is_url;
    self
  }
}

impl fmt::Display for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.importer {
      Some(importer) => write!(f, "'{}' from '{}'", self.specifier, importer.display()),
      None => write!(f, "'{}'", self.specifier),
    }
  }
}

/// The resolution of a path
#[derive(Clone)]
pub struct Resolution {
  pub(crate) path: PathBuf,

  /// The package the file was loaded through, if any.
  pub(crate) package_json: Option<Arc<PackageJson>>,
}

impl fmt::Debug for Resolution {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resolution")
      .field("path", &self.path)
      .field("package_json", &self.package_json.as_ref().map(|p| &p.path))
      .finish()
  }
}

impl PartialEq for Resolution {
  fn eq(&self, other: &Self) -> bool {
    self.path == other.path
      && self.package_json.as_ref().map(|p| &p.path) == other.package_json.as_ref().map(|p| &p.path)
  }
}
impl Eq for Resolution {}

impl Resolution {
  pub(crate) fn new(path: PathBuf, package_json: Option<Arc<PackageJson>>) -> Self {
    Self { path, package_json }
  }

  /// Absolute path of the resolved file.
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn into_path_buf(self) -> PathBuf {
    self.path
  }

  pub fn full_path(&self) -> PathBuf {
    self.path.clone()
  }

  /// The package.json of the package the file was loaded through.
  pub fn package_json(&self) -> Option<&Arc<PackageJson>> {
    self.package_json.as_ref()
  }
}

#[test]
fn dependency_display() {
  let dependency = Dependency::new("./a", "/app/index.js");
  assert_eq!(dependency.to_string(), "'./a' from '/app/index.js'");
  assert!(!dependency.is_url);
  assert!(Dependency::entry("./a").with_url(true).is_url);
  assert_eq!(Dependency::entry("./a").to_string(), "'./a'");
}
