use std::{
  fmt,
  path::{Path, PathBuf},
};

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use crate::{builtins::NODE_BUILTINS, path::PathUtil};

/// Module Resolution Options
///
/// Constructed once per build and shared read-only by every resolution.
#[derive(Clone)]
pub struct ResolveOptions {
  /// Project root. `/foo` specifiers resolve against it, `~/foo` specifiers stop climbing at it,
  /// and its package.json `alias` field applies to every module.
  ///
  /// Default `std::env::current_dir()`
  pub root: PathBuf,

  /// Extensions tried, in order, after the exact path and the importer's own extension.
  /// A missing leading `.` is added.
  ///
  /// Default `[".js", ".json", ".css"]`
  pub extensions: Vec<String>,

  /// Name → shim file for modules that should not be bundled as is, e.g. Node.js core modules in
  /// a browser bundle. A bare specifier equal to a key resolves to the shim.
  ///
  /// Default empty
  pub builtins: FxHashMap<String, PathBuf>,

  /// File substituted for `"module": false` aliases.
  ///
  /// Default the `_empty.js` shipped with this crate.
  pub empty_module: PathBuf,
}

impl ResolveOptions {
  /// Sets the project root.
  ///
  /// ## Examples
  ///
  /// ```
  /// use bundle_resolver::ResolveOptions;
  ///
  /// let options = ResolveOptions::default().with_root("/app");
  /// assert_eq!(options.root, std::path::Path::new("/app"));
  /// ```
  #[must_use]
  pub fn with_root<P: AsRef<Path>>(mut self, root: P) -> Self {
    self.root = root.as_ref().to_path_buf();
    self
  }

  /// Adds a single extension to the list of extensions. A missing leading dot is added when the
  /// resolver is built.
  #[must_use]
  pub fn with_extension<S: Into<String>>(mut self, extension: S) -> Self {
    self.extensions.push(extension.into());
    self
  }

  /// Replaces the extension list.
  #[must_use]
  pub fn with_extensions<S: Into<String>, I: IntoIterator<Item = S>>(mut self, extensions: I) -> Self {
    self.extensions = extensions.into_iter().map(Into::into).collect();
    self
  }

  /// Maps `name` to a shim file.
  #[must_use]
  pub fn with_builtin<S: Into<String>, P: AsRef<Path>>(mut self, name: S, shim: P) -> Self {
    self.builtins.insert(name.into(), shim.as_ref().to_path_buf());
    self
  }

  /// Maps every Node.js core module to the empty module, keeping shims already configured.
  #[must_use]
  pub fn with_empty_builtins(mut self) -> Self {
    for name in NODE_BUILTINS {
      self
        .builtins
        .entry((*name).to_string())
        .or_insert_with(|| self.empty_module.clone());
    }
    self
  }

  /// Sets the file used for disabled modules.
  #[must_use]
  pub fn with_empty_module<P: AsRef<Path>>(mut self, empty_module: P) -> Self {
    let previous = std::mem::replace(&mut self.empty_module, empty_module.as_ref().to_path_buf());
    for shim in self.builtins.values_mut() {
      if *shim == previous {
        shim.clone_from(&self.empty_module);
      }
    }
    self
  }

  pub(crate) fn sanitize(mut self) -> Self {
    self.root = self.root.normalize();
    self.extensions = std::mem::take(&mut self.extensions)
      .into_iter()
      .filter(|extension| !extension.is_empty())
      .map(|extension| if extension.starts_with('.') { extension } else { format!(".{extension}") })
      .collect::<IndexSet<_>>()
      .into_iter()
      .collect();
    self
  }
}

impl Default for ResolveOptions {
  fn default() -> Self {
    Self {
      root: std::env::current_dir().unwrap_or_default(),
      extensions: vec![".js".into(), ".json".into(), ".css".into()],
      builtins: FxHashMap::default(),
      empty_module: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/src/_empty.js")),
    }
  }
}

// For tracing
impl fmt::Debug for ResolveOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut builtins = self.builtins.keys().collect::<Vec<_>>();
    builtins.sort_unstable();
    f.debug_struct("ResolveOptions")
      .field("root", &self.root)
      .field("extensions", &self.extensions)
      .field("builtins", &builtins)
      .field("empty_module", &self.empty_module)
      .finish()
  }
}
