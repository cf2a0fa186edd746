//! # Bundle Resolver
//!
//! The dependency resolver of a JavaScript bundler: given `import "x"` inside a module, find the
//! file on disk that satisfies it.
//!
//! This implements a modified version of the [node_modules resolution algorithm](https://nodejs.org/api/modules.html#all-together).
//! In addition to the standard algorithm it supports:
//!
//! * Glob specifiers, returned as is for the bundler to expand.
//! * Absolute specifiers (`/foo`) resolved against the project root.
//! * Tilde specifiers (`~/foo`) resolved against the nearest package root in `node_modules`, or
//!   the project root, whichever comes first.
//! * The package.json `source`, `browser` and `module` fields as replacements for `main`.
//! * The package.json `source`, `alias` and `browser` fields as alias maps within a package.
//! * The root package.json `alias` field as project wide aliases.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bundle_resolver::{Dependency, ResolveOptions, Resolver};
//!
//! let resolver = Resolver::new(ResolveOptions::default().with_root("/app"));
//! let resolution = resolver.resolve(&Dependency::new("./utils", "/app/src/index.js")).await;
//! ```

mod alias;
mod builtins;
mod cache;
mod error;
mod file_system;
mod glob;
mod options;
mod package_json;
mod path;
mod resolution;
mod specifier;

#[cfg(test)]
mod tests;

use std::{
  fmt,
  path::{Path, PathBuf},
  sync::Arc,
};

use futures::future::BoxFuture;
use tokio::sync::OnceCell as OnceLock;

pub use crate::{
  alias::{AliasMap, AliasValue},
  builtins::{is_node_builtin, NODE_BUILTINS},
  error::{JSONError, ResolveError},
  file_system::{FileMetadata, FileSystem, FileSystemOs},
  glob::is_glob,
  options::ResolveOptions,
  package_json::{BrowserField, PackageJson, SourceField},
  path::PathUtil,
  resolution::{Dependency, Resolution},
  specifier::{plan_extensions, ModuleParts, SpecifierKind},
};
use crate::{
  cache::Cache,
  path::{normalize_request, to_slash},
  specifier::Request,
};

type ResolveResult = Result<Option<Resolution>, ResolveError>;

/// Resolver with the current operating system as the file system
pub type Resolver = ResolverGeneric<FileSystemOs>;

/// Generic implementation of the resolver, can be configured by the [FileSystem] trait
pub struct ResolverGeneric<Fs> {
  options: ResolveOptions,
  cache: Cache<Fs>,
  /// package.json of the project root, loaded on the first resolution.
  root_package: OnceLock<Option<Arc<PackageJson>>>,
}

impl<Fs> fmt::Debug for ResolverGeneric<Fs> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(&self.options, f)
  }
}

impl<Fs: Send + Sync + FileSystem + Default> Default for ResolverGeneric<Fs> {
  fn default() -> Self {
    Self::new(ResolveOptions::default())
  }
}

/// Per-resolution state shared by every probing step.
struct ResolveContext {
  extensions: Vec<String>,
  root_package: Option<Arc<PackageJson>>,
}

/// Where the node_modules lookup of a bare specifier ended up.
enum ModuleLocation {
  /// A concrete file or directory, e.g. a builtin shim or an aliased path.
  File(PathBuf),
  /// `<dir>/node_modules/<module_name>` exists.
  NodeModules {
    module_dir: PathBuf,
    file_path: PathBuf,
    has_sub_path: bool,
  },
  /// No installed package.
  Unresolved(ModuleParts),
}

/// Outcome of one alias map lookup.
enum Aliased {
  Disabled,
  To(Request),
}

impl<Fs: Send + Sync + FileSystem + Default> ResolverGeneric<Fs> {
  pub fn new(options: ResolveOptions) -> Self {
    Self::new_with_file_system(Fs::default(), options)
  }
}

impl<Fs: Send + Sync + FileSystem> ResolverGeneric<Fs> {
  pub fn new_with_file_system(file_system: Fs, options: ResolveOptions) -> Self {
    Self {
      options: options.sanitize(),
      cache: Cache::new(file_system),
      root_package: OnceLock::new(),
    }
  }

  /// Returns the options.
  pub fn options(&self) -> &ResolveOptions {
    &self.options
  }

  /// Resolve `dependency`.
  ///
  /// `Ok(None)` means no candidate exists; the caller reports it as an unresolved dependency.
  ///
  /// # Errors
  ///
  /// * [ResolveError::JSON] when a package.json consulted on the way is malformed.
  #[cfg_attr(feature="enable_instrument", tracing::instrument(level=tracing::Level::DEBUG, skip_all, fields(specifier = %dependency.specifier)))]
  pub async fn resolve(&self, dependency: &Dependency) -> ResolveResult {
    let result = self.resolve_impl(dependency).await;
    match &result {
      Ok(Some(resolution)) => {
        tracing::debug!(options = ?self.options, %dependency, ret = %resolution.path.display());
      }
      Ok(None) => tracing::debug!(options = ?self.options, %dependency, "unresolved"),
      Err(error) => tracing::debug!(options = ?self.options, %dependency, %error),
    }
    result
  }

  /// Resolve `dependency`, turning an unresolved dependency into [ResolveError::NotFound].
  ///
  /// # Errors
  ///
  /// * [ResolveError::NotFound]
  /// * [ResolveError::JSON]
  pub async fn resolve_required(&self, dependency: &Dependency) -> Result<Resolution, ResolveError> {
    self.resolve(dependency).await?.ok_or_else(|| ResolveError::NotFound {
      specifier: dependency.specifier.clone(),
      importer: dependency.importer.clone(),
    })
  }

  async fn resolve_impl(&self, dependency: &Dependency) -> ResolveResult {
    let specifier = dependency.specifier.as_str();
    let dir = dependency
      .importer
      .as_deref()
      .and_then(Path::parent)
      .map_or_else(|| self.options.root.clone(), Path::to_path_buf);

    // Globs are expanded by the bundler, not here.
    if glob::is_glob(specifier) {
      return Ok(Some(Resolution::new(dir.normalize_with(specifier), None)));
    }

    let ctx = ResolveContext {
      extensions: plan_extensions(&self.options.extensions, dependency.importer.as_deref()),
      root_package: self.root_package().await?,
    };

    match self.resolve_module(specifier, &dir, dependency.is_url, &ctx).await? {
      ModuleLocation::File(path) if path == self.options.empty_module => {
        Ok(Some(Resolution::new(path, None)))
      }
      ModuleLocation::File(path) => self.load_relative(&path, &ctx).await,
      ModuleLocation::NodeModules { module_dir, file_path, has_sub_path } => {
        self.load_node_modules(&module_dir, &file_path, has_sub_path, &ctx).await
      }
      ModuleLocation::Unresolved(parts) => {
        tracing::trace!(module_name = %parts.module_name, "no installed package");
        Ok(None)
      }
    }
  }

  async fn root_package(&self) -> Result<Option<Arc<PackageJson>>, ResolveError> {
    self
      .root_package
      .get_or_try_init(|| async {
        self.cache.value(&self.options.root).find_package_json(&self.cache).await
      })
      .await
      .cloned()
  }

  async fn find_package(&self, dir: &Path) -> Result<Option<Arc<PackageJson>>, ResolveError> {
    self.cache.value(dir).find_package_json(&self.cache).await
  }

  /// Anchor the specifier, apply aliases, then locate bare modules in node_modules.
  async fn resolve_module(
    &self,
    specifier: &str,
    dir: &Path,
    is_url: bool,
    ctx: &ResolveContext,
  ) -> Result<ModuleLocation, ResolveError> {
    let request = self.resolve_filename(specifier, dir, is_url);

    // Aliases of the importer's package, then of the root package.
    let package_json = self.find_package(dir).await?;
    let request = self.resolve_aliases(request, package_json.as_deref(), ctx);

    match request {
      Request::Path(path) => Ok(ModuleLocation::File(path)),
      Request::Module(name) => Ok(self.find_node_module_path(&name, dir).await),
    }
  }

  /// Turn a raw specifier into an absolute path, or keep it as a module request.
  fn resolve_filename(&self, specifier: &str, dir: &Path, is_url: bool) -> Request {
    match SpecifierKind::classify(specifier) {
      SpecifierKind::Absolute => {
        let rest = specifier[1..].trim_start_matches('/');
        Request::Path(self.options.root.normalize_with(rest))
      }
      SpecifierKind::Tilde => {
        let rest = specifier[1..].trim_start_matches('/');
        Request::Path(self.tilde_root(dir).normalize_with(rest))
      }
      SpecifierKind::Relative => Request::Path(dir.normalize_with(specifier)),
      SpecifierKind::Bare if is_url => Request::Path(dir.normalize_with(specifier)),
      SpecifierKind::Bare => Request::Module(specifier.to_string()),
    }
  }

  /// Climb from `dir` to the project root or to a package root inside node_modules, whichever
  /// comes first.
  fn tilde_root(&self, dir: &Path) -> PathBuf {
    let root = &self.options.root;
    let mut dir = dir;
    while dir != root.as_path()
      && !dir
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == "node_modules")
    {
      match dir.parent() {
        Some(parent) if parent.parent().is_some() => dir = parent,
        _ => return root.clone(),
      }
    }
    dir.to_path_buf()
  }

  /// Local aliases first, then project wide ones, each applied exactly once.
  fn resolve_aliases(
    &self,
    request: Request,
    package_json: Option<&PackageJson>,
    ctx: &ResolveContext,
  ) -> Request {
    let request = self.resolve_package_aliases(request, package_json);
    self.resolve_package_aliases(request, ctx.root_package.as_deref())
  }

  fn resolve_package_aliases(&self, request: Request, package_json: Option<&PackageJson>) -> Request {
    let Some(package_json) = package_json else {
      return request;
    };
    package_json
      .alias_maps()
      .find_map(|alias_map| self.get_alias(&request, package_json.directory(), alias_map))
      .unwrap_or(request)
  }

  fn get_alias(&self, request: &Request, dir: &Path, alias_map: &AliasMap) -> Option<Request> {
    let aliased = match request {
      Request::Path(path) => {
        let mut relative = to_slash(&path.relative_to(dir));
        if !relative.starts_with('.') {
          relative.insert_str(0, "./");
        }
        self.lookup_alias(alias_map, &relative, dir)?
      }
      Request::Module(name) => match self.lookup_alias(alias_map, name, dir) {
        Some(aliased) => aliased,
        None => {
          // Try the module name alone and carry the sub path over.
          let parts = ModuleParts::parse(name);
          match self.lookup_alias(alias_map, &parts.module_name, dir)? {
            Aliased::To(target) => Aliased::To(match (target, parts.sub_path) {
              (Request::Path(path), Some(sub_path)) => Request::Path(path.normalize_with(sub_path)),
              (Request::Module(module), Some(sub_path)) => {
                Request::Module(normalize_request(&format!("{module}/{sub_path}")))
              }
              (target, None) => target,
            }),
            Aliased::Disabled => Aliased::Disabled,
          }
        }
      },
    };
    Some(match aliased {
      Aliased::Disabled => Request::Path(self.options.empty_module.clone()),
      Aliased::To(target) => target,
    })
  }

  fn lookup_alias(&self, alias_map: &AliasMap, key: &str, dir: &Path) -> Option<Aliased> {
    match alias_map.lookup(key)? {
      AliasValue::Disabled => Some(Aliased::Disabled),
      AliasValue::Redirect(target) if target.is_empty() => None,
      // Anchored like a specifier written in the package, but not aliased again.
      AliasValue::Redirect(target) => Some(Aliased::To(self.resolve_filename(&target, dir, false))),
    }
  }

  /// Walk up from `dir` looking for `node_modules/<module_name>`; the closest ancestor wins.
  async fn find_node_module_path(&self, name: &str, dir: &Path) -> ModuleLocation {
    if let Some(shim) = self.options.builtins.get(name) {
      return ModuleLocation::File(shim.clone());
    }

    let parts = ModuleParts::parse(name);
    let mut current = Some(self.cache.value(dir));
    while let Some(mut cached_path) = current {
      if cached_path.parent().is_none() {
        break;
      }
      if cached_path.is_node_modules() {
        if let Some(parent) = cached_path.parent().cloned() {
          cached_path = parent;
        }
      }
      if let Some(node_modules) = cached_path.cached_node_modules(&self.cache).await {
        if let Some(module_dir) =
          node_modules.module_directory(&parts.module_name, &self.cache).await
        {
          tracing::trace!(module_dir = %module_dir.path().display(), "found module directory");
          return ModuleLocation::NodeModules {
            module_dir: module_dir.to_path_buf(),
            file_path: node_modules.path().normalize_with(normalize_request(name)),
            has_sub_path: parts.sub_path.is_some(),
          };
        }
      }
      current = cached_path.parent().cloned();
    }
    ModuleLocation::Unresolved(parts)
  }

  /// A module sub path is likely a file, so it is tried as one first, then as a directory.
  async fn load_node_modules(
    &self,
    module_dir: &Path,
    file_path: &Path,
    has_sub_path: bool,
    ctx: &ResolveContext,
  ) -> ResolveResult {
    if has_sub_path {
      let package_json = self.cache.value(module_dir).package_json(&self.cache).await?;
      if let Some(resolution) = self.load_as_file(file_path, package_json, ctx).await {
        return Ok(Some(resolution));
      }
    }
    self.load_directory(file_path, None, &[], ctx).await
  }

  async fn load_relative(&self, path: &Path, ctx: &ResolveContext) -> ResolveResult {
    let package_json = match path.parent() {
      Some(dir) => self.find_package(dir).await?,
      None => None,
    };
    if let Some(resolution) = self.load_as_file(path, package_json.clone(), ctx).await {
      return Ok(Some(resolution));
    }
    self.load_directory(path, package_json, &[], ctx).await
  }

  /// `ancestors` holds the directories whose entries are being loaded further up the stack.
  fn load_directory<'a>(
    &'a self,
    dir: &'a Path,
    package_json: Option<Arc<PackageJson>>,
    ancestors: &'a [&'a Path],
    ctx: &'a ResolveContext,
  ) -> BoxFuture<'a, ResolveResult> {
    Box::pin(async move {
      let mut package_json = package_json;
      if let Some(dir_package_json) = self.cache.value(dir).package_json(&self.cache).await? {
        let mut stack = ancestors.to_vec();
        stack.push(dir);
        for entry in dir_package_json.entries() {
          if stack.contains(&entry.as_path()) {
            tracing::trace!(entry = %entry.display(), "skipping cyclic package entry");
            continue;
          }
          let pkg = Some(Arc::clone(&dir_package_json));
          if let Some(resolution) = self.load_as_file(&entry, pkg.clone(), ctx).await {
            return Ok(Some(resolution));
          }
          if let Some(resolution) = self.load_directory(&entry, pkg, &stack, ctx).await? {
            return Ok(Some(resolution));
          }
        }
        package_json = Some(dir_package_json);
      }
      Ok(self.load_as_file(&dir.join("index"), package_json, ctx).await)
    })
  }

  async fn load_as_file(
    &self,
    path: &Path,
    package_json: Option<Arc<PackageJson>>,
    ctx: &ResolveContext,
  ) -> Option<Resolution> {
    for candidate in self.expand_file(path, package_json.as_deref(), ctx) {
      if candidate == self.options.empty_module {
        return Some(Resolution::new(candidate, None));
      }
      if self.is_file(&candidate).await {
        return Some(Resolution::new(candidate, package_json));
      }
    }
    None
  }

  async fn is_file(&self, path: &Path) -> bool {
    self.cache.value(path).is_file(&self.cache.fs).await
  }

  /// File candidates for `path`: for every extension, the alias target of the suffixed path
  /// (expanded with extensions, without aliasing again) ahead of the suffixed path itself.
  fn expand_file(
    &self,
    path: &Path,
    package_json: Option<&PackageJson>,
    ctx: &ResolveContext,
  ) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(ctx.extensions.len());
    for extension in &ctx.extensions {
      let candidate = path.with_suffix(extension);
      let aliased = self.resolve_aliases(Request::Path(candidate.clone()), package_json, ctx);
      if let Some(aliased) = aliased.as_path().filter(|aliased| *aliased != candidate) {
        candidates.extend(Self::expand_extensions(aliased, &ctx.extensions));
      }
      candidates.push(candidate);
    }
    candidates
  }

  fn expand_extensions<'a>(
    path: &'a Path,
    extensions: &'a [String],
  ) -> impl Iterator<Item = PathBuf> + 'a {
    extensions.iter().map(move |extension| path.with_suffix(extension))
  }
}
