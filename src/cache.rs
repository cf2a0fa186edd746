use std::{
  borrow::Borrow,
  convert::AsRef,
  hash::{BuildHasherDefault, Hash, Hasher},
  io,
  ops::Deref,
  path::{Path, PathBuf},
  sync::Arc,
};

use dashmap::DashSet;
use futures::future::BoxFuture;
use rustc_hash::FxHasher;
use tokio::sync::OnceCell as OnceLock;

use crate::{package_json::PackageJson, path::PathUtil, FileMetadata, FileSystem, ResolveError};

/// Per-resolver memo of file system facts and parsed package.json files.
///
/// Every value is computed at most once per path and never invalidated: a build assumes a static
/// `node_modules` tree. Concurrent first access is safe, the losing computation is discarded.
#[derive(Default)]
pub struct Cache<Fs> {
  pub(crate) fs: Fs,
  paths: DashSet<CachedPath, BuildHasherDefault<IdentityHasher>>,
}

impl<Fs: Send + Sync + FileSystem> Cache<Fs> {
  pub fn new(fs: Fs) -> Self {
    Self { fs, paths: DashSet::default() }
  }

  pub fn value(&self, path: &Path) -> CachedPath {
    let hash = {
      let mut hasher = FxHasher::default();
      path.hash(&mut hasher);
      hasher.finish()
    };
    if let Some(cache_entry) = self.paths.get((hash, path).borrow() as &dyn CacheKey) {
      return cache_entry.clone();
    }
    let parent = path.parent().map(|p| self.value(p));
    let data = CachedPath(Arc::new(CachedPathImpl::new(
      hash,
      path.to_path_buf().into_boxed_path(),
      parent,
    )));
    self.paths.insert(data.clone());
    data
  }
}

#[derive(Clone)]
pub struct CachedPath(Arc<CachedPathImpl>);

impl Hash for CachedPath {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.0.hash.hash(state);
  }
}

impl PartialEq for CachedPath {
  fn eq(&self, other: &Self) -> bool {
    self.0.path == other.0.path
  }
}
impl Eq for CachedPath {}

impl Deref for CachedPath {
  type Target = CachedPathImpl;

  fn deref(&self) -> &Self::Target {
    self.0.as_ref()
  }
}

impl<'a> Borrow<dyn CacheKey + 'a> for CachedPath {
  fn borrow(&self) -> &(dyn CacheKey + 'a) {
    self
  }
}

impl AsRef<CachedPathImpl> for CachedPath {
  fn as_ref(&self) -> &CachedPathImpl {
    self.0.as_ref()
  }
}

impl CacheKey for CachedPath {
  fn tuple(&self) -> (u64, &Path) {
    (self.hash, &self.path)
  }
}

pub struct CachedPathImpl {
  hash: u64,
  path: Box<Path>,
  parent: Option<CachedPath>,
  meta: OnceLock<Option<FileMetadata>>,
  canonicalized: OnceLock<Option<PathBuf>>,
  node_modules: OnceLock<Option<CachedPath>>,
  package_json: OnceLock<Option<Arc<PackageJson>>>,
}

impl CachedPathImpl {
  fn new(hash: u64, path: Box<Path>, parent: Option<CachedPath>) -> Self {
    Self {
      hash,
      path,
      parent,
      meta: OnceLock::new(),
      canonicalized: OnceLock::new(),
      node_modules: OnceLock::new(),
      package_json: OnceLock::new(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn to_path_buf(&self) -> PathBuf {
    self.path.to_path_buf()
  }

  pub fn parent(&self) -> Option<&CachedPath> {
    self.parent.as_ref()
  }

  pub(crate) fn is_node_modules(&self) -> bool {
    self.path.file_name().is_some_and(|name| name == "node_modules")
  }

  async fn meta<Fs: Send + Sync + FileSystem>(&self, fs: &Fs) -> Option<FileMetadata> {
    *self
      .meta
      .get_or_init(|| async { fs.metadata(&self.path).await.ok() })
      .await
  }

  /// Regular file or named pipe. Any I/O error reads as `false`.
  pub async fn is_file<Fs: Send + Sync + FileSystem>(&self, fs: &Fs) -> bool {
    self.meta(fs).await.is_some_and(|meta| meta.is_file)
  }

  pub async fn is_dir<Fs: Send + Sync + FileSystem>(&self, fs: &Fs) -> bool {
    self.meta(fs).await.is_some_and(|meta| meta.is_dir)
  }

  /// Resolve symlinks component by component, canonicalizing at the first symlink found.
  pub fn realpath<'a, Fs: FileSystem + Send + Sync>(
    &'a self,
    fs: &'a Fs,
  ) -> BoxFuture<'a, io::Result<PathBuf>> {
    let fut = async move {
      self
        .canonicalized
        .get_or_try_init(|| async move {
          if fs
            .symlink_metadata(&self.path)
            .await
            .is_ok_and(|m| m.is_symlink)
          {
            return fs.canonicalize(&self.path).await.map(Some);
          }
          if let Some(parent) = self.parent() {
            let parent_path = parent.realpath(fs).await?;
            return Ok(
              self
                .path
                .strip_prefix(&parent.path)
                .ok()
                .map(|rest| parent_path.normalize_with(rest)),
            );
          }
          Ok(None)
        })
        .await
        .cloned()
        .map(|r| r.unwrap_or_else(|| self.path.to_path_buf()))
    };
    Box::pin(fut)
  }

  pub async fn module_directory<Fs: Send + Sync + FileSystem>(
    &self,
    module_name: &str,
    cache: &Cache<Fs>,
  ) -> Option<CachedPath> {
    let cached_path = cache.value(&self.path.join(module_name));
    cached_path.is_dir(&cache.fs).await.then_some(cached_path)
  }

  pub async fn cached_node_modules<Fs: Send + Sync + FileSystem>(
    &self,
    cache: &Cache<Fs>,
  ) -> Option<CachedPath> {
    self
      .node_modules
      .get_or_init(|| self.module_directory("node_modules", cache))
      .await
      .clone()
  }

  /// Find the nearest package.json within the current package, walking up from this directory.
  ///
  /// The walk stops at a `node_modules` directory and never reads the file system root.
  ///
  /// # Errors
  ///
  /// * [ResolveError::JSON]
  #[cfg_attr(feature="enable_instrument", tracing::instrument(level=tracing::Level::DEBUG, skip_all, fields(path = %self.path.display())))]
  pub async fn find_package_json<Fs: FileSystem + Send + Sync>(
    &self,
    cache: &Cache<Fs>,
  ) -> Result<Option<Arc<PackageJson>>, ResolveError> {
    let mut cache_value = Some(self);
    while let Some(cv) = cache_value {
      if cv.parent.is_none() || cv.is_node_modules() {
        break;
      }
      if let Some(package_json) = cv.package_json(cache).await? {
        return Ok(Some(package_json));
      }
      cache_value = cv.parent.as_deref();
    }
    Ok(None)
  }

  /// Get package.json of the given directory.
  ///
  /// A missing or unreadable package.json is `Ok(None)`. The package is linked when the realpath
  /// of the package.json file differs from its path.
  ///
  /// # Errors
  ///
  /// * [ResolveError::JSON]
  #[cfg_attr(feature="enable_instrument", tracing::instrument(level=tracing::Level::DEBUG, skip_all, fields(path = %self.path.display())))]
  pub async fn package_json<Fs: FileSystem + Send + Sync>(
    &self,
    cache: &Cache<Fs>,
  ) -> Result<Option<Arc<PackageJson>>, ResolveError> {
    let fs = &cache.fs;
    // Change to `std::sync::OnceLock::get_or_try_init` when it is stable.
    self
      .package_json
      .get_or_try_init(|| async {
        let package_json_path = self.path.join("package.json");
        let Ok(package_json_string) = fs.read_to_string(&package_json_path).await else {
          return Ok(None);
        };
        let real_path = cache
          .value(&package_json_path)
          .realpath(fs)
          .await
          .unwrap_or_else(|_| package_json_path.clone());
        tracing::trace!(path = %package_json_path.display(), linked = real_path != package_json_path, "load package.json");
        PackageJson::parse(package_json_path.clone(), real_path, &package_json_string)
          .map(|package_json| Some(Arc::new(package_json)))
          .map_err(|error| {
            ResolveError::from_serde_json_error(package_json_path, &error, Some(package_json_string))
          })
      })
      .await
      .cloned()
  }
}

/// Memoized cache key, code adapted from <https://stackoverflow.com/a/50478038>.
trait CacheKey {
  fn tuple(&self) -> (u64, &Path);
}

impl Hash for dyn CacheKey + '_ {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.tuple().0.hash(state);
  }
}

impl PartialEq for dyn CacheKey + '_ {
  fn eq(&self, other: &Self) -> bool {
    self.tuple().1 == other.tuple().1
  }
}

impl Eq for dyn CacheKey + '_ {}

impl CacheKey for (u64, &Path) {
  fn tuple(&self) -> (u64, &Path) {
    (self.0, self.1)
  }
}

impl<'a> Borrow<dyn CacheKey + 'a> for (u64, &'a Path) {
  fn borrow(&self) -> &(dyn CacheKey + 'a) {
    self
  }
}

/// Since the cache key is memoized, use an identity hasher
/// to avoid double cache.
#[derive(Default)]
struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
  fn write(&mut self, _: &[u8]) {
    unreachable!("Invalid use of IdentityHasher")
  }
  fn write_u64(&mut self, n: u64) {
    self.0 = n;
  }
  fn finish(&self) -> u64 {
    self.0
  }
}
