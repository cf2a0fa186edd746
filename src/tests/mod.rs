mod concurrency;
mod node_modules;

use std::path::{Path, PathBuf};

use crate::{Dependency, ResolveOptions, ResolverGeneric};

pub use memory_fs::MemoryFS;

pub fn options() -> ResolveOptions {
  ResolveOptions::default().with_root("/app").with_empty_module("/shims/_empty.js")
}

pub fn resolver(files: &[(&str, &str)]) -> ResolverGeneric<MemoryFS> {
  resolver_with_options(files, options())
}

pub fn resolver_with_options(
  files: &[(&str, &str)],
  options: ResolveOptions,
) -> ResolverGeneric<MemoryFS> {
  ResolverGeneric::new_with_file_system(MemoryFS::new(files), options)
}

/// Resolved path of `specifier` imported from `importer`, `None` when unresolved.
pub async fn resolve_path(
  resolver: &ResolverGeneric<MemoryFS>,
  specifier: &str,
  importer: &str,
) -> Option<PathBuf> {
  resolver
    .resolve(&Dependency::new(specifier, importer))
    .await
    .unwrap()
    .map(crate::Resolution::into_path_buf)
}

/// Path of the package.json the resolution was loaded through.
pub async fn resolve_package(
  resolver: &ResolverGeneric<MemoryFS>,
  specifier: &str,
  importer: &str,
) -> Option<PathBuf> {
  resolver
    .resolve(&Dependency::new(specifier, importer))
    .await
    .unwrap()
    .and_then(|resolution| resolution.package_json().map(|package_json| package_json.path.clone()))
}

pub fn p(path: &str) -> Option<PathBuf> {
  Some(Path::new(path).to_path_buf())
}
