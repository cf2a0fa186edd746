use cfg_if::cfg_if;
use futures::future::BoxFuture;
use std::{
  fs, io,
  path::{Path, PathBuf},
};

/// File System abstraction used for `ResolverGeneric`
///
/// The resolver never touches `std::fs` directly, so it can run against an in-memory or
/// sandboxed file system provided by the host bundler.
pub trait FileSystem {
  /// See [std::fs::read_to_string]
  ///
  /// # Errors
  ///
  /// * See [std::fs::read_to_string]
  /// ## Warning
  /// Use `&Path` instead of a generic `P: AsRef<Path>` here,
  /// because object safety requirements, it is especially useful, when
  /// you want to store multiple `dyn FileSystem` in a `Vec` or use a `ResolverGeneric<Fs>` behind
  /// a trait object.
  fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>>;

  /// See [std::fs::metadata]. Follows symlinks.
  ///
  /// # Errors
  /// See [std::fs::metadata]
  fn metadata<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileMetadata>>;

  /// See [std::fs::symlink_metadata]
  ///
  /// # Errors
  ///
  /// See [std::fs::symlink_metadata]
  fn symlink_metadata<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileMetadata>>;

  /// See [std::fs::canonicalize]
  ///
  /// # Errors
  ///
  /// See [std::fs::canonicalize]
  fn canonicalize<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<PathBuf>>;
}

/// Metadata information about a file
#[derive(Debug, Clone, Copy)]
pub struct FileMetadata {
  /// Regular file or named pipe, anything that can be read as a module.
  pub is_file: bool,
  pub is_dir: bool,
  pub is_symlink: bool,
}

impl FileMetadata {
  pub fn new(is_file: bool, is_dir: bool, is_symlink: bool) -> Self {
    Self { is_file, is_dir, is_symlink }
  }
}

impl From<fs::Metadata> for FileMetadata {
  fn from(metadata: fs::Metadata) -> Self {
    let file_type = metadata.file_type();
    let is_file = {
      cfg_if! {
        if #[cfg(unix)] {
          file_type.is_file() || std::os::unix::fs::FileTypeExt::is_fifo(&file_type)
        } else {
          file_type.is_file()
        }
      }
    };
    Self::new(is_file, file_type.is_dir(), file_type.is_symlink())
  }
}

/// Operating System
#[derive(Debug, Default)]
pub struct FileSystemOs;

impl FileSystem for FileSystemOs {
  fn read_to_string<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<String>> {
    Box::pin(async move { tokio::fs::read_to_string(path).await })
  }

  fn metadata<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileMetadata>> {
    Box::pin(async move { tokio::fs::metadata(path).await.map(FileMetadata::from) })
  }

  fn symlink_metadata<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<FileMetadata>> {
    Box::pin(async move { tokio::fs::symlink_metadata(path).await.map(FileMetadata::from) })
  }

  fn canonicalize<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<PathBuf>> {
    Box::pin(async move {
      cfg_if! {
        if #[cfg(target_os = "wasi")] {
          tokio::fs::canonicalize(path).await
        } else {
          dunce::canonicalize(path)
        }
      }
    })
  }
}

#[tokio::test]
async fn metadata() {
  let meta = FileMetadata { is_file: true, is_dir: true, is_symlink: true };
  assert_eq!(
    format!("{meta:?}"),
    "FileMetadata { is_file: true, is_dir: true, is_symlink: true }"
  );
}

#[cfg(unix)]
#[tokio::test]
async fn fifo_counts_as_file() {
  let dir = tempfile::tempdir().unwrap();
  let fifo = dir.path().join("pipe");
  let status = std::process::Command::new("mkfifo").arg(&fifo).status();
  if !status.is_ok_and(|s| s.success()) {
    return;
  }
  let meta = FileSystemOs.metadata(&fifo).await.unwrap();
  assert!(meta.is_file);
  assert!(!meta.is_dir);
}
