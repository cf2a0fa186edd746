//! Path utilities
//!
//! `std::path` does not normalize `..` lexically, and the resolver must never touch the file
//! system just to clean a path, so `path.resolve` / `path.relative` style helpers live here.

use std::path::{Component, Path, PathBuf};

/// Extension trait to add lexical path normalization to std's [`Path`].
pub trait PathUtil {
  /// Normalize this path without performing I/O.
  ///
  /// All redundant separator and up-level references are collapsed.
  ///
  /// However, this does not resolve links.
  fn normalize(&self) -> PathBuf;

  /// Normalize with subpath assuming this path is normalized without performing I/O.
  ///
  /// An absolute `subpath` replaces `self`, the same way `path.resolve(self, subpath)` does.
  fn normalize_with<P: AsRef<Path>>(&self, subpath: P) -> PathBuf;

  /// Lexical relative path from `base` to `self`, both assumed normalized and absolute.
  fn relative_to(&self, base: &Path) -> PathBuf;

  /// `self` with `suffix` appended to the last component, e.g. `a/b` + `.js` is `a/b.js`.
  fn with_suffix(&self, suffix: &str) -> PathBuf;
}

impl PathUtil for Path {
  fn normalize(&self) -> PathBuf {
    let mut components = self.components().peekable();
    let mut ret = if let Some(c @ Component::Prefix(..)) = components.peek() {
      let buf = PathBuf::from(c.as_os_str());
      components.next();
      buf
    } else {
      PathBuf::new()
    };

    for component in components {
      match component {
        Component::Prefix(..) => {}
        Component::RootDir => {
          ret.push(component.as_os_str());
        }
        Component::CurDir => {}
        Component::ParentDir => {
          ret.pop();
        }
        Component::Normal(c) => {
          ret.push(c);
        }
      }
    }

    ret
  }

  fn normalize_with<B: AsRef<Self>>(&self, subpath: B) -> PathBuf {
    let subpath = subpath.as_ref();

    let mut components = subpath.components();

    let Some(head) = components.next() else {
      return self.to_path_buf();
    };

    if matches!(head, Component::Prefix(..) | Component::RootDir) {
      return subpath.normalize();
    }

    let mut ret = self.to_path_buf();
    for component in std::iter::once(head).chain(components) {
      match component {
        Component::CurDir => {}
        Component::ParentDir => {
          ret.pop();
        }
        Component::Normal(c) => {
          ret.push(c);
        }
        Component::Prefix(..) | Component::RootDir => {}
      }
    }

    ret
  }

  fn relative_to(&self, base: &Path) -> PathBuf {
    let mut ours = self.components().peekable();
    let mut theirs = base.components().peekable();
    while let (Some(a), Some(b)) = (ours.peek(), theirs.peek()) {
      if a != b {
        break;
      }
      ours.next();
      theirs.next();
    }
    let mut ret = PathBuf::new();
    for _ in theirs {
      ret.push("..");
    }
    for component in ours {
      ret.push(component.as_os_str());
    }
    ret
  }

  fn with_suffix(&self, suffix: &str) -> PathBuf {
    if suffix.is_empty() {
      return self.to_path_buf();
    }
    let mut os_string = self.to_path_buf().into_os_string();
    os_string.push(suffix);
    PathBuf::from(os_string)
  }
}

/// Normalize a bare module request the way `path.normalize` does for `/` separated strings.
///
/// A trailing separator is preserved so that `foo/` keeps an empty sub path.
pub fn normalize_request(request: &str) -> String {
  let mut parts: Vec<&str> = Vec::new();
  for part in request.split('/') {
    match part {
      "" | "." => {}
      ".." => {
        if parts.last().is_some_and(|last| *last != "..") {
          parts.pop();
        } else {
          parts.push(part);
        }
      }
      _ => parts.push(part),
    }
  }
  let mut normalized = parts.join("/");
  if request.ends_with('/') && !normalized.is_empty() {
    normalized.push('/');
  }
  normalized
}

/// Render `path` with `/` separators, the form alias keys in package.json are written in.
pub fn to_slash(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

#[test]
fn normalize() {
  assert_eq!(Path::new("/foo/.././foo/").normalize(), Path::new("/foo"));
  assert_eq!(Path::new("/a/b/../../c").normalize(), Path::new("/c"));
}

#[test]
fn normalize_with() {
  let base = Path::new("/app/src");
  assert_eq!(base.normalize_with("./lib/x.js"), Path::new("/app/src/lib/x.js"));
  assert_eq!(base.normalize_with("../x"), Path::new("/app/x"));
  assert_eq!(base.normalize_with("/abs/x"), Path::new("/abs/x"));
  assert_eq!(base.normalize_with(""), Path::new("/app/src"));
}

#[test]
fn relative_to() {
  let base = Path::new("/app/pkg");
  assert_eq!(Path::new("/app/pkg/a/b.js").relative_to(base), Path::new("a/b.js"));
  assert_eq!(Path::new("/app/other/b.js").relative_to(base), Path::new("../other/b.js"));
  assert_eq!(Path::new("/app/pkg").relative_to(base), Path::new(""));
}

#[test]
fn with_suffix() {
  assert_eq!(Path::new("/a/b").with_suffix(".js"), Path::new("/a/b.js"));
  assert_eq!(Path::new("/a/b.min").with_suffix(".js"), Path::new("/a/b.min.js"));
  assert_eq!(Path::new("/a/b").with_suffix(""), Path::new("/a/b"));
}

#[test]
fn request_normalization() {
  assert_eq!(normalize_request("foo/./bar"), "foo/bar");
  assert_eq!(normalize_request("foo/"), "foo/");
  assert_eq!(normalize_request("@scope/pkg/a/../b"), "@scope/pkg/b");
  assert_eq!(normalize_request("lodash"), "lodash");
}
