//! Bare specifiers located through node_modules.

use super::{p, resolve_package, resolve_path, resolver};
use crate::{Dependency, ResolveError};

fn files() -> Vec<(&'static str, &'static str)> {
  vec![
    ("/app/package.json", r#"{"name":"app"}"#),
    ("/app/src/index.js", ""),
    ("/app/node_modules/a/package.json", r#"{"name":"a","main":"root.js"}"#),
    ("/app/node_modules/a/root.js", ""),
    ("/app/node_modules/a/sub.js", ""),
    ("/app/node_modules/a/sub/index.js", ""),
    ("/app/node_modules/a/dir/index.js", ""),
    ("/app/pkg/src/index.js", ""),
    ("/app/pkg/node_modules/a/package.json", r#"{"name":"a","main":"nested.js"}"#),
    ("/app/pkg/node_modules/a/nested.js", ""),
    ("/app/node_modules/@scope/pkg/package.json", r#"{"name":"@scope/pkg"}"#),
    ("/app/node_modules/@scope/pkg/index.js", ""),
    ("/app/node_modules/@scope/pkg/sub/file.js", ""),
    ("/app/node_modules/left-pad/package.json", r#"{"name":"left-pad","main":"index"}"#),
    ("/app/node_modules/left-pad/README.md", ""),
    ("/app/node_modules/no-pkg/lib/x.js", ""),
  ]
}

#[tokio::test]
async fn closest_node_modules_wins() {
  let resolver = resolver(&files());
  assert_eq!(resolve_path(&resolver, "a", "/app/pkg/src/index.js").await, p("/app/pkg/node_modules/a/nested.js"));
  assert_eq!(resolve_path(&resolver, "a", "/app/src/index.js").await, p("/app/node_modules/a/root.js"));
  assert_eq!(
    resolve_package(&resolver, "a", "/app/pkg/src/index.js").await,
    p("/app/pkg/node_modules/a/package.json")
  );
}

#[tokio::test]
async fn importer_inside_node_modules() {
  let resolver = resolver(&files());
  let resolved = resolve_path(&resolver, "a", "/app/node_modules/@scope/pkg/index.js").await;
  assert_eq!(resolved, p("/app/node_modules/a/root.js"));
}

#[tokio::test]
async fn sub_paths() {
  let resolver = resolver(&files());

  #[rustfmt::skip]
  let pass = [
    ("file before directory", "a/sub", "/app/node_modules/a/sub.js"),
    ("directory index", "a/dir", "/app/node_modules/a/dir/index.js"),
    ("scoped sub path", "@scope/pkg/sub/file", "/app/node_modules/@scope/pkg/sub/file.js"),
    ("scoped package", "@scope/pkg", "/app/node_modules/@scope/pkg/index.js"),
    ("package without package.json", "no-pkg/lib/x", "/app/node_modules/no-pkg/lib/x.js"),
  ];

  for (comment, specifier, expected) in pass {
    let resolved = resolve_path(&resolver, specifier, "/app/src/index.js").await;
    assert_eq!(resolved, p(expected), "{comment} {specifier}");
  }

  assert_eq!(
    resolve_package(&resolver, "@scope/pkg/sub/file", "/app/src/index.js").await,
    p("/app/node_modules/@scope/pkg/package.json")
  );
  assert_eq!(resolve_package(&resolver, "no-pkg/lib/x", "/app/src/index.js").await, None);
}

#[tokio::test]
async fn missing_entry_is_unresolved() {
  let resolver = resolver(&files());
  assert_eq!(resolve_path(&resolver, "left-pad", "/app/src/index.js").await, None);

  let dependency = Dependency::new("left-pad", "/app/src/index.js");
  let error = resolver.resolve_required(&dependency).await.unwrap_err();
  assert!(error.is_not_found());
  assert_eq!(
    error,
    ResolveError::NotFound {
      specifier: "left-pad".into(),
      importer: Some("/app/src/index.js".into()),
    }
  );
}

#[tokio::test]
async fn not_installed() {
  let resolver = resolver(&files());
  assert_eq!(resolve_path(&resolver, "missing-module", "/app/src/index.js").await, None);
  assert_eq!(resolve_path(&resolver, "@scope/missing", "/app/src/index.js").await, None);
  assert_eq!(resolve_path(&resolver, "a/missing", "/app/src/index.js").await, None);
}
