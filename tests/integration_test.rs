//! Test public APIs

use std::{
  fs,
  path::{Path, PathBuf},
  sync::Arc,
};

use bundle_resolver::{Dependency, ResolveError, ResolveOptions, Resolver};
use tempfile::TempDir;

/// A project on disk.
struct Fixture {
  _dir: TempDir,
  root: PathBuf,
}

impl Fixture {
  fn new(files: &[(&str, &str)]) -> Self {
    let dir = tempfile::tempdir().unwrap();
    // Temp dirs can live behind a symlink, e.g. `/var` on macOS.
    let root = dunce::canonicalize(dir.path()).unwrap();
    for (path, content) in files {
      let path = root.join(path);
      fs::create_dir_all(path.parent().unwrap()).unwrap();
      fs::write(path, content).unwrap();
    }
    Self { _dir: dir, root }
  }

  fn path(&self, path: &str) -> PathBuf {
    self.root.join(path)
  }

  fn resolver(&self) -> Resolver {
    Resolver::new(ResolveOptions::default().with_root(&self.root))
  }
}

fn project() -> Fixture {
  Fixture::new(&[
    ("package.json", r#"{"name": "app", "alias": {"app-components": "./src/components"}}"#),
    ("src/index.js", ""),
    ("src/components/button.js", ""),
    ("utils/helper.js", ""),
    ("node_modules/left-pad/package.json", r#"{"name": "left-pad", "main": "lib/index.js"}"#),
    ("node_modules/left-pad/lib/index.js", ""),
  ])
}

async fn resolve(resolver: &Resolver, specifier: &str, importer: &Path) -> Option<PathBuf> {
  resolver.resolve(&Dependency::new(specifier, importer)).await.unwrap().map(|r| r.into_path_buf())
}

#[tokio::test]
async fn resolves_from_disk() {
  let fixture = project();
  let resolver = fixture.resolver();
  let importer = fixture.path("src/index.js");

  assert_eq!(resolve(&resolver, "./components/button", &importer).await, Some(fixture.path("src/components/button.js")));
  assert_eq!(resolve(&resolver, "~/utils/helper", &importer).await, Some(fixture.path("utils/helper.js")));
  assert_eq!(resolve(&resolver, "/utils/helper.js", &importer).await, Some(fixture.path("utils/helper.js")));
  assert_eq!(resolve(&resolver, "left-pad", &importer).await, Some(fixture.path("node_modules/left-pad/lib/index.js")));
  assert_eq!(resolve(&resolver, "app-components/button", &importer).await, Some(fixture.path("src/components/button.js")));
  assert_eq!(resolve(&resolver, "./nope", &importer).await, None);
}

#[tokio::test]
async fn clone() {
  let fixture = project();
  let resolution = fixture
    .resolver()
    .resolve(&Dependency::new("left-pad", fixture.path("src/index.js")))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(resolution.clone(), resolution);
  assert!(!format!("{resolution:?}").is_empty());
}

#[tokio::test]
async fn package_json() {
  let fixture = project();
  let resolution = fixture
    .resolver()
    .resolve(&Dependency::new("left-pad", fixture.path("src/index.js")))
    .await
    .unwrap()
    .unwrap();
  let package_json = resolution.package_json().unwrap();
  assert_eq!(package_json.name.as_deref(), Some("left-pad"));
  assert_eq!(package_json.main.as_deref(), Some("lib/index.js"));
  assert_eq!(package_json.path, fixture.path("node_modules/left-pad/package.json"));
}

#[tokio::test]
async fn not_found() {
  let fixture = project();
  let importer = fixture.path("src/index.js");
  let error = fixture
    .resolver()
    .resolve_required(&Dependency::new("right-pad", &importer))
    .await
    .unwrap_err();
  assert_eq!(error, ResolveError::NotFound { specifier: "right-pad".into(), importer: Some(importer) });
}

#[tokio::test]
async fn empty_module() {
  let fixture = project();
  let resolver = Resolver::new(ResolveOptions::default().with_root(&fixture.root).with_empty_builtins());
  let resolution = resolver
    .resolve(&Dependency::new("fs", fixture.path("src/index.js")))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(resolution.path(), resolver.options().empty_module);
  // The bundled empty module exists.
  assert!(resolution.path().is_file());
}

#[tokio::test]
async fn options() {
  let resolver = Resolver::new(ResolveOptions::default());
  let options = resolver.options();
  assert_eq!(options.extensions, vec![".js", ".json", ".css"]);
  assert!(!format!("{options:?}").is_empty());
  assert!(!format!("{resolver:?}").is_empty());
}

#[tokio::test]
async fn options_api() {
  let options = ResolveOptions::default()
    .with_root("/app")
    .with_extension("ts")
    .with_extensions([".js", ".jsx"])
    .with_builtin("fs", "/shims/fs.js")
    .with_empty_module("/shims/empty.js")
    .with_empty_builtins();
  assert_eq!(options.extensions, vec![".js", ".jsx"]);
  assert_eq!(options.builtins["fs"], Path::new("/shims/fs.js"));
  assert_eq!(options.builtins["os"], Path::new("/shims/empty.js"));
}

#[tokio::test(flavor = "multi_thread")]
async fn shared_across_tasks() {
  let fixture = project();
  let resolver = Arc::new(fixture.resolver());
  let importer = fixture.path("src/index.js");
  let expected = fixture.path("node_modules/left-pad/lib/index.js");

  let handles = (0..16)
    .map(|_| {
      let resolver = Arc::clone(&resolver);
      let importer = importer.clone();
      tokio::spawn(async move { resolve(&resolver, "left-pad", &importer).await })
    })
    .collect::<Vec<_>>();
  for handle in handles {
    assert_eq!(handle.await.unwrap().as_ref(), Some(&expected));
  }
}

#[cfg(unix)]
#[tokio::test]
async fn linked_package_builds_from_source() {
  let fixture = Fixture::new(&[
    ("app/package.json", r#"{"name": "app"}"#),
    ("app/src/index.js", ""),
    ("packages/ui/package.json", r#"{"name": "ui", "main": "dist/index.js", "source": "src/index.ts"}"#),
    ("packages/ui/dist/index.js", ""),
    ("packages/ui/src/index.ts", ""),
    ("packages/lib/package.json", r#"{"name": "lib", "main": "dist/index.js", "source": "src/index.ts"}"#),
    ("packages/lib/dist/index.js", ""),
    ("packages/lib/src/index.ts", ""),
  ]);
  fs::create_dir_all(fixture.path("app/node_modules")).unwrap();
  std::os::unix::fs::symlink(fixture.path("packages/ui"), fixture.path("app/node_modules/ui")).unwrap();
  // A copied package is not linked.
  fs::create_dir_all(fixture.path("app/node_modules/lib/dist")).unwrap();
  fs::copy(fixture.path("packages/lib/package.json"), fixture.path("app/node_modules/lib/package.json")).unwrap();
  fs::write(fixture.path("app/node_modules/lib/dist/index.js"), "").unwrap();

  let resolver = Resolver::new(ResolveOptions::default().with_root(fixture.path("app")));
  let importer = fixture.path("app/src/index.js");
  assert_eq!(resolve(&resolver, "ui", &importer).await, Some(fixture.path("app/node_modules/ui/src/index.ts")));
  assert_eq!(resolve(&resolver, "lib", &importer).await, Some(fixture.path("app/node_modules/lib/dist/index.js")));
}
