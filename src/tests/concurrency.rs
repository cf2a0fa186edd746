use std::{path::PathBuf, sync::Arc};

use super::{p, resolve_path, resolver};

fn files() -> Vec<(&'static str, &'static str)> {
  vec![
    ("/app/package.json", r#"{"name":"app","alias":{"lib":"./src/lib.js"}}"#),
    ("/app/src/index.js", ""),
    ("/app/src/lib.js", ""),
    ("/app/node_modules/a/package.json", r#"{"name":"a","module":"esm.js"}"#),
    ("/app/node_modules/a/esm.js", ""),
  ]
}

#[tokio::test]
async fn idempotent() {
  let resolver = resolver(&files());
  for _ in 0..3 {
    assert_eq!(resolve_path(&resolver, "a", "/app/src/index.js").await, p("/app/node_modules/a/esm.js"));
    assert_eq!(resolve_path(&resolver, "lib", "/app/src/index.js").await, p("/app/src/lib.js"));
    assert_eq!(resolve_path(&resolver, "./missing", "/app/src/index.js").await, None);
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolutions_agree() {
  let resolver = Arc::new(resolver(&files()));
  let specifiers = ["a", "lib", "./lib", "./missing", "~/src/lib"];

  let handles = (0..64)
    .map(|i| {
      let resolver = Arc::clone(&resolver);
      let specifier = specifiers[i % specifiers.len()];
      tokio::spawn(async move {
        (specifier, resolve_path(&resolver, specifier, "/app/src/index.js").await)
      })
    })
    .collect::<Vec<_>>();

  for handle in handles {
    let (specifier, resolved) = handle.await.unwrap();
    let expected: Option<PathBuf> = match specifier {
      "a" => p("/app/node_modules/a/esm.js"),
      "./missing" => None,
      _ => p("/app/src/lib.js"),
    };
    assert_eq!(resolved, expected, "{specifier}");
  }
}
