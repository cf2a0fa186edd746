//! Resolve every package installed in `<root>/node_modules` concurrently with a shared resolver.
use std::{
  env, fs,
  path::{Path, PathBuf},
  sync::Arc,
  time::Instant,
};

use bundle_resolver::{Dependency, ResolveOptions, Resolver};
use tokio::runtime::Builder;

fn installed_packages(root: &Path) -> Vec<String> {
  let mut names = vec![];
  for entry in fs::read_dir(root.join("node_modules")).expect("read node_modules").flatten() {
    let name = entry.file_name().to_string_lossy().into_owned();
    if name.starts_with('.') {
      continue;
    }
    if name.starts_with('@') {
      for scoped in fs::read_dir(entry.path()).expect("read scope").flatten() {
        names.push(format!("{name}/{}", scoped.file_name().to_string_lossy()));
      }
    } else {
      names.push(name);
    }
  }
  names
}

fn main() {
  let root = env::args().nth(1).map_or_else(|| env::current_dir().expect("cwd"), PathBuf::from);
  let importer = root.join("index.js");
  let names = installed_packages(&root);

  let resolver = Arc::new(Resolver::new(ResolveOptions::default().with_root(&root)));

  let tokio_runtime = Builder::new_multi_thread()
    .max_blocking_threads(256)
    .build()
    .expect("failed to create tokio runtime");

  let start = Instant::now();
  let (resolved, unresolved) = tokio_runtime.block_on(async move {
    let handles = names
      .into_iter()
      .map(|name| {
        let resolver = Arc::clone(&resolver);
        let dependency = Dependency::new(name, &importer);
        tokio::spawn(async move { resolver.resolve(&dependency).await })
      })
      .collect::<Vec<_>>();
    let mut counts = (0usize, 0usize);
    for handle in handles {
      match handle.await.expect("join") {
        Ok(Some(_)) => counts.0 += 1,
        Ok(None) | Err(_) => counts.1 += 1,
      }
    }
    counts
  });
  println!("resolved: {resolved}, unresolved: {unresolved}, elapsed: {:?}", start.elapsed());
}
