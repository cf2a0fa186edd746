//! Resolve one specifier.
//!
//! ```bash
//! RUST_LOG=bundle_resolver=trace cargo run --example resolver -- /path/to/project ./src/index.js lodash
//! ```
use std::{env, path::PathBuf};

use bundle_resolver::{Dependency, ResolveOptions, Resolver};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
  fmt().with_env_filter(EnvFilter::from_default_env()).init();

  let root = PathBuf::from(env::args().nth(1).expect("root"));
  assert!(root.is_dir(), "{root:?} must be the project root directory.");
  assert!(root.is_absolute(), "{root:?} must be an absolute path.");

  let importer = root.join(env::args().nth(2).expect("importer"));
  let specifier = env::args().nth(3).expect("specifier");

  println!("root: {root:?}");
  println!("importer: {importer:?}");
  println!("specifier: {specifier}");

  let options = ResolveOptions::default()
    .with_root(&root)
    .with_extensions([".js", ".jsx", ".ts", ".tsx", ".json", ".css"])
    .with_empty_builtins();
  let resolver = Resolver::new(options);

  match resolver.resolve_required(&Dependency::new(specifier, importer)).await {
    Err(error) => println!("Error: {error}"),
    Ok(resolution) => {
      println!("Resolved: {:?}", resolution.full_path());
      if let Some(package_json) = resolution.package_json() {
        println!("Package: {:?}", package_json.path);
      }
    }
  }
}
