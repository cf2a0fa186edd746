//! Node.js core modules.
//!
//! The resolver never decides on its own what a core module becomes in a browser bundle. The
//! name → shim table is configuration ([crate::ResolveOptions::builtins]); this list only backs
//! [crate::ResolveOptions::with_empty_builtins].

/// Node.js core module names that have no meaning in a browser bundle unless shimmed.
pub const NODE_BUILTINS: &[&str] = &[
  "_http_agent",
  "_http_client",
  "_http_common",
  "_http_incoming",
  "_http_outgoing",
  "_http_server",
  "_stream_duplex",
  "_stream_passthrough",
  "_stream_readable",
  "_stream_transform",
  "_stream_wrap",
  "_stream_writable",
  "_tls_common",
  "_tls_wrap",
  "assert",
  "async_hooks",
  "buffer",
  "child_process",
  "cluster",
  "console",
  "constants",
  "crypto",
  "dgram",
  "diagnostics_channel",
  "dns",
  "domain",
  "events",
  "fs",
  "http",
  "http2",
  "https",
  "inspector",
  "module",
  "net",
  "os",
  "path",
  "perf_hooks",
  "process",
  "punycode",
  "querystring",
  "readline",
  "repl",
  "stream",
  "string_decoder",
  "sys",
  "timers",
  "tls",
  "trace_events",
  "tty",
  "url",
  "util",
  "v8",
  "vm",
  "worker_threads",
  "zlib",
];

pub fn is_node_builtin(name: &str) -> bool {
  NODE_BUILTINS.binary_search(&name).is_ok()
}

#[test]
fn sorted() {
  let mut sorted = NODE_BUILTINS.to_vec();
  sorted.sort_unstable();
  assert_eq!(sorted, NODE_BUILTINS);
  assert!(is_node_builtin("fs"));
  assert!(is_node_builtin("_stream_wrap"));
  assert!(!is_node_builtin("left-pad"));
}
