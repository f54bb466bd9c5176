//! Purpose: Rebuild the crate when the embedded browser UI changes.
//! Role: Cargo build-script; `ui::INDEX_HTML` is compiled in with `include_str!`.
//! Invariants: `cargo:rerun-if-changed` covers every embedded UI asset.
fn main() {
    println!("cargo:rerun-if-changed=ui/index.html");
}
