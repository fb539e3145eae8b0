#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, render_slice, SliceView};

use std::path::PathBuf;

/// Path of a file under this crate's `assets/` directory.
pub fn asset_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name)
}
