//! Domain types shared by every reelsmith crate.
//!
//! Pure data and validation only: no I/O, no async runtime. The
//! orchestration crates (`reelsmith-remote`, `reelsmith-pipeline`) build
//! on these types and never re-validate them.

pub mod aspect;
pub mod descriptor;
pub mod error;
pub mod media_url;
pub mod result;
pub mod scene;
pub mod task_state;
pub mod types;
pub mod variant;
