//! CLI command handlers. Each command is in its own file.

mod control;
mod hash;
mod run;

pub use control::run_control;
pub use hash::{run_hash, HashArgs};
pub use run::{run_pipeline, RunArgs};
