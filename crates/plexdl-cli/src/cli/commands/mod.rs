//! CLI command handlers, one file per command.

mod discard;
mod download;
mod status;

pub use discard::run_discard;
pub use download::{run_download, StartMode};
pub use status::run_status;
