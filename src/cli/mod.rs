pub mod commands;

pub use commands::{build_cli, formatter_from_matches, run_check};
