//! Helpers shared by the store library and the CLI.

pub mod utils;
