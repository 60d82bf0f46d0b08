//! Process configuration: environment settings for the bootstrap binary and
//! the JSON file that defines fee tables and relay policy.
mod config_file;
pub use config_file::*;

mod server_config;
pub use server_config::*;
