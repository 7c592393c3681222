pub mod bot_config;
pub mod cli_args;
pub mod env_file;

pub use bot_config::*;
pub use cli_args::*;
pub use env_file::*;
