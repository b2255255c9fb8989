pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigOverrides};
pub use commands::run;
