pub mod cli;
pub mod compose;
pub mod load_config;
pub mod narrate;
pub mod tiktok;
pub mod youtube;

pub use cli::{run, Cli, Commands};
