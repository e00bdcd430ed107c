mod command;
mod config;
mod error;
pub mod render;

pub use command::{Command, USAGE};
pub use config::Config;
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
