pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod parser;
pub mod schema;
pub mod ui;
pub mod writer;

pub use cli::{Cli, Commands};
pub use error::{Error, Result};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui};
