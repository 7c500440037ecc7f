mod types;

pub use types::{Cli, available_tools};
