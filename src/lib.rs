pub mod commands;
pub mod config;
pub mod context;
pub mod errors;
pub mod logger;
pub mod parser;
pub mod registry;
pub mod runtime;

pub use commands::{ActionExecutor, ActionSpec, CommandSpec};
pub use context::{ExecContext, Mode};
pub use errors::Result;
pub use registry::Registry;
