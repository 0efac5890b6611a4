mod args;
mod config;

pub use args::{Args, Command, EvaluateArgs, InitArgs, RunArgs};
pub use config::{EvalConfig, ServerSettings};
