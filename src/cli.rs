//! CLI domain: argument parsing, one-shot run wiring, and terminal presentation.

mod parse;
mod presentation;
mod route;

pub use parse::Cli;
pub use presentation::{render_response, CliOutcome, TerminalPresentationSink};
pub use route::RunContext;
