//! CLI command handlers.

mod run;
mod status;

pub use run::run_crawl_command;
pub use status::run_status;

#[cfg(test)]
pub(crate) use run::resolve;
