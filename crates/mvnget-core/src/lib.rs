pub mod config;
pub mod logging;

pub mod classify;
pub mod control;
pub mod crawler;
pub mod manifest;
pub mod mirror;
pub mod recursion;
pub mod run;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod url_model;

pub use run::{run_crawl, CrawlConfig, RunReport};
