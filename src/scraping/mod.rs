pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod parser;
pub mod run_log;
