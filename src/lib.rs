pub mod analyzers;
pub mod config;
pub mod diploma;
pub mod fetch;
pub mod infra;
pub mod output;
pub mod parser;
pub mod services;
