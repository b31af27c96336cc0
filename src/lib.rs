//! Logsage - watch log files and get AI-generated fix suggestions for new
//! errors.

pub mod ai;
pub mod capture;
pub mod config;
pub mod display;
pub mod pipeline;
pub mod sink;
pub mod watcher;
