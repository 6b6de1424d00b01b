//! DataQuest - ask questions in plain English, review the SQL, run it.
//!
//! The library holds the backend client, the workflow state machine and the
//! terminal UI so integration tests can drive them directly.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod tui;
pub mod workflow;
