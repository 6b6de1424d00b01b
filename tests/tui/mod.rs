//! Headless TUI integration tests.

mod common;
mod headless_test;
