//! TUI widgets for DataQuest.

pub mod error_panel;
pub mod header;
pub mod help_bar;
pub mod input;
pub mod query_editor;
pub mod spinner;
pub mod table;
