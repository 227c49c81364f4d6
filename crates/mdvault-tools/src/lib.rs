//! MCP tools for a markdown vault
//!
//! Tool groups:
//! - **Notes** (6): `list_notes`, `list_folders`, `read_note`,
//!   `read_note_excerpt`, `get_metadata`, `delete_note`
//! - **Search** (1): `search_notes`
//! - **Links** (4): `find_backlinks`, `find_outgoing_links`,
//!   `find_orphan_notes`, `find_related_notes`
//! - **Updates** (3): `update_metadata`, `append_to_note`, `update_task_status`
//! - **Daily** (1): `add_to_daily_note`
//! - **CLI** (22): captures, macros, templated notes, focus, context,
//!   projects, tasks and reports, forwarded to the vault CLI
//!
//! Every tool answers with text. Failures are reported as error results
//! carrying a readable message, never as protocol errors.

pub mod cli;
pub mod daily;
pub mod format;
pub mod links;
pub mod notes;
pub mod search;
pub mod server;
pub mod update;

pub use server::VaultMcpServer;
