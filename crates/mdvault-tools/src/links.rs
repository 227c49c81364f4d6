//! Backlinks, outgoing links, orphans and related notes

#![allow(missing_docs)]

use crate::format;
use crate::notes::{FolderParams, NotePathParams};
use crate::server::VaultMcpServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{model::CallToolResult, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RelatedNotesParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// Maximum number of related notes to return
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[tool_router(router = link_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(description = "Find all notes that link to the specified note")]
    pub async fn find_backlinks(
        &self,
        params: Parameters<NotePathParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        format::respond(self.vault.backlinks(&params.0.note_path), |paths| {
            paths.join("\n")
        })
    }

    #[tool(
        description = "Find all notes the specified note links to. Broken links are marked '(not found)'"
    )]
    pub async fn find_outgoing_links(
        &self,
        params: Parameters<NotePathParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        format::respond(self.vault.outgoing_links(&params.0.note_path), |links| {
            format::outgoing(&links)
        })
    }

    #[tool(description = "Find notes with no links to or from any other note")]
    pub async fn find_orphan_notes(
        &self,
        params: Parameters<FolderParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        format::respond(self.vault.orphans(&params.0.folder), |orphans| {
            format::lines_or(&orphans, "No orphan notes found")
        })
    }

    #[tool(description = "Find notes that link to the same notes as the specified note, best first")]
    pub async fn find_related_notes(
        &self,
        params: Parameters<RelatedNotesParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        format::respond(
            self.vault.related(&params.note_path, params.limit),
            |related| format::related(&related),
        )
    }
}
