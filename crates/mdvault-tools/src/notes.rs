//! Listing, reading and deleting notes

#![allow(missing_docs)]

use crate::format;
use crate::server::VaultMcpServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{model::CallToolResult, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FolderParams {
    /// Folder relative to the vault root; empty for the whole vault
    #[serde(default)]
    pub folder: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NotePathParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadExcerptParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// Maximum number of lines to return
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_max_lines() -> usize {
    50
}

#[tool_router(router = note_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(description = "List markdown notes in the vault or in a folder, sorted")]
    pub async fn list_notes(
        &self,
        params: Parameters<FolderParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        format::respond(self.vault.list_notes(&params.folder), |notes| {
            format::lines_or(&notes, "No notes found")
        })
    }

    #[tool(description = "List the immediate subfolders of the vault or of a folder")]
    pub async fn list_folders(
        &self,
        params: Parameters<FolderParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        format::respond(self.vault.list_folders(&params.folder), |folders| {
            format::lines_or(&folders, "No folders found")
        })
    }

    #[tool(description = "Read the full text of a note")]
    pub async fn read_note(
        &self,
        params: Parameters<NotePathParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        format::respond(self.vault.read_note(&params.0.note_path), |text| text)
    }

    #[tool(description = "Read the first lines of a note, noting how many were left out")]
    pub async fn read_note_excerpt(
        &self,
        params: Parameters<ReadExcerptParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        format::respond(
            self.vault.read_note_excerpt(&params.note_path, params.max_lines),
            format::excerpt,
        )
    }

    #[tool(description = "Get a note's frontmatter as a JSON object")]
    pub async fn get_metadata(
        &self,
        params: Parameters<NotePathParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        format::respond(self.vault.get_metadata(&params.0.note_path), |metadata| {
            serde_json::to_string_pretty(&metadata).unwrap_or_else(|_| metadata.to_string())
        })
    }

    #[tool(description = "Delete a note from the vault")]
    pub async fn delete_note(
        &self,
        params: Parameters<NotePathParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let path = params.0.note_path;
        format::respond(self.vault.delete_note(&path), |()| format!("Deleted {path}"))
    }
}
