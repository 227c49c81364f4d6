//! Structure-preserving edits: metadata merge, append, task toggle

#![allow(missing_docs)]

use crate::format;
use crate::server::VaultMcpServer;
use mdvault_core::TaskToggle;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{model::CallToolResult, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMetadataParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// JSON object of fields to add or replace, e.g. {"status": "done"}
    pub metadata_json: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AppendToNoteParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// Content to append
    pub content: String,
    /// Heading to append under; the heading must exist
    #[serde(default)]
    pub subsection: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateTaskStatusParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// Text identifying the task; the first checkbox containing it is updated
    pub task_pattern: String,
    /// true to mark [x], false to mark [ ]
    pub completed: bool,
}

#[tool_router(router = update_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(
        description = "Merge fields into a note's frontmatter. Existing keys keep their position, new keys are added at the end"
    )]
    pub async fn update_metadata(
        &self,
        params: Parameters<UpdateMetadataParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        format::respond(
            self.vault
                .update_metadata(&params.note_path, &params.metadata_json),
            |()| format!("Updated metadata in {}", params.note_path),
        )
    }

    #[tool(
        description = "Append content to the end of a note, or to the end of the section under an existing heading"
    )]
    pub async fn append_to_note(
        &self,
        params: Parameters<AppendToNoteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let subsection = params.subsection.as_deref().filter(|s| !s.trim().is_empty());
        format::respond(
            self.vault
                .append_to_note(&params.note_path, &params.content, subsection),
            |()| match subsection {
                Some(heading) => format!(
                    "Appended content to subsection '{}' in {}",
                    heading, params.note_path
                ),
                None => format!("Appended content to {}", params.note_path),
            },
        )
    }

    #[tool(description = "Mark a markdown task checkbox as completed or incomplete")]
    pub async fn update_task_status(
        &self,
        params: Parameters<UpdateTaskStatusParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let state = if params.completed {
            "completed"
        } else {
            "incomplete"
        };
        format::respond(
            self.vault
                .toggle_task(&params.note_path, &params.task_pattern, params.completed),
            |outcome| match outcome {
                TaskToggle::Changed => {
                    format!("Marked task as {}: {}", state, params.task_pattern)
                }
                TaskToggle::AlreadySet => {
                    format!("Task already marked as {}: {}", state, params.task_pattern)
                }
            },
        )
    }
}
