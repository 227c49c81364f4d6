//! Text search across note bodies

#![allow(missing_docs)]

use crate::format;
use crate::server::VaultMcpServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{model::CallToolResult, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchNotesParams {
    /// Text to search for (case-insensitive)
    pub query: String,
    /// Folder to limit the search to; empty for the whole vault
    #[serde(default)]
    pub folder: String,
    /// Lines of context around each match. With 0 only matching paths are returned
    #[serde(default)]
    pub context_lines: usize,
}

#[tool_router(router = search_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(
        description = "Search note bodies for text (case-insensitive). Returns matching paths, or matching lines with context when context_lines > 0"
    )]
    pub async fn search_notes(
        &self,
        params: Parameters<SearchNotesParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        tracing::debug!(
            "search_notes query={:?} folder={:?} context={}",
            params.query,
            params.folder,
            params.context_lines
        );

        if params.context_lines == 0 {
            return format::respond(self.vault.search(&params.query, &params.folder), |paths| {
                format::lines_or(&paths, "No matches found")
            });
        }

        format::respond(
            self.vault
                .search_with_context(&params.query, &params.folder, params.context_lines),
            |results| format::search_context(&results),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdvault_core::Vault;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, VaultMcpServer) {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("work")).unwrap();
        fs::write(
            temp_dir.path().join("work/plan.md"),
            "---\ntopic: Rust\n---\nintro\nLearn RUST today\noutro\n",
        )
        .unwrap();
        fs::write(temp_dir.path().join("misc.md"), "rust again\n").unwrap();
        fs::write(temp_dir.path().join("other.md"), "nothing here\n").unwrap();
        let server = VaultMcpServer::new(Vault::open(temp_dir.path()).unwrap());
        (temp_dir, server)
    }

    fn search(query: &str, folder: &str, context_lines: usize) -> Parameters<SearchNotesParams> {
        Parameters(SearchNotesParams {
            query: query.to_string(),
            folder: folder.to_string(),
            context_lines,
        })
    }

    fn text_of(result: &CallToolResult) -> String {
        result.content[0].as_text().unwrap().text.clone()
    }

    #[tokio::test]
    async fn test_paths_only() {
        let (_temp_dir, server) = setup();
        let result = server.search_notes(search("rust", "", 0)).await.unwrap();
        assert_eq!(text_of(&result), "misc.md\nwork/plan.md");
    }

    #[tokio::test]
    async fn test_folder_scope() {
        let (_temp_dir, server) = setup();
        let result = server.search_notes(search("rust", "work", 0)).await.unwrap();
        assert_eq!(text_of(&result), "work/plan.md");
    }

    #[tokio::test]
    async fn test_context_uses_file_line_numbers() {
        let (_temp_dir, server) = setup();
        let result = server
            .search_notes(search("rust", "work", 1))
            .await
            .unwrap();
        assert_eq!(
            text_of(&result),
            "\n### work/plan.md\nLine 5:\nintro\nLearn RUST today\noutro"
        );
    }

    #[tokio::test]
    async fn test_metadata_is_not_searched() {
        let (_temp_dir, server) = setup();
        let result = server.search_notes(search("topic", "", 0)).await.unwrap();
        assert_eq!(text_of(&result), "No matches found");
    }
}
