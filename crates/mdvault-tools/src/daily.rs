//! Appending to today's daily note

#![allow(missing_docs)]

use crate::format;
use crate::server::VaultMcpServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{model::CallToolResult, tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddToDailyNoteParams {
    /// Content to append
    pub content: String,
    /// Heading to append under; created at the end of the note if missing
    #[serde(default)]
    pub subsection: Option<String>,
}

#[tool_router(router = daily_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(
        description = "Append content to today's daily note, creating the note and the heading when they do not exist"
    )]
    pub async fn add_to_daily_note(
        &self,
        params: Parameters<AddToDailyNoteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let today = chrono::Local::now().date_naive();
        let subsection = params.subsection.as_deref().filter(|s| !s.trim().is_empty());

        format::respond(
            self.vault
                .append_to_daily_note(today, &params.content, subsection),
            |outcome| match subsection {
                Some(heading) if outcome.created_section => format!(
                    "Created subsection '{}' and appended content to {}",
                    heading, outcome.path
                ),
                Some(heading) => format!(
                    "Appended content to subsection '{}' in {}",
                    heading, outcome.path
                ),
                None => format!("Appended content to {}", outcome.path),
            },
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
        let vault = Vault::with_settings(
            temp_dir.path(),
            "Journal/Daily/%Y-%m-%d.md",
            "mdv",
        )
        .unwrap();
        (temp_dir, VaultMcpServer::new(vault))
    }

    fn text_of(result: &CallToolResult) -> String {
        result.content[0].as_text().unwrap().text.clone()
    }

    fn add(content: &str, subsection: Option<&str>) -> Parameters<AddToDailyNoteParams> {
        Parameters(AddToDailyNoteParams {
            content: content.to_string(),
            subsection: subsection.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_creates_note_and_section() {
        let (temp_dir, server) = setup();
        let today = chrono::Local::now().date_naive();
        let path = server.vault().daily_note_path(today).unwrap();
        let title = today.format("%Y-%m-%d").to_string();

        let first = server
            .add_to_daily_note(add("- woke up", Some("Log")))
            .await
            .unwrap();
        assert_eq!(
            text_of(&first),
            format!("Created subsection 'Log' and appended content to {path}")
        );

        let second = server
            .add_to_daily_note(add("- coffee", Some("Log")))
            .await
            .unwrap();
        assert_eq!(
            text_of(&second),
            format!("Appended content to subsection 'Log' in {path}")
        );

        assert!(path.starts_with("Journal/Daily/"));
        assert_eq!(
            fs::read_to_string(temp_dir.path().join(&path)).unwrap(),
            format!("# {title}\n\n## Log\n\n- woke up\n\n- coffee\n")
        );
    }

    #[tokio::test]
    async fn test_plain_append() {
        let (_temp_dir, server) = setup();
        let today = chrono::Local::now().date_naive();
        let path = server.vault().daily_note_path(today).unwrap();

        let result = server
            .add_to_daily_note(add("thought", None))
            .await
            .unwrap();
        assert_eq!(text_of(&result), format!("Appended content to {path}"));
    }
}
