//! The MCP server: every tool group behind one router
//!
//! Each group lives in its own module as a `#[tool_router]` block on
//! [`VaultMcpServer`]; [`VaultMcpServer::new`] adds the group routers together.

use mdvault_core::Vault;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo, Tool};
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use std::sync::Arc;

const INSTRUCTIONS: &str = "Markdown vault server. Notes are addressed by paths \
relative to the vault root (for example 'projects/alpha.md'). Use list_notes, \
read_note and search_notes to explore; find_backlinks, find_outgoing_links, \
find_orphan_notes and find_related_notes to follow [[wikilinks]] and \
[markdown](links.md); update_metadata, append_to_note, update_task_status and \
add_to_daily_note to edit. Task, project, context and capture tools are \
forwarded to the vault CLI.";

/// MCP server exposing one markdown vault.
#[derive(Clone)]
pub struct VaultMcpServer {
    pub(crate) vault: Arc<Vault>,
    tool_router: ToolRouter<Self>,
}

impl VaultMcpServer {
    pub fn new(vault: Vault) -> Self {
        Self::from_shared(Arc::new(vault))
    }

    pub fn from_shared(vault: Arc<Vault>) -> Self {
        Self {
            vault,
            tool_router: Self::note_router()
                + Self::search_router()
                + Self::link_router()
                + Self::update_router()
                + Self::daily_router()
                + Self::cli_router(),
        }
    }

    #[must_use]
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    /// Number of tools exposed
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    /// Definitions of every exposed tool
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    /// Serve over stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        tracing::info!(
            "Serving vault {} with {} tools over stdio",
            self.vault.root().display(),
            self.tool_count()
        );
        let service = self.serve(rmcp::transport::stdio()).await?;
        service.waiting().await?;
        tracing::info!("Client disconnected");
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for VaultMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mdvault-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: Some("Markdown Vault MCP Server".into()),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_server_info_advertises_tools() {
        let temp_dir = TempDir::new().unwrap();
        let server = VaultMcpServer::new(Vault::open(temp_dir.path()).unwrap());

        let info = server.get_info();
        assert!(info.capabilities.tools.is_some());
        assert_eq!(info.server_info.name, "mdvault-mcp");
        assert!(info.instructions.unwrap().contains("wikilinks"));
    }

    #[test]
    fn test_routers_do_not_overlap() {
        let temp_dir = TempDir::new().unwrap();
        let server = VaultMcpServer::new(Vault::open(temp_dir.path()).unwrap());

        let mut names: Vec<String> = server
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(server.tool_count(), total);
    }
}
