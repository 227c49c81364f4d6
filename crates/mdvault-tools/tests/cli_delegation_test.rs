//! Delegated tools against a stand-in vault CLI
//!
//! A small shell script plays the part of `mdv`: it echoes its arguments, and
//! for `new zettel` writes a note and reports its path the way the real tool
//! does.

#![cfg(unix)]

use mdvault_core::Vault;
use mdvault_tools::cli::{
    ActivityReportParams, CaptureContentParams, CreateTaskParams, CreateZettelParams,
    ProjectNameParams, RunMacroParams,
};
use mdvault_tools::VaultMcpServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;

const FAKE_CLI: &str = r#"#!/bin/sh
case " $* " in
    *" fail "*)
        echo "boom" >&2
        exit 3
        ;;
esac
if [ "$1" = "new" ] && [ "$2" = "zettel" ]; then
    mkdir -p "$MARKDOWN_VAULT_PATH/zettel"
    cat > "$MARKDOWN_VAULT_PATH/zettel/idea.md" <<'NOTE'
---
type: zettel
---
# Idea
NOTE
    echo "OK   mdv new"
    echo "path: zettel/idea.md"
    exit 0
fi
echo "$@"
"#;

struct Fixture {
    vault: TempDir,
    server: VaultMcpServer,
}

/// Written once so no test forks while the script file is still open.
fn fake_cli() -> &'static Path {
    static SCRIPT: OnceLock<(TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = SCRIPT.get_or_init(|| {
        let bin = TempDir::new().unwrap();
        let script = bin.path().join("fake-mdv");
        fs::write(&script, FAKE_CLI).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        (bin, script)
    });
    path
}

fn setup() -> Fixture {
    let vault_dir = TempDir::new().unwrap();
    let vault = Vault::with_settings(
        vault_dir.path(),
        "daily/%Y-%m-%d.md",
        fake_cli().to_string_lossy().to_string(),
    )
    .unwrap();

    Fixture {
        vault: vault_dir,
        server: VaultMcpServer::new(vault),
    }
}

fn text_of(result: &CallToolResult) -> String {
    result.content[0].as_text().unwrap().text.clone()
}

#[tokio::test]
async fn test_capture_content_arguments() {
    let fixture = setup();
    let result = fixture
        .server
        .capture_content(Parameters(CaptureContentParams {
            name: "inbox".to_string(),
            text: "buy milk".to_string(),
            extra_vars: Some(BTreeMap::from([("tag".to_string(), "home".to_string())])),
        }))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(false));
    assert_eq!(
        text_of(&result),
        "capture inbox --batch --var text=buy milk --var tag=home"
    );
}

#[tokio::test]
async fn test_create_task_only_passes_given_fields() {
    let fixture = setup();
    let result = fixture
        .server
        .create_task(Parameters(CreateTaskParams {
            title: "Write report".to_string(),
            project: Some("alpha".to_string()),
            due_date: None,
            priority: Some("high".to_string()),
            status: None,
            extra_vars: None,
        }))
        .await
        .unwrap();

    assert_eq!(
        text_of(&result),
        "new task Write report --batch --var project=alpha --var priority=high"
    );
}

#[tokio::test]
async fn test_run_macro_wraps_output() {
    let fixture = setup();
    let result = fixture
        .server
        .run_macro(Parameters(RunMacroParams {
            name: "standup".to_string(),
            args: Some(vec!["extra".to_string()]),
            variables: None,
        }))
        .await
        .unwrap();

    assert_eq!(
        text_of(&result),
        "Macro 'standup' executed successfully.\n\nmacro standup --batch extra"
    );
}

#[tokio::test]
async fn test_activity_report_month() {
    let fixture = setup();
    let result = fixture
        .server
        .get_activity_report(Parameters(ActivityReportParams {
            month: Some("2025-01".to_string()),
            week: None,
        }))
        .await
        .unwrap();

    assert_eq!(text_of(&result), "report --month 2025-01");
}

#[tokio::test]
async fn test_non_zero_exit_is_reported() {
    let fixture = setup();
    let result = fixture
        .server
        .get_project_status(Parameters(ProjectNameParams {
            project_name: "fail".to_string(),
        }))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    let text = text_of(&result);
    assert!(text.starts_with("Error executing command: "), "{text}");
    assert!(text.contains("fake-mdv project status fail\nboom\n"), "{text}");
}

#[tokio::test]
async fn test_create_zettel_appends_sections() {
    let fixture = setup();
    let result = fixture
        .server
        .create_zettel(Parameters(CreateZettelParams {
            title: "Attention".to_string(),
            short_title: "attention".to_string(),
            source: Some("[[vaswani-2017]]".to_string()),
            body: Some("Weights over tokens.".to_string()),
            connections: Some(vec!["[[transformers]]".to_string()]),
            extra_vars: None,
        }))
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(false));
    assert_eq!(text_of(&result), "OK   mdv new\npath: zettel/idea.md");
    assert_eq!(
        fs::read_to_string(fixture.vault.path().join("zettel/idea.md")).unwrap(),
        "---\ntype: zettel\n---\n# Idea\n\n## Core Idea\n\nWeights over tokens.\n\n## Connections\n\n- [[transformers]]\n\n## Source\n\n- [[vaswani-2017]]\n"
    );
}
