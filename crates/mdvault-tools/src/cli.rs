//! Tools forwarded to the vault CLI
//!
//! Captures, macros, templated notes, focus, context, projects, tasks and
//! reports are owned by the external `mdv` tool. Each tool here only builds
//! the argument list; output is passed through unchanged.

#![allow(missing_docs)]

use crate::format;
use crate::server::VaultMcpServer;
use mdvault_core::{CliArgs, VaultResult};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content};
use rmcp::{tool, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Additional `--var key=value` template variables
pub type ExtraVars = Option<BTreeMap<String, String>>;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CaptureContentParams {
    /// Name of the capture, e.g. 'inbox' or 'log'
    pub name: String,
    /// Main content, passed as the 'text' variable
    pub text: String,
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunMacroParams {
    /// Name of the macro, e.g. 'daily-standup'
    pub name: String,
    /// Positional arguments for the macro
    #[serde(default)]
    pub args: Option<Vec<String>>,
    /// Variables passed as --var key=value
    #[serde(default)]
    pub variables: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateZettelParams {
    /// Title of the zettel (the atomic insight)
    pub title: String,
    /// Short slug for the filename, e.g. 'attention-mechanism'
    pub short_title: String,
    /// Source reference as a wikilink, e.g. '[[literature-note]]'
    #[serde(default)]
    pub source: Option<String>,
    /// Body text elaborating on the insight
    #[serde(default)]
    pub body: Option<String>,
    /// Related note wikilinks, e.g. ['[[note-1]]', '[[note-2]]']
    #[serde(default)]
    pub connections: Option<Vec<String>>,
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDailyNoteParams {
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateLiteratureNoteParams {
    /// Title of the source
    pub title: String,
    /// Short slug for the filename
    pub short_title: String,
    /// Authors, e.g. 'Vaswani, Shazeer'
    #[serde(default)]
    pub authors: Option<String>,
    /// Publication year
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub url: Option<String>,
    /// Kind of source, e.g. 'article', 'book', 'video'
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetFocusParams {
    /// Project ID or name to focus on
    pub project: String,
    /// What you are working on
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextDayParams {
    /// YYYY-MM-DD, 'today', 'yesterday' or another date expression
    #[serde(default = "default_day")]
    pub date: String,
}

fn default_day() -> String {
    "today".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextWeekParams {
    /// 'current', 'last' or YYYY-Wxx; omitted for the current week
    #[serde(default)]
    pub week: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ContextNoteParams {
    /// Path to the note relative to the vault root
    pub note_path: String,
    /// Days of activity history to include
    #[serde(default = "default_activity_days")]
    pub activity_days: u32,
}

fn default_activity_days() -> u32 {
    7
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    /// Only projects with this status, e.g. 'active' or 'archived'
    #[serde(default)]
    pub status_filter: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectNameParams {
    /// Name or ID of the project
    pub project_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectProgressParams {
    /// Project to report on; all projects when omitted
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    pub title: String,
    /// Project context, e.g. 'work' or 'personal'
    #[serde(default)]
    pub context: Option<String>,
    /// Project status, e.g. 'open' or 'closed'
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTasksParams {
    /// Only tasks in this project
    #[serde(default)]
    pub project_filter: Option<String>,
    /// Only tasks with this status, e.g. 'todo', 'doing' or 'done'
    #[serde(default)]
    pub status_filter: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TaskIdParams {
    pub task_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    pub title: String,
    /// Project name; the focused project when omitted
    #[serde(default)]
    pub project: Option<String>,
    /// Due date, YYYY-MM-DD
    #[serde(default)]
    pub due_date: Option<String>,
    /// e.g. 'low', 'medium' or 'high'
    #[serde(default)]
    pub priority: Option<String>,
    /// e.g. 'todo', 'doing' or 'done'
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub extra_vars: ExtraVars,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteTaskParams {
    /// Path to the task note relative to the vault root
    pub task_path: String,
    /// What was done; appended to the task body
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ActivityReportParams {
    /// Month as YYYY-MM. Cannot be combined with 'week'
    #[serde(default)]
    pub month: Option<String>,
    /// Week as YYYY-Wxx. Cannot be combined with 'month'
    #[serde(default)]
    pub week: Option<String>,
}

/// `--var` pairs from an optional map
fn with_vars(args: CliArgs, vars: &ExtraVars) -> CliArgs {
    match vars {
        Some(vars) => args.vars(vars),
        None => args,
    }
}

fn invalid(message: &str) -> Result<CallToolResult, rmcp::ErrorData> {
    Ok(CallToolResult::error(vec![Content::text(message)]))
}

impl VaultMcpServer {
    async fn delegate(&self, args: CliArgs) -> Result<CallToolResult, rmcp::ErrorData> {
        format::command(self.vault.run_cli(&args).await)
    }

    /// First word in `output` ending in `.md` that names an existing note.
    fn created_note(&self, output: &str) -> Option<String> {
        output
            .lines()
            .map(str::trim)
            .filter(|line| line.ends_with(".md"))
            .flat_map(|line| line.split_whitespace())
            .filter(|word| word.ends_with(".md"))
            .find(|word| {
                self.vault
                    .resolver()
                    .resolve_note(word)
                    .map_or(false, |path| path.is_file())
            })
            .map(str::to_string)
    }

    /// Append Core Idea, Connections and Source sections to a new zettel.
    fn fill_zettel(&self, path: &str, params: &CreateZettelParams) -> VaultResult<()> {
        let existing = self.vault.read_note(path)?;
        let mut sections = Vec::new();

        if let Some(body) = params.body.as_deref().filter(|b| !b.is_empty()) {
            sections.push(format!("## Core Idea\n\n{body}"));
        }
        if let Some(connections) = params.connections.as_ref().filter(|c| !c.is_empty()) {
            let items: Vec<String> = connections.iter().map(|c| format!("- {c}")).collect();
            sections.push(format!("## Connections\n\n{}", items.join("\n")));
        }
        if let Some(source) = params.source.as_deref().filter(|s| !s.is_empty()) {
            let link = format!("[[{}]]", source.trim_matches(|c| c == '[' || c == ']'));
            if !existing.contains(&link) {
                sections.push(format!("## Source\n\n- {source}"));
            }
        }

        if sections.is_empty() {
            return Ok(());
        }
        self.vault.append_to_note(path, &sections.join("\n\n"), None)
    }
}

#[tool_router(router = cli_router, vis = "pub(crate)")]
impl VaultMcpServer {
    #[tool(description = "Capture content into a configured capture location (e.g. 'inbox')")]
    pub async fn capture_content(
        &self,
        params: Parameters<CaptureContentParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["capture"])
            .arg(params.name)
            .flag("batch", true)
            .var("text", &params.text);
        self.delegate(with_vars(args, &params.extra_vars)).await
    }

    #[tool(description = "Run a predefined macro, e.g. 'daily-standup' or 'new-project'")]
    pub async fn run_macro(
        &self,
        params: Parameters<RunMacroParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut args = with_vars(
            CliArgs::new(["macro"]).arg(&params.name).flag("batch", true),
            &params.variables,
        );
        for arg in params.args.unwrap_or_default() {
            args = args.arg(arg);
        }

        match self.vault.run_cli(&args).await {
            Ok(output) if output.success => format::text(format!(
                "Macro '{}' executed successfully.\n\n{}",
                params.name,
                output.stdout.trim()
            )),
            Ok(output) => invalid(&format!(
                "Error executing macro '{}':\n{}\n{}",
                params.name, output.stderr, output.stdout
            )),
            Err(e) => format::failure(&e),
        }
    }

    #[tool(
        description = "Create a zettel (atomic knowledge note). Body, connections and source are appended as sections of the new note"
    )]
    pub async fn create_zettel(
        &self,
        params: Parameters<CreateZettelParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["new", "zettel"])
            .arg(&params.title)
            .flag("batch", true)
            .var("short_title", &params.short_title);
        let args = match params.source.as_deref() {
            Some(source) if !source.is_empty() => args.var("source", source),
            _ => args,
        };
        let args = with_vars(args, &params.extra_vars);

        let output = match self.vault.run_cli(&args).await {
            Ok(output) if output.success => output.into_text(),
            other => return format::command(other),
        };

        let wants_sections = params.body.as_deref().map_or(false, |b| !b.is_empty())
            || params.connections.as_ref().map_or(false, |c| !c.is_empty());
        if !wants_sections {
            return format::text(output);
        }

        match self.created_note(&output) {
            Some(path) => match self.fill_zettel(&path, &params) {
                Ok(()) => format::text(output),
                Err(e) => {
                    tracing::warn!("Created {} but could not add sections: {}", path, e);
                    format::text(format!(
                        "{output}\n(Warning: created note but failed to append body/connections: {e})"
                    ))
                }
            },
            None => {
                tracing::warn!("Could not find the created zettel in CLI output");
                format::text(output)
            }
        }
    }

    #[tool(description = "Create today's daily note from its template")]
    pub async fn create_daily_note(
        &self,
        params: Parameters<CreateDailyNoteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["new", "daily"]).flag("batch", true);
        self.delegate(with_vars(args, &params.0.extra_vars)).await
    }

    #[tool(description = "Create a literature note for a paper, book or other source")]
    pub async fn create_literature_note(
        &self,
        params: Parameters<CreateLiteratureNoteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut args = CliArgs::new(["new", "literature"])
            .arg(params.title)
            .flag("batch", true)
            .var("short_title", &params.short_title);
        if let Some(authors) = &params.authors {
            args = args.var("authors", authors);
        }
        if let Some(year) = params.year {
            args = args.var("year", &year.to_string());
        }
        if let Some(url) = &params.url {
            args = args.var("url", url);
        }
        if let Some(source_type) = &params.source_type {
            args = args.var("source_type", source_type);
        }
        self.delegate(with_vars(args, &params.extra_vars)).await
    }

    #[tool(description = "Set the active project focus")]
    pub async fn set_focus(
        &self,
        params: Parameters<SetFocusParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["focus"])
            .arg(params.project)
            .opt_some("note", params.note);
        self.delegate(args).await
    }

    #[tool(description = "Clear the active project focus")]
    pub async fn clear_focus(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        self.delegate(CliArgs::new(["focus"]).flag("clear", true))
            .await
    }

    #[tool(description = "Get the current focus: the active project and any associated note")]
    pub async fn get_active_context(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        self.delegate(CliArgs::new(["focus"]).flag("json", true))
            .await
    }

    #[tool(description = "Get activity context for a day: tasks, notes modified and logs")]
    pub async fn get_context_day(
        &self,
        params: Parameters<ContextDayParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["context", "day"])
            .arg(params.0.date)
            .opt("format", "json");
        self.delegate(args).await
    }

    #[tool(description = "Get activity context for a week")]
    pub async fn get_context_week(
        &self,
        params: Parameters<ContextWeekParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["context", "week"])
            .arg_opt(params.0.week)
            .opt("format", "json");
        self.delegate(args).await
    }

    #[tool(
        description = "Get context for a note: metadata, sections, recent activity and references"
    )]
    pub async fn get_context_note(
        &self,
        params: Parameters<ContextNoteParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["context", "note"])
            .arg(params.note_path)
            .opt("format", "json")
            .opt("activity-days", params.activity_days);
        self.delegate(args).await
    }

    #[tool(description = "Get context for the focused project: task counts, recent tasks and activity")]
    pub async fn get_context_focus(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        self.delegate(CliArgs::new(["context", "focus"]).opt("format", "json"))
            .await
    }

    #[tool(description = "List projects with task counts")]
    pub async fn list_projects(
        &self,
        params: Parameters<ListProjectsParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["project", "list"]).opt_some("status", params.0.status_filter);
        self.delegate(args).await
    }

    #[tool(description = "Show the detailed (kanban) status of a project")]
    pub async fn get_project_status(
        &self,
        params: Parameters<ProjectNameParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["project", "status"]).arg(params.0.project_name);
        self.delegate(args).await
    }

    #[tool(description = "Show progress metrics for one project or all projects")]
    pub async fn get_project_progress(
        &self,
        params: Parameters<ProjectProgressParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["project", "progress"]).arg_opt(params.0.project_name);
        self.delegate(args).await
    }

    #[tool(description = "Create a new project")]
    pub async fn create_project(
        &self,
        params: Parameters<CreateProjectParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut args = CliArgs::new(["new", "project"])
            .arg(params.title)
            .flag("batch", true);
        if let Some(context) = &params.context {
            args = args.var("context", context);
        }
        if let Some(status) = &params.status {
            args = args.var("status", status);
        }
        self.delegate(with_vars(args, &params.extra_vars)).await
    }

    #[tool(description = "List tasks, optionally filtered by project and status")]
    pub async fn list_tasks(
        &self,
        params: Parameters<ListTasksParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["task", "list"])
            .opt_some("project", params.project_filter)
            .opt_some("status", params.status_filter);
        self.delegate(args).await
    }

    #[tool(description = "Show details for a task")]
    pub async fn get_task_details(
        &self,
        params: Parameters<TaskIdParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let args = CliArgs::new(["task", "status"]).arg(params.0.task_id);
        self.delegate(args).await
    }

    #[tool(description = "Create a new task")]
    pub async fn create_task(
        &self,
        params: Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let mut args = CliArgs::new(["new", "task"])
            .arg(params.title)
            .flag("batch", true);
        for (key, value) in [
            ("project", &params.project),
            ("due_date", &params.due_date),
            ("priority", &params.priority),
            ("status", &params.status),
        ] {
            if let Some(value) = value {
                args = args.var(key, value);
            }
        }
        self.delegate(with_vars(args, &params.extra_vars)).await
    }

    #[tool(description = "Mark a task as done, optionally recording what was done")]
    pub async fn complete_task(
        &self,
        params: Parameters<CompleteTaskParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let args = CliArgs::new(["task", "done"])
            .arg(params.task_path)
            .arg_opt(params.summary);
        self.delegate(args).await
    }

    #[tool(description = "Get today's dashboard: tasks, events and focus")]
    pub async fn get_daily_dashboard(&self) -> Result<CallToolResult, rmcp::ErrorData> {
        self.delegate(CliArgs::new(["today"])).await
    }

    #[tool(
        description = "Activity report for a month (YYYY-MM) or a week (YYYY-Wxx): heatmap, daily note coverage, completed tasks and project activity. Give exactly one of month or week"
    )]
    pub async fn get_activity_report(
        &self,
        params: Parameters<ActivityReportParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;
        let month = params.month.filter(|m| !m.is_empty());
        let week = params.week.filter(|w| !w.is_empty());
        let args = match (month, week) {
            (Some(_), Some(_)) => {
                return invalid("Error: Cannot specify both 'month' and 'week'. Choose one.")
            }
            (None, None) => {
                return invalid(
                    "Error: Must specify either 'month' (YYYY-MM) or 'week' (YYYY-Wxx).",
                )
            }
            (Some(month), None) => CliArgs::new(["report"]).opt("month", month),
            (None, Some(week)) => CliArgs::new(["report"]).opt("week", week),
        };
        self.delegate(args).await
    }
}
