use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand};
use serde_json::{Value, json};
use tracing::error;
use uuid::Uuid;

use crate::{
    board::{ApplyOutcome, Board, StatusTemplate, TaskFilter},
    db::Database,
    settings::Settings,
    types::{Priority, Project, ProjectStatus, StatusColor, Task, TaskFieldEdit},
};

const SCHEMA_VERSION: &str = "cli.v1";

#[derive(Debug, Clone, Subcommand)]
pub enum RootCommand {
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    Status {
        #[command(subcommand)]
        command: StatusCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommand {
    List,
    Create(ProjectCreateArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    List(TaskListArgs),
    Board(ProjectScopeArgs),
    Add(TaskAddArgs),
    Move(TaskMoveArgs),
    Set(TaskSetArgs),
    Delete(TaskDeleteArgs),
}

#[derive(Debug, Clone, Subcommand)]
pub enum StatusCommand {
    List(ProjectScopeArgs),
    /// Seed the default status set into a project that has none.
    Init(ProjectScopeArgs),
    Add(StatusAddArgs),
    Remove(StatusNameArgs),
    Rename(StatusRenameArgs),
    Recolor(StatusRecolorArgs),
    SetDone(StatusSetDoneArgs),
    Reorder(StatusReorderArgs),
    Template(StatusTemplateArgs),
    CopyFrom(StatusCopyFromArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ProjectScopeArgs {
    /// Project name; falls back to the configured default project.
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ProjectCreateArgs {
    #[arg(long, value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskListArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    /// Only tasks in this status (id, id prefix, or name).
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    #[arg(long, value_name = "PRIORITY")]
    pub priority: Option<String>,

    #[arg(long)]
    pub hide_done: bool,
}

#[derive(Debug, Clone, Args)]
pub struct TaskAddArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub title: String,

    /// Status to place the task in (id, id prefix, or name). Omit for unassigned.
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskMoveArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    /// Drop target: a status (name or id) to change column, or another
    /// task id to reorder onto its place.
    #[arg(long, value_name = "TARGET")]
    pub onto: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskSetArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TASK_ID")]
    pub id: String,

    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub description: Option<String>,

    #[arg(long, value_name = "DATE")]
    pub due: Option<String>,

    #[arg(long, value_name = "MINUTES")]
    pub estimate: Option<i64>,

    #[arg(long, value_name = "PRIORITY")]
    pub priority: Option<String>,

    /// Status by id, id prefix, or name; the literal `none` unassigns.
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct TaskDeleteArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TASK_ID")]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct StatusAddArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "COLOR", default_value = "gray")]
    pub color: String,

    #[arg(long)]
    pub done: bool,
}

#[derive(Debug, Clone, Args)]
pub struct StatusNameArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct StatusRenameArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "TEXT")]
    pub to: String,
}

#[derive(Debug, Clone, Args)]
pub struct StatusRecolorArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "COLOR")]
    pub color: String,
}

#[derive(Debug, Clone, Args)]
pub struct StatusSetDoneArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,

    /// Clear the done flag instead of setting it.
    #[arg(long)]
    pub clear: bool,
}

#[derive(Debug, Clone, Args)]
pub struct StatusReorderArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    #[arg(long, value_name = "TEXT")]
    pub name: String,

    #[arg(long, value_name = "N")]
    pub to: usize,
}

#[derive(Debug, Clone, Args)]
pub struct StatusTemplateArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    /// One of: basic, kanban, freelance.
    #[arg(long, value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Clone, Args)]
pub struct StatusCopyFromArgs {
    #[command(flatten)]
    pub scope: ProjectScopeArgs,

    /// Project whose statuses are copied over this project's set.
    #[arg(long, value_name = "NAME")]
    pub source: String,
}

pub fn run(db_path: &PathBuf, command: RootCommand, json_output: bool, quiet: bool) -> i32 {
    match execute(db_path, command) {
        Ok(output) => {
            print_success(output, json_output, quiet);
            0
        }
        Err(err) => {
            print_error(&err, json_output);
            err.exit_code
        }
    }
}

struct CommandOutput {
    command: &'static str,
    project: Option<String>,
    data: Value,
    text: String,
}

#[derive(Debug)]
pub(crate) struct CliError {
    pub exit_code: i32,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

type CliResult<T> = Result<T, CliError>;

fn execute(db_path: &PathBuf, command: RootCommand) -> CliResult<CommandOutput> {
    let db = Database::open(db_path).map_err(runtime_error)?;

    match command {
        RootCommand::Project { command } => execute_project_command(&db, command),
        RootCommand::Task { command } => execute_task_command(&db, command),
        RootCommand::Status { command } => execute_status_command(&db, command),
    }
}

fn execute_project_command(db: &Database, command: ProjectCommand) -> CliResult<CommandOutput> {
    match command {
        ProjectCommand::List => project_list(db),
        ProjectCommand::Create(args) => project_create(db, args),
    }
}

fn execute_task_command(db: &Database, command: TaskCommand) -> CliResult<CommandOutput> {
    match command {
        TaskCommand::List(args) => task_list(db, args),
        TaskCommand::Board(args) => task_board(db, args),
        TaskCommand::Add(args) => task_add(db, args),
        TaskCommand::Move(args) => task_move(db, args),
        TaskCommand::Set(args) => task_set(db, args),
        TaskCommand::Delete(args) => task_delete(db, args),
    }
}

fn execute_status_command(db: &Database, command: StatusCommand) -> CliResult<CommandOutput> {
    match command {
        StatusCommand::List(args) => status_list(db, args),
        StatusCommand::Init(args) => status_init(db, args),
        StatusCommand::Add(args) => {
            status_edit(db, args.scope, "status add", move |editor| {
                let color = parse_color(&args.color)?;
                editor.add(&args.name, color, args.done).map_err(classify_editor_error)
            })
        }
        StatusCommand::Remove(args) => {
            status_edit(db, args.scope, "status remove", move |editor| {
                editor.remove(&args.name).map_err(classify_editor_error)
            })
        }
        StatusCommand::Rename(args) => {
            status_edit(db, args.scope, "status rename", move |editor| {
                editor.rename(&args.name, &args.to).map_err(classify_editor_error)
            })
        }
        StatusCommand::Recolor(args) => {
            status_edit(db, args.scope, "status recolor", move |editor| {
                let color = parse_color(&args.color)?;
                editor.recolor(&args.name, color).map_err(classify_editor_error)
            })
        }
        StatusCommand::SetDone(args) => {
            status_edit(db, args.scope, "status set-done", move |editor| {
                editor
                    .set_done(&args.name, !args.clear)
                    .map_err(classify_editor_error)
            })
        }
        StatusCommand::Reorder(args) => {
            status_edit(db, args.scope, "status reorder", move |editor| {
                editor.reorder(&args.name, args.to).map_err(classify_editor_error)
            })
        }
        StatusCommand::Template(args) => {
            status_edit(db, args.scope, "status template", move |editor| {
                let template = StatusTemplate::from_str(&args.name)
                    .map_err(|err| usage_error("TEMPLATE_UNKNOWN", err.to_string()))?;
                editor.apply_template(template);
                Ok(())
            })
        }
        StatusCommand::CopyFrom(args) => status_copy_from(db, args),
    }
}

fn project_list(db: &Database) -> CliResult<CommandOutput> {
    let projects = db.list_projects().map_err(runtime_error)?;
    let data = json!({
        "projects": projects.iter().map(project_json).collect::<Vec<_>>()
    });
    let text = render_project_list_text(&projects);

    Ok(CommandOutput {
        command: "project list",
        project: None,
        data,
        text,
    })
}

fn project_create(db: &Database, args: ProjectCreateArgs) -> CliResult<CommandOutput> {
    let created = db.add_project(&args.name).map_err(classify_db_error)?;
    let data = json!({ "project": project_json(&created) });

    Ok(CommandOutput {
        command: "project create",
        project: Some(created.name.clone()),
        data,
        text: format!("created project {} ({})", created.name, created.id),
    })
}

fn task_list(db: &Database, args: TaskListArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.scope.project.as_deref())?;
    let board = Board::load(db, project.id).map_err(runtime_error)?;

    let filter = TaskFilter {
        status: args
            .status
            .as_deref()
            .map(|selector| resolve_status_selector(&board, selector))
            .transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        hide_done: args.hide_done,
    };

    let rows = board.list_view(&filter);
    let data = json!({
        "tasks": rows
            .iter()
            .map(|task| task_json(task, &board))
            .collect::<Vec<_>>()
    });
    let text = render_task_list_text(&rows, &board);

    Ok(CommandOutput {
        command: "task list",
        project: Some(project.name),
        data,
        text,
    })
}

fn task_board(db: &Database, args: ProjectScopeArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.project.as_deref())?;
    let board = Board::load(db, project.id).map_err(runtime_error)?;

    let columns = board.board_view(&TaskFilter::default());
    let data = json!({
        "columns": columns
            .iter()
            .map(|column| {
                json!({
                    "status": status_json(column.status),
                    "tasks": column
                        .tasks
                        .iter()
                        .map(|task| task_json(task, &board))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>()
    });

    let mut sections = Vec::new();
    for column in &columns {
        let mut lines = vec![format!(
            "{} [{}]{} ({})",
            column.status.name,
            column.status.color.as_str(),
            if column.status.is_done_status {
                " (done)"
            } else {
                ""
            },
            column.tasks.len()
        )];
        for task in &column.tasks {
            lines.push(format!(
                "  {}  {}  {}",
                short_id(task.id),
                task.priority.as_str(),
                task.title.replace('\n', " ")
            ));
        }
        sections.push(lines.join("\n"));
    }
    let text = if sections.is_empty() {
        "No statuses found.".to_string()
    } else {
        sections.join("\n\n")
    };

    Ok(CommandOutput {
        command: "task board",
        project: Some(project.name),
        data,
        text,
    })
}

fn task_add(db: &Database, args: TaskAddArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.scope.project.as_deref())?;
    let mut board = Board::load(db, project.id).map_err(runtime_error)?;

    let status_id = args
        .status
        .as_deref()
        .map(|selector| resolve_status_selector(&board, selector))
        .transpose()?;

    let created = board
        .quick_add(&args.title, status_id)
        .map_err(classify_db_error)?;

    let data = json!({ "task": task_json(&created, &board) });
    Ok(CommandOutput {
        command: "task add",
        project: Some(project.name),
        data,
        text: format!(
            "created task {} ({}) at position {}",
            created.title, created.id, created.position
        ),
    })
}

fn task_move(db: &Database, args: TaskMoveArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.scope.project.as_deref())?;
    let mut board = Board::load(db, project.id).map_err(runtime_error)?;

    let task_id = resolve_task_selector(&board, &args.id)?;
    let target_id = resolve_drop_target(&board, &args.onto)?;

    if !board.drag_begin(task_id) {
        return Err(runtime_error(anyhow::anyhow!(
            "could not start a move for task {task_id}"
        )));
    }
    let outcome = board.drag_end(Some(target_id)).map_err(runtime_error)?;

    let (text, outcome_json) = describe_outcome(&outcome, task_id);
    let task = board.tasks().get(task_id).cloned();
    let data = json!({
        "outcome": outcome_json,
        "task": task.map(|task| task_json(&task, &board)),
    });

    Ok(CommandOutput {
        command: "task move",
        project: Some(project.name),
        data,
        text,
    })
}

fn task_set(db: &Database, args: TaskSetArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.scope.project.as_deref())?;
    let mut board = Board::load(db, project.id).map_err(runtime_error)?;
    let task_id = resolve_task_selector(&board, &args.id)?;

    let mut edits: Vec<TaskFieldEdit> = Vec::new();
    if let Some(title) = args.title {
        edits.push(TaskFieldEdit::Title(title));
    }
    if let Some(description) = args.description {
        edits.push(TaskFieldEdit::Description(Some(description)));
    }
    if let Some(due) = args.due {
        edits.push(TaskFieldEdit::DueDate(Some(due)));
    }
    if let Some(estimate) = args.estimate {
        edits.push(TaskFieldEdit::Estimate(Some(estimate)));
    }
    if let Some(priority) = args.priority.as_deref() {
        edits.push(TaskFieldEdit::Priority(parse_priority(priority)?));
    }
    if let Some(status) = args.status.as_deref() {
        let status_id = if status.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(resolve_status_selector(&board, status)?)
        };
        edits.push(TaskFieldEdit::Status(status_id));
    }

    if edits.is_empty() {
        return Err(usage_error(
            "TASK_SET_EMPTY",
            "provide at least one of --title, --description, --due, --estimate, --priority, or --status",
        ));
    }

    for edit in &edits {
        if let ApplyOutcome::RolledBack { error } =
            board.edit_task(task_id, edit).map_err(runtime_error)?
        {
            return Err(classify_db_error(error));
        }
    }

    let updated = board
        .tasks()
        .get(task_id)
        .cloned()
        .ok_or_else(|| runtime_error(anyhow::anyhow!("task {task_id} disappeared after edit")))?;
    let data = json!({ "task": task_json(&updated, &board) });

    Ok(CommandOutput {
        command: "task set",
        project: Some(project.name),
        data,
        text: format!("updated task {} ({})", updated.title, updated.id),
    })
}

fn task_delete(db: &Database, args: TaskDeleteArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.scope.project.as_deref())?;
    let mut board = Board::load(db, project.id).map_err(runtime_error)?;
    let task_id = resolve_task_selector(&board, &args.id)?;

    board.delete_task(task_id).map_err(classify_db_error)?;
    let data = json!({ "deleted": true, "task_id": task_id });

    Ok(CommandOutput {
        command: "task delete",
        project: Some(project.name),
        data,
        text: format!("deleted task {task_id}"),
    })
}

fn status_list(db: &Database, args: ProjectScopeArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.project.as_deref())?;
    let board = Board::load(db, project.id).map_err(runtime_error)?;

    let statuses = board.statuses().statuses();
    let data = json!({
        "statuses": statuses.iter().map(status_json).collect::<Vec<_>>()
    });
    let text = render_status_list_text(statuses);

    Ok(CommandOutput {
        command: "status list",
        project: Some(project.name),
        data,
        text,
    })
}

fn status_init(db: &Database, args: ProjectScopeArgs) -> CliResult<CommandOutput> {
    let project = resolve_project(db, args.project.as_deref())?;
    let existing = db.list_statuses(project.id).map_err(runtime_error)?;
    if !existing.is_empty() {
        return Err(conflict_error(
            "STATUS_SET_EXISTS",
            format!(
                "project '{}' already has {} statuses",
                project.name,
                existing.len()
            ),
            None,
        ));
    }

    let created = db
        .create_default_statuses(project.id, &crate::types::default_status_seeds())
        .map_err(classify_db_error)?;
    let data = json!({
        "statuses": created.iter().map(status_json).collect::<Vec<_>>()
    });
    let text = render_status_list_text(&created);

    Ok(CommandOutput {
        command: "status init",
        project: Some(project.name),
        data,
        text,
    })
}

/// Shared flow for every mutating status subcommand: load the set into a
/// draft, apply one edit, save the whole draft back.
fn status_edit<F>(
    db: &Database,
    scope: ProjectScopeArgs,
    command: &'static str,
    edit: F,
) -> CliResult<CommandOutput>
where
    F: FnOnce(&mut crate::board::StatusEditor) -> CliResult<()>,
{
    let project = resolve_project(db, scope.project.as_deref())?;
    let mut board = Board::load(db, project.id).map_err(runtime_error)?;

    let mut editor = board.status_editor();
    edit(&mut editor)?;
    let saved = board.save_statuses(editor).map_err(classify_db_error)?;

    let data = json!({
        "statuses": saved.iter().map(status_json).collect::<Vec<_>>()
    });
    let text = render_status_list_text(saved);

    Ok(CommandOutput {
        command,
        project: Some(project.name),
        data,
        text,
    })
}

fn status_copy_from(db: &Database, args: StatusCopyFromArgs) -> CliResult<CommandOutput> {
    let source = resolve_project(db, Some(&args.source))?;
    let source_statuses = db.list_statuses(source.id).map_err(runtime_error)?;

    status_edit(db, args.scope, "status copy-from", move |editor| {
        editor
            .copy_from(&source_statuses)
            .map_err(classify_editor_error)
    })
}

fn resolve_project(db: &Database, name: Option<&str>) -> CliResult<Project> {
    let name = match name {
        Some(value) => value.to_string(),
        None => Settings::load().default_project.ok_or_else(|| {
            usage_error(
                "PROJECT_REQUIRED",
                "provide --project or set default_project in settings",
            )
        })?,
    };

    db.get_project_by_name(&name)
        .map_err(runtime_error)?
        .ok_or_else(|| {
            not_found_error("PROJECT_NOT_FOUND", format!("project '{}' not found", name))
        })
}

fn resolve_status_selector(board: &Board<'_, Database>, selector: &str) -> CliResult<Uuid> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(usage_error("STATUS_REQUIRED", "status cannot be empty"));
    }

    if let Ok(parsed) = Uuid::parse_str(trimmed) {
        if board.statuses().contains(parsed) {
            return Ok(parsed);
        }
        return Err(not_found_error(
            "STATUS_NOT_FOUND",
            format!("status {} not found", parsed),
        ));
    }

    if let Some(status) = board.statuses().find_by_name(trimmed) {
        return Ok(status.id);
    }

    let matches = prefix_matches(
        board.statuses().statuses().iter().map(|status| status.id),
        trimmed,
    );
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(not_found_error(
            "STATUS_NOT_FOUND",
            format!("status '{}' not found", selector),
        )),
        many => Err(conflict_error(
            "STATUS_ID_AMBIGUOUS",
            format!(
                "status id prefix '{}' matches {} statuses; use a longer id",
                selector,
                many.len()
            ),
            Some(json!({
                "matches": many.iter().map(|id| id.to_string()).collect::<Vec<_>>()
            })),
        )),
    }
}

fn resolve_task_selector(board: &Board<'_, Database>, selector: &str) -> CliResult<Uuid> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(usage_error("TASK_ID_REQUIRED", "task id cannot be empty"));
    }

    if let Ok(parsed) = Uuid::parse_str(trimmed) {
        if board.tasks().contains(parsed) {
            return Ok(parsed);
        }
        return Err(not_found_error(
            "TASK_NOT_FOUND",
            format!("task {} not found", parsed),
        ));
    }

    let matches = prefix_matches(board.tasks().tasks().iter().map(|task| task.id), trimmed);
    match matches.as_slice() {
        [single] => Ok(*single),
        [] => Err(not_found_error(
            "TASK_NOT_FOUND",
            format!("task '{}' not found", selector),
        )),
        many => Err(conflict_error(
            "TASK_ID_AMBIGUOUS",
            format!(
                "task id prefix '{}' matches {} tasks; use a longer id",
                selector,
                many.len()
            ),
            Some(json!({
                "matches": many.iter().map(|id| id.to_string()).collect::<Vec<_>>()
            })),
        )),
    }
}

/// A drop target is a status (name or id) or another task (id). The resolver
/// itself applies the column-over-card precedence; this only maps the string
/// to some known id.
fn resolve_drop_target(board: &Board<'_, Database>, selector: &str) -> CliResult<Uuid> {
    if let Ok(status_id) = resolve_status_selector(board, selector) {
        return Ok(status_id);
    }
    resolve_task_selector(board, selector).map_err(|_| {
        not_found_error(
            "DROP_TARGET_NOT_FOUND",
            format!("'{}' names neither a status nor a task", selector),
        )
    })
}

fn prefix_matches(ids: impl Iterator<Item = Uuid>, selector: &str) -> Vec<Uuid> {
    let needle = selector.to_ascii_lowercase();
    let mut unique_matches = Vec::new();
    let mut seen = HashSet::new();
    for id in ids {
        let full = id.to_string().to_ascii_lowercase();
        let simple = id.as_simple().to_string();
        if (full.starts_with(&needle) || simple.starts_with(&needle)) && seen.insert(id) {
            unique_matches.push(id);
        }
    }
    unique_matches
}

fn parse_priority(raw: &str) -> CliResult<Priority> {
    raw.parse::<Priority>()
        .map_err(|err| usage_error("PRIORITY_INVALID", err.to_string()))
}

fn parse_color(raw: &str) -> CliResult<StatusColor> {
    raw.parse::<StatusColor>()
        .map_err(|err| usage_error("COLOR_INVALID", err.to_string()))
}

fn describe_outcome(outcome: &ApplyOutcome, task_id: Uuid) -> (String, Value) {
    match outcome {
        ApplyOutcome::Noop => (
            format!("nothing to do for task {task_id}"),
            json!({ "kind": "noop" }),
        ),
        ApplyOutcome::ReassignedStatus { status_id, .. } => (
            format!("moved task {task_id} to status {status_id}"),
            json!({ "kind": "reassigned", "status_id": status_id }),
        ),
        ApplyOutcome::Reordered { moved } => (
            format!("reordered task {task_id} ({moved} positions rewritten)"),
            json!({ "kind": "reordered", "moved": moved }),
        ),
        ApplyOutcome::EditedField { .. } => (
            format!("updated task {task_id}"),
            json!({ "kind": "edited" }),
        ),
        ApplyOutcome::RolledBack { error } => (
            format!("move failed and was rolled back: {error}"),
            json!({ "kind": "rolled_back", "error": error.to_string() }),
        ),
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn render_project_list_text(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects found.".to_string();
    }

    let headers = ["ID", "Name", "Created"];
    let rows = projects
        .iter()
        .map(|project| {
            vec![
                short_id(project.id),
                project.name.clone(),
                project.created_at.clone(),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn render_task_list_text(tasks: &[&Task], board: &Board<'_, Database>) -> String {
    if tasks.is_empty() {
        return "No tasks found.".to_string();
    }

    let headers = ["Pos", "ID", "Status", "Pri", "Due", "Title"];
    let rows = tasks
        .iter()
        .map(|task| {
            let status_label = task
                .status_id
                .and_then(|id| board.statuses().get(id))
                .map(|status| status.name.clone())
                .unwrap_or_else(|| "-".to_string());
            let due = task.due_date.clone().unwrap_or_else(|| "-".to_string());
            let title = task.title.replace('\n', " ");

            vec![
                task.position.to_string(),
                short_id(task.id),
                status_label,
                task.priority.as_str().to_string(),
                due,
                title,
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn render_status_list_text(statuses: &[ProjectStatus]) -> String {
    if statuses.is_empty() {
        return "No statuses found.".to_string();
    }

    let headers = ["Pos", "ID", "Name", "Color", "Done"];
    let rows = statuses
        .iter()
        .map(|status| {
            vec![
                status.position.to_string(),
                short_id(status.id),
                status.name.clone(),
                status.color.as_str().to_string(),
                if status.is_done_status { "yes" } else { "" }.to_string(),
            ]
        })
        .collect::<Vec<_>>();

    render_text_table(&headers, &rows)
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|header| header.chars().count())
        .collect::<Vec<_>>();

    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            let width = cell.chars().count();
            if width > widths[index] {
                widths[index] = width;
            }
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|width| "-".repeat(*width + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut lines = Vec::new();
    lines.push(border.clone());
    lines.push(format!(
        "| {} |",
        headers
            .iter()
            .enumerate()
            .map(|(index, header)| format!("{header:<width$}", width = widths[index]))
            .collect::<Vec<_>>()
            .join(" | ")
    ));
    lines.push(border.clone());

    for row in rows {
        lines.push(format!(
            "| {} |",
            row.iter()
                .enumerate()
                .map(|(index, cell)| format!("{cell:<width$}", width = widths[index]))
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }

    lines.push(border);
    lines.join("\n")
}

fn project_json(project: &Project) -> Value {
    json!({
        "id": project.id,
        "name": project.name,
        "created_at": project.created_at
    })
}

fn task_json(task: &Task, board: &Board<'_, Database>) -> Value {
    let status = task.status_id.and_then(|id| board.statuses().get(id));
    json!({
        "id": task.id,
        "project_id": task.project_id,
        "status_id": task.status_id,
        "status": status.map(status_json),
        "title": task.title,
        "description": task.description,
        "due_date": task.due_date,
        "estimate_minutes": task.estimate_minutes,
        "priority": task.priority.as_str(),
        "position": task.position,
        "created_at": task.created_at,
        "updated_at": task.updated_at
    })
}

fn status_json(status: &ProjectStatus) -> Value {
    json!({
        "id": status.id,
        "project_id": status.project_id,
        "name": status.name,
        "color": status.color.as_str(),
        "is_done_status": status.is_done_status,
        "position": status.position
    })
}

fn usage_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 2,
        code,
        message: message.into(),
        details: None,
    }
}

fn not_found_error(code: &'static str, message: impl Into<String>) -> CliError {
    CliError {
        exit_code: 3,
        code,
        message: message.into(),
        details: None,
    }
}

fn conflict_error(
    code: &'static str,
    message: impl Into<String>,
    details: Option<Value>,
) -> CliError {
    CliError {
        exit_code: 4,
        code,
        message: message.into(),
        details,
    }
}

fn runtime_error(err: impl std::fmt::Display) -> CliError {
    CliError {
        exit_code: 5,
        code: "RUNTIME_ERROR",
        message: err.to_string(),
        details: None,
    }
}

fn classify_editor_error(err: anyhow::Error) -> CliError {
    let message = err.to_string();
    if message.contains("no status named") {
        return not_found_error("STATUS_NOT_FOUND", message);
    }
    if message.contains("already exists") {
        return conflict_error("STATUS_NAME_TAKEN", message, None);
    }
    if message.contains("cannot remove the last status") {
        return conflict_error("STATUS_SET_MINIMUM", message, None);
    }
    if message.contains("cannot be empty") || message.contains("out of range") {
        return usage_error("STATUS_INVALID", message);
    }
    runtime_error(format_anyhow_error_chain(&err))
}

fn classify_db_error(err: anyhow::Error) -> CliError {
    let top_message = err.to_string();

    if let Some(detail) = find_constraint_detail(&err, "UNIQUE constraint failed") {
        let message = if top_message.contains(&detail) {
            top_message
        } else {
            format!("{top_message}: {detail}")
        };
        return conflict_error("UNIQUE_CONSTRAINT", message, None);
    }

    if top_message.contains("cannot be empty") {
        return usage_error("INPUT_INVALID", top_message);
    }

    let message = format_anyhow_error_chain(&err);
    runtime_error(message)
}

fn print_success(output: CommandOutput, json_output: bool, quiet: bool) {
    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "command": output.command,
            "project": output.project,
            "data": output.data
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => println!("{value}"),
            Err(_) => println!("{}", payload),
        }
        return;
    }

    if quiet {
        return;
    }

    if output.text.is_empty() {
        println!("ok");
    } else {
        println!("{}", output.text);
    }
}

fn print_error(err: &CliError, json_output: bool) {
    error!(
        code = err.code,
        message = %err.message,
        details = ?err.details,
        "cli command failed"
    );

    if json_output {
        let payload = json!({
            "schema_version": SCHEMA_VERSION,
            "error": {
                "code": err.code,
                "message": err.message,
                "details": err.details
            }
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(value) => eprintln!("{value}"),
            Err(_) => eprintln!("{}", payload),
        }
        return;
    }

    eprintln!("error[{}]: {}", err.code, err.message);
}

fn format_anyhow_error_chain(err: &anyhow::Error) -> String {
    let mut seen = HashSet::new();
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if seen.contains(&text) {
            continue;
        }
        seen.insert(text.clone());
        parts.push(text);
    }

    parts.join(": ")
}

fn find_constraint_detail(err: &anyhow::Error, needle: &str) -> Option<String> {
    let mut best: Option<String> = None;
    for cause in err.chain() {
        let message = cause.to_string();
        if !message.contains(needle) {
            continue;
        }

        best = match best {
            Some(existing) if existing.len() <= message.len() => Some(existing),
            _ => Some(message),
        };
    }
    best
}
