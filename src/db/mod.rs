use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rusqlite::{Connection, params, types::Type};
use uuid::Uuid;

use crate::types::{Priority, Project, ProjectStatus, StatusColor, StatusSeed, Task, TaskFieldEdit};

pub struct Database {
    conn: Connection,
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdeck")
        .join("taskdeck.sqlite")
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();

        if path_ref != Path::new(":memory:")
            && let Some(parent) = path_ref.parent()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create parent directories for {}",
                    path_ref.display()
                )
            })?;
        }

        let conn = Connection::open(path_ref)
            .with_context(|| format!("failed to open sqlite db at {}", path_ref.display()))?;

        conn.execute("PRAGMA foreign_keys = ON", params![])
            .context("failed to enable foreign keys")?;

        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<()> {
        // tasks.status_id carries no foreign key on purpose: replacing a
        // project's status set deletes every row and may leave tasks pointing
        // at ids that no longer exist. Such tasks render as unassigned.
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS project_statuses (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL REFERENCES projects(id),
                    name TEXT NOT NULL,
                    color TEXT NOT NULL,
                    is_done_status INTEGER NOT NULL DEFAULT 0,
                    position INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL REFERENCES projects(id),
                    status_id TEXT,
                    title TEXT NOT NULL,
                    description TEXT,
                    due_date TEXT,
                    estimate_minutes INTEGER,
                    priority TEXT NOT NULL DEFAULT 'medium',
                    position INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )
            .context("failed to run sqlite migrations")?;
        Ok(())
    }

    pub fn add_project(&self, name: impl AsRef<str>) -> Result<Project> {
        let name = name.as_ref().trim().to_string();
        if name.is_empty() {
            bail!("project name cannot be empty");
        }

        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO projects (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![id.to_string(), name, now_iso()],
            )
            .context("failed to insert project")?;

        self.get_project(id)
    }

    pub fn get_project(&self, id: Uuid) -> Result<Project> {
        self.conn
            .query_row(
                "SELECT id, name, created_at FROM projects WHERE id = ?1",
                params![id.to_string()],
                map_project_row,
            )
            .with_context(|| format!("project {id} not found"))
    }

    pub fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM projects WHERE name = ?1")?;
        let mut rows = stmt.query_map(params![name], map_project_row)?;
        rows.next().transpose().context("failed to load project")
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM projects ORDER BY name ASC")?;

        let projects = stmt
            .query_map(params![], map_project_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load projects")?;
        Ok(projects)
    }

    pub fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, status_id, title, description, due_date,
                    estimate_minutes, priority, position, created_at, updated_at
             FROM tasks WHERE project_id = ?1
             ORDER BY position ASC, created_at ASC",
        )?;

        let tasks = stmt
            .query_map(params![project_id.to_string()], map_task_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load tasks")?;
        Ok(tasks)
    }

    pub fn get_task(&self, id: Uuid) -> Result<Task> {
        self.conn
            .query_row(
                "SELECT id, project_id, status_id, title, description, due_date,
                        estimate_minutes, priority, position, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![id.to_string()],
                map_task_row,
            )
            .with_context(|| format!("task {id} not found"))
    }

    pub fn create_task(
        &self,
        project_id: Uuid,
        status_id: Option<Uuid>,
        title: impl AsRef<str>,
        position: i64,
    ) -> Result<Task> {
        let title = title.as_ref().trim().to_string();
        if title.is_empty() {
            bail!("task title cannot be empty");
        }

        let now = now_iso();
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO tasks (
                    id, project_id, status_id, title, description, due_date,
                    estimate_minutes, priority, position, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    id.to_string(),
                    project_id.to_string(),
                    status_id.map(|value| value.to_string()),
                    title,
                    Option::<String>::None,
                    Option::<String>::None,
                    Option::<i64>::None,
                    Priority::default().as_str(),
                    position,
                    now,
                    now
                ],
            )
            .context("failed to insert task")?;

        self.get_task(id)
    }

    pub fn update_task_status(&self, id: Uuid, status_id: Option<Uuid>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE tasks SET status_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    status_id.map(|value| value.to_string()),
                    now_iso(),
                    id.to_string()
                ],
            )
            .context("failed to update task status")?;
        Ok(())
    }

    pub fn update_task_position(&self, id: Uuid, position: i64) -> Result<()> {
        self.conn
            .execute(
                "UPDATE tasks SET position = ?1, updated_at = ?2 WHERE id = ?3",
                params![position, now_iso(), id.to_string()],
            )
            .context("failed to update task position")?;
        Ok(())
    }

    pub fn update_task_field(&self, id: Uuid, edit: &TaskFieldEdit) -> Result<()> {
        let now = now_iso();
        let changed = match edit {
            TaskFieldEdit::Title(title) => {
                if title.trim().is_empty() {
                    bail!("task title cannot be empty");
                }
                self.conn.execute(
                    "UPDATE tasks SET title = ?1, updated_at = ?2 WHERE id = ?3",
                    params![title.trim(), now, id.to_string()],
                )?
            }
            TaskFieldEdit::Description(description) => self.conn.execute(
                "UPDATE tasks SET description = ?1, updated_at = ?2 WHERE id = ?3",
                params![description, now, id.to_string()],
            )?,
            TaskFieldEdit::DueDate(due_date) => self.conn.execute(
                "UPDATE tasks SET due_date = ?1, updated_at = ?2 WHERE id = ?3",
                params![due_date, now, id.to_string()],
            )?,
            TaskFieldEdit::Estimate(estimate) => self.conn.execute(
                "UPDATE tasks SET estimate_minutes = ?1, updated_at = ?2 WHERE id = ?3",
                params![estimate, now, id.to_string()],
            )?,
            TaskFieldEdit::Priority(priority) => self.conn.execute(
                "UPDATE tasks SET priority = ?1, updated_at = ?2 WHERE id = ?3",
                params![priority.as_str(), now, id.to_string()],
            )?,
            TaskFieldEdit::Status(status_id) => self.conn.execute(
                "UPDATE tasks SET status_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    status_id.map(|value| value.to_string()),
                    now,
                    id.to_string()
                ],
            )?,
        };

        if changed == 0 {
            bail!("task {id} not found");
        }
        Ok(())
    }

    pub fn delete_task(&self, id: Uuid) -> Result<()> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])
            .context("failed to delete task")?;
        Ok(())
    }

    pub fn list_statuses(&self, project_id: Uuid) -> Result<Vec<ProjectStatus>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, color, is_done_status, position
             FROM project_statuses WHERE project_id = ?1 ORDER BY position ASC",
        )?;

        let statuses = stmt
            .query_map(params![project_id.to_string()], map_status_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load statuses")?;
        Ok(statuses)
    }

    /// Destructive replace: deletes every status of the project, then inserts
    /// the seeds one by one with fresh ids and positions 0..n-1. Deliberately
    /// not a single transaction; a failure mid-insert can leave the project
    /// with fewer statuses than the draft (or none), which the caller must
    /// surface as a retryable error.
    pub fn replace_statuses(
        &self,
        project_id: Uuid,
        seeds: &[StatusSeed],
    ) -> Result<Vec<ProjectStatus>> {
        self.conn
            .execute(
                "DELETE FROM project_statuses WHERE project_id = ?1",
                params![project_id.to_string()],
            )
            .context("failed to delete existing statuses")?;

        self.insert_seeds(project_id, seeds)?;
        self.list_statuses(project_id)
    }

    /// Used only when a project has no statuses yet.
    pub fn create_default_statuses(
        &self,
        project_id: Uuid,
        seeds: &[StatusSeed],
    ) -> Result<Vec<ProjectStatus>> {
        self.insert_seeds(project_id, seeds)?;
        self.list_statuses(project_id)
    }

    fn insert_seeds(&self, project_id: Uuid, seeds: &[StatusSeed]) -> Result<()> {
        for (index, seed) in seeds.iter().enumerate() {
            self.conn
                .execute(
                    "INSERT INTO project_statuses
                        (id, project_id, name, color, is_done_status, position)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        project_id.to_string(),
                        seed.name,
                        seed.color.as_str(),
                        seed.is_done_status,
                        index as i64
                    ],
                )
                .with_context(|| format!("failed to insert status '{}'", seed.name))?;
        }
        Ok(())
    }
}

fn map_project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid_column(row.get::<_, String>(0)?, 0)?,
        name: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn map_task_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let priority_raw: String = row.get(7)?;
    let priority = priority_raw.parse::<Priority>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, err.into())
    })?;

    Ok(Task {
        id: parse_uuid_column(row.get::<_, String>(0)?, 0)?,
        project_id: parse_uuid_column(row.get::<_, String>(1)?, 1)?,
        status_id: row
            .get::<_, Option<String>>(2)?
            .map(|value| parse_uuid_column(value, 2))
            .transpose()?,
        title: row.get(3)?,
        description: row.get(4)?,
        due_date: row.get(5)?,
        estimate_minutes: row.get(6)?,
        priority,
        position: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_status_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectStatus> {
    let color_raw: String = row.get(3)?;
    let color = color_raw.parse::<StatusColor>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, err.into())
    })?;

    Ok(ProjectStatus {
        id: parse_uuid_column(row.get::<_, String>(0)?, 0)?,
        project_id: parse_uuid_column(row.get::<_, String>(1)?, 1)?,
        name: row.get(2)?,
        color,
        is_done_status: row.get(4)?,
        position: row.get(5)?,
    })
}

fn parse_uuid_column(value: String, idx: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::default_status_seeds;

    fn open_seeded() -> (Database, Project) {
        let db = Database::open(":memory:").expect("db should open");
        let project = db.add_project("acme-redesign").expect("project should save");
        db.create_default_statuses(project.id, &default_status_seeds())
            .expect("defaults should insert");
        (db, project)
    }

    #[test]
    fn open_creates_database_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("taskdeck.sqlite");
        let _db = Database::open(&path)?;
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn project_names_are_unique() {
        let db = Database::open(":memory:").expect("db should open");
        db.add_project("acme").expect("first insert should work");
        assert!(db.add_project("acme").is_err());
        assert!(db.add_project("   ").is_err());
    }

    #[test]
    fn task_crud_round_trip() -> Result<()> {
        let (db, project) = open_seeded();
        let statuses = db.list_statuses(project.id)?;

        let task = db.create_task(project.id, Some(statuses[0].id), "Write proposal", 0)?;
        assert_eq!(task.position, 0);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status_id, Some(statuses[0].id));

        db.update_task_field(task.id, &TaskFieldEdit::Priority(Priority::Urgent))?;
        db.update_task_field(task.id, &TaskFieldEdit::DueDate(Some("2026-09-01".into())))?;
        db.update_task_field(task.id, &TaskFieldEdit::Estimate(Some(90)))?;
        db.update_task_status(task.id, Some(statuses[2].id))?;
        db.update_task_position(task.id, 4)?;

        let updated = db.get_task(task.id)?;
        assert_eq!(updated.priority, Priority::Urgent);
        assert_eq!(updated.due_date.as_deref(), Some("2026-09-01"));
        assert_eq!(updated.estimate_minutes, Some(90));
        assert_eq!(updated.status_id, Some(statuses[2].id));
        assert_eq!(updated.position, 4);

        db.delete_task(task.id)?;
        assert!(db.get_task(task.id).is_err());
        Ok(())
    }

    #[test]
    fn update_field_on_missing_task_fails() {
        let (db, _project) = open_seeded();
        let err = db.update_task_field(Uuid::new_v4(), &TaskFieldEdit::Estimate(None));
        assert!(err.is_err());
    }

    #[test]
    fn empty_title_is_rejected() {
        let (db, project) = open_seeded();
        assert!(db.create_task(project.id, None, "   ", 0).is_err());
    }

    #[test]
    fn list_tasks_orders_by_position() -> Result<()> {
        let (db, project) = open_seeded();
        let second = db.create_task(project.id, None, "second", 1)?;
        let first = db.create_task(project.id, None, "first", 0)?;

        let tasks = db.list_tasks(project.id)?;
        assert_eq!(tasks[0].id, first.id);
        assert_eq!(tasks[1].id, second.id);
        Ok(())
    }

    #[test]
    fn replace_statuses_renumbers_and_strips_old_rows() -> Result<()> {
        let (db, project) = open_seeded();
        let seeds = vec![
            StatusSeed::new("Inbox", StatusColor::Gray, false),
            StatusSeed::new("Paid", StatusColor::Green, true),
        ];

        let replaced = db.replace_statuses(project.id, &seeds)?;
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced[0].name, "Inbox");
        assert_eq!(replaced[0].position, 0);
        assert_eq!(replaced[1].position, 1);
        assert!(replaced[1].is_done_status);
        Ok(())
    }

    #[test]
    fn tasks_may_keep_dangling_status_after_replace() -> Result<()> {
        let (db, project) = open_seeded();
        let statuses = db.list_statuses(project.id)?;
        let task = db.create_task(project.id, Some(statuses[0].id), "Survivor", 0)?;

        db.replace_statuses(
            project.id,
            &[StatusSeed::new("Only", StatusColor::Blue, false)],
        )?;

        let survivor = db.get_task(task.id)?;
        assert_eq!(survivor.status_id, Some(statuses[0].id));
        let fresh = db.list_statuses(project.id)?;
        assert!(!fresh.iter().any(|status| status.id == statuses[0].id));
        Ok(())
    }

    #[test]
    fn statuses_are_scoped_per_project() -> Result<()> {
        let (db, project) = open_seeded();
        let other = db.add_project("other-client")?;
        db.create_default_statuses(other.id, &default_status_seeds())?;

        db.replace_statuses(other.id, &[StatusSeed::new("Solo", StatusColor::Red, false)])?;

        assert_eq!(db.list_statuses(project.id)?.len(), 4);
        assert_eq!(db.list_statuses(other.id)?.len(), 1);
        Ok(())
    }
}
