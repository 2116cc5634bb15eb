//! Persistence contracts consumed by the board.
//!
//! The board never talks to sqlite directly; it goes through these two
//! traits so tests can substitute scripted stores (including ones that fail
//! partway through a bulk position write).

use anyhow::Result;
use uuid::Uuid;

use crate::db::Database;
use crate::types::{ProjectStatus, StatusSeed, Task, TaskFieldEdit};

pub trait TaskStore {
    /// Tasks of one project ordered by `position` ascending.
    fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>>;

    fn create_task(
        &self,
        project_id: Uuid,
        status_id: Option<Uuid>,
        title: &str,
        position: i64,
    ) -> Result<Task>;

    fn update_task_status(&self, task_id: Uuid, status_id: Option<Uuid>) -> Result<()>;

    fn update_task_position(&self, task_id: Uuid, position: i64) -> Result<()>;

    fn update_task_field(&self, task_id: Uuid, edit: &TaskFieldEdit) -> Result<()>;

    fn delete_task(&self, task_id: Uuid) -> Result<()>;
}

pub trait StatusStore {
    /// Statuses of one project ordered by `position` ascending.
    fn list_statuses(&self, project_id: Uuid) -> Result<Vec<ProjectStatus>>;

    /// The only general write path: delete everything, insert the seeds with
    /// positions 0..n-1.
    fn replace_statuses(&self, project_id: Uuid, seeds: &[StatusSeed])
    -> Result<Vec<ProjectStatus>>;

    /// Batch insert, used only when a project has no statuses at all.
    fn create_default_statuses(
        &self,
        project_id: Uuid,
        seeds: &[StatusSeed],
    ) -> Result<Vec<ProjectStatus>>;
}

impl TaskStore for Database {
    fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>> {
        Database::list_tasks(self, project_id)
    }

    fn create_task(
        &self,
        project_id: Uuid,
        status_id: Option<Uuid>,
        title: &str,
        position: i64,
    ) -> Result<Task> {
        Database::create_task(self, project_id, status_id, title, position)
    }

    fn update_task_status(&self, task_id: Uuid, status_id: Option<Uuid>) -> Result<()> {
        Database::update_task_status(self, task_id, status_id)
    }

    fn update_task_position(&self, task_id: Uuid, position: i64) -> Result<()> {
        Database::update_task_position(self, task_id, position)
    }

    fn update_task_field(&self, task_id: Uuid, edit: &TaskFieldEdit) -> Result<()> {
        Database::update_task_field(self, task_id, edit)
    }

    fn delete_task(&self, task_id: Uuid) -> Result<()> {
        Database::delete_task(self, task_id)
    }
}

impl StatusStore for Database {
    fn list_statuses(&self, project_id: Uuid) -> Result<Vec<ProjectStatus>> {
        Database::list_statuses(self, project_id)
    }

    fn replace_statuses(
        &self,
        project_id: Uuid,
        seeds: &[StatusSeed],
    ) -> Result<Vec<ProjectStatus>> {
        Database::replace_statuses(self, project_id, seeds)
    }

    fn create_default_statuses(
        &self,
        project_id: Uuid,
        seeds: &[StatusSeed],
    ) -> Result<Vec<ProjectStatus>> {
        Database::create_default_statuses(self, project_id, seeds)
    }
}
