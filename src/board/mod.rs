//! Board engine: one project's tasks and statuses, the drag lifecycle, and
//! the write paths that keep memory and store agreeing.

pub mod drag;
pub mod editor;
pub mod reconcile;
pub mod resolve;
pub mod statuses;
pub mod store;
pub mod tasks;
pub mod view;

use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

pub use drag::{DragController, DragSession};
pub use editor::{StatusEditor, StatusTemplate};
pub use reconcile::ApplyOutcome;
pub use resolve::{DropAction, resolve_drop};
pub use statuses::StatusSet;
pub use store::{StatusStore, TaskStore};
pub use tasks::TaskCollection;
pub use view::{BoardColumn, TaskFilter, board_columns, list_rows};

use crate::types::{ProjectStatus, Task, TaskFieldEdit, default_status_seeds};

/// Controller for one project's board. Rebuilt wholesale when the caller
/// switches projects.
pub struct Board<'a, S: TaskStore + StatusStore> {
    store: &'a S,
    project_id: Uuid,
    tasks: TaskCollection,
    statuses: StatusSet,
    drag: DragController,
}

impl<'a, S: TaskStore + StatusStore> Board<'a, S> {
    /// Load the project's statuses and tasks. A project with zero statuses
    /// gets the default 4-stage set seeded before the first read returns.
    pub fn load(store: &'a S, project_id: Uuid) -> Result<Self> {
        let mut statuses = store
            .list_statuses(project_id)
            .context("failed to load statuses")?;
        if statuses.is_empty() {
            info!(%project_id, "project has no statuses, seeding defaults");
            statuses = store
                .create_default_statuses(project_id, &default_status_seeds())
                .context("failed to seed default statuses")?;
        }
        let tasks = store
            .list_tasks(project_id)
            .context("failed to load tasks")?;
        Ok(Self {
            store,
            project_id,
            tasks: TaskCollection::new(tasks),
            statuses: StatusSet::new(statuses),
            drag: DragController::default(),
        })
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.tasks
    }

    pub fn statuses(&self) -> &StatusSet {
        &self.statuses
    }

    pub fn drag_is_active(&self) -> bool {
        self.drag.is_active()
    }

    pub fn drag_begin(&mut self, task_id: Uuid) -> bool {
        self.drag.begin(task_id, &self.tasks)
    }

    pub fn drag_hover(&mut self, target: Option<Uuid>) {
        self.drag
            .update_hover(target, &mut self.tasks, &self.statuses);
    }

    /// Finish the drag. The preview is torn down first so resolution runs
    /// against the pre-session state; the session is gone afterwards whatever
    /// the drop produced. `None` means dropped outside any target.
    pub fn drag_end(&mut self, target: Option<Uuid>) -> Result<ApplyOutcome> {
        let Some(session) = self.drag.take() else {
            return Ok(ApplyOutcome::Noop);
        };
        session.restore(&mut self.tasks);

        let Some(target_id) = target else {
            debug!(task_id = %session.item_id(), "drag ended outside any target");
            return Ok(ApplyOutcome::Noop);
        };
        let action = resolve_drop(session.item_id(), target_id, &self.tasks, &self.statuses);
        reconcile::apply_and_persist(self.store, self.project_id, &mut self.tasks, action)
    }

    pub fn drag_cancel(&mut self) {
        if let Some(session) = self.drag.take() {
            session.restore(&mut self.tasks);
        }
    }

    /// Append a task at the end of the global order.
    pub fn quick_add(&mut self, title: &str, status_id: Option<Uuid>) -> Result<Task> {
        let position = self.tasks.len() as i64;
        let task = self
            .store
            .create_task(self.project_id, status_id, title, position)
            .context("failed to create task")?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Inline single-field edit, bypassing the drop resolver.
    pub fn edit_task(&mut self, task_id: Uuid, edit: &TaskFieldEdit) -> Result<ApplyOutcome> {
        reconcile::apply_edit_and_persist(
            self.store,
            self.project_id,
            &mut self.tasks,
            task_id,
            edit,
        )
    }

    pub fn delete_task(&mut self, task_id: Uuid) -> Result<()> {
        self.store
            .delete_task(task_id)
            .context("failed to delete task")?;
        self.tasks.remove(task_id);
        Ok(())
    }

    pub fn board_view(&self, filter: &TaskFilter) -> Vec<BoardColumn<'_>> {
        board_columns(&self.tasks, &self.statuses, filter)
    }

    pub fn list_view(&self, filter: &TaskFilter) -> Vec<&Task> {
        list_rows(&self.tasks, &self.statuses, filter)
    }

    /// Open a status draft from the current set.
    pub fn status_editor(&self) -> StatusEditor {
        StatusEditor::from_statuses(self.project_id, self.statuses.statuses())
    }

    /// Persist a status draft and adopt the stored result. Save failures are
    /// hard errors; the project may be left mid-replace and the caller should
    /// retry the save.
    pub fn save_statuses(&mut self, editor: StatusEditor) -> Result<&[ProjectStatus]> {
        let saved = editor.save(self.store)?;
        self.statuses = StatusSet::new(saved);
        Ok(self.statuses.statuses())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn board_fixture(db: &Database) -> Board<'_, Database> {
        let project = db.add_project("client-work").unwrap();
        let mut board = Board::load(db, project.id).unwrap();
        let backlog = board.statuses().statuses()[0].id;
        let progress = board.statuses().statuses()[1].id;
        let done = board.statuses().statuses()[3].id;
        board.quick_add("T1", Some(backlog)).unwrap();
        board.quick_add("T2", Some(progress)).unwrap();
        board.quick_add("T3", Some(done)).unwrap();
        board
    }

    #[test]
    fn load_seeds_defaults_for_fresh_project() {
        let db = Database::open(":memory:").unwrap();
        let project = db.add_project("fresh").unwrap();

        let board = Board::load(&db, project.id).unwrap();

        let names: Vec<&str> = board
            .statuses()
            .statuses()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Backlog", "In Progress", "In Review", "Done"]);
        assert!(board.statuses().statuses()[3].is_done_status);
        // Loading again must not seed a second set.
        let again = Board::load(&db, project.id).unwrap();
        assert_eq!(again.statuses().len(), 4);
    }

    #[test]
    fn drop_on_done_column_reassigns_and_keeps_position() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);
        let t1 = board.tasks().tasks()[0].id;
        let done = board.statuses().statuses()[3].id;

        assert!(board.drag_begin(t1));
        board.drag_hover(Some(done));
        let outcome = board.drag_end(Some(done)).unwrap();

        assert!(matches!(outcome, ApplyOutcome::ReassignedStatus { .. }));
        let t1_row = board.tasks().get(t1).unwrap();
        assert_eq!(t1_row.status_id, Some(done));
        assert_eq!(t1_row.position, 0);

        // The store agrees.
        let stored = db.get_task(t1).unwrap();
        assert_eq!(stored.status_id, Some(done));
        assert_eq!(stored.position, 0);
    }

    #[test]
    fn drop_on_card_reorders_without_status_change() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);
        let ids: Vec<Uuid> = board.tasks().tasks().iter().map(|t| t.id).collect();
        let statuses_before: Vec<Option<Uuid>> =
            board.tasks().tasks().iter().map(|t| t.status_id).collect();

        assert!(board.drag_begin(ids[2]));
        let outcome = board.drag_end(Some(ids[0])).unwrap();

        assert!(matches!(outcome, ApplyOutcome::Reordered { .. }));
        let order: Vec<Uuid> = board.tasks().tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
        assert!(board.tasks().positions_are_dense());
        for (id, status) in ids.iter().zip(&statuses_before) {
            assert_eq!(board.tasks().get(*id).unwrap().status_id, *status);
        }

        let stored = db.list_tasks(board.project_id()).unwrap();
        let stored_order: Vec<Uuid> = stored.iter().map(|t| t.id).collect();
        assert_eq!(stored_order, vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn cancelled_drag_leaves_state_and_store_untouched() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);
        let t1 = board.tasks().tasks()[0].id;
        let done = board.statuses().statuses()[3].id;
        let before = board.tasks().snapshot();

        assert!(board.drag_begin(t1));
        board.drag_hover(Some(done));
        board.drag_cancel();

        assert_eq!(board.tasks().tasks(), before.as_slice());
        assert!(!board.drag_is_active());
        let stored = db.list_tasks(board.project_id()).unwrap();
        assert_eq!(stored, before);
    }

    #[test]
    fn drag_end_without_target_is_noop() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);
        let t1 = board.tasks().tasks()[0].id;
        let before = board.tasks().snapshot();

        assert!(board.drag_begin(t1));
        let outcome = board.drag_end(None).unwrap();

        assert!(matches!(outcome, ApplyOutcome::Noop));
        assert_eq!(board.tasks().tasks(), before.as_slice());
    }

    #[test]
    fn quick_add_appends_at_task_count() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);

        let task = board.quick_add("T4", None).unwrap();
        assert_eq!(task.position, 3);
        assert_eq!(board.tasks().len(), 4);
    }

    #[test]
    fn saved_status_draft_replaces_the_set() {
        let db = Database::open(":memory:").unwrap();
        let mut board = board_fixture(&db);

        let mut editor = board.status_editor();
        editor.apply_template(StatusTemplate::Basic);
        let saved = board.save_statuses(editor).unwrap();

        let names: Vec<&str> = saved.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["To Do", "Doing", "Done"]);
        // Old status ids are gone; existing tasks now dangle and fall out of
        // the board projection.
        let columns = board.board_view(&TaskFilter::default());
        assert!(columns.iter().all(|column| column.tasks.is_empty()));
    }
}
