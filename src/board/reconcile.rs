//! Optimistic apply-then-persist with re-fetch rollback.
//!
//! Mutations are applied to the in-memory collection first so the caller sees
//! the result immediately, then written through the store. When a write fails
//! the collection is reloaded from the store wholesale rather than patched
//! back by hand, so memory ends up matching whatever the store actually holds,
//! including the partial result of an interrupted bulk position write.

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

use super::resolve::DropAction;
use super::store::TaskStore;
use super::tasks::TaskCollection;
use crate::types::TaskFieldEdit;

#[derive(Debug)]
pub enum ApplyOutcome {
    Noop,
    ReassignedStatus {
        task_id: Uuid,
        status_id: Uuid,
    },
    /// Reorder persisted; `moved` counts the tasks whose position changed.
    Reordered {
        moved: usize,
    },
    EditedField {
        task_id: Uuid,
    },
    /// A write failed and the collection was reloaded from the store.
    RolledBack {
        error: anyhow::Error,
    },
}

/// Apply a resolved drop to the collection and persist it. Errors are only
/// returned when the rollback re-fetch itself fails; persistence failures
/// surface as [`ApplyOutcome::RolledBack`].
pub fn apply_and_persist<S: TaskStore>(
    store: &S,
    project_id: Uuid,
    tasks: &mut TaskCollection,
    action: DropAction,
) -> Result<ApplyOutcome> {
    match action {
        DropAction::Noop => Ok(ApplyOutcome::Noop),
        DropAction::ReassignStatus { task_id, status_id } => {
            tasks.set_status(task_id, Some(status_id));
            match store.update_task_status(task_id, Some(status_id)) {
                Ok(()) => Ok(ApplyOutcome::ReassignedStatus { task_id, status_id }),
                Err(error) => {
                    warn!(%task_id, %error, "status write failed, reloading tasks");
                    rollback(store, project_id, tasks)?;
                    Ok(ApplyOutcome::RolledBack { error })
                }
            }
        }
        DropAction::Reorder { task_id, from, to } => {
            let before = tasks.snapshot();
            tasks.move_item(from, to);
            let changed = tasks.changed_positions(&before);

            // One UPDATE per shifted row, best effort: a failure is recorded
            // and the remaining writes still run, then the store decides the
            // final state via the rollback re-fetch.
            let mut first_error = None;
            for (id, position) in &changed {
                if let Err(error) = store.update_task_position(*id, *position) {
                    warn!(task_id = %id, position, %error, "position write failed");
                    first_error.get_or_insert(error);
                }
            }

            match first_error {
                None => Ok(ApplyOutcome::Reordered {
                    moved: changed.len(),
                }),
                Some(error) => {
                    warn!(%task_id, "reorder incomplete, reloading tasks");
                    rollback(store, project_id, tasks)?;
                    Ok(ApplyOutcome::RolledBack { error })
                }
            }
        }
    }
}

/// Apply a single-field edit and persist it, with the same rollback contract
/// as [`apply_and_persist`].
pub fn apply_edit_and_persist<S: TaskStore>(
    store: &S,
    project_id: Uuid,
    tasks: &mut TaskCollection,
    task_id: Uuid,
    edit: &TaskFieldEdit,
) -> Result<ApplyOutcome> {
    if !tasks.apply_edit(task_id, edit) {
        return Ok(ApplyOutcome::Noop);
    }
    match store.update_task_field(task_id, edit) {
        Ok(()) => Ok(ApplyOutcome::EditedField { task_id }),
        Err(error) => {
            warn!(%task_id, %error, "field write failed, reloading tasks");
            rollback(store, project_id, tasks)?;
            Ok(ApplyOutcome::RolledBack { error })
        }
    }
}

fn rollback<S: TaskStore>(store: &S, project_id: Uuid, tasks: &mut TaskCollection) -> Result<()> {
    let fresh = store
        .list_tasks(project_id)
        .context("failed to reload tasks after a write error")?;
    tasks.replace(fresh);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use anyhow::bail;

    use super::*;
    use crate::board::tasks::test_support::task;
    use crate::types::Task;

    /// Scripted store: remembers writes, optionally fails the nth position
    /// update, and serves a fixed task list for rollback re-fetches.
    struct ScriptedStore {
        served: Vec<Task>,
        fail_position_write: Option<usize>,
        position_attempts: Cell<usize>,
        position_writes: RefCell<Vec<(Uuid, i64)>>,
        status_writes: RefCell<Vec<(Uuid, Option<Uuid>)>>,
    }

    impl ScriptedStore {
        fn serving(served: Vec<Task>) -> Self {
            Self {
                served,
                fail_position_write: None,
                position_attempts: Cell::new(0),
                position_writes: RefCell::new(Vec::new()),
                status_writes: RefCell::new(Vec::new()),
            }
        }
    }

    impl TaskStore for ScriptedStore {
        fn list_tasks(&self, _project_id: Uuid) -> Result<Vec<Task>> {
            Ok(self.served.clone())
        }

        fn create_task(
            &self,
            _project_id: Uuid,
            _status_id: Option<Uuid>,
            _title: &str,
            _position: i64,
        ) -> Result<Task> {
            bail!("not scripted")
        }

        fn update_task_status(&self, task_id: Uuid, status_id: Option<Uuid>) -> Result<()> {
            self.status_writes.borrow_mut().push((task_id, status_id));
            Ok(())
        }

        fn update_task_position(&self, task_id: Uuid, position: i64) -> Result<()> {
            let attempt = self.position_attempts.get();
            self.position_attempts.set(attempt + 1);
            if self.fail_position_write == Some(attempt) {
                bail!("disk on fire");
            }
            self.position_writes.borrow_mut().push((task_id, position));
            Ok(())
        }

        fn update_task_field(&self, _task_id: Uuid, _edit: &TaskFieldEdit) -> Result<()> {
            bail!("not scripted")
        }

        fn delete_task(&self, _task_id: Uuid) -> Result<()> {
            Ok(())
        }
    }

    fn collection_of(count: usize) -> TaskCollection {
        let project_id = Uuid::new_v4();
        TaskCollection::new(
            (0..count)
                .map(|index| task(project_id, None, &format!("t{index}"), index as i64))
                .collect(),
        )
    }

    #[test]
    fn noop_touches_nothing() {
        let mut tasks = collection_of(2);
        let before = tasks.snapshot();
        let store = ScriptedStore::serving(Vec::new());

        let outcome =
            apply_and_persist(&store, Uuid::new_v4(), &mut tasks, DropAction::Noop).unwrap();

        assert!(matches!(outcome, ApplyOutcome::Noop));
        assert_eq!(tasks.tasks(), before.as_slice());
        assert!(store.position_writes.borrow().is_empty());
        assert!(store.status_writes.borrow().is_empty());
    }

    #[test]
    fn reassign_writes_status_once() {
        let mut tasks = collection_of(2);
        let task_id = tasks.tasks()[0].id;
        let status_id = Uuid::new_v4();
        let store = ScriptedStore::serving(Vec::new());

        let outcome = apply_and_persist(
            &store,
            Uuid::new_v4(),
            &mut tasks,
            DropAction::ReassignStatus { task_id, status_id },
        )
        .unwrap();

        assert!(matches!(outcome, ApplyOutcome::ReassignedStatus { .. }));
        assert_eq!(
            store.status_writes.borrow().as_slice(),
            &[(task_id, Some(status_id))]
        );
        assert_eq!(tasks.get(task_id).unwrap().status_id, Some(status_id));
        assert_eq!(tasks.get(task_id).unwrap().position, 0);
    }

    #[test]
    fn reorder_persists_only_shifted_rows() {
        let mut tasks = collection_of(4);
        let task_id = tasks.tasks()[3].id;
        let store = ScriptedStore::serving(Vec::new());

        let outcome = apply_and_persist(
            &store,
            Uuid::new_v4(),
            &mut tasks,
            DropAction::Reorder {
                task_id,
                from: 3,
                to: 1,
            },
        )
        .unwrap();

        assert!(matches!(outcome, ApplyOutcome::Reordered { moved: 3 }));
        assert_eq!(store.position_writes.borrow().len(), 3);
        assert!(tasks.positions_are_dense());
    }

    #[test]
    fn failed_position_write_continues_then_reloads() {
        let mut tasks = collection_of(4);
        let task_id = tasks.tasks()[0].id;
        // What the store claims after the partial write.
        let served = tasks.snapshot();
        let mut store = ScriptedStore::serving(served.clone());
        store.fail_position_write = Some(1);

        let outcome = apply_and_persist(
            &store,
            Uuid::new_v4(),
            &mut tasks,
            DropAction::Reorder {
                task_id,
                from: 0,
                to: 3,
            },
        )
        .unwrap();

        assert!(matches!(outcome, ApplyOutcome::RolledBack { .. }));
        // 4 rows shift; the second write fails, the other 3 still happen.
        assert_eq!(store.position_writes.borrow().len(), 3);
        assert_eq!(tasks.tasks(), served.as_slice());
    }

    #[test]
    fn edit_on_unknown_task_is_noop() {
        let mut tasks = collection_of(1);
        let store = ScriptedStore::serving(Vec::new());
        let outcome = apply_edit_and_persist(
            &store,
            Uuid::new_v4(),
            &mut tasks,
            Uuid::new_v4(),
            &TaskFieldEdit::Title("x".into()),
        )
        .unwrap();
        assert!(matches!(outcome, ApplyOutcome::Noop));
    }
}
