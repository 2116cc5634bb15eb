//! In-memory ordered collection of one project's tasks.

use uuid::Uuid;

use crate::types::{Task, TaskFieldEdit};

/// Owned model of the project's tasks in global `position` order. Every
/// mutation the board performs goes through one of the methods here, which is
/// where the ordering invariant is enforced.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.index_of(id).is_some()
    }

    /// Replace the whole collection, e.g. from a fresh store read.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Set `status_id` in memory only. Position is left untouched: the single
    /// global order also decides intra-column order.
    pub fn set_status(&mut self, id: Uuid, status_id: Option<Uuid>) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                task.status_id = status_id;
                true
            }
            None => false,
        }
    }

    pub fn apply_edit(&mut self, id: Uuid, edit: &TaskFieldEdit) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            return false;
        };
        match edit {
            TaskFieldEdit::Title(title) => task.title = title.clone(),
            TaskFieldEdit::Description(description) => task.description = description.clone(),
            TaskFieldEdit::DueDate(due_date) => task.due_date = due_date.clone(),
            TaskFieldEdit::Estimate(estimate) => task.estimate_minutes = *estimate,
            TaskFieldEdit::Priority(priority) => task.priority = *priority,
            TaskFieldEdit::Status(status_id) => task.status_id = *status_id,
        }
        true
    }

    pub fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Task> {
        let index = self.index_of(id)?;
        Some(self.tasks.remove(index))
    }

    /// Array-move: take the item at `from`, reinsert at `to`; everything in
    /// between shifts by one. Afterwards every task's `position` is rewritten
    /// to its index, restoring the dense 0..n-1 permutation.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.tasks.len() || to >= self.tasks.len() || from == to {
            return;
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        self.renumber();
    }

    fn renumber(&mut self) {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.position = index as i64;
        }
    }

    /// Ids and new positions of every task whose persisted position no longer
    /// matches `before`, in increasing target-index order.
    pub fn changed_positions(&self, before: &[Task]) -> Vec<(Uuid, i64)> {
        self.tasks
            .iter()
            .filter(|task| {
                before
                    .iter()
                    .find(|old| old.id == task.id)
                    .is_none_or(|old| old.position != task.position)
            })
            .map(|task| (task.id, task.position))
            .collect()
    }

    /// True when the position set is exactly {0..n-1}.
    pub fn positions_are_dense(&self) -> bool {
        let mut positions: Vec<i64> = self.tasks.iter().map(|task| task.position).collect();
        positions.sort_unstable();
        positions
            .iter()
            .enumerate()
            .all(|(index, position)| *position == index as i64)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use uuid::Uuid;

    use crate::types::{Priority, Task};

    pub fn task(project_id: Uuid, status_id: Option<Uuid>, title: &str, position: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            project_id,
            status_id,
            title: title.to_string(),
            description: None,
            due_date: None,
            estimate_minutes: None,
            priority: Priority::Medium,
            position,
            created_at: "2026-08-01T00:00:00Z".to_string(),
            updated_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }
}
