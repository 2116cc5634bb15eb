//! Read-only projections of the board state.

use uuid::Uuid;

use super::statuses::StatusSet;
use super::tasks::TaskCollection;
use crate::types::{Priority, ProjectStatus, Task};

/// Composable task filter shared by the board and list projections. All set
/// criteria must match.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub status: Option<Uuid>,
    pub priority: Option<Priority>,
    /// Drop tasks sitting in a done-flagged column. Unassigned tasks are
    /// never considered done.
    pub hide_done: bool,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, statuses: &StatusSet) -> bool {
        if let Some(status) = self.status
            && task.status_id != Some(status)
        {
            return false;
        }
        if let Some(priority) = self.priority
            && task.priority != priority
        {
            return false;
        }
        if self.hide_done && statuses.is_done(task.status_id) {
            return false;
        }
        true
    }
}

/// One rendered column: a status plus its tasks in global-position order.
#[derive(Debug)]
pub struct BoardColumn<'a> {
    pub status: &'a ProjectStatus,
    pub tasks: Vec<&'a Task>,
}

/// Group tasks under their status, columns in status-position order. Tasks
/// that are unassigned or reference a deleted status appear in no column.
pub fn board_columns<'a>(
    tasks: &'a TaskCollection,
    statuses: &'a StatusSet,
    filter: &TaskFilter,
) -> Vec<BoardColumn<'a>> {
    statuses
        .statuses()
        .iter()
        .map(|status| BoardColumn {
            status,
            tasks: tasks
                .tasks()
                .iter()
                .filter(|task| task.status_id == Some(status.id))
                .filter(|task| filter.matches(task, statuses))
                .collect(),
        })
        .collect()
}

/// Flat projection in global-position order, dangling references included.
pub fn list_rows<'a>(
    tasks: &'a TaskCollection,
    statuses: &StatusSet,
    filter: &TaskFilter,
) -> Vec<&'a Task> {
    tasks
        .tasks()
        .iter()
        .filter(|task| filter.matches(task, statuses))
        .collect()
}
