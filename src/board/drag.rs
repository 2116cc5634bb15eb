//! Drag session lifecycle.
//!
//! A session captures a snapshot of the task list when it begins. While the
//! drag is live, hover over a status column previews the move by rewriting the
//! dragged task's status in memory. Ending or cancelling first restores the
//! snapshot, so the resolver and any persistence always run against the state
//! the user started from, and an aborted drag leaves nothing behind.

use tracing::debug;
use uuid::Uuid;

use super::statuses::StatusSet;
use super::tasks::TaskCollection;

#[derive(Debug, Clone)]
pub struct DragSession {
    item_id: Uuid,
    hover_target: Option<Uuid>,
    origin: Vec<crate::types::Task>,
}

impl DragSession {
    pub fn item_id(&self) -> Uuid {
        self.item_id
    }

    pub fn hover_target(&self) -> Option<Uuid> {
        self.hover_target
    }

    /// Put the task list back the way it was when the session began.
    pub fn restore(&self, tasks: &mut TaskCollection) {
        tasks.replace(self.origin.clone());
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    session: Option<DragSession>,
}

impl DragController {
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Start a session for `item_id`. Returns false (and changes nothing) if a
    /// session is already live or the task is unknown.
    pub fn begin(&mut self, item_id: Uuid, tasks: &TaskCollection) -> bool {
        if self.session.is_some() || !tasks.contains(item_id) {
            return false;
        }
        debug!(task_id = %item_id, "drag started");
        self.session = Some(DragSession {
            item_id,
            hover_target: None,
            origin: tasks.snapshot(),
        });
        true
    }

    /// Record the current hover target and update the preview. Hovering a
    /// status column shows the dragged task in that column; hovering anything
    /// else (a card, or nothing) shows it back in its original column.
    pub fn update_hover(
        &mut self,
        target: Option<Uuid>,
        tasks: &mut TaskCollection,
        statuses: &StatusSet,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.hover_target = target;

        let preview_status = match target {
            Some(id) if statuses.contains(id) => Some(id),
            _ => session
                .origin
                .iter()
                .find(|task| task.id == session.item_id)
                .and_then(|task| task.status_id),
        };
        tasks.set_status(session.item_id, preview_status);
    }

    /// End the session and hand its state to the caller.
    pub fn take(&mut self) -> Option<DragSession> {
        self.session.take()
    }
}
