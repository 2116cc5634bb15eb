//! Drop-target disambiguation.
//!
//! At the end of a drag the hover id may name either a status column or a
//! sibling card; both are legitimate `over` candidates from the pointer's
//! perspective. This is the single place that decides which one wins.

use uuid::Uuid;

use super::statuses::StatusSet;
use super::tasks::TaskCollection;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DropAction {
    /// The target is a column the task is not currently in. Position is left
    /// unchanged.
    ReassignStatus { task_id: Uuid, status_id: Uuid },
    /// The target is another card: array-move the dragged task to the
    /// target's index, then renumber.
    Reorder {
        task_id: Uuid,
        from: usize,
        to: usize,
    },
    Noop,
}

/// First match wins:
/// 1. target is a status id differing from the dragged task's current status
///    (column membership beats positional reordering, so dropping a card onto
///    a card in another column changes status, not order);
/// 2. target is a different task present in the collection;
/// 3. anything else is a no-op.
pub fn resolve_drop(
    item_id: Uuid,
    target_id: Uuid,
    tasks: &TaskCollection,
    statuses: &StatusSet,
) -> DropAction {
    let Some(dragged) = tasks.get(item_id) else {
        return DropAction::Noop;
    };

    if statuses.contains(target_id) && dragged.status_id != Some(target_id) {
        return DropAction::ReassignStatus {
            task_id: item_id,
            status_id: target_id,
        };
    }

    if target_id != item_id
        && let (Some(from), Some(to)) = (tasks.index_of(item_id), tasks.index_of(target_id))
    {
        return DropAction::Reorder {
            task_id: item_id,
            from,
            to,
        };
    }

    DropAction::Noop
}
