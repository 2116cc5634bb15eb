//! In-memory ordered set of one project's statuses.

use std::collections::HashSet;

use uuid::Uuid;

use crate::types::ProjectStatus;

/// The project's columns in `position` order, with derived lookups. The set
/// itself is only replaced wholesale (load or a saved status edit); per-entry
/// mutation happens in the editor draft, never here.
#[derive(Debug, Clone, Default)]
pub struct StatusSet {
    statuses: Vec<ProjectStatus>,
}

impl StatusSet {
    pub fn new(statuses: Vec<ProjectStatus>) -> Self {
        Self { statuses }
    }

    pub fn statuses(&self) -> &[ProjectStatus] {
        &self.statuses
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ProjectStatus> {
        self.statuses.iter().find(|status| status.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ProjectStatus> {
        let needle = name.trim().to_ascii_lowercase();
        self.statuses
            .iter()
            .find(|status| status.name.to_ascii_lowercase() == needle)
    }

    /// Ids of every status flagged as representing completion.
    pub fn done_ids(&self) -> HashSet<Uuid> {
        self.statuses
            .iter()
            .filter(|status| status.is_done_status)
            .map(|status| status.id)
            .collect()
    }

    /// Whether the given task status references a done-flagged column.
    /// Unassigned tasks are never done.
    pub fn is_done(&self, status_id: Option<Uuid>) -> bool {
        status_id
            .and_then(|id| self.get(id))
            .is_some_and(|status| status.is_done_status)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use uuid::Uuid;

    use crate::types::{ProjectStatus, StatusColor};

    pub fn status(project_id: Uuid, name: &str, done: bool, position: i64) -> ProjectStatus {
        ProjectStatus {
            id: Uuid::new_v4(),
            project_id,
            name: name.to_string(),
            color: StatusColor::Gray,
            is_done_status: done,
            position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::status;
    use super::*;

    fn sample() -> StatusSet {
        let project_id = Uuid::new_v4();
        StatusSet::new(vec![
            status(project_id, "Backlog", false, 0),
            status(project_id, "Doing", false, 1),
            status(project_id, "Done", true, 2),
        ])
    }

    #[test]
    fn done_ids_collects_flagged_statuses_only() {
        let set = sample();
        let done = set.done_ids();
        assert_eq!(done.len(), 1);
        assert!(done.contains(&set.statuses()[2].id));
    }

    #[test]
    fn is_done_handles_unassigned_and_unknown_ids() {
        let set = sample();
        assert!(set.is_done(Some(set.statuses()[2].id)));
        assert!(!set.is_done(Some(set.statuses()[0].id)));
        assert!(!set.is_done(None));
        assert!(!set.is_done(Some(Uuid::new_v4())));
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let set = sample();
        assert!(set.find_by_name("backlog").is_some());
        assert!(set.find_by_name("  DONE ").is_some());
        assert!(set.find_by_name("archive").is_none());
    }
}
