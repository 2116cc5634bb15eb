//! Draft-based status set editing.
//!
//! Edits accumulate in an id-less draft and hit the store only on
//! [`StatusEditor::save`], which replaces the project's whole status set in
//! one destructive pass. The draft can never shrink to zero entries.

use std::str::FromStr;

use anyhow::{Context, Result, bail};
use tracing::info;
use uuid::Uuid;

use super::store::StatusStore;
use crate::types::{ProjectStatus, StatusColor, StatusSeed};

/// Built-in status set templates.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StatusTemplate {
    Basic,
    Kanban,
    Freelance,
}

impl StatusTemplate {
    pub const ALL: [StatusTemplate; 3] = [
        StatusTemplate::Basic,
        StatusTemplate::Kanban,
        StatusTemplate::Freelance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusTemplate::Basic => "basic",
            StatusTemplate::Kanban => "kanban",
            StatusTemplate::Freelance => "freelance",
        }
    }

    pub fn seeds(self) -> Vec<StatusSeed> {
        match self {
            StatusTemplate::Basic => vec![
                StatusSeed::new("To Do", StatusColor::Gray, false),
                StatusSeed::new("Doing", StatusColor::Blue, false),
                StatusSeed::new("Done", StatusColor::Green, true),
            ],
            StatusTemplate::Kanban => crate::types::default_status_seeds(),
            StatusTemplate::Freelance => vec![
                StatusSeed::new("Inbox", StatusColor::Gray, false),
                StatusSeed::new("Quoted", StatusColor::Cyan, false),
                StatusSeed::new("In Progress", StatusColor::Blue, false),
                StatusSeed::new("Client Review", StatusColor::Purple, false),
                StatusSeed::new("Invoiced", StatusColor::Yellow, true),
                StatusSeed::new("Paid", StatusColor::Green, true),
            ],
        }
    }
}

impl FromStr for StatusTemplate {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|template| template.as_str() == raw.trim().to_ascii_lowercase())
            .ok_or_else(|| anyhow::anyhow!("unknown status template '{}'", raw))
    }
}

#[derive(Debug, Clone)]
pub struct StatusEditor {
    project_id: Uuid,
    draft: Vec<StatusSeed>,
}

impl StatusEditor {
    /// Open a draft from the project's current statuses. Ids are stripped;
    /// saving mints fresh ones.
    pub fn from_statuses(project_id: Uuid, statuses: &[ProjectStatus]) -> Self {
        Self {
            project_id,
            draft: statuses.iter().map(StatusSeed::from).collect(),
        }
    }

    pub fn draft(&self) -> &[StatusSeed] {
        &self.draft
    }

    pub fn add(&mut self, name: &str, color: StatusColor, is_done_status: bool) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("status name cannot be empty");
        }
        if self.index_of(name).is_some() {
            bail!("a status named '{name}' already exists");
        }
        self.draft.push(StatusSeed::new(name, color, is_done_status));
        Ok(())
    }

    /// Remove the named status. The last remaining entry cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let index = self.require(name)?;
        if self.draft.len() == 1 {
            bail!("cannot remove the last status; a project needs at least one");
        }
        self.draft.remove(index);
        Ok(())
    }

    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<()> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            bail!("status name cannot be empty");
        }
        let index = self.require(name)?;
        if let Some(existing) = self.index_of(new_name)
            && existing != index
        {
            bail!("a status named '{new_name}' already exists");
        }
        self.draft[index].name = new_name.to_string();
        Ok(())
    }

    pub fn recolor(&mut self, name: &str, color: StatusColor) -> Result<()> {
        let index = self.require(name)?;
        self.draft[index].color = color;
        Ok(())
    }

    pub fn set_done(&mut self, name: &str, is_done_status: bool) -> Result<()> {
        let index = self.require(name)?;
        self.draft[index].is_done_status = is_done_status;
        Ok(())
    }

    /// Array-move within the draft; position follows index on save.
    pub fn reorder(&mut self, name: &str, to: usize) -> Result<()> {
        let from = self.require(name)?;
        if to >= self.draft.len() {
            bail!("target position {to} is out of range (0..{})", self.draft.len() - 1);
        }
        let seed = self.draft.remove(from);
        self.draft.insert(to, seed);
        Ok(())
    }

    /// Replace the draft with a built-in template.
    pub fn apply_template(&mut self, template: StatusTemplate) {
        self.draft = template.seeds();
    }

    /// Replace the draft with another project's statuses, identity stripped.
    pub fn copy_from(&mut self, statuses: &[ProjectStatus]) -> Result<()> {
        if statuses.is_empty() {
            bail!("source project has no statuses to copy");
        }
        self.draft = statuses.iter().map(StatusSeed::from).collect();
        Ok(())
    }

    /// Persist the draft: the store deletes the existing set and inserts the
    /// draft rows with dense positions. The write is not atomic; if it fails
    /// partway the project may be left with a partial set, so the error tells
    /// the caller to re-run the save.
    pub fn save<S: StatusStore>(self, store: &S) -> Result<Vec<ProjectStatus>> {
        if self.draft.is_empty() {
            bail!("cannot save an empty status set");
        }
        let saved = store
            .replace_statuses(self.project_id, &self.draft)
            .context(
                "saving statuses failed and may have left a partial set; run the save again",
            )?;
        info!(project_id = %self.project_id, count = saved.len(), "statuses saved");
        Ok(saved)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        let needle = name.trim().to_ascii_lowercase();
        self.draft
            .iter()
            .position(|seed| seed.name.to_ascii_lowercase() == needle)
    }

    fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .with_context(|| format!("no status named '{}' in the draft", name.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::statuses::test_support::status;

    fn editor() -> StatusEditor {
        let project_id = Uuid::new_v4();
        let statuses = vec![
            status(project_id, "Backlog", false, 0),
            status(project_id, "Doing", false, 1),
            status(project_id, "Done", true, 2),
        ];
        StatusEditor::from_statuses(project_id, &statuses)
    }

    #[test]
    fn add_rejects_empty_and_duplicate_names() {
        let mut editor = editor();
        assert!(editor.add("  ", StatusColor::Red, false).is_err());
        assert!(editor.add("doing", StatusColor::Red, false).is_err());
        assert!(editor.add("Blocked", StatusColor::Red, false).is_ok());
        assert_eq!(editor.draft().len(), 4);
    }

    #[test]
    fn remove_refuses_to_empty_the_draft() {
        let project_id = Uuid::new_v4();
        let only = vec![status(project_id, "Everything", false, 0)];
        let mut editor = StatusEditor::from_statuses(project_id, &only);

        assert!(editor.remove("Everything").is_err());
        assert_eq!(editor.draft().len(), 1);
    }

    #[test]
    fn remove_unknown_name_is_an_error() {
        let mut editor = editor();
        assert!(editor.remove("Archive").is_err());
        assert_eq!(editor.draft().len(), 3);
    }

    #[test]
    fn rename_allows_case_change_of_same_entry() {
        let mut editor = editor();
        assert!(editor.rename("backlog", "BACKLOG").is_ok());
        assert_eq!(editor.draft()[0].name, "BACKLOG");
        assert!(editor.rename("doing", "done").is_err());
    }

    #[test]
    fn reorder_moves_entry_to_index() {
        let mut editor = editor();
        editor.reorder("Done", 0).unwrap();
        let names: Vec<&str> = editor.draft().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Done", "Backlog", "Doing"]);
        assert!(editor.reorder("Done", 9).is_err());
    }

    #[test]
    fn templates_have_at_least_one_done_stage() {
        for template in StatusTemplate::ALL {
            let seeds = template.seeds();
            assert!(!seeds.is_empty(), "{} is empty", template.as_str());
            assert!(
                seeds.iter().any(|seed| seed.is_done_status),
                "{} has no done stage",
                template.as_str()
            );
        }
    }

    #[test]
    fn template_parses_from_name() {
        assert_eq!(
            "freelance".parse::<StatusTemplate>().unwrap(),
            StatusTemplate::Freelance
        );
        assert!("scrumfall".parse::<StatusTemplate>().is_err());
    }

    #[test]
    fn copy_from_strips_identity_and_rejects_empty_source() {
        let mut editor = editor();
        let other_project = Uuid::new_v4();
        let source = vec![
            status(other_project, "Inbox", false, 0),
            status(other_project, "Shipped", true, 1),
        ];

        editor.copy_from(&source).unwrap();
        assert_eq!(editor.draft().len(), 2);
        assert_eq!(editor.draft()[1].name, "Shipped");

        assert!(editor.copy_from(&[]).is_err());
    }
}
