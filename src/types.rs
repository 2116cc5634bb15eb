use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

/// Task priority, a fixed small enumeration stored as lowercase text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => anyhow::bail!("unknown priority '{other}'"),
        }
    }
}

/// Fixed palette of column colors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
pub enum StatusColor {
    #[default]
    Gray,
    Blue,
    Cyan,
    Green,
    Yellow,
    Orange,
    Red,
    Purple,
    Pink,
}

impl StatusColor {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusColor::Gray => "gray",
            StatusColor::Blue => "blue",
            StatusColor::Cyan => "cyan",
            StatusColor::Green => "green",
            StatusColor::Yellow => "yellow",
            StatusColor::Orange => "orange",
            StatusColor::Red => "red",
            StatusColor::Purple => "purple",
            StatusColor::Pink => "pink",
        }
    }

    pub const PALETTE: [StatusColor; 9] = [
        StatusColor::Gray,
        StatusColor::Blue,
        StatusColor::Cyan,
        StatusColor::Green,
        StatusColor::Yellow,
        StatusColor::Orange,
        StatusColor::Red,
        StatusColor::Purple,
        StatusColor::Pink,
    ];

    pub fn next(self) -> StatusColor {
        let idx = Self::PALETTE
            .iter()
            .position(|color| *color == self)
            .unwrap_or(0);
        Self::PALETTE[(idx + 1) % Self::PALETTE.len()]
    }
}

impl FromStr for StatusColor {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::PALETTE
            .iter()
            .copied()
            .find(|color| color.as_str() == raw.trim().to_ascii_lowercase())
            .ok_or_else(|| anyhow::anyhow!("unknown status color '{}'", raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    /// None means unassigned; such tasks are legal but excluded from board columns.
    pub status_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub estimate_minutes: Option<i64>,
    pub priority: Priority,
    /// Place in the single global order of the project's tasks. Dense
    /// (0..n-1) after every reorder this system performs; gaps may be
    /// inherited from create/delete and are not renumbered opportunistically.
    pub position: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ProjectStatus {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub color: StatusColor,
    /// Not unique: zero or more statuses of a project may represent completion.
    pub is_done_status: bool,
    pub position: i64,
}

/// Id-less status tuple used for seeding defaults, templates, bulk replace,
/// and cross-project copy.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct StatusSeed {
    pub name: String,
    pub color: StatusColor,
    pub is_done_status: bool,
}

impl StatusSeed {
    pub fn new(name: impl Into<String>, color: StatusColor, is_done_status: bool) -> Self {
        Self {
            name: name.into(),
            color,
            is_done_status,
        }
    }
}

impl From<&ProjectStatus> for StatusSeed {
    fn from(status: &ProjectStatus) -> Self {
        Self {
            name: status.name.clone(),
            color: status.color,
            is_done_status: status.is_done_status,
        }
    }
}

/// The 4-stage set seeded into a project that has no statuses yet.
pub fn default_status_seeds() -> Vec<StatusSeed> {
    vec![
        StatusSeed::new("Backlog", StatusColor::Gray, false),
        StatusSeed::new("In Progress", StatusColor::Blue, false),
        StatusSeed::new("In Review", StatusColor::Yellow, false),
        StatusSeed::new("Done", StatusColor::Green, true),
    ]
}

/// Single-field edit applied straight through the Task Store Adapter,
/// bypassing the drop resolver (inline list-view edits).
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TaskFieldEdit {
    Title(String),
    Description(Option<String>),
    DueDate(Option<String>),
    Estimate(Option<i64>),
    Priority(Priority),
    Status(Option<Uuid>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_strings() {
        for priority in Priority::ALL {
            assert_eq!(priority.as_str().parse::<Priority>().unwrap(), priority);
        }
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn status_color_parses_case_insensitively() {
        assert_eq!("Blue".parse::<StatusColor>().unwrap(), StatusColor::Blue);
        assert_eq!(" pink ".parse::<StatusColor>().unwrap(), StatusColor::Pink);
        assert!("magenta".parse::<StatusColor>().is_err());
    }

    #[test]
    fn status_color_next_cycles_the_palette() {
        let mut color = StatusColor::Gray;
        for _ in 0..StatusColor::PALETTE.len() {
            color = color.next();
        }
        assert_eq!(color, StatusColor::Gray);
    }

    #[test]
    fn default_seeds_are_four_stages_last_done() {
        let seeds = default_status_seeds();
        assert_eq!(seeds.len(), 4);
        assert!(seeds[3].is_done_status);
        assert!(seeds[..3].iter().all(|seed| !seed.is_done_status));
    }

    #[test]
    fn seed_from_status_strips_identity() {
        let status = ProjectStatus {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "Client Review".to_string(),
            color: StatusColor::Purple,
            is_done_status: false,
            position: 3,
        };
        let seed = StatusSeed::from(&status);
        assert_eq!(seed.name, "Client Review");
        assert_eq!(seed.color, StatusColor::Purple);
        assert!(!seed.is_done_status);
    }
}
