//! Goals and the in-memory goal store.
//!
//! A goal is complete exactly when `progress >= target`; there is no stored
//! completion flag. `archived` is the only terminal state and is entered by
//! the user after completion has been shown.

mod store;

pub use store::GoalStore;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::clock::{local_date, Timestamp};
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalCategory {
    Work,
    Health,
    Personal,
}

impl GoalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalCategory::Work => "Work",
            GoalCategory::Health => "Health",
            GoalCategory::Personal => "Personal",
        }
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "work" => Ok(GoalCategory::Work),
            "health" => Ok(GoalCategory::Health),
            "personal" => Ok(GoalCategory::Personal),
            _ => Err(ValidationError::UnknownName {
                kind: "category",
                value: s.to_string(),
            }),
        }
    }
}

/// A tracked goal.
///
/// Serialized with camelCase keys; this is the persisted shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub title: String,
    pub category: GoalCategory,
    pub target: f64,
    #[serde(default)]
    pub progress: f64,
    /// Nominal daily logging time.
    pub time: NaiveTime,
    #[serde(default)]
    pub deadline: Option<Timestamp>,
    #[serde(default)]
    pub milestones: Vec<String>,
    #[serde(default)]
    pub last_logged: Option<Timestamp>,
    /// ISO `YYYY-MM-DD` dates with at least one successful log.
    #[serde(default)]
    pub progress_log: BTreeSet<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub archived: bool,
}

impl Goal {
    /// Build a fresh goal with a generated id.
    ///
    /// # Errors
    /// Returns a validation error for an empty title or a target that is
    /// not a positive finite number.
    pub fn new(
        title: impl Into<String>,
        category: GoalCategory,
        target: f64,
        time: NaiveTime,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::invalid("title", "must not be empty"));
        }
        if !target.is_finite() || target <= 0.0 {
            return Err(ValidationError::invalid(
                "target",
                format!("must be a positive number, got {target}"),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            title,
            category,
            target,
            progress: 0.0,
            time,
            deadline: None,
            milestones: Vec::new(),
            last_logged: None,
            progress_log: BTreeSet::new(),
            created_at,
            archived: false,
        })
    }

    pub fn with_deadline(mut self, deadline: Option<Timestamp>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<String>) -> Self {
        self.milestones = milestones;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= self.target
    }

    pub fn logged_on(&self, iso_date: &str) -> bool {
        self.progress_log.contains(iso_date)
    }

    /// Calendar date of `last_logged` in `now`'s offset.
    pub fn last_logged_date(&self, now: &Timestamp) -> Option<chrono::NaiveDate> {
        self.last_logged.as_ref().map(|ts| local_date(ts, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn created() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 10, 9, 0, 0)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn new_goal_starts_empty() {
        let goal = Goal::new("Run 5k", GoalCategory::Health, 5.0, nine(), created()).unwrap();
        assert_eq!(goal.progress, 0.0);
        assert!(!goal.archived);
        assert!(goal.progress_log.is_empty());
        assert!(!goal.is_complete());
        assert!(!goal.id.is_empty());
    }

    #[test]
    fn new_goal_rejects_bad_target() {
        for target in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(Goal::new("x", GoalCategory::Work, target, nine(), created()).is_err());
        }
    }

    #[test]
    fn new_goal_rejects_blank_title() {
        let err = Goal::new("   ", GoalCategory::Work, 1.0, nine(), created()).unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("health".parse::<GoalCategory>().unwrap(), GoalCategory::Health);
        assert_eq!("WORK".parse::<GoalCategory>().unwrap(), GoalCategory::Work);
        assert!("chores".parse::<GoalCategory>().is_err());
    }

    #[test]
    fn persisted_shape_uses_camel_case() {
        let goal = Goal::new("Read", GoalCategory::Personal, 10.0, nine(), created()).unwrap();
        let json = serde_json::to_value(&goal).unwrap();
        assert!(json.get("progressLog").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("lastLogged").is_some());
        let back: Goal = serde_json::from_value(json).unwrap();
        assert_eq!(back, goal);
    }
}
