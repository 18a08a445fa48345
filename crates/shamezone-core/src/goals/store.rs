//! In-memory goal store.
//!
//! Each mutation is a single synchronous replacement of one goal (or the
//! whole list), so no two updates can interleave. Every effective change
//! is recorded in an outbox that the scheduling orchestrator drains.

use std::rc::Rc;

use tracing::debug;

use super::Goal;
use crate::clock::{iso_date, Clock};
use crate::events::Event;

pub struct GoalStore {
    goals: Vec<Goal>,
    clock: Rc<dyn Clock>,
    events: Vec<Event>,
}

impl GoalStore {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            goals: Vec::new(),
            clock,
            events: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, id: &str) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn active_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| !g.archived)
    }

    pub fn archived_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.archived)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    /// Take all change events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Append a goal. The caller owns id uniqueness.
    pub fn add_goal(&mut self, mut goal: Goal) {
        goal.archived = false;
        debug!(goal_id = %goal.id, title = %goal.title, "goal added");
        self.events.push(Event::GoalAdded {
            goal_id: goal.id.clone(),
            at: self.clock.now(),
        });
        self.goals.push(goal);
    }

    /// Log progress against a goal for today.
    ///
    /// Returns `true` only when this call brought the goal to its target.
    /// Unknown ids, non-finite amounts and a second log on the same calendar
    /// date are no-ops returning `false`.
    pub fn update_goal_progress(&mut self, id: &str, amount: f64) -> bool {
        if !amount.is_finite() {
            debug!(goal_id = id, amount, "ignoring non-finite progress amount");
            return false;
        }
        let now = self.clock.now();
        let today = iso_date(now.date_naive());

        let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) else {
            debug!(goal_id = id, "progress logged against unknown goal");
            return false;
        };
        if goal.progress_log.contains(&today) {
            debug!(goal_id = id, %today, "already logged today");
            return false;
        }

        // Sign is the caller's job; the clamp keeps 0 <= progress <= target either way.
        let new_progress = (goal.progress + amount).min(goal.target).max(0.0);
        goal.progress = new_progress;
        goal.last_logged = Some(now);
        goal.progress_log.insert(today);

        let completed = new_progress >= goal.target;
        self.events.push(Event::ProgressLogged {
            goal_id: goal.id.clone(),
            progress: goal.progress,
            target: goal.target,
            at: now,
        });
        if completed {
            self.events.push(Event::GoalCompleted {
                goal_id: goal.id.clone(),
                at: now,
            });
        }
        completed
    }

    /// Mark a goal archived. Idempotent; unknown ids are ignored.
    pub fn archive_goal(&mut self, id: &str) {
        let now = self.clock.now();
        if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
            if !goal.archived {
                goal.archived = true;
                self.events.push(Event::GoalArchived {
                    goal_id: goal.id.clone(),
                    at: now,
                });
            }
        }
    }

    /// Drop every goal.
    pub fn clear_goals(&mut self) {
        let count = self.goals.len();
        self.goals.clear();
        self.events.push(Event::GoalsCleared {
            count,
            at: self.clock.now(),
        });
    }

    /// Replace the list wholesale, e.g. with persisted state.
    pub fn replace_all(&mut self, goals: Vec<Goal>) {
        let count = goals.len();
        self.goals = goals;
        self.events.push(Event::GoalsReplaced {
            count,
            at: self.clock.now(),
        });
    }
}
