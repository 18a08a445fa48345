use chrono::{DateTime, NaiveTime, Timelike};
use clap::Subcommand;
use serde::Serialize;
use shamezone_core::accountability::{goal_status, progress_percentage, time_remaining};
use shamezone_core::settings::parse_time_of_day;
use shamezone_core::{Goal, GoalCategory, GoalStatus, Timestamp};

use crate::app::{open_session, print_json, sync_reminders};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a goal
    Add {
        /// Goal title
        title: String,
        /// Amount that counts as done
        #[arg(long)]
        target: f64,
        /// work, health or personal
        #[arg(long, default_value = "personal")]
        category: GoalCategory,
        /// Daily logging time (HH:MM); defaults to the current time
        #[arg(long)]
        time: Option<String>,
        /// Deadline as RFC 3339 (e.g. 2025-07-01T18:00:00+02:00)
        #[arg(long)]
        deadline: Option<String>,
        /// Milestone description (repeatable)
        #[arg(long = "milestone")]
        milestones: Vec<String>,
    },
    /// List goals with status badges
    List {
        /// Include archived goals
        #[arg(long)]
        all: bool,
    },
    /// Log progress for today
    Log {
        /// Goal ID
        id: String,
        /// Amount to add
        amount: f64,
    },
    /// Archive a goal
    Archive {
        /// Goal ID
        id: String,
    },
    /// Delete every goal
    Clear,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalView<'a> {
    #[serde(flatten)]
    goal: &'a Goal,
    status: GoalStatus,
    percent: u32,
    time_remaining: String,
}

fn view<'a>(goal: &'a Goal, now: &Timestamp) -> GoalView<'a> {
    GoalView {
        goal,
        status: goal_status(goal, now),
        percent: progress_percentage(goal.progress, goal.target),
        time_remaining: time_remaining(goal.deadline.as_ref(), now),
    }
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        GoalAction::Add {
            title,
            target,
            category,
            time,
            deadline,
            milestones,
        } => {
            let now = session.now();
            let time = match time {
                Some(raw) => parse_time_of_day(&raw)
                    .ok_or_else(|| format!("invalid time '{raw}', expected HH:MM"))?,
                None => NaiveTime::from_hms_opt(now.hour(), now.minute(), 0)
                    .unwrap_or_else(|| now.time()),
            };
            let deadline = deadline
                .map(|raw| DateTime::parse_from_rfc3339(&raw))
                .transpose()?;

            let goal = Goal::new(title, category, target, time, now)?
                .with_deadline(deadline)
                .with_milestones(milestones);
            let id = goal.id.clone();
            session.add_goal(goal)?;
            sync_reminders(&mut session);

            if let Some(goal) = session.goal(&id) {
                print_json(&view(goal, &now))?;
            }
        }
        GoalAction::List { all } => {
            let now = session.now();
            let views: Vec<GoalView> = session
                .goals()
                .iter()
                .filter(|g| all || !g.archived)
                .map(|g| view(g, &now))
                .collect();
            print_json(&views)?;
        }
        GoalAction::Log { id, amount } => {
            if session.goal(&id).is_none() {
                return Err(format!("goal not found: {id}").into());
            }
            let verdict = session.log_progress(&id, amount)?;
            sync_reminders(&mut session);
            print_json(&verdict)?;
        }
        GoalAction::Archive { id } => {
            if session.goal(&id).is_none() {
                return Err(format!("goal not found: {id}").into());
            }
            session.archive_goal(&id)?;
            sync_reminders(&mut session);
            println!("archived {id}");
        }
        GoalAction::Clear => {
            let count = session.goals().len();
            session.clear_goals()?;
            sync_reminders(&mut session);
            println!("cleared {count} goals");
        }
    }
    Ok(())
}
