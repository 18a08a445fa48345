//! Statistics over the goal list.
//!
//! All functions are pure and take `today` explicitly so callers decide
//! which clock (and time zone) they are bucketing against. Every log on any
//! goal counts the day as covered: missed days are tracked across the whole
//! list, not per goal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::clock::{iso_date, local_date, Timestamp};
use crate::goals::Goal;

/// Maximum number of days the streak walk looks back.
pub const STREAK_LOOKBACK_DAYS: u32 = 365;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStats {
    pub goals_crushed: usize,
    pub streak: u32,
    pub days_missed: u32,
    pub total_goals: usize,
    pub active_goals: usize,
    pub archived_goals: usize,
}

fn unique_log_dates(goals: &[Goal]) -> HashSet<&str> {
    goals
        .iter()
        .flat_map(|g| g.progress_log.iter().map(String::as_str))
        .collect()
}

/// Number of goals that reached their target.
pub fn get_goals_crushed(goals: &[Goal]) -> usize {
    goals.iter().filter(|g| g.is_complete()).count()
}

/// Consecutive logged days ending today. Zero if today has no log.
pub fn get_streak_count(goals: &[Goal], today: NaiveDate) -> u32 {
    let dates = unique_log_dates(goals);
    if dates.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut day = today;
    while streak < STREAK_LOOKBACK_DAYS && dates.contains(iso_date(day).as_str()) {
        streak += 1;
        let Some(prev) = day.pred_opt() else { break };
        day = prev;
    }
    streak
}

/// Days from the earliest goal's creation through today with no log at all.
///
/// Creation dates are taken in the offset they were recorded with.
pub fn get_days_missed(goals: &[Goal], today: NaiveDate) -> u32 {
    match earliest_created(goals) {
        Some(created) => count_missed(created.date_naive(), today, &unique_log_dates(goals)),
        None => 0,
    }
}

/// Days missed, with the creation date bucketed in `now`'s offset.
pub fn get_days_missed_at(goals: &[Goal], now: &Timestamp) -> u32 {
    match earliest_created(goals) {
        Some(created) => count_missed(
            local_date(&created, now),
            now.date_naive(),
            &unique_log_dates(goals),
        ),
        None => 0,
    }
}

fn count_missed(start: NaiveDate, today: NaiveDate, dates: &HashSet<&str>) -> u32 {
    let mut missed = 0;
    let mut day = start;
    while day <= today {
        if !dates.contains(iso_date(day).as_str()) {
            missed += 1;
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }
    missed
}

fn earliest_created(goals: &[Goal]) -> Option<Timestamp> {
    goals.iter().map(|g| g.created_at).min()
}

/// All three figures plus list counts.
pub fn summarize(goals: &[Goal], now: &Timestamp) -> GoalStats {
    let today = now.date_naive();
    let archived = goals.iter().filter(|g| g.archived).count();
    GoalStats {
        goals_crushed: get_goals_crushed(goals),
        streak: get_streak_count(goals, today),
        days_missed: get_days_missed_at(goals, now),
        total_goals: goals.len(),
        active_goals: goals.len() - archived,
        archived_goals: archived,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::GoalCategory;
    use chrono::{Duration, FixedOffset, NaiveTime, TimeZone};

    fn now() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 15, 12, 0, 0)
            .unwrap()
    }

    fn goal_created_days_ago(days: i64, logged_days_ago: &[i64]) -> Goal {
        let created = now() - Duration::days(days);
        let mut g = Goal::new(
            "Stretch",
            GoalCategory::Health,
            10.0,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            created,
        )
        .unwrap();
        for d in logged_days_ago {
            g.progress_log
                .insert(iso_date((now() - Duration::days(*d)).date_naive()));
        }
        g
    }

    #[test]
    fn empty_list_is_all_zero() {
        let today = now().date_naive();
        assert_eq!(get_streak_count(&[], today), 0);
        assert_eq!(get_goals_crushed(&[]), 0);
        assert_eq!(get_days_missed(&[], today), 0);
        assert_eq!(summarize(&[], &now()), GoalStats::default());
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let goals = vec![goal_created_days_ago(4, &[0, 1, 2])];
        let today = now().date_naive();
        assert_eq!(get_streak_count(&goals, today), 3);
    }

    #[test]
    fn streak_is_zero_without_todays_log() {
        let goals = vec![goal_created_days_ago(4, &[1, 2, 3])];
        assert_eq!(get_streak_count(&goals, now().date_naive()), 0);
    }

    #[test]
    fn streak_unions_logs_across_goals() {
        let goals = vec![
            goal_created_days_ago(10, &[0, 2]),
            goal_created_days_ago(10, &[1, 3]),
        ];
        assert_eq!(get_streak_count(&goals, now().date_naive()), 4);
    }

    #[test]
    fn streak_is_bounded_by_lookback() {
        let days: Vec<i64> = (0..400).collect();
        let goals = vec![goal_created_days_ago(400, &days)];
        assert_eq!(
            get_streak_count(&goals, now().date_naive()),
            STREAK_LOOKBACK_DAYS
        );
    }

    #[test]
    fn days_missed_counts_inclusive_range() {
        // Window of five calendar days (creation day through today), logs on the last three.
        let goals = vec![goal_created_days_ago(4, &[0, 1, 2])];
        assert_eq!(get_days_missed(&goals, now().date_naive()), 2);

        let goals = vec![goal_created_days_ago(5, &[0, 1, 2])];
        assert_eq!(get_days_missed(&goals, now().date_naive()), 3);
    }

    #[test]
    fn days_missed_uses_earliest_creation() {
        let goals = vec![
            goal_created_days_ago(1, &[0, 1]),
            goal_created_days_ago(6, &[]),
        ];
        assert_eq!(get_days_missed(&goals, now().date_naive()), 5);
    }

    #[test]
    fn creation_after_today_misses_nothing() {
        let goals = vec![goal_created_days_ago(-3, &[])];
        assert_eq!(get_days_missed(&goals, now().date_naive()), 0);
    }

    #[test]
    fn crushed_counts_completed_goals() {
        let mut done = goal_created_days_ago(1, &[0]);
        done.progress = 10.0;
        let open = goal_created_days_ago(1, &[]);
        assert_eq!(get_goals_crushed(&[done, open]), 1);
    }

    #[test]
    fn summary_counts_archived() {
        let mut done = goal_created_days_ago(2, &[0]);
        done.progress = 10.0;
        done.archived = true;
        let open = goal_created_days_ago(2, &[]);
        let s = summarize(&[done, open], &now());
        assert_eq!(s.goals_crushed, 1);
        assert_eq!(s.streak, 1);
        assert_eq!(s.days_missed, 2);
        assert_eq!(s.total_goals, 2);
        assert_eq!(s.active_goals, 1);
        assert_eq!(s.archived_goals, 1);
    }
}
