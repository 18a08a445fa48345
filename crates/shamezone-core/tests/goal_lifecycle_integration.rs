//! Integration tests for the goal lifecycle.
//!
//! Covers logging through completion, same-day repeat logs, archiving and
//! the statistics that fall out of a week of activity.

use std::rc::Rc;

use chrono::{Duration, FixedOffset, NaiveTime, TimeZone};
use proptest::prelude::*;
use shamezone_core::stats::{get_days_missed, get_streak_count, summarize};
use shamezone_core::{Clock, FixedClock, Goal, GoalCategory, GoalStore, Timestamp};

fn start() -> Timestamp {
    FixedOffset::east_opt(-5 * 3600)
        .unwrap()
        .with_ymd_and_hms(2025, 3, 3, 8, 0, 0)
        .unwrap()
}

fn goal_with_progress(target: f64, progress: f64) -> Goal {
    let mut goal = Goal::new(
        "Run 5k",
        GoalCategory::Health,
        target,
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        start(),
    )
    .unwrap();
    goal.progress = progress;
    goal
}

#[test]
fn test_completion_then_same_day_noop() {
    let clock = Rc::new(FixedClock::new(start()));
    let mut store = GoalStore::new(clock.clone());
    let goal = goal_with_progress(10.0, 8.0);
    let id = goal.id.clone();
    store.add_goal(goal);

    assert!(store.update_goal_progress(&id, 5.0));
    assert_eq!(store.get(&id).unwrap().progress, 10.0);

    assert!(!store.update_goal_progress(&id, 1.0));
    assert_eq!(store.get(&id).unwrap().progress, 10.0);
    assert_eq!(store.get(&id).unwrap().progress_log.len(), 1);
}

#[test]
fn test_week_of_logging_feeds_statistics() {
    let clock = Rc::new(FixedClock::new(start()));
    let mut store = GoalStore::new(clock.clone());
    let goal = goal_with_progress(30.0, 0.0);
    let id = goal.id.clone();
    store.add_goal(goal);

    // Log on days 0, 1, 2, skip 3 and 4, log on 5 and 6.
    for day in 0..7 {
        if day != 3 && day != 4 {
            store.update_goal_progress(&id, 2.0);
        }
        if day < 6 {
            clock.advance(Duration::days(1));
        }
    }

    let now = clock.now();
    let today = now.date_naive();
    assert_eq!(store.get(&id).unwrap().progress, 10.0);
    assert_eq!(get_streak_count(store.goals(), today), 2);
    assert_eq!(get_days_missed(store.goals(), today), 2);

    store.archive_goal(&id);
    let stats = summarize(store.goals(), &now);
    assert_eq!(stats.archived_goals, 1);
    assert_eq!(stats.goals_crushed, 0);
}

#[test]
fn test_archive_twice_changes_nothing_else() {
    let clock = Rc::new(FixedClock::new(start()));
    let mut store = GoalStore::new(clock);
    let goal = goal_with_progress(5.0, 5.0);
    let id = goal.id.clone();
    store.add_goal(goal);

    store.archive_goal(&id);
    let once = store.get(&id).unwrap().clone();
    store.archive_goal(&id);
    assert_eq!(store.get(&id).unwrap(), &once);
    assert!(once.archived);
}

#[test]
fn test_events_follow_mutations() {
    let clock = Rc::new(FixedClock::new(start()));
    let mut store = GoalStore::new(clock);
    let goal = goal_with_progress(1.0, 0.0);
    let id = goal.id.clone();
    store.add_goal(goal);
    store.update_goal_progress(&id, 1.0);
    store.update_goal_progress(&id, 1.0);
    store.clear_goals();

    let kinds: Vec<String> = store
        .drain_events()
        .iter()
        .map(|e| serde_json::to_value(e).unwrap()["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        kinds,
        ["GoalAdded", "ProgressLogged", "GoalCompleted", "GoalsCleared"]
    );
    assert!(store.drain_events().is_empty());
}

proptest! {
    #[test]
    fn progress_never_exceeds_target(
        target in 0.5f64..1_000.0,
        start_frac in 0.0f64..=1.0,
        amount in 0.001f64..2_000.0,
    ) {
        let clock = Rc::new(FixedClock::new(start()));
        let mut store = GoalStore::new(clock);
        let goal = goal_with_progress(target, target * start_frac);
        let before = goal.progress;
        let id = goal.id.clone();
        store.add_goal(goal);

        store.update_goal_progress(&id, amount);
        let after = store.get(&id).unwrap().progress;
        prop_assert!(after <= target);
        prop_assert_eq!(after, (before + amount).min(target));

        store.update_goal_progress(&id, amount);
        prop_assert_eq!(store.get(&id).unwrap().progress, after);
    }
}
