//! What the user sees right after logging, and per-goal display badges.

use chrono::{Duration, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::goals::Goal;
use crate::messages;
use crate::settings::Tone;

/// Result of a progress log as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum LogVerdict {
    /// Target reached, and on time.
    Celebrate { goal_id: String },
    /// Logged outside the tone's window.
    Late { roast: String },
    /// Logged on time without finishing the goal.
    Logged,
    /// Nothing changed (already logged today, unknown goal, bad amount).
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Target reached.
    Archive,
    /// Logged within the last 24 hours.
    Flame,
    /// Never logged, or gone cold.
    Ice,
}

/// Whether a log at `now` counts as on time for a goal due at `goal_time`.
///
/// soft allows one hour either side, tryMe four hours; nuclear only cares
/// that it is daytime.
pub fn is_on_time(now: &Timestamp, goal_time: NaiveTime, tone: Tone) -> bool {
    let window = match tone {
        Tone::Soft => Duration::hours(1),
        Tone::TryMe => Duration::hours(4),
        Tone::Nuclear => return (7..=23).contains(&now.hour()),
    };
    let due = now.date_naive().and_time(goal_time);
    let diff = now.naive_local() - due;
    diff <= window && diff >= -window
}

pub fn judge_log(goal_id: &str, completed: bool, on_time: bool, tone: Tone) -> LogVerdict {
    if completed && on_time {
        LogVerdict::Celebrate {
            goal_id: goal_id.to_string(),
        }
    } else if !on_time {
        LogVerdict::Late {
            roast: format!("Too little, too late.\n\n{}", messages::roast(tone)),
        }
    } else {
        LogVerdict::Logged
    }
}

pub fn goal_status(goal: &Goal, now: &Timestamp) -> GoalStatus {
    if goal.is_complete() {
        return GoalStatus::Archive;
    }
    match goal.last_logged {
        Some(last) if last > *now - Duration::days(1) => GoalStatus::Flame,
        _ => GoalStatus::Ice,
    }
}

/// Whole-number percentage, capped at 100.
pub fn progress_percentage(progress: f64, target: f64) -> u32 {
    if !target.is_finite() || target <= 0.0 || !progress.is_finite() {
        return 0;
    }
    (progress / target * 100.0).round().clamp(0.0, 100.0) as u32
}

/// `"{h}h {m}m"` until the deadline, or `"No deadline"`.
///
/// Both parts round toward negative infinity, so a deadline half an hour
/// past reads `"-1h -30m"`.
pub fn time_remaining(deadline: Option<&Timestamp>, now: &Timestamp) -> String {
    const HOUR_MS: i64 = 3_600_000;
    const MINUTE_MS: i64 = 60_000;
    match deadline {
        Some(deadline) => {
            let ms = (*deadline - *now).num_milliseconds();
            let hours = ms.div_euclid(HOUR_MS);
            let minutes = (ms % HOUR_MS).div_euclid(MINUTE_MS);
            format!("{hours}h {minutes}m")
        }
        None => "No deadline".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::GoalCategory;
    use chrono::{FixedOffset, TimeZone};

    fn at(h: u32, m: u32) -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 15, h, m, 0)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn soft_window_is_one_hour() {
        assert!(is_on_time(&at(9, 45), nine(), Tone::Soft));
        assert!(is_on_time(&at(8, 0), nine(), Tone::Soft));
        assert!(!is_on_time(&at(10, 1), nine(), Tone::Soft));
    }

    #[test]
    fn try_me_window_is_four_hours() {
        assert!(is_on_time(&at(12, 59), nine(), Tone::TryMe));
        assert!(!is_on_time(&at(13, 30), nine(), Tone::TryMe));
    }

    #[test]
    fn nuclear_only_checks_daytime() {
        assert!(is_on_time(&at(22, 0), nine(), Tone::Nuclear));
        assert!(is_on_time(&at(7, 0), nine(), Tone::Nuclear));
        assert!(!is_on_time(&at(3, 0), nine(), Tone::Nuclear));
    }

    #[test]
    fn verdicts() {
        assert_eq!(
            judge_log("g1", true, true, Tone::Soft),
            LogVerdict::Celebrate { goal_id: "g1".into() }
        );
        assert_eq!(judge_log("g1", false, true, Tone::Soft), LogVerdict::Logged);
        match judge_log("g1", true, false, Tone::Nuclear) {
            LogVerdict::Late { roast } => assert!(roast.contains("Pathetic")),
            other => panic!("unexpected verdict {other:?}"),
        }
    }

    #[test]
    fn status_badges() {
        let mut goal = Goal::new("Read", GoalCategory::Personal, 10.0, nine(), at(8, 0)).unwrap();
        let now = at(12, 0);
        assert_eq!(goal_status(&goal, &now), GoalStatus::Ice);

        goal.last_logged = Some(now - Duration::hours(12));
        assert_eq!(goal_status(&goal, &now), GoalStatus::Flame);

        goal.last_logged = Some(now - Duration::hours(36));
        assert_eq!(goal_status(&goal, &now), GoalStatus::Ice);

        goal.progress = 10.0;
        assert_eq!(goal_status(&goal, &now), GoalStatus::Archive);
    }

    #[test]
    fn percentage_is_rounded_and_capped() {
        assert_eq!(progress_percentage(1.0, 3.0), 33);
        assert_eq!(progress_percentage(2.0, 3.0), 67);
        assert_eq!(progress_percentage(5.0, 3.0), 100);
        assert_eq!(progress_percentage(1.0, 0.0), 0);
    }

    #[test]
    fn remaining_time_format() {
        let now = at(10, 0);
        let deadline = now + Duration::hours(26) + Duration::minutes(5);
        assert_eq!(time_remaining(Some(&deadline), &now), "26h 5m");
        assert_eq!(time_remaining(None, &now), "No deadline");
    }

    #[test]
    fn overdue_time_rounds_down() {
        let now = at(10, 0);
        let deadline = now - Duration::minutes(30);
        assert_eq!(time_remaining(Some(&deadline), &now), "-1h -30m");
        let deadline = now - Duration::hours(2) - Duration::minutes(15);
        assert_eq!(time_remaining(Some(&deadline), &now), "-3h -15m");
        let deadline = now + Duration::minutes(59) + Duration::seconds(30);
        assert_eq!(time_remaining(Some(&deadline), &now), "0h 59m");
    }
}
