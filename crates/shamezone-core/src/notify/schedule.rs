//! Fire-time computation and per-goal scheduling.
//!
//! ## Tone policies
//!
//! ```text
//! soft / tryMe : one reminder at HH:MM on today + day_offset
//! nuclear      : N reminders at random minutes inside [start, end),
//!                pairwise >= gap minutes apart, sorted
//! ```

use chrono::{Days, NaiveTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NotificationHandle, Notifier};
use crate::clock::Timestamp;
use crate::error::NotificationError;
use crate::goals::Goal;
use crate::messages::get_tone_message;
use crate::settings::Tone;

pub const NOTIFICATION_TITLE: &str = "ShameZone Reminder";

/// Draws before giving up on rejection sampling and spacing fires evenly.
const MAX_SAMPLING_ATTEMPTS: usize = 10_000;

/// Consecutive rejections after which the partial pick is thrown away.
const RESTART_AFTER_REJECTIONS: usize = 64;

/// Window and spacing rules for the nuclear tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NuclearPolicy {
    /// First hour of the window (inclusive).
    pub window_start_hour: u32,
    /// Hour at which the window closes (exclusive).
    pub window_end_hour: u32,
    pub min_gap_minutes: u32,
    pub fires_per_day: u32,
}

impl Default for NuclearPolicy {
    fn default() -> Self {
        Self {
            window_start_hour: 7,
            window_end_hour: 23,
            min_gap_minutes: 30,
            fires_per_day: 3,
        }
    }
}

impl NuclearPolicy {
    /// Window bounds in minutes after midnight. Hours past 24 are clamped.
    pub fn window_minutes(&self) -> (u32, u32) {
        (
            self.window_start_hour.min(24) * 60,
            self.window_end_hour.min(24) * 60,
        )
    }

    /// Whether `fires_per_day` reminders `min_gap_minutes` apart fit in the window.
    pub fn is_satisfiable(&self) -> bool {
        if self.window_end_hour > 24 || self.window_start_hour >= self.window_end_hour {
            return false;
        }
        let (start, end) = self.window_minutes();
        if self.fires_per_day > end - start {
            return false;
        }
        // The last usable minute is end - 1.
        match self
            .fires_per_day
            .saturating_sub(1)
            .checked_mul(self.min_gap_minutes)
        {
            Some(needed) => end - 1 - start >= needed,
            None => false,
        }
    }
}

/// Shared inputs for one scheduling pass.
#[derive(Debug, Clone, Copy)]
pub struct FireContext {
    pub now: Timestamp,
    pub nuclear: NuclearPolicy,
}

impl FireContext {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now,
            nuclear: NuclearPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledReminder {
    pub handle: NotificationHandle,
    pub goal_id: String,
    pub goal_title: String,
    pub day_offset: u32,
    pub fire_at: Timestamp,
    pub fire_in_secs: u64,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleFailure {
    pub goal_id: String,
    pub day_offset: u32,
    pub fire_at: Timestamp,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub scheduled: Vec<ScheduledReminder>,
    pub failures: Vec<ScheduleFailure>,
}

impl ScheduleOutcome {
    pub fn extend(&mut self, other: ScheduleOutcome) {
        self.scheduled.extend(other.scheduled);
        self.failures.extend(other.failures);
    }
}

/// Make sure the app may post notifications, asking only if needed.
///
/// Never fatal: a refusal or a service error yields `false` and later
/// schedule calls are left for the service to drop.
pub fn setup_notification_permissions<N: Notifier + ?Sized>(notifier: &mut N) -> bool {
    match notifier.permission_granted() {
        Ok(true) => true,
        Ok(false) => match notifier.request_permission() {
            Ok(granted) => {
                if !granted {
                    warn!("notification permission denied");
                }
                granted
            }
            Err(e) => {
                warn!(error = %e, "notification permission request failed");
                false
            }
        },
        Err(e) => {
            warn!(error = %e, "could not read notification permission");
            false
        }
    }
}

pub fn cancel_all_scheduled_notifications<N: Notifier + ?Sized>(
    notifier: &mut N,
) -> Result<(), NotificationError> {
    notifier.cancel_all()
}

/// Sample nuclear fire times as minutes after midnight, sorted ascending.
pub fn nuclear_fire_minutes<R: Rng + ?Sized>(policy: &NuclearPolicy, rng: &mut R) -> Vec<u32> {
    let (start, end) = policy.window_minutes();
    let wanted = policy.fires_per_day as usize;
    let mut accepted: Vec<u32> = Vec::with_capacity(wanted);
    if wanted == 0 || start >= end {
        return accepted;
    }

    let mut attempts = 0;
    let mut rejections = 0;
    while accepted.len() < wanted && attempts < MAX_SAMPLING_ATTEMPTS {
        attempts += 1;
        let candidate = rng.gen_range(start..end);
        if accepted
            .iter()
            .all(|&t| t.abs_diff(candidate) >= policy.min_gap_minutes)
        {
            accepted.push(candidate);
            rejections = 0;
        } else {
            rejections += 1;
            if rejections >= RESTART_AFTER_REJECTIONS {
                // Early picks can leave no room for the rest.
                accepted.clear();
                rejections = 0;
            }
        }
    }

    if accepted.len() < wanted {
        warn!(
            attempts,
            wanted, "nuclear sampling did not converge; spacing reminders evenly"
        );
        accepted = evenly_spaced(start, end, wanted as u32);
    }

    accepted.sort_unstable();
    accepted
}

/// `n` minutes spread from `start` to the last minute before `end`.
fn evenly_spaced(start: u32, end: u32, n: u32) -> Vec<u32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - 1 - start) / (n - 1);
            (0..n).map(|i| start + i * step).collect()
        }
    }
}

/// Wall-clock fire times for one goal on `today + day_offset`.
pub fn fire_times<R: Rng + ?Sized>(
    tone: Tone,
    at: NaiveTime,
    day_offset: u32,
    ctx: &FireContext,
    rng: &mut R,
) -> Vec<Timestamp> {
    let Some(day) = ctx
        .now
        .date_naive()
        .checked_add_days(Days::new(day_offset as u64))
    else {
        return Vec::new();
    };

    let times: Vec<NaiveTime> = match tone {
        Tone::Nuclear => nuclear_fire_minutes(&ctx.nuclear, rng)
            .into_iter()
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .collect(),
        Tone::Soft | Tone::TryMe => {
            vec![NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).unwrap_or(at)]
        }
    };

    times
        .into_iter()
        .filter_map(|t| day.and_time(t).and_local_timezone(*ctx.now.offset()).single())
        .collect()
}

/// Seconds from `now` until `fire_at`, never less than one.
pub fn fire_offset_secs(fire_at: &Timestamp, now: &Timestamp) -> u64 {
    (*fire_at - *now).num_seconds().max(1) as u64
}

/// Compute fire times for `goal` on one day and register each with the notifier.
///
/// Message content is chosen here, once per notification. A failing
/// schedule call is recorded and the remaining ones still go out.
pub fn schedule_goal_notification<N: Notifier + ?Sized, R: Rng + ?Sized>(
    notifier: &mut N,
    goal: &Goal,
    tone: Tone,
    at: NaiveTime,
    day_offset: u32,
    ctx: &FireContext,
    rng: &mut R,
) -> ScheduleOutcome {
    let mut outcome = ScheduleOutcome::default();

    for fire_at in fire_times(tone, at, day_offset, ctx, rng) {
        let fire_in_secs = fire_offset_secs(&fire_at, &ctx.now);
        let body = get_tone_message(tone, &goal.title, rng);

        match notifier.schedule_at(fire_in_secs, NOTIFICATION_TITLE, &body) {
            Ok(handle) => {
                debug!(goal_id = %goal.id, %fire_at, fire_in_secs, "reminder scheduled");
                outcome.scheduled.push(ScheduledReminder {
                    handle,
                    goal_id: goal.id.clone(),
                    goal_title: goal.title.clone(),
                    day_offset,
                    fire_at,
                    fire_in_secs,
                    body,
                });
            }
            Err(e) => {
                warn!(goal_id = %goal.id, %fire_at, error = %e, "failed to schedule reminder");
                outcome.failures.push(ScheduleFailure {
                    goal_id: goal.id.clone(),
                    day_offset,
                    fire_at,
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}
