//! Rebuilds the reminder schedule whenever goals or settings change.
//!
//! Every rebuild is a full reset: ensure permission, cancel everything,
//! then schedule the next `horizon_days` days for the first
//! `max_active_goals` goals. A goal already logged on a given day gets no
//! reminder for that day.
//!
//! Change events are coalesced. Any number of events marks the orchestrator
//! dirty; [`ScheduleOrchestrator::run_pending`] performs one rebuild against
//! the latest state and repeats only if new changes arrived meanwhile.

use chrono::{Days, NaiveTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{iso_date, Timestamp};
use crate::error::NotificationError;
use crate::events::Event;
use crate::goals::Goal;
use crate::notify::{
    cancel_all_scheduled_notifications, schedule_goal_notification,
    setup_notification_permissions, FireContext, Notifier, NuclearPolicy, ScheduleFailure,
    ScheduleOutcome, ScheduledReminder,
};
use crate::settings::{Settings, Tone};

/// Limits for one rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub horizon_days: u32,
    pub max_active_goals: usize,
    pub nuclear: NuclearPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            horizon_days: 3,
            max_active_goals: 3,
            nuclear: NuclearPolicy::default(),
        }
    }
}

impl From<&crate::storage::Config> for OrchestratorConfig {
    fn from(cfg: &crate::storage::Config) -> Self {
        Self {
            horizon_days: cfg.schedule.horizon_days,
            max_active_goals: cfg.schedule.max_active_goals,
            nuclear: cfg.nuclear.policy(),
        }
    }
}

/// What one rebuild did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleReport {
    pub generated_at: Timestamp,
    pub permission_granted: bool,
    pub scheduled: Vec<ScheduledReminder>,
    pub failures: Vec<ScheduleFailure>,
    /// `(goal_id, YYYY-MM-DD)` pairs skipped because the goal was already logged.
    pub skipped: Vec<(String, String)>,
}

/// Time of day used for single-fire tones.
///
/// Soft with a valid fixed time uses it; everything else falls back to the
/// current wall-clock hour and minute.
pub fn reminder_time(settings: &Settings, now: &Timestamp) -> NaiveTime {
    let wall_clock = || {
        NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or_else(|| now.time())
    };
    match settings.tone {
        Tone::Soft => settings.fixed_time().unwrap_or_else(wall_clock),
        Tone::TryMe | Tone::Nuclear => wall_clock(),
    }
}

/// One full rebuild of the schedule.
///
/// # Errors
/// Fails only when cancelling the previous schedule fails; nothing is
/// scheduled in that case so no duplicates can pile up. Individual
/// schedule failures are collected in the report instead.
pub fn reschedule<N: Notifier + ?Sized, R: Rng + ?Sized>(
    notifier: &mut N,
    goals: &[Goal],
    settings: &Settings,
    now: Timestamp,
    config: &OrchestratorConfig,
    rng: &mut R,
) -> Result<RescheduleReport, NotificationError> {
    let permission_granted = setup_notification_permissions(notifier);
    cancel_all_scheduled_notifications(notifier)?;

    let ctx = FireContext {
        now,
        nuclear: config.nuclear,
    };
    let at = reminder_time(settings, &now);
    let active = &goals[..goals.len().min(config.max_active_goals)];

    let mut outcome = ScheduleOutcome::default();
    let mut skipped = Vec::new();

    for day_offset in 0..config.horizon_days {
        let Some(day) = now
            .date_naive()
            .checked_add_days(Days::new(day_offset as u64))
        else {
            break;
        };

        for goal in active {
            if goal.last_logged_date(&now) == Some(day) {
                debug!(goal_id = %goal.id, %day, "already logged, no reminder");
                skipped.push((goal.id.clone(), iso_date(day)));
                continue;
            }
            outcome.extend(schedule_goal_notification(
                notifier,
                goal,
                settings.tone,
                at,
                day_offset,
                &ctx,
                rng,
            ));
        }
    }

    if !outcome.failures.is_empty() {
        warn!(
            failed = outcome.failures.len(),
            scheduled = outcome.scheduled.len(),
            "some reminders could not be scheduled"
        );
    }
    info!(
        goals = active.len(),
        scheduled = outcome.scheduled.len(),
        skipped = skipped.len(),
        tone = %settings.tone,
        "reminder schedule rebuilt"
    );

    Ok(RescheduleReport {
        generated_at: now,
        permission_granted,
        scheduled: outcome.scheduled,
        failures: outcome.failures,
        skipped,
    })
}

/// Serializes rebuilds and coalesces change events.
pub struct ScheduleOrchestrator<R> {
    config: OrchestratorConfig,
    rng: R,
    dirty: bool,
    runs: u64,
    last_report: Option<RescheduleReport>,
}

impl<R: Rng> ScheduleOrchestrator<R> {
    pub fn new(config: OrchestratorConfig, rng: R) -> Self {
        Self {
            config,
            rng,
            // First run always happens.
            dirty: true,
            runs: 0,
            last_report: None,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of completed rebuilds.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn last_report(&self) -> Option<&RescheduleReport> {
        self.last_report.as_ref()
    }

    /// Record change events. Returns whether a rebuild is now pending.
    pub fn notify<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> bool {
        if events.into_iter().any(Event::affects_schedule) {
            self.dirty = true;
        }
        self.dirty
    }

    /// Force a rebuild on the next `run_pending`.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Rebuild if anything changed since the last run.
    ///
    /// `state` is called for the current goals and settings right before
    /// each rebuild, together with any events that arrived since the
    /// previous pass; it returns the events so the loop can tell whether
    /// another pass is needed.
    pub fn run_pending<N, F>(
        &mut self,
        notifier: &mut N,
        now: Timestamp,
        mut state: F,
    ) -> Result<Option<&RescheduleReport>, NotificationError>
    where
        N: Notifier + ?Sized,
        F: FnMut() -> (Vec<Goal>, Settings, Vec<Event>),
    {
        let mut ran = false;
        loop {
            let (goals, settings, events) = state();
            self.notify(&events);
            if !self.dirty {
                break;
            }
            self.dirty = false;
            match reschedule(notifier, &goals, &settings, now, &self.config, &mut self.rng) {
                Ok(report) => {
                    self.runs += 1;
                    self.last_report = Some(report);
                    ran = true;
                }
                Err(e) => {
                    // Leave the flag set so the next call retries.
                    self.dirty = true;
                    warn!(error = %e, "reminder rebuild aborted");
                    return Err(e);
                }
            }
        }
        Ok(if ran { self.last_report.as_ref() } else { None })
    }
}
