//! One user's running app state.
//!
//! A session owns the goal store, the settings, the persistence layer and
//! the notifier. Mutations apply in memory first and are then persisted;
//! if persisting fails the error is returned and the in-memory change is
//! kept. Reminder rebuilds are deferred to [`Session::reschedule_if_needed`]
//! so a burst of changes costs a single rebuild.

use std::rc::Rc;

use chrono::NaiveTime;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::accountability::{is_on_time, judge_log, LogVerdict};
use crate::clock::{Clock, Timestamp};
use crate::error::{NotificationError, Result, ValidationError};
use crate::events::Event;
use crate::goals::{Goal, GoalCategory, GoalStore};
use crate::notify::Notifier;
use crate::orchestrator::{OrchestratorConfig, RescheduleReport, ScheduleOrchestrator};
use crate::settings::{parse_time_of_day, Settings, Tone};
use crate::stats::{summarize, GoalStats};
use crate::storage::{Config, KeyValueStore, StateStore};

pub struct Session<S, N> {
    clock: Rc<dyn Clock>,
    store: GoalStore,
    settings: Settings,
    state: StateStore<S>,
    notifier: N,
    orchestrator: ScheduleOrchestrator<Pcg64>,
    /// Settings changes not yet seen by the orchestrator.
    pending: Vec<Event>,
}

impl<S: KeyValueStore, N: Notifier> Session<S, N> {
    /// Load persisted goals and settings.
    ///
    /// `seed` fixes the RNG used for message and nuclear time selection;
    /// `None` seeds from the OS.
    ///
    /// # Errors
    /// Returns a storage error if persisted state cannot be read or parsed.
    pub fn open(
        clock: Rc<dyn Clock>,
        kv: S,
        notifier: N,
        config: &Config,
        seed: Option<u64>,
    ) -> Result<Self> {
        let state = StateStore::new(kv);
        let goals = state.load_goals()?;
        let settings = state.load_settings()?;

        let mut store = GoalStore::new(Rc::clone(&clock));
        store.replace_all(goals);

        let rng = match seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };

        debug!(goals = store.len(), tone = %settings.tone, "session opened");
        Ok(Self {
            clock,
            store,
            settings,
            state,
            notifier,
            orchestrator: ScheduleOrchestrator::new(OrchestratorConfig::from(config), rng),
            pending: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn goals(&self) -> &[Goal] {
        self.store.goals()
    }

    pub fn goal(&self, id: &str) -> Option<&Goal> {
        self.store.get(id)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> GoalStats {
        summarize(self.store.goals(), &self.clock.now())
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn state(&self) -> &StateStore<S> {
        &self.state
    }

    pub fn orchestrator(&self) -> &ScheduleOrchestrator<Pcg64> {
        &self.orchestrator
    }

    pub fn is_onboarding_complete(&self) -> Result<bool> {
        Ok(self.state.is_onboarding_complete()?)
    }

    // ── Goal commands ────────────────────────────────────────────────

    /// Add a goal built elsewhere.
    pub fn add_goal(&mut self, goal: Goal) -> Result<()> {
        self.store.add_goal(goal);
        self.persist_goals()
    }

    /// Build a goal created now and add it. Returns the stored goal.
    pub fn create_goal(
        &mut self,
        title: &str,
        category: GoalCategory,
        target: f64,
        time: NaiveTime,
    ) -> Result<Goal> {
        let goal = Goal::new(title, category, target, time, self.clock.now())?;
        let created = goal.clone();
        self.add_goal(goal)?;
        Ok(created)
    }

    /// Log progress and judge it.
    ///
    /// Amounts that are not positive finite numbers are ignored before they
    /// reach the store, as are unknown ids and repeat logs on the same day.
    pub fn log_progress(&mut self, id: &str, amount: f64) -> Result<LogVerdict> {
        if !amount.is_finite() || amount <= 0.0 {
            debug!(goal_id = id, amount, "ignored non-positive amount");
            return Ok(LogVerdict::Ignored);
        }
        let Some(before) = self.store.get(id).map(|g| g.last_logged) else {
            return Ok(LogVerdict::Ignored);
        };

        self.store.update_goal_progress(id, amount);

        let Some(goal) = self.store.get(id) else {
            return Ok(LogVerdict::Ignored);
        };
        if goal.last_logged == before {
            return Ok(LogVerdict::Ignored);
        }

        let now = self.clock.now();
        let on_time = is_on_time(&now, goal.time, self.settings.tone);
        let verdict = judge_log(&goal.id, goal.is_complete(), on_time, self.settings.tone);
        info!(goal_id = id, progress = goal.progress, target = goal.target, on_time, "progress logged");

        self.persist_goals()?;
        Ok(verdict)
    }

    pub fn archive_goal(&mut self, id: &str) -> Result<()> {
        self.store.archive_goal(id);
        self.persist_goals()
    }

    pub fn clear_goals(&mut self) -> Result<()> {
        self.store.clear_goals();
        self.persist_goals()
    }

    // ── Settings commands ────────────────────────────────────────────

    pub fn set_tone(&mut self, tone: Tone) -> Result<()> {
        if self.settings.tone == tone {
            return Ok(());
        }
        self.settings.tone = tone;
        self.pending.push(Event::ToneChanged {
            tone,
            at: self.clock.now(),
        });
        self.persist_settings()
    }

    /// Set or clear the fixed reminder time. Stored as `HH:MM`.
    ///
    /// # Errors
    /// Returns a validation error for text that is not a time of day.
    pub fn set_time(&mut self, time: Option<&str>) -> Result<()> {
        let normalized = match time {
            Some(raw) => {
                let parsed = parse_time_of_day(raw).ok_or_else(|| {
                    ValidationError::invalid("time", format!("expected HH:MM, got '{raw}'"))
                })?;
                Some(parsed.format("%H:%M").to_string())
            }
            None => None,
        };
        if self.settings.time == normalized {
            return Ok(());
        }
        self.settings.time = normalized.clone();
        self.pending.push(Event::ReminderTimeChanged {
            time: normalized,
            at: self.clock.now(),
        });
        self.persist_settings()
    }

    pub fn set_test_mode(&mut self, enabled: bool) -> Result<()> {
        if self.settings.test_mode == enabled {
            return Ok(());
        }
        self.settings.test_mode = enabled;
        self.pending.push(Event::TestModeChanged {
            enabled,
            at: self.clock.now(),
        });
        self.persist_settings()
    }

    pub fn complete_onboarding(&mut self) -> Result<()> {
        Ok(self.state.set_onboarding_complete()?)
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Rebuild reminders if anything relevant changed since the last run.
    ///
    /// Returns the report of the rebuild, or `None` when nothing was due.
    pub fn reschedule_if_needed(
        &mut self,
    ) -> std::result::Result<Option<RescheduleReport>, NotificationError> {
        let now = self.clock.now();
        let store = &mut self.store;
        let settings = &self.settings;
        let pending = &mut self.pending;
        let report = self.orchestrator.run_pending(&mut self.notifier, now, || {
            let mut events = std::mem::take(&mut *pending);
            events.extend(store.drain_events());
            (store.goals().to_vec(), settings.clone(), events)
        })?;
        Ok(report.cloned())
    }

    /// Rebuild reminders now regardless of pending changes.
    pub fn reschedule(&mut self) -> std::result::Result<Option<RescheduleReport>, NotificationError> {
        self.orchestrator.mark_dirty();
        self.reschedule_if_needed()
    }

    fn persist_goals(&self) -> Result<()> {
        Ok(self.state.save_goals(self.store.goals())?)
    }

    fn persist_settings(&self) -> Result<()> {
        Ok(self.state.save_settings(&self.settings)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{CoreError, StorageError};
    use crate::notify::RecordingNotifier;
    use crate::storage::MemoryStore;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn start() -> Timestamp {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 6, 15, 9, 30, 0)
            .unwrap()
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    fn session(
        clock: &Rc<FixedClock>,
        kv: Rc<MemoryStore>,
    ) -> Session<Rc<MemoryStore>, RecordingNotifier> {
        Session::open(
            clock.clone(),
            kv,
            RecordingNotifier::new(),
            &Config::default(),
            Some(7),
        )
        .unwrap()
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Locked)
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), StorageError> {
            Err(StorageError::Locked)
        }
    }

    #[test]
    fn log_on_time_and_complete_celebrates() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        let goal = s.create_goal("Read", GoalCategory::Personal, 2.0, nine()).unwrap();

        let verdict = s.log_progress(&goal.id, 2.0).unwrap();
        assert_eq!(verdict, LogVerdict::Celebrate { goal_id: goal.id.clone() });
        assert_eq!(s.stats().goals_crushed, 1);
    }

    #[test]
    fn late_log_gets_roasted() {
        let clock = Rc::new(FixedClock::new(start() + Duration::hours(5)));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        let goal = s.create_goal("Read", GoalCategory::Personal, 10.0, nine()).unwrap();

        match s.log_progress(&goal.id, 1.0).unwrap() {
            LogVerdict::Late { roast } => assert!(roast.starts_with("Too little, too late.")),
            other => panic!("expected late verdict, got {other:?}"),
        }
    }

    #[test]
    fn second_log_and_bad_amounts_are_ignored() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        let goal = s.create_goal("Read", GoalCategory::Personal, 10.0, nine()).unwrap();

        assert_eq!(s.log_progress(&goal.id, 0.0).unwrap(), LogVerdict::Ignored);
        assert_eq!(s.log_progress(&goal.id, -3.0).unwrap(), LogVerdict::Ignored);
        assert_eq!(s.log_progress(&goal.id, f64::NAN).unwrap(), LogVerdict::Ignored);
        assert_eq!(s.log_progress("missing", 1.0).unwrap(), LogVerdict::Ignored);

        assert_eq!(s.log_progress(&goal.id, 3.0).unwrap(), LogVerdict::Logged);
        assert_eq!(s.log_progress(&goal.id, 3.0).unwrap(), LogVerdict::Ignored);
        assert_eq!(s.goal(&goal.id).unwrap().progress, 3.0);
    }

    #[test]
    fn state_survives_reopen() {
        let clock = Rc::new(FixedClock::new(start()));
        let kv = Rc::new(MemoryStore::new());
        let id = {
            let mut s = session(&clock, Rc::clone(&kv));
            let goal = s.create_goal("Swim", GoalCategory::Health, 4.0, nine()).unwrap();
            s.log_progress(&goal.id, 1.0).unwrap();
            s.set_tone(Tone::Nuclear).unwrap();
            s.set_time(Some("7:05")).unwrap();
            s.complete_onboarding().unwrap();
            goal.id
        };

        let s = session(&clock, kv);
        assert_eq!(s.goal(&id).unwrap().progress, 1.0);
        assert_eq!(s.settings().tone, Tone::Nuclear);
        assert_eq!(s.settings().time.as_deref(), Some("07:05"));
        assert!(s.is_onboarding_complete().unwrap());
    }

    #[test]
    fn invalid_time_is_rejected() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        let err = s.set_time(Some("noon")).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(s.settings().time, None);
    }

    #[test]
    fn persist_failure_keeps_in_memory_change() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = Session::open(
            clock.clone(),
            ReadOnlyStore,
            RecordingNotifier::new(),
            &Config::default(),
            Some(1),
        )
        .unwrap();
        let goal = Goal::new("Stretch", GoalCategory::Health, 1.0, nine(), start()).unwrap();
        let err = s.add_goal(goal).unwrap_err();
        assert!(matches!(err, CoreError::Storage(StorageError::Locked)));
        assert_eq!(s.goals().len(), 1);
    }

    #[test]
    fn burst_of_changes_rebuilds_once() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        s.create_goal("A", GoalCategory::Work, 3.0, nine()).unwrap();
        s.create_goal("B", GoalCategory::Work, 3.0, nine()).unwrap();
        s.set_tone(Tone::TryMe).unwrap();

        let report = s.reschedule_if_needed().unwrap().unwrap();
        assert_eq!(report.scheduled.len(), 6);
        assert_eq!(s.orchestrator().runs(), 1);
        assert_eq!(s.notifier().pending().len(), 6);

        assert!(s.reschedule_if_needed().unwrap().is_none());
        s.set_test_mode(true).unwrap();
        assert!(s.reschedule_if_needed().unwrap().is_none());
        assert_eq!(s.orchestrator().runs(), 1);
    }

    #[test]
    fn logging_removes_todays_reminder() {
        let clock = Rc::new(FixedClock::new(start()));
        let mut s = session(&clock, Rc::new(MemoryStore::new()));
        let goal = s.create_goal("A", GoalCategory::Work, 3.0, nine()).unwrap();
        s.reschedule_if_needed().unwrap();
        assert_eq!(s.notifier().pending().len(), 3);

        s.log_progress(&goal.id, 1.0).unwrap();
        let report = s.reschedule_if_needed().unwrap().unwrap();
        assert_eq!(report.scheduled.len(), 2);
        assert!(report.scheduled.iter().all(|r| r.day_offset > 0));
    }
}
