//! Typed access to persisted app state on top of a [`KeyValueStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KeyValueStore;
use crate::error::StorageError;
use crate::goals::Goal;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    Goals,
    Settings,
    OnboardingComplete,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Goals => "goals",
            StateKey::Settings => "settings",
            StateKey::OnboardingComplete => "onboardingComplete",
        }
    }
}

pub struct StateStore<S> {
    kv: S,
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn inner(&self) -> &S {
        &self.kv
    }

    fn load<T: DeserializeOwned>(&self, key: StateKey) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key.as_str())? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.as_str().to_string(),
                message: e.to_string(),
            })
    }

    fn save<T: Serialize + ?Sized>(&self, key: StateKey, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::Encode {
            key: key.as_str().to_string(),
            message: e.to_string(),
        })?;
        self.kv.set(key.as_str(), &raw)
    }

    pub fn load_goals(&self) -> Result<Vec<Goal>, StorageError> {
        Ok(self.load(StateKey::Goals)?.unwrap_or_default())
    }

    pub fn save_goals(&self, goals: &[Goal]) -> Result<(), StorageError> {
        self.save(StateKey::Goals, goals)
    }

    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.load(StateKey::Settings)?.unwrap_or_default())
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        self.save(StateKey::Settings, settings)
    }

    pub fn is_onboarding_complete(&self) -> Result<bool, StorageError> {
        Ok(self.kv.get(StateKey::OnboardingComplete.as_str())?.as_deref() == Some("true"))
    }

    pub fn set_onboarding_complete(&self) -> Result<(), StorageError> {
        self.kv.set(StateKey::OnboardingComplete.as_str(), "true")
    }

    /// Forget goals, settings and onboarding.
    pub fn clear(&self) -> Result<(), StorageError> {
        for key in [StateKey::Goals, StateKey::Settings, StateKey::OnboardingComplete] {
            self.kv.remove(key.as_str())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::GoalCategory;
    use crate::settings::Tone;
    use crate::storage::MemoryStore;
    use chrono::{FixedOffset, NaiveTime, TimeZone};

    #[test]
    fn missing_state_loads_defaults() {
        let state = StateStore::new(MemoryStore::new());
        assert!(state.load_goals().unwrap().is_empty());
        assert_eq!(state.load_settings().unwrap(), Settings::default());
        assert!(!state.is_onboarding_complete().unwrap());
    }

    #[test]
    fn goals_and_settings_persist() {
        let state = StateStore::new(MemoryStore::new());
        let created = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 2, 1, 9, 0, 0)
            .unwrap();
        let goal = Goal::new(
            "Write",
            GoalCategory::Work,
            3.0,
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            created,
        )
        .unwrap();
        state.save_goals(std::slice::from_ref(&goal)).unwrap();
        state
            .save_settings(&Settings {
                tone: Tone::Nuclear,
                time: None,
                test_mode: true,
            })
            .unwrap();
        state.set_onboarding_complete().unwrap();

        assert_eq!(state.load_goals().unwrap(), vec![goal]);
        assert_eq!(state.load_settings().unwrap().tone, Tone::Nuclear);
        assert!(state.is_onboarding_complete().unwrap());

        state.clear().unwrap();
        assert!(state.load_goals().unwrap().is_empty());
        assert!(!state.is_onboarding_complete().unwrap());
    }

    #[test]
    fn corrupt_value_is_reported_with_key() {
        let kv = MemoryStore::new();
        kv.set("goals", "{not json").unwrap();
        let state = StateStore::new(kv);
        match state.load_goals() {
            Err(StorageError::Corrupt { key, .. }) => assert_eq!(key, "goals"),
            other => panic!("expected corrupt error, got {other:?}"),
        }
    }
}
