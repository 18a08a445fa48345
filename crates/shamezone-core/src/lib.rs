//! # ShameZone Core Library
//!
//! Goal tracking with tone-driven accountability reminders. The CLI binary
//! and any other front end drive everything through this crate.
//!
//! ## Architecture
//!
//! - **Goal Store**: ordered in-memory goal list with an event outbox
//! - **Statistics**: goals crushed, logging streak and missed days
//! - **Notifications**: fire-time policy per tone, handed to a [`Notifier`]
//! - **Orchestrator**: rebuilds the reminder schedule after changes,
//!   coalescing bursts into a single run
//! - **Storage**: key-value state (SQLite or memory) and TOML configuration
//!
//! ## Key Components
//!
//! - [`Session`]: one user's state, persistence and scheduling
//! - [`GoalStore`]: goal list and progress logging
//! - [`Database`]: SQLite state and local notification queue
//! - [`Config`]: application configuration management

pub mod accountability;
pub mod clock;
pub mod error;
pub mod events;
pub mod goals;
pub mod messages;
pub mod notify;
pub mod orchestrator;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;

pub use accountability::{GoalStatus, LogVerdict};
pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use error::{ConfigError, CoreError, NotificationError, StorageError, ValidationError};
pub use events::Event;
pub use goals::{Goal, GoalCategory, GoalStore};
pub use notify::{NotificationHandle, Notifier, RecordingNotifier};
pub use orchestrator::{OrchestratorConfig, RescheduleReport, ScheduleOrchestrator};
pub use session::Session;
pub use settings::{Settings, Tone};
pub use stats::GoalStats;
pub use storage::{Config, Database, KeyValueStore, MemoryStore, StateStore};
