//! Reminder scheduling against an external notification service.
//!
//! The core never delivers anything itself. It computes fire times, picks
//! message content, and hands `(offset, title, body)` triples to a
//! [`Notifier`]. Offsets are relative seconds rather than wall-clock
//! triggers so the schedule survives time zone representation differences
//! between this process and the delivering platform.

mod recording;
mod schedule;

pub use recording::{RecordedNotification, RecordingNotifier};
pub use schedule::{
    cancel_all_scheduled_notifications, fire_times, nuclear_fire_minutes,
    schedule_goal_notification, setup_notification_permissions, FireContext, NuclearPolicy,
    ScheduleFailure, ScheduleOutcome, ScheduledReminder, NOTIFICATION_TITLE,
};

use serde::{Deserialize, Serialize};

use crate::error::NotificationError;

/// Opaque identifier returned by the service for a scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationHandle(pub String);

impl std::fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// External notification service.
pub trait Notifier {
    /// Whether permission has already been granted.
    fn permission_granted(&mut self) -> Result<bool, NotificationError>;

    /// Ask the platform for permission. Returns the resulting grant.
    fn request_permission(&mut self) -> Result<bool, NotificationError>;

    /// Drop every pending notification for this app.
    fn cancel_all(&mut self) -> Result<(), NotificationError>;

    /// Schedule a notification `fire_in_secs` seconds from now.
    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError>;
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn permission_granted(&mut self) -> Result<bool, NotificationError> {
        (**self).permission_granted()
    }

    fn request_permission(&mut self) -> Result<bool, NotificationError> {
        (**self).request_permission()
    }

    fn cancel_all(&mut self) -> Result<(), NotificationError> {
        (**self).cancel_all()
    }

    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        (**self).schedule_at(fire_in_secs, title, body)
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn permission_granted(&mut self) -> Result<bool, NotificationError> {
        (**self).permission_granted()
    }

    fn request_permission(&mut self) -> Result<bool, NotificationError> {
        (**self).request_permission()
    }

    fn cancel_all(&mut self) -> Result<(), NotificationError> {
        (**self).cancel_all()
    }

    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        (**self).schedule_at(fire_in_secs, title, body)
    }
}
