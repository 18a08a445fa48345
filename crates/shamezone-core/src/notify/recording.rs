use std::collections::HashSet;

use super::{NotificationHandle, Notifier};
use crate::error::NotificationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedNotification {
    pub handle: NotificationHandle,
    pub fire_in_secs: u64,
    pub title: String,
    pub body: String,
}

/// In-memory notifier that records what it was asked to do.
///
/// Used for previews and tests. It can be told to deny permission or to
/// fail specific schedule calls (by 0-based call index).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    granted: bool,
    grant_on_request: bool,
    pending: Vec<RecordedNotification>,
    next_id: u64,
    schedule_calls: usize,
    fail_calls: HashSet<usize>,
    fail_cancel: bool,
    pub permission_requests: usize,
    pub cancel_calls: usize,
}

impl RecordingNotifier {
    /// A notifier that grants permission when asked.
    pub fn new() -> Self {
        Self {
            grant_on_request: true,
            ..Default::default()
        }
    }

    /// A notifier whose permission prompt is always refused.
    pub fn denying() -> Self {
        Self::default()
    }

    /// Start out with permission already granted.
    pub fn pre_granted() -> Self {
        Self {
            granted: true,
            grant_on_request: true,
            ..Default::default()
        }
    }

    /// Make the `index`-th schedule call (counting from 0) fail.
    pub fn fail_schedule_call(mut self, index: usize) -> Self {
        self.fail_calls.insert(index);
        self
    }

    pub fn fail_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn pending(&self) -> &[RecordedNotification] {
        &self.pending
    }

    pub fn is_granted(&self) -> bool {
        self.granted
    }
}

impl Notifier for RecordingNotifier {
    fn permission_granted(&mut self) -> Result<bool, NotificationError> {
        Ok(self.granted)
    }

    fn request_permission(&mut self) -> Result<bool, NotificationError> {
        self.permission_requests += 1;
        if self.grant_on_request {
            self.granted = true;
        }
        Ok(self.granted)
    }

    fn cancel_all(&mut self) -> Result<(), NotificationError> {
        self.cancel_calls += 1;
        if self.fail_cancel {
            return Err(NotificationError::CancelFailed("service offline".into()));
        }
        self.pending.clear();
        Ok(())
    }

    fn schedule_at(
        &mut self,
        fire_in_secs: u64,
        title: &str,
        body: &str,
    ) -> Result<NotificationHandle, NotificationError> {
        let call = self.schedule_calls;
        self.schedule_calls += 1;
        if self.fail_calls.contains(&call) {
            return Err(NotificationError::ScheduleFailed(format!(
                "rejected call #{call}"
            )));
        }
        self.next_id += 1;
        let handle = NotificationHandle(format!("rec-{}", self.next_id));
        self.pending.push(RecordedNotification {
            handle: handle.clone(),
            fire_in_secs,
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(handle)
    }
}
