use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

use shared::{
    domain::{NotificationId, NotificationKind, ViewName},
    error::NotificationError,
    protocol::NotificationRecord,
};

use crate::WorkspaceEvent;

/// Maps a notification onto the screen that shows its subject.
pub fn resolve_target(record: &NotificationRecord) -> Result<ViewName, NotificationError> {
    match record.kind {
        NotificationKind::Task => Ok(ViewName::Tasks),
        NotificationKind::Meeting => Ok(ViewName::Meetings),
        NotificationKind::Payout => Ok(ViewName::Payouts),
        NotificationKind::Other => Err(NotificationError::UnknownKind(record.id)),
    }
}

/// Session-local notification list. The unread count is always derived
/// from the list; there is no separately maintained counter to drift.
pub struct NotificationCenter {
    inner: Mutex<Vec<NotificationRecord>>,
    events: broadcast::Sender<WorkspaceEvent>,
}

impl NotificationCenter {
    pub(crate) fn new(events: broadcast::Sender<WorkspaceEvent>) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Replaces the whole list with a fresh backend snapshot, ordered
    /// oldest first so the most recent lands at the end.
    pub fn replace_all(&self, mut records: Vec<NotificationRecord>) {
        records.sort_by_key(|record| record.created_at);
        let unread = records.iter().filter(|record| !record.read).count();
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = records;
        let _ = self
            .events
            .send(WorkspaceEvent::NotificationsUpdated { unread });
    }

    pub fn list(&self) -> Vec<NotificationRecord> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: NotificationId) -> Option<NotificationRecord> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    pub fn unread_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| !record.read)
            .count()
    }

    /// Marks one notification read. Idempotent: returns `Ok(true)` when
    /// the flag flipped and `Ok(false)` when it was already read.
    pub fn mark_as_read(&self, id: NotificationId) -> Result<bool, NotificationError> {
        let (flipped, unread) = {
            let mut records = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let record = records
                .iter_mut()
                .find(|record| record.id == id)
                .ok_or(NotificationError::NotFound(id))?;
            let flipped = !record.read;
            record.read = true;
            (
                flipped,
                records.iter().filter(|record| !record.read).count(),
            )
        };
        if flipped {
            let _ = self
                .events
                .send(WorkspaceEvent::NotificationsUpdated { unread });
        }
        Ok(flipped)
    }

    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        let _ = self
            .events
            .send(WorkspaceEvent::NotificationsUpdated { unread: 0 });
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
