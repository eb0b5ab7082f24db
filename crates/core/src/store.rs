//! Application state shared by everything rendering the portal.
//!
//! Holds the signed-in user and the notification feed. Handles are cheap to
//! clone and all clones see the same state; `reset` is called on logout.

use crate::types::{Notification, ResourceId, User};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct StoreInner {
    user: Option<User>,
    notifications: Vec<Notification>,
    unread: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AppStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn set_user(&self, user: Option<User>) {
        self.write().user = user;
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    /// Newest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.read().notifications.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.read().unread
    }

    pub fn add_notification(&self, notification: Notification) {
        let mut inner = self.write();
        if !notification.read {
            inner.unread += 1;
        }
        inner.notifications.insert(0, notification);
    }

    /// Mark one notification read. Returns false when the id is unknown.
    pub fn mark_read(&self, id: &ResourceId) -> bool {
        let mut guard = self.write();
        let inner = &mut *guard;
        let Some(notification) = inner.notifications.iter_mut().find(|n| &n.id == id) else {
            return false;
        };
        if !notification.read {
            notification.read = true;
            inner.unread = inner.unread.saturating_sub(1);
        }
        true
    }

    pub fn clear_notifications(&self) {
        let mut inner = self.write();
        inner.notifications.clear();
        inner.unread = 0;
    }

    /// Drop everything tied to the current session
    pub fn reset(&self) {
        *self.write() = StoreInner::default();
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
