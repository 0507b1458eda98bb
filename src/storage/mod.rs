// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Key/value storage for session credentials.
//!
//! Backends behave like a browser's local storage: string keys, string values,
//! and a change feed that reports mutations made through *other* handles onto
//! the same underlying data.

mod file;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;

pub use file::File;
pub use memory::Memory;

const EVENT_CAPACITY: usize = 64;

pub trait IsPersistent {
    fn is_persistent(&self) -> bool;
}

impl<T: IsPersistent + ?Sized> IsPersistent for Box<T> {
    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }
}

impl<T: IsPersistent + ?Sized> IsPersistent for Arc<T> {
    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }
}

#[async_trait]
pub trait Storage: Send + Sync + IsPersistent {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing a key that is not present succeeds without publishing a
    /// change.
    async fn remove(&self, key: &str) -> Result<()>;
    fn subscribe(&self) -> Changes;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Box<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }

    fn subscribe(&self) -> Changes {
        (**self).subscribe()
    }
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key).await
    }

    fn subscribe(&self) -> Changes {
        (**self).subscribe()
    }
}

/// A mutation observed on shared storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageEvent {
    /// The key that changed. `None` means the subscriber lost track of
    /// individual changes and must re-read everything it cares about.
    pub key: Option<String>,
    pub new_value: Option<String>,
    origin: Uuid,
}

impl StorageEvent {
    fn changed(origin: Uuid, key: &str, new_value: Option<&str>) -> Self {
        Self {
            key: Some(key.to_owned()),
            new_value: new_value.map(str::to_owned),
            origin,
        }
    }

    fn unknown() -> Self {
        Self {
            key: None,
            new_value: None,
            origin: Uuid::nil(),
        }
    }

    pub fn concerns(&self, keys: &[&str]) -> bool {
        self.key
            .as_deref()
            .map_or(true, |key| keys.contains(&key))
    }
}

/// Publishing half of a change feed, shared by every handle on the same data.
#[derive(Clone)]
pub(crate) struct Feed {
    tx: broadcast::Sender<StorageEvent>,
}

impl Feed {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub(crate) fn publish(&self, origin: Uuid, key: &str, new_value: Option<&str>) {
        // No subscribers is not an error.
        _ = self.tx.send(StorageEvent::changed(origin, key, new_value));
    }

    pub(crate) fn subscribe(&self, origin: Uuid) -> Changes {
        Changes {
            origin,
            rx: self.tx.subscribe(),
        }
    }
}

/// The change feed as seen from one handle. Changes made through the handle
/// itself are filtered out.
pub struct Changes {
    origin: Uuid,
    rx: broadcast::Receiver<StorageEvent>,
}

impl Changes {
    /// Waits for the next foreign change. Returns `None` once every handle on
    /// the underlying data has been dropped.
    pub async fn next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {} storage change notifications", skipped);
                    return Some(StorageEvent::unknown());
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_concern_listed_keys_only() {
        let origin = Uuid::new_v4();
        let event = StorageEvent::changed(origin, "auth_token", None);
        assert!(event.concerns(&["auth_token", "isAuthenticated"]));
        assert!(!event.concerns(&["theme"]));
    }

    #[test]
    fn unknown_events_concern_everything() {
        assert!(StorageEvent::unknown().concerns(&["auth_token"]));
    }

    #[tokio::test]
    async fn lagging_subscribers_are_told_to_resync() {
        let feed = Feed::new();
        let mut changes = feed.subscribe(Uuid::new_v4());
        let writer = Uuid::new_v4();
        for n in 0..=EVENT_CAPACITY {
            feed.publish(writer, "counter", Some(&n.to_string()));
        }

        let event = changes.next().await.unwrap();
        assert_eq!(event.key, None);
    }
}
