// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

use super::{Changes, Feed, IsPersistent, Storage};

struct Shared {
    data: RwLock<HashMap<String, String>>,
    feed: Feed,
}

/// Process-local storage. Every handle returned by [`Memory::share`] sees the
/// same data and is notified of changes made through the others.
pub struct Memory {
    origin: Uuid,
    shared: Arc<Shared>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn share(&self) -> Self {
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl IsPersistent for Memory {
    fn is_persistent(&self) -> bool {
        false
    }
}

#[async_trait]
impl Storage for Memory {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self.shared.data.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.shared.data.write().await;
        _ = guard.insert(key.to_owned(), value.to_owned());
        self.shared.feed.publish(self.origin, key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.shared.data.write().await;
        if guard.remove(key).is_some() {
            self.shared.feed.publish(self.origin, key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> Changes {
        self.shared.feed.subscribe(self.origin)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::new(Shared {
                data: RwLock::new(HashMap::new()),
                feed: Feed::new(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn missing_keys_read_as_none() {
        let storage = Memory::new();
        assert_eq!(storage.get("auth_token").await.unwrap(), None);
        storage.remove("auth_token").await.unwrap();
    }

    #[tokio::test]
    async fn shared_handles_see_each_others_writes() {
        let first = Memory::new();
        let second = first.share();

        first.set("auth_token", "abc123").await.unwrap();
        assert_eq!(
            second.get("auth_token").await.unwrap().as_deref(),
            Some("abc123")
        );

        second.remove("auth_token").await.unwrap();
        assert_eq!(first.get("auth_token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn changes_are_only_reported_to_other_handles() {
        let first = Memory::new();
        let second = first.share();
        let mut own = first.subscribe();
        let mut foreign = second.subscribe();

        first.set("isAuthenticated", "true").await.unwrap();

        let event = foreign.next().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("isAuthenticated"));
        assert_eq!(event.new_value.as_deref(), Some("true"));

        assert!(timeout(Duration::from_millis(20), own.next()).await.is_err());
    }

    #[tokio::test]
    async fn removing_an_absent_key_is_silent() {
        let first = Memory::new();
        let second = first.share();
        let mut foreign = second.subscribe();

        first.remove("auth_token").await.unwrap();
        first.set("theme", "dark").await.unwrap();

        let event = foreign.next().await.unwrap();
        assert_eq!(event.key.as_deref(), Some("theme"));
    }
}
