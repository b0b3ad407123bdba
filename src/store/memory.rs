//! In-process list store for tests and embedded use.
//!
//! Implements the [`ListStore`] contract over a mutex-guarded map of
//! lists. A batch executes under a single lock acquisition, which gives it
//! the same all-or-nothing visibility as a store-native transaction. Key
//! TTLs are honored against the injected [`Clock`]: an expired key reads
//! as absent and is dropped on next access.

use std::{
    collections::{HashMap, VecDeque},
    future::Future,
    pin::Pin,
    sync::Arc,
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::Result,
    key::BufferKey,
    store::{CommandReply, ListCommand, ListStore},
    time::{Clock, SystemClock},
};

#[derive(Debug)]
struct ListEntry {
    items: VecDeque<String>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Lists(HashMap<String, ListEntry>);

impl Lists {
    /// Returns the live entry for `key`, evicting it first if expired.
    fn live(&mut self, key: &BufferKey, now: DateTime<Utc>) -> Option<&mut ListEntry> {
        if let Some(entry) = self.0.get(key.as_str()) {
            if entry.expires_at.is_some_and(|deadline| deadline <= now) {
                self.0.remove(key.as_str());
            }
        }
        self.0.get_mut(key.as_str())
    }

    fn push_front(&mut self, key: &BufferKey, value: String, now: DateTime<Utc>) {
        if let Some(entry) = self.live(key, now) {
            entry.items.push_front(value);
        } else {
            let mut items = VecDeque::new();
            items.push_front(value);
            self.0.insert(key.as_str().to_owned(), ListEntry { items, expires_at: None });
        }
    }

    fn trim(&mut self, key: &BufferKey, start: isize, stop: isize, now: DateTime<Utc>) {
        let Some(entry) = self.live(key, now) else { return };
        let (start, stop) = normalize(start, stop, entry.items.len());
        match stop {
            Some(stop) => {
                entry.items.truncate(stop + 1);
                entry.items.drain(..start.min(entry.items.len()));
            },
            // Empty range deletes the key, as the store contract has it.
            None => {
                self.0.remove(key.as_str());
            },
        }
    }

    fn expire(&mut self, key: &BufferKey, ttl: Duration, now: DateTime<Utc>) {
        if let Some(entry) = self.live(key, now) {
            // An unrepresentable deadline degrades to "never expires".
            entry.expires_at =
                chrono::Duration::from_std(ttl).ok().and_then(|ttl| now.checked_add_signed(ttl));
        }
    }

    fn range(&mut self, key: &BufferKey, start: isize, stop: isize, now: DateTime<Utc>) -> Vec<String> {
        let Some(entry) = self.live(key, now) else { return Vec::new() };
        let (start, stop) = normalize(start, stop, entry.items.len());
        match stop {
            Some(stop) => entry.items.iter().skip(start).take(stop - start + 1).cloned().collect(),
            None => Vec::new(),
        }
    }
}

/// Resolves inclusive, possibly negative indices against a list length.
///
/// Returns `(start, Some(stop))` with `start <= stop < len`, or `None` for
/// an empty range.
fn normalize(start: isize, stop: isize, len: usize) -> (usize, Option<usize>) {
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len || stop < 0 {
        (0, None)
    } else {
        (start as usize, Some(stop as usize))
    }
}

/// In-memory [`ListStore`] implementation.
///
/// Intended for tests and single-process embedders; contents do not
/// survive a restart.
#[derive(Debug)]
pub struct MemoryListStore {
    clock: Arc<dyn Clock>,
    lists: Mutex<Lists>,
}

impl MemoryListStore {
    /// Creates a store using the system clock for TTL enforcement.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a store with an injected clock so tests can drive expiry.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock, lists: Mutex::new(Lists::default()) }
    }

    /// Current length of the list at `key`, for test assertions.
    pub async fn len(&self, key: &BufferKey) -> usize {
        let now = self.clock.now();
        let mut lists = self.lists.lock().await;
        lists.live(key, now).map_or(0, |entry| entry.items.len())
    }
}

impl Default for MemoryListStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ListStore for MemoryListStore {
    fn execute(
        &self,
        batch: Vec<ListCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommandReply>>> + Send + '_>> {
        Box::pin(async move {
            let now = self.clock.now();
            let mut lists = self.lists.lock().await;

            let mut replies = Vec::with_capacity(batch.len());
            for command in batch {
                match command {
                    ListCommand::PushFront { key, value } => {
                        lists.push_front(&key, value, now);
                        replies.push(CommandReply::Done);
                    },
                    ListCommand::Trim { key, start, stop } => {
                        lists.trim(&key, start, stop, now);
                        replies.push(CommandReply::Done);
                    },
                    ListCommand::Expire { key, ttl } => {
                        lists.expire(&key, ttl, now);
                        replies.push(CommandReply::Done);
                    },
                    ListCommand::Range { key, start, stop } => {
                        replies.push(CommandReply::Values(lists.range(&key, start, stop, now)));
                    },
                }
            }
            Ok(replies)
        })
    }

    fn range(
        &self,
        key: BufferKey,
        start: isize,
        stop: isize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>> {
        Box::pin(async move {
            let now = self.clock.now();
            let mut lists = self.lists.lock().await;
            Ok(lists.range(&key, start, stop, now))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::IntegrationId, resolve, time::TestClock};

    fn key() -> BufferKey {
        resolve(IntegrationId(1), "issue.created", false)
    }

    async fn push(store: &MemoryListStore, value: &str) {
        store
            .execute(vec![ListCommand::PushFront { key: key(), value: value.to_owned() }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn push_front_orders_newest_first() {
        let store = MemoryListStore::new();
        push(&store, "a").await;
        push(&store, "b").await;

        let values = store.range(key(), 0, -1).await.unwrap();
        assert_eq!(values, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn trim_keeps_only_index_range() {
        let store = MemoryListStore::new();
        for value in ["a", "b", "c", "d"] {
            push(&store, value).await;
        }

        store.execute(vec![ListCommand::Trim { key: key(), start: 0, stop: 1 }]).await.unwrap();

        let values = store.range(key(), 0, -1).await.unwrap();
        assert_eq!(values, vec!["d", "c"]);
    }

    #[tokio::test]
    async fn range_on_missing_key_is_empty() {
        let store = MemoryListStore::new();
        let values = store.range(key(), 0, 99).await.unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn expired_key_reads_as_absent() {
        let clock = Arc::new(TestClock::new());
        let store = MemoryListStore::with_clock(clock.clone());

        push(&store, "a").await;
        store
            .execute(vec![ListCommand::Expire { key: key(), ttl: Duration::from_secs(60) }])
            .await
            .unwrap();

        clock.advance(Duration::from_secs(59));
        assert_eq!(store.range(key(), 0, -1).await.unwrap(), vec!["a"]);

        clock.advance(Duration::from_secs(2));
        assert!(store.range(key(), 0, -1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_after_expiry_starts_a_fresh_list() {
        let clock = Arc::new(TestClock::new());
        let store = MemoryListStore::with_clock(clock.clone());

        push(&store, "old").await;
        store
            .execute(vec![ListCommand::Expire { key: key(), ttl: Duration::from_secs(10) }])
            .await
            .unwrap();
        clock.advance(Duration::from_secs(11));

        push(&store, "new").await;
        assert_eq!(store.range(key(), 0, -1).await.unwrap(), vec!["new"]);
    }

    #[tokio::test]
    async fn batch_replies_align_with_submission_order() {
        let store = MemoryListStore::new();
        let replies = store
            .execute(vec![
                ListCommand::PushFront { key: key(), value: "a".into() },
                ListCommand::Range { key: key(), start: 0, stop: -1 },
                ListCommand::Trim { key: key(), start: 0, stop: 0 },
            ])
            .await
            .unwrap();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], CommandReply::Done);
        assert_eq!(replies[1], CommandReply::Values(vec!["a".into()]));
        assert_eq!(replies[2], CommandReply::Done);
    }
}
