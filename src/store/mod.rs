//! Keyed-list store abstraction.
//!
//! The buffer depends on exactly four list primitives, usable individually
//! or batched atomically: prepend, trim to an index range, refresh a key
//! TTL, and read an index range. The trait keeps the buffer testable
//! without a live store and lets deployments pick their backend:
//! [`MemoryListStore`] is always compiled, a Redis implementation is
//! available behind the `redis` cargo feature.

use std::{future::Future, pin::Pin, time::Duration};

use crate::{error::Result, key::BufferKey};

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

pub use memory::MemoryListStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisListStore;

/// One list operation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    /// Prepend a value; the list grows unbounded unless trimmed.
    PushFront {
        /// Key of the target list.
        key: BufferKey,
        /// Serialized value to prepend.
        value: String,
    },
    /// Keep only the elements in the inclusive index range.
    Trim {
        /// Key of the target list.
        key: BufferKey,
        /// First index kept.
        start: isize,
        /// Last index kept.
        stop: isize,
    },
    /// Reset the remaining time-to-live of a key.
    Expire {
        /// Key of the target list.
        key: BufferKey,
        /// New time-to-live.
        ttl: Duration,
    },
    /// Read the elements in the inclusive index range, store-native order.
    Range {
        /// Key of the target list.
        key: BufferKey,
        /// First index read.
        start: isize,
        /// Last index read.
        stop: isize,
    },
}

/// Per-operation reply, aligned with batch submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// A write operation completed.
    Done,
    /// Values returned by a [`ListCommand::Range`].
    Values(Vec<String>),
}

/// Ordered list operations against an external keyed store.
///
/// `execute` must apply the whole batch as a single all-or-nothing unit:
/// two concurrent writers interleaving pushes and trims on the same key
/// must never be observable mid-batch. A missing or expired key reads as
/// an empty list, never as an error.
pub trait ListStore: Send + Sync + 'static {
    /// Executes a batch of commands atomically.
    ///
    /// Replies are returned in submission order, one per command.
    ///
    /// # Errors
    ///
    /// Returns a store error if the batch could not be applied; partial
    /// application is never reported as success.
    fn execute(
        &self,
        batch: Vec<ListCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<CommandReply>>> + Send + '_>>;

    /// Reads one index range from one list.
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is unreachable.
    fn range(
        &self,
        key: BufferKey,
        start: isize,
        stop: isize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + '_>>;
}
