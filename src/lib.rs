//! Bounded, per-category retention buffer for webhook delivery attempts.
//!
//! Integrations deliver webhooks to third-party destinations; operators need
//! to answer "what did we recently send, and what recently failed" without
//! unbounded storage growth. This crate keeps the most recent
//! [`BUFFER_SIZE`] delivery attempts (and, separately, the most recent
//! failed attempts) per event category, per integration, inside an external
//! keyed-list store with a rolling [`KEY_EXPIRY`] so idle keys vanish on
//! their own.
//!
//! # Architecture
//!
//! The single entry point is [`RequestLogBuffer`], which composes three
//! internal pieces:
//!
//! 1. **Key resolution** ([`key`]) - deterministic mapping from
//!    (integration, category, error flag) to a store key.
//! 2. **Bounded writes** ([`RequestLogBuffer::add_request`]) - push, trim
//!    and TTL refresh submitted as one atomic batch.
//! 3. **Reads and merging** ([`RequestLogBuffer::get_requests`],
//!    [`RequestLogBuffer::get_errors`]) - a single category read in store
//!    order, or a cross-category fetch merged by recency.
//!
//! The store itself is abstracted behind the [`store::ListStore`] trait.
//! [`store::MemoryListStore`] is always available for tests and embedded
//! use; a Redis-backed implementation is available behind the `redis`
//! cargo feature.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use hooklog::{
//!     store::MemoryListStore, CategorySet, IntegrationId, IntegrationRef,
//!     OrganizationId, RequestLogBuffer,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> hooklog::Result<()> {
//! let categories = CategorySet::new(["issue.created", "issue.resolved"]);
//! let store = Arc::new(MemoryListStore::new());
//! let integration = IntegrationRef { id: IntegrationId(42), is_internal: false };
//! let buffer = RequestLogBuffer::new(store, integration, categories);
//!
//! buffer
//!     .add_request(503, OrganizationId(7), "issue.created", "https://example.com/hook")
//!     .await?;
//!
//! let recent_failures = buffer.get_errors(None).await?;
//! assert_eq!(recent_failures.len(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::time::Duration;

pub mod buffer;
pub mod error;
pub mod key;
pub mod models;
pub mod store;
pub mod time;

pub use buffer::RequestLogBuffer;
pub use error::{BufferError, Result};
pub use key::{resolve, BufferKey};
pub use models::{
    CategorySet, IntegrationId, IntegrationRef, OrganizationId, RequestRecord, StoredRequest,
};
pub use time::{Clock, SystemClock, TestClock};

/// Maximum number of records retained per buffer key, newest first.
pub const BUFFER_SIZE: usize = 100;

/// Rolling time-to-live applied to every buffer key on each write.
///
/// A key that receives no writes for this long expires along with its
/// records; expiry is the only cleanup mechanism besides trim eviction.
pub const KEY_EXPIRY: Duration = Duration::from_secs(30 * 24 * 60 * 60);
