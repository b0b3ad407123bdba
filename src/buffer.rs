//! Bounded request log buffer: write path and read/merge path.
//!
//! One buffer instance is scoped to a single integration and its injected
//! category set. Writes append to the per-category all-attempts list (and
//! the errors-only list for 4xx/5xx responses) as one atomic push/trim/
//! expire batch. Reads return a single category in store order, or merge
//! every category by recency.

use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{BufferError, Result},
    key::{resolve, BufferKey},
    models::{CategorySet, IntegrationRef, OrganizationId, RequestRecord, StoredRequest},
    store::{CommandReply, ListCommand, ListStore},
    time::{Clock, SystemClock},
    BUFFER_SIZE, KEY_EXPIRY,
};

/// Response codes recorded to the errors-only buffer, inclusive.
const ERROR_RANGE: std::ops::RangeInclusive<u16> = 400..=599;

/// Per-integration circular log of recent webhook delivery attempts.
///
/// Holds no internal tasks or locks; every operation is one round trip
/// against the store, executed on the caller's task. Concurrent writers
/// are safe because the push/trim/expire triple is submitted as a single
/// atomic batch. Reads are not snapshot-isolated against writes.
pub struct RequestLogBuffer<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    integration: IntegrationRef,
    categories: CategorySet,
}

impl<S: ListStore> RequestLogBuffer<S> {
    /// Creates a buffer for one integration using the system clock.
    ///
    /// `categories` is the externally enumerated set of valid event
    /// categories; writes to any other category are accepted and
    /// discarded.
    pub fn new(store: Arc<S>, integration: IntegrationRef, categories: CategorySet) -> Self {
        Self::with_clock(store, integration, categories, Arc::new(SystemClock))
    }

    /// Creates a buffer with an injected clock for deterministic tests.
    pub fn with_clock(
        store: Arc<S>,
        integration: IntegrationRef,
        categories: CategorySet,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, clock, integration, categories }
    }

    /// Records one delivery attempt.
    ///
    /// The record lands at the front of the all-attempts list for `event`,
    /// and additionally at the front of the errors-only list when
    /// `response_code` is in the 4xx/5xx range. Both lists are trimmed to
    /// [`BUFFER_SIZE`] and have their TTL refreshed to [`KEY_EXPIRY`]
    /// within the same atomic batch.
    ///
    /// An `event` outside the valid category set is a silent no-op: the
    /// attempt is accepted and discarded, never an error. Delivery logic
    /// must not break on a mistyped or retired category name.
    ///
    /// The organization id is only persisted for non-internal
    /// integrations; an internal integration's organization is implicit.
    ///
    /// # Errors
    ///
    /// Returns a store error if the batch could not be applied; the
    /// attempt is then simply not recorded.
    pub async fn add_request(
        &self,
        response_code: u16,
        organization_id: OrganizationId,
        event: &str,
        url: &str,
    ) -> Result<()> {
        if !self.categories.contains(event) {
            debug!(event, "discarding request for unknown event category");
            return Ok(());
        }

        let stored = StoredRequest {
            date: self.clock.now(),
            response_code,
            webhook_url: url.to_owned(),
            organization_id: (!self.integration.is_internal).then_some(organization_id),
        };
        let payload = serde_json::to_string(&stored)?;

        let mut batch = Vec::with_capacity(6);
        push_buffer_ops(&mut batch, self.key(event, false), payload.clone());
        if ERROR_RANGE.contains(&response_code) {
            push_buffer_ops(&mut batch, self.key(event, true), payload);
        }

        debug!(
            integration = %self.integration.id,
            event,
            response_code,
            error = ERROR_RANGE.contains(&response_code),
            "recording webhook delivery attempt"
        );
        self.store.execute(batch).await?;
        Ok(())
    }

    /// Returns recent delivery attempts, newest first.
    ///
    /// With `Some(event)`, reads that category's list in store order and
    /// stamps each record with the category. With `None`, fetches every
    /// category in the valid set as one atomic batch, merges by timestamp
    /// descending and truncates to [`BUFFER_SIZE`]. Records with identical
    /// timestamps have no guaranteed relative order.
    ///
    /// # Errors
    ///
    /// Returns a store error if the store is unreachable, or a malformed
    /// record error if a stored payload cannot be decoded. An empty or
    /// expired list is not an error; it contributes zero records.
    pub async fn get_requests(&self, event: Option<&str>) -> Result<Vec<RequestRecord>> {
        self.fetch(event, false).await
    }

    /// Returns recent failed delivery attempts, newest first.
    ///
    /// Identical shape to [`Self::get_requests`] but reads the errors-only
    /// lists (responses in the 4xx/5xx range).
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::get_requests`].
    pub async fn get_errors(&self, event: Option<&str>) -> Result<Vec<RequestRecord>> {
        self.fetch(event, true).await
    }

    fn key(&self, event: &str, error: bool) -> BufferKey {
        resolve(self.integration.id, event, error)
    }

    async fn fetch(&self, event: Option<&str>, error: bool) -> Result<Vec<RequestRecord>> {
        let last = BUFFER_SIZE as isize - 1;

        if let Some(event) = event {
            // Single-list order already reflects recency by the writer's
            // push/trim discipline; it is not re-sorted here.
            let payloads = self.store.range(self.key(event, error), 0, last).await?;
            return payloads.iter().map(|payload| decode(payload, event)).collect();
        }

        // One atomic batch of range reads, one per category in
        // enumeration order; replies come back in submission order.
        let batch = self
            .categories
            .iter()
            .map(|category| ListCommand::Range {
                key: self.key(category, error),
                start: 0,
                stop: last,
            })
            .collect();
        let replies = self.store.execute(batch).await?;

        let mut records = Vec::new();
        for (category, reply) in self.categories.iter().zip(replies) {
            let CommandReply::Values(payloads) = reply else {
                return Err(BufferError::store("range command returned no values"));
            };
            for payload in &payloads {
                records.push(decode(payload, category)?);
            }
        }

        // Full sort-then-truncate; at N categories x BUFFER_SIZE records a
        // k-way merge would buy nothing.
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records.truncate(BUFFER_SIZE);
        Ok(records)
    }
}

/// Appends the push/trim/refresh triple for one buffer key.
fn push_buffer_ops(batch: &mut Vec<ListCommand>, key: BufferKey, payload: String) {
    batch.push(ListCommand::PushFront { key: key.clone(), value: payload });
    batch.push(ListCommand::Trim { key: key.clone(), start: 0, stop: BUFFER_SIZE as isize - 1 });
    batch.push(ListCommand::Expire { key, ttl: KEY_EXPIRY });
}

fn decode(payload: &str, event: &str) -> Result<RequestRecord> {
    let stored: StoredRequest = serde_json::from_str(payload)?;
    Ok(stored.into_record(event))
}
