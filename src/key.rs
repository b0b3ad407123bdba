//! Buffer key derivation.
//!
//! Every bounded list lives under a key derived from the integration id,
//! the event category, and whether the list is the errors-only subset. The
//! two namespaces use distinct prefixes so they can never collide, and the
//! integration id is wrapped in braces as a cluster hash tag so both lists
//! for one integration land on the same cluster slot.

use std::fmt;

use crate::models::IntegrationId;

/// Derived identifier selecting one bounded list in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BufferKey(String);

impl BufferKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BufferKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the buffer key for one integration, category and error flag.
///
/// Pure derivation; category membership is not validated here (the write
/// path checks membership before any key is used).
pub fn resolve(integration_id: IntegrationId, event: &str, error: bool) -> BufferKey {
    if error {
        BufferKey(format!("integration-webhook-error:{{{integration_id}}}:{event}"))
    } else {
        BufferKey(format!("integration-webhook-request:{{{integration_id}}}:{event}"))
    }
}
