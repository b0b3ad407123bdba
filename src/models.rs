//! Domain models and strongly-typed identifiers.
//!
//! Defines the persisted request payload, the record shape handed back to
//! readers, newtype ID wrappers, and the injected set of valid event
//! categories. The identity of the owning integration is reduced to exactly
//! what the buffer needs: an id for key derivation and an "is internal"
//! flag that decides whether the organization id is worth storing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Strongly-typed integration (app) identifier.
///
/// Partitions buffer keys between integrations. The buffer never
/// interprets the value beyond embedding it in key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntegrationId(pub u64);

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for IntegrationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Strongly-typed organization identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrganizationId(pub u64);

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrganizationId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The slice of integration identity the buffer depends on.
///
/// An internal integration's organization is fixed and implicit, so its
/// records never carry an `organization_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationRef {
    /// Identifier embedded in every buffer key for this integration.
    pub id: IntegrationId,
    /// Whether the integration is internal to its owning organization.
    pub is_internal: bool,
}

/// Ordered set of valid event category names.
///
/// Supplied externally and treated as opaque strings; the set can change
/// between deployments without a rebuild. Enumeration order is preserved
/// because the cross-category read fetches lists in this order.
#[derive(Debug, Clone, Default)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    /// Builds a category set, preserving first-occurrence order and
    /// dropping duplicates.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for category in categories {
            let category = category.into();
            if !names.contains(&category) {
                names.push(category);
            }
        }
        Self(names)
    }

    /// Returns true if `category` is a member of the set.
    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    /// Iterates category names in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of categories in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no categories.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The payload persisted in the list store, one per delivery attempt.
///
/// The event category is deliberately absent: the list key already encodes
/// it, and it is stamped back onto the record at read time. `date` is
/// serialized as an RFC 3339 string so stored payloads stay inspectable
/// with store-native tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRequest {
    /// When the delivery attempt was recorded; the sole sort key.
    pub date: DateTime<Utc>,
    /// HTTP status of the attempt.
    pub response_code: u16,
    /// Destination URL the webhook was sent to.
    pub webhook_url: String,
    /// Owning organization; omitted entirely for internal integrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
}

impl StoredRequest {
    /// Attaches the source category, producing the reader-facing record.
    pub fn into_record(self, event_type: impl Into<String>) -> RequestRecord {
        RequestRecord {
            date: self.date,
            response_code: self.response_code,
            webhook_url: self.webhook_url,
            organization_id: self.organization_id,
            event_type: event_type.into(),
        }
    }
}

/// One delivery attempt as returned to callers.
///
/// Identical to [`StoredRequest`] plus the event category reconstructed
/// from the list key it was read out of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestRecord {
    /// When the delivery attempt was recorded.
    pub date: DateTime<Utc>,
    /// HTTP status of the attempt.
    pub response_code: u16,
    /// Destination URL the webhook was sent to.
    pub webhook_url: String,
    /// Owning organization, when the integration is not internal.
    pub organization_id: Option<OrganizationId>,
    /// Category the attempt was recorded under.
    pub event_type: String,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn stored_request_omits_absent_organization() {
        let stored = StoredRequest {
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            response_code: 200,
            webhook_url: "https://example.com/hook".into(),
            organization_id: None,
        };

        let json = serde_json::to_string(&stored).unwrap();
        assert!(!json.contains("organization_id"));

        let restored: StoredRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stored);
    }

    #[test]
    fn stored_request_round_trips_with_organization() {
        let stored = StoredRequest {
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            response_code: 503,
            webhook_url: "https://example.com/hook".into(),
            organization_id: Some(OrganizationId(99)),
        };

        let json = serde_json::to_string(&stored).unwrap();
        let restored: StoredRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stored);
    }

    #[test]
    fn date_serializes_as_parseable_timestamp_string() {
        let stored = StoredRequest {
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 45).unwrap(),
            response_code: 200,
            webhook_url: "https://example.com/hook".into(),
            organization_id: None,
        };

        let value: serde_json::Value = serde_json::to_value(&stored).unwrap();
        let date = value["date"].as_str().expect("date should be a string");
        assert!(date.parse::<DateTime<Utc>>().is_ok());
    }

    #[test]
    fn into_record_stamps_event_type() {
        let stored = StoredRequest {
            date: Utc::now(),
            response_code: 404,
            webhook_url: "https://example.com/hook".into(),
            organization_id: Some(OrganizationId(7)),
        };

        let record = stored.clone().into_record("issue.created");
        assert_eq!(record.event_type, "issue.created");
        assert_eq!(record.response_code, stored.response_code);
        assert_eq!(record.organization_id, stored.organization_id);
    }

    #[test]
    fn category_set_preserves_order_and_dedupes() {
        let set = CategorySet::new(["b", "a", "b", "c"]);
        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert!(set.contains("a"));
        assert!(!set.contains("d"));
        assert_eq!(set.len(), 3);
    }
}
