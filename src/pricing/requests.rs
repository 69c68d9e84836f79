//! Request DTOs consumed by the pricing engine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// A fully resolved booking request.
///
/// Availability is assumed already validated by the calling layer; the
/// engine only prices it (plus the cost-adjacent buffer check).
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    /// Start of the first block.
    pub start: DateTime<Utc>,
    /// Requested duration in duration units. Falls back to the product's
    /// minimum duration when omitted.
    #[serde(default)]
    pub duration: Option<u32>,
    /// Selected resource, resolved against the product's resource list.
    #[serde(default)]
    pub resource_id: Option<Uuid>,
    /// Person counts by person-type id. Insertion order is irrelevant.
    #[serde(default)]
    pub persons: BTreeMap<Uuid, u32>,
}

impl BookingRequest {
    pub fn has_persons(&self) -> bool {
        !self.persons.is_empty()
    }

    /// Sum of all person counts across types.
    pub fn total_persons(&self) -> u32 {
        self.persons.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_persons_sums_all_types() {
        let json = r#"{
            "start": "2026-06-01T14:00:00Z",
            "duration": 3,
            "persons": {
                "11111111-1111-1111-1111-111111111111": 2,
                "22222222-2222-2222-2222-222222222222": 1
            }
        }"#;
        let request: BookingRequest = serde_json::from_str(json).unwrap();
        assert!(request.has_persons());
        assert_eq!(request.total_persons(), 3);
        assert_eq!(request.duration, Some(3));
        assert!(request.resource_id.is_none());
    }

    #[test]
    fn test_minimal_request_defaults() {
        let request: BookingRequest =
            serde_json::from_str(r#"{ "start": "2026-06-01T14:00:00Z" }"#).unwrap();
        assert!(!request.has_persons());
        assert_eq!(request.total_persons(), 0);
        assert_eq!(request.duration, None);
    }
}
