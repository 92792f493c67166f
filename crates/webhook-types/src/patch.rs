use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::Subscription;

/// A partial update to a [`Subscription`]. Every field is optional; an
/// absent field leaves the corresponding field on the record untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionPatch {
    /// New target URL, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    /// New event type filter, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_types: Option<BTreeSet<String>>,
    /// New signing secret, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<Option<String>>,
}

impl SubscriptionPatch {
    /// True if this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.target_url.is_none() && self.event_types.is_none() && self.secret.is_none()
    }

    /// Applies this patch onto `record`, returning the merged record. Only
    /// fields present in the patch are overwritten.
    pub fn merge_onto(&self, mut record: Subscription) -> Subscription {
        if let Some(target_url) = self.target_url.clone() {
            record.target_url = target_url;
        }
        if let Some(event_types) = self.event_types.clone() {
            record.event_types = event_types;
        }
        if let Some(secret) = self.secret.clone() {
            record.secret = secret;
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_only_overwrites_present_fields() {
        let original = Subscription::new(
            "https://a.example".into(),
            ["a".to_string()].into_iter().collect(),
            Some("secret".into()),
        );
        let patch = SubscriptionPatch {
            target_url: Some("https://b.example".into()),
            event_types: None,
            secret: None,
        };
        let merged = patch.merge_onto(original.clone());
        assert_eq!(merged.target_url, "https://b.example");
        assert_eq!(merged.event_types, original.event_types);
        assert_eq!(merged.secret, original.secret);
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(SubscriptionPatch::default().is_empty());
    }
}
