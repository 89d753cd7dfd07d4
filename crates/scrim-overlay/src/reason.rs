#![forbid(unsafe_code)]

//! Why an overlay closed.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Key mirrored from the overlay's `canceled` state.
pub const CANCELED: &str = "canceled";

/// String-keyed flags describing how an overlay closed.
///
/// The overlay keeps [`CANCELED`] in sync with its `canceled` state; callers
/// may add their own keys (e.g. `"confirmed"`) and those are left alone.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ClosingReason {
    flags: BTreeMap<String, bool>,
}

impl ClosingReason {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the `canceled` flag (absent counts as `false`).
    #[must_use]
    pub fn canceled(&self) -> bool {
        self.get(CANCELED).unwrap_or(false)
    }

    pub fn set_canceled(&mut self, canceled: bool) {
        self.set(CANCELED, canceled);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.flags.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: bool) {
        self.flags.insert(key.into(), value);
    }

    /// Builder form of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: bool) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<bool> {
        self.flags.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl fmt::Display for ClosingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_defaults_to_false() {
        let reason = ClosingReason::new();
        assert!(!reason.canceled());
        assert!(reason.is_empty());
    }

    #[test]
    fn caller_keys_survive_canceled_updates() {
        let mut reason = ClosingReason::new().with("confirmed", true);
        reason.set_canceled(true);
        reason.set_canceled(false);
        assert_eq!(reason.get("confirmed"), Some(true));
        assert_eq!(reason.get(CANCELED), Some(false));
        assert_eq!(reason.len(), 2);
    }

    #[test]
    fn display_is_sorted() {
        let reason = ClosingReason::new().with("b", false).with("a", true);
        assert_eq!(reason.to_string(), "{a: true, b: false}");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_plain_map() {
        let reason = ClosingReason::new().with(CANCELED, true);
        let json = serde_json::to_string(&reason).unwrap();
        assert_eq!(json, r#"{"canceled":true}"#);
        let back: ClosingReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);
    }
}
