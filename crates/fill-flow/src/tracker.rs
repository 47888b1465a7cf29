//! Idempotence ledger.
//!
//! Multi-value items fold the value into the key so each distinct selection
//! into an append-only control dedupes independently; single-value items key
//! on field+action only, so a later different value supersedes the earlier
//! one instead of stacking. The asymmetry is deliberate.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use formpilot_core_types::{normalize_text, FieldId, FillAction, FillValue};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct TrackerEntry {
    pub normalized_value: String,
    pub success: bool,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FillTracker {
    url: String,
    entries: HashMap<String, TrackerEntry>,
}

impl FillTracker {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            entries: HashMap::new(),
        }
    }

    fn key(field: &FieldId, action: FillAction, value: &FillValue, multi: bool) -> String {
        if multi {
            format!(
                "{field}::{}::{}",
                action.label(),
                normalize_text(&value.canonical())
            )
        } else {
            format!("{field}::{}", action.label())
        }
    }

    /// Skip only on a prior *successful* application with the identical
    /// normalized value. Failures and different values never block a retry.
    pub fn should_skip(
        &self,
        field: &FieldId,
        action: FillAction,
        value: &FillValue,
        multi: bool,
    ) -> bool {
        let key = Self::key(field, action, value, multi);
        match self.entries.get(&key) {
            Some(entry) => entry.success && entry.normalized_value == normalize_text(&value.canonical()),
            None => false,
        }
    }

    pub fn record(
        &mut self,
        field: &FieldId,
        action: FillAction,
        value: &FillValue,
        success: bool,
        multi: bool,
    ) {
        let key = Self::key(field, action, value, multi);
        self.entries.insert(
            key,
            TrackerEntry {
                normalized_value: normalize_text(&value.canonical()),
                success,
                at: Utc::now(),
            },
        );
    }

    /// All prior state is page-scoped; a navigation invalidates every
    /// locator and every recorded application.
    pub fn reset_if_navigated(&mut self, current_url: &str) {
        if self.url != current_url {
            debug!(from = %self.url, to = %current_url, "navigation detected, clearing tracker");
            self.url = current_url.to_string();
            self.entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
