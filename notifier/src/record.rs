//! The notification record sent to the relay.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::error::{NotifyError, Result};

/// Keys every record serializes; extra fields may not reuse them.
pub const BASE_FIELDS: [&str; 5] = ["topic", "message", "title", "priority", "tags"];

/// Notification urgency, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Min = 1,
    Low = 2,
    Default = 3,
    High = 4,
    Urgent = 5,
}

impl Priority {
    /// Numeric level as understood by the relay.
    pub fn level(self) -> u8 {
        self as u8
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

/// A formatted notification, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationRecord {
    pub topic: String,
    pub message: String,
    pub title: String,
    pub priority: Priority,
    pub tags: Vec<String>,

    /// Additional fields merged at the top level of the JSON body.
    /// Only reachable through [`NotificationRecord::insert_extra`].
    #[serde(flatten)]
    extra: BTreeMap<String, String>,
}

impl NotificationRecord {
    /// Create a record with no tags and no extra fields.
    pub fn new(
        topic: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            topic: topic.into(),
            message: message.into(),
            title: title.into(),
            priority,
            tags: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add an extra top-level field. Base field names are rejected.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        self.insert_extra(key, value)?;
        Ok(self)
    }

    /// Add an extra top-level field in place. Base field names are rejected
    /// and leave the record unchanged.
    pub fn insert_extra(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let key = key.into();
        if BASE_FIELDS.contains(&key.as_str()) {
            return Err(NotifyError::ReservedField(key));
        }
        self.extra.insert(key, value.into());
        Ok(())
    }

    /// Extra fields, keyed by name.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// JSON body for the relay.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
