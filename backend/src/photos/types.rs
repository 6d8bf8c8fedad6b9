use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::object_store::ObjectDescriptor;

/// A listed image, optionally carrying a presigned URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ImageRecord {
    /// Object key, unique within the user's namespace
    pub key: String,
    /// Size in bytes
    pub size: i64,
    /// Last modification time of the object
    pub modified_at: DateTime<Utc>,
    /// Presigned GET URL, absent until the record has been presigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl From<ObjectDescriptor> for ImageRecord {
    fn from(descriptor: ObjectDescriptor) -> Self {
        Self {
            key: descriptor.key,
            size: descriptor.size,
            modified_at: descriptor.modified_at,
            url: None,
        }
    }
}

/// Groups every object key that belongs to one user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserNamespace {
    user_id: String,
}

impl UserNamespace {
    /// Namespace of `user_id`
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// Owner of the namespace
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Key prefix shared by all objects of the user
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("user_{}/", self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_prefix() {
        assert_eq!(UserNamespace::new("42").prefix(), "user_42/");
    }

    #[test]
    fn test_record_from_descriptor_has_no_url() {
        let record = ImageRecord::from(ObjectDescriptor {
            key: "user_1/a.png".to_string(),
            size: 10,
            modified_at: Utc::now(),
        });
        assert!(record.url.is_none());

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("url").is_none());
    }
}
