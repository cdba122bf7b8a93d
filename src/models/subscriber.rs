//! Subscriber data structures.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Chat identifier assigned by the messaging service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat that receives listing notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: ChatId,

    /// "{last name} {first name}" as reported at subscribe time
    #[serde(rename = "name", default)]
    pub display_name: String,

    /// Public handle without the leading `@`
    #[serde(
        rename = "user_name",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub handle: Option<String>,
}

impl Subscriber {
    pub fn new(chat_id: ChatId, display_name: impl Into<String>, handle: Option<String>) -> Self {
        Self {
            chat_id,
            display_name: display_name.into().trim().to_string(),
            handle: handle.filter(|h| !h.trim().is_empty()),
        }
    }

    /// Name shown in the subscriber list.
    pub fn label(&self) -> String {
        match &self.handle {
            Some(handle) => format!("@{handle}"),
            None => self.display_name.clone(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
