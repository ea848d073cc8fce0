//! Text formats for wire records.
//!
//! Provides [`encode`] and [`decode`] functions that convert between
//! serde-serializable types and text in JSON or RON.

use crate::serialize::{DeserializeError, SerializeError};

/// Supported text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// JSON, readable by third-party loaders.
    #[default]
    Json,
    /// RON (Rusty Object Notation).
    #[cfg(feature = "serialize-ron")]
    Ron,
}

/// Encode a serde-serializable value as text in the given format.
pub fn encode<T: serde::Serialize>(value: &T, format: Format) -> Result<String, SerializeError> {
    match format {
        Format::Json => {
            serde_json::to_string(value).map_err(|e| SerializeError::Format(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(|e| SerializeError::Format(e.to_string())),
    }
}

/// Decode text in the given format into a serde-deserializable type.
///
/// Parser nesting limits are lifted: every level of the node tree nests two
/// levels deep in text, and a record must load at any depth it was written
/// at.
pub fn decode<T: serde::de::DeserializeOwned>(
    text: &str,
    format: Format,
) -> Result<T, DeserializeError> {
    match format {
        Format::Json => {
            let mut de = serde_json::Deserializer::from_str(text);
            de.disable_recursion_limit();
            <T as serde::Deserialize>::deserialize(&mut de)
                .and_then(|value| de.end().map(|()| value))
                .map_err(|e| DeserializeError::MalformedRecord(e.to_string()))
        }
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::Options::default()
            .without_recursion_limit()
            .from_str(text)
            .map_err(|e| DeserializeError::MalformedRecord(e.to_string())),
    }
}
