//! Data models for the ingestion service.
//!
//! Field names follow the service's wire format through serde renames; the Rust
//! names describe what each field means to the client.

mod upload;
mod video;

pub use upload::*;
pub use video::*;

/// Identifiers issued by the service may arrive as JSON strings or numbers.
pub(crate) mod string_or_number {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer) {
            Ok(Raw::Text(s)) => Ok(s),
            Ok(Raw::Number(n)) => Ok(n.to_string()),
            Err(_) => Err(de::Error::custom("expected a string or number identifier")),
        }
    }

    pub fn serialize<S>(value: &str, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }
}
