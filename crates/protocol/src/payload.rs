use std::fmt;

use foundation::bounds::LatLng;
use layers::markers::Marker;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtocolError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Markers,
    Route,
    Bounds,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadKind::Markers => "markers",
            PayloadKind::Route => "route",
            PayloadKind::Bounds => "bounds",
        })
    }
}

/// A serialized collection carried inside a command.
///
/// Hosts may send either a JSON string holding the serialized sequence (what
/// string-only relays can carry) or the sequence inline; both normalize to
/// the serialized text, which is decoded only when the payload is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(String);

impl Payload {
    pub fn new(text: impl Into<String>) -> Self {
        Payload(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whitespace-only text carries nothing.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn markers(&self) -> Result<Vec<Marker>, ProtocolError> {
        decode_markers(&self.0)
    }

    pub fn points(&self, kind: PayloadKind) -> Result<Vec<LatLng>, ProtocolError> {
        decode_points(&self.0, kind)
    }
}

/// Decodes a serialized marker snapshot. One bad record rejects the whole
/// snapshot.
pub fn decode_markers(text: &str) -> Result<Vec<Marker>, ProtocolError> {
    decode(text, PayloadKind::Markers)
}

/// Decodes a serialized sequence of `[lat, lng]` pairs.
pub fn decode_points(text: &str, kind: PayloadKind) -> Result<Vec<LatLng>, ProtocolError> {
    decode(text, kind)
}

fn decode<T: serde::de::DeserializeOwned>(
    text: &str,
    kind: PayloadKind,
) -> Result<T, ProtocolError> {
    serde_json::from_str(text).map_err(|source| ProtocolError::Payload { kind, source })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PayloadRepr {
    Text(String),
    Inline(serde_json::Value),
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PayloadRepr::deserialize(deserializer)? {
            PayloadRepr::Text(s) => Payload(s),
            PayloadRepr::Inline(v) => Payload(v.to_string()),
        })
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::new(s)
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload(s)
    }
}
