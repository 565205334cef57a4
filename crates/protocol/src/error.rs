use thiserror::Error;

use crate::payload::PayloadKind;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed {kind} payload: {source}")]
    Payload {
        kind: PayloadKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed command frame: {0}")]
    Frame(#[source] serde_json::Error),
}

impl ProtocolError {
    pub fn payload_kind(&self) -> Option<PayloadKind> {
        match self {
            ProtocolError::Payload { kind, .. } => Some(*kind),
            ProtocolError::Frame(_) => None,
        }
    }
}
