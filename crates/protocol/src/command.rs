use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::payload::Payload;

/// Message from host to bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Command {
    /// Create the map on the element with id `mount_id`.
    #[serde(rename_all = "camelCase")]
    InitMap {
        mount_id: String,
        lat: f64,
        lng: f64,
        zoom: f64,
    },

    /// Replace every marker with this snapshot.
    UpdateMarkers { payload: Payload },

    /// Replace the route line.
    UpdateRoute { payload: Payload },

    /// Move the camera to show these points.
    FitBounds { payload: Payload },

    PanTo { lat: f64, lng: f64 },

    SetView { lat: f64, lng: f64, zoom: f64 },

    ToggleOverlay { enabled: bool },

    /// Answered with [`BridgeEvent::OverlayStatus`].
    #[serde(rename = "isOverlayEnabled")]
    QueryOverlay,

    SetHidden { hidden: bool },

    InvalidateSize,

    Dispose,

    /// Up to three independent payloads in one frame.
    Sync(SyncRequest),
}

/// Composite update.
///
/// A field that is absent (or `null`) is skipped. A present field is applied
/// even when it is an empty collection, so `"markers": []` clears markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markers: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Payload>,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::InitMap { .. } => "initMap",
            Command::UpdateMarkers { .. } => "updateMarkers",
            Command::UpdateRoute { .. } => "updateRoute",
            Command::FitBounds { .. } => "fitBounds",
            Command::PanTo { .. } => "panTo",
            Command::SetView { .. } => "setView",
            Command::ToggleOverlay { .. } => "toggleOverlay",
            Command::QueryOverlay => "isOverlayEnabled",
            Command::SetHidden { .. } => "setHidden",
            Command::InvalidateSize => "invalidateSize",
            Command::Dispose => "dispose",
            Command::Sync(_) => "sync",
        }
    }
}

/// Message from bridge to host. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    MapTapped { lat: f64, lng: f64 },
    MarkerTapped { id: String },
    OverlayStatus { enabled: bool },
}

pub fn decode_command(frame: &str) -> Result<Command, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Frame)
}

pub fn encode_command(command: &Command) -> String {
    // Serializing these plain enums cannot fail.
    serde_json::to_string(command).unwrap_or_default()
}

pub fn encode_event(event: &BridgeEvent) -> String {
    serde_json::to_string(event).unwrap_or_default()
}

pub fn decode_event(frame: &str) -> Result<BridgeEvent, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::PayloadKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_init_map() {
        let cmd =
            decode_command(r#"{"op":"initMap","mountId":"map","lat":54.3,"lng":10.1,"zoom":9}"#)
                .unwrap();
        assert_eq!(
            cmd,
            Command::InitMap {
                mount_id: "map".to_string(),
                lat: 54.3,
                lng: 10.1,
                zoom: 9.0,
            }
        );
    }

    #[test]
    fn decodes_unit_commands() {
        assert_eq!(
            decode_command(r#"{"op":"isOverlayEnabled"}"#).unwrap(),
            Command::QueryOverlay
        );
        assert_eq!(decode_command(r#"{"op":"dispose"}"#).unwrap(), Command::Dispose);
    }

    #[test]
    fn sync_distinguishes_absent_from_empty() {
        let cmd = decode_command(r#"{"op":"sync","markers":"[]","bounds":null}"#).unwrap();
        let Command::Sync(req) = cmd else {
            panic!("expected sync");
        };
        assert_eq!(req.markers, Some(Payload::new("[]")));
        assert_eq!(req.route, None);
        assert_eq!(req.bounds, None);
    }

    #[test]
    fn sync_accepts_inline_payloads() {
        let cmd = decode_command(r#"{"op":"sync","route":[[1,2],[3,4]]}"#).unwrap();
        let Command::Sync(req) = cmd else {
            panic!("expected sync");
        };
        let route = req.route.unwrap().points(PayloadKind::Route).unwrap();
        assert_eq!(route.len(), 2);
    }

    #[test]
    fn rejects_unknown_ops() {
        assert!(decode_command(r#"{"op":"explode"}"#).is_err());
        assert!(decode_command("not json").is_err());
    }

    #[test]
    fn events_use_event_tag() {
        let frame = encode_event(&BridgeEvent::MarkerTapped {
            id: "w1".to_string(),
        });
        assert_eq!(frame, r#"{"event":"markerTapped","id":"w1"}"#);
        assert_eq!(
            decode_event(r#"{"event":"mapTapped","lat":1.0,"lng":2.0}"#).unwrap(),
            BridgeEvent::MapTapped { lat: 1.0, lng: 2.0 }
        );
    }

    #[test]
    fn command_frames_roundtrip_through_text() {
        let cmd = Command::Sync(SyncRequest {
            markers: Some(Payload::new(r#"[{"type":"current","lat":1,"lng":2}]"#)),
            route: None,
            bounds: None,
        });
        assert_eq!(decode_command(&encode_command(&cmd)).unwrap(), cmd);
    }
}
