//! Host marker records and their glyph treatment.
//!
//! A marker arrives as a JSON object discriminated by `type`:
//! `ais` (vessel from an AIS feed), `current` (own position) or one of the
//! route stop pins `departure`, `waypoint`, `destination`. Unknown tags fall
//! back to the waypoint pin.

use foundation::bounds::LatLng;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::symbology::{Glyph, GlyphShape, PinKind, Tooltip, center_anchor, tip_anchor};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMarker")]
pub enum Marker {
    Vessel(VesselMarker),
    Current { position: LatLng },
    Pin(PinMarker),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VesselMarker {
    pub position: LatLng,
    pub mmsi: String,
    /// Course over ground, degrees.
    pub course_deg: Option<f64>,
    pub name: Option<String>,
    /// Speed over ground, knots.
    pub speed_kn: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PinMarker {
    pub position: LatLng,
    pub kind: PinKind,
    pub label: Option<String>,
    pub id: Option<String>,
}

/// Numbers and strings are both accepted where hosts disagree on encoding.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

impl TextOrNumber {
    fn into_string(self) -> String {
        match self {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Int(n) => n.to_string(),
            TextOrNumber::Float(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMarker {
    #[serde(rename = "type", default, deserialize_with = "tag_text")]
    tag: Option<String>,
    lat: f64,
    lng: f64,
    #[serde(default)]
    mmsi: Option<TextOrNumber>,
    #[serde(default)]
    cog: Option<f64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sog: Option<f64>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    id: Option<TextOrNumber>,
}

/// A `type` that is not a string is treated as unknown rather than invalid.
fn tag_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Text(String),
        Other(IgnoredAny),
    }
    Ok(match Tag::deserialize(deserializer)? {
        Tag::Text(text) => Some(text),
        Tag::Other(_) => None,
    })
}

impl TryFrom<RawMarker> for Marker {
    type Error = String;

    fn try_from(raw: RawMarker) -> Result<Self, Self::Error> {
        let position = LatLng::new(raw.lat, raw.lng);
        match raw.tag.as_deref() {
            Some("ais") => {
                let mmsi = raw
                    .mmsi
                    .map(TextOrNumber::into_string)
                    .ok_or_else(|| "ais marker without mmsi".to_string())?;
                Ok(Marker::Vessel(VesselMarker {
                    position,
                    mmsi,
                    course_deg: raw.cog,
                    name: raw.name,
                    speed_kn: raw.sog,
                }))
            }
            Some("current") => Ok(Marker::Current { position }),
            tag => Ok(Marker::Pin(PinMarker {
                position,
                kind: PinKind::from_tag(tag),
                label: raw.label,
                // An empty id is as good as none: nothing to report back.
                id: raw
                    .id
                    .map(TextOrNumber::into_string)
                    .filter(|id| !id.is_empty()),
            })),
        }
    }
}

impl Marker {
    pub fn position(&self) -> LatLng {
        match self {
            Marker::Vessel(v) => v.position,
            Marker::Current { position } => *position,
            Marker::Pin(p) => p.position,
        }
    }

    pub fn to_glyph(&self) -> Glyph {
        match self {
            Marker::Vessel(v) => Glyph {
                position: v.position,
                shape: GlyphShape::Vessel {
                    heading_deg: v.course_deg.unwrap_or(0.0),
                },
                size_px: Glyph::VESSEL_SIZE,
                anchor_px: center_anchor(Glyph::VESSEL_SIZE),
                tooltip: Some(v.tooltip()),
                tap_id: None,
            },
            Marker::Current { position } => Glyph {
                position: *position,
                shape: GlyphShape::PositionPulse,
                size_px: Glyph::PULSE_SIZE,
                anchor_px: center_anchor(Glyph::PULSE_SIZE),
                tooltip: None,
                tap_id: None,
            },
            Marker::Pin(p) => Glyph {
                position: p.position,
                shape: GlyphShape::Pin {
                    kind: p.kind,
                    label: p.label.clone().unwrap_or_default(),
                },
                size_px: Glyph::PIN_SIZE,
                anchor_px: tip_anchor(Glyph::PIN_SIZE),
                tooltip: None,
                tap_id: p.id.clone(),
            },
        }
    }
}

impl VesselMarker {
    pub fn tooltip(&self) -> Tooltip {
        let name = match self.name.as_deref() {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => "Unknown".to_string(),
        };
        Tooltip {
            title: name,
            lines: vec![
                format!("MMSI: {}", self.mmsi),
                format!("SOG: {:.1} kt", self.speed_kn.unwrap_or(0.0)),
            ],
            offset_px: [0, -14],
        }
    }
}
