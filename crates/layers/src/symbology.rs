use foundation::bounds::LatLng;
use serde::{Deserialize, Serialize};

/// Stroke style for line layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyle {
    /// CSS color.
    pub color: String,
    pub weight_px: f64,
    pub opacity: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: "#00E5FF".to_string(),
            weight_px: 3.0,
            opacity: 0.8,
        }
    }
}

/// The three pin flavours a route stop can take.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    Departure,
    Waypoint,
    Destination,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinPalette {
    pub fill: &'static str,
    pub stroke: &'static str,
}

impl PinKind {
    /// Maps a marker `type` tag to a pin; anything unrecognised is a waypoint.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("departure") => PinKind::Departure,
            Some("destination") => PinKind::Destination,
            _ => PinKind::Waypoint,
        }
    }

    pub fn palette(self) -> PinPalette {
        match self {
            PinKind::Departure => PinPalette {
                fill: "#00C853",
                stroke: "#00E676",
            },
            PinKind::Waypoint => PinPalette {
                fill: "#FF6D00",
                stroke: "#FF9100",
            },
            PinKind::Destination => PinPalette {
                fill: "#D50000",
                stroke: "#FF5252",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphShape {
    /// Triangle pointing along `heading_deg` (clockwise from north).
    Vessel { heading_deg: f64 },
    /// Pulsing dot for the own-ship position.
    PositionPulse,
    Pin { kind: PinKind, label: String },
}

/// Hover text attached to a glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub title: String,
    pub lines: Vec<String>,
    /// Offset from the anchor, in pixels.
    pub offset_px: [i32; 2],
}

/// Everything an engine needs to draw one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub position: LatLng,
    pub shape: GlyphShape,
    pub size_px: [u32; 2],
    /// Pixel inside the icon that sits on `position`.
    pub anchor_px: [u32; 2],
    pub tooltip: Option<Tooltip>,
    /// Host id reported on tap. `None` means the glyph ignores taps.
    pub tap_id: Option<String>,
}

impl Glyph {
    pub const VESSEL_SIZE: [u32; 2] = [28, 28];
    pub const PULSE_SIZE: [u32; 2] = [26, 26];
    pub const PIN_SIZE: [u32; 2] = [34, 48];

    pub fn is_tappable(&self) -> bool {
        self.tap_id.is_some()
    }
}

/// Center of a `size` icon, for round glyphs.
pub fn center_anchor(size: [u32; 2]) -> [u32; 2] {
    [size[0] / 2, size[1] / 2]
}

/// Bottom-center of a `size` icon, where a pin's tip is.
pub fn tip_anchor(size: [u32; 2]) -> [u32; 2] {
    [size[0] / 2, size[1]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tags_are_waypoints() {
        assert_eq!(PinKind::from_tag(Some("departure")), PinKind::Departure);
        assert_eq!(PinKind::from_tag(Some("destination")), PinKind::Destination);
        assert_eq!(PinKind::from_tag(Some("buoy")), PinKind::Waypoint);
        assert_eq!(PinKind::from_tag(None), PinKind::Waypoint);
    }

    #[test]
    fn anchors() {
        assert_eq!(center_anchor(Glyph::VESSEL_SIZE), [14, 14]);
        assert_eq!(center_anchor(Glyph::PULSE_SIZE), [13, 13]);
        assert_eq!(tip_anchor(Glyph::PIN_SIZE), [17, 48]);
    }
}
