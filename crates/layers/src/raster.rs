use serde::{Deserialize, Serialize};

/// A slippy-map tile source (`{z}/{x}/{y}` URL template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSource {
    pub url_template: String,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub attribution: String,
}

fn default_max_zoom() -> u8 {
    19
}

fn default_opacity() -> f64 {
    1.0
}

impl TileSource {
    pub fn openstreetmap() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            opacity: 1.0,
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }

    /// Nautical seamark overlay, drawn translucent over the base map.
    pub fn openseamap() -> Self {
        Self {
            url_template: "https://tiles.openseamap.org/seamark/{z}/{x}/{y}.png".to_string(),
            max_zoom: 19,
            opacity: 0.8,
            attribution: "&copy; OpenSeaMap contributors".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TileSource;

    #[test]
    fn fills_defaults_from_json() {
        let src: TileSource =
            serde_json::from_str(r#"{"url_template":"https://t/{z}/{x}/{y}.png"}"#).unwrap();
        assert_eq!(src.max_zoom, 19);
        assert_eq!(src.opacity, 1.0);
        assert!(src.attribution.is_empty());
    }
}
