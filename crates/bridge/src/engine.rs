use foundation::bounds::LatLng;
use foundation::handles::GlyphKey;
use layers::raster::TileSource;
use layers::symbology::{Glyph, LineStyle};
use serde::{Deserialize, Serialize};

/// Corner a map control is docked to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlPosition {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

/// Contract with the map rendering engine.
///
/// Handles are opaque to the bridge. The bridge guarantees it never uses a
/// layer handle after passing it to [`MapEngine::remove_layer`], and never
/// uses any handle of a map after [`MapEngine::remove_map`].
///
/// Clicks are not returned from these calls. The engine reports them later
/// as a [`Pointer`] through `MapSurface::handle_pointer`.
pub trait MapEngine {
    type Map;
    type Layer;

    /// Builds a map on the element `mount_id`. `None` if the engine cannot.
    fn create_map(&mut self, mount_id: &str, center: LatLng, zoom: f64) -> Option<Self::Map>;

    /// Tears the map down together with every layer still on it.
    fn remove_map(&mut self, map: Self::Map);

    fn add_tile_layer(&mut self, map: &Self::Map, source: &TileSource) -> Self::Layer;

    fn add_zoom_control(&mut self, map: &Self::Map, position: ControlPosition);

    fn add_layer_group(&mut self, map: &Self::Map) -> Self::Layer;

    fn clear_layer_group(&mut self, group: &Self::Layer);

    /// Adds one glyph to `group`. Taps on it are reported with `key`.
    fn add_glyph(&mut self, group: &Self::Layer, key: GlyphKey, glyph: &Glyph);

    fn add_polyline(&mut self, map: &Self::Map, points: &[LatLng], style: &LineStyle)
    -> Self::Layer;

    fn remove_layer(&mut self, map: &Self::Map, layer: Self::Layer);

    fn set_view(&mut self, map: &Self::Map, center: LatLng, zoom: f64);

    fn pan_to(&mut self, map: &Self::Map, center: LatLng);

    /// Current container size in CSS pixels.
    fn viewport_size(&self, map: &Self::Map) -> [f64; 2];

    /// Re-reads the container size after a layout change.
    fn invalidate_size(&mut self, map: &Self::Map);
}

/// A click the engine observed.
#[derive(Debug, Clone, PartialEq)]
pub enum Pointer {
    /// Click on the map background.
    Map { at: LatLng },
    /// Click on a glyph. It does not propagate to the map.
    Glyph { key: GlyphKey, at: LatLng },
}
