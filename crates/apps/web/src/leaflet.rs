//! [`MapEngine`] over Leaflet, reached through a small JS shim.
//!
//! The shim keeps Leaflet objects in a table and hands Rust numeric handles.
//! Clicks come back through one sink closure registered at startup.

use std::collections::BTreeMap;
use std::fmt;

use bridge::{ControlPosition, MapEngine};
use foundation::bounds::LatLng;
use foundation::handles::GlyphKey;
use layers::raster::TileSource;
use layers::symbology::{Glyph, GlyphShape, LineStyle, Tooltip};
use serde::Serialize;
use tracing::warn;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
const __lb_objects = new Map();
let __lb_next = 1;
let __lb_sink = null;

function __lb_put(obj) {
    const h = __lb_next++;
    __lb_objects.set(h, obj);
    return h;
}

export function lb_set_pointer_sink(f) {
    __lb_sink = f;
}

export function lb_create_map(mountId, lat, lng, zoom) {
    const el = document.getElementById(mountId);
    if (!el || typeof L === 'undefined') return 0;
    const map = L.map(el, { center: [lat, lng], zoom: zoom, zoomControl: false });
    map.on('click', (e) => {
        if (__lb_sink) __lb_sink({ kind: 'map', lat: e.latlng.lat, lng: e.latlng.lng });
    });
    return __lb_put(map);
}

export function lb_remove_map(h) {
    const map = __lb_objects.get(h);
    if (map) map.remove();
    __lb_objects.clear();
}

export function lb_add_tile_layer(mapH, spec) {
    const s = JSON.parse(spec);
    const layer = L.tileLayer(s.url_template, {
        maxZoom: s.max_zoom,
        opacity: s.opacity,
        attribution: s.attribution,
    }).addTo(__lb_objects.get(mapH));
    return __lb_put(layer);
}

export function lb_add_zoom_control(mapH, position) {
    L.control.zoom({ position: position }).addTo(__lb_objects.get(mapH));
}

export function lb_add_layer_group(mapH) {
    return __lb_put(L.layerGroup().addTo(__lb_objects.get(mapH)));
}

export function lb_clear_layer_group(h) {
    const group = __lb_objects.get(h);
    if (group) group.clearLayers();
}

export function lb_add_glyph(groupH, tag, spec) {
    const s = JSON.parse(spec);
    const icon = L.divIcon({ html: s.html, className: '', iconSize: s.size, iconAnchor: s.anchor });
    const marker = L.marker([s.lat, s.lng], { icon: icon, interactive: s.interactive });
    if (s.tooltip) {
        marker.bindTooltip(s.tooltip, {
            className: 'ais-tooltip',
            direction: 'top',
            offset: s.tooltip_offset,
        });
    }
    if (s.interactive) {
        marker.on('click', (e) => {
            L.DomEvent.stopPropagation(e);
            if (__lb_sink) __lb_sink({ kind: 'glyph', tag: tag, lat: s.lat, lng: s.lng });
        });
    }
    __lb_objects.get(groupH).addLayer(marker);
}

export function lb_add_polyline(mapH, points, spec) {
    const s = JSON.parse(spec);
    const line = L.polyline(JSON.parse(points), {
        color: s.color,
        weight: s.weight_px,
        opacity: s.opacity,
    }).addTo(__lb_objects.get(mapH));
    return __lb_put(line);
}

export function lb_remove_layer(mapH, h) {
    const map = __lb_objects.get(mapH);
    const layer = __lb_objects.get(h);
    if (map && layer) map.removeLayer(layer);
    __lb_objects.delete(h);
}

export function lb_set_view(mapH, lat, lng, zoom) {
    __lb_objects.get(mapH).setView([lat, lng], zoom);
}

export function lb_pan_to(mapH, lat, lng) {
    __lb_objects.get(mapH).panTo([lat, lng]);
}

export function lb_viewport_size(mapH) {
    const size = __lb_objects.get(mapH).getSize();
    return new Float64Array([size.x, size.y]);
}

export function lb_invalidate_size(mapH) {
    const map = __lb_objects.get(mapH);
    if (map) map.invalidateSize();
}
")]
extern "C" {
    fn lb_set_pointer_sink(f: &js_sys::Function);
    #[wasm_bindgen(catch)]
    fn lb_create_map(mount_id: &str, lat: f64, lng: f64, zoom: f64) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_remove_map(map: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_add_tile_layer(map: u32, spec: &str) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_add_zoom_control(map: u32, position: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_add_layer_group(map: u32) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_clear_layer_group(group: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_add_glyph(group: u32, tag: u32, spec: &str) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_add_polyline(map: u32, points: &str, spec: &str) -> Result<u32, JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_remove_layer(map: u32, layer: u32) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_set_view(map: u32, lat: f64, lng: f64, zoom: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_pan_to(map: u32, lat: f64, lng: f64) -> Result<(), JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_viewport_size(map: u32) -> Result<Vec<f64>, JsValue>;
    #[wasm_bindgen(catch)]
    fn lb_invalidate_size(map: u32) -> Result<(), JsValue>;
}

/// Handle the shim never hands out. Removing or clearing it does nothing.
const NO_HANDLE: u32 = 0;

/// Logs a Leaflet exception instead of letting it unwind through the bridge.
fn settle<T, E: fmt::Debug>(op: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(op, ?err, "leaflet call failed");
            None
        }
    }
}

/// Registers the closure Leaflet clicks are reported to.
pub fn set_pointer_sink(f: &js_sys::Function) {
    lb_set_pointer_sink(f);
}

/// What the shim needs to build one `L.marker`.
#[derive(Debug, Serialize)]
struct GlyphSpec {
    lat: f64,
    lng: f64,
    html: String,
    size: [u32; 2],
    anchor: [u32; 2],
    interactive: bool,
    tooltip: Option<String>,
    tooltip_offset: Option<[i32; 2]>,
}

#[derive(Debug, Default)]
pub struct LeafletEngine {
    /// Shim tag of each live glyph: the group it sits in and its key.
    glyphs: BTreeMap<u32, (u32, GlyphKey)>,
    next_tag: u32,
}

impl LeafletEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a tag reported by the shim.
    pub fn glyph_key(&self, tag: u32) -> Option<GlyphKey> {
        self.glyphs.get(&tag).map(|(_, key)| *key)
    }
}

impl MapEngine for LeafletEngine {
    type Map = u32;
    type Layer = u32;

    fn create_map(&mut self, mount_id: &str, center: LatLng, zoom: f64) -> Option<u32> {
        settle("create_map", lb_create_map(mount_id, center.lat, center.lng, zoom))
            .filter(|h| *h != NO_HANDLE)
    }

    fn remove_map(&mut self, map: u32) {
        self.glyphs.clear();
        settle("remove_map", lb_remove_map(map));
    }

    fn add_tile_layer(&mut self, map: &u32, source: &TileSource) -> u32 {
        let spec = serde_json::to_string(source).unwrap_or_default();
        settle("add_tile_layer", lb_add_tile_layer(*map, &spec)).unwrap_or(NO_HANDLE)
    }

    fn add_zoom_control(&mut self, map: &u32, position: ControlPosition) {
        settle("add_zoom_control", lb_add_zoom_control(*map, leaflet_position(position)));
    }

    fn add_layer_group(&mut self, map: &u32) -> u32 {
        settle("add_layer_group", lb_add_layer_group(*map)).unwrap_or(NO_HANDLE)
    }

    fn clear_layer_group(&mut self, group: &u32) {
        self.glyphs.retain(|_, (owner, _)| owner != group);
        settle("clear_layer_group", lb_clear_layer_group(*group));
    }

    fn add_glyph(&mut self, group: &u32, key: GlyphKey, glyph: &Glyph) {
        self.next_tag = self.next_tag.wrapping_add(1);
        let tag = self.next_tag;
        self.glyphs.insert(tag, (*group, key));

        let tooltip = glyph.tooltip.as_ref();
        let spec = GlyphSpec {
            lat: glyph.position.lat,
            lng: glyph.position.lng,
            html: glyph_html(glyph),
            size: glyph.size_px,
            anchor: glyph.anchor_px,
            interactive: glyph.is_tappable(),
            tooltip: tooltip.map(tooltip_html),
            tooltip_offset: tooltip.map(|t| t.offset_px),
        };
        let spec = serde_json::to_string(&spec).unwrap_or_default();
        settle("add_glyph", lb_add_glyph(*group, tag, &spec));
    }

    fn add_polyline(&mut self, map: &u32, points: &[LatLng], style: &LineStyle) -> u32 {
        let points = serde_json::to_string(points).unwrap_or_default();
        let style = serde_json::to_string(style).unwrap_or_default();
        settle("add_polyline", lb_add_polyline(*map, &points, &style)).unwrap_or(NO_HANDLE)
    }

    fn remove_layer(&mut self, map: &u32, layer: u32) {
        self.glyphs.retain(|_, (owner, _)| *owner != layer);
        settle("remove_layer", lb_remove_layer(*map, layer));
    }

    fn set_view(&mut self, map: &u32, center: LatLng, zoom: f64) {
        settle("set_view", lb_set_view(*map, center.lat, center.lng, zoom));
    }

    fn pan_to(&mut self, map: &u32, center: LatLng) {
        settle("pan_to", lb_pan_to(*map, center.lat, center.lng));
    }

    fn viewport_size(&self, map: &u32) -> [f64; 2] {
        match settle("viewport_size", lb_viewport_size(*map)).as_deref() {
            Some([w, h]) => [*w, *h],
            _ => [0.0, 0.0],
        }
    }

    fn invalidate_size(&mut self, map: &u32) {
        settle("invalidate_size", lb_invalidate_size(*map));
    }
}

fn leaflet_position(position: ControlPosition) -> &'static str {
    match position {
        ControlPosition::TopLeft => "topleft",
        ControlPosition::TopRight => "topright",
        ControlPosition::BottomLeft => "bottomleft",
        ControlPosition::BottomRight => "bottomright",
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn tooltip_html(tooltip: &Tooltip) -> String {
    let mut html = format!("<b>{}</b>", escape(&tooltip.title));
    for line in &tooltip.lines {
        html.push_str("<br>");
        html.push_str(&escape(line));
    }
    html
}

/// Icon markup for `glyph`. Class names match the host stylesheet.
pub fn glyph_html(glyph: &Glyph) -> String {
    match &glyph.shape {
        GlyphShape::Vessel { heading_deg } => format!(
            concat!(
                r#"<div class="marker-ais" style="transform:rotate({}deg)">"#,
                r#"<svg width="28" height="28" viewBox="0 0 28 28">"#,
                r#"<path d="M14,0 L22.4,23.8 L14,18.2 L5.6,23.8 Z" "#,
                r##"fill="#00E5FF" fill-opacity="0.9" />"##,
                "</svg></div>"
            ),
            heading_deg
        ),
        GlyphShape::PositionPulse => r#"<div class="marker-current"></div>"#.to_string(),
        GlyphShape::Pin { kind, label } => {
            let palette = kind.palette();
            format!(
                concat!(
                    r#"<div class="marker-pin">"#,
                    r#"<svg width="34" height="48" viewBox="0 0 34 48">"#,
                    r#"<path d="M17 47C17 47 33 29 33 17A16 16 0 0 0 1 17C1 29 17 47 17 47Z" "#,
                    r#"fill="{fill}" stroke="{stroke}" stroke-width="1.5"/>"#,
                    r#"<circle cx="17" cy="17" r="9" fill="rgba(255,255,255,0.92)"/>"#,
                    "</svg>",
                    r#"<span class="pin-label" style="color:{fill}">{label}</span>"#,
                    "</div>"
                ),
                fill = palette.fill,
                stroke = palette.stroke,
                label = escape(label),
            )
        }
    }
}
