//! In-memory engine and element tree.
//!
//! Both record what the bridge asked of them and nothing else. Tests inspect
//! them directly; the replay tool prints a [`SceneSummary`] from them.

use std::collections::BTreeMap;

use foundation::bounds::LatLng;
use foundation::handles::GlyphKey;
use layers::raster::TileSource;
use layers::symbology::{Glyph, LineStyle};
use runtime::ManualClock;
use serde::Serialize;

use crate::config::BridgeConfig;
use crate::dom::ElementTree;
use crate::engine::{ControlPosition, MapEngine};
use crate::surface::MapSurface;
use crate::transport::AttributeHost;

/// One map as the headless engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessMap {
    pub mount_id: String,
    pub center: LatLng,
    pub zoom: f64,
    pub tile_layers: BTreeMap<u64, TileSource>,
    pub groups: BTreeMap<u64, Vec<(GlyphKey, Glyph)>>,
    pub polylines: BTreeMap<u64, (Vec<LatLng>, LineStyle)>,
    pub zoom_controls: Vec<ControlPosition>,
    pub invalidations: u32,
}

impl HeadlessMap {
    fn new(mount_id: &str, center: LatLng, zoom: f64) -> Self {
        Self {
            mount_id: mount_id.to_string(),
            center,
            zoom,
            tile_layers: BTreeMap::new(),
            groups: BTreeMap::new(),
            polylines: BTreeMap::new(),
            zoom_controls: Vec::new(),
            invalidations: 0,
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Glyphs across all groups, in insertion order within each group.
    pub fn glyphs(&self) -> Vec<(GlyphKey, &Glyph)> {
        self.groups
            .values()
            .flatten()
            .map(|(key, glyph)| (*key, glyph))
            .collect()
    }

    /// Key of the glyph that reports `id` when tapped.
    pub fn glyph_key_for(&self, id: &str) -> Option<GlyphKey> {
        self.glyphs()
            .into_iter()
            .find(|(_, g)| g.tap_id.as_deref() == Some(id))
            .map(|(key, _)| key)
    }

    /// Points of the route line, if one is drawn.
    pub fn route(&self) -> Option<&[LatLng]> {
        self.polylines.values().next().map(|(points, _)| points.as_slice())
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            mount_id: self.mount_id.clone(),
            center: self.center,
            zoom: self.zoom,
            tile_layers: self
                .tile_layers
                .values()
                .map(|t| t.url_template.clone())
                .collect(),
            glyphs: self.glyph_count(),
            tappable: self.glyphs().iter().filter(|(_, g)| g.is_tappable()).count(),
            route_points: self.route().map_or(0, <[LatLng]>::len),
            invalidations: self.invalidations,
        }
    }
}

/// Stable, printable digest of a headless map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub mount_id: String,
    pub center: LatLng,
    pub zoom: f64,
    pub tile_layers: Vec<String>,
    pub glyphs: usize,
    pub tappable: usize,
    pub route_points: usize,
    pub invalidations: u32,
}

/// Recording [`MapEngine`]. Handles are plain counters shared by maps and
/// layers.
#[derive(Debug, Clone)]
pub struct HeadlessEngine {
    maps: BTreeMap<u64, HeadlessMap>,
    /// Map that owns each layer group.
    group_owner: BTreeMap<u64, u64>,
    next_handle: u64,
    /// Reported container size.
    pub viewport_px: [f64; 2],
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new([800.0, 600.0])
    }
}

impl HeadlessEngine {
    pub fn new(viewport_px: [f64; 2]) -> Self {
        Self {
            maps: BTreeMap::new(),
            group_owner: BTreeMap::new(),
            next_handle: 1,
            viewport_px,
        }
    }

    pub fn live_maps(&self) -> usize {
        self.maps.len()
    }

    /// Most recently created map still alive.
    pub fn live_map(&self) -> Option<&HeadlessMap> {
        self.maps.values().next_back()
    }

    fn handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn group_mut(&mut self, group: u64) -> Option<&mut Vec<(GlyphKey, Glyph)>> {
        let map = self.group_owner.get(&group)?;
        self.maps.get_mut(map)?.groups.get_mut(&group)
    }
}

impl MapEngine for HeadlessEngine {
    type Map = u64;
    type Layer = u64;

    fn create_map(&mut self, mount_id: &str, center: LatLng, zoom: f64) -> Option<u64> {
        let h = self.handle();
        self.maps.insert(h, HeadlessMap::new(mount_id, center, zoom));
        Some(h)
    }

    fn remove_map(&mut self, map: u64) {
        self.maps.remove(&map);
        self.group_owner.retain(|_, owner| *owner != map);
    }

    fn add_tile_layer(&mut self, map: &u64, source: &TileSource) -> u64 {
        let h = self.handle();
        if let Some(m) = self.maps.get_mut(map) {
            m.tile_layers.insert(h, source.clone());
        }
        h
    }

    fn add_zoom_control(&mut self, map: &u64, position: ControlPosition) {
        if let Some(m) = self.maps.get_mut(map) {
            m.zoom_controls.push(position);
        }
    }

    fn add_layer_group(&mut self, map: &u64) -> u64 {
        let h = self.handle();
        if let Some(m) = self.maps.get_mut(map) {
            m.groups.insert(h, Vec::new());
            self.group_owner.insert(h, *map);
        }
        h
    }

    fn clear_layer_group(&mut self, group: &u64) {
        if let Some(glyphs) = self.group_mut(*group) {
            glyphs.clear();
        }
    }

    fn add_glyph(&mut self, group: &u64, key: GlyphKey, glyph: &Glyph) {
        if let Some(glyphs) = self.group_mut(*group) {
            glyphs.push((key, glyph.clone()));
        }
    }

    fn add_polyline(&mut self, map: &u64, points: &[LatLng], style: &LineStyle) -> u64 {
        let h = self.handle();
        if let Some(m) = self.maps.get_mut(map) {
            m.polylines.insert(h, (points.to_vec(), style.clone()));
        }
        h
    }

    fn remove_layer(&mut self, map: &u64, layer: u64) {
        if let Some(m) = self.maps.get_mut(map) {
            m.tile_layers.remove(&layer);
            m.groups.remove(&layer);
            m.polylines.remove(&layer);
        }
        self.group_owner.remove(&layer);
    }

    fn set_view(&mut self, map: &u64, center: LatLng, zoom: f64) {
        if let Some(m) = self.maps.get_mut(map) {
            m.center = center;
            m.zoom = zoom;
        }
    }

    fn pan_to(&mut self, map: &u64, center: LatLng) {
        if let Some(m) = self.maps.get_mut(map) {
            m.center = center;
        }
    }

    fn viewport_size(&self, _map: &u64) -> [f64; 2] {
        self.viewport_px
    }

    fn invalidate_size(&mut self, map: &u64) {
        if let Some(m) = self.maps.get_mut(map) {
            m.invalidations += 1;
        }
    }
}

/// Index into a [`HeadlessDom`].
pub type NodeId = usize;

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    id: Option<String>,
    parent: Option<NodeId>,
    hidden: bool,
}

/// Arena-backed element tree with `<html>` and `<body>` already in place.
#[derive(Debug, Clone)]
pub struct HeadlessDom {
    nodes: Vec<Element>,
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDom {
    const HTML: NodeId = 0;
    const BODY: NodeId = 1;

    pub fn new() -> Self {
        let mut dom = Self { nodes: Vec::new() };
        dom.push("html", None, None);
        dom.push("body", None, Some(Self::HTML));
        dom
    }

    pub fn body(&self) -> NodeId {
        Self::BODY
    }

    pub fn append(&mut self, parent: NodeId, tag: &str, id: Option<&str>) -> NodeId {
        self.push(tag, id, Some(parent))
    }

    fn push(&mut self, tag: &str, id: Option<&str>, parent: Option<NodeId>) -> NodeId {
        self.nodes.push(Element {
            tag: tag.to_ascii_uppercase(),
            id: id.map(str::to_string),
            parent,
            hidden: false,
        });
        self.nodes.len() - 1
    }

    pub fn find(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.id.as_deref() == Some(id))
    }

    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(|n| n.hidden)
    }

    /// Every element currently hidden, in creation order.
    pub fn hidden(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).filter(|n| self.is_hidden(*n)).collect()
    }
}

impl ElementTree for HeadlessDom {
    type Node = NodeId;

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find(id)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes.get(*node)?.parent
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.nodes
            .get(*node)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    fn is_document_root(&self, node: &NodeId) -> bool {
        *node == Self::HTML || *node == Self::BODY
    }

    fn set_hidden(&mut self, node: &NodeId, hidden: bool) {
        if let Some(n) = self.nodes.get_mut(*node) {
            n.hidden = hidden;
        }
    }
}

/// Element backing an [`crate::AttributeRelay`] outside a browser.
#[derive(Debug, Clone, Default)]
pub struct RelayElement {
    attributes: BTreeMap<String, String>,
    /// Fired events with the event attribute as it was at dispatch time.
    pub dispatched: Vec<(String, Option<String>)>,
}

impl AttributeHost for RelayElement {
    fn read_attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    fn dispatch_event(&mut self, event: &str) {
        let payload = self.read_attribute("data-bridge-event");
        self.dispatched.push((event.to_string(), payload));
    }
}

pub type HeadlessSurface = MapSurface<HeadlessEngine, HeadlessDom>;

/// A surface over `dom` with default config and a clock the caller drives.
pub fn surface_with_dom(dom: HeadlessDom) -> (HeadlessSurface, ManualClock) {
    surface_with_config(dom, BridgeConfig::default())
}

pub fn surface_with_config(
    dom: HeadlessDom,
    config: BridgeConfig,
) -> (HeadlessSurface, ManualClock) {
    let clock = ManualClock::new();
    let surface = MapSurface::new(
        HeadlessEngine::default(),
        dom,
        Box::new(clock.clone()),
        config,
    );
    (surface, clock)
}

/// A surface whose page has one `<div id=mount_id>` directly under `<body>`.
pub fn headless_surface(mount_id: &str) -> (HeadlessSurface, ManualClock) {
    let mut dom = HeadlessDom::new();
    dom.append(dom.body(), "div", Some(mount_id));
    surface_with_dom(dom)
}
