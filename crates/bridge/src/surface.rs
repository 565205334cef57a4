//! Map lifecycle and the state shared by every synchronizer.

use foundation::bounds::LatLng;
use foundation::ids::InstanceId;
use foundation::time::Time;
use layers::layer::{LayerRole, LayerSlot};
use protocol::BridgeEvent;
use runtime::{Clock, DeferredQueue, EventBus, Metrics, MetricsSnapshot};
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::dom::ElementTree;
use crate::engine::{MapEngine, Pointer};

/// Work scheduled to run on a later turn of the host event loop.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Deferred {
    InvalidateSize,
}

/// Everything that exists only while a map is mounted.
pub(crate) struct LiveMap<E: MapEngine> {
    pub(crate) id: InstanceId,
    pub(crate) mount_id: String,
    pub(crate) map: E::Map,
    pub(crate) base: LayerSlot<E::Layer>,
    pub(crate) markers: LayerSlot<E::Layer>,
    pub(crate) route: LayerSlot<E::Layer>,
    pub(crate) overlay: LayerSlot<E::Layer>,
    pub(crate) overlay_enabled: bool,
    /// Bumped on every marker rebuild so taps on older glyphs miss.
    pub(crate) generation: u32,
    /// Tap id per glyph index of the current generation.
    pub(crate) tap_targets: Vec<Option<String>>,
}

/// The owning context for one embedded map.
///
/// Holds the engine, the element tree the map is mounted in, and all layer
/// state. There is no global state: two surfaces are fully independent.
pub struct MapSurface<E: MapEngine, D: ElementTree> {
    pub(crate) engine: E,
    pub(crate) dom: D,
    pub(crate) config: BridgeConfig,
    pub(crate) live: Option<LiveMap<E>>,
    pub(crate) last_mount: Option<String>,
    clock: Box<dyn Clock>,
    deferred: DeferredQueue<Deferred>,
    events: EventBus<BridgeEvent>,
    pub(crate) metrics: Metrics,
}

impl<E: MapEngine, D: ElementTree> MapSurface<E, D> {
    pub fn new(engine: E, dom: D, clock: Box<dyn Clock>, config: BridgeConfig) -> Self {
        Self {
            engine,
            dom,
            config,
            live: None,
            last_mount: None,
            clock,
            deferred: DeferredQueue::new(),
            events: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    /// Identity of the mounted map, if any.
    pub fn instance(&self) -> Option<InstanceId> {
        self.live.as_ref().map(|l| l.id)
    }

    pub fn is_mounted(&self) -> bool {
        self.live.is_some()
    }

    /// Mounts a map on `mount_id`.
    ///
    /// No-op when a map already exists or the element is missing; callers may
    /// call this speculatively. Returns the new instance when one was created.
    pub fn init_map(
        &mut self,
        mount_id: &str,
        lat: f64,
        lng: f64,
        zoom: f64,
    ) -> Option<InstanceId> {
        if let Some(live) = &self.live {
            debug!(instance = %live.id, "init_map ignored: map already mounted");
            return None;
        }
        if self.dom.element_by_id(mount_id).is_none() {
            debug!(mount_id, "init_map ignored: mount element not found");
            return None;
        }
        let center = LatLng::new(lat, lng);
        if !center.is_finite() || !zoom.is_finite() {
            debug!(lat, lng, zoom, "init_map ignored: non-finite view");
            return None;
        }
        let Some(map) = self.engine.create_map(mount_id, center, zoom) else {
            debug!(mount_id, "init_map ignored: engine refused to create a map");
            return None;
        };

        let mut base = LayerSlot::new(LayerRole::BaseTiles);
        base.put(self.engine.add_tile_layer(&map, &self.config.base_tiles));
        self.engine.add_zoom_control(&map, self.config.zoom_control);
        let mut markers = LayerSlot::new(LayerRole::Markers);
        markers.put(self.engine.add_layer_group(&map));

        let id = InstanceId::next();
        self.live = Some(LiveMap {
            id,
            mount_id: mount_id.to_string(),
            map,
            base,
            markers,
            route: LayerSlot::new(LayerRole::Route),
            overlay: LayerSlot::new(LayerRole::Overlay),
            overlay_enabled: false,
            generation: 0,
            tap_targets: Vec::new(),
        });
        self.last_mount = Some(mount_id.to_string());
        self.metrics.inc("maps.created");
        info!(instance = %id, mount_id, lat, lng, zoom, "map mounted");
        Some(id)
    }

    /// Tears the map down and forgets every layer. Only after this can
    /// `init_map` succeed again.
    pub fn dispose(&mut self) {
        let Some(mut live) = self.live.take() else {
            debug!("dispose ignored: no map");
            return;
        };
        // The engine drops the layers with the map; the slots just let go.
        for slot in [
            &mut live.base,
            &mut live.markers,
            &mut live.route,
            &mut live.overlay,
        ] {
            slot.take();
        }
        let cancelled = self.deferred.cancel_owner(live.id);
        self.engine.remove_map(live.map);
        self.metrics.set_gauge("glyphs", 0);
        info!(instance = %live.id, cancelled, "map disposed");
    }

    /// Shows or removes the seamark overlay. Repeating the current state is a
    /// no-op.
    pub fn toggle_overlay(&mut self, enabled: bool) {
        let Some(live) = self.live.as_mut() else {
            debug!(enabled, "toggle_overlay ignored: no map");
            return;
        };
        live.overlay_enabled = enabled;
        if enabled && !live.overlay.is_occupied() {
            let layer = self
                .engine
                .add_tile_layer(&live.map, &self.config.overlay_tiles);
            live.overlay.put(layer);
            debug!(instance = %live.id, "overlay added");
        } else if !enabled && let Some(layer) = live.overlay.take() {
            self.engine.remove_layer(&live.map, layer);
            debug!(instance = %live.id, "overlay removed");
        }
    }

    /// Last requested overlay state; `false` without a map.
    pub fn is_overlay_enabled(&self) -> bool {
        self.live.as_ref().is_some_and(|l| l.overlay_enabled)
    }

    /// Feeds a click observed by the engine back into the bridge.
    ///
    /// Map clicks become `MapTapped`. Glyph clicks never reach the map: a
    /// glyph from the current snapshot with a tap id becomes `MarkerTapped`,
    /// anything else is dropped.
    pub fn handle_pointer(&mut self, pointer: Pointer) {
        let Some(live) = &self.live else {
            debug!(?pointer, "pointer ignored: no map");
            return;
        };
        match pointer {
            Pointer::Map { at } => {
                self.metrics.inc("taps.map");
                self.events.emit(BridgeEvent::MapTapped {
                    lat: at.lat,
                    lng: at.lng,
                });
            }
            Pointer::Glyph { key, .. } => {
                if key.instance != live.id || key.generation != live.generation {
                    debug!(?key, "tap on stale glyph dropped");
                    return;
                }
                let target = live
                    .tap_targets
                    .get(key.index as usize)
                    .and_then(|t| t.clone());
                if let Some(id) = target {
                    self.metrics.inc("taps.marker");
                    self.events.emit(BridgeEvent::MarkerTapped { id });
                }
            }
        }
    }

    pub(crate) fn emit(&mut self, event: BridgeEvent) {
        self.events.emit(event);
    }

    /// Outbound events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<BridgeEvent> {
        self.events.drain()
    }

    pub(crate) fn schedule(&mut self, delay_ms: u32, task: Deferred) {
        let Some(live) = &self.live else {
            return;
        };
        let due = self.clock.now().after_ms(delay_ms);
        self.deferred.schedule(live.id, due, task);
    }

    /// Earliest time deferred work wants to run.
    pub fn next_deadline(&self) -> Option<Time> {
        self.deferred.next_due()
    }

    /// Runs deferred tasks that are due. A task whose map has gone away in
    /// the meantime is dropped. Returns how many tasks acted.
    pub fn run_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_due(now) {
            let Some(live) = self.live.as_ref().filter(|l| l.id == task.owner) else {
                self.metrics.inc("deferred.dropped");
                debug!(owner = %task.owner, "deferred task outlived its map");
                continue;
            };
            match task.payload {
                Deferred::InvalidateSize => self.engine.invalidate_size(&live.map),
            }
            self.metrics.inc("deferred.run");
            ran += 1;
        }
        ran
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use crate::headless::{HeadlessDom, HeadlessEngine, headless_surface};
    use crate::engine::Pointer;
    use foundation::bounds::LatLng;
    use protocol::BridgeEvent;

    fn mounted() -> crate::MapSurface<HeadlessEngine, HeadlessDom> {
        let (mut surface, _clock) = headless_surface("map");
        surface.init_map("map", 54.0, 10.0, 8.0).unwrap();
        surface
    }

    #[test]
    fn init_builds_base_layers() {
        let surface = mounted();
        let map = surface.engine().live_map().unwrap();
        assert_eq!(map.mount_id, "map");
        assert_eq!(map.center, LatLng::new(54.0, 10.0));
        assert_eq!(map.zoom, 8.0);
        assert_eq!(map.tile_layers.len(), 1);
        assert_eq!(map.groups.len(), 1);
        assert_eq!(map.zoom_controls.len(), 1);
    }

    #[test]
    fn init_is_idempotent() {
        let mut surface = mounted();
        let first = surface.instance();
        assert!(surface.init_map("map", 0.0, 0.0, 2.0).is_none());
        assert_eq!(surface.instance(), first);
        assert_eq!(surface.engine().live_maps(), 1);
    }

    #[test]
    fn init_without_mount_element_is_noop() {
        let (mut surface, _clock) = headless_surface("map");
        assert!(surface.init_map("elsewhere", 0.0, 0.0, 2.0).is_none());
        assert!(!surface.is_mounted());
        assert_eq!(surface.engine().live_maps(), 0);
    }

    #[test]
    fn dispose_releases_everything_and_allows_reinit() {
        let mut surface = mounted();
        surface.toggle_overlay(true);
        surface.update_route("[[1,2],[3,4]]");
        surface.update_markers(r#"[{"type":"current","lat":1,"lng":2}]"#);
        let old = surface.instance().unwrap();

        surface.dispose();
        assert!(!surface.is_mounted());
        assert_eq!(surface.engine().live_maps(), 0);
        assert!(!surface.is_overlay_enabled());

        let new = surface.init_map("map", 54.0, 10.0, 8.0).unwrap();
        assert_ne!(old, new);
        let map = surface.engine().live_map().unwrap();
        assert_eq!(map.tile_layers.len(), 1);
        assert!(map.polylines.is_empty());
        assert_eq!(map.glyph_count(), 0);
        assert!(!surface.is_overlay_enabled());
    }

    #[test]
    fn overlay_toggle_is_idempotent() {
        let mut surface = mounted();
        surface.toggle_overlay(true);
        surface.toggle_overlay(true);
        assert!(surface.is_overlay_enabled());
        assert_eq!(surface.engine().live_map().unwrap().tile_layers.len(), 2);

        surface.toggle_overlay(false);
        surface.toggle_overlay(false);
        assert!(!surface.is_overlay_enabled());
        assert_eq!(surface.engine().live_map().unwrap().tile_layers.len(), 1);
    }

    #[test]
    fn overlay_toggle_without_map_is_noop() {
        let (mut surface, _clock) = headless_surface("map");
        surface.toggle_overlay(true);
        assert!(!surface.is_overlay_enabled());
    }

    #[test]
    fn map_click_emits_map_tapped() {
        let mut surface = mounted();
        surface.handle_pointer(Pointer::Map {
            at: LatLng::new(1.5, 2.5),
        });
        assert_eq!(
            surface.drain_events(),
            vec![BridgeEvent::MapTapped { lat: 1.5, lng: 2.5 }]
        );
    }

    #[test]
    fn pointer_without_map_is_dropped() {
        let (mut surface, _clock) = headless_surface("map");
        surface.handle_pointer(Pointer::Map {
            at: LatLng::new(1.0, 1.0),
        });
        assert!(surface.drain_events().is_empty());
    }
}
