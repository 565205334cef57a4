//! Marker layer synchronization: every snapshot replaces the whole group.
//!
//! There is no diffing against the previous snapshot. Hosts may send partial
//! or out-of-order snapshots, and a full rebuild is the only way to guarantee
//! no glyph (or tap handler) from an older snapshot survives.

use foundation::handles::GlyphKey;
use protocol::decode_markers;
use tracing::{debug, warn};

use crate::dom::ElementTree;
use crate::engine::MapEngine;
use crate::surface::MapSurface;

impl<E: MapEngine, D: ElementTree> MapSurface<E, D> {
    /// Replaces all markers with the serialized snapshot `payload`.
    ///
    /// A malformed snapshot is logged and leaves the current markers alone.
    pub fn update_markers(&mut self, payload: &str) {
        let Some(live) = self.live.as_mut() else {
            debug!("update_markers ignored: no map");
            return;
        };
        let markers = match decode_markers(payload) {
            Ok(markers) => markers,
            Err(err) => {
                self.metrics.inc("payloads.rejected");
                warn!(%err, "marker snapshot ignored");
                return;
            }
        };
        let Some(group) = live.markers.get() else {
            return;
        };

        self.engine.clear_layer_group(group);
        live.generation = live.generation.wrapping_add(1);
        live.tap_targets.clear();

        for (index, marker) in markers.iter().enumerate() {
            let glyph = marker.to_glyph();
            let key = GlyphKey::new(live.id, live.generation, index as u32);
            live.tap_targets.push(glyph.tap_id.clone());
            self.engine.add_glyph(group, key, &glyph);
        }

        self.metrics.set_gauge("glyphs", markers.len() as i64);
        debug!(instance = %live.id, count = markers.len(), "markers rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::Pointer;
    use crate::headless::{HeadlessDom, HeadlessEngine, headless_surface};
    use crate::MapSurface;
    use foundation::bounds::LatLng;
    use layers::symbology::{GlyphShape, PinKind};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use protocol::BridgeEvent;

    const SNAPSHOT: &str = r#"[
        {"type":"departure","lat":54.32,"lng":10.14,"label":"A","id":"dep"},
        {"type":"ais","lat":54.40,"lng":10.30,"mmsi":211000001,"cog":45,"sog":7.25,"name":"FEHMARN"},
        {"type":"current","lat":54.35,"lng":10.20},
        {"type":"waypoint","lat":54.50,"lng":10.60,"id":"w1"},
        {"type":"destination","lat":54.60,"lng":11.00,"label":"B"}
    ]"#;

    fn mounted() -> MapSurface<HeadlessEngine, HeadlessDom> {
        let (mut surface, _clock) = headless_surface("map");
        surface.init_map("map", 54.0, 10.0, 8.0).unwrap();
        surface
    }

    fn rendered(surface: &MapSurface<HeadlessEngine, HeadlessDom>) -> Vec<GlyphShape> {
        surface
            .engine()
            .live_map()
            .unwrap()
            .glyphs()
            .into_iter()
            .map(|(_, g)| g.shape.clone())
            .collect()
    }

    #[test]
    fn renders_in_input_order() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        assert_eq!(
            rendered(&surface),
            vec![
                GlyphShape::Pin {
                    kind: PinKind::Departure,
                    label: "A".to_string()
                },
                GlyphShape::Vessel { heading_deg: 45.0 },
                GlyphShape::PositionPulse,
                GlyphShape::Pin {
                    kind: PinKind::Waypoint,
                    label: String::new()
                },
                GlyphShape::Pin {
                    kind: PinKind::Destination,
                    label: "B".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_snapshot_clears_markers() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        surface.update_markers("[]");
        assert!(rendered(&surface).is_empty());
    }

    #[test]
    fn malformed_snapshot_keeps_previous_markers() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        surface.update_markers(r#"[{"type":"waypoint","lat":"north"}]"#);
        surface.update_markers("definitely not json");
        assert_eq!(rendered(&surface).len(), 5);
        assert_eq!(
            surface
                .metrics()
                .counters
                .iter()
                .find(|(k, _)| *k == "payloads.rejected")
                .map(|(_, v)| *v),
            Some(2)
        );
    }

    #[test]
    fn odd_type_renders_as_waypoint_beside_valid_records() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        surface.update_markers(
            r#"[{"type":"waypoint","lat":1,"lng":2,"id":"a"},{"type":7,"lat":3,"lng":4}]"#,
        );
        let map = surface.engine().live_map().unwrap();
        assert_eq!(map.glyph_count(), 2);
        assert!(map.glyph_key_for("a").is_some());
    }

    #[test]
    fn without_map_is_noop() {
        let (mut surface, _clock) = headless_surface("map");
        surface.update_markers(SNAPSHOT);
        assert_eq!(surface.engine().live_maps(), 0);
    }

    #[test]
    fn tapping_pin_with_id_emits_only_marker_tapped() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        let key = surface.engine().live_map().unwrap().glyph_key_for("w1").unwrap();

        surface.handle_pointer(Pointer::Glyph {
            key,
            at: LatLng::new(54.5, 10.6),
        });
        assert_eq!(
            surface.drain_events(),
            vec![BridgeEvent::MarkerTapped {
                id: "w1".to_string()
            }]
        );
    }

    #[test]
    fn tapping_glyph_without_id_emits_nothing() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        let glyphs = surface.engine().live_map().unwrap().glyphs();
        let (vessel_key, _) = glyphs[1];
        surface.handle_pointer(Pointer::Glyph {
            key: vessel_key,
            at: LatLng::new(54.4, 10.3),
        });
        assert!(surface.drain_events().is_empty());
    }

    #[test]
    fn taps_on_glyphs_from_older_snapshot_are_dropped() {
        let mut surface = mounted();
        surface.update_markers(SNAPSHOT);
        let stale = surface.engine().live_map().unwrap().glyph_key_for("w1").unwrap();
        surface.update_markers(SNAPSHOT);

        surface.handle_pointer(Pointer::Glyph {
            key: stale,
            at: LatLng::new(54.5, 10.6),
        });
        assert!(surface.drain_events().is_empty());
    }

    proptest! {
        #[test]
        fn repeating_a_snapshot_renders_the_same_set(
            points in prop::collection::vec((-80.0..80.0_f64, -179.0..179.0_f64, 0u8..4), 0..12)
        ) {
            let tags = ["ais", "current", "waypoint", "mystery"];
            let records: Vec<String> = points
                .iter()
                .enumerate()
                .map(|(i, (lat, lng, t))| {
                    format!(
                        r#"{{"type":"{}","lat":{lat},"lng":{lng},"mmsi":{i},"id":"m{i}"}}"#,
                        tags[*t as usize]
                    )
                })
                .collect();
            let payload = format!("[{}]", records.join(","));

            let mut surface = mounted();
            surface.update_markers(&payload);
            let once = rendered(&surface);
            surface.update_markers(&payload);
            let twice = rendered(&surface);
            prop_assert_eq!(once.len(), points.len());
            prop_assert_eq!(once, twice);
        }
    }
}
