use layers::route::RoutePath;
use protocol::{PayloadKind, decode_points};
use tracing::{debug, warn};

use crate::dom::ElementTree;
use crate::engine::MapEngine;
use crate::surface::MapSurface;

impl<E: MapEngine, D: ElementTree> MapSurface<E, D> {
    /// Replaces the route line with the serialized points in `payload`.
    ///
    /// The old line is always removed first, so a malformed payload or one
    /// with fewer than two points leaves no route at all.
    pub fn update_route(&mut self, payload: &str) {
        let Some(live) = self.live.as_mut() else {
            debug!("update_route ignored: no map");
            return;
        };
        if let Some(old) = live.route.take() {
            self.engine.remove_layer(&live.map, old);
        }

        let points = match decode_points(payload, PayloadKind::Route) {
            Ok(points) => points,
            Err(err) => {
                self.metrics.inc("payloads.rejected");
                warn!(%err, "route ignored");
                return;
            }
        };
        let Some(path) = RoutePath::from_points(points) else {
            debug!(instance = %live.id, "route cleared");
            return;
        };

        let line = self
            .engine
            .add_polyline(&live.map, path.points(), &self.config.route_style);
        live.route.put(line);
        debug!(instance = %live.id, points = path.len(), "route drawn");
    }
}

#[cfg(test)]
mod tests {
    use crate::headless::{HeadlessDom, HeadlessEngine, headless_surface};
    use crate::MapSurface;
    use foundation::bounds::LatLng;

    fn mounted() -> MapSurface<HeadlessEngine, HeadlessDom> {
        let (mut surface, _clock) = headless_surface("map");
        surface.init_map("map", 54.0, 10.0, 8.0).unwrap();
        surface
    }

    fn route_of(surface: &MapSurface<HeadlessEngine, HeadlessDom>) -> Option<Vec<LatLng>> {
        surface.engine().live_map().unwrap().route().map(|r| r.to_vec())
    }

    #[test]
    fn draws_a_single_line_in_order() {
        let mut surface = mounted();
        surface.update_route("[[1,2],[3,4],[5,6]]");
        surface.update_route("[[7,8],[9,10]]");
        let map = surface.engine().live_map().unwrap();
        assert_eq!(map.polylines.len(), 1);
        assert_eq!(
            route_of(&surface),
            Some(vec![LatLng::new(7.0, 8.0), LatLng::new(9.0, 10.0)])
        );
    }

    #[test]
    fn short_routes_clear_the_line() {
        for payload in ["[]", "[[1,2]]"] {
            let mut surface = mounted();
            surface.update_route("[[1,2],[3,4]]");
            surface.update_route(payload);
            assert_eq!(route_of(&surface), None, "payload {payload}");
        }
    }

    #[test]
    fn malformed_route_still_clears() {
        let mut surface = mounted();
        surface.update_route("[[1,2],[3,4]]");
        surface.update_route("[[1,2],[3]]");
        assert_eq!(route_of(&surface), None);
    }

    #[test]
    fn uses_configured_style() {
        let mut surface = mounted();
        surface.update_route("[[1,2],[3,4]]");
        let map = surface.engine().live_map().unwrap();
        let (_, style) = map.polylines.values().next().unwrap();
        assert_eq!(style.color, "#00E5FF");
        assert_eq!(style.weight_px, 3.0);
    }

    #[test]
    fn without_map_is_noop() {
        let (mut surface, _clock) = headless_surface("map");
        surface.update_route("[[1,2],[3,4]]");
        assert_eq!(surface.engine().live_maps(), 0);
    }
}
