//! Camera operations: pan, set view, fit to points.

use foundation::bounds::{LatLng, LatLngBounds};
use foundation::math::{FitOptions, fit_bounds};
use protocol::{PayloadKind, decode_points};
use tracing::{debug, warn};

use crate::dom::ElementTree;
use crate::engine::MapEngine;
use crate::surface::MapSurface;

impl<E: MapEngine, D: ElementTree> MapSurface<E, D> {
    /// Moves the camera so every point in `payload` is visible.
    ///
    /// One point is centered at the configured single-point zoom (a point has
    /// no extent to fit). Two or more are fitted inside the padded container
    /// without zooming past the configured ceiling.
    pub fn fit_bounds(&mut self, payload: &str) {
        let Some(live) = &self.live else {
            debug!("fit_bounds ignored: no map");
            return;
        };
        let points = match decode_points(payload, PayloadKind::Bounds) {
            Ok(points) => points,
            Err(err) => {
                self.metrics.inc("payloads.rejected");
                warn!(%err, "fit_bounds ignored");
                return;
            }
        };

        let fit = &self.config.fit;
        match points.as_slice() {
            [] => debug!("fit_bounds ignored: no points"),
            [only] => self.engine.set_view(&live.map, *only, fit.single_point_zoom),
            _ => {
                let Some(bounds) = LatLngBounds::covering(&points) else {
                    return;
                };
                let size = self.engine.viewport_size(&live.map);
                let options = FitOptions {
                    padding_px: fit.padding_px,
                    max_zoom: fit.max_zoom,
                    zoom_snap: fit.zoom_snap,
                };
                let (center, zoom) = fit_bounds(&bounds, size, options);
                debug!(?center, zoom, "fit_bounds");
                self.engine.set_view(&live.map, center, zoom);
            }
        }
    }

    pub fn pan_to(&mut self, lat: f64, lng: f64) {
        let Some(live) = &self.live else {
            debug!("pan_to ignored: no map");
            return;
        };
        let center = LatLng::new(lat, lng);
        if !center.is_finite() {
            debug!(lat, lng, "pan_to ignored: non-finite");
            return;
        }
        self.engine.pan_to(&live.map, center);
    }

    pub fn set_view(&mut self, lat: f64, lng: f64, zoom: f64) {
        let Some(live) = &self.live else {
            debug!("set_view ignored: no map");
            return;
        };
        let center = LatLng::new(lat, lng);
        if !center.is_finite() || !zoom.is_finite() {
            debug!(lat, lng, zoom, "set_view ignored: non-finite");
            return;
        }
        self.engine.set_view(&live.map, center, zoom);
    }
}
