//! Spherical Web Mercator, the projection every slippy-map tile source uses.
//!
//! Pixel coordinates are measured with 256-px tiles: at zoom `z` the world is
//! `256 * 2^z` pixels wide, `x` grows east and `y` grows south.

use std::f64::consts::PI;

use crate::bounds::{LatLng, LatLngBounds};

pub const TILE_SIZE_PX: f64 = 256.0;

/// Latitude beyond which Web Mercator is undefined (square world).
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// World size in pixels at `zoom`.
pub fn world_size_px(zoom: f64) -> f64 {
    TILE_SIZE_PX * zoom.exp2()
}

pub fn project(p: LatLng, zoom: f64) -> [f64; 2] {
    let size = world_size_px(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (p.lng + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    [x, y]
}

pub fn unproject(px: [f64; 2], zoom: f64) -> LatLng {
    let size = world_size_px(zoom);
    let lng = px[0] / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * px[1] / size;
    let lat = (0.5 * (n.exp() - (-n).exp())).atan().to_degrees();
    LatLng::new(lat, lng)
}

/// A camera over a map container of `size_px` pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
    pub size_px: [f64; 2],
}

impl Viewport {
    pub fn new(center: LatLng, zoom: f64, size_px: [f64; 2]) -> Self {
        Self {
            center,
            zoom,
            size_px,
        }
    }

    /// Geographic extent currently visible.
    pub fn extent(&self) -> LatLngBounds {
        self.extent_inset([0.0, 0.0])
    }

    /// Visible extent shrunk by `inset_px` on every side.
    pub fn extent_inset(&self, inset_px: [f64; 2]) -> LatLngBounds {
        let [cx, cy] = project(self.center, self.zoom);
        let half_w = (self.size_px[0] / 2.0 - inset_px[0]).max(0.0);
        let half_h = (self.size_px[1] / 2.0 - inset_px[1]).max(0.0);
        let north_west = unproject([cx - half_w, cy - half_h], self.zoom);
        let south_east = unproject([cx + half_w, cy + half_h], self.zoom);
        LatLngBounds::new(
            LatLng::new(south_east.lat, north_west.lng),
            LatLng::new(north_west.lat, south_east.lng),
        )
    }
}

/// Options for [`fit_bounds`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitOptions {
    /// Pixels kept free on each side (x, y).
    pub padding_px: [f64; 2],
    /// Zoom ceiling.
    pub max_zoom: f64,
    /// Zoom is snapped down to a multiple of this (0 disables snapping).
    pub zoom_snap: f64,
}

/// Center and zoom showing all of `bounds` inside a `size_px` container.
///
/// Coincident points (zero span) fit at `max_zoom`.
pub fn fit_bounds(bounds: &LatLngBounds, size_px: [f64; 2], options: FitOptions) -> (LatLng, f64) {
    let nw = project(
        LatLng::new(bounds.north_east.lat, bounds.south_west.lng),
        0.0,
    );
    let se = project(
        LatLng::new(bounds.south_west.lat, bounds.north_east.lng),
        0.0,
    );
    let span_x = (se[0] - nw[0]).abs();
    let span_y = (se[1] - nw[1]).abs();

    let avail_x = (size_px[0] - 2.0 * options.padding_px[0]).max(1.0);
    let avail_y = (size_px[1] - 2.0 * options.padding_px[1]).max(1.0);

    let scale_x = if span_x > 0.0 { avail_x / span_x } else { f64::INFINITY };
    let scale_y = if span_y > 0.0 { avail_y / span_y } else { f64::INFINITY };
    let mut zoom = scale_x.min(scale_y).log2();
    if options.zoom_snap > 0.0 && zoom.is_finite() {
        zoom = (zoom / options.zoom_snap).floor() * options.zoom_snap;
    }
    let zoom = zoom.clamp(0.0, options.max_zoom.max(0.0));

    let mid = [(nw[0] + se[0]) / 2.0, (nw[1] + se[1]) / 2.0];
    (unproject(mid, 0.0), zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const OPTS: FitOptions = FitOptions {
        padding_px: [50.0, 50.0],
        max_zoom: 14.0,
        zoom_snap: 1.0,
    };

    #[test]
    fn project_roundtrips_origin() {
        let px = project(LatLng::new(0.0, 0.0), 0.0);
        assert!((px[0] - 128.0).abs() < 1e-9);
        assert!((px[1] - 128.0).abs() < 1e-9);
        let back = unproject(px, 0.0);
        assert!(back.lat.abs() < 1e-9 && back.lng.abs() < 1e-9);
    }

    #[test]
    fn fit_contains_points_with_padding() {
        let b = LatLngBounds::covering(&[LatLng::new(0.0, 0.0), LatLng::new(10.0, 10.0)]).unwrap();
        let size = [800.0, 600.0];
        let (center, zoom) = fit_bounds(&b, size, OPTS);
        assert!(zoom <= 14.0);
        assert_eq!(zoom, zoom.floor());

        let view = Viewport::new(center, zoom, size);
        let inner = view.extent_inset([50.0, 50.0]);
        assert!(inner.contains_bounds(&b), "{inner:?} must contain {b:?}");
    }

    #[test]
    fn coincident_points_fit_at_ceiling() {
        let p = LatLng::new(54.3, 10.1);
        let b = LatLngBounds::new(p, p);
        let (center, zoom) = fit_bounds(&b, [800.0, 600.0], OPTS);
        assert_eq!(zoom, 14.0);
        assert!((center.lat - p.lat).abs() < 1e-9);
        assert!((center.lng - p.lng).abs() < 1e-9);
    }

    #[test]
    fn tiny_container_clamps_to_zero() {
        let b = LatLngBounds::new(LatLng::new(-60.0, -170.0), LatLng::new(60.0, 170.0));
        let (_, zoom) = fit_bounds(&b, [40.0, 40.0], OPTS);
        assert_eq!(zoom, 0.0);
    }

    proptest! {
        #[test]
        fn fitted_view_never_exceeds_ceiling_and_contains_extent(
            lat_a in -70.0..70.0_f64,
            lng_a in -170.0..170.0_f64,
            dlat in 0.001..10.0_f64,
            dlng in 0.001..10.0_f64,
        ) {
            let b = LatLngBounds::covering(&[
                LatLng::new(lat_a, lng_a),
                LatLng::new(lat_a + dlat, lng_a + dlng),
            ]).unwrap();
            let size = [1024.0, 768.0];
            let (center, zoom) = fit_bounds(&b, size, OPTS);
            prop_assert!(zoom <= 14.0);
            prop_assert!(zoom >= 0.0);
            if zoom < 14.0 {
                let inner = Viewport::new(center, zoom, size).extent_inset([49.0, 49.0]);
                prop_assert!(inner.contains_bounds(&b), "{:?} vs {:?}", inner, b);
            }
        }
    }
}
