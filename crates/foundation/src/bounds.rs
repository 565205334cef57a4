use serde::{Deserialize, Serialize};

/// A geographic position in degrees.
///
/// On the wire a position is a two-element `[lat, lng]` array.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        LatLng { lat, lng }
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(p: LatLng) -> Self {
        [p.lat, p.lng]
    }
}

/// Axis-aligned geographic extent.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        LatLngBounds {
            south_west,
            north_east,
        }
    }

    /// Minimal extent covering every point, or `None` for an empty slice.
    pub fn covering(points: &[LatLng]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = LatLngBounds::new(*first, *first);
        for p in rest {
            b.extend(*p);
        }
        Some(b)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }

    pub fn contains_bounds(&self, other: &LatLngBounds) -> bool {
        self.contains(other.south_west) && self.contains(other.north_east)
    }
}

#[cfg(test)]
mod tests {
    use super::{LatLng, LatLngBounds};

    #[test]
    fn covering_extends_over_all_points() {
        let b = LatLngBounds::covering(&[
            LatLng::new(10.0, 20.0),
            LatLng::new(-5.0, 30.0),
            LatLng::new(2.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b.south_west, LatLng::new(-5.0, -1.0));
        assert_eq!(b.north_east, LatLng::new(10.0, 30.0));
        assert!(b.contains(LatLng::new(0.0, 0.0)));
        assert!(!b.contains(LatLng::new(11.0, 0.0)));
    }

    #[test]
    fn covering_empty_is_none() {
        assert!(LatLngBounds::covering(&[]).is_none());
    }

    #[test]
    fn latlng_reads_pair_arrays() {
        let p: LatLng = serde_json::from_str("[1.5, -2.25]").unwrap();
        assert_eq!(p, LatLng::new(1.5, -2.25));
        assert!(serde_json::from_str::<LatLng>("[1.5]").is_err());
        assert_eq!(serde_json::to_string(&p).unwrap(), "[1.5,-2.25]");
    }
}
