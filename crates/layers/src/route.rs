use foundation::bounds::LatLng;

/// A drawable route: two or more points in travel order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePath {
    points: Vec<LatLng>,
}

impl RoutePath {
    /// `None` when there are fewer than two points, which means "no route".
    pub fn from_points(points: Vec<LatLng>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::RoutePath;
    use foundation::bounds::LatLng;

    #[test]
    fn needs_two_points() {
        assert!(RoutePath::from_points(vec![]).is_none());
        assert!(RoutePath::from_points(vec![LatLng::new(1.0, 2.0)]).is_none());

        let path =
            RoutePath::from_points(vec![LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0)]).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.points()[1], LatLng::new(3.0, 4.0));
    }
}
