//! Waypoint routes with a forward-only progress cursor.

use vehicle_domain::{DistanceMetric, GeoPoint};

/// Closest point on a route to some query position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: GeoPoint,
    pub distance: f64,
    /// Index of the waypoint that starts the winning segment
    pub segment_index: usize,
}

/// Ordered waypoints plus the index of the waypoint currently being approached.
///
/// The cursor never moves backwards and never passes the last waypoint.
/// Reaching the last waypoint's index ends navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    waypoints: Vec<GeoPoint>,
    current_index: usize,
    metric: DistanceMetric,
}

impl Route {
    pub fn new(waypoints: Vec<GeoPoint>) -> Self {
        Self {
            waypoints,
            current_index: 0,
            metric: DistanceMetric::default(),
        }
    }

    /// Use a different distance metric for proximity and length queries.
    #[must_use]
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Append a waypoint. The cursor is unaffected.
    pub fn add_waypoint(&mut self, waypoint: GeoPoint) {
        self.waypoints.push(waypoint);
    }

    /// Waypoint being approached, or `(0,0)` for an empty route.
    pub fn current_waypoint(&self) -> GeoPoint {
        self.waypoints
            .get(self.current_index)
            .copied()
            .unwrap_or_default()
    }

    /// Waypoint after the current one, or the current one at the end of the route.
    pub fn next_waypoint(&self) -> GeoPoint {
        self.waypoints
            .get(self.current_index + 1)
            .copied()
            .unwrap_or_else(|| self.current_waypoint())
    }

    /// Move the cursor forward. Returns `false` when already at the last waypoint.
    pub fn advance_to_next_waypoint(&mut self) -> bool {
        if self.current_index + 1 < self.waypoints.len() {
            self.current_index += 1;
            true
        } else {
            false
        }
    }

    /// True once the cursor sits on the last waypoint. An empty route never completes.
    pub fn is_completed(&self) -> bool {
        !self.waypoints.is_empty() && self.current_index == self.waypoints.len() - 1
    }

    /// Closest point lying on any segment between consecutive waypoints.
    ///
    /// Projection happens in the (lat, lon) plane; the reported distance uses
    /// the route's metric. The first segment reaching the minimum wins.
    pub fn closest_point_on_route(&self, position: &GeoPoint) -> Option<ClosestPoint> {
        match self.waypoints.as_slice() {
            [] => None,
            [only] => Some(ClosestPoint {
                point: *only,
                distance: self.metric.distance(position, only),
                segment_index: 0,
            }),
            waypoints => {
                let mut best: Option<ClosestPoint> = None;
                for (segment_index, pair) in waypoints.windows(2).enumerate() {
                    let point = project_onto_segment(position, &pair[0], &pair[1]);
                    let distance = self.metric.distance(position, &point);
                    if best.is_none_or(|b| distance < b.distance) {
                        best = Some(ClosestPoint {
                            point,
                            distance,
                            segment_index,
                        });
                    }
                }
                best
            }
        }
    }

    /// Sum of the distances between consecutive waypoints.
    pub fn total_distance(&self) -> f64 {
        self.path_length(0)
    }

    /// Distance from `position` to the current waypoint plus the rest of the route.
    pub fn remaining_distance(&self, position: &GeoPoint) -> f64 {
        if self.waypoints.is_empty() {
            return 0.0;
        }
        self.metric.distance(position, &self.current_waypoint()) + self.path_length(self.current_index)
    }

    fn path_length(&self, from: usize) -> f64 {
        self.waypoints
            .get(from..)
            .unwrap_or_default()
            .windows(2)
            .map(|pair| self.metric.distance(&pair[0], &pair[1]))
            .sum()
    }

    pub fn waypoints(&self) -> &[GeoPoint] {
        &self.waypoints
    }

    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub const fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

impl From<Vec<GeoPoint>> for Route {
    fn from(waypoints: Vec<GeoPoint>) -> Self {
        Self::new(waypoints)
    }
}

/// Project `p` onto segment `a`-`b` in the plane, clamped to the endpoints.
pub(crate) fn project_onto_segment(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    let d_lat = b.lat - a.lat;
    let d_lon = b.lon - a.lon;
    let len_sq = d_lat.mul_add(d_lat, d_lon * d_lon);
    if len_sq == 0.0 {
        return *a;
    }
    let t = ((p.lat - a.lat) * d_lat + (p.lon - a.lon) * d_lon) / len_sq;
    let t = t.clamp(0.0, 1.0);
    GeoPoint::new(t.mul_add(d_lat, a.lat), t.mul_add(d_lon, a.lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Route {
        Route::new(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(1.0, 0.0),
        ])
    }

    #[test]
    fn test_empty_route() {
        let mut route = Route::default();
        assert!(!route.is_completed());
        assert_eq!(route.current_waypoint(), GeoPoint::new(0.0, 0.0));
        assert_eq!(route.next_waypoint(), GeoPoint::new(0.0, 0.0));
        assert!(!route.advance_to_next_waypoint());
        assert_eq!(route.current_index(), 0);
        assert!(route.closest_point_on_route(&GeoPoint::new(1.0, 1.0)).is_none());
        assert!(route.total_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn test_advance_until_completed() {
        let mut route = square();
        assert!(!route.is_completed());
        assert_eq!(route.next_waypoint(), GeoPoint::new(0.0, 1.0));

        assert!(route.advance_to_next_waypoint());
        assert!(route.advance_to_next_waypoint());
        assert!(route.advance_to_next_waypoint());
        assert!(route.is_completed());
        assert_eq!(route.current_index(), 3);

        // Last waypoint has no distinct next
        assert_eq!(route.next_waypoint(), route.current_waypoint());
        assert!(!route.advance_to_next_waypoint());
        assert_eq!(route.current_index(), 3);
    }

    #[test]
    fn test_single_waypoint_is_completed() {
        let route = Route::new(vec![GeoPoint::new(2.0, 3.0)]);
        assert!(route.is_completed());
        let closest = route.closest_point_on_route(&GeoPoint::new(2.0, 4.0)).unwrap();
        assert_eq!(closest.point, GeoPoint::new(2.0, 3.0));
        assert!((closest.distance - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_add_waypoint_keeps_cursor() {
        let mut route = Route::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]);
        route.advance_to_next_waypoint();
        assert!(route.is_completed());

        route.add_waypoint(GeoPoint::new(0.0, 2.0));
        assert_eq!(route.current_index(), 1);
        assert!(!route.is_completed());
        assert_eq!(route.next_waypoint(), GeoPoint::new(0.0, 2.0));
    }

    #[test]
    fn test_total_distance() {
        assert!((square().total_distance() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_remaining_distance() {
        let mut route = square();
        route.advance_to_next_waypoint();
        // 0.5 to (0,1), then two unit legs
        let remaining = route.remaining_distance(&GeoPoint::new(0.0, 0.5));
        assert!((remaining - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_projects_onto_segment() {
        let closest = square()
            .closest_point_on_route(&GeoPoint::new(0.5, 1.5))
            .unwrap();
        assert_eq!(closest.segment_index, 1);
        assert!((closest.point.lat - 0.5).abs() < 1e-12);
        assert!((closest.point.lon - 1.0).abs() < 1e-12);
        assert!((closest.distance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_clamps_to_endpoint() {
        let route = Route::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]);
        let closest = route.closest_point_on_route(&GeoPoint::new(0.0, 3.0)).unwrap();
        assert_eq!(closest.point, GeoPoint::new(0.0, 1.0));
        assert!((closest.distance - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_closest_point_tie_keeps_first_segment() {
        // Centre of the square is 0.5 from segments 0, 1 and 2
        let closest = square()
            .closest_point_on_route(&GeoPoint::new(0.5, 0.5))
            .unwrap();
        assert_eq!(closest.segment_index, 0);
        assert_eq!(closest.point, GeoPoint::new(0.0, 0.5));
    }

    #[test]
    fn test_haversine_metric_route_length() {
        let route = Route::new(vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0)])
            .with_metric(DistanceMetric::Haversine);
        assert_eq!(route.metric(), DistanceMetric::Haversine);
        assert!((route.total_distance() - 111_195.0).abs() < 500.0);
    }
}
