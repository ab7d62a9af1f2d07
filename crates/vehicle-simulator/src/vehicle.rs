//! Per-vehicle kinematic model: heading/speed control and waypoint following.

use std::f64::consts::{PI, TAU};

use tracing::debug;
use vehicle_domain::{GeoPoint, VehicleSnapshot};

use crate::route::{Route, project_onto_segment};

/// Proportional steering gain applied to the heading error each second
pub const STEERING_GAIN: f64 = 2.0;

/// Smallest value a kinematic limit is clamped to
const MIN_LIMIT: f64 = 1e-9;

/// Kinematic limits and arrival tolerance of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleLimits {
    /// Units per second
    pub max_speed: f64,
    /// Units per second squared
    pub acceleration: f64,
    /// Units per second squared
    pub deceleration: f64,
    /// Arrival tolerance, in the route metric's units
    pub waypoint_threshold: f64,
}

impl Default for VehicleLimits {
    fn default() -> Self {
        Self {
            max_speed: 25.0,
            acceleration: 2.0,
            deceleration: 4.0,
            // Roughly 10 m expressed in degrees
            waypoint_threshold: 0.0001,
        }
    }
}

impl VehicleLimits {
    #[must_use]
    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        self.max_speed = positive(max_speed);
        self
    }

    #[must_use]
    pub fn with_acceleration(mut self, acceleration: f64) -> Self {
        self.acceleration = positive(acceleration);
        self
    }

    #[must_use]
    pub fn with_deceleration(mut self, deceleration: f64) -> Self {
        self.deceleration = positive(deceleration);
        self
    }

    #[must_use]
    pub fn with_waypoint_threshold(mut self, threshold: f64) -> Self {
        self.waypoint_threshold = positive(threshold);
        self
    }

    fn clamped(self) -> Self {
        Self {
            max_speed: positive(self.max_speed),
            acceleration: positive(self.acceleration),
            deceleration: positive(self.deceleration),
            waypoint_threshold: positive(self.waypoint_threshold),
        }
    }
}

/// How a vehicle decides it has reached its current waypoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrivalPolicy {
    /// Only the position after moving is tested against the threshold.
    /// A vehicle covering more than a segment per tick can pass a waypoint
    /// without ever registering it.
    #[default]
    Threshold,
    /// The path travelled during the tick is tested, so a waypoint passed
    /// within the threshold mid-tick still counts. Movement is not clamped.
    SweptSegment,
}

/// A simulated vehicle following its own route.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: String,
    position: GeoPoint,
    /// Radians, 0 = north, clockwise-positive, always in `[0, 2π)`
    heading: f64,
    speed: f64,
    limits: VehicleLimits,
    arrival_policy: ArrivalPolicy,
    route: Route,
}

impl Vehicle {
    /// Create a stationary vehicle facing north with default limits.
    pub fn new(id: impl Into<String>, position: GeoPoint, route: Route) -> Self {
        Self {
            id: id.into(),
            position,
            heading: 0.0,
            speed: 0.0,
            limits: VehicleLimits::default(),
            arrival_policy: ArrivalPolicy::default(),
            route,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, limits: VehicleLimits) -> Self {
        self.limits = limits.clamped();
        self.speed = self.speed.min(self.limits.max_speed);
        self
    }

    #[must_use]
    pub const fn with_arrival_policy(mut self, policy: ArrivalPolicy) -> Self {
        self.arrival_policy = policy;
        self
    }

    /// Advance the vehicle by `delta_time` seconds. Negative or non-finite
    /// steps are treated as zero.
    pub fn update(&mut self, delta_time: f64) {
        let delta_time = sanitize_delta(delta_time);

        // Nothing to follow: completed routes and routes without waypoints
        if self.route.is_completed() || self.route.is_empty() {
            self.speed = 0.0;
            return;
        }

        let target = self.route.current_waypoint();
        let target_heading = heading_between(&self.position, &target);

        self.adjust_heading(target_heading, delta_time);
        self.adjust_speed(&target, delta_time);

        let from = self.position;
        self.move_vehicle(delta_time);
        self.check_waypoint_reached(&from, &target);
    }

    fn adjust_heading(&mut self, target_heading: f64, delta_time: f64) {
        let mut diff = target_heading - self.heading;
        while diff > PI {
            diff -= TAU;
        }
        while diff < -PI {
            diff += TAU;
        }

        self.heading = wrap_heading(diff.mul_add(STEERING_GAIN * delta_time, self.heading));
    }

    fn adjust_speed(&mut self, target: &GeoPoint, delta_time: f64) {
        let VehicleLimits {
            max_speed,
            acceleration,
            deceleration,
            waypoint_threshold,
        } = self.limits;

        let distance = self.route.metric().distance(&self.position, target);
        let slowdown_radius = 3.0 * waypoint_threshold;
        let target_speed = if distance < slowdown_radius {
            max_speed * (distance / slowdown_radius)
        } else {
            max_speed
        };

        if self.speed > 0.0 {
            if self.speed < target_speed {
                self.speed = acceleration.mul_add(delta_time, self.speed).min(target_speed);
            } else if self.speed > target_speed {
                self.speed = (-deceleration).mul_add(delta_time, self.speed).max(target_speed);
            }
        } else {
            // Starting from rest always accelerates
            self.speed = (acceleration * delta_time).min(target_speed);
        }

        self.speed = self.speed.clamp(0.0, max_speed);
    }

    fn move_vehicle(&mut self, delta_time: f64) {
        let distance = self.speed * delta_time;
        self.position.lon = distance.mul_add(self.heading.sin(), self.position.lon);
        self.position.lat = distance.mul_add(self.heading.cos(), self.position.lat);
    }

    fn check_waypoint_reached(&mut self, from: &GeoPoint, waypoint: &GeoPoint) {
        let metric = self.route.metric();
        let threshold = self.limits.waypoint_threshold;

        let reached = match self.arrival_policy {
            ArrivalPolicy::Threshold => metric.distance(&self.position, waypoint) <= threshold,
            ArrivalPolicy::SweptSegment => {
                let closest = project_onto_segment(waypoint, from, &self.position);
                metric.distance(&closest, waypoint) <= threshold
            }
        };

        if reached && self.route.advance_to_next_waypoint() {
            debug!(
                vehicle = %self.id,
                waypoint = self.route.current_index(),
                completed = self.route.is_completed(),
                "Waypoint reached"
            );
        }
    }

    /// Owned copy of the current state for observers.
    pub fn snapshot(&self, simulation_time: f64) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id.clone(),
            position: self.position,
            heading: self.heading,
            speed: self.speed,
            max_speed: self.limits.max_speed,
            waypoint_index: self.route.current_index(),
            waypoint_count: self.route.len(),
            route_completed: self.route.is_completed(),
            simulation_time,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn position(&self) -> GeoPoint {
        self.position
    }

    pub const fn heading(&self) -> f64 {
        self.heading
    }

    pub const fn speed(&self) -> f64 {
        self.speed
    }

    pub const fn limits(&self) -> VehicleLimits {
        self.limits
    }

    pub const fn arrival_policy(&self) -> ArrivalPolicy {
        self.arrival_policy
    }

    pub const fn route(&self) -> &Route {
        &self.route
    }

    /// Replace the route. The new route's cursor is used as-is.
    pub fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    /// Lowering the limit below the current speed slows the vehicle immediately.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        self.limits.max_speed = positive(max_speed);
        self.speed = self.speed.min(self.limits.max_speed);
    }

    pub fn set_acceleration(&mut self, acceleration: f64) {
        self.limits.acceleration = positive(acceleration);
    }

    pub fn set_deceleration(&mut self, deceleration: f64) {
        self.limits.deceleration = positive(deceleration);
    }
}

/// Compass heading from `from` to `to`: 0 = north (+lat), clockwise towards +lon.
fn heading_between(from: &GeoPoint, to: &GeoPoint) -> f64 {
    (to.lon - from.lon).atan2(to.lat - from.lat)
}

/// Wrap an angle into `[0, 2π)`.
fn wrap_heading(heading: f64) -> f64 {
    let wrapped = heading.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if wrapped >= TAU { 0.0 } else { wrapped }
}

fn sanitize_delta(delta_time: f64) -> f64 {
    if delta_time.is_finite() { delta_time.max(0.0) } else { 0.0 }
}

fn positive(value: f64) -> f64 {
    if value.is_finite() { value.max(MIN_LIMIT) } else { MIN_LIMIT }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario_limits() -> VehicleLimits {
        VehicleLimits::default()
            .with_max_speed(1.0)
            .with_acceleration(2.0)
            .with_waypoint_threshold(0.01)
    }

    fn northbound(waypoints: &[(f64, f64)]) -> Vehicle {
        let route = Route::new(waypoints.iter().copied().map(GeoPoint::from).collect());
        Vehicle::new("test-vehicle", GeoPoint::new(0.0, 0.0), route).with_limits(scenario_limits())
    }

    #[test]
    fn test_defaults() {
        let vehicle = Vehicle::new("v", GeoPoint::new(1.0, 2.0), Route::default());
        assert_eq!(vehicle.limits(), VehicleLimits::default());
        assert!(vehicle.heading().abs() < f64::EPSILON);
        assert!(vehicle.speed().abs() < f64::EPSILON);
        assert_eq!(vehicle.arrival_policy(), ArrivalPolicy::Threshold);
    }

    #[test]
    fn test_scenario_two_waypoints_completes() {
        // Starts on the first waypoint, so the cursor moves on the first tick
        let mut vehicle = northbound(&[(0.0, 0.0), (0.0, 1.0)]);
        let mut ticks = 0;
        while !vehicle.route().is_completed() && ticks < 50 {
            vehicle.update(0.1);
            ticks += 1;
        }
        assert!(vehicle.route().is_completed());
        assert_eq!(vehicle.route().current_index(), 1);
        assert!(ticks <= 50);

        for _ in 0..5 {
            vehicle.update(0.1);
            assert!(vehicle.speed().abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_drives_to_intermediate_waypoint() {
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]);
        let mut ticks = 0;
        while !vehicle.route().is_completed() && ticks < 50 {
            vehicle.update(0.1);
            ticks += 1;
        }
        assert!(vehicle.route().is_completed(), "not completed after {ticks} ticks");
        let distance = vehicle.position().distance_to(&GeoPoint::new(1.0, 0.0));
        assert!(distance <= 0.01, "stopped {distance} away from waypoint");
    }

    #[test]
    fn test_accelerates_from_rest() {
        let mut vehicle = northbound(&[(0.0, 0.0), (5.0, 0.0), (6.0, 0.0)]);
        vehicle.update(0.1); // consumes the start waypoint
        vehicle.update(0.1);
        assert!((vehicle.speed() - 0.2).abs() < 1e-12);
        vehicle.update(0.1);
        assert!((vehicle.speed() - 0.4).abs() < 1e-12);
        // heading already north, moving along +lat only
        assert!(vehicle.position().lon.abs() < 1e-12);
        assert!((vehicle.position().lat - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_ramp_down_near_waypoint() {
        let route = Route::new(vec![GeoPoint::new(0.015, 0.0), GeoPoint::new(1.0, 0.0)]);
        let mut vehicle = Vehicle::new("v", GeoPoint::new(0.0, 0.0), route).with_limits(scenario_limits());
        vehicle.speed = 1.0;
        let target = vehicle.route().current_waypoint();

        // Halfway into the slowdown radius: target speed is 0.5, decel 4 per second
        vehicle.adjust_speed(&target, 0.1);
        assert!((vehicle.speed() - 0.6).abs() < 1e-12);
        vehicle.adjust_speed(&target, 0.1);
        assert!((vehicle.speed() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_turns_towards_waypoint() {
        // Waypoint due east: heading should move from 0 towards π/2
        let route = Route::new(vec![GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, 2.0)]);
        let mut vehicle = Vehicle::new("v", GeoPoint::new(0.0, 0.0), route);
        vehicle.update(0.1);
        let expected = std::f64::consts::FRAC_PI_2 * STEERING_GAIN * 0.1;
        assert!((vehicle.heading() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_heading_wraps_through_north() {
        // Waypoint slightly west of north: short turn is counter-clockwise
        let route = Route::new(vec![GeoPoint::new(1.0, -0.1), GeoPoint::new(2.0, -0.1)]);
        let mut vehicle = Vehicle::new("v", GeoPoint::new(0.0, 0.0), route);
        vehicle.update(0.1);
        assert!(vehicle.heading() > PI);
        assert!(vehicle.heading() < TAU);
    }

    #[test]
    fn test_terminal_state_is_idempotent() {
        let mut vehicle = northbound(&[(0.0, 0.0), (0.0, 1.0)]);
        vehicle.update(0.1);
        assert!(vehicle.route().is_completed());

        let position = vehicle.position();
        let heading = vehicle.heading();
        for dt in [0.1, 0.0, 5.0, 1000.0] {
            vehicle.update(dt);
            assert_eq!(vehicle.position(), position);
            assert!((vehicle.heading() - heading).abs() < f64::EPSILON);
            assert!(vehicle.speed().abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_empty_route_is_stationary() {
        let start = GeoPoint::new(5.0, 5.0);
        let mut vehicle = Vehicle::new("v", start, Route::default());
        assert!(!vehicle.route().is_completed());
        assert_eq!(vehicle.route().current_waypoint(), GeoPoint::new(0.0, 0.0));

        for _ in 0..10 {
            vehicle.update(0.1);
        }
        assert_eq!(vehicle.position(), start);
        assert!(vehicle.speed().abs() < f64::EPSILON);
        assert!(!vehicle.route().is_completed());
    }

    #[test]
    fn test_zero_delta_time() {
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        vehicle.update(0.1);
        vehicle.update(0.0);
        assert!(vehicle.speed().abs() < f64::EPSILON);
        assert_eq!(vehicle.position(), GeoPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_negative_and_non_finite_delta_time_do_nothing() {
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        vehicle.update(0.1);
        vehicle.update(0.1);
        let position = vehicle.position();
        let heading = vehicle.heading();
        let speed = vehicle.speed();
        assert!(speed > 0.0);

        for dt in [-0.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            vehicle.update(dt);
            assert_eq!(vehicle.position(), position, "dt = {dt}");
            assert!((vehicle.heading() - heading).abs() < f64::EPSILON);
            assert!((0.0..TAU).contains(&vehicle.heading()));
            assert!((vehicle.speed() - speed).abs() < f64::EPSILON);
        }
        assert_eq!(vehicle.route().current_index(), 1);
    }

    #[test]
    fn test_large_timestep_tunnels_past_waypoint() {
        // Distance per tick far exceeds the segment: the threshold test
        // never sees the vehicle near (1,0) and it keeps going.
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        vehicle.update(5.0);
        assert_eq!(vehicle.route().current_index(), 1);

        vehicle.update(5.0);
        assert!((vehicle.position().lat - 5.0).abs() < 1e-9);
        for _ in 0..20 {
            vehicle.update(5.0);
        }
        assert_eq!(vehicle.route().current_index(), 1);
        assert!(!vehicle.route().is_completed());
        let overshoot = vehicle.position().distance_to(&GeoPoint::new(1.0, 0.0));
        assert!(overshoot > 0.01);
    }

    #[test]
    fn test_swept_segment_catches_tunneling() {
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
            .with_arrival_policy(ArrivalPolicy::SweptSegment);
        vehicle.update(5.0);
        vehicle.update(5.0);
        assert_eq!(vehicle.route().current_index(), 2);
        assert!(vehicle.route().is_completed());
    }

    #[test]
    fn test_lowering_max_speed_clamps_speed() {
        let mut vehicle = northbound(&[(0.0, 0.0), (5.0, 0.0), (6.0, 0.0)]);
        for _ in 0..10 {
            vehicle.update(0.1);
        }
        assert!(vehicle.speed() > 0.5);
        vehicle.set_max_speed(0.25);
        assert!(vehicle.speed() <= 0.25);
    }

    #[test]
    fn test_limits_clamp_invalid_values() {
        let limits = VehicleLimits::default()
            .with_max_speed(-3.0)
            .with_acceleration(f64::NAN)
            .with_deceleration(0.0);
        assert!(limits.max_speed > 0.0);
        assert!(limits.acceleration > 0.0);
        assert!(limits.deceleration > 0.0);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut vehicle = northbound(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        vehicle.update(0.1);
        let snapshot = vehicle.snapshot(0.1);
        assert_eq!(snapshot.id, "test-vehicle");
        assert_eq!(snapshot.waypoint_index, 1);
        assert_eq!(snapshot.waypoint_count, 3);
        assert!(!snapshot.route_completed);
        assert!((snapshot.max_speed - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wrap_heading() {
        assert!(wrap_heading(TAU).abs() < f64::EPSILON);
        assert!((wrap_heading(-PI) - PI).abs() < 1e-12);
        assert!(wrap_heading(-1e-18) < TAU);
        assert!((wrap_heading(5.0 * TAU + 1.0) - 1.0).abs() < 1e-9);
    }

    fn waypoint_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-5.0..5.0f64, -5.0..5.0f64), 0..6)
    }

    proptest! {
        #[test]
        fn prop_heading_and_speed_stay_bounded(
            waypoints in waypoint_strategy(),
            start in (-5.0..5.0f64, -5.0..5.0f64),
            max_speed in 0.1..30.0f64,
            acceleration in 0.1..10.0f64,
            deceleration in 0.1..10.0f64,
            dt in 0.0..2.0f64,
            ticks in 1usize..200,
        ) {
            let route = Route::new(waypoints.into_iter().map(GeoPoint::from).collect());
            let limits = VehicleLimits::default()
                .with_max_speed(max_speed)
                .with_acceleration(acceleration)
                .with_deceleration(deceleration)
                .with_waypoint_threshold(0.05);
            let mut vehicle = Vehicle::new("p", GeoPoint::from(start), route).with_limits(limits);

            let mut last_index = vehicle.route().current_index();
            for _ in 0..ticks {
                vehicle.update(dt);
                prop_assert!(vehicle.heading() >= 0.0 && vehicle.heading() < TAU);
                prop_assert!(vehicle.speed() >= 0.0 && vehicle.speed() <= max_speed);
                prop_assert!(vehicle.route().current_index() >= last_index);
                last_index = vehicle.route().current_index();
            }
        }
    }
}
