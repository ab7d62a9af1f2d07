//! Ready-made vehicle fleets: the downtown demo route and seeded random routes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use vehicle_domain::GeoPoint;

use crate::route::Route;
use crate::simulation::{Simulation, SimulationConfig};
use crate::vehicle::{Vehicle, VehicleLimits};

/// Downtown San Francisco, start of the demo route
pub const DOWNTOWN: GeoPoint = GeoPoint::new(37.7749, -122.4194);

/// A named set of vehicles ready to be loaded into a simulation.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub vehicles: Vec<Vehicle>,
}

impl Scenario {
    /// One vehicle driving an east-north-east staircase through downtown.
    pub fn downtown() -> Self {
        let route = Route::new(vec![
            DOWNTOWN,
            GeoPoint::new(37.7749, -122.4104),
            GeoPoint::new(37.7839, -122.4104),
            GeoPoint::new(37.7839, -122.4014),
        ]);
        let vehicle = Vehicle::new("vehicle1", DOWNTOWN, route)
            .with_limits(VehicleLimits::default().with_max_speed(15.0));

        Self {
            name: "downtown".to_string(),
            vehicles: vec![vehicle],
        }
    }

    /// `count` vehicles on seeded random routes around downtown.
    pub fn random_fleet(count: usize, waypoints: usize, seed: u64) -> Self {
        let mut generator = RouteGenerator::downtown(seed);
        let vehicles = (0..count)
            .map(|i| {
                let route = generator.generate_route(waypoints);
                let start = route.current_waypoint();
                Vehicle::new(format!("vehicle{}", i + 1), start, route)
                    .with_limits(generator.random_limits())
            })
            .collect();

        Self {
            name: format!("fleet-{count}"),
            vehicles,
        }
    }

    /// Override the speed limit of every vehicle.
    #[must_use]
    pub fn with_max_speed(mut self, max_speed: f64) -> Self {
        for vehicle in &mut self.vehicles {
            vehicle.set_max_speed(max_speed);
        }
        self
    }

    pub fn into_simulation(self, config: SimulationConfig) -> Simulation {
        let mut sim = Simulation::with_config(config);
        for vehicle in self.vehicles {
            sim.add_vehicle(vehicle);
        }
        sim
    }
}

/// Seeded generator of random waypoint routes within a radius of a centre.
pub struct RouteGenerator {
    center: GeoPoint,
    /// Radius in coordinate degrees
    radius: f64,
    rng: StdRng,
}

impl RouteGenerator {
    pub fn new(center: GeoPoint, radius: f64, seed: u64) -> Self {
        Self {
            center,
            radius,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Roughly 1 km around downtown.
    pub fn downtown(seed: u64) -> Self {
        Self::new(DOWNTOWN, 0.01, seed)
    }

    /// A route of `waypoints` points, each leg a random hop inside the area.
    pub fn generate_route(&mut self, waypoints: usize) -> Route {
        let mut points = Vec::with_capacity(waypoints);
        let mut previous = self.random_point(0.1);
        for _ in 0..waypoints {
            points.push(previous);
            let hop = self.random_point(0.9);
            // Keep successive waypoints apart so every leg is actually driven
            previous = if hop.distance_to(&previous) < self.radius * 0.05 {
                GeoPoint::new(hop.lat + self.radius * 0.1, hop.lon)
            } else {
                hop
            };
        }
        Route::new(points)
    }

    /// Limits in degrees: 10-30 m/s cruise, gentle acceleration.
    pub fn random_limits(&mut self) -> VehicleLimits {
        VehicleLimits::default()
            .with_max_speed(self.rng.gen_range(0.0001..0.0003))
            .with_acceleration(0.000_05)
            .with_deceleration(0.0001)
    }

    fn random_point(&mut self, max_factor: f64) -> GeoPoint {
        let bearing: f64 = self.rng.gen_range(0.0..360.0);
        let distance = self.radius * self.rng.gen_range(0.0..=max_factor);

        GeoPoint::new(
            distance.mul_add(bearing.to_radians().cos(), self.center.lat),
            distance.mul_add(bearing.to_radians().sin(), self.center.lon),
        )
    }
}
