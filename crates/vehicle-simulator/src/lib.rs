//! # Vehicle Simulator
//!
//! Fixed-timestep kinematic simulation of vehicles following 2D waypoint routes.
//!
//! ## Features
//!
//! - Proportional heading control and accelerate/decelerate speed control
//! - Waypoint following with arrival detection and approach slowdown
//! - Synchronous, ordered fan-out of post-tick snapshots to observers
//! - Seeded random fleets for load scenarios

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod route;
pub mod scenario;
pub mod simulation;
pub mod vehicle;

pub use route::{ClosestPoint, Route};
pub use scenario::{RouteGenerator, Scenario};
pub use simulation::{Simulation, SimulationConfig, StopHandle};
pub use vehicle::{ArrivalPolicy, Vehicle, VehicleLimits};
