//! Fixed-timestep driver: ticks every vehicle and fans snapshots out to observers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};
use vehicle_domain::VehicleObserver;

use crate::vehicle::Vehicle;

/// Configuration for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Seconds of simulated time per tick
    pub time_step: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { time_step: 0.1 }
    }
}

impl SimulationConfig {
    #[must_use]
    pub const fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }
}

/// Cloneable switch that stops a simulation at its next tick boundary.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns the vehicles and observers and advances simulated time in fixed steps.
///
/// Ticks are fully synchronous: each vehicle is updated and every observer is
/// notified with its snapshot, in registration order, before the next vehicle
/// is touched.
pub struct Simulation {
    time_step: f64,
    running: Arc<AtomicBool>,
    simulation_time: f64,
    tick_count: u64,
    vehicles: Vec<Vehicle>,
    observers: Vec<Box<dyn VehicleObserver>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time_step", &self.time_step)
            .field("running", &self.is_running())
            .field("simulation_time", &self.simulation_time)
            .field("vehicles", &self.vehicles.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::with_config(SimulationConfig::default())
    }
}

impl Simulation {
    pub fn new(time_step: f64) -> Self {
        Self::with_config(SimulationConfig::default().with_time_step(time_step))
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            time_step: config.time_step,
            running: Arc::new(AtomicBool::new(false)),
            simulation_time: 0.0,
            tick_count: 0,
            vehicles: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Register a vehicle. Vehicles are updated in registration order.
    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.push(vehicle);
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn register_observer<O: VehicleObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn register_boxed_observer(&mut self, observer: Box<dyn VehicleObserver>) {
        self.observers.push(observer);
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!(
            vehicles = self.vehicles.len(),
            observers = self.observers.len(),
            time_step = self.time_step,
            "Simulation started"
        );
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Handle for stopping the simulation from an observer, signal handler or thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.running))
    }

    /// Zero the simulation clock. Vehicle positions, headings and route
    /// cursors are left as they are.
    pub fn reset(&mut self) {
        self.simulation_time = 0.0;
    }

    /// Advance every vehicle by one time step. No-op while stopped or when
    /// the time step is not positive and finite.
    pub fn update(&mut self) {
        if !self.is_running() {
            return;
        }
        if !valid_time_step(self.time_step) {
            warn!(time_step = self.time_step, "Skipping tick with a non-positive time step");
            return;
        }

        let end_time = self.simulation_time + self.time_step;
        for vehicle in &mut self.vehicles {
            vehicle.update(self.time_step);

            if self.observers.is_empty() {
                continue;
            }
            let snapshot = vehicle.snapshot(end_time);
            for observer in &mut self.observers {
                if let Err(e) = observer.notify(&snapshot) {
                    warn!(
                        observer = observer.name(),
                        vehicle = %snapshot.id,
                        error = %e,
                        "Observer failed"
                    );
                }
            }
        }

        self.simulation_time = end_time;
        self.tick_count += 1;
    }

    /// Tick until `duration` more seconds have been simulated or the
    /// simulation is stopped. Returns the number of ticks executed.
    ///
    /// Blocking and unpaced; wall-clock pacing is up to the caller.
    pub fn run_for(&mut self, duration: f64) -> u64 {
        if !valid_time_step(self.time_step) {
            warn!(time_step = self.time_step, "Refusing to run with a non-positive time step");
            return 0;
        }

        let end_time = self.simulation_time + duration;
        let mut ticks = 0;
        while self.is_running() && self.simulation_time < end_time {
            self.update();
            ticks += 1;
        }
        ticks
    }

    pub const fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
    }

    pub const fn simulation_time(&self) -> f64 {
        self.simulation_time
    }

    /// Ticks executed since construction. Not affected by `reset`.
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id() == id)
    }

    /// True when no vehicle has anything left to drive to.
    pub fn all_vehicles_idle(&self) -> bool {
        self.vehicles
            .iter()
            .all(|v| v.route().is_completed() || v.route().is_empty())
    }
}

fn valid_time_step(time_step: f64) -> bool {
    time_step.is_finite() && time_step > 0.0
}
