//! Vehicle Route Simulator CLI
//!
//! Drives vehicles along waypoint routes and publishes every update to the
//! console, a JSON file and optionally a Redis stream.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vehicle_publisher::{
    BrokerSink, ConsoleSink, DeliveryTask, FileSink, PublisherConfig, RedisStreamProducer,
};
use vehicle_simulator::{Scenario, SimulationConfig};

#[derive(Parser, Debug)]
#[command(name = "vehicle-simulator")]
#[command(about = "Simulate vehicles following waypoint routes")]
struct Args {
    /// JSON array output file
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Disable the file sink
    #[arg(long)]
    no_file: bool,

    /// Redis broker URL (enables the broker sink)
    #[arg(long)]
    broker: Option<String>,

    /// Stream / topic name
    #[arg(long)]
    topic: Option<String>,

    /// Disable the broker sink
    #[arg(long)]
    no_broker: bool,

    /// Simulated seconds per tick
    #[arg(long, default_value = "0.1")]
    time_step: f64,

    /// Simulated seconds to run
    #[arg(long, default_value = "20.0")]
    duration: f64,

    /// Wall-clock pause between ticks in milliseconds
    #[arg(long, default_value = "10")]
    tick_ms: u64,

    /// Random fleet size (0 runs the downtown demo route)
    #[arg(short, long, default_value = "0")]
    vehicles: usize,

    /// Seed for random routes
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Override every vehicle's speed limit
    #[arg(long)]
    max_speed: Option<f64>,

    /// Don't print updates to stdout
    #[arg(short, long)]
    quiet: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::from_default_env().add_directive("vehicle_simulator=info".parse()?);
    if args.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    validate(&args)?;

    let config = merge_config(PublisherConfig::from_env(), &args);
    let run_id = Uuid::new_v4();

    let mut scenario = if args.vehicles == 0 {
        Scenario::downtown()
    } else {
        Scenario::random_fleet(args.vehicles, 5, args.seed)
    };
    if let Some(max_speed) = args.max_speed {
        scenario = scenario.with_max_speed(max_speed);
    }

    info!(
        run_id = %run_id,
        scenario = %scenario.name,
        vehicles = scenario.vehicles.len(),
        "Starting vehicle simulation"
    );
    info!("Time step: {}s, Duration: {}s, Tick: {}ms", args.time_step, args.duration, args.tick_ms);

    let mut simulation =
        scenario.into_simulation(SimulationConfig::default().with_time_step(args.time_step));

    if !args.quiet {
        simulation.register_observer(ConsoleSink::stdout());
    }

    if config.file.enabled {
        info!(path = %config.file.path.display(), "Initializing file sink");
        match FileSink::create(&config.file.path) {
            Ok(sink) => simulation.register_observer(sink),
            Err(e) => warn!("Failed to initialize file sink: {}", e),
        }
    }

    let mut delivery: Option<DeliveryTask> = None;
    if config.broker.enabled {
        info!(url = %config.broker.url, topic = %config.broker.topic, "Initializing broker sink");
        match RedisStreamProducer::connect(&config.broker.url).await {
            Ok(producer) => {
                let producer = producer.with_max_len(config.broker.max_len);
                let (sink, task) = BrokerSink::spawn(producer, config.broker.topic.clone());
                simulation.register_observer(sink);
                delivery = Some(task);
            }
            Err(e) => warn!("Failed to initialize broker: {}", e),
        }
    }

    // Ctrl-C stops the loop at the next tick boundary
    let stop = simulation.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping simulation");
            stop.stop();
        }
    });

    simulation.start();
    while simulation.is_running() && simulation.simulation_time() < args.duration {
        simulation.update();

        if simulation.all_vehicles_idle() {
            info!(simulation_time = simulation.simulation_time(), "All routes completed");
            break;
        }

        if args.tick_ms > 0 {
            sleep(Duration::from_millis(args.tick_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
    simulation.stop();

    info!(
        ticks = simulation.tick_count(),
        simulation_time = simulation.simulation_time(),
        "Simulation completed"
    );
    for vehicle in simulation.vehicles() {
        let position = vehicle.position();
        info!(
            "{} at ({:.6}, {:.6}) | waypoint {}/{} | completed: {}",
            vehicle.id(),
            position.lat,
            position.lon,
            vehicle.route().current_index(),
            vehicle.route().len(),
            vehicle.route().is_completed()
        );
    }

    // Dropping the simulation closes the file array and ends the broker queue
    drop(simulation);

    if let Some(task) = delivery {
        let stats = task.join().await?;
        info!("Broker delivered {} messages ({} failed)", stats.delivered, stats.failed);
    }

    Ok(())
}

/// Reject run parameters that would keep the clock from advancing.
fn validate(args: &Args) -> Result<()> {
    if !(args.time_step.is_finite() && args.time_step > 0.0) {
        bail!("--time-step must be a positive number of seconds, got {}", args.time_step);
    }
    Ok(())
}

/// Apply command-line overrides on top of the environment configuration.
fn merge_config(mut config: PublisherConfig, args: &Args) -> PublisherConfig {
    if let Some(path) = &args.output_file {
        config.file.path.clone_from(path);
    }
    if args.no_file {
        config.file.enabled = false;
    }

    if let Some(url) = &args.broker {
        config.broker.url.clone_from(url);
        config.broker.enabled = true;
    }
    if let Some(topic) = &args.topic {
        config.broker.topic.clone_from(topic);
    }
    if args.no_broker {
        config.broker.enabled = false;
    }

    config
}
