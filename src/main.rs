mod simulation;

use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use simulation::{
    AchievementEngine, AchievementSink, DriveSession, DriverIntent, FlatGroundRig, JsonFileStore,
    MemoryStore, ProgressStore, SessionConfig, VehicleConfig, VehicleSink,
};

#[derive(Parser)]
#[command(name = "drive_sim")]
#[command(about = "Headless driving playground simulation")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "3600")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.016")]
    delta: f32,

    /// Seed for the scripted driver's steering jitter
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Persist achievement progress to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,
}

/// Sink that reports achievement notifications on the console
struct ConsoleAchievements;

impl AchievementSink for ConsoleAchievements {
    fn on_tier_achieved(&mut self, group: &str, tier_index: usize, silent: bool) {
        if silent {
            println!("Restored achievement: {} (tier {})", group, tier_index);
        } else {
            println!("Achievement unlocked: {} (tier {})", group, tier_index);
        }
    }

    fn on_global_complete(&mut self, elapsed: f64) {
        println!("All achievements complete after {:.1}s!", elapsed);
    }
}

/// Sink that reports vehicle state changes on the console
struct ConsoleVehicle;

impl VehicleSink for ConsoleVehicle {
    fn on_flip_edge(&mut self, direction: i8) {
        println!(
            "Vehicle crossed the flip threshold (pitching {})",
            if direction > 0 { "forward" } else { "backward" }
        );
    }

    fn on_stuck_changed(&mut self, is_stuck: bool) {
        if is_stuck {
            println!("Vehicle is stuck, auto recovery engaged");
        } else {
            println!("Vehicle recovered");
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    run_headless(cli.ticks, cli.delta, cli.seed, cli.save);
    Ok(())
}

/// Run a scripted drive on the flat-ground rig (no graphics)
fn run_headless(ticks: u32, delta: f32, seed: u64, save: Option<PathBuf>) {
    println!("Running driving simulation in headless mode...");
    println!("Ticks: {}, Delta: {}s, Seed: {}", ticks, delta, seed);

    let ticks_per_second = (1.0 / delta).ceil() as u32;
    println!();

    let store: Box<dyn ProgressStore> = match save {
        Some(path) => {
            println!("Persisting achievements to {}", path.display());
            Box::new(JsonFileStore::new(path))
        }
        None => Box::new(MemoryStore::new()),
    };

    let mut rig = FlatGroundRig::spawned(10.0);
    let engine = AchievementEngine::with_default_config(store, Box::new(ConsoleAchievements));
    let mut session = DriveSession::new(
        VehicleConfig::default(),
        SessionConfig::default(),
        engine,
        Box::new(ConsoleVehicle),
        &mut rig,
    );

    let mut rng = StdRng::seed_from_u64(seed);
    let mut steering: f32 = 0.0;

    let mut tick = 0;
    while tick < ticks {
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;

            // Scripted driver: full throttle with a gentle steering wander,
            // boosting after the first stretch and hopping every ten seconds
            steering = (steering + rng.random_range(-0.02..0.02)).clamp(-0.3, 0.3);
            let intent = DriverIntent {
                forward: 1.0,
                backward: 0.0,
                left: steering.max(0.0),
                right: (-steering).max(0.0),
                boost: tick > ticks_per_second * 5,
                brake: false,
                jump_requested: tick % (ticks_per_second * 10) == ticks_per_second * 5,
            };

            session.tick(intent, &mut rig, delta);
        }

        println!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            f64::from(tick) * f64::from(delta)
        );
        println!("{}", session.summary());
        println!();
    }

    println!("=== Final state ===");
    println!("{}", session.summary());
    for group in session.achievements().iter_groups() {
        for tier in &group.tiers {
            let marker = if tier.achieved { "x" } else { " " };
            println!(
                "[{}] {} ({}/{})",
                marker,
                tier.title,
                group.progress.effective().min(tier.threshold),
                tier.threshold
            );
        }
    }
}
