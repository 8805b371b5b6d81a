// Demonstration: train the dispatcher over several episodes of a toy
// single-car building and report mean rider journey time per episode.
//
// Run from the repo root:
//   RUST_LOG=liftq=info cargo run --example dispatch_demo -- --episodes 20 --floors 4

use std::collections::HashMap;
use std::env;
use std::error::Error;

use liftq::{
    DispatchConfig, Dispatcher, ElevatorAlgorithm, ElevatorSnapshot, Floor, JsonFileStore,
    RiderId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

#[derive(Debug, Clone, Copy)]
struct Rider {
    source: Floor,
    destination: Floor,
    spawned_at: f64,
    on_board: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let floors: u32 = arg_value(&args, "--floors")
        .and_then(|s| s.parse().ok())
        .unwrap_or(4);
    let steps: u32 = arg_value(&args, "--steps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(500);
    let model_path = arg_value(&args, "--model")
        .map(Into::into)
        .unwrap_or_else(|| env::temp_dir().join("liftq_demo_model.json"));

    let config = DispatchConfig {
        max_floor_tasks_to_count: 2,
        ..DispatchConfig::new(floors)
    };
    let mut traffic = StdRng::seed_from_u64(7);

    for episode in 0..episodes {
        let store = JsonFileStore::new(&model_path);
        let mut dispatcher = Dispatcher::new(config.clone(), store)?;
        let (served, mean_journey) = run_episode(&mut dispatcher, &mut traffic, floors, steps)?;
        dispatcher.save()?;

        info!(episode, served, mean_journey, "Episode finished");
        println!(
            "episode {:3}  epsilon {:.3}  served {:4}  mean journey {:6.2}",
            episode,
            dispatcher.q_table().epsilon(),
            served,
            mean_journey
        );
    }

    Ok(())
}

/// Moves the car one floor per tick toward the head of the queue.
fn run_episode<D>(
    dispatcher: &mut D,
    rng: &mut StdRng,
    floors: u32,
    steps: u32,
) -> Result<(usize, f64), D::Error>
where
    D: ElevatorAlgorithm,
{
    let mut riders: HashMap<RiderId, Rider> = HashMap::new();
    let mut queue: Vec<Floor> = Vec::new();
    let mut location: f64 = 1.0;
    let mut next_id: RiderId = 0;
    let mut journeys: Vec<f64> = Vec::new();

    for step in 0..steps {
        let now = f64::from(step);

        if rng.gen_bool(0.15) {
            let source = rng.gen_range(1..=floors);
            let mut destination = rng.gen_range(1..=floors);
            while destination == source && floors > 1 {
                destination = rng.gen_range(1..=floors);
            }
            riders.insert(
                next_id,
                Rider {
                    source,
                    destination,
                    spawned_at: now,
                    on_board: false,
                },
            );
            queue = dispatcher.register_rider_source(
                &ElevatorSnapshot::new(now, location),
                next_id,
                source,
            )?;
            next_id += 1;
        }

        if let Some(&target) = queue.first() {
            let target = f64::from(target);
            if location < target {
                location += 1.0;
            } else if location > target {
                location -= 1.0;
            }
        }

        let ctx = ElevatorSnapshot::new(now, location);
        let here = location as Floor;

        let arriving: Vec<RiderId> = riders
            .iter()
            .filter(|(_, r)| r.on_board && r.destination == here)
            .map(|(id, _)| *id)
            .collect();
        for id in arriving {
            if let Some(rider) = riders.remove(&id) {
                journeys.push(now - rider.spawned_at);
            }
            queue = dispatcher.report_rider_dropoff(&ctx, id)?;
        }

        let boarding: Vec<RiderId> = riders
            .iter()
            .filter(|(_, r)| !r.on_board && r.source == here)
            .map(|(id, _)| *id)
            .collect();
        for id in boarding {
            queue = dispatcher.report_rider_pickup(&ctx, id)?;
            if let Some(rider) = riders.get_mut(&id) {
                rider.on_board = true;
                queue = dispatcher.register_rider_destination(&ctx, id, rider.destination)?;
            }
        }
    }

    let mean = if journeys.is_empty() {
        0.0
    } else {
        journeys.iter().sum::<f64>() / journeys.len() as f64
    };
    Ok((journeys.len(), mean))
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
