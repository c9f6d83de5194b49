//! Deterministic random traffic.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use riskfield_core::{RoadGeometry, VehicleClass, VehicleObservation};

/// Simulated vehicle moving along a lane at constant speed.
#[derive(Clone, Debug)]
struct Track {
    id: u64,
    x: f64,
    y: f64,
    speed: f64,
    class: VehicleClass,
}

/// Seeded traffic generator producing per-tick observations.
///
/// Vehicles enter at `x_start`, travel along a randomly chosen lane and
/// leave past `x_end`. Identical seeds produce identical streams.
pub struct FleetGenerator {
    rng: ChaCha8Rng,
    lanes: Vec<f64>,
    x_start: f64,
    x_end: f64,
    spawn_rate: f64,
    next_id: u64,
    tracks: Vec<Track>,
}

impl FleetGenerator {
    /// Generator over the lanes of `geometry`, spawning on average
    /// `spawn_rate` vehicles per second.
    pub fn new(seed: u64, geometry: &RoadGeometry, x_start: f64, x_end: f64, spawn_rate: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            lanes: geometry.lane_centers.clone(),
            x_start,
            x_end,
            spawn_rate,
            next_id: 1,
            tracks: Vec::new(),
        }
    }

    /// Fill the road with `count` vehicles at random positions.
    pub fn populate(&mut self, count: usize) {
        for _ in 0..count {
            let x = self.rng.random_range(self.x_start..self.x_end);
            self.spawn(x);
        }
    }

    /// Advance every vehicle by `dt` and return the resulting observations.
    pub fn tick(&mut self, dt: f64) -> Vec<VehicleObservation> {
        for t in &mut self.tracks {
            t.x += t.speed * dt;
        }
        let x_end = self.x_end;
        self.tracks.retain(|t| t.x <= x_end);
        if self.rng.random_bool((self.spawn_rate * dt).clamp(0.0, 1.0)) {
            self.spawn(self.x_start);
        }
        self.observations()
    }

    /// Observations for the current positions.
    pub fn observations(&self) -> Vec<VehicleObservation> {
        self.tracks
            .iter()
            .map(|t| VehicleObservation::new(t.id, t.x, t.y, t.class))
            .collect()
    }

    /// Number of vehicles on the road.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the road is empty.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn spawn(&mut self, x: f64) {
        let lane = self.lanes[self.rng.random_range(0..self.lanes.len())];
        let class = if self.rng.random_bool(0.2) {
            VehicleClass::Truck
        } else {
            VehicleClass::Car
        };
        let speed = self.rng.random_range(18.0..32.0);
        self.tracks.push(Track {
            id: self.next_id,
            x,
            y: lane,
            speed,
            class,
        });
        self.next_id += 1;
    }
}
