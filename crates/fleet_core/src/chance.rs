//! Random source behind every probabilistic decision of the tick engine
//! (status escalation, speed jitter, seeding of speed and ETA).
//!
//! The engine only ever asks for uniform samples in `[0, 1)`, so tests can
//! swap in a [`ScriptedChance`] to force escalation paths deterministically.

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait ChanceSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;
}

#[derive(Debug, Clone)]
pub struct SeededChance {
    rng: StdRng,
}

impl SeededChance {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ChanceSource for SeededChance {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed sequence of samples, then repeats `fallback` forever.
#[derive(Debug, Clone)]
pub struct ScriptedChance {
    samples: Vec<f64>,
    cursor: usize,
    fallback: f64,
}

impl ScriptedChance {
    pub fn constant(value: f64) -> Self {
        Self::sequence(Vec::new(), value)
    }

    pub fn sequence(samples: Vec<f64>, fallback: f64) -> Self {
        Self {
            samples,
            cursor: 0,
            fallback,
        }
    }

    /// Samples handed out so far.
    pub fn drawn(&self) -> usize {
        self.cursor
    }
}

impl ChanceSource for ScriptedChance {
    fn next_unit(&mut self) -> f64 {
        let value = self.samples.get(self.cursor).copied().unwrap_or(self.fallback);
        self.cursor += 1;
        value
    }
}

#[derive(Resource)]
pub struct ChanceResource(Box<dyn ChanceSource>);

impl ChanceResource {
    pub fn new(source: impl ChanceSource + 'static) -> Self {
        Self(Box::new(source))
    }

    pub fn next_unit(&mut self) -> f64 {
        self.0.next_unit()
    }

    /// True with probability `1 - threshold`.
    pub fn exceeds(&mut self, threshold: f64) -> bool {
        self.next_unit() > threshold
    }
}
