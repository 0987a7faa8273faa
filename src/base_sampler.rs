/*
Copyright 2017 Takashi Ogura

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/
use crate::errors::*;
use crate::options::{ReachableRange, SamplerOptions};
use crate::types::{BaseConfiguration, Pose};
use log::*;
use nalgebra as na;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::cell::Cell;
use std::f64::consts::PI;

/// Source of candidate base (gantry) configurations for one target frame
pub trait BasePoseSampler {
    /// A fresh sequence of candidates. The caller bounds it with `take(n)`,
    /// the sequence only ends by itself when no more candidates can be found.
    fn candidates(&self, target: &Pose) -> Box<dyn Iterator<Item = BaseConfiguration> + '_>;
}

/// Gantry with three world aligned prismatic joints (x, y, z)
///
/// The arm base is at `joint values + offset`. Candidates are drawn around the
/// target on the upper half of a shell bounded by the reachable range.
#[derive(Debug)]
pub struct GantryBaseSampler {
    limits: [(f64, f64); 3],
    offset: na::Vector3<f64>,
    reachable_range: ReachableRange,
    seed: u64,
    num_calls: Cell<u64>,
    max_rejections: usize,
}

impl GantryBaseSampler {
    pub fn new(limits: [(f64, f64); 3], reachable_range: ReachableRange) -> Self {
        GantryBaseSampler {
            limits,
            offset: na::Vector3::zeros(),
            reachable_range,
            seed: rand::thread_rng().gen(),
            num_calls: Cell::new(0),
            max_rejections: 1000,
        }
    }
    /// Use the range and the seed of the options
    pub fn with_options(limits: [(f64, f64); 3], options: &SamplerOptions) -> Self {
        let sampler = Self::new(limits, options.reachable_range);
        match options.seed {
            Some(seed) => sampler.seed(seed),
            None => sampler,
        }
    }
    pub fn offset(mut self, offset: na::Vector3<f64>) -> Self {
        self.offset = offset;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.num_calls.set(0);
        self
    }
    /// Consecutive out-of-limit draws after which the sequence ends
    pub fn max_rejections(mut self, max_rejections: usize) -> Result<Self> {
        if max_rejections == 0 {
            return Err("max_rejections must be positive".into());
        }
        self.max_rejections = max_rejections;
        Ok(self)
    }
}

impl BasePoseSampler for GantryBaseSampler {
    fn candidates(&self, target: &Pose) -> Box<dyn Iterator<Item = BaseConfiguration> + '_> {
        let call = self.num_calls.get();
        self.num_calls.set(call + 1);
        Box::new(GantryCandidates {
            sampler: self,
            rng: StdRng::seed_from_u64(self.seed.wrapping_add(call)),
            target: target.translation.vector,
            num_rejections: 0,
        })
    }
}

struct GantryCandidates<'a> {
    sampler: &'a GantryBaseSampler,
    rng: StdRng,
    target: na::Vector3<f64>,
    num_rejections: usize,
}

impl<'a> GantryCandidates<'a> {
    fn draw(&mut self) -> na::Vector3<f64> {
        let range = &self.sampler.reachable_range;
        let z: f64 = self.rng.gen_range(0.0..=1.0);
        let phi = self.rng.gen_range(0.0..2.0 * PI);
        let r_xy = (1.0 - z * z).sqrt();
        let direction = na::Vector3::new(r_xy * phi.cos(), r_xy * phi.sin(), z);
        let radius = self.rng.gen_range(range.min()..=range.max());
        self.target + direction * radius - self.sampler.offset
    }
}

impl<'a> Iterator for GantryCandidates<'a> {
    type Item = BaseConfiguration;

    fn next(&mut self) -> Option<BaseConfiguration> {
        while self.num_rejections < self.sampler.max_rejections {
            let values = self.draw();
            let within = values
                .iter()
                .zip(self.sampler.limits.iter())
                .all(|(v, (min, max))| v >= min && v <= max);
            if within {
                self.num_rejections = 0;
                return Some(BaseConfiguration::new(values.iter().copied().collect()));
            }
            self.num_rejections += 1;
        }
        info!(
            "no base candidate within the gantry limits after {} draws",
            self.num_rejections
        );
        None
    }
}
