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

/// Radial envelope (metres) around a target frame in which base candidates are drawn
///
/// Only built through [`ReachableRange::new`] or `Default`, so `0 <= min <= max < inf` holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachableRange {
    min: f64,
    max: f64,
}

impl ReachableRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min >= 0.0 && min <= max && max.is_finite()) {
            return Err(Error::InvalidReachableRange { min, max });
        }
        Ok(Self { min, max })
    }
    pub fn min(&self) -> f64 {
        self.min
    }
    pub fn max(&self) -> f64 {
        self.max
    }
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && distance <= self.max
    }
}

impl Default for ReachableRange {
    fn default() -> Self {
        Self { min: 0.2, max: 2.4 }
    }
}

/// Options for the stream samplers
///
/// ```
/// let options = assembly_streams::SamplerOptions::default()
///     .gantry_attempts(500)
///     .diagnosis(true);
/// assert_eq!(options.gantry_attempts, 500);
/// ```
#[derive(Debug, Clone)]
pub struct SamplerOptions {
    /// Number of base candidates tried before a motion stream gives up
    pub gantry_attempts: usize,
    pub reachable_range: ReachableRange,
    /// Distance below which two shapes count as colliding
    pub collision_distance_threshold: f64,
    /// Extra distance used only when reporting near collisions in diagnosis
    pub collision_buffer_distance_threshold: f64,
    /// Log every colliding pair at each rejection. The result is not affected.
    pub diagnosis: bool,
    /// Robot link the held entities are attached to
    pub flange_link: String,
    pub seed: Option<u64>,
}

impl Default for SamplerOptions {
    fn default() -> Self {
        Self {
            gantry_attempts: 100,
            reachable_range: ReachableRange::default(),
            collision_distance_threshold: 0.0,
            collision_buffer_distance_threshold: 0.0,
            diagnosis: false,
            flange_link: "tool0".to_owned(),
            seed: None,
        }
    }
}

impl SamplerOptions {
    pub fn gantry_attempts(mut self, gantry_attempts: usize) -> Self {
        self.gantry_attempts = gantry_attempts;
        self
    }
    pub fn reachable_range(mut self, reachable_range: ReachableRange) -> Self {
        self.reachable_range = reachable_range;
        self
    }
    pub fn collision_distance_threshold(mut self, threshold: f64) -> Self {
        self.collision_distance_threshold = threshold;
        self
    }
    pub fn collision_buffer_distance_threshold(mut self, threshold: f64) -> Self {
        self.collision_buffer_distance_threshold = threshold;
        self
    }
    pub fn diagnosis(mut self, diagnosis: bool) -> Self {
        self.diagnosis = diagnosis;
        self
    }
    pub fn flange_link(mut self, flange_link: &str) -> Self {
        self.flange_link = flange_link.to_owned();
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
