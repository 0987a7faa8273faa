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
use crate::types::Pose;
use rand::Rng;
use std::f64::consts::PI;

/// Optional (min, max) limit of one joint
pub type JointLimit = Option<(f64, f64)>;

/// Generate random joint positions from the optional limits
///
/// If the limit is None, -PI <-> PI is used.
pub fn generate_random_joint_positions_from_limits<R>(
    limits: &[JointLimit],
    rng: &mut R,
) -> Vec<f64>
where
    R: Rng,
{
    limits
        .iter()
        .map(|range| match *range {
            Some((min, max)) => (max - min) * rng.gen::<f64>() + min,
            None => (rng.gen::<f64>() - 0.5) * 2.0 * PI,
        })
        .collect()
}

/// True if all positions are inside their limits
pub fn is_within_limits(positions: &[f64], limits: &[JointLimit]) -> bool {
    positions.len() == limits.len()
        && positions
            .iter()
            .zip(limits.iter())
            .all(|(p, range)| match *range {
                Some((min, max)) => *p >= min && *p <= max,
                None => true,
            })
}

pub(crate) fn distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert!(a.len() == b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Interpolate two poses so that neighbors are closer than the given steps
///
/// The returned poses start after `start` and end exactly at `end`.
/// Both steps must be positive.
pub fn interpolate_poses(
    start: &Pose,
    end: &Pose,
    max_step_m: f64,
    max_step_rad: f64,
) -> Vec<Pose> {
    let translation_diff = end.translation.vector - start.translation.vector;
    let rotation_angle = start.rotation.angle_to(&end.rotation);
    let translation_steps = (translation_diff.norm() / max_step_m).ceil() as usize;
    let rotation_steps = (rotation_angle / max_step_rad).ceil() as usize;
    let steps = translation_steps.max(rotation_steps).max(1);
    (1..=steps)
        .map(|i| {
            let fraction = i as f64 / steps as f64;
            let translation = start.translation.vector + translation_diff * fraction;
            let rotation = start
                .rotation
                .try_slerp(&end.rotation, fraction, 1.0e-9)
                .unwrap_or(end.rotation);
            Pose::from_parts(translation.into(), rotation)
        })
        .collect()
}
