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
use crate::collision::{BodyRef, CollisionWorld, SceneGuard};
use crate::errors::*;
use crate::options::SamplerOptions;
use crate::sampler::log_collision_report;
use crate::types::{HeldBody, Pose, Trajectory};
use log::*;

/// Checks a sampled trajectory against a body which was not placed while sampling
pub struct CollisionTester<'a> {
    options: &'a SamplerOptions,
}

impl<'a> CollisionTester<'a> {
    pub fn new(options: &'a SamplerOptions) -> Self {
        CollisionTester { options }
    }

    /// Returns true if no configuration of `trajectory` collides with `other`
    /// placed at `other_pose`.
    ///
    /// Both the robot and the held body are checked against `other`. If
    /// `adjacent` is true the held body is allowed to touch `other`. Stops at the
    /// first colliding configuration. The world is restored in all cases.
    pub fn test<W>(
        &self,
        world: &mut W,
        trajectory: &Trajectory,
        held: &HeldBody,
        other: &str,
        other_pose: &Pose,
        adjacent: bool,
    ) -> Result<bool>
    where
        W: CollisionWorld + ?Sized,
    {
        if held.name == other {
            return Err(format!("{} is tested against itself", other).into());
        }
        let mut guard = SceneGuard::new(world);
        guard.save_configuration();
        guard.set_pose(other, other_pose)?;
        guard.attach(&self.options.flange_link, &held.name, &held.grasp)?;
        if adjacent {
            guard.disable_collision(&held.name, other)?;
        }
        for (i, configuration) in trajectory.configurations().enumerate() {
            guard.set_configuration(configuration)?;
            let colliding = if guard.pairwise_collision(BodyRef::Robot, BodyRef::Body(other))? {
                debug!("robot collides with {} at {}", other, i);
                true
            } else if guard
                .pairwise_collision(BodyRef::Body(&held.name), BodyRef::Body(other))?
            {
                debug!("{} collides with {} at {}", held.name, other, i);
                true
            } else {
                false
            };
            if colliding {
                if self.options.diagnosis {
                    log_collision_report(&mut *guard, configuration);
                }
                return Ok(false);
            }
        }
        Ok(true)
    }
}
