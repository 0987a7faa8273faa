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
use crate::base_sampler::BasePoseSampler;
use crate::collision::{BodyRef, CollisionWorld, SceneGuard};
use crate::errors::*;
use crate::ik::ArmIkSolver;
use crate::options::SamplerOptions;
use crate::types::{HeldBody, Pose, RobotConfiguration, Trajectory};
use log::*;

/// Why a motion stream gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// `gantry_attempts` candidates were tried
    BudgetConsumed,
    /// The base sampler ran out of candidates before the budget
    CandidatesDepleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Found {
        trajectory: Trajectory,
        gantry_iterations: usize,
    },
    Exhausted {
        gantry_iterations: usize,
        reason: ExhaustionReason,
    },
}

impl SampleOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SampleOutcome::Found { .. })
    }
    pub fn gantry_iterations(&self) -> usize {
        match self {
            SampleOutcome::Found {
                gantry_iterations, ..
            }
            | SampleOutcome::Exhausted {
                gantry_iterations, ..
            } => *gantry_iterations,
        }
    }
    pub fn trajectory(&self) -> Option<&Trajectory> {
        match self {
            SampleOutcome::Found { trajectory, .. } => Some(trajectory),
            SampleOutcome::Exhausted { .. } => None,
        }
    }
    pub fn into_trajectory(self) -> Option<Trajectory> {
        match self {
            SampleOutcome::Found { trajectory, .. } => Some(trajectory),
            SampleOutcome::Exhausted { .. } => None,
        }
    }
}

/// Rejection sampler of trajectories visiting a list of flange frames in order
///
/// For each base candidate the arm IK of the first frame is solved, and each
/// collision free solution is extended frame by frame with
/// [`CollisionWorld::plan_segment`]. The first complete trajectory wins.
pub struct MotionSampler<'a> {
    base_sampler: &'a dyn BasePoseSampler,
    ik_solver: &'a dyn ArmIkSolver,
    options: &'a SamplerOptions,
}

impl<'a> MotionSampler<'a> {
    pub fn new(
        base_sampler: &'a dyn BasePoseSampler,
        ik_solver: &'a dyn ArmIkSolver,
        options: &'a SamplerOptions,
    ) -> Self {
        MotionSampler {
            base_sampler,
            ik_solver,
            options,
        }
    }

    /// Sample a trajectory for `held` through `frames`.
    ///
    /// Errors are only returned for bad inputs or world failures. Running out of
    /// candidates is [`SampleOutcome::Exhausted`]. The world is restored in all cases.
    pub fn sample<W>(
        &self,
        world: &mut W,
        held: &HeldBody,
        frames: &[Pose],
    ) -> Result<SampleOutcome>
    where
        W: CollisionWorld + ?Sized,
    {
        let first_frame = frames.first().ok_or_else(|| Error::MissingTargetFrame {
            entity: held.name.clone(),
            movement: "first".to_owned(),
        })?;
        let mut guard = SceneGuard::new(world);
        guard.save_configuration();
        guard.attach(&self.options.flange_link, &held.name, &held.grasp)?;
        let joint_names = guard.joint_names();

        let mut gantry_iterations = 0;
        for base in self
            .base_sampler
            .candidates(first_frame)
            .take(self.options.gantry_attempts)
        {
            gantry_iterations += 1;
            let arm_solutions = self.ik_solver.solve(&base, first_frame);
            if arm_solutions.is_empty() {
                debug!("no ik solution from base {:?}", base.joint_values);
                continue;
            }
            for arm in arm_solutions {
                let start = RobotConfiguration::from_base_and_arm(&base, &arm);
                if guard.check_collision(&start)? {
                    debug!("start configuration is colliding");
                    self.diagnose(&mut *guard, &start);
                    continue;
                }
                if guard.pairwise_collision(BodyRef::Robot, BodyRef::Body(&held.name))? {
                    debug!("{} collides with the robot", held.name);
                    self.diagnose(&mut *guard, &start);
                    continue;
                }
                if let Some(configurations) = extend(&mut *guard, start, &frames[1..])? {
                    info!(
                        "found trajectory for {} after {} gantry iterations",
                        held.name, gantry_iterations
                    );
                    return Ok(SampleOutcome::Found {
                        trajectory: Trajectory::from_configurations(joint_names, configurations),
                        gantry_iterations,
                    });
                }
            }
        }
        let reason = if gantry_iterations < self.options.gantry_attempts {
            ExhaustionReason::CandidatesDepleted
        } else {
            ExhaustionReason::BudgetConsumed
        };
        info!(
            "no trajectory for {} after {} gantry iterations ({:?})",
            held.name, gantry_iterations, reason
        );
        Ok(SampleOutcome::Exhausted {
            gantry_iterations,
            reason,
        })
    }

    fn diagnose<W>(&self, world: &mut W, configuration: &RobotConfiguration)
    where
        W: CollisionWorld + ?Sized,
    {
        if self.options.diagnosis {
            log_collision_report(world, configuration);
        }
    }
}

/// Plan the segments through `frames` from `start`. `None` if any segment fails.
fn extend<W>(
    world: &mut W,
    start: RobotConfiguration,
    frames: &[Pose],
) -> Result<Option<Vec<RobotConfiguration>>>
where
    W: CollisionWorld + ?Sized,
{
    let mut configurations = Vec::with_capacity(frames.len() + 1);
    let mut current = start;
    for (i, frame) in frames.iter().enumerate() {
        match world.plan_segment(&current, frame)? {
            Some(next) => configurations.push(std::mem::replace(&mut current, next)),
            None => {
                debug!("segment to frame {} is infeasible", i + 1);
                return Ok(None);
            }
        }
    }
    configurations.push(current);
    Ok(Some(configurations))
}

/// Log every pair of the collision report. Failing to get a report is only logged.
pub(crate) fn log_collision_report<W>(world: &mut W, configuration: &RobotConfiguration)
where
    W: CollisionWorld + ?Sized,
{
    match world.collision_report(configuration) {
        Ok(pairs) => {
            for pair in pairs {
                info!(
                    "colliding: {} - {} (distance = {})",
                    pair.first, pair.second, pair.distance
                );
            }
        }
        Err(err) => warn!("no collision report for {:?}: {}", configuration.joint_values, err),
    }
}
