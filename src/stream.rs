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
use crate::collision::CollisionWorld;
use crate::collision_test::CollisionTester;
use crate::errors::*;
use crate::frame_cache::FrameGraspCache;
use crate::ik::ArmIkSolver;
use crate::options::SamplerOptions;
use crate::process::{ClampAction, JointId};
use crate::sampler::MotionSampler;
use crate::types::{HeldBody, Pose, Trajectory};
use log::*;
use std::fmt;
use std::str::FromStr;

/// Streams which can be evaluated by a [`StreamRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// `(beam, gripper_type) -> (trajectory)`
    PlanMotionForBeamAssembly,
    /// `(trajectory, held_beam, other_beam) -> ()`
    BeamAssemblyCollisionCheck,
    /// `(clamp, clamp_type, beam1, beam2) -> (trajectory)`
    PlanMotionForAttachClamp,
    /// `(clamp, clamp_type, beam1, beam2) -> (trajectory)`
    PlanMotionForDetachClamp,
    /// `(clamp, beam1, beam2, trajectory, other_beam) -> ()`
    AttachClampBeamCollisionCheck,
    /// `(clamp, beam1, beam2, trajectory, other_beam) -> ()`
    DetachClampBeamCollisionCheck,
}

const BEAM_STREAMS: &[StreamKind] = &[
    StreamKind::PlanMotionForBeamAssembly,
    StreamKind::BeamAssemblyCollisionCheck,
];

const ALL_STREAMS: &[StreamKind] = &[
    StreamKind::PlanMotionForBeamAssembly,
    StreamKind::BeamAssemblyCollisionCheck,
    StreamKind::PlanMotionForAttachClamp,
    StreamKind::PlanMotionForDetachClamp,
    StreamKind::AttachClampBeamCollisionCheck,
    StreamKind::DetachClampBeamCollisionCheck,
];

impl StreamKind {
    pub fn name(self) -> &'static str {
        match self {
            StreamKind::PlanMotionForBeamAssembly => "plan_motion_for_beam_assembly",
            StreamKind::BeamAssemblyCollisionCheck => "beam_assembly_collision_check",
            StreamKind::PlanMotionForAttachClamp => "plan_motion_for_attach_clamp",
            StreamKind::PlanMotionForDetachClamp => "plan_motion_for_detach_clamp",
            StreamKind::AttachClampBeamCollisionCheck => "attach_clamp_beam_collision_check",
            StreamKind::DetachClampBeamCollisionCheck => "detach_clamp_beam_collision_check",
        }
    }
    /// Streams of a planning case. Cases 1, 2, 3 and 5 are symbolic only.
    pub fn for_case(case: u32) -> &'static [StreamKind] {
        match case {
            4 => BEAM_STREAMS,
            6 | 7 => ALL_STREAMS,
            _ => &[],
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StreamKind {
    type Err = Error;
    fn from_str(name: &str) -> Result<Self> {
        ALL_STREAMS
            .iter()
            .copied()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownStream(name.to_owned()))
    }
}

/// Input or output object of a stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamValue {
    /// Identifier of a beam, a clamp or a tool type
    Object(String),
    Trajectory(Trajectory),
}

impl StreamValue {
    pub fn object(name: &str) -> Self {
        StreamValue::Object(name.to_owned())
    }
    pub fn as_object(&self) -> Option<&str> {
        match self {
            StreamValue::Object(name) => Some(name),
            StreamValue::Trajectory(_) => None,
        }
    }
    pub fn as_trajectory(&self) -> Option<&Trajectory> {
        match self {
            StreamValue::Trajectory(trajectory) => Some(trajectory),
            StreamValue::Object(_) => None,
        }
    }
}

struct Args<'a> {
    kind: StreamKind,
    values: &'a [StreamValue],
}

impl<'a> Args<'a> {
    fn new(kind: StreamKind, values: &'a [StreamValue], len: usize) -> Result<Self> {
        if values.len() != len {
            return Err(Error::InvalidStreamArguments {
                stream: kind.name().to_owned(),
                reason: format!("expected {} arguments, got {}", len, values.len()),
            });
        }
        Ok(Args { kind, values })
    }
    fn invalid(&self, index: usize, expected: &str) -> Error {
        Error::InvalidStreamArguments {
            stream: self.kind.name().to_owned(),
            reason: format!("argument {} must be {}", index, expected),
        }
    }
    fn object(&self, index: usize) -> Result<&'a str> {
        let values: &'a [StreamValue] = self.values;
        values[index]
            .as_object()
            .ok_or_else(|| self.invalid(index, "an object"))
    }
    fn trajectory(&self, index: usize) -> Result<&'a Trajectory> {
        let values: &'a [StreamValue] = self.values;
        values[index]
            .as_trajectory()
            .ok_or_else(|| self.invalid(index, "a trajectory"))
    }
}

/// Entry point of the symbolic planner
///
/// `evaluate` returns `Ok(Some(outputs))` when the stream certifies its fact
/// (outputs are empty for collision checks) and `Ok(None)` when it fails.
/// Errors are configuration errors and must not be retried.
pub struct StreamRegistry {
    cache: FrameGraspCache,
    base_sampler: Box<dyn BasePoseSampler>,
    ik_solver: Box<dyn ArmIkSolver>,
    options: SamplerOptions,
    streams: Vec<StreamKind>,
}

impl StreamRegistry {
    /// Registry with all streams enabled
    pub fn new(
        cache: FrameGraspCache,
        base_sampler: Box<dyn BasePoseSampler>,
        ik_solver: Box<dyn ArmIkSolver>,
        options: SamplerOptions,
    ) -> Self {
        StreamRegistry {
            cache,
            base_sampler,
            ik_solver,
            options,
            streams: ALL_STREAMS.to_vec(),
        }
    }
    /// Keep only the streams of the planning case
    pub fn for_case(mut self, case: u32) -> Self {
        self.streams = StreamKind::for_case(case).to_vec();
        if self.streams.is_empty() {
            info!("case {} has no geometric streams", case);
        }
        self
    }
    pub fn streams(&self) -> &[StreamKind] {
        &self.streams
    }
    pub fn options(&self) -> &SamplerOptions {
        &self.options
    }
    pub fn cache(&self) -> &FrameGraspCache {
        &self.cache
    }

    pub fn evaluate<W>(
        &self,
        world: &mut W,
        name: &str,
        args: &[StreamValue],
    ) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let kind = name.parse::<StreamKind>()?;
        if !self.streams.contains(&kind) {
            return Err(Error::UnknownStream(name.to_owned()));
        }
        debug!("evaluating {}", kind);
        match kind {
            StreamKind::PlanMotionForBeamAssembly => {
                self.plan_beam(world, Args::new(kind, args, 2)?)
            }
            StreamKind::BeamAssemblyCollisionCheck => {
                self.check_beam(world, Args::new(kind, args, 3)?)
            }
            StreamKind::PlanMotionForAttachClamp => {
                self.plan_clamp(world, ClampAction::Attach, Args::new(kind, args, 4)?)
            }
            StreamKind::PlanMotionForDetachClamp => {
                self.plan_clamp(world, ClampAction::Detach, Args::new(kind, args, 4)?)
            }
            StreamKind::AttachClampBeamCollisionCheck
            | StreamKind::DetachClampBeamCollisionCheck => {
                self.check_clamp(world, Args::new(kind, args, 5)?)
            }
        }
    }

    fn require_tool_type(&self, entity: &str, tool_type: &str) -> Result<()> {
        if self.cache.has_tool_type(tool_type) {
            Ok(())
        } else {
            Err(Error::UnknownToolType {
                entity: entity.to_owned(),
                tool_type: tool_type.to_owned(),
            })
        }
    }

    fn sample<W>(
        &self,
        world: &mut W,
        held: &HeldBody,
        frames: &[Pose],
    ) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let sampler = MotionSampler::new(&*self.base_sampler, &*self.ik_solver, &self.options);
        Ok(sampler
            .sample(world, held, frames)?
            .into_trajectory()
            .map(|trajectory| vec![StreamValue::Trajectory(trajectory)]))
    }

    fn certify(not_colliding: bool) -> Option<Vec<StreamValue>> {
        if not_colliding {
            Some(Vec::new())
        } else {
            None
        }
    }

    fn plan_beam<W>(&self, world: &mut W, args: Args<'_>) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let beam = args.object(0)?;
        self.require_tool_type(beam, args.object(1)?)?;
        let held = HeldBody::new(beam, *self.cache.beam_grasp(beam)?);
        self.sample(world, &held, self.cache.beam_target_frames(beam)?)
    }

    fn check_beam<W>(&self, world: &mut W, args: Args<'_>) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let trajectory = args.trajectory(0)?;
        let beam = args.object(1)?;
        let other = args.object(2)?;
        let held = HeldBody::new(beam, *self.cache.beam_grasp(beam)?);
        let other_pose = self.cache.beam_assembled_pose(other)?;
        let adjacent = self.cache.is_already_built_neighbor(beam, other);
        let tester = CollisionTester::new(&self.options);
        Ok(Self::certify(tester.test(
            world, trajectory, &held, other, other_pose, adjacent,
        )?))
    }

    fn plan_clamp<W>(
        &self,
        world: &mut W,
        action: ClampAction,
        args: Args<'_>,
    ) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let clamp = args.object(0)?;
        self.require_tool_type(clamp, args.object(1)?)?;
        let joint_id = JointId::new(args.object(2)?, args.object(3)?);
        let held = HeldBody::new(clamp, *self.cache.clamp_grasp()?);
        self.sample(world, &held, self.cache.clamp_target_frames(action, &joint_id)?)
    }

    fn check_clamp<W>(&self, world: &mut W, args: Args<'_>) -> Result<Option<Vec<StreamValue>>>
    where
        W: CollisionWorld + ?Sized,
    {
        let clamp = args.object(0)?;
        let beam1 = args.object(1)?;
        let beam2 = args.object(2)?;
        let trajectory = args.trajectory(3)?;
        let other = args.object(4)?;
        let held = HeldBody::new(clamp, *self.cache.clamp_grasp()?);
        let other_pose = self.cache.beam_assembled_pose(other)?;
        let adjacent = other == beam1 || other == beam2;
        let tester = CollisionTester::new(&self.options);
        Ok(Self::certify(tester.test(
            world, trajectory, &held, other, other_pose, adjacent,
        )?))
    }
}
