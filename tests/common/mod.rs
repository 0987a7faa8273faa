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
#![allow(dead_code)]

use assembly_streams::*;
use nalgebra as na;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(x: f64, y: f64, z: f64) -> Pose {
    na::Isometry3::translation(x, y, z)
}

pub fn conf(values: &[f64]) -> RobotConfiguration {
    RobotConfiguration::new(values.to_vec())
}

fn name_of(body: BodyRef<'_>) -> String {
    match body {
        BodyRef::Robot => "robot".to_owned(),
        BodyRef::Body(name) => name.to_owned(),
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

/// Contact between two bodies ("robot" for the robot) at one configuration
#[derive(Debug, Clone)]
pub struct Contact {
    pub a: String,
    pub b: String,
    pub at: RobotConfiguration,
}

/// Collision world driven by tables, counting the queries
#[derive(Debug, Default)]
pub struct StubWorld {
    pub joint_names: Vec<String>,
    pub poses: HashMap<String, Pose>,
    pub attached: BTreeMap<String, (String, GraspTransform)>,
    pub disabled: BTreeSet<(String, String)>,
    pub configuration: RobotConfiguration,
    /// `check_collision` is true for these
    pub colliding_configurations: Vec<RobotConfiguration>,
    pub contacts: Vec<Contact>,
    /// `plan_segment` fails for these targets
    pub blocked_targets: Vec<Pose>,
    /// `plan_segment` returns an error
    pub broken_segments: bool,
    pub num_check_collision: usize,
    pub num_pairwise_collision: usize,
    pub num_set_configuration: usize,
    pub num_plan_segment: usize,
}

impl StubWorld {
    pub fn new(bodies: &[&str]) -> Self {
        StubWorld {
            joint_names: vec!["gantry_x_joint".to_owned(), "arm_joint".to_owned()],
            poses: bodies
                .iter()
                .enumerate()
                .map(|(i, b)| ((*b).to_owned(), at(-10.0 * (i + 1) as f64, 0.0, 0.0)))
                .collect(),
            configuration: conf(&[0.0, 0.0]),
            ..Default::default()
        }
    }
    pub fn contact(mut self, a: &str, b: &str, at: RobotConfiguration) -> Self {
        self.contacts.push(Contact {
            a: a.to_owned(),
            b: b.to_owned(),
            at,
        });
        self
    }
    /// Everything the scene guards must restore
    pub fn scene_state(
        &self,
    ) -> (
        Vec<(String, Pose)>,
        Vec<String>,
        BTreeSet<(String, String)>,
        RobotConfiguration,
    ) {
        let mut poses: Vec<_> = self.poses.iter().map(|(k, v)| (k.clone(), *v)).collect();
        poses.sort_by(|a, b| a.0.cmp(&b.0));
        (
            poses,
            self.attached.keys().cloned().collect(),
            self.disabled.clone(),
            self.configuration.clone(),
        )
    }
}

impl CollisionWorld for StubWorld {
    fn joint_names(&self) -> Vec<String> {
        self.joint_names.clone()
    }
    fn body_pose(&self, body: &str) -> Result<Pose> {
        self.poses
            .get(body)
            .copied()
            .ok_or_else(|| Error::UnknownBody(body.to_owned()))
    }
    fn set_pose(&mut self, body: &str, pose: &Pose) -> Result<()> {
        match self.poses.get_mut(body) {
            Some(p) => {
                *p = *pose;
                Ok(())
            }
            None => Err(Error::UnknownBody(body.to_owned())),
        }
    }
    fn attach(&mut self, flange_link: &str, body: &str, grasp: &GraspTransform) -> Result<()> {
        self.body_pose(body)?;
        if self.attached.contains_key(body) {
            return Err(Error::AlreadyAttached(body.to_owned()));
        }
        self.attached
            .insert(body.to_owned(), (flange_link.to_owned(), *grasp));
        Ok(())
    }
    fn detach(&mut self, body: &str) -> Result<()> {
        self.attached
            .remove(body)
            .map(|_| ())
            .ok_or_else(|| Error::NotAttached(body.to_owned()))
    }
    fn is_attached(&self, body: &str) -> bool {
        self.attached.contains_key(body)
    }
    fn disable_collision(&mut self, a: &str, b: &str) -> Result<bool> {
        Ok(self.disabled.insert(pair_key(a, b)))
    }
    fn enable_collision(&mut self, a: &str, b: &str) -> Result<()> {
        self.disabled.remove(&pair_key(a, b));
        Ok(())
    }
    fn configuration(&self) -> RobotConfiguration {
        self.configuration.clone()
    }
    fn set_configuration(&mut self, configuration: &RobotConfiguration) -> Result<()> {
        self.num_set_configuration += 1;
        self.configuration = configuration.clone();
        Ok(())
    }
    fn check_collision(&mut self, configuration: &RobotConfiguration) -> Result<bool> {
        self.num_check_collision += 1;
        self.configuration = configuration.clone();
        Ok(self.colliding_configurations.contains(configuration))
    }
    fn pairwise_collision(&mut self, a: BodyRef<'_>, b: BodyRef<'_>) -> Result<bool> {
        self.num_pairwise_collision += 1;
        let key = pair_key(&name_of(a), &name_of(b));
        if self.disabled.contains(&key) {
            return Ok(false);
        }
        Ok(self
            .contacts
            .iter()
            .any(|c| pair_key(&c.a, &c.b) == key && c.at == self.configuration))
    }
    /// Moves every joint by +1 per segment
    fn plan_segment(
        &mut self,
        start: &RobotConfiguration,
        target: &Pose,
    ) -> Result<Option<RobotConfiguration>> {
        self.num_plan_segment += 1;
        if self.broken_segments {
            return Err("segment solver is broken".into());
        }
        if self.blocked_targets.contains(target) {
            return Ok(None);
        }
        let next = RobotConfiguration::new(start.joint_values.iter().map(|v| v + 1.0).collect());
        self.configuration = next.clone();
        Ok(Some(next))
    }
}

/// Base sampler yielding `[0.0]`, `[1.0]`, ... and counting the polled candidates
#[derive(Debug, Default)]
pub struct StubBaseSampler {
    /// Number of candidates, unbounded if None
    pub num_candidates: Option<usize>,
    pub num_polled: Cell<usize>,
}

impl StubBaseSampler {
    pub fn unbounded() -> Self {
        Self::default()
    }
    pub fn finite(num_candidates: usize) -> Self {
        StubBaseSampler {
            num_candidates: Some(num_candidates),
            ..Default::default()
        }
    }
}

impl BasePoseSampler for StubBaseSampler {
    fn candidates(&self, _target: &Pose) -> Box<dyn Iterator<Item = BaseConfiguration> + '_> {
        let limit = self.num_candidates.unwrap_or(usize::MAX);
        Box::new((0..limit).map(move |i| {
            self.num_polled.set(self.num_polled.get() + 1);
            BaseConfiguration::new(vec![i as f64])
        }))
    }
}

/// IK returning the solutions of a table keyed by the first base joint value
#[derive(Debug, Default)]
pub struct StubIk {
    pub solutions: Vec<(f64, Vec<Vec<f64>>)>,
    pub num_calls: Cell<usize>,
}

impl StubIk {
    pub fn new(solutions: Vec<(f64, Vec<Vec<f64>>)>) -> Self {
        StubIk {
            solutions,
            num_calls: Cell::new(0),
        }
    }
    /// One arm solution `[0.5]` from every base
    pub fn everywhere() -> Self {
        Self::new((0..100).map(|i| (i as f64, vec![vec![0.5]])).collect())
    }
}

impl ArmIkSolver for StubIk {
    fn solve(&self, base: &BaseConfiguration, _target: &Pose) -> Vec<Vec<f64>> {
        self.num_calls.set(self.num_calls.get() + 1);
        self.solutions
            .iter()
            .find(|(b, _)| Some(b) == base.joint_values.first())
            .map(|(_, s)| s.clone())
            .unwrap_or_default()
    }
}

/// Case with a manual beam b0 and a clamped beam b1 built on it, lengths in mm
pub fn sample_process() -> Process {
    Process {
        length_unit: LengthUnit::Millimeter,
        toolchanger: ToolChanger {
            name: "tc".to_owned(),
            flange_from_toolbase: at(0.0, 0.0, 100.0),
        },
        tools: vec![
            Tool {
                name: "g1".to_owned(),
                type_name: Some("PG1000".to_owned()),
                kind: ToolKind::Gripper,
                toolbase_from_tcf: at(0.0, 0.0, 200.0),
            },
            Tool {
                name: "c1".to_owned(),
                type_name: Some("CL3".to_owned()),
                kind: ToolKind::Clamp,
                toolbase_from_tcf: Pose::identity(),
            },
        ],
        beams: vec![
            Beam::new("b0", BeamAssemblyMethod::ManualAssembly)
                .key_frame(BeamKeyFrame::Final, at(1000.0, 0.0, 0.0)),
            Beam::new("b1", BeamAssemblyMethod::Clamped)
                .gripper("PG1000", "g1")
                .key_frame(BeamKeyFrame::InClampApproach, at(1000.0, 0.0, 600.0))
                .key_frame(BeamKeyFrame::InClamp, at(1000.0, 0.0, 550.0))
                .key_frame(BeamKeyFrame::Final, at(1000.0, 0.0, 500.0)),
            Beam::new("b2", BeamAssemblyMethod::ManualAssembly)
                .key_frame(BeamKeyFrame::Final, at(3000.0, 0.0, 0.0)),
        ],
        joints: vec![Joint::new("b0", "b1")
            .clamp("CL3", "c1")
            .key_frame(ClampKeyFrame::AttachApproach, at(900.0, 0.0, 700.0))
            .key_frame(ClampKeyFrame::Final, at(900.0, 0.0, 500.0))
            .key_frame(ClampKeyFrame::DetachRetract, at(900.0, 0.0, 800.0))],
        environment_models: vec![],
    }
}
