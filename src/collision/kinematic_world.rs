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
use super::collision_checker::CollisionChecker;
use super::world::{BodyRef, CollisionPair, CollisionWorld};
use crate::errors::*;
use crate::funcs::*;
use crate::options::SamplerOptions;
use crate::types::{GraspTransform, Pose, RobotConfiguration};
use k::InverseKinematicsSolver;
use log::*;
use ncollide3d::{query, shape::ShapeHandle};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

struct Body {
    shape: ShapeHandle<f64>,
    pose: Pose,
    obstacle: bool,
}

struct Attachment {
    joint_name: String,
    grasp: GraspTransform,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_owned(), b.to_owned())
    } else {
        (b.to_owned(), a.to_owned())
    }
}

/// Collision world backed by a `k` kinematic tree and `ncollide3d` shapes
///
/// Obstacles are checked in `check_collision`; other bodies (beams, tools)
/// only collide through `pairwise_collision`. An attached body follows the
/// flange and its own stored pose is used again once it is detached.
pub struct KinematicWorld {
    robot: k::Chain<f64>,
    end_joint: String,
    link_joint_map: HashMap<String, String>,
    checker: CollisionChecker,
    self_collision_pairs: Vec<(String, String)>,
    touch_joints: HashSet<String>,
    bodies: BTreeMap<String, Body>,
    attachments: BTreeMap<String, Attachment>,
    disabled_pairs: HashSet<(String, String)>,
    ik_solver: k::JacobianIkSolver<f64>,
    check_step_m: f64,
    check_step_rad: f64,
    buffer_distance: f64,
}

impl KinematicWorld {
    pub fn add_obstacle(&mut self, name: &str, shape: ShapeHandle<f64>, pose: Pose) {
        self.insert_body(name, shape, pose, true);
    }
    /// Add a movable body such as a beam or a clamp
    pub fn add_body(&mut self, name: &str, shape: ShapeHandle<f64>, pose: Pose) {
        self.insert_body(name, shape, pose, false);
    }
    fn insert_body(&mut self, name: &str, shape: ShapeHandle<f64>, pose: Pose, obstacle: bool) {
        if self
            .bodies
            .insert(name.to_owned(), Body { shape, pose, obstacle })
            .is_some()
        {
            warn!("body {} is replaced", name);
        }
    }

    pub fn robot(&self) -> &k::Chain<f64> {
        &self.robot
    }

    pub fn joint_limits(&self) -> Vec<JointLimit> {
        self.robot
            .iter_joints()
            .map(|j| j.limits.as_ref().map(|range| (range.min, range.max)))
            .collect()
    }

    fn link_joint(&self, link: &str) -> Result<&str> {
        self.link_joint_map
            .get(link)
            .map(|j| j.as_str())
            .ok_or_else(|| Error::UnknownLink(link.to_owned()))
    }

    fn body(&self, name: &str) -> Result<&Body> {
        self.bodies
            .get(name)
            .ok_or_else(|| Error::UnknownBody(name.to_owned()))
    }

    fn is_disabled(&self, a: &str, b: &str) -> bool {
        self.disabled_pairs.contains(&pair_key(a, b))
    }

    /// Pose of a body in the world, following the flange if attached
    fn body_world_pose(&self, name: &str) -> Result<Pose> {
        let body = self.body(name)?;
        match self.attachments.get(name) {
            Some(attachment) => {
                let flange = self
                    .robot
                    .find(&attachment.joint_name)
                    .and_then(|node| node.world_transform())
                    .ok_or_else(|| Error::UnknownLink(attachment.joint_name.clone()))?;
                Ok(attachment.grasp.entity_pose_for(&flange))
            }
            None => Ok(body.pose),
        }
    }

    fn check_size(&self, configuration: &RobotConfiguration) -> Result<()> {
        let dof = self.robot.dof();
        if configuration.len() != dof {
            return Err(Error::ConfigurationSize {
                expected: dof,
                actual: configuration.len(),
            });
        }
        Ok(())
    }

    fn apply(&self, configuration: &RobotConfiguration) -> Result<()> {
        self.check_size(configuration)?;
        self.robot.set_joint_positions(&configuration.joint_values)?;
        self.robot.update_transforms();
        Ok(())
    }

    fn body_distance(&self, a: &str, b: &str) -> Result<f64> {
        let body_a = self.body(a)?;
        let body_b = self.body(b)?;
        Ok(query::distance(
            &self.body_world_pose(a)?,
            &*body_a.shape,
            &self.body_world_pose(b)?,
            &*body_b.shape,
        ))
    }

    fn robot_body_collision(&self, name: &str) -> Result<bool> {
        let body = self.body(name)?;
        let pose = self.body_world_pose(name)?;
        let no_skip = HashSet::new();
        let skip = if self.attachments.contains_key(name) {
            &self.touch_joints
        } else {
            &no_skip
        };
        Ok(self
            .checker
            .has_any_colliding(&self.robot, &*body.shape, &pose, skip))
    }

    /// Collision at the current transforms
    fn in_collision(&self) -> Result<bool> {
        if self
            .checker
            .has_self_collision(&self.robot, &self.self_collision_pairs)?
        {
            debug!("self collision");
            return Ok(true);
        }
        let no_skip = HashSet::new();
        for (name, obstacle) in self.bodies.iter().filter(|(_, b)| b.obstacle) {
            if self
                .checker
                .has_any_colliding(&self.robot, &*obstacle.shape, &obstacle.pose, &no_skip)
            {
                debug!("robot collides with {}", name);
                return Ok(true);
            }
            for attached in self.attachments.keys() {
                if self.is_disabled(attached, name) {
                    continue;
                }
                if self.body_distance(attached, name)? <= self.checker.prediction {
                    debug!("attached {} collides with {}", attached, name);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

impl CollisionWorld for KinematicWorld {
    fn joint_names(&self) -> Vec<String> {
        self.robot.iter_joints().map(|j| j.name.clone()).collect()
    }

    fn body_pose(&self, body: &str) -> Result<Pose> {
        self.body_world_pose(body)
    }

    fn set_pose(&mut self, body: &str, pose: &Pose) -> Result<()> {
        let body = self
            .bodies
            .get_mut(body)
            .ok_or_else(|| Error::UnknownBody(body.to_owned()))?;
        body.pose = *pose;
        Ok(())
    }

    fn attach(&mut self, flange_link: &str, body: &str, grasp: &GraspTransform) -> Result<()> {
        self.body(body)?;
        if self.attachments.contains_key(body) {
            return Err(Error::AlreadyAttached(body.to_owned()));
        }
        let joint_name = self.link_joint(flange_link)?.to_owned();
        self.attachments.insert(
            body.to_owned(),
            Attachment {
                joint_name,
                grasp: *grasp,
            },
        );
        Ok(())
    }

    fn detach(&mut self, body: &str) -> Result<()> {
        self.attachments
            .remove(body)
            .map(|_| ())
            .ok_or_else(|| Error::NotAttached(body.to_owned()))
    }

    fn is_attached(&self, body: &str) -> bool {
        self.attachments.contains_key(body)
    }

    fn disable_collision(&mut self, a: &str, b: &str) -> Result<bool> {
        Ok(self.disabled_pairs.insert(pair_key(a, b)))
    }

    fn enable_collision(&mut self, a: &str, b: &str) -> Result<()> {
        self.disabled_pairs.remove(&pair_key(a, b));
        Ok(())
    }

    fn configuration(&self) -> RobotConfiguration {
        RobotConfiguration::new(self.robot.joint_positions())
    }

    fn set_configuration(&mut self, configuration: &RobotConfiguration) -> Result<()> {
        self.apply(configuration)
    }

    fn check_collision(&mut self, configuration: &RobotConfiguration) -> Result<bool> {
        self.check_size(configuration)?;
        if !is_within_limits(&configuration.joint_values, &self.joint_limits()) {
            debug!("configuration {:?} is out of limits", configuration.joint_values);
            return Ok(true);
        }
        self.apply(configuration)?;
        self.in_collision()
    }

    fn pairwise_collision(&mut self, a: BodyRef<'_>, b: BodyRef<'_>) -> Result<bool> {
        match (a, b) {
            (BodyRef::Robot, BodyRef::Robot) => self
                .checker
                .has_self_collision(&self.robot, &self.self_collision_pairs),
            (BodyRef::Robot, BodyRef::Body(name)) | (BodyRef::Body(name), BodyRef::Robot) => {
                self.robot_body_collision(name)
            }
            (BodyRef::Body(a), BodyRef::Body(b)) => {
                if self.is_disabled(a, b) {
                    return Ok(false);
                }
                Ok(self.body_distance(a, b)? <= self.checker.prediction)
            }
        }
    }

    fn plan_segment(
        &mut self,
        start: &RobotConfiguration,
        target: &Pose,
    ) -> Result<Option<RobotConfiguration>> {
        let limits = self.joint_limits();
        if !is_within_limits(&start.joint_values, &limits) {
            return Ok(None);
        }
        self.apply(start)?;
        let end = self
            .robot
            .find(&self.end_joint)
            .ok_or_else(|| Error::UnknownLink(self.end_joint.clone()))?;
        let arm = k::SerialChain::from_end(end);
        arm.update_transforms();
        let start_pose = arm.end_transform();
        for pose in interpolate_poses(&start_pose, target, self.check_step_m, self.check_step_rad) {
            if let Err(err) = self.ik_solver.solve(&arm, &pose) {
                debug!("segment is not reachable: {}", err);
                return Ok(None);
            }
            if !is_within_limits(&self.robot.joint_positions(), &limits) {
                debug!("segment leaves the joint limits");
                return Ok(None);
            }
            self.robot.update_transforms();
            if self.in_collision()? {
                debug!("segment is colliding");
                return Ok(None);
            }
        }
        Ok(Some(self.configuration()))
    }

    /// Out-of-limit joints are reported against `"joint_limits"` and nothing else is checked
    fn collision_report(
        &mut self,
        configuration: &RobotConfiguration,
    ) -> Result<Vec<CollisionPair>> {
        self.check_size(configuration)?;
        let out_of_limits = self
            .joint_names()
            .into_iter()
            .zip(configuration.joint_values.iter())
            .zip(self.joint_limits())
            .filter_map(|((name, &value), limit)| match limit {
                Some((min, max)) if value < min || value > max => Some(CollisionPair {
                    first: name,
                    second: "joint_limits".to_owned(),
                    distance: if value < min { value - min } else { max - value },
                }),
                _ => None,
            })
            .collect::<Vec<_>>();
        if !out_of_limits.is_empty() {
            return Ok(out_of_limits);
        }
        self.apply(configuration)?;
        let margin = self.checker.prediction + self.buffer_distance;
        let mut pairs = self.checker.self_colliding_link_names(
            &self.robot,
            &self.self_collision_pairs,
            margin,
        )?;
        for (name, obstacle) in self.bodies.iter().filter(|(_, b)| b.obstacle) {
            for (link, distance) in
                self.checker
                    .colliding_link_names(&self.robot, &*obstacle.shape, &obstacle.pose, margin)
            {
                pairs.push(CollisionPair {
                    first: link,
                    second: name.to_owned(),
                    distance,
                });
            }
            for attached in self.attachments.keys() {
                let distance = self.body_distance(attached, name)?;
                if distance <= margin {
                    pairs.push(CollisionPair {
                        first: attached.to_owned(),
                        second: name.to_owned(),
                        distance,
                    });
                }
            }
        }
        Ok(pairs)
    }
}

/// Builder of [`KinematicWorld`]
pub struct KinematicWorldBuilder {
    urdf_robot: urdf_rs::Robot,
    end_link: String,
    pub collision_check_margin: f64,
    pub collision_buffer_margin: f64,
    pub self_collision_pairs: Vec<(String, String)>,
    pub touch_links: Vec<String>,
    pub ik_solver: k::JacobianIkSolver<f64>,
    pub check_step_m: f64,
    pub check_step_rad: f64,
}

impl KinematicWorldBuilder {
    pub fn new(urdf_robot: urdf_rs::Robot, end_link: &str) -> Self {
        KinematicWorldBuilder {
            urdf_robot,
            end_link: end_link.to_owned(),
            collision_check_margin: 0.0,
            collision_buffer_margin: 0.0,
            self_collision_pairs: Vec::new(),
            touch_links: Vec::new(),
            ik_solver: k::JacobianIkSolver::default(),
            check_step_m: 0.01,
            check_step_rad: 0.05,
        }
    }
    pub fn try_from_urdf_file<P>(file: P, end_link: &str) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        Ok(Self::new(urdf_rs::read_file(file)?, end_link))
    }
    /// Take the collision margins and the flange (as end link) from the sampler options
    pub fn with_options(mut self, options: &SamplerOptions) -> Self {
        self.collision_check_margin = options.collision_distance_threshold;
        self.collision_buffer_margin = options.collision_buffer_distance_threshold;
        self.end_link = options.flange_link.clone();
        self
    }
    pub fn collision_check_margin(mut self, length: f64) -> Self {
        self.collision_check_margin = length;
        self
    }
    pub fn collision_buffer_margin(mut self, length: f64) -> Self {
        self.collision_buffer_margin = length;
        self
    }
    /// Pairs of joint names checked for self collision
    pub fn self_collision_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.self_collision_pairs = pairs;
        self
    }
    /// Links allowed to touch attached bodies, typically the flange and the tool
    pub fn touch_links(mut self, links: &[&str]) -> Self {
        self.touch_links = links.iter().map(|l| (*l).to_owned()).collect();
        self
    }
    pub fn ik_solver(mut self, ik_solver: k::JacobianIkSolver<f64>) -> Self {
        self.ik_solver = ik_solver;
        self
    }
    /// Interpolation steps of `plan_segment`, both must be positive
    pub fn check_steps(mut self, check_step_m: f64, check_step_rad: f64) -> Self {
        self.check_step_m = check_step_m;
        self.check_step_rad = check_step_rad;
        self
    }
    pub fn finalize(self) -> Result<KinematicWorld> {
        for step in &[self.check_step_m, self.check_step_rad] {
            if !(*step > 0.0 && step.is_finite()) {
                return Err(format!("check step must be positive, got {}", step).into());
            }
        }
        let robot = k::Chain::<f64>::from(&self.urdf_robot);
        let link_joint_map = k::urdf::link_to_joint_map(&self.urdf_robot);
        let end_joint = link_joint_map
            .get(&self.end_link)
            .cloned()
            .ok_or_else(|| Error::UnknownLink(self.end_link.clone()))?;
        let touch_joints = self
            .touch_links
            .iter()
            .map(|l| {
                link_joint_map
                    .get(l)
                    .cloned()
                    .ok_or_else(|| Error::UnknownLink(l.clone()))
            })
            .collect::<Result<HashSet<_>>>()?;
        let checker =
            CollisionChecker::from_urdf_robot(&self.urdf_robot, self.collision_check_margin);
        robot.update_transforms();
        Ok(KinematicWorld {
            robot,
            end_joint,
            link_joint_map,
            checker,
            self_collision_pairs: self.self_collision_pairs,
            touch_joints,
            bodies: BTreeMap::new(),
            attachments: BTreeMap::new(),
            disabled_pairs: HashSet::new(),
            ik_solver: self.ik_solver,
            check_step_m: self.check_step_m,
            check_step_rad: self.check_step_rad,
            buffer_distance: self.collision_buffer_margin,
        })
    }
}
