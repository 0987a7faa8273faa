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
use crate::types::{GraspTransform, Pose, RobotConfiguration};

/// Address of a collision body in pairwise queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyRef<'a> {
    /// All links of the robot
    Robot,
    /// A named body: an obstacle, a beam or a tool, attached or not
    Body(&'a str),
}

/// One colliding (or too close) pair found in diagnosis
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionPair {
    pub first: String,
    pub second: String,
    pub distance: f64,
}

/// Scene state and primitive queries the stream samplers run on
///
/// The world is a single stateful resource. Every mutation done on behalf of a
/// stream goes through [`SceneGuard`](crate::SceneGuard) so that it is undone
/// when the stream returns.
pub trait CollisionWorld {
    /// Names of the joints, in the order of `RobotConfiguration::joint_values`
    fn joint_names(&self) -> Vec<String>;

    fn body_pose(&self, body: &str) -> Result<Pose>;
    fn set_pose(&mut self, body: &str, pose: &Pose) -> Result<()>;

    /// Rigidly attach `body` to `flange_link` with flange_from_body = `grasp`
    fn attach(&mut self, flange_link: &str, body: &str, grasp: &GraspTransform) -> Result<()>;
    fn detach(&mut self, body: &str) -> Result<()>;
    fn is_attached(&self, body: &str) -> bool;

    /// Ignore collisions between two bodies. Returns false if they were already ignored.
    fn disable_collision(&mut self, a: &str, b: &str) -> Result<bool>;
    fn enable_collision(&mut self, a: &str, b: &str) -> Result<()>;

    fn configuration(&self) -> RobotConfiguration;
    fn set_configuration(&mut self, configuration: &RobotConfiguration) -> Result<()>;

    /// Set `configuration` and check self collision and collision with static
    /// obstacles, including the attached bodies. True if colliding.
    fn check_collision(&mut self, configuration: &RobotConfiguration) -> Result<bool>;

    /// Collision between two bodies at the current configuration.
    ///
    /// Pairs disabled by `disable_collision` never collide.
    fn pairwise_collision(&mut self, a: BodyRef<'_>, b: BodyRef<'_>) -> Result<bool>;

    /// Move the flange linearly from `start` to `target`.
    ///
    /// Returns the configuration at `target`, or `None` if the segment is
    /// unreachable or colliding.
    fn plan_segment(
        &mut self,
        start: &RobotConfiguration,
        target: &Pose,
    ) -> Result<Option<RobotConfiguration>>;

    /// Every colliding pair at `configuration`, used only for logging
    fn collision_report(
        &mut self,
        _configuration: &RobotConfiguration,
    ) -> Result<Vec<CollisionPair>> {
        Ok(Vec::new())
    }
}
