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
use nalgebra as na;
use std::time::Duration;

/// Rigid pose in world coordinates. Translations are always in metres.
pub type Pose = na::Isometry3<f64>;

/// Length unit of a process description
///
/// Everything inside this crate works in metres. The unit is only looked at
/// once, when the frame/grasp cache reads the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Millimeter,
    Meter,
}

impl LengthUnit {
    /// Factor to multiply a length in this unit to get metres
    pub fn meter_scale(self) -> f64 {
        match self {
            LengthUnit::Millimeter => 1e-3,
            LengthUnit::Meter => 1.0,
        }
    }
    /// Scale the translation part of `pose` to metres
    pub fn isometry_to_meters(self, pose: &Pose) -> Pose {
        let mut converted = *pose;
        converted.translation.vector *= self.meter_scale();
        converted
    }
}

impl Default for LengthUnit {
    fn default() -> Self {
        LengthUnit::Millimeter
    }
}

/// Fixed transform from the robot flange to a held entity (flange_from_entity)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraspTransform(pub Pose);

impl GraspTransform {
    pub fn new(flange_from_entity: Pose) -> Self {
        GraspTransform(flange_from_entity)
    }
    pub fn flange_from_entity(&self) -> &Pose {
        &self.0
    }
    /// Flange pose which puts the held entity at `entity_pose`
    pub fn flange_pose_for(&self, entity_pose: &Pose) -> Pose {
        entity_pose * self.0.inverse()
    }
    /// Entity pose when the flange is at `flange_pose`
    pub fn entity_pose_for(&self, flange_pose: &Pose) -> Pose {
        flange_pose * self.0
    }
}

/// Joint values of the coarse positioning axes (gantry)
#[derive(Debug, Clone, PartialEq)]
pub struct BaseConfiguration {
    pub joint_values: Vec<f64>,
}

impl BaseConfiguration {
    pub fn new(joint_values: Vec<f64>) -> Self {
        Self { joint_values }
    }
}

/// Full robot joint values, the gantry axes followed by the arm axes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RobotConfiguration {
    pub joint_values: Vec<f64>,
}

impl RobotConfiguration {
    pub fn new(joint_values: Vec<f64>) -> Self {
        Self { joint_values }
    }
    pub fn from_base_and_arm(base: &BaseConfiguration, arm: &[f64]) -> Self {
        let mut joint_values = Vec::with_capacity(base.joint_values.len() + arm.len());
        joint_values.extend_from_slice(&base.joint_values);
        joint_values.extend_from_slice(arm);
        Self { joint_values }
    }
    pub fn len(&self) -> usize {
        self.joint_values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.joint_values.is_empty()
    }
}

/// Body held by the robot flange during a stream
#[derive(Debug, Clone, PartialEq)]
pub struct HeldBody {
    pub name: String,
    pub grasp: GraspTransform,
}

impl HeldBody {
    pub fn new(name: &str, grasp: GraspTransform) -> Self {
        Self {
            name: name.to_owned(),
            grasp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryPoint {
    pub configuration: RobotConfiguration,
    pub time_from_start: Duration,
}

/// Witness returned by the motion streams
///
/// One point per target frame of the action, one second apart.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub joint_names: Vec<String>,
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn from_configurations(
        joint_names: Vec<String>,
        configurations: Vec<RobotConfiguration>,
    ) -> Self {
        let points = configurations
            .into_iter()
            .enumerate()
            .map(|(i, configuration)| TrajectoryPoint {
                configuration,
                time_from_start: Duration::from_secs(i as u64),
            })
            .collect();
        Self {
            joint_names,
            points,
        }
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn configurations(&self) -> impl Iterator<Item = &RobotConfiguration> {
        self.points.iter().map(|p| &p.configuration)
    }
    pub fn start_configuration(&self) -> Option<&RobotConfiguration> {
        self.points.first().map(|p| &p.configuration)
    }
}
