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
use crate::funcs::*;
use crate::types::{BaseConfiguration, Pose};
use k::InverseKinematicsSolver;
use log::*;
use rand::{rngs::StdRng, SeedableRng};

/// Arm inverse kinematics with the base (gantry) joints held fixed
pub trait ArmIkSolver {
    /// Returns the arm joint values reaching `target` from `base`, possibly none.
    ///
    /// Must not touch the collision world.
    fn solve(&self, base: &BaseConfiguration, target: &Pose) -> Vec<Vec<f64>>;
}

/// Collects several arm solutions by restarting k's Jacobian IK from random arm positions
///
/// The base joints are the first `num_base_joints` joints of the chain and are
/// excluded from the Jacobian. The random restarts are seeded on every call so
/// equal inputs give equal solutions.
pub struct JacobianArmIkSolver {
    arm: k::SerialChain<f64>,
    num_base_joints: usize,
    solver: k::JacobianIkSolver<f64>,
    constraints: k::Constraints,
    num_restarts: usize,
    max_solutions: usize,
    min_solution_distance: f64,
    seed: u64,
}

impl JacobianArmIkSolver {
    pub fn dof(&self) -> usize {
        self.arm.dof() - self.num_base_joints
    }

    fn limits(&self) -> Vec<JointLimit> {
        self.arm
            .iter_joints()
            .map(|j| j.limits.as_ref().map(|range| (range.min, range.max)))
            .collect()
    }
}

impl ArmIkSolver for JacobianArmIkSolver {
    fn solve(&self, base: &BaseConfiguration, target: &Pose) -> Vec<Vec<f64>> {
        if base.joint_values.len() != self.num_base_joints {
            warn!(
                "base has {} joints, expected {}",
                base.joint_values.len(),
                self.num_base_joints
            );
            return Vec::new();
        }
        let limits = self.limits();
        let (base_limits, arm_limits) = limits.split_at(self.num_base_joints);
        if !is_within_limits(&base.joint_values, base_limits) {
            debug!("base {:?} is out of limits", base.joint_values);
            return Vec::new();
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut solutions: Vec<Vec<f64>> = Vec::new();
        for _ in 0..self.num_restarts {
            let mut initial = base.joint_values.clone();
            initial.extend(generate_random_joint_positions_from_limits(arm_limits, &mut rng));
            if let Err(err) = self.arm.set_joint_positions(&initial) {
                warn!("failed to set initial positions: {}", err);
                return solutions;
            }
            if let Err(err) = self
                .solver
                .solve_with_constraints(&self.arm, target, &self.constraints)
            {
                debug!("ik not converged: {}", err);
                continue;
            }
            let positions = self.arm.joint_positions();
            if !is_within_limits(&positions, &limits) {
                continue;
            }
            let arm_positions = positions[self.num_base_joints..].to_vec();
            if solutions
                .iter()
                .all(|s| distance(s, &arm_positions) > self.min_solution_distance)
            {
                solutions.push(arm_positions);
                if solutions.len() >= self.max_solutions {
                    break;
                }
            }
        }
        solutions
    }
}

/// Builder of [`JacobianArmIkSolver`]
pub struct JacobianArmIkSolverBuilder {
    urdf_robot: urdf_rs::Robot,
    end_link: String,
    pub num_base_joints: usize,
    pub solver: k::JacobianIkSolver<f64>,
    pub num_restarts: usize,
    pub max_solutions: usize,
    pub min_solution_distance: f64,
    pub seed: u64,
}

impl JacobianArmIkSolverBuilder {
    pub fn new(urdf_robot: urdf_rs::Robot, end_link: &str) -> Self {
        JacobianArmIkSolverBuilder {
            urdf_robot,
            end_link: end_link.to_owned(),
            num_base_joints: 3,
            solver: k::JacobianIkSolver::default(),
            num_restarts: 30,
            max_solutions: 8,
            min_solution_distance: 1.0e-3,
            seed: 0,
        }
    }
    pub fn num_base_joints(mut self, num_base_joints: usize) -> Self {
        self.num_base_joints = num_base_joints;
        self
    }
    pub fn solver(mut self, solver: k::JacobianIkSolver<f64>) -> Self {
        self.solver = solver;
        self
    }
    pub fn num_restarts(mut self, num_restarts: usize) -> Self {
        self.num_restarts = num_restarts;
        self
    }
    pub fn max_solutions(mut self, max_solutions: usize) -> Self {
        self.max_solutions = max_solutions;
        self
    }
    /// Solutions closer than this (joint space norm) are the same solution
    pub fn min_solution_distance(mut self, distance: f64) -> Self {
        self.min_solution_distance = distance;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    pub fn finalize(self) -> Result<JacobianArmIkSolver> {
        let robot = k::Chain::<f64>::from(&self.urdf_robot);
        let link_joint_map = k::urdf::link_to_joint_map(&self.urdf_robot);
        let end_joint = link_joint_map
            .get(&self.end_link)
            .ok_or_else(|| Error::UnknownLink(self.end_link.clone()))?;
        let end = robot
            .find(end_joint)
            .ok_or_else(|| Error::UnknownLink(self.end_link.clone()))?;
        let arm = k::SerialChain::from_end(end);
        if self.num_base_joints > arm.dof() {
            return Err(Error::Other(format!(
                "{} base joints requested but the chain to {} has {} joints",
                self.num_base_joints,
                self.end_link,
                arm.dof()
            )));
        }
        let constraints = k::Constraints {
            ignored_joint_names: arm
                .iter_joints()
                .take(self.num_base_joints)
                .map(|j| j.name.clone())
                .collect(),
            ..Default::default()
        };
        Ok(JacobianArmIkSolver {
            arm,
            num_base_joints: self.num_base_joints,
            solver: self.solver,
            constraints,
            num_restarts: self.num_restarts,
            max_solutions: self.max_solutions,
            min_solution_distance: self.min_solution_distance,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    const PLANAR_ARM: &str = r#"<robot name="planar_arm">
      <link name="world"/>
      <joint name="gantry_x_joint" type="prismatic">
        <parent link="world"/><child link="gantry_x"/>
        <axis xyz="1 0 0"/><limit lower="-5" upper="5" effort="1" velocity="1"/>
      </joint>
      <link name="gantry_x"/>
      <joint name="j1" type="revolute">
        <parent link="gantry_x"/><child link="l1"/>
        <axis xyz="0 0 1"/><limit lower="-3" upper="3" effort="1" velocity="1"/>
      </joint>
      <link name="l1"/>
      <joint name="j2" type="revolute">
        <parent link="l1"/><child link="l2"/><origin xyz="0.5 0 0"/>
        <axis xyz="0 0 1"/><limit lower="-3" upper="3" effort="1" velocity="1"/>
      </joint>
      <link name="l2"/>
      <joint name="tool0_joint" type="fixed">
        <parent link="l2"/><child link="tool0"/><origin xyz="0.5 0 0"/>
      </joint>
      <link name="tool0"/>
    </robot>"#;

    fn builder() -> JacobianArmIkSolverBuilder {
        let urdf_robot = urdf_rs::read_from_string(PLANAR_ARM).unwrap();
        JacobianArmIkSolverBuilder::new(urdf_robot, "tool0")
            .num_base_joints(1)
            .num_restarts(3)
    }

    #[test]
    fn test_builder() {
        let solver = builder().finalize().unwrap();
        assert_eq!(solver.dof(), 2);
        assert!(builder().num_base_joints(4).finalize().is_err());
        let urdf_robot = urdf_rs::read_from_string(PLANAR_ARM).unwrap();
        assert!(JacobianArmIkSolverBuilder::new(urdf_robot, "tool9")
            .finalize()
            .is_err());
    }

    #[test]
    fn test_arm_solutions_reach_target() {
        let urdf_robot = urdf_rs::read_file("gantry_arm.urdf").unwrap();
        let solver = JacobianArmIkSolverBuilder::new(urdf_robot.clone(), "tool0")
            .solver(k::JacobianIkSolver::new(0.001, 0.005, 0.5, 300))
            .num_restarts(50)
            .finalize()
            .unwrap();
        assert_eq!(solver.dof(), 6);

        let robot = k::Chain::<f64>::from(&urdf_robot);
        let tool = robot.find("tool0_joint").unwrap();
        let base = BaseConfiguration::new(vec![0.2, -0.1, 0.5]);
        let mut known = base.joint_values.clone();
        known.extend(&[0.1, 0.3, 0.8, 0.0, 0.5, 0.2]);
        robot.set_joint_positions(&known).unwrap();
        robot.update_transforms();
        let target = tool.world_transform().unwrap();

        let solutions = solver.solve(&base, &target);
        assert!(!solutions.is_empty());
        assert_eq!(solver.solve(&base, &target), solutions);
        for solution in &solutions {
            assert_eq!(solution.len(), 6);
            let mut positions = base.joint_values.clone();
            positions.extend(solution);
            robot.set_joint_positions(&positions).unwrap();
            robot.update_transforms();
            let reached = tool.world_transform().unwrap();
            assert!((reached.translation.vector - target.translation.vector).norm() < 0.002);
            assert!(reached.rotation.angle_to(&target.rotation) < 0.01);
        }
        // the solver never moved the gantry
        assert_eq!(&solver.arm.joint_positions()[..3], &base.joint_values[..]);
    }

    #[test]
    fn test_unreachable_and_invalid_base() {
        let solver = builder().finalize().unwrap();
        let far = na::Isometry3::translation(0.0, 100.0, 0.0);
        let base = BaseConfiguration::new(vec![0.0]);
        assert!(solver.solve(&base, &far).is_empty());
        assert!(solver.solve(&base, &far).is_empty());
        let near = na::Isometry3::translation(0.5, 0.5, 0.0);
        assert!(solver
            .solve(&BaseConfiguration::new(vec![0.0, 0.0]), &near)
            .is_empty());
        assert!(solver
            .solve(&BaseConfiguration::new(vec![10.0]), &near)
            .is_empty());
    }
}
