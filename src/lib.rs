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
//! # Geometric Stream Sampling for Robotic Assembly
//!
//! Streams answer the geometric questions of a task and motion planner: "is
//! there a collision free trajectory placing this beam?" or "does this
//! trajectory hit that beam?". A trajectory is sampled by drawing gantry
//! positions around the first target frame, solving the arm IK there, and
//! following the remaining frames with Cartesian segments. `ncollide3d` is used
//! to check the collision between the robot, the held body and the environment.
//!
//! # Example
//!
//! ```no_run
//! use assembly_streams::*;
//! use nalgebra as na;
//! use ncollide3d::shape::{Cuboid, ShapeHandle};
//!
//! # fn main() -> Result<()> {
//! let urdf_robot = urdf_rs::read_file("gantry_arm.urdf")?;
//! let options = SamplerOptions::default().gantry_attempts(200).seed(0);
//! // Collision world with the robot and a beam to carry
//! let mut world = KinematicWorldBuilder::new(urdf_robot.clone(), "tool0")
//!     .with_options(&options)
//!     .touch_links(&["tool0"])
//!     .finalize()?;
//! let beam_shape = ShapeHandle::new(Cuboid::new(na::Vector3::new(0.5, 0.05, 0.05)));
//! world.add_body("b1", beam_shape, na::Isometry3::identity());
//!
//! let ik_solver = JacobianArmIkSolverBuilder::new(urdf_robot, "tool0").finalize()?;
//! let base_sampler =
//!     GantryBaseSampler::with_options([(-5.0, 5.0), (-5.0, 5.0), (0.0, 2.0)], &options);
//! let sampler = MotionSampler::new(&base_sampler, &ik_solver, &options);
//!
//! // Flange frames to visit in order
//! let frames = vec![
//!     na::Isometry3::translation(1.0, 0.0, 0.5),
//!     na::Isometry3::translation(1.0, 0.0, 0.3),
//! ];
//! let held = HeldBody::new("b1", GraspTransform::new(na::Isometry3::translation(0.0, 0.0, 0.1)));
//! match sampler.sample(&mut world, &held, &frames)? {
//!     SampleOutcome::Found { trajectory, .. } => println!("trajectory = {:?}", trajectory),
//!     SampleOutcome::Exhausted { reason, .. } => println!("no trajectory: {:?}", reason),
//! }
//! # Ok(())
//! # }
//! ```

mod errors;
pub use errors::*;

mod types;
pub use types::*;

mod options;
pub use options::*;

mod funcs;
pub use funcs::*;

mod process;
pub use process::*;

mod frame_cache;
pub use frame_cache::*;

pub mod collision;
pub use collision::*;

mod base_sampler;
pub use base_sampler::*;

mod ik;
pub use ik::*;

mod sampler;
pub use sampler::*;

mod collision_test;
pub use collision_test::*;

mod stream;
pub use stream::*;

// re-export k::IK modules
pub use k::{InverseKinematicsSolver, JacobianIkSolver};
