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
use super::urdf::{urdf_collision_to_shape_handle, LocalShape};
use super::world::CollisionPair;
use crate::errors::*;
use log::*;
use nalgebra as na;
use ncollide3d::{query, shape::Shape};
use std::collections::{HashMap, HashSet};

pub type NameShapeMap = HashMap<String, Vec<LocalShape>>;

/// Collision models of the robot links, keyed by the joint moving each link
#[derive(Clone)]
pub struct CollisionChecker {
    name_collision_model_map: NameShapeMap,
    /// margin length for collision check
    pub prediction: f64,
}

impl CollisionChecker {
    /// Create CollisionChecker from HashMap
    pub fn new(name_collision_model_map: NameShapeMap, prediction: f64) -> Self {
        CollisionChecker {
            name_collision_model_map,
            prediction,
        }
    }

    /// Create CollisionChecker from urdf_rs::Robot
    pub fn from_urdf_robot(urdf_robot: &urdf_rs::Robot, prediction: f64) -> Self {
        let mut name_collision_model_map = HashMap::new();
        let link_joint_map = k::urdf::link_to_joint_map(urdf_robot);
        for l in &urdf_robot.links {
            let col_pose_vec = l
                .collision
                .iter()
                .filter_map(urdf_collision_to_shape_handle)
                .collect::<Vec<_>>();
            debug!("name={}, ln={}", l.name, col_pose_vec.len());
            if !col_pose_vec.is_empty() {
                if let Some(joint_name) = link_joint_map.get(&l.name) {
                    name_collision_model_map.insert(joint_name.to_owned(), col_pose_vec);
                }
            }
        }
        CollisionChecker {
            name_collision_model_map,
            prediction,
        }
    }

    /// Check if any link not in `skip_joints` is closer than `prediction` to the target
    pub fn has_any_colliding(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
        skip_joints: &HashSet<String>,
    ) -> bool {
        !self
            .colliding_link_names_with_first_return_flag(
                robot,
                target_shape,
                target_pose,
                skip_joints,
                self.prediction,
                true,
            )
            .is_empty()
    }

    /// Returns the names and distances of the links closer than `margin` to the target
    pub fn colliding_link_names(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
        margin: f64,
    ) -> Vec<(String, f64)> {
        self.colliding_link_names_with_first_return_flag(
            robot,
            target_shape,
            target_pose,
            &HashSet::new(),
            margin,
            false,
        )
    }

    /// Check collision and return the names of the link(joint) names
    ///
    /// first_return: if true the function returns immediately when it found a collision.
    /// This flag is to make it fast.
    fn colliding_link_names_with_first_return_flag(
        &self,
        robot: &k::Chain<f64>,
        target_shape: &dyn Shape<f64>,
        target_pose: &na::Isometry3<f64>,
        skip_joints: &HashSet<String>,
        margin: f64,
        first_return: bool,
    ) -> Vec<(String, f64)> {
        let mut names = Vec::new();
        for joint in robot.iter() {
            let trans = match joint.world_transform() {
                Some(trans) => trans,
                None => continue,
            };
            let joint_name = &joint.joint().name;
            if skip_joints.contains(joint_name) {
                continue;
            }
            if let Some(obj_vec) = self.name_collision_model_map.get(joint_name) {
                for obj in obj_vec {
                    // proximity and prediction does not work for meshes.
                    let dist =
                        query::distance(&(trans * obj.1), &*obj.0, target_pose, target_shape);
                    if dist <= margin {
                        debug!("name: {}, dist={}", joint_name, dist);
                        names.push((joint_name.to_owned(), dist));
                        if first_return {
                            return names;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
        names
    }

    /// Check if there are any self colliding links
    pub fn has_self_collision(
        &self,
        robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
    ) -> Result<bool> {
        Ok(!self
            .self_colliding_link_names_with_first_return_flag(
                robot,
                self_collision_pairs,
                self.prediction,
                true,
            )?
            .is_empty())
    }

    /// Returns the self colliding pairs closer than `margin`
    pub fn self_colliding_link_names(
        &self,
        robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
        margin: f64,
    ) -> Result<Vec<CollisionPair>> {
        self.self_colliding_link_names_with_first_return_flag(
            robot,
            self_collision_pairs,
            margin,
            false,
        )
    }

    fn self_colliding_link_names_with_first_return_flag(
        &self,
        robot: &k::Chain<f64>,
        self_collision_pairs: &[(String, String)],
        margin: f64,
        first_return: bool,
    ) -> Result<Vec<CollisionPair>> {
        let mut names = Vec::new();
        for (j1, j2) in self_collision_pairs {
            let (obj_vec1, obj_vec2) = match (
                self.name_collision_model_map.get(j1),
                self.name_collision_model_map.get(j2),
            ) {
                (Some(obj_vec1), Some(obj_vec2)) => (obj_vec1, obj_vec2),
                _ => continue,
            };
            let trans1 = robot
                .find(j1)
                .and_then(|node| node.world_transform())
                .ok_or_else(|| format!("self_colliding: {} not found", j1))?;
            let trans2 = robot
                .find(j2)
                .and_then(|node| node.world_transform())
                .ok_or_else(|| format!("self_colliding: {} not found", j2))?;
            'pair: for obj1 in obj_vec1 {
                for obj2 in obj_vec2 {
                    // proximity and predict does not work correctly for mesh
                    let dist = query::distance(
                        &(trans1 * obj1.1),
                        &*obj1.0,
                        &(trans2 * obj2.1),
                        &*obj2.0,
                    );
                    debug!("name: {}, name: {} dist={}", j1, j2, dist);
                    if dist <= margin {
                        names.push(CollisionPair {
                            first: j1.to_owned(),
                            second: j2.to_owned(),
                            distance: dist,
                        });
                        if first_return {
                            return Ok(names);
                        }
                        break 'pair;
                    }
                }
            }
        }
        Ok(names)
    }
}

pub fn parse_colon_separated_pairs(pair_strs: &[String]) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for pair_str in pair_strs {
        let mut sp = pair_str.split(':');
        match (sp.next(), sp.next()) {
            (Some(p1), Some(p2)) => pairs.push((p1.to_owned(), p2.to_owned())),
            _ => return Err(format!("failed to parse {}", pair_str).into()),
        }
    }
    Ok(pairs)
}
