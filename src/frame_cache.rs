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
use crate::process::*;
use crate::types::{GraspTransform, LengthUnit, Pose};
use log::*;
use std::collections::{BTreeSet, HashMap};

/// Target frames and grasps of every robotic action of a process
///
/// Built once per planning session. All poses are in metres and all target
/// frames are flange poses in world coordinates.
#[derive(Debug, Clone, Default)]
pub struct FrameGraspCache {
    beam_target_frames: HashMap<String, Vec<Pose>>,
    beam_grasps: HashMap<String, GraspTransform>,
    beam_assembled_poses: HashMap<String, Pose>,
    beam_neighbors: HashMap<String, BTreeSet<String>>,
    clamp_target_frames: HashMap<(ClampAction, JointId), Vec<Pose>>,
    clamp_grasp: Option<GraspTransform>,
    tool_types: BTreeSet<String>,
}

fn target_frames_from_movements(
    entity: &str,
    movements: &[Movement],
    grasp: &GraspTransform,
    unit: LengthUnit,
) -> Result<Vec<Pose>> {
    let mut frames = Vec::new();
    for movement in movements {
        match movement {
            Movement::Manual { .. } => {}
            Movement::Robotic { taught: true, tag, .. } => {
                debug!("{}: skip {} which has a taught configuration", entity, tag);
            }
            Movement::Robotic {
                target: Some(entity_pose),
                ..
            } => {
                frames.push(grasp.flange_pose_for(&unit.isometry_to_meters(entity_pose)));
            }
            Movement::Robotic { target: None, tag, .. } => {
                return Err(Error::MissingTargetFrame {
                    entity: entity.to_owned(),
                    movement: tag.to_string(),
                });
            }
        }
    }
    Ok(frames)
}

impl FrameGraspCache {
    /// Read every robotic beam and clamp action of `process`
    pub fn from_process(process: &Process) -> Result<Self> {
        let unit = process.length_unit;
        let flange_from_toolbase =
            unit.isometry_to_meters(&process.toolchanger.flange_from_toolbase);
        let mut cache = FrameGraspCache {
            clamp_grasp: Some(GraspTransform::new(flange_from_toolbase)),
            tool_types: process
                .tools
                .iter()
                .filter_map(|t| t.type_name.clone())
                .collect(),
            ..Default::default()
        };

        for beam in &process.beams {
            if let Some(assembled) = beam.key_frames.get(&BeamKeyFrame::Final) {
                cache
                    .beam_assembled_poses
                    .insert(beam.id.clone(), unit.isometry_to_meters(assembled));
            }
            let action = match AssemblyAction::from_method(beam.assembly_method) {
                Some(action) => action,
                None => {
                    debug!("skip {} ({:?})", beam.id, beam.assembly_method);
                    continue;
                }
            };
            let gripper_type = beam.gripper_type.as_deref().unwrap_or_default();
            if process.tool_names_of_type(gripper_type).is_empty() {
                return Err(Error::UnknownToolType {
                    entity: beam.id.clone(),
                    tool_type: gripper_type.to_owned(),
                });
            }
            let gripper_id = beam.gripper_id.as_deref().unwrap_or_default();
            let gripper = process.tool(gripper_id).ok_or_else(|| Error::UnknownTool {
                entity: beam.id.clone(),
                tool_id: gripper_id.to_owned(),
            })?;
            let flange_from_beam = flange_from_toolbase
                * unit.isometry_to_meters(&gripper.toolbase_from_tcf)
                * unit.isometry_to_meters(&beam.gripper_tcf_from_beam);
            let grasp = GraspTransform::new(flange_from_beam);

            let frames =
                target_frames_from_movements(&beam.id, &action.movements(beam), &grasp, unit)?;
            if frames.is_empty() {
                warn!("{} has no robotic movement to sample", beam.id);
            }
            if !cache.beam_assembled_poses.contains_key(&beam.id) {
                return Err(Error::MissingTargetFrame {
                    entity: beam.id.clone(),
                    movement: MovementTag::Beam(BeamKeyFrame::Final).to_string(),
                });
            }
            cache.beam_target_frames.insert(beam.id.clone(), frames);
            cache.beam_grasps.insert(beam.id.clone(), grasp);
            cache
                .beam_neighbors
                .insert(beam.id.clone(), process.already_built_neighbors(&beam.id));

            if beam.assembly_method != BeamAssemblyMethod::Clamped {
                continue;
            }
            for joint in process.joints_to_already_built(&beam.id) {
                let joint_id = joint.id();
                let clamp_type = joint.tool_type.as_deref().unwrap_or_default();
                if !process.clamps().any(|c| c.type_name.as_deref() == Some(clamp_type)) {
                    return Err(Error::UnknownToolType {
                        entity: joint_id.to_string(),
                        tool_type: clamp_type.to_owned(),
                    });
                }
                for &operation in &[ClampAction::Attach, ClampAction::Detach] {
                    let frames = target_frames_from_movements(
                        &joint_id.to_string(),
                        &operation.movements(joint),
                        &GraspTransform::new(flange_from_toolbase),
                        unit,
                    )?;
                    cache
                        .clamp_target_frames
                        .insert((operation, joint_id.clone()), frames);
                }
            }
        }
        info!(
            "cached target frames for {} beams and {} clamp joints",
            cache.beam_target_frames.len(),
            cache.clamp_target_frames.len() / 2
        );
        Ok(cache)
    }

    pub fn beam_target_frames(&self, beam_id: &str) -> Result<&[Pose]> {
        self.beam_target_frames
            .get(beam_id)
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::UnknownEntity(beam_id.to_owned()))
    }
    pub fn beam_grasp(&self, beam_id: &str) -> Result<&GraspTransform> {
        self.beam_grasps
            .get(beam_id)
            .ok_or_else(|| Error::UnknownEntity(beam_id.to_owned()))
    }
    /// Pose of the beam once it is in the structure
    pub fn beam_assembled_pose(&self, beam_id: &str) -> Result<&Pose> {
        self.beam_assembled_poses
            .get(beam_id)
            .ok_or_else(|| Error::UnknownEntity(beam_id.to_owned()))
    }
    /// True if `other` is joined to `beam_id` and built before it
    pub fn is_already_built_neighbor(&self, beam_id: &str, other: &str) -> bool {
        self.beam_neighbors
            .get(beam_id)
            .map_or(false, |n| n.contains(other))
    }
    pub fn clamp_target_frames(
        &self,
        operation: ClampAction,
        joint_id: &JointId,
    ) -> Result<&[Pose]> {
        self.clamp_target_frames
            .get(&(operation, joint_id.clone()))
            .map(|v| v.as_slice())
            .ok_or_else(|| Error::UnknownEntity(joint_id.to_string()))
    }
    /// Grasp shared by all clamps, the bare tool changer
    pub fn clamp_grasp(&self) -> Result<&GraspTransform> {
        self.clamp_grasp
            .as_ref()
            .ok_or_else(|| Error::from("frame cache was not built from a process"))
    }
    pub fn has_tool_type(&self, type_name: &str) -> bool {
        self.tool_types.contains(type_name)
    }
}
