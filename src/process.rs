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
//! Static description of an assembly process
//!
//! This is what the frame/grasp cache reads. Poses here are in the process'
//! `length_unit`, not necessarily metres.
use crate::types::{LengthUnit, Pose};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Gripper,
    Screwdriver,
    Clamp,
}

#[derive(Debug, Clone)]
pub struct Tool {
    pub name: String,
    pub type_name: Option<String>,
    pub kind: ToolKind,
    /// tool changer base (t0cf) from tool center frame
    pub toolbase_from_tcf: Pose,
}

#[derive(Debug, Clone)]
pub struct ToolChanger {
    pub name: String,
    /// robot flange from tool changer base
    pub flange_from_toolbase: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamAssemblyMethod {
    Undefined,
    GroundContact,
    Clamped,
    ScrewedWithGripper,
    ScrewedWithoutGripper,
    ManualAssembly,
}

/// Named beam poses used by the robotic movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BeamKeyFrame {
    InClampApproach,
    InClamp,
    ScrewApproach,
    Final,
}

/// Named clamp poses used by clamp transfer movements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClampKeyFrame {
    AttachApproach,
    Final,
    DetachRetract,
}

#[derive(Debug, Clone)]
pub struct Beam {
    pub id: String,
    pub assembly_method: BeamAssemblyMethod,
    pub gripper_type: Option<String>,
    pub gripper_id: Option<String>,
    pub gripper_tcf_from_beam: Pose,
    /// world_from_beam at each key frame
    pub key_frames: BTreeMap<BeamKeyFrame, Pose>,
    /// movements which already have a taught robot configuration
    pub taught_movements: BTreeSet<BeamKeyFrame>,
}

impl Beam {
    pub fn new(id: &str, assembly_method: BeamAssemblyMethod) -> Self {
        Self {
            id: id.to_owned(),
            assembly_method,
            gripper_type: None,
            gripper_id: None,
            gripper_tcf_from_beam: Pose::identity(),
            key_frames: BTreeMap::new(),
            taught_movements: BTreeSet::new(),
        }
    }
    pub fn gripper(mut self, gripper_type: &str, gripper_id: &str) -> Self {
        self.gripper_type = Some(gripper_type.to_owned());
        self.gripper_id = Some(gripper_id.to_owned());
        self
    }
    pub fn gripper_tcf_from_beam(mut self, pose: Pose) -> Self {
        self.gripper_tcf_from_beam = pose;
        self
    }
    pub fn key_frame(mut self, key: BeamKeyFrame, world_from_beam: Pose) -> Self {
        self.key_frames.insert(key, world_from_beam);
        self
    }
    pub fn taught(mut self, key: BeamKeyFrame) -> Self {
        self.taught_movements.insert(key);
        self
    }
}

/// A joint between an already built neighbor and a beam
#[derive(Debug, Clone)]
pub struct Joint {
    pub neighbor_id: String,
    pub beam_id: String,
    pub tool_type: Option<String>,
    pub tool_id: Option<String>,
    /// world_from_clamp at each key frame
    pub key_frames: BTreeMap<ClampKeyFrame, Pose>,
}

impl Joint {
    pub fn new(neighbor_id: &str, beam_id: &str) -> Self {
        Self {
            neighbor_id: neighbor_id.to_owned(),
            beam_id: beam_id.to_owned(),
            tool_type: None,
            tool_id: None,
            key_frames: BTreeMap::new(),
        }
    }
    pub fn clamp(mut self, tool_type: &str, tool_id: &str) -> Self {
        self.tool_type = Some(tool_type.to_owned());
        self.tool_id = Some(tool_id.to_owned());
        self
    }
    pub fn key_frame(mut self, key: ClampKeyFrame, world_from_clamp: Pose) -> Self {
        self.key_frames.insert(key, world_from_clamp);
        self
    }
    pub fn id(&self) -> JointId {
        JointId::new(&self.neighbor_id, &self.beam_id)
    }
}

/// (already built neighbor, beam)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JointId(pub String, pub String);

impl JointId {
    pub fn new(neighbor_id: &str, beam_id: &str) -> Self {
        JointId(neighbor_id.to_owned(), beam_id.to_owned())
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

#[derive(Debug, Clone)]
pub struct Process {
    pub length_unit: LengthUnit,
    pub toolchanger: ToolChanger,
    pub tools: Vec<Tool>,
    /// beams in assembly sequence order
    pub beams: Vec<Beam>,
    pub joints: Vec<Joint>,
    pub environment_models: Vec<String>,
}

impl Process {
    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }
    pub fn clamps(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter().filter(|t| t.kind == ToolKind::Clamp)
    }
    /// Names of the tools that can be used where `type_name` is required
    pub fn tool_names_of_type(&self, type_name: &str) -> Vec<&str> {
        self.tools
            .iter()
            .filter(|t| t.type_name.as_deref() == Some(type_name))
            .map(|t| t.name.as_str())
            .collect()
    }
    fn sequence_index(&self, beam_id: &str) -> Option<usize> {
        self.beams.iter().position(|b| b.id == beam_id)
    }
    /// Beams sharing a joint with `beam_id` which are assembled before it
    pub fn already_built_neighbors(&self, beam_id: &str) -> BTreeSet<String> {
        let index = match self.sequence_index(beam_id) {
            Some(index) => index,
            None => return BTreeSet::new(),
        };
        self.joints
            .iter()
            .filter_map(|j| {
                if j.beam_id == beam_id {
                    Some(&j.neighbor_id)
                } else if j.neighbor_id == beam_id {
                    Some(&j.beam_id)
                } else {
                    None
                }
            })
            .filter(|other| matches!(self.sequence_index(other), Some(i) if i < index))
            .cloned()
            .collect()
    }
    /// Joints of `beam_id` with its already built neighbors
    pub fn joints_to_already_built(&self, beam_id: &str) -> Vec<&Joint> {
        let neighbors = self.already_built_neighbors(beam_id);
        self.joints
            .iter()
            .filter(|j| j.beam_id == beam_id && neighbors.contains(&j.neighbor_id))
            .collect()
    }
}

/// Tag of one movement inside an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementTag {
    Beam(BeamKeyFrame),
    Clamp(ClampKeyFrame),
    ClampJawClose,
    ScrewdriverTighten,
    ToolChangerLock,
    ToolChangerUnlock,
}

impl fmt::Display for MovementTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementTag::Beam(key) => write!(f, "beam {:?}", key),
            MovementTag::Clamp(key) => write!(f, "clamp {:?}", key),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Movement {
    /// The robot moves the flange; `target` is the entity pose it must reach
    Robotic {
        tag: MovementTag,
        target: Option<Pose>,
        taught: bool,
    },
    /// Something other than the robot moves (clamp jaws, screwdrivers, tool changer)
    Manual { tag: MovementTag },
}

/// Ways of putting a beam into the structure with the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyAction {
    GroundContact,
    Clamped,
    Screwed,
}

impl AssemblyAction {
    /// `None` for beams that are not placed by the robot
    pub fn from_method(method: BeamAssemblyMethod) -> Option<Self> {
        match method {
            BeamAssemblyMethod::GroundContact => Some(AssemblyAction::GroundContact),
            BeamAssemblyMethod::Clamped => Some(AssemblyAction::Clamped),
            BeamAssemblyMethod::ScrewedWithGripper | BeamAssemblyMethod::ScrewedWithoutGripper => {
                Some(AssemblyAction::Screwed)
            }
            BeamAssemblyMethod::ManualAssembly | BeamAssemblyMethod::Undefined => None,
        }
    }

    fn sequence(self) -> &'static [MovementTag] {
        use BeamKeyFrame::*;
        match self {
            AssemblyAction::GroundContact => {
                &[MovementTag::Beam(InClampApproach), MovementTag::Beam(Final)]
            }
            AssemblyAction::Clamped => &[
                MovementTag::Beam(InClampApproach),
                MovementTag::Beam(InClamp),
                MovementTag::ClampJawClose,
                MovementTag::Beam(Final),
            ],
            AssemblyAction::Screwed => &[
                MovementTag::Beam(ScrewApproach),
                MovementTag::ScrewdriverTighten,
                MovementTag::Beam(Final),
            ],
        }
    }

    pub fn movements(self, beam: &Beam) -> Vec<Movement> {
        self.sequence()
            .iter()
            .map(|tag| match tag {
                MovementTag::Beam(key) => Movement::Robotic {
                    tag: *tag,
                    target: beam.key_frames.get(key).copied(),
                    taught: beam.taught_movements.contains(key),
                },
                _ => Movement::Manual { tag: *tag },
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClampAction {
    Attach,
    Detach,
}

impl ClampAction {
    fn sequence(self) -> &'static [MovementTag] {
        use ClampKeyFrame::*;
        match self {
            ClampAction::Attach => &[
                MovementTag::Clamp(AttachApproach),
                MovementTag::Clamp(Final),
                MovementTag::ToolChangerUnlock,
            ],
            ClampAction::Detach => &[
                MovementTag::ToolChangerLock,
                MovementTag::Clamp(Final),
                MovementTag::Clamp(DetachRetract),
            ],
        }
    }

    pub fn movements(self, joint: &Joint) -> Vec<Movement> {
        self.sequence()
            .iter()
            .map(|tag| match tag {
                MovementTag::Clamp(key) => Movement::Robotic {
                    tag: *tag,
                    target: joint.key_frames.get(key).copied(),
                    taught: false,
                },
                _ => Movement::Manual { tag: *tag },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_with_joints() -> Process {
        Process {
            length_unit: LengthUnit::Millimeter,
            toolchanger: ToolChanger {
                name: "tc".to_owned(),
                flange_from_toolbase: Pose::identity(),
            },
            tools: vec![],
            beams: vec![
                Beam::new("b0", BeamAssemblyMethod::ManualAssembly),
                Beam::new("b1", BeamAssemblyMethod::GroundContact),
                Beam::new("b2", BeamAssemblyMethod::Clamped),
            ],
            joints: vec![Joint::new("b0", "b2"), Joint::new("b1", "b2"), Joint::new("b0", "b1")],
            environment_models: vec![],
        }
    }

    #[test]
    fn test_already_built_neighbors() {
        let process = process_with_joints();
        let n2 = process.already_built_neighbors("b2");
        assert_eq!(n2.into_iter().collect::<Vec<_>>(), vec!["b0", "b1"]);
        let n0 = process.already_built_neighbors("b0");
        assert!(n0.is_empty());
        assert!(process.already_built_neighbors("missing").is_empty());
        assert_eq!(process.joints_to_already_built("b2").len(), 2);
    }

    #[test]
    fn test_movements_follow_action_variant() {
        let beam = Beam::new("b2", BeamAssemblyMethod::Clamped)
            .key_frame(BeamKeyFrame::InClampApproach, Pose::identity())
            .key_frame(BeamKeyFrame::Final, Pose::identity())
            .taught(BeamKeyFrame::Final);
        let action = AssemblyAction::from_method(beam.assembly_method).unwrap();
        let movements = action.movements(&beam);
        assert_eq!(movements.len(), 4);
        assert!(matches!(
            movements[1],
            Movement::Robotic { target: None, .. }
        ));
        assert!(matches!(movements[2], Movement::Manual { .. }));
        assert!(matches!(movements[3], Movement::Robotic { taught: true, .. }));
        assert_eq!(AssemblyAction::from_method(BeamAssemblyMethod::ManualAssembly), None);
        assert_eq!(
            AssemblyAction::from_method(BeamAssemblyMethod::ScrewedWithoutGripper),
            Some(AssemblyAction::Screwed)
        );
    }
}
