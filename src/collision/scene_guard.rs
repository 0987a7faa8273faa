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
use super::world::CollisionWorld;
use crate::errors::*;
use crate::types::{GraspTransform, Pose, RobotConfiguration};
use log::*;
use std::ops::{Deref, DerefMut};

#[derive(Debug)]
enum Undo {
    Detach(String),
    EnableCollision(String, String),
    SetPose(String, Pose),
    SetConfiguration(RobotConfiguration),
}

/// Scoped access to a [`CollisionWorld`]
///
/// Mutations made through the guard are recorded and undone in reverse order
/// when the guard is dropped, on success, early return or error alike.
/// Queries go through `Deref`.
pub struct SceneGuard<'a, W>
where
    W: CollisionWorld + ?Sized,
{
    world: &'a mut W,
    undo: Vec<Undo>,
}

impl<'a, W> SceneGuard<'a, W>
where
    W: CollisionWorld + ?Sized,
{
    pub fn new(world: &'a mut W) -> Self {
        Self {
            world,
            undo: Vec::new(),
        }
    }
    pub fn attach(&mut self, flange_link: &str, body: &str, grasp: &GraspTransform) -> Result<()> {
        self.world.attach(flange_link, body, grasp)?;
        self.undo.push(Undo::Detach(body.to_owned()));
        Ok(())
    }
    /// Attached bodies follow the flange, so moving one is an error
    pub fn set_pose(&mut self, body: &str, pose: &Pose) -> Result<()> {
        if self.world.is_attached(body) {
            return Err(Error::AlreadyAttached(body.to_owned()));
        }
        let previous = self.world.body_pose(body)?;
        self.world.set_pose(body, pose)?;
        self.undo.push(Undo::SetPose(body.to_owned(), previous));
        Ok(())
    }
    pub fn disable_collision(&mut self, a: &str, b: &str) -> Result<()> {
        if self.world.disable_collision(a, b)? {
            self.undo
                .push(Undo::EnableCollision(a.to_owned(), b.to_owned()));
        }
        Ok(())
    }
    /// Restore the current robot configuration when the guard is dropped
    pub fn save_configuration(&mut self) {
        let configuration = self.world.configuration();
        self.undo.push(Undo::SetConfiguration(configuration));
    }
    /// Number of mutations which will be undone
    pub fn num_pending(&self) -> usize {
        self.undo.len()
    }
}

impl<'a, W> Deref for SceneGuard<'a, W>
where
    W: CollisionWorld + ?Sized,
{
    type Target = W;
    fn deref(&self) -> &W {
        &*self.world
    }
}

impl<'a, W> DerefMut for SceneGuard<'a, W>
where
    W: CollisionWorld + ?Sized,
{
    fn deref_mut(&mut self) -> &mut W {
        &mut *self.world
    }
}

impl<'a, W> Drop for SceneGuard<'a, W>
where
    W: CollisionWorld + ?Sized,
{
    fn drop(&mut self) {
        while let Some(undo) = self.undo.pop() {
            let result = match &undo {
                Undo::Detach(body) => self.world.detach(body),
                Undo::EnableCollision(a, b) => self.world.enable_collision(a, b),
                Undo::SetPose(body, pose) => self.world.set_pose(body, pose),
                Undo::SetConfiguration(configuration) => {
                    self.world.set_configuration(configuration)
                }
            };
            if let Err(err) = result {
                error!("failed to restore scene ({:?}): {}", undo, err);
            }
        }
    }
}
