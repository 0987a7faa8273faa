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
//! Collision world abstraction, scene guard and the `ncollide3d` backed world

mod collision_checker;
pub use collision_checker::*;

mod kinematic_world;
pub use kinematic_world::*;

mod scene_guard;
pub use scene_guard::*;

mod urdf;
pub use self::urdf::*;

mod world;
pub use world::*;
