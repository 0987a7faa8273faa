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
use log::*;
use nalgebra as na;
use ncollide3d::shape::{Ball, ConvexHull, Cuboid, ShapeHandle};
use std::f64::consts::PI;

const CYLINDER_SEGMENTS: usize = 16;

/// Shape and its pose in the link frame
pub type LocalShape = (ShapeHandle<f64>, na::Isometry3<f64>);

/// Convert a URDF collision element into an ncollide shape
///
/// Meshes are not loaded, links with mesh collision geometry are left without
/// a collision model. Cylinders become convex hulls.
pub fn urdf_collision_to_shape_handle(collision: &urdf_rs::Collision) -> Option<LocalShape> {
    let origin: na::Isometry3<f64> = k::urdf::isometry_from(&collision.origin);
    match collision.geometry {
        urdf_rs::Geometry::Box { ref size } => {
            let cube = Cuboid::new(na::Vector3::new(size[0] * 0.5, size[1] * 0.5, size[2] * 0.5));
            Some((ShapeHandle::new(cube), origin))
        }
        urdf_rs::Geometry::Cylinder { radius, length } => {
            let hull = cylinder_hull(radius, length);
            if hull.is_none() {
                warn!("failed to build a hull of cylinder r={}, l={}", radius, length);
            }
            hull.map(|hull| (ShapeHandle::new(hull), origin))
        }
        urdf_rs::Geometry::Sphere { radius } => Some((ShapeHandle::new(Ball::new(radius)), origin)),
        ref geometry => {
            warn!("collision geometry {:?} is not supported", geometry);
            None
        }
    }
}

/// Hull of the two end circles, axis along z as in URDF
///
/// ncollide cylinders have no distance query.
fn cylinder_hull(radius: f64, length: f64) -> Option<ConvexHull<f64>> {
    let half = length * 0.5;
    let points = (0..CYLINDER_SEGMENTS)
        .flat_map(|i| {
            let angle = 2.0 * PI * i as f64 / CYLINDER_SEGMENTS as f64;
            let (x, y) = (radius * angle.cos(), radius * angle.sin());
            vec![na::Point3::new(x, y, -half), na::Point3::new(x, y, half)]
        })
        .collect::<Vec<_>>();
    ConvexHull::try_from_points(&points)
}
