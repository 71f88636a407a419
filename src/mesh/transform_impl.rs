//!
//! This module implements the transform ops from `scenemesh::ops::transform` for native meshes.
//!

use super::{PolyMesh, TriMesh};
use crate::ops::transform::*;

use math::Matrix4;

macro_rules! impl_transform {
    ($mesh:ty) => {
        impl Transform for $mesh {
            /// Transform positions as points and specified normals as directions.
            fn transform(&mut self, mtx: &Matrix4<f32>) {
                for p in self.vertex_positions.iter_mut() {
                    *p = transform_point(mtx, *p);
                }
                if let Some(nmls) = self.normals.as_mut() {
                    let nml_mtx = normal_matrix(mtx);
                    for n in nmls.normals.iter_mut() {
                        *n = transform_normal(&nml_mtx, *n);
                    }
                }
            }
        }
    };
}

impl_transform!(TriMesh);
impl_transform!(PolyMesh);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::SpecifiedNormals;
    use crate::ops::*;
    use approx::*;
    use math::Vector3;

    #[test]
    fn rotate_quad() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let mut quad = PolyMesh::new(points, &[4, 0, 1, 2, 3]);
        quad.normals = Some(SpecifiedNormals::new(vec![[0.0, 0.0, 1.0]], vec![0; 4]));

        let rot = Matrix4::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        let quad = quad.transformed(&rot);
        let bbox = quad.bounding_box();

        let minb = bbox.min_corner();
        let maxb = bbox.max_corner();
        assert_relative_eq!(minb[2], -1.0, epsilon = 1e-6);
        assert_relative_eq!(maxb[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(maxb[0], 0.0, epsilon = 1e-6);

        let n = quad.normals.as_ref().unwrap().normals[0];
        assert_relative_eq!(n[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn translate_triangles() {
        let mesh = TriMesh::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], vec![[0, 1, 2]]);
        let mesh = mesh.transformed(&Matrix4::new_translation(&Vector3::new(0.0, 0.0, 5.0)));
        assert!(mesh.vertex_positions.iter().all(|p| p[2] == 5.0));
    }
}
