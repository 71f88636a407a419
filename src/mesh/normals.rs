/*!
 * Explicitly specified normals and the routines that generate them when a mesh has none.
 */

use crate::prim::{polygon, Triangle};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use math::Vector3;

/// Normals with their own per-corner index set.
///
/// Like map channels, `indices` holds one entry per face corner of the owning mesh.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpecifiedNormals {
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<usize>,
}

impl SpecifiedNormals {
    pub fn new(normals: Vec<[f32; 3]>, indices: Vec<usize>) -> Self {
        SpecifiedNormals { normals, indices }
    }

    /// Check that the normals cover `num_corners` corners and every index is in range.
    pub fn is_consistent(&self, num_corners: usize) -> bool {
        self.indices.len() == num_corners && self.indices.iter().all(|&i| i < self.normals.len())
    }
}

/// Accumulate area weighted face normals at the vertices of the given faces.
pub fn compute_vertex_area_weighted_normals<'a, F>(
    vertex_positions: &[[f32; 3]],
    faces: F,
    normals: &mut [[f32; 3]],
) where
    F: IntoIterator<Item = &'a [usize]>,
{
    // Clear the normals.
    for nml in normals.iter_mut() {
        *nml = [0.0; 3];
    }

    for face in faces {
        let area_nml = if face.len() == 3 {
            Vector3::from(
                Triangle::<f32>::from_indexed_slice(&[face[0], face[1], face[2]], vertex_positions)
                    .area_normal(),
            )
        } else {
            polygon::newell_normal(vertex_positions, face)
        };
        for &v in face {
            normals[v] = (Vector3::from(normals[v]) + area_nml).into();
        }
    }

    for nml in normals.iter_mut() {
        if let Some(n) = Vector3::from(*nml).try_normalize(0.0) {
            *nml = n.into();
        }
    }
}

/// Generate smooth vertex normals for the given faces, indexed per corner by vertex.
pub fn generate_smooth_normals<'a, F>(vertex_positions: &[[f32; 3]], faces: F) -> SpecifiedNormals
where
    F: IntoIterator<Item = &'a [usize]> + Clone,
{
    let mut normals = vec![[0.0; 3]; vertex_positions.len()];
    compute_vertex_area_weighted_normals(vertex_positions, faces.clone(), &mut normals);
    let indices = faces.into_iter().flat_map(|f| f.iter().copied()).collect();
    SpecifiedNormals { normals, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::*;

    #[test]
    fn flat_quad_normals_point_up() {
        let pts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        let faces: Vec<&[usize]> = vec![&[0, 1, 2], &[0, 2, 3]];
        let nmls = generate_smooth_normals(&pts, faces.iter().copied());
        assert_eq!(nmls.indices, vec![0, 1, 2, 0, 2, 3]);
        assert!(nmls.is_consistent(6));
        for n in &nmls.normals {
            assert_relative_eq!(n[2], 1.0);
        }
    }
}
