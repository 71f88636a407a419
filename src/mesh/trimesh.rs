//!
//! Triangle mesh module. The triangulated native encoding stores exactly three corners per face
//! and carries no edge list, hence no crease data.
//!

use std::collections::BTreeMap;

use super::channel::{ChannelId, MapChannel};
use super::normals::SpecifiedNormals;
use super::topology::*;
use super::vertex_positions::VertexPositions;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mesh of triangles.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriMesh {
    pub vertex_positions: Vec<[f32; 3]>,
    /// Triples of indices into `vertex_positions`.
    pub indices: Vec<[usize; 3]>,
    /// Material id of each face.
    pub face_materials: Vec<u16>,
    pub normals: Option<SpecifiedNormals>,
    pub channels: BTreeMap<ChannelId, MapChannel>,
}

impl TriMesh {
    /// Construct a `TriMesh` from vertex positions and triangles. All faces get material 0.
    ///
    /// # Examples
    /// ```
    /// use scenemesh::mesh::TriMesh;
    /// use scenemesh::mesh::topology::*;
    /// let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    /// let mesh = TriMesh::new(points, vec![[0, 1, 2], [1, 3, 2]]);
    ///
    /// assert_eq!(mesh.num_faces(), 2);
    /// assert_eq!(mesh.num_face_vertices(), 6);
    /// ```
    pub fn new(vertex_positions: Vec<[f32; 3]>, indices: Vec<[usize; 3]>) -> TriMesh {
        TriMesh {
            vertex_positions,
            face_materials: vec![0; indices.len()],
            indices,
            normals: None,
            channels: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn face_iter(&self) -> std::slice::Iter<[usize; 3]> {
        self.indices.iter()
    }

    #[inline]
    pub fn face_material(&self, fidx: usize) -> u16 {
        self.face_materials.get(fidx).copied().unwrap_or(0)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&MapChannel> {
        self.channels.get(&id)
    }

    pub fn set_channel(&mut self, id: ChannelId, channel: MapChannel) {
        self.channels.insert(id, channel);
    }

    /// Keep only the faces for which `keep` returns `true`, carrying materials, normal indices
    /// and channel indices along. Returns the number of removed faces.
    pub fn retain_faces<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&[usize; 3]) -> bool,
    {
        let mask: Vec<bool> = self.indices.iter().map(|tri| keep(tri)).collect();
        let removed = mask.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        let filter_corners = |corner_data: &mut Vec<usize>| {
            let kept = corner_data
                .chunks(3)
                .zip(mask.iter())
                .filter(|(_, k)| **k)
                .flat_map(|(c, _)| c.iter().copied())
                .collect();
            *corner_data = kept;
        };

        for ch in self.channels.values_mut() {
            filter_corners(&mut ch.indices);
        }
        if let Some(nmls) = self.normals.as_mut() {
            filter_corners(&mut nmls.indices);
        }

        let mut face_materials = Vec::with_capacity(mask.len() - removed);
        let mut indices = Vec::with_capacity(mask.len() - removed);
        for (fidx, tri) in self.indices.iter().enumerate() {
            if mask[fidx] {
                indices.push(*tri);
                face_materials.push(self.face_material(fidx));
            }
        }
        self.indices = indices;
        self.face_materials = face_materials;
        removed
    }

    /// Whether any face is degenerate or references vertices out of range.
    pub fn has_invalid_faces(&self) -> bool {
        let n = self.vertex_positions.len();
        self.indices
            .iter()
            .any(|&[a, b, c]| a == b || b == c || c == a || a >= n || b >= n || c >= n)
    }

    /// Remove faces that reference the same vertex more than once.
    pub fn remove_degenerate_faces(&mut self) -> usize {
        self.retain_faces(|&[a, b, c]| a != b && b != c && c != a)
    }

    /// Remove faces that reference vertices out of range.
    pub fn remove_illegal_faces(&mut self) -> usize {
        let n = self.vertex_positions.len();
        self.retain_faces(|tri| tri.iter().all(|&v| v < n))
    }
}

impl NumVertices for TriMesh {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }
}

impl NumFaces for TriMesh {
    #[inline]
    fn num_faces(&self) -> usize {
        self.indices.len()
    }
}

impl FaceVertex for TriMesh {
    #[inline]
    fn vertex<FVI>(&self, fv_idx: FVI) -> VertexIndex
    where
        FVI: Copy + Into<FaceVertexIndex>,
    {
        let fv_idx = usize::from(fv_idx.into());
        debug_assert!(fv_idx < self.num_face_vertices());
        self.indices[fv_idx / 3][fv_idx % 3].into()
    }

    #[inline]
    fn face_vertex<FI>(&self, fidx: FI, which: usize) -> Option<FaceVertexIndex>
    where
        FI: Copy + Into<FaceIndex>,
    {
        if which >= 3 {
            None
        } else {
            let fidx = usize::from(fidx.into());
            debug_assert!(fidx < self.num_faces());
            Some((3 * fidx + which).into())
        }
    }

    #[inline]
    fn num_face_vertices(&self) -> usize {
        self.indices.len() * 3
    }

    #[inline]
    fn num_vertices_at_face<FI>(&self, _: FI) -> usize
    where
        FI: Copy + Into<FaceIndex>,
    {
        3
    }
}

impl VertexPositions for TriMesh {
    #[inline]
    fn vertex_positions(&self) -> &[[f32; 3]] {
        &self.vertex_positions
    }
    #[inline]
    fn vertex_positions_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.vertex_positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> TriMesh {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let mut mesh = TriMesh::new(points, vec![[0, 1, 2], [1, 1, 2], [1, 3, 2], [1, 3, 7]]);
        mesh.face_materials = vec![0, 1, 2, 3];
        let uv = MapChannel::new(
            (0..12).map(|i| [i as f32, 0.0, 0.0]).collect(),
            (0..12).collect(),
        );
        mesh.set_channel(1, uv);
        mesh
    }

    #[test]
    fn trimesh_topology() {
        let mesh = sample_mesh();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(usize::from(mesh.face_to_vertex(2, 1).unwrap()), 3);
        assert!(mesh.face_vertex(0, 3).is_none());
    }

    #[test]
    fn cleanup_keeps_per_corner_data_aligned() {
        let mut mesh = sample_mesh();
        assert_eq!(mesh.remove_degenerate_faces(), 1);
        assert_eq!(mesh.remove_illegal_faces(), 1);
        assert_eq!(mesh.indices, vec![[0, 1, 2], [1, 3, 2]]);
        assert_eq!(mesh.face_materials, vec![0, 2]);
        assert_eq!(mesh.channel(1).unwrap().indices, vec![0, 1, 2, 6, 7, 8]);
    }
}
