//!
//! Layouts of per-corner indexed data as scene attributes, in both directions.
//!
//! Native channels and normals store values plus one index per face corner. Scene attributes
//! attach values to elements chosen by an interpolation (the whole mesh, faces, points or face
//! corners) with an optional index array. [`MappedAttributeBuilder`] picks the most compact scene
//! layout for native data, [`ChannelBuilder`] expands a scene attribute back into per-corner data.
//!

use ahash::AHashMap;

use crate::mesh::channel::MapChannel;
use crate::scene::Interpolation;

/// A scene attribute layout: interpolation, values and optional indices.
#[derive(Clone, Debug, PartialEq)]
pub struct MappedLayout {
    pub interpolation: Interpolation,
    pub values: Vec<[f32; 3]>,
    /// `None` for non-indexed layouts.
    pub indices: Option<Vec<i32>>,
}

impl MappedLayout {
    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Values seen by every face corner, given the vertex of every corner.
    ///
    /// The builder never produces uniform layouts, which would need face indices here.
    pub fn corner_values(&self, vertex_indices: &[i32]) -> Vec<[f32; 3]> {
        vertex_indices
            .iter()
            .enumerate()
            .map(|(c, &v)| {
                let element = match self.interpolation {
                    Interpolation::Constant => 0,
                    Interpolation::Vertex | Interpolation::Varying => v as usize,
                    Interpolation::Uniform | Interpolation::FaceVarying => c,
                };
                let data = match &self.indices {
                    Some(ix) => ix.get(element).map_or(0, |&i| i as usize),
                    None => element,
                };
                self.values.get(data).copied().unwrap_or_default()
            })
            .collect()
    }
}

/// Chooses the scene layout of per-corner data of a mesh with fixed topology.
#[derive(Clone, Debug)]
pub struct MappedAttributeBuilder<'a> {
    vertex_indices: &'a [i32],
    num_vertices: usize,
    force_face_varying: bool,
}

impl<'a> MappedAttributeBuilder<'a> {
    /// `vertex_indices` holds the point index of every exported face corner.
    pub fn new(vertex_indices: &'a [i32], num_vertices: usize) -> Self {
        MappedAttributeBuilder {
            vertex_indices,
            num_vertices,
            force_face_varying: false,
        }
    }

    /// Always produce indexed face-varying layouts. Cheaper layouts are only valid while the
    /// topology stays the same.
    pub fn force_face_varying(mut self, force: bool) -> Self {
        self.force_face_varying = force;
        self
    }

    /// Lay out `values` referenced by one entry of `data_indices` per face corner.
    pub fn build(&self, values: &[[f32; 3]], data_indices: &[usize]) -> MappedLayout {
        let num_corners = self.vertex_indices.len();
        if self.force_face_varying || data_indices.len() != num_corners {
            return face_varying_indexed(values, data_indices);
        }

        if let Some(value) = self.constant_value(values, data_indices) {
            return MappedLayout {
                interpolation: Interpolation::Constant,
                values: vec![value],
                indices: None,
            };
        }

        if values.len() == num_corners {
            return MappedLayout {
                interpolation: Interpolation::FaceVarying,
                values: gather(values, data_indices.iter().copied()),
                indices: None,
            };
        }

        let same_as_vertices = data_indices
            .iter()
            .zip(self.vertex_indices.iter())
            .all(|(&d, &v)| d == v as usize);
        if same_as_vertices {
            return MappedLayout {
                interpolation: Interpolation::Vertex,
                values: gather(values, 0..self.num_vertices),
                indices: None,
            };
        }

        match self.vertex_map(data_indices) {
            Some(map) => {
                let lookup = |v: usize| map.get(&v).copied();
                if values.len() == self.num_vertices {
                    let values = (0..self.num_vertices)
                        .map(|v| lookup(v).and_then(|d| values.get(d).copied()).unwrap_or_default())
                        .collect();
                    MappedLayout {
                        interpolation: Interpolation::Vertex,
                        values,
                        indices: None,
                    }
                } else {
                    let indices = (0..self.num_vertices)
                        .map(|v| lookup(v).unwrap_or(0) as i32)
                        .collect();
                    MappedLayout {
                        interpolation: Interpolation::Vertex,
                        values: values.to_vec(),
                        indices: Some(indices),
                    }
                }
            }
            None => face_varying_indexed(values, data_indices),
        }
    }

    fn constant_value(&self, values: &[[f32; 3]], data_indices: &[usize]) -> Option<[f32; 3]> {
        let mut corners = data_indices.iter().map(|&d| values.get(d));
        let first = corners.next()??;
        corners.all(|v| v == Some(first)).then_some(*first)
    }

    /// The data index of every vertex, if each vertex sees a single data index.
    fn vertex_map(&self, data_indices: &[usize]) -> Option<AHashMap<usize, usize>> {
        let mut map = AHashMap::with_capacity(self.num_vertices);
        for (&v, &d) in self.vertex_indices.iter().zip(data_indices.iter()) {
            let prev = map.entry(v as usize).or_insert(d);
            if *prev != d {
                return None;
            }
        }
        Some(map)
    }
}

fn face_varying_indexed(values: &[[f32; 3]], data_indices: &[usize]) -> MappedLayout {
    MappedLayout {
        interpolation: Interpolation::FaceVarying,
        values: values.to_vec(),
        indices: Some(data_indices.iter().map(|&d| d as i32).collect()),
    }
}

fn gather(values: &[[f32; 3]], indices: impl Iterator<Item = usize>) -> Vec<[f32; 3]> {
    indices.map(|i| values.get(i).copied().unwrap_or_default()).collect()
}

/// A face kept on import: its index on the scene node and the position of its first corner in
/// the node's face-vertex indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeptFace {
    pub src: usize,
    pub first_corner: usize,
    pub degree: usize,
}

/// Expands scene attributes into per-corner data of the faces kept on import.
#[derive(Clone, Debug)]
pub struct ChannelBuilder<'a> {
    num_points: usize,
    num_faces: usize,
    num_corners: usize,
    face_vertex_indices: &'a [i32],
    kept: &'a [KeptFace],
}

impl<'a> ChannelBuilder<'a> {
    /// `face_vertex_indices` and `num_faces` describe the node, `kept` lists the faces that
    /// make up the native mesh, in order.
    pub fn new(num_points: usize, num_faces: usize, face_vertex_indices: &'a [i32], kept: &'a [KeptFace]) -> Self {
        ChannelBuilder {
            num_points,
            num_faces,
            num_corners: face_vertex_indices.len(),
            face_vertex_indices,
            kept,
        }
    }

    /// Number of corners of the native mesh.
    pub fn num_kept_corners(&self) -> usize {
        self.kept.iter().map(|f| f.degree).sum()
    }

    /// Check that the attribute covers its elements and that all indices are in range.
    pub fn validate(
        &self,
        num_values: usize,
        indices: Option<&[i32]>,
        interpolation: Interpolation,
    ) -> Result<(), String> {
        let elements = interpolation.element_count(self.num_points, self.num_faces, self.num_corners);
        match indices {
            Some(ix) => {
                if ix.len() < elements {
                    return Err(format!(
                        "{} indices for {} {:?} elements",
                        ix.len(),
                        elements,
                        interpolation
                    ));
                }
                if let Some(&bad) = ix.iter().find(|&&i| i < 0 || i as usize >= num_values) {
                    return Err(format!("index {} out of range for {} values", bad, num_values));
                }
            }
            None => {
                if num_values < elements {
                    return Err(format!(
                        "{} values for {} {:?} elements",
                        num_values, elements, interpolation
                    ));
                }
            }
        }
        Ok(())
    }

    /// Build per-corner data from scene values, optional indices and interpolation.
    pub fn build(
        &self,
        values: Vec<[f32; 3]>,
        indices: Option<&[i32]>,
        interpolation: Interpolation,
    ) -> Result<MapChannel, String> {
        let indices = indices.filter(|ix| !ix.is_empty());
        self.validate(values.len(), indices, interpolation)?;

        let mut corner_indices = Vec::with_capacity(self.num_kept_corners());
        for face in self.kept {
            for j in 0..face.degree {
                let corner = face.first_corner + j;
                let element = match interpolation {
                    Interpolation::Constant => 0,
                    Interpolation::Uniform => face.src,
                    Interpolation::Vertex | Interpolation::Varying => {
                        self.face_vertex_indices[corner] as usize
                    }
                    Interpolation::FaceVarying => corner,
                };
                let data = match indices {
                    Some(ix) => ix[element] as usize,
                    None => element,
                };
                corner_indices.push(data);
            }
        }

        let mut channel = MapChannel::new(values, corner_indices);
        if self.kept.len() < self.num_faces {
            channel.compact();
        }
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two quads sharing the edge 1-4:
    //  3---4---5
    //  |   |   |
    //  0---1---2
    const VERTS: [i32; 8] = [0, 1, 4, 3, 1, 2, 5, 4];

    fn v(x: f32) -> [f32; 3] {
        [x, 0.0, 0.0]
    }

    #[test]
    fn constant_layout() {
        let builder = MappedAttributeBuilder::new(&VERTS, 6);
        let values = vec![v(1.0), v(1.0), v(2.0)];
        let layout = builder.build(&values, &[0, 1, 0, 1, 0, 0, 1, 1]);
        assert_eq!(layout.interpolation, Interpolation::Constant);
        assert_eq!(layout.values, vec![v(1.0)]);
        assert!(!layout.is_indexed());
    }

    #[test]
    fn face_varying_without_indices() {
        let builder = MappedAttributeBuilder::new(&VERTS, 6);
        let values: Vec<_> = (0..8).map(|i| v(i as f32)).collect();
        let data = [7, 6, 5, 4, 3, 2, 1, 0];
        let layout = builder.build(&values, &data);
        assert_eq!(layout.interpolation, Interpolation::FaceVarying);
        assert!(!layout.is_indexed());
        assert_eq!(layout.values[0], v(7.0));
        assert_eq!(layout.corner_values(&VERTS), gather(&values, data.iter().copied()));
    }

    #[test]
    fn vertex_layouts() {
        let builder = MappedAttributeBuilder::new(&VERTS, 6);
        let values: Vec<_> = (0..6).map(|i| v(i as f32)).collect();
        let data: Vec<usize> = VERTS.iter().map(|&i| i as usize).collect();
        let layout = builder.build(&values, &data);
        assert_eq!(layout.interpolation, Interpolation::Vertex);
        assert_eq!(layout.values, values);
        assert!(!layout.is_indexed());

        // A permutation of the vertices is still a per vertex layout.
        let perm = [5, 4, 3, 2, 1, 0];
        let data: Vec<usize> = VERTS.iter().map(|&i| perm[i as usize]).collect();
        let layout = builder.build(&values, &data);
        assert_eq!(layout.interpolation, Interpolation::Vertex);
        assert!(!layout.is_indexed());
        assert_eq!(layout.values[0], v(5.0));
        assert_eq!(layout.corner_values(&VERTS), gather(&values, data.iter().copied()));

        // Fewer values than vertices needs indices.
        let values = vec![v(0.0), v(1.0), v(2.0)];
        let data: Vec<usize> = VERTS.iter().map(|&i| i as usize % 3).collect();
        let layout = builder.build(&values, &data);
        assert_eq!(layout.interpolation, Interpolation::Vertex);
        assert_eq!(layout.indices, Some(vec![0, 1, 2, 0, 1, 2]));
        assert_eq!(layout.corner_values(&VERTS), gather(&values, data.iter().copied()));
    }

    #[test]
    fn seams_need_face_varying_indices() {
        let builder = MappedAttributeBuilder::new(&VERTS, 6);
        let values: Vec<_> = (0..7).map(|i| v(i as f32)).collect();
        // Vertex 1 and 4 see different values in each face.
        let data = [0, 1, 2, 3, 4, 5, 6, 2];
        let layout = builder.build(&values, &data);
        assert_eq!(layout.interpolation, Interpolation::FaceVarying);
        assert_eq!(layout.indices, Some(vec![0, 1, 2, 3, 4, 5, 6, 2]));
        assert_eq!(layout.corner_values(&VERTS), gather(&values, data.iter().copied()));
    }

    #[test]
    fn forced_layout() {
        let builder = MappedAttributeBuilder::new(&VERTS, 6).force_face_varying(true);
        let layout = builder.build(&[v(1.0)], &[0; 8]);
        assert_eq!(layout.interpolation, Interpolation::FaceVarying);
        assert_eq!(layout.indices, Some(vec![0; 8]));
    }

    fn kept_all() -> Vec<KeptFace> {
        vec![
            KeptFace { src: 0, first_corner: 0, degree: 4 },
            KeptFace { src: 1, first_corner: 4, degree: 4 },
        ]
    }

    #[test]
    fn decode_every_interpolation() {
        let kept = kept_all();
        let builder = ChannelBuilder::new(6, 2, &VERTS, &kept);
        let vals = |n: usize| (0..n).map(|i| v(i as f32)).collect::<Vec<_>>();

        let ch = builder.build(vals(1), None, Interpolation::Constant).unwrap();
        assert_eq!(ch.indices, vec![0; 8]);

        let ch = builder.build(vals(2), None, Interpolation::Uniform).unwrap();
        assert_eq!(ch.indices, vec![0, 0, 0, 0, 1, 1, 1, 1]);

        let ch = builder.build(vals(6), None, Interpolation::Vertex).unwrap();
        assert_eq!(ch.indices, vec![0, 1, 4, 3, 1, 2, 5, 4]);

        let ch = builder
            .build(vals(2), Some(&[1, 0, 0, 0, 0, 1]), Interpolation::Vertex)
            .unwrap();
        assert_eq!(ch.indices, vec![1, 0, 0, 0, 0, 0, 1, 0]);

        let ch = builder.build(vals(8), None, Interpolation::FaceVarying).unwrap();
        assert_eq!(ch.indices, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn decode_rejects_bad_data() {
        let kept = kept_all();
        let builder = ChannelBuilder::new(6, 2, &VERTS, &kept);
        assert!(builder.build(vec![v(0.0); 5], None, Interpolation::Vertex).is_err());
        assert!(builder
            .build(vec![v(0.0); 2], Some(&[0, 1, 2]), Interpolation::FaceVarying)
            .is_err());
        assert!(builder
            .build(vec![v(0.0); 2], Some(&[0, 1, 0, 1, 0, 1, 0, 2]), Interpolation::FaceVarying)
            .is_err());
    }

    #[test]
    fn decode_skipped_faces() {
        // Only the second face is kept.
        let kept = vec![KeptFace { src: 1, first_corner: 4, degree: 4 }];
        let builder = ChannelBuilder::new(6, 2, &VERTS, &kept);
        let values: Vec<_> = (0..8).map(|i| v(i as f32)).collect();
        let ch = builder.build(values, None, Interpolation::FaceVarying).unwrap();
        assert_eq!(ch.num_values(), 4);
        assert_eq!(ch.corner_value(0), Some(v(4.0)));
        assert_eq!(ch.corner_value(3), Some(v(7.0)));
    }
}
