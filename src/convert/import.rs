//!
//! Scene mesh node to native polygon mesh.
//!

use std::collections::{BTreeMap, BTreeSet};

use crate::mesh::channel::ChannelId;
use crate::mesh::topology::NumFaces;
use crate::mesh::{PolyMesh, SpecifiedNormals};
use crate::scene::{MeshNode, Orientation, TimeCode};

use super::crease;
use super::diagnostics::Diagnostics;
use super::mapped::{ChannelBuilder, KeptFace};
use super::options::ImportOptions;
use super::resolve::resolve_channels;
use super::Error;

/// Key of the material id in node and subset custom data. Ids are stored 1-based.
pub const MATERIAL_ID_KEY: &str = "matId";

/// Material slots of an imported mesh with more than one face subset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultiMaterial {
    /// Subset name of every material id.
    pub slots: BTreeMap<u16, String>,
}

#[derive(Clone, Debug)]
pub struct ImportResult {
    pub mesh: PolyMesh,
    /// Attribute each channel of `mesh` was read from.
    pub channel_names: BTreeMap<ChannelId, String>,
    pub multi_material: Option<MultiMaterial>,
    pub diagnostics: Diagnostics,
    /// Number of vertices removed because no face used them.
    pub removed_vertices: usize,
}

/// Builds native polygon meshes from scene mesh nodes.
#[derive(Clone, Debug)]
pub struct MeshImporter<'a> {
    options: &'a ImportOptions,
}

/// Convert a 1-based material id from the scene into a native one.
fn material_from_tag(tag: i32) -> u16 {
    (tag - 1).clamp(0, u16::MAX as i32) as u16
}

impl<'a> MeshImporter<'a> {
    pub fn new(options: &'a ImportOptions) -> Self {
        MeshImporter { options }
    }

    /// Read the node at `time` into a polygon mesh.
    ///
    /// Fails only when the node has no usable geometry or its face arrays disagree. Faces with
    /// fewer than 3 corners or out of range point indices are dropped, and every other problem
    /// is recorded in the returned diagnostics.
    pub fn import(&self, node: &MeshNode, time: TimeCode) -> Result<ImportResult, Error> {
        let path = node.path().to_string();
        let mut diags = Diagnostics::new(path.clone());
        let empty = |reason| Error::EmptyGeometry {
            path: path.clone(),
            reason,
        };

        let points = node.points.get(time).filter(|p| !p.is_empty()).ok_or_else(|| empty("no points"))?;
        let counts = node
            .face_vertex_counts
            .get(time)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| empty("no faces"))?;
        let fv_indices = node
            .face_vertex_indices
            .get(time)
            .filter(|i| !i.is_empty())
            .ok_or_else(|| empty("no face vertex indices"))?;

        let counted: i64 = counts.iter().map(|&n| n as i64).sum();
        if counts.iter().any(|&n| n < 0) || counted != fv_indices.len() as i64 {
            return Err(Error::TopologyMismatch {
                path: path.clone(),
                counted: counted.max(0) as usize,
                indices: fv_indices.len(),
            });
        }

        // Keep faces with at least 3 corners referring to existing points.
        let mut kept = Vec::with_capacity(counts.len());
        let mut degrees = Vec::with_capacity(counts.len());
        let mut indices = Vec::with_capacity(fv_indices.len());
        let mut first_corner = 0;
        for (src, &n) in counts.iter().enumerate() {
            let n = n as usize;
            let face = &fv_indices[first_corner..first_corner + n];
            let valid = n >= 3 && face.iter().all(|&v| v >= 0 && (v as usize) < points.len());
            if valid {
                kept.push(KeptFace {
                    src,
                    first_corner,
                    degree: n,
                });
                degrees.push(n);
                indices.extend(face.iter().map(|&v| v as usize));
            }
            first_corner += n;
        }
        if kept.is_empty() {
            return Err(empty("no face with at least 3 valid corners"));
        }
        if kept.len() < counts.len() {
            diags.shape(
                Some("faceVertexCounts"),
                format!(
                    "skipped {} faces with fewer than 3 corners or invalid point indices",
                    counts.len() - kept.len()
                ),
            );
        }

        let mut mesh = PolyMesh::from_face_counts(points.clone(), &degrees, indices);
        let builder = ChannelBuilder::new(points.len(), counts.len(), fv_indices, &kept);

        self.read_normals(node, time, &builder, &mut mesh, &mut diags);

        let mut channel_names = BTreeMap::new();
        for (id, name) in resolve_channels(node, self.options, &mut diags) {
            let Some(pv) = node.primvar(&name) else {
                continue;
            };
            let Some(values) = pv.values.get(time) else {
                diags.shape(Some(name.as_str()), "no values at this time");
                continue;
            };
            let dim = pv.ty.dim;
            if dim == 4 {
                diags.info(Some(name.as_str()), "dropping the 4th component");
            }
            let Some(tuples) = values.to_tuples(dim) else {
                diags.type_mismatch(&name, format!("{} values are not numeric", pv.ty.name()));
                continue;
            };
            let ix = pv.indices.get(time).map(Vec::as_slice);
            match builder.build(tuples, ix, pv.interpolation) {
                Ok(channel) => {
                    mesh.set_channel(id, channel);
                    channel_names.insert(id, name);
                }
                Err(msg) => diags.shape(Some(name.as_str()), msg),
            }
        }

        let multi_material = self.read_materials(node, time, &kept, &mut mesh, &mut diags);

        if let (Some(ix), Some(s)) = (node.corner_indices.get(time), node.corner_sharpnesses.get(time)) {
            crease::apply_corner_creases(&mut mesh, ix, s, &mut diags);
        }
        if let (Some(ix), Some(len), Some(s)) = (
            node.crease_indices.get(time),
            node.crease_lengths.get(time),
            node.crease_sharpnesses.get(time),
        ) {
            crease::apply_edge_creases(&mut mesh, ix, len, s, &mut diags);
        }

        if node.orientation == Orientation::LeftHanded {
            mesh.reverse();
        }

        let mut removed_vertices = 0;
        if self.options.clean_mesh {
            removed_vertices = mesh.remove_unused_vertices();
            if removed_vertices > 0 {
                diags.shape(
                    Some("points"),
                    format!("removed {} points not used by any face", removed_vertices),
                );
            }
        }

        log::trace!(
            "{}: imported {} faces, {} vertices, {} channels",
            node.path(),
            mesh.num_faces(),
            mesh.vertex_positions.len(),
            channel_names.len()
        );

        Ok(ImportResult {
            mesh,
            channel_names,
            multi_material,
            diagnostics: diags,
            removed_vertices,
        })
    }

    /// Normals from the `normals` attribute, or else from the plain normals of the node.
    fn read_normals(
        &self,
        node: &MeshNode,
        time: TimeCode,
        builder: &ChannelBuilder,
        mesh: &mut PolyMesh,
        diags: &mut Diagnostics,
    ) {
        let decoded = if let Some(pv) = node.primvar("normals").filter(|pv| pv.values.get(time).is_some()) {
            let Some(values) = pv.values.get(time).and_then(|v| v.to_tuples(3)) else {
                diags.type_mismatch("normals", "normals are not numeric");
                return;
            };
            let ix = pv.indices.get(time).map(Vec::as_slice);
            builder.build(values, ix, pv.interpolation)
        } else if let Some(values) = node.normals.get(time) {
            builder.build(values.clone(), None, node.normals_interpolation)
        } else {
            return;
        };
        match decoded {
            Ok(ch) => mesh.normals = Some(SpecifiedNormals::new(ch.values, ch.indices)),
            Err(msg) => diags.shape(Some("normals"), msg),
        }
    }

    /// Assign face materials from the node id or the face subsets.
    fn read_materials(
        &self,
        node: &MeshNode,
        time: TimeCode,
        kept: &[KeptFace],
        mesh: &mut PolyMesh,
        diags: &mut Diagnostics,
    ) -> Option<MultiMaterial> {
        if let Some(&tag) = node.custom_data.get(MATERIAL_ID_KEY) {
            mesh.face_materials.iter_mut().for_each(|m| *m = material_from_tag(tag));
            return None;
        }
        if node.subsets.is_empty() {
            return None;
        }

        // Subsets without an id take the lowest ids nobody else uses.
        let mut used: BTreeSet<u16> = node
            .subsets
            .values()
            .filter_map(|s| s.custom_data.get(MATERIAL_ID_KEY))
            .map(|&tag| material_from_tag(tag))
            .collect();
        let mut kept_index = vec![None; kept.iter().map(|f| f.src + 1).max().unwrap_or(0)];
        for (k, f) in kept.iter().enumerate() {
            kept_index[f.src] = Some(k);
        }

        let mut next_free = 0u16;
        let mut slots = BTreeMap::new();
        for (name, subset) in node.subsets.iter() {
            let id = match subset.custom_data.get(MATERIAL_ID_KEY) {
                Some(&tag) => material_from_tag(tag),
                None => {
                    while used.contains(&next_free) {
                        next_free += 1;
                    }
                    used.insert(next_free);
                    next_free
                }
            };
            // Subsets sharing an id share the slot of the first one.
            slots.entry(id).or_insert_with(|| name.clone());

            let Some(faces) = subset.indices.get(time) else {
                continue;
            };
            let mut skipped = 0;
            for &f in faces {
                let k = usize::try_from(f).ok().and_then(|f| kept_index.get(f).copied().flatten());
                match k {
                    Some(k) => mesh.face_materials[k] = id,
                    None => skipped += 1,
                }
            }
            if skipped > 0 {
                diags.shape(Some(name.as_str()), format!("{} face indices do not name imported faces", skipped));
            }
        }

        (node.subsets.len() > 1).then_some(MultiMaterial { slots })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DiagnosticKind;
    use crate::scene::{ArrayValue, Interpolation, NodePath, ValueType};

    const T: TimeCode = TimeCode::Default;

    // Two quads sharing the edge 1-4, plus an unused point.
    fn strip_node() -> MeshNode {
        let mut node = MeshNode::new(NodePath::new("/strip").unwrap());
        node.points.set(
            T,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 1.0, 0.0],
                [2.0, 1.0, 0.0],
                [9.0, 9.0, 9.0],
            ],
        );
        node.face_vertex_counts.set(T, vec![4, 4]);
        node.face_vertex_indices.set(T, vec![0, 1, 4, 3, 1, 2, 5, 4]);
        node
    }

    #[test]
    fn basic_import() {
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&strip_node(), T).unwrap();
        assert_eq!(result.mesh.num_faces(), 2);
        assert_eq!(result.mesh.indices, vec![0, 1, 4, 3, 1, 2, 5, 4]);
        assert_eq!(result.removed_vertices, 1);
        assert_eq!(result.mesh.vertex_positions.len(), 6);
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.multi_material.is_none());
    }

    #[test]
    fn hard_failures() {
        let opts = ImportOptions::default();
        let importer = MeshImporter::new(&opts);

        let empty = MeshNode::new(NodePath::new("/empty").unwrap());
        assert!(matches!(importer.import(&empty, T), Err(Error::EmptyGeometry { .. })));

        let mut node = strip_node();
        node.face_vertex_counts.set(T, vec![4, 3]);
        assert!(matches!(importer.import(&node, T), Err(Error::TopologyMismatch { .. })));

        let mut node = strip_node();
        node.face_vertex_counts.set(T, vec![2, 2, 2, 2]);
        assert!(matches!(importer.import(&node, T), Err(Error::EmptyGeometry { .. })));
    }

    #[test]
    fn degenerate_faces_are_skipped() {
        let mut node = strip_node();
        node.face_vertex_counts.set(T, vec![4, 2, 2]);
        node.face_vertex_indices.set(T, vec![0, 1, 4, 3, 1, 2, 5, 40]);
        let st = node.primvar_mut("st", ValueType::TEXCOORD2F, Interpolation::Uniform);
        st.values.set(T, ArrayValue::Float(vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]));
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        assert_eq!(result.mesh.num_faces(), 1);
        assert_eq!(result.channel_names[&1], "st");
        let ch = result.mesh.channel(1).unwrap();
        assert_eq!(ch.corner_value(2), Some([0.0, 0.0, 0.0]));
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::Shape).count(), 2);
    }

    #[test]
    fn left_handed_flips_corners() {
        let mut node = strip_node();
        node.orientation = Orientation::LeftHanded;
        let st = node.primvar_mut("st", ValueType::TEXCOORD2F, Interpolation::FaceVarying);
        st.values.set(T, ArrayValue::Float((0..16).map(|i| i as f32).collect()));
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        assert_eq!(result.mesh.face(0), &[3, 4, 1, 0]);
        let ch = result.mesh.channel(1).unwrap();
        // The first corner now is the last authored corner of the face.
        assert_eq!(ch.corner_value(0), Some([6.0, 7.0, 0.0]));
    }

    #[test]
    fn primvar_normals_win() {
        let mut node = strip_node();
        node.normals.set(T, vec![[1.0, 0.0, 0.0]; 7]);
        let nml = node.primvar_mut("normals", ValueType::NORMAL3F, Interpolation::Constant);
        nml.values.set(T, ArrayValue::Float(vec![0.0, 0.0, 1.0]));
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        let normals = result.mesh.normals.unwrap();
        assert_eq!(normals.normals, vec![[0.0, 0.0, 1.0]]);
        assert_eq!(normals.indices, vec![0; 8]);
    }

    #[test]
    fn subsets_assign_materials() {
        let mut node = strip_node();
        let a = node.subset_mut("a");
        a.indices.set(T, vec![1]);
        a.custom_data.insert(MATERIAL_ID_KEY.to_string(), 1);
        // No id: takes the lowest free one, which is 1 since 0 is taken by "a".
        node.subset_mut("b").indices.set(T, vec![0, 7]);
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        assert_eq!(result.mesh.face_materials, vec![1, 0]);
        let multi = result.multi_material.unwrap();
        assert_eq!(multi.slots[&0], "a");
        assert_eq!(multi.slots[&1], "b");
        assert_eq!(result.diagnostics.of_kind(DiagnosticKind::Shape).count(), 2);

        let mut node = strip_node();
        node.custom_data.insert(MATERIAL_ID_KEY.to_string(), 4);
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        assert_eq!(result.mesh.face_materials, vec![3, 3]);
    }

    #[test]
    fn subsets_sharing_an_id() {
        let mut node = strip_node();
        for (name, face) in [("a", 0), ("b", 1)] {
            let subset = node.subset_mut(name);
            subset.indices.set(T, vec![face]);
            subset.custom_data.insert(MATERIAL_ID_KEY.to_string(), 3);
        }
        let opts = ImportOptions::default();
        let result = MeshImporter::new(&opts).import(&node, T).unwrap();
        assert_eq!(result.mesh.face_materials, vec![2, 2]);
        let multi = result.multi_material.unwrap();
        assert_eq!(multi.slots.len(), 1);
        assert_eq!(multi.slots[&2], "a");
    }
}
