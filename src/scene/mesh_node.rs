//!
//! The mesh node of the scene description and its attributes.
//!

use std::collections::BTreeMap;

use super::samples::{TimeCode, TimeSamples};
use super::value::{ArrayValue, ValueType};
use super::NodePath;

/// How attribute values map onto mesh elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// One value for the whole mesh.
    Constant,
    /// One value per face.
    Uniform,
    /// One value per point, linearly interpolated.
    Varying,
    /// One value per point.
    Vertex,
    /// One value per face corner.
    FaceVarying,
}

impl Interpolation {
    /// Number of elements values are attached to, given the mesh dimensions.
    pub fn element_count(self, num_points: usize, num_faces: usize, num_corners: usize) -> usize {
        match self {
            Interpolation::Constant => 1,
            Interpolation::Uniform => num_faces,
            Interpolation::Varying | Interpolation::Vertex => num_points,
            Interpolation::FaceVarying => num_corners,
        }
    }
}

/// Winding convention of face corners.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    RightHanded,
    LeftHanded,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SubdivisionScheme {
    #[default]
    CatmullClark,
    Loop,
    Bilinear,
    None,
}

/// A named attribute with per-element values and an optional index array.
#[derive(Clone, Debug, PartialEq)]
pub struct Primvar {
    pub ty: ValueType,
    pub interpolation: Interpolation,
    pub values: TimeSamples<ArrayValue>,
    pub indices: TimeSamples<Vec<i32>>,
}

impl Primvar {
    pub fn new(ty: ValueType, interpolation: Interpolation) -> Self {
        Primvar {
            ty,
            interpolation,
            values: TimeSamples::new(),
            indices: TimeSamples::new(),
        }
    }

    /// Whether the attribute is indexed at the given time.
    pub fn is_indexed(&self, time: TimeCode) -> bool {
        self.indices.get(time).map_or(false, |ix| !ix.is_empty())
    }
}

/// A face subset, typically binding one material to part of the mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subset {
    /// Face indices in the subset.
    pub indices: TimeSamples<Vec<i32>>,
    pub custom_data: BTreeMap<String, i32>,
}

/// A mesh in the scene description.
///
/// Every attribute is time sampled. Subsets are child nodes keyed by name.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    path: NodePath,
    /// Bounding box as `[min, max]`.
    pub extent: TimeSamples<[[f32; 3]; 2]>,
    pub points: TimeSamples<Vec<[f32; 3]>>,
    pub face_vertex_counts: TimeSamples<Vec<i32>>,
    pub face_vertex_indices: TimeSamples<Vec<i32>>,
    /// Plain normals attribute. It is never indexed.
    pub normals: TimeSamples<Vec<[f32; 3]>>,
    pub normals_interpolation: Interpolation,
    pub orientation: Orientation,
    pub subdivision_scheme: SubdivisionScheme,
    pub primvars: BTreeMap<String, Primvar>,
    pub corner_indices: TimeSamples<Vec<i32>>,
    pub corner_sharpnesses: TimeSamples<Vec<f32>>,
    pub crease_indices: TimeSamples<Vec<i32>>,
    pub crease_lengths: TimeSamples<Vec<i32>>,
    pub crease_sharpnesses: TimeSamples<Vec<f32>>,
    pub custom_data: BTreeMap<String, i32>,
    pub subsets: BTreeMap<String, Subset>,
}

impl MeshNode {
    pub fn new(path: NodePath) -> Self {
        MeshNode {
            path,
            extent: TimeSamples::new(),
            points: TimeSamples::new(),
            face_vertex_counts: TimeSamples::new(),
            face_vertex_indices: TimeSamples::new(),
            normals: TimeSamples::new(),
            normals_interpolation: Interpolation::Vertex,
            orientation: Orientation::default(),
            subdivision_scheme: SubdivisionScheme::default(),
            primvars: BTreeMap::new(),
            corner_indices: TimeSamples::new(),
            corner_sharpnesses: TimeSamples::new(),
            crease_indices: TimeSamples::new(),
            crease_lengths: TimeSamples::new(),
            crease_sharpnesses: TimeSamples::new(),
            custom_data: BTreeMap::new(),
            subsets: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn primvar(&self, name: &str) -> Option<&Primvar> {
        self.primvars.get(name)
    }

    pub fn has_primvar(&self, name: &str) -> bool {
        self.primvars.contains_key(name)
    }

    /// Get the named attribute, creating it with the given type and interpolation if missing.
    /// An existing attribute takes the given type and interpolation.
    pub fn primvar_mut(&mut self, name: &str, ty: ValueType, interpolation: Interpolation) -> &mut Primvar {
        let pv = self
            .primvars
            .entry(name.to_string())
            .or_insert_with(|| Primvar::new(ty, interpolation));
        pv.ty = ty;
        pv.interpolation = interpolation;
        pv
    }

    /// Get the named subset, creating it if missing.
    pub fn subset_mut(&mut self, name: &str) -> &mut Subset {
        self.subsets.entry(name.to_string()).or_default()
    }

    /// Path of a subset child node.
    pub fn subset_path(&self, name: &str) -> Option<NodePath> {
        self.path.child(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_counts() {
        assert_eq!(Interpolation::Constant.element_count(4, 2, 6), 1);
        assert_eq!(Interpolation::Uniform.element_count(4, 2, 6), 2);
        assert_eq!(Interpolation::Vertex.element_count(4, 2, 6), 4);
        assert_eq!(Interpolation::FaceVarying.element_count(4, 2, 6), 6);
    }

    #[test]
    fn primvar_creation_updates_declaration() {
        let mut node = MeshNode::new(NodePath::new("/mesh").unwrap());
        node.primvar_mut("st", ValueType::TEXCOORD2F, Interpolation::Vertex);
        let pv = node.primvar_mut("st", ValueType::TEXCOORD3F, Interpolation::FaceVarying);
        assert_eq!(pv.ty, ValueType::TEXCOORD3F);
        assert!(!pv.is_indexed(TimeCode::Default));
        assert_eq!(node.primvars.len(), 1);
        assert_eq!(node.subset_path("_1_").unwrap().as_str(), "/mesh/_1_");
    }
}
