//!
//! A uniform read/write view over both native mesh encodings.
//!
//! The facade memoizes derived data (flattened face-vertex indices, flattened normal indices and
//! the total corner count). Operations that change the mesh through the facade clear these
//! caches. The caches are never re-validated otherwise: the wrapped mesh must not be mutated
//! through another path while a facade is alive.
//!
//! A borrowed mesh is never modified. The first edit that changes it makes the facade switch to
//! an owned copy, and normals generated for a mesh without any are kept by the facade.
//!

use std::cell::OnceCell;

use math::Matrix4;

use super::channel::{ChannelId, MapChannel};
use super::normals::{generate_smooth_normals, SpecifiedNormals};
use super::polymesh::PolyMesh;
use super::topology::*;
use super::trimesh::TriMesh;
use crate::bbox::BBox;
use crate::ops::{BoundingBox, Transform};

/// One of the two native mesh encodings.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeMesh {
    Tri(TriMesh),
    Poly(PolyMesh),
}

impl From<TriMesh> for NativeMesh {
    fn from(mesh: TriMesh) -> Self {
        NativeMesh::Tri(mesh)
    }
}

impl From<PolyMesh> for NativeMesh {
    fn from(mesh: PolyMesh) -> Self {
        NativeMesh::Poly(mesh)
    }
}

#[derive(Debug)]
enum Storage<'a> {
    Borrowed(&'a mut NativeMesh),
    Owned(NativeMesh),
}

/// Uniform interface over a borrowed or owned native mesh.
#[derive(Debug)]
pub struct MeshFacade<'a> {
    storage: Storage<'a>,
    face_vertex_indices: OnceCell<Vec<i32>>,
    normal_indices: OnceCell<Option<Vec<i32>>>,
    num_corners: OnceCell<usize>,
    /// Smooth normals of a mesh without specified normals.
    generated_normals: Option<SpecifiedNormals>,
}

impl<'a> MeshFacade<'a> {
    /// Wrap a mesh owned by the caller. The facade never drops it.
    pub fn borrowed(mesh: &'a mut NativeMesh) -> Self {
        Self::with_storage(Storage::Borrowed(mesh))
    }

    /// Take ownership of a mesh. It is dropped together with the facade.
    pub fn owned(mesh: impl Into<NativeMesh>) -> MeshFacade<'static> {
        MeshFacade::with_storage(Storage::Owned(mesh.into()))
    }

    fn with_storage(storage: Storage<'a>) -> Self {
        MeshFacade {
            storage,
            face_vertex_indices: OnceCell::new(),
            normal_indices: OnceCell::new(),
            num_corners: OnceCell::new(),
            generated_normals: None,
        }
    }

    pub fn native(&self) -> &NativeMesh {
        match &self.storage {
            Storage::Borrowed(mesh) => &**mesh,
            Storage::Owned(mesh) => mesh,
        }
    }

    /// Mutable access to the mesh, copying a borrowed mesh into the facade first.
    fn to_mut(&mut self) -> &mut NativeMesh {
        if let Storage::Borrowed(mesh) = &self.storage {
            let copy = (**mesh).clone();
            self.storage = Storage::Owned(copy);
        }
        match &mut self.storage {
            Storage::Owned(mesh) => mesh,
            Storage::Borrowed(mesh) => &mut **mesh,
        }
    }

    /// Whether the facade owns the mesh it wraps.
    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    /// Release an owned mesh. Borrowed meshes stay with the caller and yield `None`.
    pub fn into_owned(self) -> Option<NativeMesh> {
        match self.storage {
            Storage::Owned(mesh) => Some(mesh),
            Storage::Borrowed(_) => None,
        }
    }

    pub fn as_poly(&self) -> Option<&PolyMesh> {
        match self.native() {
            NativeMesh::Poly(mesh) => Some(mesh),
            NativeMesh::Tri(_) => None,
        }
    }

    pub fn as_tri(&self) -> Option<&TriMesh> {
        match self.native() {
            NativeMesh::Tri(mesh) => Some(mesh),
            NativeMesh::Poly(_) => None,
        }
    }

    pub fn is_triangulated(&self) -> bool {
        self.as_tri().is_some()
    }

    /// Drop all memoized derived data, generated normals included.
    pub fn clear_cached_data(&mut self) {
        self.face_vertex_indices = OnceCell::new();
        self.normal_indices = OnceCell::new();
        self.num_corners = OnceCell::new();
        self.generated_normals = None;
    }

    /*
     * Topology
     */

    pub fn vertex_count(&self) -> usize {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.num_vertices(),
            NativeMesh::Poly(mesh) => mesh.num_vertices(),
        }
    }

    pub fn face_count(&self) -> usize {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.num_faces(),
            NativeMesh::Poly(mesh) => mesh.num_faces(),
        }
    }

    pub fn face_degree(&self, fidx: usize) -> usize {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.num_vertices_at_face(fidx),
            NativeMesh::Poly(mesh) => mesh.num_vertices_at_face(fidx),
        }
    }

    /// Vertex index of the `which`th corner of a face.
    pub fn face_vertex(&self, fidx: usize, which: usize) -> Option<usize> {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.face_to_vertex(fidx, which),
            NativeMesh::Poly(mesh) => mesh.face_to_vertex(fidx, which),
        }
        .map(usize::from)
    }

    /// Index of the first corner of a face in per-corner arrays.
    pub fn face_corner_offset(&self, fidx: usize) -> usize {
        match self.native() {
            NativeMesh::Tri(_) => 3 * fidx,
            NativeMesh::Poly(mesh) => mesh.offsets[fidx],
        }
    }

    pub fn face_material(&self, fidx: usize) -> u16 {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.face_material(fidx),
            NativeMesh::Poly(mesh) => mesh.face_material(fidx),
        }
    }

    /// Only polygon meshes carry dead faces.
    pub fn is_face_dead(&self, fidx: usize) -> bool {
        match self.native() {
            NativeMesh::Tri(_) => false,
            NativeMesh::Poly(mesh) => mesh.is_face_dead(fidx),
        }
    }

    pub fn vertex_positions(&self) -> &[[f32; 3]] {
        match self.native() {
            NativeMesh::Tri(mesh) => &mesh.vertex_positions,
            NativeMesh::Poly(mesh) => &mesh.vertex_positions,
        }
    }

    /// Total number of face corners.
    pub fn corner_count(&self) -> usize {
        *self.num_corners.get_or_init(|| match self.native() {
            NativeMesh::Tri(mesh) => mesh.num_face_vertices(),
            NativeMesh::Poly(mesh) => mesh.num_face_vertices(),
        })
    }

    /// Vertex index of every face corner, face after face.
    pub fn face_vertex_indices(&self) -> &[i32] {
        self.face_vertex_indices.get_or_init(|| match self.native() {
            NativeMesh::Tri(mesh) => mesh.indices.iter().flatten().map(|&v| v as i32).collect(),
            NativeMesh::Poly(mesh) => mesh.indices.iter().map(|&v| v as i32).collect(),
        })
    }

    /*
     * Normals and channels
     */

    /// Normals specified on the mesh.
    fn specified_normals(&self) -> Option<&SpecifiedNormals> {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.normals.as_ref(),
            NativeMesh::Poly(mesh) => mesh.normals.as_ref(),
        }
    }

    /// Normals specified on the mesh, or else the ones generated by `load_normals`.
    fn normals(&self) -> Option<&SpecifiedNormals> {
        self.specified_normals().or(self.generated_normals.as_ref())
    }

    pub fn normal_data(&self) -> Option<&[[f32; 3]]> {
        self.normals().map(|n| n.normals.as_slice())
    }

    /// Normal index of every face corner, face after face.
    pub fn normal_indices(&self) -> Option<&[i32]> {
        self.normal_indices
            .get_or_init(|| self.normals().map(|n| n.indices.iter().map(|&i| i as i32).collect()))
            .as_deref()
    }

    /// Make sure normals are available, generating smooth ones if the mesh specifies none.
    ///
    /// Generated normals live in the facade and are dropped by any later edit of the mesh.
    pub fn load_normals(&mut self) {
        if self.normals().is_some() {
            return;
        }
        let nmls = match self.native() {
            NativeMesh::Tri(mesh) => {
                let faces = mesh.indices.iter().map(|t| t.as_slice());
                generate_smooth_normals(&mesh.vertex_positions, faces)
            }
            NativeMesh::Poly(mesh) => generate_smooth_normals(&mesh.vertex_positions, mesh.face_iter()),
        };
        self.generated_normals = Some(nmls);
        self.normal_indices = OnceCell::new();
    }

    pub fn channel(&self, id: ChannelId) -> Option<&MapChannel> {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.channel(id),
            NativeMesh::Poly(mesh) => mesh.channel(id),
        }
    }

    /// Ids of the channels present on the mesh, in increasing order.
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.channels.keys().copied().collect(),
            NativeMesh::Poly(mesh) => mesh.channels.keys().copied().collect(),
        }
    }

    /// Total number of values over all channels, used to detect structural changes.
    pub fn channel_value_counts(&self) -> Vec<(ChannelId, usize)> {
        let channels = match self.native() {
            NativeMesh::Tri(mesh) => &mesh.channels,
            NativeMesh::Poly(mesh) => &mesh.channels,
        };
        channels.iter().map(|(&id, ch)| (id, ch.num_values())).collect()
    }

    /*
     * Creases
     */

    /// Only polygon meshes have an edge list, and with it crease data.
    pub fn supports_creases(&self) -> bool {
        self.as_poly().is_some()
    }

    pub fn vertex_creases(&self) -> Option<&[f32]> {
        self.as_poly()?.vertex_creases.as_deref()
    }

    pub fn edge_creases(&self) -> Option<(&[[usize; 2]], &[f32])> {
        let mesh = self.as_poly()?;
        Some((mesh.edges(), mesh.edge_creases()?))
    }

    /*
     * Operations
     */

    pub fn transform(&mut self, mtx: &Matrix4<f32>) {
        match self.to_mut() {
            NativeMesh::Tri(mesh) => mesh.transform(mtx),
            NativeMesh::Poly(mesh) => mesh.transform(mtx),
        }
        self.clear_cached_data();
    }

    /// Split non-convex polygons. A no-op on triangle meshes.
    pub fn make_convex(&mut self) -> usize {
        if !self.as_poly().is_some_and(|mesh| mesh.has_non_convex_faces()) {
            return 0;
        }
        let split = match self.to_mut() {
            NativeMesh::Tri(_) => 0,
            NativeMesh::Poly(mesh) => mesh.make_convex(),
        };
        self.clear_cached_data();
        split
    }

    /// Split non-planar polygons. A no-op on triangle meshes.
    pub fn make_planar(&mut self, threshold: f32) -> usize {
        if !self.as_poly().is_some_and(|mesh| mesh.has_non_planar_faces(threshold)) {
            return 0;
        }
        let split = match self.to_mut() {
            NativeMesh::Tri(_) => 0,
            NativeMesh::Poly(mesh) => mesh.make_planar(threshold),
        };
        self.clear_cached_data();
        split
    }

    /// Remove dead structures from polygon meshes, degenerate and illegal faces from triangle
    /// meshes.
    pub fn cleanup(&mut self) {
        let needed = match self.native() {
            NativeMesh::Tri(mesh) => mesh.has_invalid_faces(),
            NativeMesh::Poly(mesh) => mesh.has_dead_structs(),
        };
        if !needed {
            return;
        }
        match self.to_mut() {
            NativeMesh::Tri(mesh) => {
                mesh.remove_degenerate_faces();
                mesh.remove_illegal_faces();
            }
            NativeMesh::Poly(mesh) => {
                mesh.collapse_dead_structs();
            }
        }
        self.clear_cached_data();
    }

    pub fn bounding_box(&self) -> BBox<f32> {
        match self.native() {
            NativeMesh::Tri(mesh) => mesh.bounding_box(),
            NativeMesh::Poly(mesh) => mesh.bounding_box(),
        }
    }

    /// Replace a polygon mesh by its triangulation, which the facade then owns.
    ///
    /// A borrowed polygon mesh is left as it is with the caller. Triangle meshes are unchanged.
    pub fn triangulate(&mut self) {
        let tri = match self.native() {
            NativeMesh::Tri(_) => return,
            NativeMesh::Poly(mesh) => mesh.to_tri_mesh(),
        };
        self.storage = Storage::Owned(NativeMesh::Tri(tri));
        self.clear_cached_data();
    }

    /// Replace a triangle mesh by polygons merged from coplanar triangle pairs, which the facade
    /// then owns. Polygon meshes are unchanged.
    pub fn polygonize(&mut self, tolerance: f32) {
        let poly = match self.native() {
            NativeMesh::Poly(_) => return,
            NativeMesh::Tri(mesh) => PolyMesh::from_tri_mesh(mesh.clone(), tolerance),
        };
        self.storage = Storage::Owned(NativeMesh::Poly(poly));
        self.clear_cached_data();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> PolyMesh {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]];
        PolyMesh::new(points, &[4, 0, 1, 2, 3])
    }

    #[test]
    fn facade_reads_both_encodings() {
        let poly = MeshFacade::owned(quad());
        assert_eq!(poly.face_count(), 1);
        assert_eq!(poly.face_degree(0), 4);
        assert_eq!(poly.corner_count(), 4);
        assert_eq!(poly.face_vertex_indices(), &[0, 1, 2, 3]);
        assert!(poly.supports_creases());

        let tri = MeshFacade::owned(quad().to_tri_mesh());
        assert_eq!(tri.face_count(), 2);
        assert_eq!(tri.corner_count(), 6);
        assert_eq!(tri.face_corner_offset(1), 3);
        assert!(!tri.supports_creases());
        assert!(tri.vertex_creases().is_none());
    }

    #[test]
    fn triangulate_borrowed_leaves_source_intact() {
        let mut native = NativeMesh::from(quad());
        {
            let mut facade = MeshFacade::borrowed(&mut native);
            assert_eq!(facade.corner_count(), 4);
            facade.triangulate();
            assert!(facade.is_owned());
            assert!(facade.is_triangulated());
            // Caches were cleared.
            assert_eq!(facade.corner_count(), 6);
            assert_eq!(facade.face_vertex_indices().len(), 6);
            // Triangulating again is a no-op.
            facade.triangulate();
            assert_eq!(facade.face_count(), 2);
        }
        assert!(matches!(native, NativeMesh::Poly(_)));
    }

    #[test]
    fn load_normals_generates_per_vertex_normals() {
        let mut facade = MeshFacade::owned(quad());
        assert!(facade.normal_indices().is_none());
        facade.load_normals();
        assert_eq!(facade.normal_indices(), Some(&[0, 1, 2, 3][..]));
        assert_eq!(facade.normal_data().map(|n| n.len()), Some(4));
    }

    #[test]
    fn edits_never_touch_a_borrowed_mesh() {
        let mut concave = PolyMesh::new(
            vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 2.0, 0.0], [1.0, 0.5, 0.0]],
            &[4, 0, 1, 2, 3],
        );
        concave.kill_vertex(3);
        let mut native = NativeMesh::from(concave);
        let before = native.clone();
        {
            let mut facade = MeshFacade::borrowed(&mut native);
            facade.load_normals();
            assert!(facade.normal_data().is_some());
            assert!(!facade.is_owned());
            facade.make_convex();
            assert!(facade.is_owned());
            assert_eq!(facade.face_count(), 2);
            facade.cleanup();
            assert_eq!(facade.face_count(), 0);
        }
        assert_eq!(native, before);
    }

    #[test]
    fn unchanged_borrowed_mesh_stays_borrowed() {
        let mut native = NativeMesh::from(quad());
        let mut facade = MeshFacade::borrowed(&mut native);
        assert_eq!(facade.make_convex(), 0);
        assert_eq!(facade.make_planar(1.0 - f32::EPSILON), 0);
        facade.cleanup();
        assert!(!facade.is_owned());
    }

    #[test]
    fn transform_drops_generated_normals() {
        let mut facade = MeshFacade::owned(quad());
        facade.load_normals();
        facade.transform(&Matrix4::new_scaling(2.0));
        assert!(facade.normal_data().is_none());
        assert!(facade.normal_indices().is_none());
    }

    #[test]
    fn bounding_box_and_transform() {
        let mut facade = MeshFacade::owned(quad());
        facade.transform(&Matrix4::new_scaling(2.0));
        assert_eq!(facade.bounding_box().extent(), [[0.0; 3], [2.0, 2.0, 0.0]]);
    }
}
