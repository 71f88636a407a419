//!
//! Polymesh module. This module defines the general-polygon native encoding: faces of any size
//! stored as flat vertex indices with offsets, an edge list with optional creases, and per-face
//! and per-vertex dead flags marking structures scheduled for removal.
//!

use std::collections::BTreeMap;

use ahash::AHashMap;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::channel::{ChannelId, MapChannel};
use super::normals::SpecifiedNormals;
use super::topology::*;
use super::trimesh::TriMesh;
use super::vertex_positions::VertexPositions;
use crate::prim::{polygon, Triangle};

/// Mesh with arbitrarily shaped faces. It could have polygons with any number of sides.
/// All faces are assumed to be closed polygons.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolyMesh {
    pub vertex_positions: Vec<[f32; 3]>,
    /// Indices into `vertex_positions` representing face vertices.
    pub indices: Vec<usize>,
    /// Offsets into `indices` representing individual faces. The last element in this `Vec` is
    /// always the length of `indices` for convenience.
    pub offsets: Vec<usize>,
    /// Material id of each face.
    pub face_materials: Vec<u16>,
    pub dead_faces: Vec<bool>,
    pub dead_vertices: Vec<bool>,
    pub normals: Option<SpecifiedNormals>,
    pub channels: BTreeMap<ChannelId, MapChannel>,
    /// Per-vertex crease weights in `[0, 1]`.
    pub vertex_creases: Option<Vec<f32>>,
    /// Undirected edges, built by `fill_in_mesh`.
    edges: Vec<[usize; 2]>,
    /// Per-edge crease weights in `[0, 1]`, parallel to the edge list.
    edge_creases: Option<Vec<f32>>,
}

/// A face to be built from corners of an existing mesh.
struct CornerFace {
    /// Face the new face inherits its material and dead flag from.
    src: usize,
    /// Corners (face-vertex indices) of the existing mesh.
    corners: Vec<usize>,
}

/// Keep the elements of `v` whose position is flagged in `keep`.
fn retain_masked<T>(v: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    v.retain(|_| {
        i += 1;
        keep.get(i - 1).copied().unwrap_or(false)
    });
}

#[inline]
pub(crate) fn edge_key(a: usize, b: usize) -> [usize; 2] {
    if a < b {
        [a, b]
    } else {
        [b, a]
    }
}

impl PolyMesh {
    /// Construct a `PolyMesh` from an array of vertices and an array of sizes and indices.
    ///
    /// The `faces` array contains the indices into the vertex array for each face preceeded by the
    /// number of vertices in the corresponding face:
    /// ```verbatim
    ///     n i_1 i_2 ... i_n m j_1 j_2 ... j_m ...
    /// ```
    ///
    /// # Examples
    /// ```
    /// use scenemesh::mesh::PolyMesh;
    /// let points = vec![
    ///     [0.0, 0.0, 0.0],
    ///     [1.0, 0.0, 0.0],
    ///     [0.0, 1.0, 0.0],
    ///     [1.0, 1.0, 0.0],
    ///     [0.0, 0.0, 1.0],
    ///     [1.0, 0.0, 1.0]];
    /// let faces = vec![3, 0, 1, 2, // first triangle
    ///                  3, 1, 3, 2, // second triangle
    ///                  4, 0, 1, 5, 4]; // quadrilateral
    ///
    /// let polymesh = PolyMesh::new(points, &faces);
    ///
    /// assert_eq!(polymesh.indices, [0, 1, 2, 1, 3, 2, 0, 1, 5, 4]);
    /// assert_eq!(polymesh.offsets, [0, 3, 6, 10]);
    /// assert_eq!(polymesh.edges().len(), 8);
    /// ```
    pub fn new(verts: Vec<[f32; 3]>, faces: &[usize]) -> PolyMesh {
        let mut counts = Vec::new();
        let mut indices = Vec::new();
        let mut i = 0;
        while i < faces.len() {
            let n = faces[i];
            i += 1;
            counts.push(n);
            indices.extend_from_slice(&faces[i..(i + n).min(faces.len())]);
            i += n;
        }
        PolyMesh::from_face_counts(verts, &counts, indices)
    }

    /// Construct a `PolyMesh` from per-face corner counts and the flat vertex indices of all
    /// faces. All faces get material 0.
    pub fn from_face_counts(verts: Vec<[f32; 3]>, counts: &[usize], indices: Vec<usize>) -> PolyMesh {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        offsets.push(0);
        for &n in counts {
            let last = offsets[offsets.len() - 1];
            offsets.push((last + n).min(indices.len()));
        }
        debug_assert_eq!(offsets[offsets.len() - 1], indices.len());

        let mut mesh = PolyMesh {
            dead_vertices: vec![false; verts.len()],
            vertex_positions: verts,
            indices,
            offsets,
            face_materials: vec![0; counts.len()],
            dead_faces: vec![false; counts.len()],
            ..Default::default()
        };
        mesh.fill_in_mesh();
        mesh
    }

    pub fn face_iter(&self) -> DynamicIndexSliceIter {
        DynamicIndexSliceIter {
            indices: &self.indices,
            offsets: &self.offsets,
        }
    }

    pub fn face_iter_mut(&mut self) -> DynamicIndexSliceIterMut {
        DynamicIndexSliceIterMut {
            indices: &mut self.indices,
            offsets: &self.offsets,
        }
    }

    /// Vertex indices of the given face.
    #[inline]
    pub fn face(&self, fidx: usize) -> &[usize] {
        &self.indices[self.face_corners(fidx)]
    }

    /// Range of corners (face-vertex indices) of the given face.
    #[inline]
    pub fn face_corners(&self, fidx: usize) -> std::ops::Range<usize> {
        self.offsets[fidx]..self.offsets[fidx + 1]
    }

    #[inline]
    pub fn face_material(&self, fidx: usize) -> u16 {
        self.face_materials.get(fidx).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_face_dead(&self, fidx: usize) -> bool {
        self.dead_faces.get(fidx).copied().unwrap_or(false)
    }

    /// Mark a face for removal by the next `collapse_dead_structs`.
    pub fn kill_face(&mut self, fidx: usize) {
        if let Some(dead) = self.dead_faces.get_mut(fidx) {
            *dead = true;
        }
    }

    /// Mark a vertex for removal by the next `collapse_dead_structs`.
    pub fn kill_vertex(&mut self, vidx: usize) {
        if let Some(dead) = self.dead_vertices.get_mut(vidx) {
            *dead = true;
        }
    }

    pub fn channel(&self, id: ChannelId) -> Option<&MapChannel> {
        self.channels.get(&id)
    }

    pub fn set_channel(&mut self, id: ChannelId, channel: MapChannel) {
        self.channels.insert(id, channel);
    }

    fn has_valid_vertices(&self, face: &[usize]) -> bool {
        face.iter().all(|&v| v < self.vertex_positions.len())
    }

    /*
     * Edges and creases
     */

    /// Rebuild the edge list from the live faces. Edge creases follow their edges.
    pub fn fill_in_mesh(&mut self) {
        let creases = self.edge_crease_map(None);
        self.rebuild_edges(creases);
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Find the undirected edge between `v1` and `v2`.
    ///
    /// This scans the whole edge list. Build an [`edge_lookup`](Self::edge_lookup) once for
    /// repeated queries.
    pub fn find_edge(&self, v1: usize, v2: usize) -> Option<usize> {
        let key = edge_key(v1, v2);
        self.edges.iter().position(|&e| e == key)
    }

    /// A lookup table from sorted vertex pairs to edge indices.
    pub fn edge_lookup(&self) -> AHashMap<[usize; 2], usize> {
        self.edges
            .iter()
            .enumerate()
            .map(|(i, &e)| (e, i))
            .collect()
    }

    pub fn edge_creases(&self) -> Option<&[f32]> {
        self.edge_creases.as_deref()
    }

    pub fn edge_crease(&self, eidx: usize) -> f32 {
        self.edge_creases
            .as_ref()
            .and_then(|c| c.get(eidx))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_edge_crease(&mut self, eidx: usize, weight: f32) {
        let num_edges = self.edges.len();
        if eidx < num_edges {
            self.edge_creases.get_or_insert_with(|| vec![0.0; num_edges])[eidx] = weight;
        }
    }

    pub fn vertex_crease(&self, vidx: usize) -> f32 {
        self.vertex_creases
            .as_ref()
            .and_then(|c| c.get(vidx))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set_vertex_crease(&mut self, vidx: usize, weight: f32) {
        let num_verts = self.vertex_positions.len();
        if vidx < num_verts {
            self.vertex_creases.get_or_insert_with(|| vec![0.0; num_verts])[vidx] = weight;
        }
    }

    /// Collect non-zero edge creases keyed by vertex pair, optionally renumbering the vertices.
    fn edge_crease_map(&self, vertex_remap: Option<&[usize]>) -> Option<AHashMap<[usize; 2], f32>> {
        let creases = self.edge_creases.as_ref()?;
        let map = self
            .edges
            .iter()
            .zip(creases.iter())
            .filter(|(_, w)| **w != 0.0)
            .filter_map(|(&[a, b], &w)| match vertex_remap {
                Some(remap) => {
                    let (a, b) = (remap[a], remap[b]);
                    (a != usize::MAX && b != usize::MAX).then(|| (edge_key(a, b), w))
                }
                None => Some((edge_key(a, b), w)),
            })
            .collect();
        Some(map)
    }

    fn rebuild_edges(&mut self, creases: Option<AHashMap<[usize; 2], f32>>) {
        let mut lookup = AHashMap::new();
        let mut edges = Vec::new();
        for fidx in 0..self.num_faces() {
            if self.is_face_dead(fidx) {
                continue;
            }
            let face = self.face(fidx);
            for (i, &a) in face.iter().enumerate() {
                let b = face[(i + 1) % face.len()];
                if a == b {
                    continue;
                }
                lookup.entry(edge_key(a, b)).or_insert_with(|| {
                    edges.push(edge_key(a, b));
                    edges.len() - 1
                });
            }
        }
        self.edge_creases = creases.map(|map| {
            edges
                .iter()
                .map(|e| map.get(e).copied().unwrap_or(0.0))
                .collect()
        });
        self.edges = edges;
    }

    /*
     * Structural edits
     */

    /// Replace all faces by faces assembled from existing corners, carrying vertex indices,
    /// normal indices and channel indices along.
    fn rebuild_from_corners(&mut self, faces: Vec<CornerFace>) {
        let num_corners: usize = faces.iter().map(|f| f.corners.len()).sum();
        let gather = |src: &[usize]| -> Vec<usize> {
            let mut out = Vec::with_capacity(num_corners);
            for f in faces.iter() {
                out.extend(f.corners.iter().map(|&c| src.get(c).copied().unwrap_or(0)));
            }
            out
        };

        let indices = gather(&self.indices);
        for ch in self.channels.values_mut() {
            ch.indices = gather(&ch.indices);
        }
        if let Some(nmls) = self.normals.as_mut() {
            nmls.indices = gather(&nmls.indices);
        }

        let mut offsets = Vec::with_capacity(faces.len() + 1);
        offsets.push(0);
        for f in faces.iter() {
            offsets.push(offsets[offsets.len() - 1] + f.corners.len());
        }
        let face_materials = faces.iter().map(|f| self.face_material(f.src)).collect();
        let dead_faces = faces.iter().map(|f| self.is_face_dead(f.src)).collect();

        let creases = self.edge_crease_map(None);
        self.indices = indices;
        self.offsets = offsets;
        self.face_materials = face_materials;
        self.dead_faces = dead_faces;
        self.rebuild_edges(creases);
    }

    /// Split every live face matching `needs_split` into triangles by ear clipping.
    fn split_faces<F>(&mut self, mut needs_split: F) -> usize
    where
        F: FnMut(&[[f32; 3]], &[usize]) -> bool,
    {
        let mut num_split = 0;
        let mut faces = Vec::with_capacity(self.num_faces());
        for fidx in 0..self.num_faces() {
            let corners = self.face_corners(fidx);
            if self.is_split_candidate(fidx, &mut needs_split) {
                let face = &self.indices[corners.clone()];
                num_split += 1;
                for tri in polygon::ear_clip(&self.vertex_positions, face) {
                    faces.push(CornerFace {
                        src: fidx,
                        corners: tri.iter().map(|&k| corners.start + k).collect(),
                    });
                }
            } else {
                faces.push(CornerFace {
                    src: fidx,
                    corners: corners.collect(),
                });
            }
        }
        if num_split > 0 {
            self.rebuild_from_corners(faces);
        }
        num_split
    }

    /// Whether face `fidx` is a live polygon with more than 3 valid corners matching
    /// `needs_split`.
    fn is_split_candidate<F>(&self, fidx: usize, needs_split: &mut F) -> bool
    where
        F: FnMut(&[[f32; 3]], &[usize]) -> bool,
    {
        let face = self.face(fidx);
        !self.is_face_dead(fidx)
            && face.len() > 3
            && self.has_valid_vertices(face)
            && needs_split(&self.vertex_positions, face)
    }

    /// Whether `make_planar` with the same `threshold` would split any face.
    pub fn has_non_planar_faces(&self, threshold: f32) -> bool {
        let mut non_planar = |pos: &[[f32; 3]], face: &[usize]| !polygon::is_planar(pos, face, threshold);
        (0..self.num_faces()).any(|f| self.is_split_candidate(f, &mut non_planar))
    }

    /// Whether `make_convex` would split any face.
    pub fn has_non_convex_faces(&self) -> bool {
        let mut non_convex = |pos: &[[f32; 3]], face: &[usize]| !polygon::is_convex(pos, face);
        (0..self.num_faces()).any(|f| self.is_split_candidate(f, &mut non_convex))
    }

    /// Whether `collapse_dead_structs` would remove anything.
    pub fn has_dead_structs(&self) -> bool {
        let num_verts = self.vertex_positions.len();
        self.dead_faces.iter().any(|&d| d)
            || self.dead_vertices.iter().take(num_verts).any(|&d| d)
            || self.indices.iter().any(|&v| v >= num_verts)
    }

    /// Split faces whose corners deviate from the face plane into triangles.
    ///
    /// `threshold` is the smallest accepted cosine between a corner normal and the face normal.
    /// Returns the number of faces that were split.
    pub fn make_planar(&mut self, threshold: f32) -> usize {
        self.split_faces(|pos, face| !polygon::is_planar(pos, face, threshold))
    }

    /// Split non-convex faces into triangles. Returns the number of faces that were split.
    pub fn make_convex(&mut self) -> usize {
        self.split_faces(|pos, face| !polygon::is_convex(pos, face))
    }

    /// Remove dead faces and dead vertices. Faces using dead vertices are removed as well.
    ///
    /// Returns the number of removed faces and vertices.
    pub fn collapse_dead_structs(&mut self) -> (usize, usize) {
        for fidx in 0..self.num_faces() {
            let uses_dead_vertex = self.face(fidx).iter().any(|&v| {
                v >= self.vertex_positions.len() || self.dead_vertices.get(v).copied().unwrap_or(false)
            });
            if uses_dead_vertex {
                self.kill_face(fidx);
            }
        }

        let num_faces = self.num_faces();
        let live: Vec<CornerFace> = (0..num_faces)
            .filter(|&f| !self.is_face_dead(f))
            .map(|f| CornerFace {
                src: f,
                corners: self.face_corners(f).collect(),
            })
            .collect();
        let removed_faces = num_faces - live.len();
        if removed_faces > 0 {
            self.rebuild_from_corners(live);
        }

        let keep: Vec<bool> = (0..self.num_vertices())
            .map(|v| !self.dead_vertices.get(v).copied().unwrap_or(false))
            .collect();
        let removed_vertices = self.retain_vertices(&keep);
        (removed_faces, removed_vertices)
    }

    /// Remove vertices not referenced by any live face. Returns the number of removed vertices.
    pub fn remove_unused_vertices(&mut self) -> usize {
        let mut used = vec![false; self.num_vertices()];
        for fidx in 0..self.num_faces() {
            if self.is_face_dead(fidx) {
                continue;
            }
            for &v in self.face(fidx) {
                if let Some(u) = used.get_mut(v) {
                    *u = true;
                }
            }
        }
        self.retain_vertices(&used)
    }

    /// Keep only the vertices flagged in `keep`, renumbering face indices.
    ///
    /// Faces must not refer to removed vertices.
    fn retain_vertices(&mut self, keep: &[bool]) -> usize {
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        let mut remap = vec![usize::MAX; keep.len()];
        let mut next = 0;
        for (v, &k) in keep.iter().enumerate() {
            if k {
                remap[v] = next;
                next += 1;
            }
        }

        let creases = self.edge_crease_map(Some(&remap));
        for idx in self.indices.iter_mut() {
            debug_assert_ne!(remap[*idx], usize::MAX);
            *idx = remap[*idx];
        }
        retain_masked(&mut self.vertex_positions, keep);
        retain_masked(&mut self.dead_vertices, keep);
        if let Some(c) = self.vertex_creases.as_mut() {
            retain_masked(c, keep);
        }
        self.rebuild_edges(creases);
        removed
    }

    /// Reverse the order of each polygon in this mesh, including per-corner data.
    pub fn reverse(&mut self) {
        let Self {
            indices,
            offsets,
            channels,
            normals,
            ..
        } = self;
        let reverse_faces = |data: &mut [usize]| {
            for w in offsets.windows(2) {
                if let Some(face) = data.get_mut(w[0]..w[1]) {
                    face.reverse();
                }
            }
        };
        reverse_faces(indices.as_mut_slice());
        for ch in channels.values_mut() {
            reverse_faces(ch.indices.as_mut_slice());
        }
        if let Some(nmls) = normals.as_mut() {
            reverse_faces(nmls.indices.as_mut_slice());
        }
    }

    /// Reverse the order of each polygon in this mesh. This is the consuming version of the
    /// `reverse` method.
    #[inline]
    pub fn reversed(mut self) -> PolyMesh {
        self.reverse();
        self
    }

    /*
     * Conversion between encodings
     */

    /// Triangulate all live faces, carrying materials, normals and channels along.
    pub fn to_tri_mesh(&self) -> TriMesh {
        let mut tris = Vec::new();
        let mut materials = Vec::new();
        let mut corners = Vec::new();
        for fidx in 0..self.num_faces() {
            let range = self.face_corners(fidx);
            let face = &self.indices[range.clone()];
            if self.is_face_dead(fidx) || face.len() < 3 || !self.has_valid_vertices(face) {
                continue;
            }
            for [a, b, c] in polygon::ear_clip(&self.vertex_positions, face) {
                tris.push([face[a], face[b], face[c]]);
                materials.push(self.face_material(fidx));
                corners.extend([range.start + a, range.start + b, range.start + c]);
            }
        }

        let gather = |src: &[usize]| {
            corners
                .iter()
                .map(|&c| src.get(c).copied().unwrap_or(0))
                .collect::<Vec<_>>()
        };
        TriMesh {
            vertex_positions: self.vertex_positions.clone(),
            indices: tris,
            face_materials: materials,
            normals: self
                .normals
                .as_ref()
                .map(|n| SpecifiedNormals::new(n.normals.clone(), gather(&n.indices))),
            channels: self
                .channels
                .iter()
                .map(|(&id, ch)| (id, MapChannel::new(ch.values.clone(), gather(&ch.indices))))
                .collect(),
        }
    }

    /// Convert a triangle mesh into polygons, merging pairs of adjacent triangles into convex
    /// quads where they share an edge, a material and per-corner data along that edge and their
    /// normals agree up to the cosine `tolerance`.
    pub fn from_tri_mesh(tri: TriMesh, tolerance: f32) -> PolyMesh {
        let mut mesh = PolyMesh::from(tri);
        mesh.merge_triangle_pairs(tolerance);
        mesh
    }

    fn shares_corner_data(&self, c1: usize, c2: usize) -> bool {
        self.channels.values().all(|ch| ch.indices.get(c1) == ch.indices.get(c2))
            && self
                .normals
                .as_ref()
                .map_or(true, |n| n.indices.get(c1) == n.indices.get(c2))
    }

    fn merge_triangle_pairs(&mut self, tolerance: f32) -> usize {
        let num_faces = self.num_faces();
        let is_tri = |m: &PolyMesh, f: usize| {
            m.face(f).len() == 3 && !m.is_face_dead(f) && m.has_valid_vertices(m.face(f))
        };
        let tri_normal = |m: &PolyMesh, f: usize| {
            let face = m.face(f);
            Triangle::<f32>::from_indexed_slice(&[face[0], face[1], face[2]], &m.vertex_positions).normal()
        };

        // Directed edge -> (face, local corner of the edge source).
        let mut directed = AHashMap::new();
        for f in (0..num_faces).filter(|&f| is_tri(self, f)) {
            let face = self.face(f);
            for k in 0..3 {
                directed.insert((face[k], face[(k + 1) % 3]), (f, k));
            }
        }

        let mut merged = vec![false; num_faces];
        let mut faces = Vec::with_capacity(num_faces);
        let mut num_merged = 0;
        for f in 0..num_faces {
            if merged[f] {
                continue;
            }
            let base = self.offsets[f];
            let mut new_face = CornerFace {
                src: f,
                corners: self.face_corners(f).collect(),
            };
            if is_tri(self, f) {
                let face = self.face(f);
                for k in 0..3 {
                    let (a, b, c) = (face[k], face[(k + 1) % 3], face[(k + 2) % 3]);
                    let Some(&(g, kg)) = directed.get(&(b, a)) else {
                        continue;
                    };
                    if g == f || merged[g] || self.face_material(g) != self.face_material(f) {
                        continue;
                    }
                    let gbase = self.offsets[g];
                    let d = self.face(g)[(kg + 2) % 3];
                    if d == c {
                        continue;
                    }
                    let coplanar = match (tri_normal(self, f), tri_normal(self, g)) {
                        (Some(nf), Some(ng)) => nf.dot(&ng) >= tolerance,
                        _ => false,
                    };
                    let (fa, fb) = (base + k, base + (k + 1) % 3);
                    let (gb, ga) = (gbase + kg, gbase + (kg + 1) % 3);
                    if !coplanar
                        || !self.shares_corner_data(fa, ga)
                        || !self.shares_corner_data(fb, gb)
                        || !polygon::is_convex(&self.vertex_positions, &[b, c, a, d])
                    {
                        continue;
                    }
                    new_face.corners = vec![fb, base + (k + 2) % 3, fa, gbase + (kg + 2) % 3];
                    merged[f] = true;
                    merged[g] = true;
                    num_merged += 1;
                    break;
                }
            }
            faces.push(new_face);
        }
        if num_merged > 0 {
            self.rebuild_from_corners(faces);
        }
        num_merged
    }
}

impl NumVertices for PolyMesh {
    #[inline]
    fn num_vertices(&self) -> usize {
        self.vertex_positions.len()
    }
}

impl NumFaces for PolyMesh {
    #[inline]
    fn num_faces(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }
}

impl NumEdges for PolyMesh {
    #[inline]
    fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

impl FaceVertex for PolyMesh {
    #[inline]
    fn vertex<FVI>(&self, fv_idx: FVI) -> VertexIndex
    where
        FVI: Copy + Into<FaceVertexIndex>,
    {
        let fv_idx = usize::from(fv_idx.into());
        debug_assert!(fv_idx < self.num_face_vertices());
        self.indices[fv_idx].into()
    }

    #[inline]
    fn face_vertex<FI>(&self, fidx: FI, which: usize) -> Option<FaceVertexIndex>
    where
        FI: Copy + Into<FaceIndex>,
    {
        if which >= self.num_vertices_at_face(fidx) {
            None
        } else {
            let fidx = usize::from(fidx.into());
            debug_assert!(fidx < self.num_faces());

            Some((self.offsets[fidx] + which).into())
        }
    }

    #[inline]
    fn num_face_vertices(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    fn num_vertices_at_face<FI>(&self, fidx: FI) -> usize
    where
        FI: Copy + Into<FaceIndex>,
    {
        let fidx = usize::from(fidx.into());
        self.offsets[fidx + 1] - self.offsets[fidx]
    }
}

impl EdgeVertex for PolyMesh {
    #[inline]
    fn edge_endpoint<EVI>(&self, ev_idx: EVI) -> VertexIndex
    where
        EVI: Copy + Into<EdgeVertexIndex>,
    {
        let ev_idx = usize::from(ev_idx.into());
        self.edges[ev_idx / 2][ev_idx % 2].into()
    }

    #[inline]
    fn edge_vertex<EI>(&self, eidx: EI, which: usize) -> Option<EdgeVertexIndex>
    where
        EI: Copy + Into<EdgeIndex>,
    {
        if which >= 2 {
            None
        } else {
            Some((2 * usize::from(eidx.into()) + which).into())
        }
    }

    #[inline]
    fn num_edge_vertices(&self) -> usize {
        2 * self.edges.len()
    }

    #[inline]
    fn num_vertices_at_edge<EI>(&self, _: EI) -> usize
    where
        EI: Copy + Into<EdgeIndex>,
    {
        2
    }
}

impl VertexPositions for PolyMesh {
    #[inline]
    fn vertex_positions(&self) -> &[[f32; 3]] {
        &self.vertex_positions
    }
    #[inline]
    fn vertex_positions_mut(&mut self) -> &mut [[f32; 3]] {
        &mut self.vertex_positions
    }
}

#[derive(Clone)]
pub struct DynamicIndexSliceIter<'a> {
    /// Vertex indices of a non-uniform mesh.
    indices: &'a [usize],
    /// Face offsets into the `indices` array as in `PolyMesh`.
    offsets: &'a [usize],
}

pub struct DynamicIndexSliceIterMut<'a> {
    /// Vertex indices of a non-uniform mesh.
    indices: &'a mut [usize],
    /// Face offsets into the `indices` array as in `PolyMesh`.
    offsets: &'a [usize],
}

impl<'a> Iterator for DynamicIndexSliceIter<'a> {
    type Item = &'a [usize];

    fn next(&mut self) -> Option<&'a [usize]> {
        let (head, tail) = self.offsets.split_first()?;
        let next = *tail.first()?;
        self.offsets = tail;
        let (l, r) = self.indices.split_at(next - *head);
        self.indices = r;
        Some(l)
    }
}

impl<'a> Iterator for DynamicIndexSliceIterMut<'a> {
    type Item = &'a mut [usize];

    fn next(&mut self) -> Option<&'a mut [usize]> {
        let (head, tail) = self.offsets.split_first()?;
        let next = *tail.first()?;
        self.offsets = tail;
        // get a unique mutable reference for indices
        let indices_slice = std::mem::take(&mut self.indices);
        let (l, r) = indices_slice.split_at_mut(next - *head);
        self.indices = r;
        Some(l)
    }
}

/// Convert a triangle mesh into a polygon mesh without merging any faces.
impl From<TriMesh> for PolyMesh {
    fn from(mesh: TriMesh) -> PolyMesh {
        let TriMesh {
            vertex_positions,
            indices,
            face_materials,
            normals,
            channels,
        } = mesh;

        let counts = vec![3; indices.len()];
        let flat: Vec<usize> = bytemuck::cast_slice(&indices).to_vec();
        let mut poly = PolyMesh::from_face_counts(vertex_positions, &counts, flat);
        poly.face_materials = face_materials;
        poly.face_materials.resize(counts.len(), 0);
        poly.normals = normals;
        poly.channels = channels;
        poly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> Vec<[f32; 3]> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]
    }

    #[test]
    fn polymesh_test() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
        ];
        let faces = vec![
            3, 0, 1, 2, // first triangle
            3, 1, 3, 2, // second triangle
            4, 0, 1, 5, 4, // quadrilateral
        ];

        let mesh = PolyMesh::new(points, &faces);
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 3);
        assert_eq!(mesh.num_face_vertices(), 10);
        assert_eq!(mesh.num_edges(), 8);

        assert_eq!(usize::from(mesh.face_to_vertex(1, 1).unwrap()), 3);
        assert_eq!(usize::from(mesh.face_to_vertex(0, 2).unwrap()), 2);
        assert_eq!(mesh.find_edge(2, 1), mesh.find_edge(1, 2));
        assert!(mesh.find_edge(0, 3).is_none());
        assert_eq!(mesh.face_iter().map(|f| f.len()).collect::<Vec<_>>(), vec![3, 3, 4]);
    }

    #[test]
    fn from_trimesh_test() {
        let points = sample_points();
        let tri_faces = vec![
            3, 0, 1, 2, // first triangle
            3, 1, 3, 2, // second triangle
        ];

        let trimesh = TriMesh::new(points.clone(), vec![[0, 1, 2], [1, 3, 2]]);
        let tri_polymesh = PolyMesh::new(points, &tri_faces);
        assert_eq!(PolyMesh::from(trimesh), tri_polymesh);
    }

    #[test]
    fn coplanar_triangles_merge_into_quad() {
        let trimesh = TriMesh::new(sample_points(), vec![[0, 1, 2], [1, 3, 2]]);
        let poly = PolyMesh::from_tri_mesh(trimesh.clone(), 1.0 - 1e-4);
        assert_eq!(poly.num_faces(), 1);
        assert_eq!(poly.face(0).len(), 4);
        assert_eq!(poly.num_edges(), 4);

        // Different materials prevent the merge.
        let mut split = trimesh;
        split.face_materials = vec![0, 1];
        assert_eq!(PolyMesh::from_tri_mesh(split, 1.0 - 1e-4).num_faces(), 2);
    }

    #[test]
    fn seams_prevent_merging() {
        let mut trimesh = TriMesh::new(sample_points(), vec![[0, 1, 2], [1, 3, 2]]);
        // Corner of vertex 1 in the second face uses a different uv.
        trimesh.set_channel(
            1,
            MapChannel::new(vec![[0.0; 3]; 7], vec![0, 1, 2, 6, 3, 5]),
        );
        assert_eq!(PolyMesh::from_tri_mesh(trimesh, 1.0 - 1e-4).num_faces(), 2);
    }

    #[test]
    fn triangulate_carries_channels() {
        let mut mesh = PolyMesh::new(sample_points(), &[4, 0, 1, 3, 2]);
        mesh.face_materials = vec![7];
        mesh.set_channel(1, MapChannel::new(vec![[0.0; 3]; 4], vec![0, 1, 2, 3]));
        let tri = mesh.to_tri_mesh();
        assert_eq!(tri.indices.len(), 2);
        assert_eq!(tri.face_materials, vec![7, 7]);
        let uv = tri.channel(1).unwrap();
        // Channel corners follow the vertices they belong to.
        let vert_to_uv = [0, 1, 3, 2];
        for (t, tri_face) in tri.indices.iter().enumerate() {
            for k in 0..3 {
                assert_eq!(uv.indices[3 * t + k], vert_to_uv[tri_face[k]]);
            }
        }
    }

    #[test]
    fn make_convex_splits_concave_faces() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [2.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 2.0, 0.0],
            [0.0, 2.0, 0.0],
        ];
        let mut mesh = PolyMesh::new(points, &[6, 0, 1, 2, 3, 4, 5]);
        mesh.set_edge_crease(mesh.find_edge(0, 1).unwrap(), 0.5);
        assert_eq!(mesh.make_convex(), 1);
        assert_eq!(mesh.num_faces(), 4);
        assert!(mesh.face_iter().all(|f| f.len() == 3));
        // Creases survive the rebuild of the edge list.
        assert_eq!(mesh.edge_crease(mesh.find_edge(0, 1).unwrap()), 0.5);
        assert_eq!(mesh.make_convex(), 0);
    }

    #[test]
    fn make_planar_splits_folded_quads() {
        let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0]];
        let mut mesh = PolyMesh::new(points.clone(), &[4, 0, 1, 2, 3]);
        assert_eq!(mesh.make_planar(1.0 - f32::EPSILON), 1);
        assert_eq!(mesh.num_faces(), 2);

        let mut flat = PolyMesh::new(sample_points(), &[4, 0, 1, 3, 2]);
        assert_eq!(flat.make_planar(1.0 - f32::EPSILON), 0);
    }

    #[test]
    fn collapse_dead_structs_remaps_everything() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [5.0, 5.0, 5.0],
        ];
        let mut mesh = PolyMesh::new(points, &[3, 0, 1, 2, 3, 1, 3, 2, 3, 2, 3, 4]);
        mesh.face_materials = vec![1, 2, 3];
        mesh.set_vertex_crease(3, 0.25);
        mesh.set_edge_crease(mesh.find_edge(1, 3).unwrap(), 1.0);
        mesh.kill_vertex(0);
        mesh.kill_vertex(4);

        assert_eq!(mesh.collapse_dead_structs(), (2, 2));
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.face(0), &[0, 2, 1]);
        assert_eq!(mesh.face_materials, vec![2]);
        assert_eq!(mesh.vertex_crease(2), 0.25);
        assert_eq!(mesh.edge_crease(mesh.find_edge(0, 2).unwrap()), 1.0);
    }

    #[test]
    fn reverse_flips_corner_data() {
        let mut mesh = PolyMesh::new(sample_points(), &[3, 0, 1, 2, 3, 1, 3, 2]);
        mesh.set_channel(0, MapChannel::new(vec![[0.0; 3]; 6], vec![0, 1, 2, 3, 4, 5]));
        mesh.reverse();
        assert_eq!(mesh.indices, vec![2, 1, 0, 2, 3, 1]);
        assert_eq!(mesh.channel(0).unwrap().indices, vec![2, 1, 0, 5, 4, 3]);
    }

    #[test]
    fn unused_vertices_are_removed() {
        let mut points = sample_points();
        points.insert(0, [9.0; 3]);
        let mut mesh = PolyMesh::new(points, &[3, 1, 2, 3]);
        assert_eq!(mesh.remove_unused_vertices(), 2);
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.face(0), &[0, 1, 2]);
    }
}
