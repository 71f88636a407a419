//!
//! Crease transfer between native weights in `[0, 1]` and scene sharpness in `[0, 10]`.
//!
//! Scene sharpness values of 10 and above mean infinitely sharp, so the mapping is only
//! invertible below that boundary.
//!

use crate::mesh::polymesh::{edge_key, PolyMesh};

use super::diagnostics::Diagnostics;

/// Scene sharpness of a native weight of 1.
pub const SHARPNESS_SCALE: f32 = 10.0;

/// Native crease weight to scene sharpness.
///
/// ```
/// use scenemesh::convert::crease::to_sharpness;
///
/// assert_eq!(to_sharpness(0.5), 5.0);
/// assert_eq!(to_sharpness(3.0), 10.0);
/// ```
#[inline]
pub fn to_sharpness(weight: f32) -> f32 {
    weight.clamp(0.0, 1.0) * SHARPNESS_SCALE
}

/// Scene sharpness to native crease weight.
#[inline]
pub fn from_sharpness(sharpness: f32) -> f32 {
    (sharpness / SHARPNESS_SCALE).clamp(0.0, 1.0)
}

/// Corner sharpness arrays: one point index per sharpness.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CornerCreases {
    pub indices: Vec<i32>,
    pub sharpnesses: Vec<f32>,
}

/// Edge crease arrays. Every crease here is a single edge, so all lengths are 2.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeCreases {
    pub indices: Vec<i32>,
    pub lengths: Vec<i32>,
    pub sharpnesses: Vec<f32>,
}

/// Collect non-zero vertex creases as scene corner sharpness.
pub fn corner_creases(weights: &[f32]) -> CornerCreases {
    let mut out = CornerCreases::default();
    for (v, &w) in weights.iter().enumerate() {
        let s = to_sharpness(w);
        if s > 0.0 {
            out.indices.push(v as i32);
            out.sharpnesses.push(s);
        }
    }
    out
}

/// Collect non-zero edge creases as scene crease arrays.
pub fn edge_creases(edges: &[[usize; 2]], weights: &[f32]) -> EdgeCreases {
    let mut out = EdgeCreases::default();
    for (&[a, b], &w) in edges.iter().zip(weights.iter()) {
        let s = to_sharpness(w);
        if s > 0.0 {
            out.indices.extend_from_slice(&[a as i32, b as i32]);
            out.lengths.push(2);
            out.sharpnesses.push(s);
        }
    }
    out
}

/// Apply scene corner sharpness to the vertices of `mesh`.
pub fn apply_corner_creases(mesh: &mut PolyMesh, indices: &[i32], sharpnesses: &[f32], diags: &mut Diagnostics) {
    if indices.len() != sharpnesses.len() {
        diags.shape(
            Some("cornerSharpnesses"),
            format!(
                "{} corner indices but {} sharpness values, ignoring corner creases",
                indices.len(),
                sharpnesses.len()
            ),
        );
        return;
    }
    let num_verts = mesh.vertex_positions.len();
    let mut skipped = 0;
    for (&v, &s) in indices.iter().zip(sharpnesses.iter()) {
        match usize::try_from(v) {
            Ok(v) if v < num_verts => mesh.set_vertex_crease(v, from_sharpness(s)),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        diags.shape(
            Some("cornerIndices"),
            format!("{} corner indices out of range", skipped),
        );
    }
}

/// Apply scene crease chains to the edges of `mesh`.
///
/// A chain of `n` points covers `n - 1` edges. Sharpness is given either once per chain or once
/// per edge. Pairs of points not joined by an edge are skipped.
pub fn apply_edge_creases(
    mesh: &mut PolyMesh,
    indices: &[i32],
    lengths: &[i32],
    sharpnesses: &[f32],
    diags: &mut Diagnostics,
) {
    let total: i64 = lengths.iter().map(|&n| n as i64).sum();
    if lengths.iter().any(|&n| n < 2) || total != indices.len() as i64 {
        diags.shape(
            Some("creaseLengths"),
            format!(
                "crease lengths do not match {} crease indices, ignoring edge creases",
                indices.len()
            ),
        );
        return;
    }
    let num_edges: usize = lengths.iter().map(|&n| n as usize - 1).sum();
    let per_edge = if sharpnesses.len() == lengths.len() {
        false
    } else if sharpnesses.len() == num_edges {
        true
    } else {
        diags.shape(
            Some("creaseSharpnesses"),
            format!(
                "{} crease sharpness values for {} creases and {} edges, ignoring edge creases",
                sharpnesses.len(),
                lengths.len(),
                num_edges
            ),
        );
        return;
    };

    let lookup = mesh.edge_lookup();
    let mut missing = 0;
    let mut start = 0;
    let mut edge = 0;
    for (chain, &n) in lengths.iter().enumerate() {
        let points = &indices[start..start + n as usize];
        for pair in points.windows(2) {
            let s = if per_edge { sharpnesses[edge] } else { sharpnesses[chain] };
            edge += 1;
            let eidx = match (usize::try_from(pair[0]), usize::try_from(pair[1])) {
                (Ok(a), Ok(b)) => lookup.get(&edge_key(a, b)).copied(),
                _ => None,
            };
            match eidx {
                Some(e) => mesh.set_edge_crease(e, from_sharpness(s)),
                None => missing += 1,
            }
        }
        start += n as usize;
    }
    if missing > 0 {
        diags.shape(
            Some("creaseIndices"),
            format!("{} creased point pairs are not mesh edges", missing),
        );
    }
}
