//!
//! This module defines the `VertexPositions` trait, the intrinsic position data shared by both
//! native mesh encodings.
//!

use crate::bbox::BBox;
use crate::mesh::topology::*;
use crate::ops::*;
use std::slice::{Iter, IterMut};

/// An "intrinsic" trait for accessing vertex positions on a mesh.
pub trait VertexPositions {
    /// Vertex positions as a slice of triplets.
    fn vertex_positions(&self) -> &[[f32; 3]];

    /// Vertex positions as a mutable slice of triplets.
    fn vertex_positions_mut(&mut self) -> &mut [[f32; 3]];

    /// Vertex iterator.
    #[inline]
    fn vertex_position_iter(&self) -> Iter<[f32; 3]> {
        self.vertex_positions().iter()
    }

    /// Mutable vertex iterator.
    #[inline]
    fn vertex_position_iter_mut(&mut self) -> IterMut<[f32; 3]> {
        self.vertex_positions_mut().iter_mut()
    }

    /// Vertex accessor.
    #[inline]
    fn vertex_position<VI>(&self, vidx: VI) -> Option<[f32; 3]>
    where
        VI: Into<VertexIndex>,
    {
        self.vertex_positions()
            .get(usize::from(vidx.into()))
            .copied()
    }
}

impl<M: VertexPositions> BoundingBox<f32> for M {
    /// Compute the bounding box of this object.
    fn bounding_box(&self) -> BBox<f32> {
        BBox::from_points(self.vertex_position_iter())
    }
}
