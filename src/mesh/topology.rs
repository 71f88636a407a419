#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Native meshes are made of faces, edges and vertices. A face refers to its vertices through
/// face-vertices, also called corners, which is where per-corner data like texture coordinates
/// lives. The traits in this module define the mapping between these components.

macro_rules! impl_index_type {
    ($index_type:ident) => {
        /// Define index type
        #[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Eq, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $index_type(usize);

        impl $index_type {
            #[inline]
            pub fn into_inner(self) -> usize {
                self.0
            }
        }

        impl Add<usize> for $index_type {
            type Output = $index_type;

            #[inline]
            fn add(self, rhs: usize) -> $index_type {
                $index_type(self.0 + rhs)
            }
        }

        impl Sub<usize> for $index_type {
            type Output = $index_type;

            #[inline]
            fn sub(self, rhs: usize) -> $index_type {
                $index_type(self.0 - rhs)
            }
        }

        impl From<$index_type> for usize {
            #[inline]
            fn from(i: $index_type) -> usize {
                i.0
            }
        }

        impl From<usize> for $index_type {
            #[inline]
            fn from(i: usize) -> Self {
                $index_type(i)
            }
        }
    };
}

impl_index_type!(VertexIndex);
impl_index_type!(EdgeIndex);
impl_index_type!(FaceIndex);
impl_index_type!(FaceVertexIndex);
impl_index_type!(EdgeVertexIndex);

// Simple quantifiers
pub trait NumVertices {
    fn num_vertices(&self) -> usize;
}
pub trait NumEdges {
    fn num_edges(&self) -> usize;
}
pub trait NumFaces {
    fn num_faces(&self) -> usize;
}

// Topology interfaces

macro_rules! def_topo_trait {
    (
        $type:ident :
        $topo_fn:ident,
        $dst_fn:ident,
        $transport_fn:ident,
        $num_fn:ident,
        $num_at_fn:ident;
        $from_index:ident,
        $to_index:ident,
        $topo_index:ident
    ) => {
        pub trait $type {
            /// Index of the destination element from the source index.
            fn $transport_fn<I>(&self, i: I, k: usize) -> Option<$to_index>
            where
                I: Copy + Into<$from_index>,
            {
                self.$topo_fn(i, k).map(|j| self.$dst_fn(j))
            }

            /// Index of the destination element given the topology index.
            fn $dst_fn<I>(&self, i: I) -> $to_index
            where
                I: Copy + Into<$topo_index>;

            /// Toplogy index: where the data lives in a per-connector array.
            fn $topo_fn<I>(&self, i: I, k: usize) -> Option<$topo_index>
            where
                I: Copy + Into<$from_index>;

            /// Topology quantifier. Number of connectors in total.
            fn $num_fn(&self) -> usize;

            /// Topology quantifier. Number of connectors at a particular element.
            fn $num_at_fn<I>(&self, i: I) -> usize
            where
                I: Copy + Into<$from_index>;
        }
    };
}

def_topo_trait!(FaceVertex: face_vertex, vertex, face_to_vertex, num_face_vertices, num_vertices_at_face;
                FaceIndex, VertexIndex, FaceVertexIndex);
def_topo_trait!(EdgeVertex: edge_vertex, edge_endpoint, edge_to_vertex, num_edge_vertices, num_vertices_at_edge;
                EdgeIndex, VertexIndex, EdgeVertexIndex);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_arithmetic() {
        let fv = FaceVertexIndex::from(4);
        assert_eq!(usize::from(fv + 2), 6);
        assert_eq!((fv - 1).into_inner(), 3);
        assert!(VertexIndex::from(1) < VertexIndex::from(2));
    }
}
