//! Conversion between native polygon meshes and time-sampled scene description mesh nodes.
//!
//! # Overview
//!
//! Native meshes ([`PolyMesh`] and [`TriMesh`]) store single precision positions, numbered map
//! channels, per-face materials, explicit normals and crease weights. Scene meshes
//! ([`scene::MeshNode`]) store the same data as named, time-sampled attributes with an
//! interpolation each.
//!
//! [`convert::MeshExporter`] writes a native mesh into a node one frame at a time, skipping
//! samples that would repeat what the node already holds. [`convert::MeshImporter`] reads a node
//! at a time code back into a [`PolyMesh`], reporting malformed data as diagnostics rather than
//! failing.

pub mod bbox;
pub mod interval;
pub mod ops;
pub mod prim;

pub mod mesh;
pub mod scene;

pub mod convert;

// public re-exports
pub use crate::convert::Error;
pub use crate::mesh::*;
