//!
//! Conversion between native meshes and scene description mesh nodes.
//!
//! [`MeshExporter`] writes a native mesh into a [`MeshNode`](crate::scene::MeshNode) at a sample
//! time, skipping attributes whose source data did not change. [`MeshImporter`] reads a mesh
//! node back into a [`PolyMesh`](crate::mesh::PolyMesh), resolving named attributes to numbered
//! channels.
//!

pub mod crease;
pub mod diagnostics;
pub mod export;
pub mod import;
pub mod mapped;
pub mod options;
pub mod resolve;
pub mod validity;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use export::{ExportContext, ExportReport, MeshExporter};
pub use import::{ImportResult, MeshImporter, MultiMaterial};
pub use options::*;
pub use validity::{ChangeChannel, ChannelIntervals};

/// Failures that abort a conversion call.
///
/// Everything else is reported through [`Diagnostics`] and the call carries on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid node path: {0:?}")]
    InvalidPath(String),
    #[error("Mesh {path} has no usable geometry: {reason}")]
    EmptyGeometry { path: String, reason: &'static str },
    #[error("Mesh {path}: face vertex counts add up to {counted} but there are {indices} face vertex indices")]
    TopologyMismatch {
        path: String,
        counted: usize,
        indices: usize,
    },
}
