pub mod channel;
pub mod facade;
pub mod normals;
pub mod polymesh;
pub mod topology;
pub mod transform_impl;
pub mod trimesh;
pub mod vertex_positions;

// Re-export meshes and traits
pub use self::channel::*;
pub use self::facade::{MeshFacade, NativeMesh};
pub use self::normals::SpecifiedNormals;
pub use self::polymesh::PolyMesh;
pub use self::topology::*;
pub use self::trimesh::TriMesh;
pub use self::vertex_positions::VertexPositions;
