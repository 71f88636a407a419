//!
//! A minimal hierarchical scene description holding time sampled mesh nodes.
//!

pub mod mesh_node;
pub mod samples;
pub mod value;

use std::collections::BTreeMap;
use std::fmt;

pub use mesh_node::*;
pub use samples::*;
pub use value::*;

use crate::convert::Error;

/// Absolute path of a node, like `/root/geo/mesh`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePath(String);

impl NodePath {
    /// Parse an absolute path. Every segment must be a valid identifier.
    pub fn new(path: &str) -> Result<Self, Error> {
        let segments = path
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidPath(path.to_string()))?;
        if segments.split('/').all(is_valid_identifier) {
            Ok(NodePath(path.to_string()))
        } else {
            Err(Error::InvalidPath(path.to_string()))
        }
    }

    /// Path of a child node.
    pub fn child(&self, name: &str) -> Result<Self, Error> {
        if is_valid_identifier(name) {
            Ok(NodePath(format!("{}/{}", self.0, name)))
        } else {
            Err(Error::InvalidPath(format!("{}/{}", self.0, name)))
        }
    }

    /// The last path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Check that `name` can be used as a node name.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Turn an arbitrary string into a valid node name.
pub fn make_valid_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

/// A collection of mesh nodes addressed by path.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    meshes: BTreeMap<NodePath, MeshNode>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the mesh node at `path`, creating it if it does not exist.
    pub fn define_mesh(&mut self, path: &str) -> Result<&mut MeshNode, Error> {
        let path = NodePath::new(path)?;
        Ok(self
            .meshes
            .entry(path.clone())
            .or_insert_with(|| MeshNode::new(path)))
    }

    pub fn mesh(&self, path: &str) -> Option<&MeshNode> {
        let path = NodePath::new(path).ok()?;
        self.meshes.get(&path)
    }

    pub fn mesh_mut(&mut self, path: &str) -> Option<&mut MeshNode> {
        let path = NodePath::new(path).ok()?;
        self.meshes.get_mut(&path)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &MeshNode> {
        self.meshes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_paths() {
        assert!(NodePath::new("/root/mesh_1").is_ok());
        assert!(NodePath::new("root").is_err());
        assert!(NodePath::new("/root//mesh").is_err());
        assert!(NodePath::new("/1mesh").is_err());
        let p = NodePath::new("/root/mesh").unwrap();
        assert_eq!(p.name(), "mesh");
        assert!(p.child("bad name").is_err());
        assert_eq!(make_valid_identifier("1 wood-floor"), "_1_wood_floor");
    }

    #[test]
    fn define_is_idempotent() {
        let mut stage = Stage::new();
        stage.define_mesh("/a").unwrap().custom_data.insert("k".into(), 1);
        assert_eq!(stage.define_mesh("/a").unwrap().custom_data["k"], 1);
        assert!(stage.define_mesh("a").is_err());
        assert_eq!(stage.meshes().count(), 1);
        assert!(stage.mesh("/a").is_some());
    }
}
