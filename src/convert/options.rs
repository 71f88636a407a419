//!
//! Per-call configuration of the export and import engines.
//!

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::mesh::channel::*;
use crate::scene::ValueType;

/// Face encoding written to the scene.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeshFormat {
    /// Keep the encoding of the source mesh.
    #[default]
    FromScene,
    /// Convert triangle meshes to polygons before export.
    PolyMesh,
    /// Triangulate polygon meshes before export.
    TriMesh,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NormalsMode {
    /// A `normals` attribute with interpolation and optional indices.
    #[default]
    AsPrimvar,
    /// The plain normals attribute of the mesh node, never indexed.
    AsAttribute,
    /// Do not write normals.
    None,
}

/// When the exporter may pick a layout cheaper than indexed face-varying.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LayoutInference {
    Never,
    /// Only on non-animated exports.
    #[default]
    IfStatic,
}

/// Attribute types a channel can be exported as.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeType {
    Float,
    Float2,
    Float3,
    TexCoord2f,
    TexCoord3f,
    Color3f,
}

impl AttributeType {
    pub fn dim(self) -> usize {
        match self {
            AttributeType::Float => 1,
            AttributeType::Float2 | AttributeType::TexCoord2f => 2,
            AttributeType::Float3 | AttributeType::TexCoord3f | AttributeType::Color3f => 3,
        }
    }

    pub fn value_type(self) -> ValueType {
        match self {
            AttributeType::Float => ValueType::FLOAT,
            AttributeType::Float2 => ValueType::FLOAT2,
            AttributeType::Float3 => ValueType::FLOAT3,
            AttributeType::TexCoord2f => ValueType::TEXCOORD2F,
            AttributeType::TexCoord3f => ValueType::TEXCOORD3F,
            AttributeType::Color3f => ValueType::COLOR3F,
        }
    }

    /// The type of the same family holding `dim` components.
    ///
    /// Families without a type of that dimension fall back to plain floats. The result never has
    /// fewer components than `self`.
    pub fn expanded_to(self, dim: usize) -> AttributeType {
        if dim <= self.dim() {
            return self;
        }
        let family: [AttributeType; 3] = match self {
            AttributeType::Float | AttributeType::Float2 | AttributeType::Float3 => {
                [AttributeType::Float, AttributeType::Float2, AttributeType::Float3]
            }
            AttributeType::TexCoord2f | AttributeType::TexCoord3f => {
                [AttributeType::Float, AttributeType::TexCoord2f, AttributeType::TexCoord3f]
            }
            AttributeType::Color3f => [AttributeType::Float, AttributeType::Float2, AttributeType::Color3f],
        };
        match dim {
            1..=3 => family[dim - 1],
            _ => AttributeType::Float3,
        }
    }
}

/// How one numbered channel is exported.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelExportConfig {
    /// Target attribute name. An empty name disables the channel.
    pub name: String,
    pub ty: AttributeType,
    /// Widen the type when the data uses more components than it holds.
    pub auto_expand_type: bool,
}

impl ChannelExportConfig {
    pub fn new(name: impl Into<String>, ty: AttributeType) -> Self {
        ChannelExportConfig {
            name: name.into(),
            ty,
            auto_expand_type: false,
        }
    }

    /// The default configuration of a channel.
    pub fn default_for(id: ChannelId) -> Self {
        match id {
            ALPHA_CHANNEL => Self::new("displayOpacity", AttributeType::Float),
            SHADING_CHANNEL => Self::new("mapShading", AttributeType::Color3f),
            VERTEX_COLOR_CHANNEL => Self::new("vertexColor", AttributeType::Color3f),
            MAIN_UV_CHANNEL => Self::new("st", AttributeType::TexCoord2f),
            n => Self::new(format!("st{}", n - 1), AttributeType::TexCoord2f),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportOptions {
    pub mesh_format: MeshFormat,
    pub normals_mode: NormalsMode,
    /// Split non-planar faces so the exported edges keep their orientation.
    pub preserve_edge_orientation: bool,
    /// Apply the object offset transform to the exported points and normals.
    pub bake_object_offset: bool,
    pub layout_inference: LayoutInference,
    /// Channel export table. Channels missing from the table are not exported.
    pub channels: BTreeMap<ChannelId, ChannelExportConfig>,
    /// Subset names for material ids. Ids without a name get `_<id + 1>_`.
    pub material_slot_names: BTreeMap<u16, String>,
    /// Color authored as `displayColor` when the node has none.
    pub fallback_display_color: Option<[f32; 3]>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            mesh_format: MeshFormat::default(),
            normals_mode: NormalsMode::default(),
            preserve_edge_orientation: false,
            bake_object_offset: true,
            layout_inference: LayoutInference::default(),
            channels: (MIN_CHANNEL..MAX_CHANNELS)
                .map(|id| (id, ChannelExportConfig::default_for(id)))
                .collect(),
            material_slot_names: BTreeMap::new(),
            fallback_display_color: None,
        }
    }
}

impl ExportOptions {
    /// Configure the export of a channel.
    pub fn set_channel(&mut self, id: ChannelId, config: ChannelExportConfig) {
        self.channels.insert(id, config);
    }

    /// Stop exporting a channel.
    pub fn disable_channel(&mut self, id: ChannelId) {
        if let Some(config) = self.channels.get_mut(&id) {
            config.name.clear();
        }
    }

    /// The configuration of an enabled channel.
    pub fn channel(&self, id: ChannelId) -> Option<&ChannelExportConfig> {
        self.channels.get(&id).filter(|c| !c.name.is_empty())
    }
}

/// Where an imported attribute goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ImportTarget {
    Channel(ChannelId),
    /// Do not import the attribute.
    Ignore,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImportOptions {
    /// Explicit attribute name to channel mappings. These take precedence over the default names.
    pub mappings: BTreeMap<String, ImportTarget>,
    /// Also map the well known attribute names, like `st` to channel 1.
    pub use_default_names: bool,
    /// Infer channels for attributes without a mapping.
    pub import_unmapped: bool,
    /// Remove vertices no face refers to.
    pub clean_mesh: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            mappings: BTreeMap::new(),
            use_default_names: true,
            import_unmapped: false,
            clean_mesh: true,
        }
    }
}

impl ImportOptions {
    pub fn map(&mut self, name: impl Into<String>, target: ImportTarget) {
        self.mappings.insert(name.into(), target);
    }

    /// Target of the named attribute, if it is mapped at all.
    pub fn target_for(&self, name: &str) -> Option<ImportTarget> {
        if let Some(&target) = self.mappings.get(name) {
            return Some(target);
        }
        if self.use_default_names {
            default_channel_for_name(name).map(ImportTarget::Channel)
        } else {
            None
        }
    }
}

/// Channel conventionally associated with an attribute name.
///
/// ```
/// use scenemesh::convert::default_channel_for_name;
///
/// assert_eq!(default_channel_for_name("st"), Some(1));
/// assert_eq!(default_channel_for_name("uv_2"), Some(3));
/// assert_eq!(default_channel_for_name("map7"), Some(7));
/// assert_eq!(default_channel_for_name("normals"), None);
/// ```
pub fn default_channel_for_name(name: &str) -> Option<ChannelId> {
    match name {
        "displayOpacity" => return Some(ALPHA_CHANNEL),
        "mapShading" => return Some(SHADING_CHANNEL),
        "vertexColor" => return Some(VERTEX_COLOR_CHANNEL),
        "st" | "uv" => return Some(MAIN_UV_CHANNEL),
        _ => {}
    }
    let parse = |digits: &str| -> Option<ChannelId> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    };
    let id = if let Some(n) = name.strip_prefix("map") {
        parse(n)?
    } else {
        let rest = name.strip_prefix("st").or_else(|| name.strip_prefix("uv"))?;
        parse(rest.strip_prefix('_').unwrap_or(rest))?.checked_add(1)?
    };
    Some(id).filter(|&id| is_valid_channel(id))
}
