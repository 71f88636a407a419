//!
//! Resolution of named scene attributes to numbered native channels.
//!

use std::collections::BTreeMap;

use ahash::AHashSet;

use crate::mesh::channel::*;
use crate::scene::{MeshNode, Primvar, ValueType};

use super::diagnostics::Diagnostics;
use super::options::{ImportOptions, ImportTarget};

/// Attributes with a meaning of their own that are never inferred to be channels.
const RESERVED: [&str; 3] = ["displayOpacity", "displayColor", "normals"];

/// Texture coordinate types, most preferred first.
const TEXCOORD_PREFERENCE: [ValueType; 6] = [
    ValueType::TEXCOORD2F,
    ValueType::TEXCOORD2D,
    ValueType::TEXCOORD2H,
    ValueType::TEXCOORD3F,
    ValueType::TEXCOORD3D,
    ValueType::TEXCOORD3H,
];

fn texcoord_rank(ty: &ValueType) -> usize {
    TEXCOORD_PREFERENCE
        .iter()
        .position(|t| t == ty)
        .unwrap_or(TEXCOORD_PREFERENCE.len())
}

/// Assign channels to the attributes of `node`.
///
/// Explicit mappings come first, in attribute name order, and the first attribute to claim a
/// channel keeps it. With `import_unmapped`, the remaining numeric attributes of at most 3
/// components are then placed: channel 1 prefers texture coordinates over plain `float2`
/// attributes, channel 0 takes the first `color3` attribute and the rest fill the lowest free
/// channels from 2 upwards.
pub fn resolve_channels(
    node: &MeshNode,
    options: &ImportOptions,
    diags: &mut Diagnostics,
) -> BTreeMap<ChannelId, String> {
    let mut resolved: BTreeMap<ChannelId, String> = BTreeMap::new();
    let mut mapped = AHashSet::new();

    for (name, pv) in node.primvars.iter() {
        let id = match options.target_for(name) {
            None => continue,
            Some(ImportTarget::Ignore) => {
                mapped.insert(name.as_str());
                continue;
            }
            Some(ImportTarget::Channel(id)) => id,
        };
        mapped.insert(name.as_str());
        if !is_valid_channel(id) {
            diags.type_mismatch(name, format!("mapped to channel {} which does not exist", id));
            continue;
        }
        if pv.ty.dim > 4 || !pv.ty.is_numeric() {
            diags.type_mismatch(
                name,
                format!("{} values do not fit in a channel", pv.ty.name()),
            );
            continue;
        }
        if let Some(owner) = resolved.get(&id) {
            diags.conflict(
                name,
                format!("channel {} is already used by {}, skipping", id, owner),
            );
            continue;
        }
        resolved.insert(id, name.clone());
    }

    if options.import_unmapped {
        let mut candidates: Vec<(&String, &Primvar)> = node
            .primvars
            .iter()
            .filter(|(name, _)| !mapped.contains(name.as_str()) && !RESERVED.contains(&name.as_str()))
            .filter(|(name, pv)| {
                let fits = pv.ty.dim <= 3 && pv.ty.is_numeric();
                if !fits {
                    log::debug!("{}: not inferring a channel for {} ({})", node.path(), name, pv.ty.name());
                }
                fits
            })
            .collect();
        candidates.sort_by_key(|(_, pv)| texcoord_rank(&pv.ty));

        let mut want_uv = !resolved.contains_key(&MAIN_UV_CHANNEL);
        let mut want_color = !resolved.contains_key(&VERTEX_COLOR_CHANNEL);
        let mut uv: Option<usize> = None;
        let mut color: Option<usize> = None;
        for (i, (_, pv)) in candidates.iter().enumerate() {
            if !want_uv && !want_color {
                break;
            }
            if want_uv {
                if pv.ty.is_texcoord() {
                    uv = Some(i);
                    want_uv = false;
                    continue;
                } else if uv.is_none() && pv.ty.is_plain_float2() {
                    // Keep looking for texture coordinates.
                    uv = Some(i);
                    continue;
                }
            }
            if want_color && pv.ty.is_color3() {
                color = Some(i);
                want_color = false;
            }
        }

        if let Some(i) = uv {
            resolved.insert(MAIN_UV_CHANNEL, candidates[i].0.clone());
        }
        if let Some(i) = color {
            resolved.insert(VERTEX_COLOR_CHANNEL, candidates[i].0.clone());
        }

        let mut next = 2;
        for (i, (name, _)) in candidates.iter().enumerate() {
            if Some(i) == uv || Some(i) == color {
                continue;
            }
            while next < MAX_CHANNELS && resolved.contains_key(&next) {
                next += 1;
            }
            if next >= MAX_CHANNELS {
                diags.type_mismatch(name, "no free channel left");
                continue;
            }
            resolved.insert(next, (*name).clone());
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DiagnosticKind;
    use crate::scene::{Interpolation, NodePath};

    fn node_with(attrs: &[(&str, ValueType)]) -> MeshNode {
        let mut node = MeshNode::new(NodePath::new("/mesh").unwrap());
        for &(name, ty) in attrs {
            node.primvar_mut(name, ty, Interpolation::FaceVarying);
        }
        node
    }

    fn unmapped() -> ImportOptions {
        ImportOptions {
            use_default_names: false,
            import_unmapped: true,
            ..Default::default()
        }
    }

    #[test]
    fn texcoords_win_the_main_channel() {
        // "aaa" sorts first by name but is a plain float2.
        let node = node_with(&[("aaa", ValueType::FLOAT2), ("zzz", ValueType::TEXCOORD2F)]);
        let mut diags = Diagnostics::new("/mesh");
        let resolved = resolve_channels(&node, &unmapped(), &mut diags);
        assert_eq!(resolved[&1], "zzz");
        assert_eq!(resolved[&2], "aaa");
        assert!(diags.is_empty());
    }

    #[test]
    fn texcoord_precision_preference() {
        let node = node_with(&[("a", ValueType::TEXCOORD3F), ("b", ValueType::TEXCOORD2H), ("c", ValueType::TEXCOORD2F)]);
        let resolved = resolve_channels(&node, &unmapped(), &mut Diagnostics::new("/mesh"));
        assert_eq!(resolved[&1], "c");
        assert_eq!(resolved[&2], "b");
        assert_eq!(resolved[&3], "a");
    }

    #[test]
    fn plain_float2_fallback_and_colors() {
        let node = node_with(&[
            ("Cd", ValueType::COLOR3F),
            ("displayColor", ValueType::COLOR3F),
            ("flags", ValueType::BOOL),
            ("rgba", ValueType::COLOR4F),
            ("uvish", ValueType::FLOAT2),
        ]);
        let resolved = resolve_channels(&node, &unmapped(), &mut Diagnostics::new("/mesh"));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[&0], "Cd");
        assert_eq!(resolved[&1], "uvish");
    }

    #[test]
    fn explicit_mappings_and_conflicts() {
        let node = node_with(&[
            ("st", ValueType::TEXCOORD2F),
            ("uv", ValueType::TEXCOORD2F),
            ("wide", ValueType::FLOAT4),
            ("bad", ValueType::FLOAT),
            ("junk", ValueType::STRING),
        ]);
        let mut opts = ImportOptions::default();
        opts.map("wide", ImportTarget::Channel(5));
        opts.map("bad", ImportTarget::Channel(100));
        opts.map("junk", ImportTarget::Channel(6));
        let mut diags = Diagnostics::new("/mesh");
        let resolved = resolve_channels(&node, &opts, &mut diags);
        // "st" comes before "uv" in name order.
        assert_eq!(resolved[&1], "st");
        assert_eq!(resolved[&5], "wide");
        assert_eq!(resolved.len(), 2);
        assert_eq!(diags.of_kind(DiagnosticKind::Conflict).count(), 1);
        assert_eq!(diags.of_kind(DiagnosticKind::Type).count(), 2);
    }

    #[test]
    fn ignored_attributes_are_not_inferred() {
        let node = node_with(&[("st", ValueType::TEXCOORD2F), ("extra", ValueType::FLOAT3)]);
        let mut opts = unmapped();
        opts.map("st", ImportTarget::Ignore);
        let resolved = resolve_channels(&node, &opts, &mut Diagnostics::new("/mesh"));
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[&2], "extra");
    }
}
