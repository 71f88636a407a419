//!
//! Numbered per-corner data channels of native meshes.
//!
//! A channel stores an array of values together with one index per face corner. Corners are laid
//! out face after face exactly like the face-vertex indices of the owning mesh, so corner `c` of
//! the mesh reads `values[indices[c]]`.
//!

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number identifying a data channel on a native mesh.
pub type ChannelId = i32;

/// Per-corner opacity.
pub const ALPHA_CHANNEL: ChannelId = -2;
/// Per-corner shading color.
pub const SHADING_CHANNEL: ChannelId = -1;
/// Per-corner vertex color.
pub const VERTEX_COLOR_CHANNEL: ChannelId = 0;
/// The main texture coordinate channel.
pub const MAIN_UV_CHANNEL: ChannelId = 1;
/// The smallest valid channel number.
pub const MIN_CHANNEL: ChannelId = ALPHA_CHANNEL;
/// One past the largest valid channel number.
pub const MAX_CHANNELS: ChannelId = 100;

/// Check that `id` names one of the channels a native mesh can hold.
#[inline]
pub fn is_valid_channel(id: ChannelId) -> bool {
    (MIN_CHANNEL..MAX_CHANNELS).contains(&id)
}

/// Indexed per-corner data.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MapChannel {
    /// Channel values. Unused components are zero.
    pub values: Vec<[f32; 3]>,
    /// One index into `values` per face corner.
    pub indices: Vec<usize>,
}

impl MapChannel {
    pub fn new(values: Vec<[f32; 3]>, indices: Vec<usize>) -> Self {
        MapChannel { values, indices }
    }

    /// A channel assigning one value to every corner of a mesh with `num_corners` corners.
    pub fn uniform(value: [f32; 3], num_corners: usize) -> Self {
        MapChannel {
            values: vec![value],
            indices: vec![0; num_corners],
        }
    }

    #[inline]
    pub fn num_values(&self) -> usize {
        self.values.len()
    }

    /// The value seen by the given corner.
    #[inline]
    pub fn corner_value(&self, corner: usize) -> Option<[f32; 3]> {
        self.indices
            .get(corner)
            .and_then(|&i| self.values.get(i))
            .copied()
    }

    /// Check that the channel covers `num_corners` corners and every index is in range.
    pub fn is_consistent(&self, num_corners: usize) -> bool {
        self.indices.len() == num_corners && self.indices.iter().all(|&i| i < self.values.len())
    }

    /// Drop values no corner refers to, compacting the indices.
    pub fn compact(&mut self) {
        if self.indices.iter().any(|&i| i >= self.values.len()) {
            return;
        }
        let mut remap = vec![usize::MAX; self.values.len()];
        let mut values = Vec::new();
        for idx in self.indices.iter_mut() {
            if remap[*idx] == usize::MAX {
                remap[*idx] = values.len();
                values.push(self.values[*idx]);
            }
            *idx = remap[*idx];
        }
        self.values = values;
    }
}
