//!
//! Native mesh to scene mesh node, one sample time per call.
//!
//! During animated exports each attribute is written only when the validity intervals of the
//! mesh data it depends on say it may have changed since the last written sample.
//!

use std::collections::BTreeMap;

use math::Matrix4;

use crate::mesh::channel::{ChannelId, MapChannel};
use crate::mesh::facade::MeshFacade;
use crate::scene::*;

use super::crease;
use super::diagnostics::Diagnostics;
use super::import::MATERIAL_ID_KEY;
use super::mapped::MappedAttributeBuilder;
use super::options::*;
use super::validity::ChangeChannel::*;
use super::validity::{ChangeChannel, ChannelIntervals};
use super::Error;

/// Smallest cosine between two triangle normals for the triangles to be merged into a polygon.
pub const MERGE_COSINE: f32 = 1.0 - 1e-4;

/// Smallest cosine between corner and face normals of a face considered planar.
const PLANAR_COSINE: f32 = 1.0 - f32::EPSILON;

const EXTENT_DEPS: [ChangeChannel; 2] = [Topology, Geometry];
const POINTS_DEPS: [ChangeChannel; 1] = [Geometry];
const TOPOLOGY_DEPS: [ChangeChannel; 1] = [Topology];
const NORMALS_DEPS: [ChangeChannel; 2] = [Topology, Geometry];
const CHANNEL_DEPS: [ChangeChannel; 3] = [Topology, TexMap, VertexColor];

/// Where and how a single export call writes.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportContext {
    pub time: TimeCode,
    /// Part of an animated sequence. Enables the write gate and forces layouts that stay valid
    /// when the topology changes.
    pub animated: bool,
    pub intervals: ChannelIntervals,
    /// Object offset of the source, baked into the points when the options ask for it.
    pub object_offset: Option<Matrix4<f32>>,
}

impl Default for ExportContext {
    fn default() -> Self {
        ExportContext {
            time: TimeCode::Default,
            animated: false,
            intervals: ChannelIntervals::unknown(),
            object_offset: None,
        }
    }
}

impl ExportContext {
    /// One frame of an animated export.
    pub fn frame(t: f64, intervals: ChannelIntervals) -> Self {
        ExportContext {
            time: TimeCode::At(t),
            animated: true,
            intervals,
            object_offset: None,
        }
    }

    pub fn with_object_offset(mut self, offset: Matrix4<f32>) -> Self {
        self.object_offset = Some(offset);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ExportReport {
    pub diagnostics: Diagnostics,
    /// Attributes written by the call.
    pub written: Vec<String>,
}

impl ExportReport {
    pub fn wrote(&self, attribute: &str) -> bool {
        self.written.iter().any(|w| w == attribute)
    }
}

/// Faces and corners that end up on the node.
struct ExportedFaces {
    counts: Vec<i32>,
    vertex_indices: Vec<i32>,
    /// Corner of the native mesh behind every exported corner.
    corners: Vec<usize>,
    materials: Vec<u16>,
}

impl ExportedFaces {
    /// Collect live faces with at least 3 corners and valid vertex indices.
    fn collect(mesh: &MeshFacade) -> Self {
        let num_verts = mesh.vertex_count();
        let fvi = mesh.face_vertex_indices();
        let mut faces = ExportedFaces {
            counts: Vec::with_capacity(mesh.face_count()),
            vertex_indices: Vec::with_capacity(fvi.len()),
            corners: Vec::with_capacity(fvi.len()),
            materials: Vec::with_capacity(mesh.face_count()),
        };
        for fidx in 0..mesh.face_count() {
            let degree = mesh.face_degree(fidx);
            let start = mesh.face_corner_offset(fidx);
            let Some(face) = fvi.get(start..start + degree) else {
                continue;
            };
            if mesh.is_face_dead(fidx) || degree < 3 || face.iter().any(|&v| v < 0 || v as usize >= num_verts) {
                continue;
            }
            faces.counts.push(degree as i32);
            faces.vertex_indices.extend_from_slice(face);
            faces.corners.extend(start..start + degree);
            faces.materials.push(mesh.face_material(fidx));
        }
        faces
    }

    /// Data index of every exported corner.
    fn gather(&self, indices: impl Fn(usize) -> Option<usize>) -> Vec<usize> {
        self.corners.iter().map(|&c| indices(c).unwrap_or(0)).collect()
    }
}

/// Element counts that tell whether sanitizing reshaped the mesh.
#[derive(PartialEq)]
struct MeshShape {
    faces: usize,
    vertices: usize,
    channel_values: Vec<(ChannelId, usize)>,
}

impl MeshShape {
    fn of(mesh: &MeshFacade) -> Self {
        MeshShape {
            faces: mesh.face_count(),
            vertices: mesh.vertex_count(),
            channel_values: mesh.channel_value_counts(),
        }
    }

    /// Take the shape of the mesh after a sanitize step. Returns whether it changed.
    fn update(&mut self, mesh: &MeshFacade, step: &str) -> bool {
        let after = MeshShape::of(mesh);
        if after == *self {
            return false;
        }
        log::trace!("{}: {} faces before, {} after", step, self.faces, after.faces);
        *self = after;
        true
    }
}

/// Write decisions of one export call.
struct Gate<'a> {
    path: &'a str,
    /// Sample time of an animated export. Static exports always write.
    time: Option<f64>,
    intervals: ChannelIntervals,
}

impl Gate<'_> {
    fn should_write<T>(&self, attribute: &str, deps: &[ChangeChannel], samples: &TimeSamples<T>) -> bool {
        let Some(t) = self.time else {
            return true;
        };
        let write = self.intervals.should_write(deps, t, samples);
        if !write {
            log::debug!("{}: {} is unchanged at time {}", self.path, attribute, t);
        }
        write
    }

    /// Gate a primvar, which is always written when it does not exist yet.
    fn should_write_primvar(&self, node: &MeshNode, name: &str, deps: &[ChangeChannel]) -> bool {
        node.primvar(name)
            .map_or(true, |pv| self.should_write(name, deps, &pv.values))
    }
}

/// Writes native meshes into scene mesh nodes.
#[derive(Clone, Debug)]
pub struct MeshExporter<'a> {
    options: &'a ExportOptions,
}

impl<'a> MeshExporter<'a> {
    pub fn new(options: &'a ExportOptions) -> Self {
        MeshExporter { options }
    }

    /// Write `mesh` into `node` at the context time.
    ///
    /// The facade may be triangulated, polygonized, transformed and sanitized on the way, so
    /// pass a facade the caller does not need unchanged. The call fails only when no face can
    /// be exported.
    pub fn export(
        &self,
        mesh: &mut MeshFacade,
        node: &mut MeshNode,
        ctx: &ExportContext,
    ) -> Result<ExportReport, Error> {
        let path = node.path().to_string();
        let mut report = ExportReport {
            diagnostics: Diagnostics::new(path.clone()),
            written: Vec::new(),
        };
        let gate_time = if ctx.animated { ctx.time.time() } else { None };
        let mut intervals = ctx.intervals;

        match self.options.mesh_format {
            MeshFormat::TriMesh => mesh.triangulate(),
            MeshFormat::PolyMesh if mesh.is_triangulated() => {
                mesh.polygonize(MERGE_COSINE);
                // Which triangles merge can change over time.
                if let Some(t) = gate_time {
                    intervals.collapse_to(t);
                }
            }
            _ => {}
        }

        if self.options.bake_object_offset {
            if let Some(offset) = ctx.object_offset.as_ref() {
                mesh.transform(offset);
            }
        }

        if self.sanitize(mesh) {
            if let Some(t) = gate_time {
                log::debug!("{}: mesh reshaped for export, validity intervals reset at {}", path, t);
                intervals.collapse_to(t);
            }
        }

        if self.options.normals_mode != NormalsMode::None {
            mesh.load_normals();
        }

        let faces = ExportedFaces::collect(mesh);
        if faces.counts.is_empty() {
            return Err(Error::EmptyGeometry {
                path,
                reason: "no face with at least 3 valid corners",
            });
        }

        let gate = Gate {
            path: &path,
            time: gate_time,
            intervals,
        };
        let time = ctx.time;

        if gate.should_write("extent", &EXTENT_DEPS, &node.extent) {
            node.extent.set(time, mesh.bounding_box().extent());
            report.written.push("extent".to_string());
        }

        if gate.should_write("points", &POINTS_DEPS, &node.points) {
            node.points.set(time, mesh.vertex_positions().to_vec());
            report.written.push("points".to_string());
        }

        if gate.should_write("faceVertexCounts", &TOPOLOGY_DEPS, &node.face_vertex_counts) {
            node.face_vertex_counts.set(time, faces.counts.clone());
            node.face_vertex_indices.set(time, faces.vertex_indices.clone());
            node.orientation = Orientation::RightHanded;
            report.written.push("topology".to_string());
            // Material groups follow the faces just written.
            self.write_materials(node, time, &faces.materials, &mut report);
        }

        // Layouts cheaper than indexed face-varying only hold for a fixed topology.
        let force_face_varying = ctx.animated || self.options.layout_inference == LayoutInference::Never;
        let builder = MappedAttributeBuilder::new(&faces.vertex_indices, mesh.vertex_count())
            .force_face_varying(force_face_varying);

        self.write_normals(mesh, node, &faces, &builder, &gate, time, &mut report);
        self.write_channels(mesh, node, &faces, &builder, &gate, time, &mut report);
        self.write_creases(mesh, node, &gate, time, &mut report);

        if let Some(color) = self.options.fallback_display_color {
            if !node.has_primvar("displayColor") {
                node.primvar_mut("displayColor", ValueType::COLOR3F, Interpolation::Constant)
                    .values
                    .set(TimeCode::Default, ArrayValue::from_tuples(&[color], 3));
                report.written.push("primvars:displayColor".to_string());
            }
        }

        log::trace!(
            "{}: exported {} faces at {:?}, wrote {:?}",
            path,
            faces.counts.len(),
            time,
            report.written
        );
        Ok(report)
    }

    /// Reshape the mesh into something the scene can represent. Returns whether the number of
    /// faces, vertices or channel values changed.
    fn sanitize(&self, mesh: &mut MeshFacade) -> bool {
        let mut shape = MeshShape::of(mesh);
        let mut changed = false;
        if self.options.preserve_edge_orientation {
            mesh.make_planar(PLANAR_COSINE);
            changed |= shape.update(mesh, "make_planar");
        }
        mesh.make_convex();
        changed |= shape.update(mesh, "make_convex");
        mesh.cleanup();
        changed |= shape.update(mesh, "cleanup");
        changed
    }

    /// Record face materials as a node id, or as one subset per material.
    fn write_materials(&self, node: &mut MeshNode, time: TimeCode, materials: &[u16], report: &mut ExportReport) {
        let mut groups: BTreeMap<u16, Vec<i32>> = BTreeMap::new();
        for (fidx, &m) in materials.iter().enumerate() {
            groups.entry(m).or_default().push(fidx as i32);
        }

        if groups.len() <= 1 {
            let id = groups.keys().next().copied().unwrap_or(0);
            node.custom_data.insert(MATERIAL_ID_KEY.to_string(), id as i32 + 1);
            for subset in node.subsets.values_mut() {
                subset.indices.set(time, Vec::new());
            }
            report.written.push(MATERIAL_ID_KEY.to_string());
            return;
        }

        node.custom_data.remove(MATERIAL_ID_KEY);
        let mut named: BTreeMap<String, (u16, Vec<i32>)> = BTreeMap::new();
        for (id, faces) in groups {
            let base = match self.options.material_slot_names.get(&id) {
                Some(slot) => make_valid_identifier(slot),
                None => format!("_{}_", id as u32 + 1),
            };
            let mut name = base.clone();
            let mut suffix = 1;
            while named.contains_key(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            named.insert(name, (id, faces));
        }

        for (name, subset) in node.subsets.iter_mut() {
            if !named.contains_key(name) {
                subset.indices.set(time, Vec::new());
            }
        }
        for (name, (id, faces)) in named {
            let subset = node.subset_mut(&name);
            subset.indices.set(time, faces);
            subset.custom_data.insert(MATERIAL_ID_KEY.to_string(), id as i32 + 1);
        }
        report.written.push("subsets".to_string());
    }

    #[allow(clippy::too_many_arguments)]
    fn write_normals(
        &self,
        mesh: &MeshFacade,
        node: &mut MeshNode,
        faces: &ExportedFaces,
        builder: &MappedAttributeBuilder,
        gate: &Gate,
        time: TimeCode,
        report: &mut ExportReport,
    ) {
        let (Some(normals), Some(nml_indices)) = (mesh.normal_data(), mesh.normal_indices()) else {
            return;
        };
        let data_indices = faces.gather(|c| nml_indices.get(c).map(|&i| i as usize));

        match self.options.normals_mode {
            NormalsMode::None => return,
            NormalsMode::AsPrimvar => {
                if !gate.should_write_primvar(node, "normals", &NORMALS_DEPS) {
                    return;
                }
                let layout = builder.build(normals, &data_indices);
                let pv = node.primvar_mut("normals", ValueType::NORMAL3F, layout.interpolation);
                pv.values.set(time, ArrayValue::from_tuples(&layout.values, 3));
                pv.indices.set(time, layout.indices.unwrap_or_default());
            }
            NormalsMode::AsAttribute => {
                if !gate.should_write("normals", &NORMALS_DEPS, &node.normals) {
                    return;
                }
                let layout = builder.build(normals, &data_indices);
                // The plain attribute cannot be indexed.
                let (interpolation, values) = if layout.is_indexed() {
                    (Interpolation::FaceVarying, layout.corner_values(&faces.vertex_indices))
                } else {
                    (layout.interpolation, layout.values)
                };
                node.normals.set(time, values);
                node.normals_interpolation = interpolation;
            }
        }
        node.subdivision_scheme = SubdivisionScheme::None;
        report.written.push("normals".to_string());
    }

    #[allow(clippy::too_many_arguments)]
    fn write_channels(
        &self,
        mesh: &MeshFacade,
        node: &mut MeshNode,
        faces: &ExportedFaces,
        builder: &MappedAttributeBuilder,
        gate: &Gate,
        time: TimeCode,
        report: &mut ExportReport,
    ) {
        for id in mesh.channel_ids() {
            let (Some(config), Some(channel)) = (self.options.channel(id), mesh.channel(id)) else {
                continue;
            };
            if !channel.is_consistent(mesh.corner_count()) {
                report.diagnostics.shape(
                    Some(config.name.as_str()),
                    format!(
                        "channel {} has {} corner indices for {} corners, skipping",
                        id,
                        channel.indices.len(),
                        mesh.corner_count()
                    ),
                );
                continue;
            }
            if !gate.should_write_primvar(node, &config.name, &CHANNEL_DEPS) {
                continue;
            }

            let ty = if config.auto_expand_type {
                config.ty.expanded_to(used_dimensions(channel))
            } else {
                config.ty
            };
            let data_indices = faces.gather(|c| channel.indices.get(c).copied());
            let layout = builder.build(&channel.values, &data_indices);
            let pv = node.primvar_mut(&config.name, ty.value_type(), layout.interpolation);
            pv.values.set(time, ArrayValue::from_tuples(&layout.values, ty.dim()));
            pv.indices.set(time, layout.indices.unwrap_or_default());
            report.written.push(format!("primvars:{}", config.name));
        }
    }

    fn write_creases(
        &self,
        mesh: &MeshFacade,
        node: &mut MeshNode,
        gate: &Gate,
        time: TimeCode,
        report: &mut ExportReport,
    ) {
        if !mesh.supports_creases() {
            return;
        }

        let vertex_creases = mesh.vertex_creases();
        if (vertex_creases.is_some() || node.corner_indices.is_authored())
            && gate.should_write("cornerIndices", &TOPOLOGY_DEPS, &node.corner_indices)
        {
            let corners = crease::corner_creases(vertex_creases.unwrap_or_default());
            node.corner_indices.set(time, corners.indices);
            node.corner_sharpnesses.set(time, corners.sharpnesses);
            report.written.push("cornerCreases".to_string());
        }

        let edge_creases = mesh.edge_creases();
        if (edge_creases.is_some() || node.crease_indices.is_authored())
            && gate.should_write("creaseIndices", &TOPOLOGY_DEPS, &node.crease_indices)
        {
            let creases = match edge_creases {
                Some((edges, weights)) => crease::edge_creases(edges, weights),
                None => crease::EdgeCreases::default(),
            };
            node.crease_indices.set(time, creases.indices);
            node.crease_lengths.set(time, creases.lengths);
            node.crease_sharpnesses.set(time, creases.sharpnesses);
            report.written.push("edgeCreases".to_string());
        }
    }
}

/// Number of leading components needed to hold every non-zero component of the channel.
/// Components below `f32::EPSILON` in magnitude count as zero.
fn used_dimensions(channel: &MapChannel) -> usize {
    channel
        .values
        .iter()
        .map(|v| v.iter().rposition(|&x| x.abs() >= f32::EPSILON).map_or(1, |i| i + 1))
        .max()
        .unwrap_or(1)
}
