#![warn(missing_docs)]

//! Topological and geometric validity analysis for BRep models.
//!
//! The [`Analyzer`] walks every sub-shape of a model and records status
//! codes per sub-shape, both on the shape itself and in the context of a
//! parent (a free edge is only a defect *within a shell*). The topology
//! pass always runs; the geometry pass (curve presence and p-curve
//! deviation) is optional and has a stricter `exact` mode.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use gfuse_geom::{Curve2, Curve3, Surface};
use gfuse_math::poly::segments_properly_intersect;
use gfuse_math::Tolerance;
use gfuse_primitives::Brep;
use gfuse_topo::{
    EdgeId, FaceId, IndexMap, Orientation, ShapeKind, ShapeRef, ShellId, WireId,
};

/// Status codes recorded by the analyzer. `NoError` never appears in
/// results; it exists for reporting layers that need an explicit
/// "all clear" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    /// Nothing wrong.
    NoError,
    /// A wire with no edges.
    EmptyWire,
    /// A wire or shell marked closed that does not close.
    NotClosed,
    /// A wire whose boundary crosses itself in parameter space.
    SelfIntersectingWire,
    /// An edge used by only one face of a shell.
    FreeEdge,
    /// An edge used by more than two faces of a shell.
    InvalidMultiConnexity,
    /// Neighbouring faces traverse a shared edge in the same direction.
    BadOrientation,
    /// An edge without a supporting 3D curve.
    NoCurve3d,
    /// An edge without a parameter-space image on an adjacent face.
    NoCurveOnSurface,
    /// An edge whose p-curve deviates from its 3D curve beyond tolerance.
    InvalidCurveOnSurface,
    /// An edge with a degenerate parameter range.
    InvalidRange,
    /// A shell whose faces do not form one connected set.
    NotConnected,
    /// A negative tolerance on a sub-shape.
    InvalidToleranceValue,
    /// The analyzer could not complete a check on this sub-shape.
    CheckFail,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckStatus::NoError => "NoError",
            CheckStatus::EmptyWire => "EmptyWire",
            CheckStatus::NotClosed => "NotClosed",
            CheckStatus::SelfIntersectingWire => "SelfIntersectingWire",
            CheckStatus::FreeEdge => "FreeEdge",
            CheckStatus::InvalidMultiConnexity => "InvalidMultiConnexity",
            CheckStatus::BadOrientation => "BadOrientation",
            CheckStatus::NoCurve3d => "NoCurve3d",
            CheckStatus::NoCurveOnSurface => "NoCurveOnSurface",
            CheckStatus::InvalidCurveOnSurface => "InvalidCurveOnSurface",
            CheckStatus::InvalidRange => "InvalidRange",
            CheckStatus::NotConnected => "NotConnected",
            CheckStatus::InvalidToleranceValue => "InvalidToleranceValue",
            CheckStatus::CheckFail => "CheckFail",
        };
        f.write_str(name)
    }
}

/// Options controlling the analysis.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Run the geometric pass in addition to topology.
    pub check_geometry: bool,
    /// Fan the per-face work out with rayon.
    pub run_parallel: bool,
    /// Strict deviation checking against the sub-shape tolerances.
    pub exact: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_geometry: true,
            run_parallel: false,
            exact: false,
        }
    }
}

/// Statuses recorded for one sub-shape.
#[derive(Debug, Clone, Default)]
pub struct SubShapeResult {
    /// Statuses of the sub-shape on its own.
    pub statuses: Vec<CheckStatus>,
    /// Statuses that hold only in the context of a parent shape.
    pub contextual: Vec<(ShapeRef, Vec<CheckStatus>)>,
}

impl SubShapeResult {
    /// Whether nothing was recorded.
    pub fn is_clean(&self) -> bool {
        self.statuses.is_empty() && self.contextual.iter().all(|(_, s)| s.is_empty())
    }

    /// Every status, own and contextual, in recording order.
    pub fn all_statuses(&self) -> Vec<CheckStatus> {
        let mut all = self.statuses.clone();
        for (_, statuses) in &self.contextual {
            all.extend(statuses.iter().copied());
        }
        all
    }
}

/// A finding: a status on a sub-shape, optionally within a parent context.
type Finding = (ShapeRef, Option<ShapeRef>, CheckStatus);

/// Validity analyzer over one BRep model.
#[derive(Debug)]
pub struct Analyzer {
    root: ShapeRef,
    results: HashMap<ShapeRef, SubShapeResult>,
}

impl Analyzer {
    /// Analyze `brep` with the given options. Never panics on malformed
    /// input; unverifiable sub-shapes are flagged `CheckFail`.
    pub fn new(brep: &Brep, options: CheckOptions) -> Self {
        let index = IndexMap::new(&brep.topology, brep.root);
        let mut findings: Vec<Finding> = Vec::new();

        check_tolerances(brep, &index, &mut findings);
        check_edges(brep, &index, &options, &mut findings);
        check_free_wires(brep, &index, &mut findings);
        check_faces(brep, &index, &options, &mut findings);
        check_shells(brep, &index, &mut findings);

        let mut results: HashMap<ShapeRef, SubShapeResult> = HashMap::new();
        for (shape, context, status) in findings {
            let entry = results.entry(shape).or_default();
            match context {
                None => {
                    if !entry.statuses.contains(&status) {
                        entry.statuses.push(status);
                    }
                }
                Some(parent) => {
                    match entry.contextual.iter_mut().find(|(p, _)| *p == parent) {
                        Some((_, statuses)) => {
                            if !statuses.contains(&status) {
                                statuses.push(status);
                            }
                        }
                        None => entry.contextual.push((parent, vec![status])),
                    }
                }
            }
        }

        Self {
            root: brep.root,
            results,
        }
    }

    /// Whether no status was recorded anywhere.
    pub fn is_valid(&self) -> bool {
        self.results.values().all(|r| r.is_clean())
    }

    /// The analyzed root shape.
    pub fn root(&self) -> ShapeRef {
        self.root
    }

    /// Result for one sub-shape, if anything was recorded on it.
    pub fn result(&self, shape: ShapeRef) -> Option<&SubShapeResult> {
        self.results.get(&shape)
    }

    /// Iterate all recorded results.
    pub fn results(&self) -> impl Iterator<Item = (ShapeRef, &SubShapeResult)> {
        self.results.iter().map(|(&s, r)| (s, r))
    }
}

fn sub_shapes(index: &IndexMap, kind: ShapeKind) -> Vec<ShapeRef> {
    index
        .iter()
        .map(|(_, shape)| shape)
        .filter(|s| s.kind() == kind)
        .collect()
}

fn check_tolerances(brep: &Brep, index: &IndexMap, findings: &mut Vec<Finding>) {
    for (_, shape) in index.iter() {
        let tolerance = match shape {
            ShapeRef::Vertex(v) => Some(brep.topology.vertices[v].tolerance),
            ShapeRef::Edge(e) => Some(brep.topology.edges[e].tolerance),
            ShapeRef::Face(f) => Some(brep.topology.faces[f].tolerance),
            _ => None,
        };
        if let Some(tolerance) = tolerance {
            if tolerance < 0.0 {
                findings.push((shape, None, CheckStatus::InvalidToleranceValue));
            }
        }
    }
}

fn check_edges(brep: &Brep, index: &IndexMap, options: &CheckOptions, findings: &mut Vec<Finding>) {
    if !options.check_geometry {
        return;
    }
    for shape in sub_shapes(index, ShapeKind::Edge) {
        let ShapeRef::Edge(edge) = shape else { continue };
        let e = &brep.topology.edges[edge];
        match e.curve3 {
            None => findings.push((shape, None, CheckStatus::NoCurve3d)),
            Some(curve) if curve >= brep.geometry.curves3.len() => {
                findings.push((shape, None, CheckStatus::CheckFail));
            }
            Some(_) => {
                let (t0, t1) = e.range;
                if t1 - t0 <= 0.0 {
                    findings.push((shape, None, CheckStatus::InvalidRange));
                }
            }
        }
    }
}

/// Wires not owned by any face still get their basic checks.
fn check_free_wires(brep: &Brep, index: &IndexMap, findings: &mut Vec<Finding>) {
    let mut owned: Vec<WireId> = Vec::new();
    for shape in sub_shapes(index, ShapeKind::Face) {
        if let ShapeRef::Face(f) = shape {
            owned.extend(brep.topology.face_wires(f));
        }
    }
    for shape in sub_shapes(index, ShapeKind::Wire) {
        let ShapeRef::Wire(wire) = shape else { continue };
        if owned.contains(&wire) {
            continue;
        }
        findings.extend(check_wire(brep, wire, None));
    }
}

fn check_wire(brep: &Brep, wire: WireId, context: Option<ShapeRef>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let w = &brep.topology.wires[wire];
    let shape = ShapeRef::Wire(wire);
    if w.edges.is_empty() {
        findings.push((shape, context, CheckStatus::EmptyWire));
        return findings;
    }
    if w.closed && !brep.topology.wire_is_connected(wire) {
        findings.push((shape, context, CheckStatus::NotClosed));
    }
    findings
}

fn check_faces(brep: &Brep, index: &IndexMap, options: &CheckOptions, findings: &mut Vec<Finding>) {
    let faces: Vec<FaceId> = sub_shapes(index, ShapeKind::Face)
        .into_iter()
        .filter_map(|s| match s {
            ShapeRef::Face(f) => Some(f),
            _ => None,
        })
        .collect();

    let check_one = |&face: &FaceId| check_face(brep, face, options);
    let per_face: Vec<Vec<Finding>> = if options.run_parallel {
        faces.par_iter().map(check_one).collect()
    } else {
        faces.iter().map(check_one).collect()
    };
    for findings_of_face in per_face {
        findings.extend(findings_of_face);
    }
}

fn check_face(brep: &Brep, face: FaceId, options: &CheckOptions) -> Vec<Finding> {
    let mut findings = Vec::new();
    let context = Some(ShapeRef::Face(face));
    let f = &brep.topology.faces[face];

    if brep.geometry.surfaces.get(f.surface).is_none() {
        findings.push((ShapeRef::Face(face), None, CheckStatus::CheckFail));
        return findings;
    }

    for wire in brep.topology.face_wires(face) {
        findings.extend(check_wire(brep, wire, context));
    }

    if !options.check_geometry {
        return findings;
    }

    // Every edge needs a parameter-space image on this face, and the image
    // must track the 3D curve within tolerance.
    let mut polygon_reliable = true;
    for (edge_id, _) in brep.topology.face_edges(face) {
        let edge = &brep.topology.edges[edge_id];
        let images: Vec<usize> = edge
            .pcurves
            .iter()
            .filter(|p| p.face == face)
            .map(|p| p.curve2d)
            .collect();
        if images.is_empty() {
            findings.push((ShapeRef::Edge(edge_id), context, CheckStatus::NoCurveOnSurface));
            polygon_reliable = false;
            continue;
        }
        let Some(curve3) = brep.curve3_of(edge_id) else {
            continue;
        };
        let samples = if options.exact { 24 } else { 8 };
        let allowance = if options.exact {
            edge.tolerance.max(Tolerance::CONFUSION)
        } else {
            edge.tolerance.max(1e-4)
        };
        let surface = brep.surface_of(face);
        let (t0, t1) = edge.range;
        'images: for image in images {
            let Some(curve2) = brep.geometry.curves2.get(image) else {
                findings.push((ShapeRef::Edge(edge_id), context, CheckStatus::CheckFail));
                continue;
            };
            for k in 0..=samples {
                let t = t0 + (t1 - t0) * k as f64 / samples as f64;
                let deviation = (surface.eval(curve2.eval(t)) - curve3.eval(t)).norm();
                if deviation > allowance {
                    findings.push((
                        ShapeRef::Edge(edge_id),
                        context,
                        CheckStatus::InvalidCurveOnSurface,
                    ));
                    continue 'images;
                }
            }
        }
    }

    // Boundary self-intersection in parameter space.
    if polygon_reliable {
        for wire in brep.topology.face_wires(face) {
            let samples = if options.exact { 16 } else { 8 };
            let polygon = brep.wire_uv_polygon(face, wire, samples);
            if polygon_self_intersects(&polygon) {
                findings.push((ShapeRef::Wire(wire), context, CheckStatus::SelfIntersectingWire));
            }
        }
    }

    findings
}

fn polygon_self_intersects(polygon: &[gfuse_math::Point2]) -> bool {
    let n = polygon.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        for j in i + 1..n {
            // Skip adjacent segments (they share an endpoint).
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            let c = polygon[j];
            let d = polygon[(j + 1) % n];
            if segments_properly_intersect(&a, &b, &c, &d) {
                return true;
            }
        }
    }
    false
}

fn check_shells(brep: &Brep, index: &IndexMap, findings: &mut Vec<Finding>) {
    for shape in sub_shapes(index, ShapeKind::Shell) {
        let ShapeRef::Shell(shell) = shape else { continue };
        findings.extend(check_shell(brep, shell));
    }
}

fn check_shell(brep: &Brep, shell: ShellId) -> Vec<Finding> {
    let mut findings = Vec::new();
    let context = Some(ShapeRef::Shell(shell));
    let s = &brep.topology.shells[shell];

    // Edge usage across the shell, with the effective traversal direction
    // of every use.
    let mut uses: HashMap<EdgeId, Vec<Orientation>> = HashMap::new();
    for &(face, shell_orientation) in &s.faces {
        let flip = (brep.topology.faces[face].orientation == Orientation::Reversed)
            != (shell_orientation == Orientation::Reversed);
        for (edge, wire_orientation) in brep.topology.face_edges(face) {
            let effective = if flip {
                wire_orientation.reversed()
            } else {
                wire_orientation
            };
            uses.entry(edge).or_default().push(effective);
        }
    }

    let mut open = false;
    for (&edge, orientations) in &uses {
        match orientations.len() {
            1 => {
                findings.push((ShapeRef::Edge(edge), context, CheckStatus::FreeEdge));
                open = true;
            }
            2 => {
                if orientations[0] == orientations[1] {
                    findings.push((ShapeRef::Edge(edge), context, CheckStatus::BadOrientation));
                }
            }
            _ => {
                findings.push((
                    ShapeRef::Edge(edge),
                    context,
                    CheckStatus::InvalidMultiConnexity,
                ));
            }
        }
    }
    if s.closed && open {
        findings.push((ShapeRef::Shell(shell), None, CheckStatus::NotClosed));
    }

    // Face connectivity through shared edges.
    if s.faces.len() > 1 {
        let face_ids: Vec<FaceId> = s.faces.iter().map(|&(f, _)| f).collect();
        let mut component: HashMap<FaceId, usize> = face_ids
            .iter()
            .enumerate()
            .map(|(i, &f)| (f, i))
            .collect();
        let mut edge_faces: HashMap<EdgeId, Vec<FaceId>> = HashMap::new();
        for &face in &face_ids {
            for (edge, _) in brep.topology.face_edges(face) {
                edge_faces.entry(edge).or_default().push(face);
            }
        }
        let mut changed = true;
        while changed {
            changed = false;
            for faces in edge_faces.values() {
                if faces.len() < 2 {
                    continue;
                }
                let smallest = faces
                    .iter()
                    .map(|f| component[f])
                    .min()
                    .unwrap_or_default();
                for f in faces {
                    if component[f] != smallest {
                        component.insert(*f, smallest);
                        changed = true;
                    }
                }
            }
        }
        let mut roots: Vec<usize> = component.values().copied().collect();
        roots.sort_unstable();
        roots.dedup();
        if roots.len() > 1 {
            findings.push((ShapeRef::Shell(shell), None, CheckStatus::NotConnected));
        }
    }

    findings
}
