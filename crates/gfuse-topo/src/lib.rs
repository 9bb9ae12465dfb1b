#![warn(missing_docs)]

//! Arena-based BRep topology for the gfuse crates.
//!
//! Shapes are stored in per-kind slotmap arenas owned by a [`Topology`].
//! Geometry is referenced by plain indices into a geometry store owned by
//! the crate above; the topology itself is geometry-agnostic.
//!
//! The shape hierarchy follows the usual BRep nesting:
//! compound → solid → shell → face → wire → edge → vertex.

use gfuse_math::{Point3, Tolerance};
use slotmap::{new_key_type, SlotMap};

mod copy;
mod explore;

pub use copy::{copy_shape, copy_shape_with_map, StoreOffsets};
pub use explore::{Explorer, IndexMap};

new_key_type! {
    /// Key of a [`Vertex`] in its topology arena.
    pub struct VertexId;
    /// Key of an [`Edge`] in its topology arena.
    pub struct EdgeId;
    /// Key of a [`Wire`] in its topology arena.
    pub struct WireId;
    /// Key of a [`Face`] in its topology arena.
    pub struct FaceId;
    /// Key of a [`Shell`] in its topology arena.
    pub struct ShellId;
    /// Key of a [`Solid`] in its topology arena.
    pub struct SolidId;
    /// Key of a [`Compound`] in its topology arena.
    pub struct CompoundId;
}

/// Orientation of a sub-shape within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The sub-shape is used as stored.
    Forward,
    /// The sub-shape is used with its direction/normal flipped.
    Reversed,
}

impl Orientation {
    /// The opposite orientation.
    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
        }
    }

    /// Compose two orientations (reversal is an involution).
    pub fn compose(self, other: Self) -> Self {
        if self == other {
            Orientation::Forward
        } else {
            Orientation::Reversed
        }
    }
}

/// A topological vertex: a point with a coincidence tolerance.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in 3D space.
    pub point: Point3,
    /// Coincidence tolerance of this vertex.
    pub tolerance: f64,
}

/// The 2D image of an edge on one of its adjacent faces.
///
/// `curve2d` indexes a parameter-space curve in the geometry store; the
/// curve shares the edge's parameter range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pcurve {
    /// The face this p-curve lives on.
    pub face: FaceId,
    /// Index of the 2D curve in the geometry store.
    pub curve2d: usize,
}

/// A topological edge between two vertices.
///
/// A closed edge (full circle, seam) has `start == end`.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Start vertex.
    pub start: VertexId,
    /// End vertex.
    pub end: VertexId,
    /// Index of the supporting 3D curve in the geometry store, if any.
    pub curve3: Option<usize>,
    /// Parameter range of the edge on its 3D curve.
    pub range: (f64, f64),
    /// 2D images of this edge on adjacent faces.
    pub pcurves: Vec<Pcurve>,
    /// Tolerance of this edge (maximum curve deviation it absorbs).
    pub tolerance: f64,
}

impl Edge {
    /// Whether the edge closes on itself.
    pub fn is_closed(&self) -> bool {
        self.start == self.end
    }

    /// First p-curve of this edge on the given face, if one is attached.
    pub fn pcurve_on(&self, face: FaceId) -> Option<usize> {
        self.pcurves
            .iter()
            .find(|p| p.face == face)
            .map(|p| p.curve2d)
    }
}

/// An ordered chain of oriented edges bounding a face.
#[derive(Debug, Clone)]
pub struct Wire {
    /// Edges in traversal order with their use orientation.
    pub edges: Vec<(EdgeId, Orientation)>,
    /// Whether the chain is meant to close back on its first vertex.
    pub closed: bool,
}

/// A face: a surface patch bounded by an outer wire and optional holes.
#[derive(Debug, Clone)]
pub struct Face {
    /// Outer boundary wire.
    pub outer: WireId,
    /// Hole wires.
    pub holes: Vec<WireId>,
    /// Index of the supporting surface in the geometry store.
    pub surface: usize,
    /// Whether the face normal follows the surface normal or opposes it.
    pub orientation: Orientation,
    /// Tolerance of this face.
    pub tolerance: f64,
}

/// A connected set of oriented faces.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Faces with their use orientation within the shell.
    pub faces: Vec<(FaceId, Orientation)>,
    /// Whether the shell is meant to be watertight.
    pub closed: bool,
}

/// A solid bounded by an outer shell and optional internal void shells.
#[derive(Debug, Clone)]
pub struct Solid {
    /// Outer boundary shell.
    pub outer: ShellId,
    /// Internal cavity shells.
    pub voids: Vec<ShellId>,
}

/// A heterogeneous group of shapes.
#[derive(Debug, Clone)]
pub struct Compound {
    /// Member shapes, in insertion order.
    pub members: Vec<ShapeRef>,
}

/// The kind of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// A topological vertex.
    Vertex,
    /// A topological edge.
    Edge,
    /// A wire (edge chain).
    Wire,
    /// A face.
    Face,
    /// A shell (face set).
    Shell,
    /// A solid.
    Solid,
    /// A compound of shapes.
    Compound,
}

/// A typed reference to any shape in a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeRef {
    /// Reference to a vertex.
    Vertex(VertexId),
    /// Reference to an edge.
    Edge(EdgeId),
    /// Reference to a wire.
    Wire(WireId),
    /// Reference to a face.
    Face(FaceId),
    /// Reference to a shell.
    Shell(ShellId),
    /// Reference to a solid.
    Solid(SolidId),
    /// Reference to a compound.
    Compound(CompoundId),
}

impl ShapeRef {
    /// The kind of the referenced shape.
    pub fn kind(self) -> ShapeKind {
        match self {
            ShapeRef::Vertex(_) => ShapeKind::Vertex,
            ShapeRef::Edge(_) => ShapeKind::Edge,
            ShapeRef::Wire(_) => ShapeKind::Wire,
            ShapeRef::Face(_) => ShapeKind::Face,
            ShapeRef::Shell(_) => ShapeKind::Shell,
            ShapeRef::Solid(_) => ShapeKind::Solid,
            ShapeRef::Compound(_) => ShapeKind::Compound,
        }
    }
}

/// Arena container for all shapes of one model.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Vertex arena.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Edge arena.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Wire arena.
    pub wires: SlotMap<WireId, Wire>,
    /// Face arena.
    pub faces: SlotMap<FaceId, Face>,
    /// Shell arena.
    pub shells: SlotMap<ShellId, Shell>,
    /// Solid arena.
    pub solids: SlotMap<SolidId, Solid>,
    /// Compound arena.
    pub compounds: SlotMap<CompoundId, Compound>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            wires: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            shells: SlotMap::with_key(),
            solids: SlotMap::with_key(),
            compounds: SlotMap::with_key(),
        }
    }

    /// Add a vertex at `point` with the default tolerance.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            point,
            tolerance: Tolerance::CONFUSION,
        })
    }

    /// Add an edge between two vertices with no curve attached yet.
    pub fn add_edge(&mut self, start: VertexId, end: VertexId) -> EdgeId {
        self.edges.insert(Edge {
            start,
            end,
            curve3: None,
            range: (0.0, 1.0),
            pcurves: Vec::new(),
            tolerance: Tolerance::CONFUSION,
        })
    }

    /// Add a wire from oriented edges.
    pub fn add_wire(&mut self, edges: Vec<(EdgeId, Orientation)>, closed: bool) -> WireId {
        self.wires.insert(Wire { edges, closed })
    }

    /// Add a face on the given surface, bounded by `outer`.
    pub fn add_face(&mut self, outer: WireId, surface: usize) -> FaceId {
        self.faces.insert(Face {
            outer,
            holes: Vec::new(),
            surface,
            orientation: Orientation::Forward,
            tolerance: Tolerance::CONFUSION,
        })
    }

    /// Add a shell from oriented faces.
    pub fn add_shell(&mut self, faces: Vec<(FaceId, Orientation)>, closed: bool) -> ShellId {
        self.shells.insert(Shell { faces, closed })
    }

    /// Add a solid bounded by `outer`.
    pub fn add_solid(&mut self, outer: ShellId) -> SolidId {
        self.solids.insert(Solid {
            outer,
            voids: Vec::new(),
        })
    }

    /// Add a compound of the given members.
    pub fn add_compound(&mut self, members: Vec<ShapeRef>) -> CompoundId {
        self.compounds.insert(Compound { members })
    }

    /// Endpoints of an edge as traversed with the given orientation.
    pub fn edge_endpoints(&self, edge: EdgeId, orientation: Orientation) -> (VertexId, VertexId) {
        let e = &self.edges[edge];
        match orientation {
            Orientation::Forward => (e.start, e.end),
            Orientation::Reversed => (e.end, e.start),
        }
    }

    /// All wires of a face: the outer wire first, then the holes.
    pub fn face_wires(&self, face: FaceId) -> Vec<WireId> {
        let f = &self.faces[face];
        let mut wires = Vec::with_capacity(1 + f.holes.len());
        wires.push(f.outer);
        wires.extend(f.holes.iter().copied());
        wires
    }

    /// All oriented edge uses of a face, outer wire first.
    pub fn face_edges(&self, face: FaceId) -> Vec<(EdgeId, Orientation)> {
        let mut edges = Vec::new();
        for wire in self.face_wires(face) {
            edges.extend(self.wires[wire].edges.iter().copied());
        }
        edges
    }

    /// Whether consecutive edges of a wire share vertices.
    ///
    /// For a closed wire the last edge must also connect back to the first.
    pub fn wire_is_connected(&self, wire: WireId) -> bool {
        let w = &self.wires[wire];
        if w.edges.is_empty() {
            return false;
        }
        let n = w.edges.len();
        let last = if w.closed { n } else { n - 1 };
        for i in 0..last {
            let (edge, orientation) = w.edges[i];
            let (next_edge, next_orientation) = w.edges[(i + 1) % n];
            let (_, end) = self.edge_endpoints(edge, orientation);
            let (next_start, _) = self.edge_endpoints(next_edge, next_orientation);
            if end != next_start {
                return false;
            }
        }
        true
    }

    /// Direct children of a shape in the BRep nesting order.
    pub fn children(&self, shape: ShapeRef) -> Vec<ShapeRef> {
        match shape {
            ShapeRef::Vertex(_) => Vec::new(),
            ShapeRef::Edge(id) => {
                let e = &self.edges[id];
                if e.is_closed() {
                    vec![ShapeRef::Vertex(e.start)]
                } else {
                    vec![ShapeRef::Vertex(e.start), ShapeRef::Vertex(e.end)]
                }
            }
            ShapeRef::Wire(id) => self.wires[id]
                .edges
                .iter()
                .map(|&(e, _)| ShapeRef::Edge(e))
                .collect(),
            ShapeRef::Face(id) => self
                .face_wires(id)
                .into_iter()
                .map(ShapeRef::Wire)
                .collect(),
            ShapeRef::Shell(id) => self.shells[id]
                .faces
                .iter()
                .map(|&(f, _)| ShapeRef::Face(f))
                .collect(),
            ShapeRef::Solid(id) => {
                let s = &self.solids[id];
                let mut children = vec![ShapeRef::Shell(s.outer)];
                children.extend(s.voids.iter().map(|&v| ShapeRef::Shell(v)));
                children
            }
            ShapeRef::Compound(id) => self.compounds[id].members.clone(),
        }
    }

    /// Whether the shape is a compound.
    pub fn is_composite(&self, shape: ShapeRef) -> bool {
        matches!(shape, ShapeRef::Compound(_))
    }

    /// Create an empty container of the given kind.
    ///
    /// Only container kinds (compound, shell, wire) can be created empty;
    /// returns `None` for kinds that require geometry.
    pub fn make_container(&mut self, kind: ShapeKind) -> Option<ShapeRef> {
        match kind {
            ShapeKind::Compound => Some(ShapeRef::Compound(self.add_compound(Vec::new()))),
            ShapeKind::Shell => Some(ShapeRef::Shell(self.add_shell(Vec::new(), false))),
            ShapeKind::Wire => Some(ShapeRef::Wire(self.add_wire(Vec::new(), false))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(topo: &mut Topology) -> WireId {
        let a = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let ab = topo.add_edge(a, b);
        let bc = topo.add_edge(b, c);
        let ca = topo.add_edge(c, a);
        topo.add_wire(
            vec![
                (ab, Orientation::Forward),
                (bc, Orientation::Forward),
                (ca, Orientation::Forward),
            ],
            true,
        )
    }

    #[test]
    fn test_wire_connectivity() {
        let mut topo = Topology::new();
        let wire = triangle(&mut topo);
        assert!(topo.wire_is_connected(wire));
    }

    #[test]
    fn test_wire_connectivity_broken() {
        let mut topo = Topology::new();
        let a = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let d = topo.add_vertex(Point3::new(5.0, 5.0, 0.0));
        let ab = topo.add_edge(a, b);
        let cd = topo.add_edge(c, d);
        let wire = topo.add_wire(
            vec![(ab, Orientation::Forward), (cd, Orientation::Forward)],
            false,
        );
        assert!(!topo.wire_is_connected(wire));
    }

    #[test]
    fn test_reversed_edge_endpoints() {
        let mut topo = Topology::new();
        let a = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let ab = topo.add_edge(a, b);
        assert_eq!(topo.edge_endpoints(ab, Orientation::Forward), (a, b));
        assert_eq!(topo.edge_endpoints(ab, Orientation::Reversed), (b, a));
    }

    #[test]
    fn test_orientation_compose() {
        use Orientation::{Forward, Reversed};
        assert_eq!(Forward.compose(Forward), Forward);
        assert_eq!(Forward.compose(Reversed), Reversed);
        assert_eq!(Reversed.compose(Reversed), Forward);
    }

    #[test]
    fn test_children_of_solid() {
        let mut topo = Topology::new();
        let wire = triangle(&mut topo);
        let face = topo.add_face(wire, 0);
        let shell = topo.add_shell(vec![(face, Orientation::Forward)], false);
        let solid = topo.add_solid(shell);
        let children = topo.children(ShapeRef::Solid(solid));
        assert_eq!(children, vec![ShapeRef::Shell(shell)]);
    }

    #[test]
    fn test_make_container() {
        let mut topo = Topology::new();
        let compound = topo.make_container(ShapeKind::Compound).unwrap();
        assert!(topo.is_composite(compound));
        assert!(topo.make_container(ShapeKind::Face).is_none());
    }
}
