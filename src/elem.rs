/// A linear line segment
pub mod edge2;
/// A tri-linear hexahedron
pub mod hex8;
/// A line extending from a base point towards infinity
pub mod inf_edge2;
/// A quadrilateral extending from a base edge towards infinity
pub mod inf_quad4;
/// A single point
pub mod node_elem;
/// Non-owning views of an `Elem`'s sides and edges
pub mod proxy;
/// A bi-linear quadrilateral
pub mod quad4;
/// Static per-shape adjacency tables
pub mod topology;

pub use edge2::Edge2;
pub use hex8::Hex8;
pub use inf_edge2::InfEdge2;
pub use inf_quad4::InfQuad4;
pub use node_elem::NodeElem;
pub use proxy::{BoundaryEntity, ProxyElem};
pub use quad4::Quad4;
pub use topology::{NodeKind, Topology};

use crate::connectivity::{ConnectivityError, IoPackage};
use crate::embedding::{interpolate_points, EmbeddingMatrix};
use crate::geom::{mean_point, node::Node, Point};
use crate::quality::{self, ElemQuality, QualBounds};

#[cfg(feature = "json_export")]
use json::{object, JsonValue};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Identifier of the subdomain (material region, block, etc.) an `Elem` belongs to
pub type SubdomainId = u16;

/// The shape of an [Elem]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElemType {
    NodeElem,
    Edge2,
    InfEdge2,
    Quad4,
    InfQuad4,
    Hex8,
}

impl ElemType {
    pub const ALL: [Self; 6] = [
        Self::NodeElem,
        Self::Edge2,
        Self::InfEdge2,
        Self::Quad4,
        Self::InfQuad4,
        Self::Hex8,
    ];

    /// The static adjacency tables associated with this shape
    pub fn topology(self) -> &'static Topology {
        match self {
            Self::NodeElem => &node_elem::TOPOLOGY,
            Self::Edge2 => &edge2::TOPOLOGY,
            Self::InfEdge2 => &inf_edge2::TOPOLOGY,
            Self::Quad4 => &quad4::TOPOLOGY,
            Self::InfQuad4 => &inf_quad4::TOPOLOGY,
            Self::Hex8 => &hex8::TOPOLOGY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::NodeElem => "NODEELEM",
            Self::Edge2 => "EDGE2",
            Self::InfEdge2 => "INFEDGE2",
            Self::Quad4 => "QUAD4",
            Self::InfQuad4 => "INFQUAD4",
            Self::Hex8 => "HEX8",
        }
    }

    /// Does this shape extend towards infinity
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::InfEdge2 | Self::InfQuad4)
    }

    /// Length, area or volume of an `Elem` of this shape with the given Node locations
    ///
    /// panics if the shape has no finite measure
    pub fn measure(self, points: &[Point]) -> Result<f64, GeometryError> {
        contract!(
            points.len() == self.topology().n_nodes(),
            "{} Elems have {} Nodes; cannot compute the measure of {} Points!",
            self,
            self.topology().n_nodes(),
            points.len()
        );

        match self {
            Self::NodeElem => NodeElem::measure(points),
            Self::Edge2 => Edge2::measure(points),
            Self::InfEdge2 => InfEdge2::measure(points),
            Self::Quad4 => Quad4::measure(points),
            Self::InfQuad4 => InfQuad4::measure(points),
            Self::Hex8 => Hex8::measure(points),
        }
    }

    /// Is the mapping from the reference shape onto these Node locations affine
    pub fn affine(self, points: &[Point]) -> bool {
        contract!(
            points.len() == self.topology().n_nodes(),
            "{} Elems have {} Nodes; cannot check the affinity of {} Points!",
            self,
            self.topology().n_nodes(),
            points.len()
        );

        match self {
            Self::NodeElem => NodeElem::affine(points),
            Self::Edge2 => Edge2::affine(points),
            Self::InfEdge2 => InfEdge2::affine(points),
            Self::Quad4 => Quad4::affine(points),
            Self::InfQuad4 => InfQuad4::affine(points),
            Self::Hex8 => Hex8::affine(points),
        }
    }

    /// Compute a shape quality measure for an `Elem` of this shape. Returns `None` if the measure is not implemented.
    pub fn quality(self, points: &[Point], measure: ElemQuality) -> Option<f64> {
        match self {
            Self::NodeElem => NodeElem::shape_quality(points, measure),
            Self::Edge2 => Edge2::shape_quality(points, measure),
            Self::InfEdge2 => InfEdge2::shape_quality(points, measure),
            Self::Quad4 => Quad4::shape_quality(points, measure),
            Self::InfQuad4 => InfQuad4::shape_quality(points, measure),
            Self::Hex8 => Hex8::shape_quality(points, measure),
        }
    }

    /// Construct a new owned `Elem` of this shape
    ///
    /// panics if the number of `nodes` does not match the shape
    pub fn build(self, nodes: Vec<Arc<Node>>, links: ElemLinks) -> Box<dyn Elem> {
        match self {
            Self::NodeElem => Box::new(NodeElem::with_links(node_array(self, nodes), links)),
            Self::Edge2 => Box::new(Edge2::with_links(node_array(self, nodes), links)),
            Self::InfEdge2 => Box::new(InfEdge2::with_links(node_array(self, nodes), links)),
            Self::Quad4 => Box::new(Quad4::with_links(node_array(self, nodes), links)),
            Self::InfQuad4 => Box::new(InfQuad4::with_links(node_array(self, nodes), links)),
            Self::Hex8 => Box::new(Hex8::with_links(node_array(self, nodes), links)),
        }
    }
}

fn node_array<const N: usize>(elem_type: ElemType, nodes: Vec<Arc<Node>>) -> [Arc<Node>; N] {
    nodes.try_into().unwrap_or_else(|nodes: Vec<Arc<Node>>| {
        panic!(
            "{} Elems have {} Nodes; cannot build one from {} Nodes!",
            elem_type,
            N,
            nodes.len()
        )
    })
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown Elem type: '{0}'")]
pub struct UnknownElemType(pub String);

impl FromStr for ElemType {
    type Err = UnknownElemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|elem_type| elem_type.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownElemType(s.to_string()))
    }
}

/// Conditions that make the geometry of an `Elem` unusable
///
/// Unlike out-of-range indices, these depend on mesh data rather than caller logic, so they are returned to the caller
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("sub-volume {index} of {elem_type} Elem is non-positive ({volume:e}); the Elem is degenerate, inverted or has misordered Nodes")]
    NonPositiveSubVolume {
        elem_type: ElemType,
        index: usize,
        volume: f64,
    },
    #[error("{elem_type} Elem has non-positive measure ({measure:e}); the Elem is degenerate")]
    DegenerateMeasure { elem_type: ElemType, measure: f64 },
}

/// Static geometry of a leaf shape, shared by owned `Elem`s and [ProxyElem]s
pub trait Shape {
    const TYPE: ElemType;

    /// Length, area or volume
    fn measure(points: &[Point]) -> Result<f64, GeometryError>;

    /// Constant Jacobian test
    fn affine(points: &[Point]) -> bool;

    fn shape_quality(_points: &[Point], _measure: ElemQuality) -> Option<f64> {
        None
    }
}

/// Identity, subdomain and refinement-tree links of an `Elem`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElemLinks {
    /// Position in the owning `Mesh`. `None` for `Elem`s that have not been added to a `Mesh`
    pub id: Option<usize>,
    pub subdomain_id: SubdomainId,
    parent: Option<usize>,
    children: Option<SmallVec<[usize; 8]>>,
    level: u8,
}

impl ElemLinks {
    pub fn new(id: Option<usize>, subdomain_id: SubdomainId) -> Self {
        Self {
            id,
            subdomain_id,
            parent: None,
            children: None,
            level: 0,
        }
    }

    /// Links for the child of an `Elem` (inheriting its subdomain)
    pub fn child_of(id: usize, parent: &Self) -> Self {
        Self {
            id: Some(id),
            subdomain_id: parent.subdomain_id,
            parent: parent.id,
            children: None,
            level: parent.level + 1,
        }
    }

    pub fn parent_id(&self) -> Option<usize> {
        self.parent
    }

    pub fn child_ids(&self) -> Option<&[usize]> {
        self.children.as_deref()
    }

    /// Number of h-refinements between this `Elem` and its ancestor on the base layer of the mesh
    pub fn level(&self) -> u8 {
        self.level
    }

    pub(crate) fn set_children(&mut self, children: SmallVec<[usize; 8]>) {
        assert!(
            self.children.is_none(),
            "Elem {:?} already has children {:?}; cannot set to {:?}",
            self.id,
            self.children,
            children
        );
        self.children = Some(children);
    }
}

/// Key describing the set of Nodes on an `Elem`s side, independent of their order
///
/// Two `Elem`s with the same `SideKey` on one of their sides are neighbors across that side
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SideKey(SmallVec<[usize; 4]>);

impl SideKey {
    pub fn from_node_ids(node_ids: impl IntoIterator<Item = usize>) -> Self {
        let mut ids: SmallVec<[usize; 4]> = node_ids.into_iter().collect();
        ids.sort_unstable();
        Self(ids)
    }

    pub fn node_ids(&self) -> &[usize] {
        &self.0
    }
}

/// The geometric element capability interface
///
/// Leaf shapes provide their Nodes, links and geometry. Topological queries, boundary extraction, connectivity export
/// and refinement are derived from the shape's static [Topology].
///
/// Passing an out-of-range node, side, edge, child or sub-element index to any of these methods is a caller error and panics.
pub trait Elem: fmt::Debug + Send + Sync {
    fn elem_type(&self) -> ElemType;

    /// The Nodes of this `Elem` in the canonical order of its shape
    fn nodes(&self) -> &[Arc<Node>];

    fn links(&self) -> &ElemLinks;

    fn links_mut(&mut self) -> &mut ElemLinks;

    /// Does the reference to physical mapping have a constant Jacobian
    fn has_affine_map(&self) -> bool;

    /// Length, area or volume of this `Elem`
    fn volume(&self) -> Result<f64, GeometryError>;

    // ----------------------------------------------------------------------------------------------------
    // Identity and refinement tree
    // ----------------------------------------------------------------------------------------------------

    fn id(&self) -> Option<usize> {
        self.links().id
    }

    fn subdomain_id(&self) -> SubdomainId {
        self.links().subdomain_id
    }

    fn parent_id(&self) -> Option<usize> {
        self.links().parent_id()
    }

    fn child_ids(&self) -> Option<&[usize]> {
        self.links().child_ids()
    }

    fn has_children(&self) -> bool {
        self.links().child_ids().is_some()
    }

    /// Is this `Elem` a leaf of the refinement tree
    fn is_active(&self) -> bool {
        !self.has_children()
    }

    // ----------------------------------------------------------------------------------------------------
    // Topology
    // ----------------------------------------------------------------------------------------------------

    fn topology(&self) -> &'static Topology {
        self.elem_type().topology()
    }

    fn dim(&self) -> usize {
        self.topology().dim
    }

    fn n_nodes(&self) -> usize {
        self.topology().n_nodes()
    }

    fn n_vertices(&self) -> usize {
        self.topology().n_vertices()
    }

    fn n_sides(&self) -> usize {
        self.topology().n_sides()
    }

    fn n_edges(&self) -> usize {
        self.topology().n_edges()
    }

    fn n_children(&self) -> usize {
        self.topology().n_children()
    }

    /// Number of geometric sub-elements used when exporting connectivity
    fn n_sub_elem(&self) -> usize {
        self.topology().n_sub_elem
    }

    fn node(&self, n: usize) -> &Arc<Node> {
        contract!(
            n < self.n_nodes(),
            "{} Elems have {} Nodes; cannot retrieve Node {}!",
            self.elem_type(),
            self.n_nodes(),
            n
        );
        &self.nodes()[n]
    }

    fn node_id(&self, n: usize) -> usize {
        self.node(n).id
    }

    fn point(&self, n: usize) -> &Point {
        &self.node(n).coords
    }

    fn points(&self) -> SmallVec<[Point; 8]> {
        self.nodes().iter().map(|node| node.coords).collect()
    }

    /// Mean location of this `Elem`s Nodes
    fn centroid(&self) -> Point {
        mean_point(&self.points())
    }

    fn is_vertex(&self, n: usize) -> bool {
        self.topology().node_kind(n) == NodeKind::Vertex
    }

    /// Does Node `n` sit on the interior of an edge
    fn is_edge(&self, n: usize) -> bool {
        self.topology().node_kind(n) == NodeKind::Edge
    }

    /// Does Node `n` sit on the interior of a face
    fn is_face(&self, n: usize) -> bool {
        self.topology().node_kind(n) == NodeKind::Face
    }

    fn is_node_on_side(&self, n: usize, s: usize) -> bool {
        self.topology().side_nodes(s).contains(&n)
    }

    fn is_node_on_edge(&self, n: usize, e: usize) -> bool {
        self.topology().edge_nodes(e).contains(&n)
    }

    /// Does child `c` touch side `s` of this `Elem`
    ///
    /// A child lies on a side if one of its Nodes is interpolated from that side's Nodes alone
    ///
    /// For InfQuad4 this puts child 0 on sides 0 and 2 and child 1 on sides 0 and 1. The `s == 0 || s == c + 1` rule
    /// sometimes used for infinite quads gives the reverse pairing, which disagrees with the embedding matrix.
    fn is_child_on_side(&self, c: usize, s: usize) -> bool {
        let side = self.topology().side_nodes(s);
        let embedding = self.embedding();
        contract!(
            c < embedding.n_children(),
            "{} Elems have {} children; cannot locate child {}!",
            self.elem_type(),
            embedding.n_children(),
            c
        );

        (0..embedding.n_child_nodes()).any(|child_node| {
            embedding
                .row(c, child_node)
                .iter()
                .enumerate()
                .all(|(parent_node, weight)| *weight == 0.0 || side.contains(&parent_node))
        })
    }

    /// An order-independent key built from the Node IDs on side `s`
    fn side_key(&self, s: usize) -> SideKey {
        SideKey::from_node_ids(
            self.topology()
                .side_nodes(s)
                .iter()
                .map(|n| self.node_id(*n)),
        )
    }

    // ----------------------------------------------------------------------------------------------------
    // Boundary extraction
    // ----------------------------------------------------------------------------------------------------

    /// A borrowed view of side `i`. Cheap; intended for transient queries
    fn side_proxy(&self, i: usize) -> ProxyElem<'_> {
        ProxyElem::new(
            self.elem_type(),
            self.nodes(),
            self.links(),
            BoundaryEntity::Side(i),
        )
    }

    /// A new, independently owned `Elem` describing side `i`
    ///
    /// The side's Nodes follow the shape's side table, so its orientation is consistent with this `Elem`s interior.
    /// The new `Elem` inherits this `Elem`s subdomain.
    fn build_side(&self, i: usize) -> Box<dyn Elem> {
        self.side_proxy(i).to_owned_elem()
    }

    /// A borrowed view of edge `i`
    fn build_edge(&self, i: usize) -> ProxyElem<'_> {
        ProxyElem::new(
            self.elem_type(),
            self.nodes(),
            self.links(),
            BoundaryEntity::Edge(i),
        )
    }

    // ----------------------------------------------------------------------------------------------------
    // Connectivity export
    // ----------------------------------------------------------------------------------------------------

    /// Write the Node IDs of sub-element `sc` into `out` following the conventions of `package`
    fn connectivity(
        &self,
        sc: usize,
        package: IoPackage,
        out: &mut Vec<usize>,
    ) -> Result<(), ConnectivityError> {
        let topology = self.topology();
        contract!(
            sc < topology.n_sub_elem,
            "{} Elems have {} sub-elements; cannot export connectivity of sub-element {}!",
            self.elem_type(),
            topology.n_sub_elem,
            sc
        );

        let offset = match package.index_offset() {
            Some(offset) if topology.export_packages.contains(&package) => offset,
            _ => {
                return Err(ConnectivityError::UnsupportedFormat {
                    package,
                    elem_type: self.elem_type(),
                })
            }
        };

        out.clear();
        out.extend(
            topology
                .export_order
                .iter()
                .map(|n| self.node_id(*n) + offset),
        );

        Ok(())
    }

    // ----------------------------------------------------------------------------------------------------
    // Refinement
    // ----------------------------------------------------------------------------------------------------

    /// Barycentric weights mapping this `Elem`s nodal values onto its children
    ///
    /// panics if the shape cannot be refined
    fn embedding(&self) -> &'static dyn EmbeddingMatrix {
        match self.topology().embedding {
            Some(matrix) => matrix,
            None => panic!("{} Elems cannot be h-refined!", self.elem_type()),
        }
    }

    /// Locations of child `c`s Nodes
    fn child_points(&self, c: usize) -> SmallVec<[Point; 8]> {
        interpolate_points(self.embedding(), c, &self.points())
    }

    // ----------------------------------------------------------------------------------------------------
    // Quality
    // ----------------------------------------------------------------------------------------------------

    /// Compute a shape quality measure. Returns `None` if the measure is not implemented for this shape
    fn quality(&self, measure: ElemQuality) -> Option<f64> {
        self.elem_type().quality(&self.points(), measure)
    }

    /// Canonical range of a quality measure for this shape
    ///
    /// Returns [QualBounds::INVALID] (and logs a warning) if the shape has no range for `measure`
    fn qual_bounds(&self, measure: ElemQuality) -> QualBounds {
        quality::canonical_bounds(self.elem_type(), measure).unwrap_or_else(|| {
            tracing::warn!(
                elem_type = %self.elem_type(),
                %measure,
                "Invalid quality measure chosen; returning sentinel bounds"
            );
            QualBounds::INVALID
        })
    }

    /// [Elem::qual_bounds] for a measure given by name
    fn qual_bounds_by_name(&self, measure: &str) -> QualBounds {
        match measure.parse::<ElemQuality>() {
            Ok(measure) => self.qual_bounds(measure),
            Err(err) => {
                tracing::warn!(elem_type = %self.elem_type(), "{}; returning sentinel bounds", err);
                QualBounds::INVALID
            }
        }
    }

    /// Produce a Json Object that describes this Elem
    #[cfg(feature = "json_export")]
    fn to_json(&self) -> JsonValue {
        object! {
            "id": self.id(),
            "type": self.elem_type().name(),
            "subdomain": self.subdomain_id(),
            "parent": self.parent_id(),
            "active": self.is_active(),
            "level": self.links().level(),
            "nodes": JsonValue::from(self.nodes().iter().map(|node| node.id).collect::<Vec<usize>>()),
            "children": JsonValue::from(self.child_ids().map(|ids| ids.to_vec()).unwrap_or_default()),
        }
    }
}
