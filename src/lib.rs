//! Geometric `Elem`ents and h-Refinement primitives for 3D Finite Element Meshes
//!
//! Each supported shape (`Hex8`, `Quad4`, `Edge2`, `NodeElem` and the infinite variants `InfQuad4`
//! and `InfEdge2`) provides:
//! * Topology tables (side and edge to node maps)
//! * Geometric queries (volume, affine map detection, quality metrics)
//! * Boundary extraction as borrowed proxies or independently owned `Elem`s
//! * Connectivity export for a closed set of interchange formats
//! * Embedding matrices used to build child `Elem`s during h-Refinement
//!
//! Invalid side, edge, child or sub-element indices are programming errors and cause a panic.
//! Enabling the `unchecked_contracts` feature demotes these checks to debug assertions.

// Precondition checks on caller supplied indices
#[cfg(not(feature = "unchecked_contracts"))]
macro_rules! contract {
    ($($arg:tt)+) => {
        assert!($($arg)+)
    };
}

#[cfg(feature = "unchecked_contracts")]
macro_rules! contract {
    ($($arg:tt)+) => {
        debug_assert!($($arg)+)
    };
}

/// Interchange format conventions for exporting `Elem` connectivity
pub mod connectivity;
/// The `Elem` capability interface and its leaf shapes
pub mod elem;
/// Barycentric parent to child interpolation tables
pub mod embedding;
/// Points, Vectors and Nodes in 3D space
pub mod geom;
/// A container of Nodes and Elems with h-refinement bookkeeping
pub mod mesh;
/// Named shape quality measures and their canonical ranges
pub mod quality;

pub use connectivity::{ConnectivityError, IoPackage};
pub use elem::{
    BoundaryEntity, Elem, ElemLinks, ElemType, Edge2, GeometryError, Hex8, InfEdge2, InfQuad4,
    NodeElem, NodeKind, ProxyElem, Quad4, SideKey, SubdomainId, Topology,
};
pub use embedding::EmbeddingMatrix;
pub use geom::{node::Node, FuzzyEq, Point, Vector, TOLERANCE};
pub use mesh::{h_refinement::HRefError, Mesh, MeshError};
pub use quality::{ElemQuality, QualBounds};
