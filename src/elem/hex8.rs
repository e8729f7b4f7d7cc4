use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::connectivity::LINEAR_EXPORT_PACKAGES;
use crate::geom::{mean_point, node::Node, FuzzyEq, Point, TOLERANCE};
use crate::quality::{self, ElemQuality};
use std::sync::Arc;

/// Local Nodes of each side. Ordered such that side normals point out of the Elem.
///
/// ```text
///          7 --------- 6
///         /|          /|
///        / |         / |
///       4 --------- 5  |
///       |  3 -------|- 2
///       | /         | /
///       |/          |/
///       0 --------- 1
/// ```
pub static SIDE_NODES_MAP: [[usize; 4]; 6] = [
    [0, 3, 2, 1], // z = -1
    [0, 1, 5, 4], // y = -1
    [1, 2, 6, 5], // x = 1
    [2, 3, 7, 6], // y = 1
    [3, 0, 4, 7], // x = -1
    [4, 5, 6, 7], // z = 1
];

pub static EDGE_NODES_MAP: [[usize; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [0, 3],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
    [4, 5],
    [5, 6],
    [6, 7],
    [4, 7],
];

/// Body diagonals
const DIAGONALS: [[usize; 2]; 4] = [[0, 6], [1, 7], [2, 4], [3, 5]];

/// Bases of the six sub-pyramids used to compute the volume. Each base is oriented towards the centroid.
const SUB_PYRAMIDS: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [6, 7, 4, 5],
    [0, 1, 5, 4],
    [3, 7, 6, 2],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
];

/// Uniform refinement into 8 children
///
/// Each child is associated with one parent vertex. Children 2, 3, 6 and 7 are associated with vertices 3, 2, 7
/// and 6 respectively; all other children share their parent vertex's index.
pub static EMBEDDING_MATRIX: [[[f32; 8]; 8]; 8] = [
    // child 0 (vertex 0)
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25],
    ],
    // child 1 (vertex 1)
    [
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0],
        [0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
    ],
    // child 2 (vertex 3)
    [
        [0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5],
    ],
    // child 3 (vertex 2)
    [
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0],
        [0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0],
        [0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25],
    ],
    // child 4 (vertex 4)
    [
        [0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25],
        [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5],
    ],
    // child 5 (vertex 5)
    [
        [0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0],
        [0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0],
        [0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
    ],
    // child 6 (vertex 7)
    [
        [0.25, 0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25],
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ],
    // child 7 (vertex 6)
    [
        [0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125, 0.125],
        [0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25, 0.0],
        [0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5, 0.0],
        [0.0, 0.0, 0.25, 0.25, 0.0, 0.0, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5],
    ],
];

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::Hex8,
    dim: 3,
    node_kinds: &[NodeKind::Vertex; 8],
    sides: &[
        &SIDE_NODES_MAP[0],
        &SIDE_NODES_MAP[1],
        &SIDE_NODES_MAP[2],
        &SIDE_NODES_MAP[3],
        &SIDE_NODES_MAP[4],
        &SIDE_NODES_MAP[5],
    ],
    side_types: &[ElemType::Quad4; 6],
    edges: &[
        &EDGE_NODES_MAP[0],
        &EDGE_NODES_MAP[1],
        &EDGE_NODES_MAP[2],
        &EDGE_NODES_MAP[3],
        &EDGE_NODES_MAP[4],
        &EDGE_NODES_MAP[5],
        &EDGE_NODES_MAP[6],
        &EDGE_NODES_MAP[7],
        &EDGE_NODES_MAP[8],
        &EDGE_NODES_MAP[9],
        &EDGE_NODES_MAP[10],
        &EDGE_NODES_MAP[11],
    ],
    edge_types: &[ElemType::Edge2; 12],
    embedding: Some(&EMBEDDING_MATRIX),
    n_sub_elem: 1,
    export_order: &[0, 1, 2, 3, 4, 5, 6, 7],
    export_packages: &LINEAR_EXPORT_PACKAGES,
};

/// A tri-linear hexahedron
#[derive(Debug, Clone)]
pub struct Hex8 {
    nodes: [Arc<Node>; 8],
    links: ElemLinks,
}

impl Hex8 {
    pub fn new(nodes: [Arc<Node>; 8]) -> Self {
        Self::with_links(nodes, ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 8], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for Hex8 {
    const TYPE: ElemType = ElemType::Hex8;

    /// Sum of six sub-pyramids sharing the centroid as their apex
    ///
    /// Each pyramid volume uses the closed form for a non-planar quadrilateral base from
    /// "Calculation of the Volume of a General Hexahedron for Flow Predictions", AIAA Journal v.23, no.6, 1984, p.954.
    fn measure(p: &[Point]) -> Result<f64, GeometryError> {
        let apex = mean_point(p);

        SUB_PYRAMIDS
            .iter()
            .enumerate()
            .try_fold(0.0, |volume, (index, [b0, b1, b2, b3])| {
                let a = p[*b0] - apex;
                let b = p[*b1] - p[*b3];
                let c = p[*b2] - p[*b0];
                let d = p[*b3] - p[*b0];
                let e = p[*b1] - p[*b0];

                let sub_volume = a.dot(&b.cross(&c)) / 6.0 + c.dot(&d.cross(&e)) / 12.0;

                if sub_volume > 0.0 {
                    Ok(volume + sub_volume)
                } else {
                    Err(GeometryError::NonPositiveSubVolume {
                        elem_type: Self::TYPE,
                        index,
                        volume: sub_volume,
                    })
                }
            })
    }

    /// Compare the edge vectors that coincide under an affine map, plus one pair of parallel edges in the
    /// x-z faces
    fn affine(p: &[Point]) -> bool {
        let x_edge = p[1] - p[0];
        if !x_edge.relative_fuzzy_equals(&(p[2] - p[3]), TOLERANCE)
            || !x_edge.relative_fuzzy_equals(&(p[5] - p[4]), TOLERANCE)
            || !x_edge.relative_fuzzy_equals(&(p[6] - p[7]), TOLERANCE)
        {
            return false;
        }

        let z_edge = p[4] - p[0];
        z_edge.relative_fuzzy_equals(&(p[7] - p[3]), TOLERANCE)
    }

    fn shape_quality(p: &[Point], measure: ElemQuality) -> Option<f64> {
        match measure {
            ElemQuality::Diagonal => quality::diagonal_ratio(p, &DIAGONALS),
            ElemQuality::Stretch => {
                quality::stretch(p, &EDGE_NODES_MAP, &DIAGONALS, 3.0_f64.sqrt())
            }
            _ => None,
        }
    }
}

impl Elem for Hex8 {
    fn elem_type(&self) -> ElemType {
        Self::TYPE
    }

    fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    fn links(&self) -> &ElemLinks {
        &self.links
    }

    fn links_mut(&mut self) -> &mut ElemLinks {
        &mut self.links
    }

    fn has_affine_map(&self) -> bool {
        Self::affine(&self.points())
    }

    fn volume(&self) -> Result<f64, GeometryError> {
        Self::measure(&self.points())
    }
}
