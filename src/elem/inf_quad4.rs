use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::connectivity::LINEAR_EXPORT_PACKAGES;
use crate::geom::{node::Node, Point};
use std::sync::Arc;

/// ```text
///         2           3
///         .           .
///         .           .
///         |           |
///        2|           |1
///         |           |
///         0 --------- 1
///               0
/// ```
///
/// Side 0 is the finite base; sides 1 and 2 extend towards infinity.
pub static SIDE_NODES_MAP: [[usize; 2]; 3] = [[0, 1], [1, 3], [0, 2]];

/// Refinement splits the base edge; each child keeps a copy of the parent's infinite direction
pub static EMBEDDING_MATRIX: [[[f32; 4]; 4]; 2] = [
    // child 0
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.5, 0.5],
    ],
    // child 1
    [
        [0.5, 0.5, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5],
        [0.0, 0.0, 0.0, 1.0],
    ],
];

const SIDES: &[&[usize]] = &[&SIDE_NODES_MAP[0], &SIDE_NODES_MAP[1], &SIDE_NODES_MAP[2]];
const SIDE_TYPES: &[ElemType] = &[ElemType::Edge2, ElemType::InfEdge2, ElemType::InfEdge2];

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::InfQuad4,
    dim: 2,
    node_kinds: &[
        NodeKind::Vertex,
        NodeKind::Vertex,
        NodeKind::Infinite,
        NodeKind::Infinite,
    ],
    sides: SIDES,
    side_types: SIDE_TYPES,
    edges: SIDES,
    edge_types: SIDE_TYPES,
    embedding: Some(&EMBEDDING_MATRIX),
    n_sub_elem: 1,
    export_order: &[0, 1, 3, 2],
    export_packages: &LINEAR_EXPORT_PACKAGES,
};

/// An infinite quadrilateral
///
/// Nodes 0 and 1 span the finite base edge. Nodes 2 and 3 give the directions in which the `Elem` extends from
/// Nodes 0 and 1 respectively.
#[derive(Debug, Clone)]
pub struct InfQuad4 {
    nodes: [Arc<Node>; 4],
    links: ElemLinks,
}

impl InfQuad4 {
    pub fn new(nodes: [Arc<Node>; 4]) -> Self {
        Self::with_links(nodes, ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 4], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for InfQuad4 {
    const TYPE: ElemType = ElemType::InfQuad4;

    fn measure(_: &[Point]) -> Result<f64, GeometryError> {
        panic!("{} Elems extend to infinity; their area is undefined!", Self::TYPE)
    }

    fn affine(_: &[Point]) -> bool {
        false
    }
}

impl Elem for InfQuad4 {
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
        false
    }

    fn volume(&self) -> Result<f64, GeometryError> {
        Self::measure(&self.points())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elem::test_utils::*;
    use approx::assert_relative_eq;

    #[test]
    fn base_and_infinite_sides() {
        let inf_quad = &sample_elems()[4];

        let base = inf_quad.build_side(0);
        assert_eq!(base.elem_type(), ElemType::Edge2);
        assert_relative_eq!(base.volume().unwrap(), 1.0, epsilon = 1e-12);

        for s in 1..3 {
            let side = inf_quad.side_proxy(s);
            assert_eq!(side.elem_type(), ElemType::InfEdge2);
            assert!(inf_quad.topology().node_kind(side.local_nodes()[1]) == NodeKind::Infinite);
        }

        assert_eq!(inf_quad.build_side(1).node_id(0), inf_quad.node_id(1));
        assert_eq!(inf_quad.build_side(2).node_id(0), inf_quad.node_id(0));
    }

    #[test]
    fn not_affine() {
        assert!(!sample_elems()[4].has_affine_map());
    }

    #[test]
    fn children_split_the_base() {
        let inf_quad = &sample_elems()[4];
        let left = inf_quad.child_points(0);
        let right = inf_quad.child_points(1);

        assert_relative_eq!(left[1], Point::new(0.5, 1.0, 0.0));
        assert_eq!(left[1], right[0]);
        assert_relative_eq!(left[3], Point::new(0.5, 2.0, 0.0));
        assert_eq!(left[3], right[2]);
    }

    #[test]
    #[should_panic]
    fn infinite_area() {
        let _ = sample_elems()[4].volume();
    }
}
