use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::geom::{node::Node, Point};
use std::sync::Arc;

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::InfEdge2,
    dim: 1,
    node_kinds: &[NodeKind::Vertex, NodeKind::Infinite],
    sides: &[&[0]],
    side_types: &[ElemType::NodeElem],
    edges: &[],
    edge_types: &[],
    embedding: None,
    n_sub_elem: 1,
    export_order: &[0, 1],
    export_packages: &[],
};

/// A ray from a base Node (0) through a direction Node (1) towards infinity
///
/// Only the base Node is a vertex. `InfEdge2`s cannot be refined and have no finite length.
#[derive(Debug, Clone)]
pub struct InfEdge2 {
    nodes: [Arc<Node>; 2],
    links: ElemLinks,
}

impl InfEdge2 {
    pub fn new(nodes: [Arc<Node>; 2]) -> Self {
        Self::with_links(nodes, ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 2], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for InfEdge2 {
    const TYPE: ElemType = ElemType::InfEdge2;

    fn measure(_: &[Point]) -> Result<f64, GeometryError> {
        panic!("{} Elems extend to infinity; their length is undefined!", Self::TYPE)
    }

    fn affine(_: &[Point]) -> bool {
        false
    }
}

impl Elem for InfEdge2 {
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

    #[test]
    fn base_point() {
        let inf_edge = &sample_elems()[2];
        assert!(inf_edge.is_vertex(0) && !inf_edge.is_vertex(1));
        assert!(!inf_edge.has_affine_map());

        let base = inf_edge.build_side(0);
        assert_eq!(base.elem_type(), ElemType::NodeElem);
        assert_eq!(base.point(0), &Point::new(1.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic]
    fn infinite_length() {
        let _ = sample_elems()[2].volume();
    }

    #[test]
    #[should_panic]
    fn cannot_refine() {
        sample_elems()[2].child_points(0);
    }
}
