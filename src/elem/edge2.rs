use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::connectivity::LINEAR_EXPORT_PACKAGES;
use crate::geom::{node::Node, Point};
use std::sync::Arc;

pub static EMBEDDING_MATRIX: [[[f32; 2]; 2]; 2] = [
    // child 0
    [[1.0, 0.0], [0.5, 0.5]],
    // child 1
    [[0.5, 0.5], [0.0, 1.0]],
];

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::Edge2,
    dim: 1,
    node_kinds: &[NodeKind::Vertex; 2],
    sides: &[&[0], &[1]],
    side_types: &[ElemType::NodeElem; 2],
    edges: &[],
    edge_types: &[],
    embedding: Some(&EMBEDDING_MATRIX),
    n_sub_elem: 1,
    export_order: &[0, 1],
    export_packages: &LINEAR_EXPORT_PACKAGES,
};

/// A linear line segment between two Nodes
#[derive(Debug, Clone)]
pub struct Edge2 {
    nodes: [Arc<Node>; 2],
    links: ElemLinks,
}

impl Edge2 {
    pub fn new(nodes: [Arc<Node>; 2]) -> Self {
        Self::with_links(nodes, ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 2], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for Edge2 {
    const TYPE: ElemType = ElemType::Edge2;

    fn measure(p: &[Point]) -> Result<f64, GeometryError> {
        let length = (p[1] - p[0]).norm();

        if length > 0.0 {
            Ok(length)
        } else {
            Err(GeometryError::DegenerateMeasure {
                elem_type: Self::TYPE,
                measure: length,
            })
        }
    }

    fn affine(_: &[Point]) -> bool {
        true
    }
}

impl Elem for Edge2 {
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
        true
    }

    fn volume(&self) -> Result<f64, GeometryError> {
        Self::measure(&self.points())
    }
}
