use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::connectivity::LINEAR_EXPORT_PACKAGES;
use crate::geom::{node::Node, Point};
use std::sync::Arc;

pub static EMBEDDING_MATRIX: [[[f32; 1]; 1]; 1] = [[[1.0]]];

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::NodeElem,
    dim: 0,
    node_kinds: &[NodeKind::Vertex],
    sides: &[],
    side_types: &[],
    edges: &[],
    edge_types: &[],
    embedding: Some(&EMBEDDING_MATRIX),
    n_sub_elem: 1,
    export_order: &[0],
    export_packages: &LINEAR_EXPORT_PACKAGES,
};

/// A zero dimensional `Elem` wrapping a single Node
#[derive(Debug, Clone)]
pub struct NodeElem {
    nodes: [Arc<Node>; 1],
    links: ElemLinks,
}

impl NodeElem {
    pub fn new(node: Arc<Node>) -> Self {
        Self::with_links([node], ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 1], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for NodeElem {
    const TYPE: ElemType = ElemType::NodeElem;

    /// A point has no extent
    fn measure(_: &[Point]) -> Result<f64, GeometryError> {
        Ok(0.0)
    }

    fn affine(_: &[Point]) -> bool {
        true
    }
}

impl Elem for NodeElem {
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
        Ok(0.0)
    }
}
