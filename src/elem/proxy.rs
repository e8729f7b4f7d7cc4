use super::{Elem, ElemLinks, ElemType, GeometryError, SubdomainId};
use crate::geom::{node::Node, Point};
use smallvec::SmallVec;
use std::sync::Arc;

/// Which lower-dimensional entity of a parent `Elem` a [ProxyElem] describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundaryEntity {
    Side(usize),
    Edge(usize),
}

/// A borrowed view of one side or edge of an `Elem`
///
/// Holds no Nodes of its own: every query is answered from the parent's Nodes through the parent shape's side or
/// edge table. A `ProxyElem` cannot outlive the `Elem` it was taken from. Use [ProxyElem::to_owned_elem] to get an
/// independent `Elem`.
#[derive(Debug, Clone, Copy)]
pub struct ProxyElem<'a> {
    parent_type: ElemType,
    parent_nodes: &'a [Arc<Node>],
    parent_links: &'a ElemLinks,
    entity: BoundaryEntity,
    elem_type: ElemType,
    local_nodes: &'static [usize],
}

impl<'a> ProxyElem<'a> {
    /// panics if the parent shape has no such side or edge
    pub(crate) fn new(
        parent_type: ElemType,
        parent_nodes: &'a [Arc<Node>],
        parent_links: &'a ElemLinks,
        entity: BoundaryEntity,
    ) -> Self {
        let topology = parent_type.topology();
        let (local_nodes, elem_type) = match entity {
            BoundaryEntity::Side(s) => (topology.side_nodes(s), topology.side_type(s)),
            BoundaryEntity::Edge(e) => (topology.edge_nodes(e), topology.edge_type(e)),
        };

        Self {
            parent_type,
            parent_nodes,
            parent_links,
            entity,
            elem_type,
            local_nodes,
        }
    }

    pub fn elem_type(&self) -> ElemType {
        self.elem_type
    }

    pub fn parent_type(&self) -> ElemType {
        self.parent_type
    }

    pub fn entity(&self) -> BoundaryEntity {
        self.entity
    }

    /// Indices of this entity's Nodes within the parent `Elem`
    pub fn local_nodes(&self) -> &'static [usize] {
        self.local_nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.local_nodes.len()
    }

    pub fn node(&self, n: usize) -> &'a Arc<Node> {
        contract!(
            n < self.n_nodes(),
            "{} {:?} of a {} Elem has {} Nodes; cannot retrieve Node {}!",
            self.elem_type,
            self.entity,
            self.parent_type,
            self.n_nodes(),
            n
        );
        &self.parent_nodes[self.local_nodes[n]]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &'a Arc<Node>> + 'a {
        let parent_nodes = self.parent_nodes;
        self.local_nodes.iter().map(move |n| &parent_nodes[*n])
    }

    pub fn node_ids(&self) -> SmallVec<[usize; 4]> {
        self.nodes().map(|node| node.id).collect()
    }

    pub fn points(&self) -> SmallVec<[Point; 8]> {
        self.nodes().map(|node| node.coords).collect()
    }

    /// Length or area of this entity
    pub fn volume(&self) -> Result<f64, GeometryError> {
        self.elem_type.measure(&self.points())
    }

    pub fn has_affine_map(&self) -> bool {
        self.elem_type.affine(&self.points())
    }

    /// ID of the `Elem` this entity belongs to
    pub fn parent_id(&self) -> Option<usize> {
        self.parent_links.id
    }

    pub fn subdomain_id(&self) -> SubdomainId {
        self.parent_links.subdomain_id
    }

    /// Materialize this view as an independently owned `Elem` sharing the parent's Nodes
    ///
    /// The new `Elem` has no ID or refinement links and inherits the parent's subdomain
    pub fn to_owned_elem(&self) -> Box<dyn Elem> {
        tracing::trace!(
            parent_type = %self.parent_type,
            entity = ?self.entity,
            elem_type = %self.elem_type,
            "building owned boundary Elem"
        );

        self.elem_type.build(
            self.nodes().cloned().collect(),
            ElemLinks::new(None, self.subdomain_id()),
        )
    }
}
