use super::ElemType;
use crate::connectivity::IoPackage;
use crate::embedding::EmbeddingMatrix;

/// The kind of topological entity a Node anchors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A corner of the shape
    Vertex,
    /// The interior of an edge
    Edge,
    /// The interior of a face
    Face,
    /// The interior of a cell
    Interior,
    /// A Node describing the direction towards infinity (infinite shapes only)
    Infinite,
}

/// Immutable, compiled-in description of a shape's local structure
///
/// Side and edge tables list local Node indices in the shape's canonical order. That order governs the orientation
/// of extracted sides (outward normals) and must never be changed.
pub struct Topology {
    pub elem_type: ElemType,
    pub dim: usize,
    pub node_kinds: &'static [NodeKind],
    pub sides: &'static [&'static [usize]],
    pub side_types: &'static [ElemType],
    pub edges: &'static [&'static [usize]],
    pub edge_types: &'static [ElemType],
    /// Parent to child interpolation weights (`None` if the shape cannot be refined)
    pub embedding: Option<&'static dyn EmbeddingMatrix>,
    /// Number of geometric sub-elements used for connectivity export
    pub n_sub_elem: usize,
    /// Order in which local Nodes are written during connectivity export
    pub export_order: &'static [usize],
    pub export_packages: &'static [IoPackage],
}

impl Topology {
    pub fn n_nodes(&self) -> usize {
        self.node_kinds.len()
    }

    pub fn n_vertices(&self) -> usize {
        self.node_kinds
            .iter()
            .filter(|kind| **kind == NodeKind::Vertex)
            .count()
    }

    pub fn n_sides(&self) -> usize {
        self.sides.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn n_children(&self) -> usize {
        self.embedding.map_or(0, |matrix| matrix.n_children())
    }

    pub fn node_kind(&self, n: usize) -> NodeKind {
        contract!(
            n < self.n_nodes(),
            "{} Elems have {} Nodes; cannot classify Node {}!",
            self.elem_type,
            self.n_nodes(),
            n
        );
        self.node_kinds[n]
    }

    /// Local Node indices of side `s`
    pub fn side_nodes(&self, s: usize) -> &'static [usize] {
        contract!(
            s < self.n_sides(),
            "{} Elems have {} sides; side {} is invalid!",
            self.elem_type,
            self.n_sides(),
            s
        );
        self.sides[s]
    }

    /// Local Node indices of edge `e`
    pub fn edge_nodes(&self, e: usize) -> &'static [usize] {
        contract!(
            e < self.n_edges(),
            "{} Elems have {} edges; edge {} is invalid!",
            self.elem_type,
            self.n_edges(),
            e
        );
        self.edges[e]
    }

    pub fn side_type(&self, s: usize) -> ElemType {
        contract!(
            s < self.n_sides(),
            "{} Elems have {} sides; side {} is invalid!",
            self.elem_type,
            self.n_sides(),
            s
        );
        self.side_types[s]
    }

    pub fn edge_type(&self, e: usize) -> ElemType {
        contract!(
            e < self.n_edges(),
            "{} Elems have {} edges; edge {} is invalid!",
            self.elem_type,
            self.n_edges(),
            e
        );
        self.edge_types[e]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_consistent() {
        for elem_type in ElemType::ALL {
            let topology = elem_type.topology();

            assert_eq!(topology.elem_type, elem_type);
            assert_eq!(topology.side_types.len(), topology.n_sides());
            assert_eq!(topology.edge_types.len(), topology.n_edges());
            assert_eq!(topology.export_order.len(), topology.n_nodes());

            for s in 0..topology.n_sides() {
                let side = topology.side_nodes(s);
                let side_type = topology.side_type(s);

                assert_eq!(side.len(), side_type.topology().n_nodes());
                assert_eq!(side_type.topology().dim + 1, topology.dim);
                assert!(side.iter().all(|n| *n < topology.n_nodes()));
            }

            for e in 0..topology.n_edges() {
                let edge = topology.edge_nodes(e);
                assert_eq!(edge.len(), 2);
                assert_eq!(topology.edge_type(e).topology().dim, 1);
            }

            if let Some(matrix) = topology.embedding {
                assert_eq!(matrix.n_child_nodes(), topology.n_nodes());
                assert_eq!(matrix.n_parent_nodes(), topology.n_nodes());
            }
        }
    }

    #[test]
    fn counts() {
        let counts: Vec<[usize; 5]> = ElemType::ALL
            .iter()
            .map(|elem_type| {
                let t = elem_type.topology();
                [t.n_nodes(), t.n_vertices(), t.n_sides(), t.n_edges(), t.n_children()]
            })
            .collect();

        assert_eq!(
            counts,
            vec![
                [1, 1, 0, 0, 1],
                [2, 2, 2, 0, 2],
                [2, 1, 1, 0, 0],
                [4, 4, 4, 4, 4],
                [4, 2, 3, 3, 2],
                [8, 8, 6, 12, 8],
            ]
        );
    }

    #[test]
    #[should_panic]
    fn invalid_side_type() {
        ElemType::Quad4.topology().side_type(4);
    }
}
