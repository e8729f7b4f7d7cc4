use super::{Elem, ElemLinks, ElemType, GeometryError, NodeKind, Shape, Topology};
use crate::connectivity::LINEAR_EXPORT_PACKAGES;
use crate::geom::{node::Node, FuzzyEq, Point, TOLERANCE};
use crate::quality::{self, ElemQuality};
use std::sync::Arc;

/// ```text
///         3 --------- 2
///         |     2     |
///         |           |
///         |3         1|
///         |           |
///         |     0     |
///         0 --------- 1
/// ```
pub static SIDE_NODES_MAP: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

const DIAGONALS: [[usize; 2]; 2] = [[0, 2], [1, 3]];

/// Uniform refinement into 4 children. Child 2 is associated with vertex 3 and child 3 with vertex 2.
pub static EMBEDDING_MATRIX: [[[f32; 4]; 4]; 4] = [
    // child 0
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25],
        [0.5, 0.0, 0.0, 0.5],
    ],
    // child 1
    [
        [0.5, 0.5, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.5, 0.5, 0.0],
        [0.25, 0.25, 0.25, 0.25],
    ],
    // child 2
    [
        [0.5, 0.0, 0.0, 0.5],
        [0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.5, 0.5],
        [0.0, 0.0, 0.0, 1.0],
    ],
    // child 3
    [
        [0.25, 0.25, 0.25, 0.25],
        [0.0, 0.5, 0.5, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.5, 0.5],
    ],
];

const SIDES: &[&[usize]] = &[
    &SIDE_NODES_MAP[0],
    &SIDE_NODES_MAP[1],
    &SIDE_NODES_MAP[2],
    &SIDE_NODES_MAP[3],
];

pub static TOPOLOGY: Topology = Topology {
    elem_type: ElemType::Quad4,
    dim: 2,
    node_kinds: &[NodeKind::Vertex; 4],
    sides: SIDES,
    side_types: &[ElemType::Edge2; 4],
    edges: SIDES,
    edge_types: &[ElemType::Edge2; 4],
    embedding: Some(&EMBEDDING_MATRIX),
    n_sub_elem: 1,
    export_order: &[0, 1, 2, 3],
    export_packages: &LINEAR_EXPORT_PACKAGES,
};

/// A bi-linear quadrilateral
#[derive(Debug, Clone)]
pub struct Quad4 {
    nodes: [Arc<Node>; 4],
    links: ElemLinks,
}

impl Quad4 {
    pub fn new(nodes: [Arc<Node>; 4]) -> Self {
        Self::with_links(nodes, ElemLinks::default())
    }

    pub fn with_links(nodes: [Arc<Node>; 4], links: ElemLinks) -> Self {
        Self { nodes, links }
    }
}

impl Shape for Quad4 {
    const TYPE: ElemType = ElemType::Quad4;

    /// Area from the cross product of the diagonals (exact for planar quadrilaterals)
    fn measure(p: &[Point]) -> Result<f64, GeometryError> {
        let area = 0.5 * (p[2] - p[0]).cross(&(p[3] - p[1])).norm();

        if area > 0.0 {
            Ok(area)
        } else {
            Err(GeometryError::DegenerateMeasure {
                elem_type: Self::TYPE,
                measure: area,
            })
        }
    }

    fn affine(p: &[Point]) -> bool {
        (p[1] - p[0]).relative_fuzzy_equals(&(p[2] - p[3]), TOLERANCE)
    }

    fn shape_quality(p: &[Point], measure: ElemQuality) -> Option<f64> {
        match measure {
            ElemQuality::Diagonal => quality::diagonal_ratio(p, &DIAGONALS),
            ElemQuality::Stretch => {
                quality::stretch(p, &SIDE_NODES_MAP, &DIAGONALS, 2.0_f64.sqrt())
            }
            _ => None,
        }
    }
}

impl Elem for Quad4 {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elem::test_utils::*;
    use approx::assert_relative_eq;

    fn quad_at(coords: [[f64; 3]; 4]) -> Quad4 {
        Quad4::new(nodes_at(10, &coords).try_into().unwrap())
    }

    #[test]
    fn area() {
        assert_relative_eq!(quad_at(UNIT_SQUARE).volume().unwrap(), 1.0, epsilon = 1e-12);

        let trapezoid = quad_at([
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [3.0, 2.0, 0.0],
            [1.0, 2.0, 0.0],
        ]);
        assert_relative_eq!(trapezoid.volume().unwrap(), 6.0, epsilon = 1e-12);
        assert!(!trapezoid.has_affine_map());
    }

    #[test]
    fn collapsed_quad() {
        let collapsed = quad_at([
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ]);
        assert!(matches!(
            collapsed.volume(),
            Err(GeometryError::DegenerateMeasure { elem_type: ElemType::Quad4, .. })
        ));
    }

    #[test]
    fn parallelogram_is_affine() {
        let parallelogram = quad_at([
            [0.0, 0.0, 1.0],
            [2.0, 0.0, 1.0],
            [3.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
        ]);
        assert!(parallelogram.has_affine_map());
        assert_relative_eq!(parallelogram.volume().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn sides() {
        let quad = quad_at(UNIT_SQUARE);
        for s in 0..4 {
            let side = quad.build_side(s);
            assert_eq!(side.elem_type(), ElemType::Edge2);
            assert_eq!(
                side.nodes().iter().map(|n| n.id).collect::<Vec<_>>(),
                SIDE_NODES_MAP[s].iter().map(|n| n + 10).collect::<Vec<_>>()
            );
            assert_relative_eq!(side.volume().unwrap(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn children_tile_the_parent() {
        let quad = quad_at(UNIT_SQUARE);
        let total: f64 = (0..4)
            .map(|c| Quad4::measure(&quad.child_points(c)).unwrap())
            .sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);

        // child 2 sits in the corner of vertex 3
        assert_relative_eq!(quad.child_points(2)[3], Point::new(0.0, 1.0, 0.0));
    }

    #[test]
    #[should_panic]
    fn invalid_side() {
        quad_at(UNIT_SQUARE).build_side(4);
    }
}
