use crate::geom::{Point, Vector};
use smallvec::SmallVec;

/// Tolerance used when validating embedding rows
pub const EMBEDDING_SUM_TOLERANCE: f32 = 1e-6;

/// Parent to child interpolation weights of a shape: `[child][child_node][parent_node]`
///
/// The value of any linearly interpolable field at Node `j` of child `c` is `Σ_k weight(c, j, k) * parent_value[k]`.
/// Every row is a set of non-negative barycentric weights that sums to one: a single `1.0` for a Node coincident
/// with a parent Node, two `0.5`s for an edge midpoint, or more weights for face and cell centers.
///
/// Children are not always numbered after the parent vertex they contain. The association is a fixed property of
/// each shape (see [parent_vertex_of_child]).
pub trait EmbeddingMatrix: Sync {
    fn n_children(&self) -> usize;

    fn n_child_nodes(&self) -> usize;

    fn n_parent_nodes(&self) -> usize;

    /// Weights of every parent Node for Node `child_node` of child `child`
    fn row(&self, child: usize, child_node: usize) -> &[f32];

    fn weight(&self, child: usize, child_node: usize, parent_node: usize) -> f32 {
        let row = self.row(child, child_node);
        contract!(
            parent_node < row.len(),
            "Embedding matrices have {} parent Nodes; parent Node {} is invalid!",
            row.len(),
            parent_node
        );
        row[parent_node]
    }
}

impl<const C: usize, const N: usize> EmbeddingMatrix for [[[f32; N]; N]; C] {
    fn n_children(&self) -> usize {
        C
    }

    fn n_child_nodes(&self) -> usize {
        N
    }

    fn n_parent_nodes(&self) -> usize {
        N
    }

    fn row(&self, child: usize, child_node: usize) -> &[f32] {
        contract!(
            child < C,
            "Embedding matrix has {} children; child {} is invalid!",
            C,
            child
        );
        contract!(
            child_node < N,
            "Embedding matrix children have {} Nodes; child Node {} is invalid!",
            N,
            child_node
        );
        &self[child][child_node]
    }
}

/// Interpolate nodal values of a parent onto the Nodes of child `child`
///
/// panics if `parent_values` does not have one entry per parent Node
pub fn interpolate(
    matrix: &dyn EmbeddingMatrix,
    child: usize,
    parent_values: &[f64],
) -> SmallVec<[f64; 8]> {
    assert_eq!(
        parent_values.len(),
        matrix.n_parent_nodes(),
        "Expected one value per parent Node; cannot interpolate onto child {}!",
        child
    );

    (0..matrix.n_child_nodes())
        .map(|child_node| {
            matrix
                .row(child, child_node)
                .iter()
                .zip(parent_values)
                .filter(|(weight, _)| **weight != 0.0)
                .map(|(weight, value)| f64::from(*weight) * value)
                .sum()
        })
        .collect()
}

/// Locations of the Nodes of child `child` given the locations of the parent's Nodes
pub fn interpolate_points(
    matrix: &dyn EmbeddingMatrix,
    child: usize,
    parent_points: &[Point],
) -> SmallVec<[Point; 8]> {
    assert_eq!(
        parent_points.len(),
        matrix.n_parent_nodes(),
        "Expected one Point per parent Node; cannot interpolate onto child {}!",
        child
    );

    (0..matrix.n_child_nodes())
        .map(|child_node| {
            let coords = matrix
                .row(child, child_node)
                .iter()
                .zip(parent_points)
                .filter(|(weight, _)| **weight != 0.0)
                .fold(Vector::zeros(), |acc, (weight, point)| {
                    acc + point.coords * f64::from(*weight)
                });
            Point::from(coords)
        })
        .collect()
}

/// The parent Node that child `child` shares with its parent (the first child Node with a unit weight)
pub fn parent_vertex_of_child(matrix: &dyn EmbeddingMatrix, child: usize) -> Option<usize> {
    (0..matrix.n_child_nodes()).find_map(|child_node| {
        matrix
            .row(child, child_node)
            .iter()
            .position(|weight| *weight == 1.0)
    })
}

/// The structure of a single embedding row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowPattern {
    /// Coincident with one parent Node
    Vertex,
    /// Midpoint of two parent Nodes
    EdgeMidpoint,
    /// Centroid of three or more parent Nodes
    Centroid(usize),
}

/// Classify an embedding row. Returns `None` if the row is not a valid set of barycentric weights.
pub fn row_pattern(row: &[f32]) -> Option<RowPattern> {
    if row.iter().any(|weight| *weight < 0.0 || weight.is_nan()) {
        return None;
    }

    let sum: f32 = row.iter().sum();
    if (sum - 1.0).abs() > EMBEDDING_SUM_TOLERANCE {
        return None;
    }

    let non_zero: SmallVec<[f32; 8]> = row.iter().copied().filter(|w| *w != 0.0).collect();
    match non_zero.as_slice() {
        [w] if *w == 1.0 => Some(RowPattern::Vertex),
        [a, b] if *a == 0.5 && *b == 0.5 => Some(RowPattern::EdgeMidpoint),
        [_, _] => None,
        weights => Some(RowPattern::Centroid(weights.len())),
    }
}
