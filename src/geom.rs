/// A Point in Real Space with a mesh-wide unique identifier
pub mod node;
/// Exact, hashable representations of floating point coordinates
pub mod point_key;

/// A location in 3D Real Space
pub type Point = nalgebra::Point3<f64>;

/// A displacement between two [Point]s
pub type Vector = nalgebra::Vector3<f64>;

/// Default relative tolerance for fuzzy geometric comparisons
pub const TOLERANCE: f64 = 1.0e-6;

/// Tolerance based comparisons of vector quantities
pub trait FuzzyEq {
    /// True if the l1 distance between `self` and `other` is at most `tol`
    fn absolute_fuzzy_equals(&self, other: &Self, tol: f64) -> bool;

    /// True if the l1 distance between `self` and `other` is at most `tol` times their combined l1 norms
    fn relative_fuzzy_equals(&self, other: &Self, tol: f64) -> bool;
}

impl FuzzyEq for Vector {
    fn absolute_fuzzy_equals(&self, other: &Self, tol: f64) -> bool {
        (self - other).lp_norm(1) <= tol
    }

    fn relative_fuzzy_equals(&self, other: &Self, tol: f64) -> bool {
        self.absolute_fuzzy_equals(other, tol * (self.lp_norm(1) + other.lp_norm(1)))
    }
}

/// Arithmetic mean of a set of [Point]s
///
/// panics if `points` is empty
pub fn mean_point(points: &[Point]) -> Point {
    assert!(
        !points.is_empty(),
        "Cannot compute the mean of an empty set of Points!"
    );

    let sum = points
        .iter()
        .fold(Vector::zeros(), |acc, point| acc + point.coords);

    Point::from(sum / points.len() as f64)
}
