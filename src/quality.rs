use crate::elem::ElemType;
use crate::geom::Point;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named scalar diagnostics of an `Elem`s shape fitness
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElemQuality {
    AspectRatio,
    Skew,
    Shear,
    Shape,
    MaxAngle,
    MinAngle,
    Condition,
    Distortion,
    Taper,
    Warp,
    Stretch,
    Diagonal,
    AspectRatioBeta,
    AspectRatioGamma,
    Size,
    Jacobian,
}

impl ElemQuality {
    pub const ALL: [Self; 16] = [
        Self::AspectRatio,
        Self::Skew,
        Self::Shear,
        Self::Shape,
        Self::MaxAngle,
        Self::MinAngle,
        Self::Condition,
        Self::Distortion,
        Self::Taper,
        Self::Warp,
        Self::Stretch,
        Self::Diagonal,
        Self::AspectRatioBeta,
        Self::AspectRatioGamma,
        Self::Size,
        Self::Jacobian,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::AspectRatio => "aspect_ratio",
            Self::Skew => "skew",
            Self::Shear => "shear",
            Self::Shape => "shape",
            Self::MaxAngle => "max_angle",
            Self::MinAngle => "min_angle",
            Self::Condition => "condition",
            Self::Distortion => "distortion",
            Self::Taper => "taper",
            Self::Warp => "warp",
            Self::Stretch => "stretch",
            Self::Diagonal => "diagonal",
            Self::AspectRatioBeta => "aspect_ratio_beta",
            Self::AspectRatioGamma => "aspect_ratio_gamma",
            Self::Size => "size",
            Self::Jacobian => "jacobian",
        }
    }
}

impl fmt::Display for ElemQuality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quality measure: '{0}'")]
pub struct UnknownQualityMeasure(pub String);

impl FromStr for ElemQuality {
    type Err = UnknownQualityMeasure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(&[' ', '-'][..], "_");
        Self::ALL
            .iter()
            .find(|measure| measure.name() == normalized)
            .copied()
            .ok_or_else(|| UnknownQualityMeasure(s.to_string()))
    }
}

/// Canonical `(low, high)` range of a quality measure. Diagnostic only; never enforced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualBounds {
    pub low: f64,
    pub high: f64,
}

impl QualBounds {
    /// Sentinel returned when a measure has no canonical range for a shape
    pub const INVALID: Self = Self::new(-1.0, -1.0);

    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID && self.low <= self.high
    }

    pub fn contains(&self, value: f64) -> bool {
        self.is_valid() && value >= self.low && value <= self.high
    }
}

impl From<QualBounds> for (f64, f64) {
    fn from(bounds: QualBounds) -> Self {
        (bounds.low, bounds.high)
    }
}

/// Canonical range of `measure` for `elem_type`. `None` if the shape has no range for that measure.
pub fn canonical_bounds(elem_type: ElemType, measure: ElemQuality) -> Option<QualBounds> {
    match elem_type {
        ElemType::Quad4 | ElemType::InfQuad4 => quad_bounds(measure),
        ElemType::Hex8 => hex_bounds(measure),
        ElemType::NodeElem | ElemType::Edge2 | ElemType::InfEdge2 => None,
    }
}

fn quad_bounds(measure: ElemQuality) -> Option<QualBounds> {
    use ElemQuality::*;
    match measure {
        AspectRatio => Some(QualBounds::new(1.0, 4.0)),
        Skew => Some(QualBounds::new(0.0, 0.5)),
        Taper => Some(QualBounds::new(0.0, 0.7)),
        Warp => Some(QualBounds::new(0.9, 1.0)),
        Stretch => Some(QualBounds::new(0.25, 1.0)),
        MinAngle => Some(QualBounds::new(45.0, 90.0)),
        MaxAngle => Some(QualBounds::new(90.0, 135.0)),
        Condition => Some(QualBounds::new(1.0, 4.0)),
        Jacobian => Some(QualBounds::new(0.5, 1.0)),
        Shear | Shape | Size => Some(QualBounds::new(0.3, 1.0)),
        Distortion => Some(QualBounds::new(0.6, 1.0)),
        _ => None,
    }
}

fn hex_bounds(measure: ElemQuality) -> Option<QualBounds> {
    use ElemQuality::*;
    match measure {
        AspectRatio => Some(QualBounds::new(1.0, 4.0)),
        Skew => Some(QualBounds::new(0.0, 0.5)),
        Shear | Shape => Some(QualBounds::new(0.3, 1.0)),
        Condition => Some(QualBounds::new(1.0, 8.0)),
        Jacobian => Some(QualBounds::new(0.5, 1.0)),
        Distortion => Some(QualBounds::new(0.6, 1.0)),
        Taper => Some(QualBounds::new(0.0, 0.4)),
        Stretch => Some(QualBounds::new(0.25, 1.0)),
        Diagonal => Some(QualBounds::new(0.65, 1.0)),
        Size => Some(QualBounds::new(0.5, 1.0)),
        _ => None,
    }
}

fn lengths<'a>(
    points: &'a [Point],
    pairs: &'a [[usize; 2]],
) -> impl Iterator<Item = f64> + 'a {
    pairs
        .iter()
        .map(move |[a, b]| (points[*b] - points[*a]).norm())
}

/// Ratio of the shortest to the longest diagonal
///
/// `None` if every diagonal has collapsed to zero length
pub(crate) fn diagonal_ratio(points: &[Point], diagonals: &[[usize; 2]]) -> Option<f64> {
    let (min, max) = lengths(points, diagonals)
        .fold((f64::INFINITY, 0.0_f64), |(min, max), l| (min.min(l), max.max(l)));
    (max > 0.0).then(|| min / max)
}

/// Shortest edge over longest diagonal, times `scale`
///
/// `scale` is the diagonal to edge ratio of the ideal shape (√2 for a square, √3 for a cube)
pub(crate) fn stretch(
    points: &[Point],
    edges: &[[usize; 2]],
    diagonals: &[[usize; 2]],
    scale: f64,
) -> Option<f64> {
    let min_edge = lengths(points, edges).fold(f64::INFINITY, f64::min);
    let max_diagonal = lengths(points, diagonals).fold(0.0, f64::max);
    (max_diagonal > 0.0).then(|| scale * min_edge / max_diagonal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elem::{test_utils::*, Elem};
    use approx::assert_relative_eq;

    #[test]
    fn parse_measures() {
        for measure in ElemQuality::ALL {
            assert_eq!(measure.name().parse::<ElemQuality>().unwrap(), measure);
        }
        assert_eq!("Aspect Ratio".parse::<ElemQuality>().unwrap(), ElemQuality::AspectRatio);
        assert_eq!("MIN-ANGLE".parse::<ElemQuality>().unwrap(), ElemQuality::MinAngle);
        assert!("smoothness".parse::<ElemQuality>().is_err());
    }

    #[test]
    fn hex_bounds_table() {
        let hex = unit_cube();
        assert_eq!(hex.qual_bounds(ElemQuality::Condition), QualBounds::new(1.0, 8.0));
        assert_eq!(hex.qual_bounds(ElemQuality::Diagonal), QualBounds::new(0.65, 1.0));
        assert_eq!(
            <(f64, f64)>::from(hex.qual_bounds(ElemQuality::Taper)),
            (0.0, 0.4)
        );
    }

    #[test]
    fn inf_quad_bounds_table() {
        let inf_quad = &sample_elems()[4];
        assert_eq!(inf_quad.qual_bounds(ElemQuality::Warp), QualBounds::new(0.9, 1.0));
        assert_eq!(inf_quad.qual_bounds(ElemQuality::MaxAngle), QualBounds::new(90.0, 135.0));
        assert_eq!(inf_quad.qual_bounds(ElemQuality::Size), QualBounds::new(0.3, 1.0));
    }

    #[test]
    fn unrecognized_measures_degrade_softly() {
        let hex = unit_cube();
        assert_eq!(hex.qual_bounds(ElemQuality::Warp), QualBounds::INVALID);
        assert_eq!(hex.qual_bounds_by_name("smoothness"), QualBounds::INVALID);
        assert_eq!(hex.qual_bounds_by_name("diagonal"), QualBounds::new(0.65, 1.0));
        assert!(!QualBounds::INVALID.is_valid());

        let edge = &sample_elems()[1];
        assert!(ElemQuality::ALL
            .iter()
            .all(|measure| edge.qual_bounds(*measure) == QualBounds::INVALID));
    }

    #[test]
    fn every_bound_is_ordered() {
        for elem_type in ElemType::ALL {
            for measure in ElemQuality::ALL {
                if let Some(bounds) = canonical_bounds(elem_type, measure) {
                    assert!(bounds.is_valid(), "{} {}", elem_type, measure);
                }
            }
        }
    }

    #[test]
    fn ideal_shapes_are_in_bounds() {
        let hex = unit_cube();
        for measure in [ElemQuality::Diagonal, ElemQuality::Stretch] {
            let value = hex.quality(measure).unwrap();
            assert_relative_eq!(value, 1.0, epsilon = 1e-12);
            assert!(hex.qual_bounds(measure).contains(value));
        }

        let quad = &sample_elems()[3];
        assert_relative_eq!(quad.quality(ElemQuality::Stretch).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(quad.quality(ElemQuality::Diagonal).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn stretched_hex() {
        let mut coords = UNIT_CUBE;
        coords.iter_mut().for_each(|c| c[0] *= 4.0);
        let hex = crate::elem::Hex8::new(nodes_at(0, &coords).try_into().unwrap());

        // min edge 1, max diagonal sqrt(18)
        assert_relative_eq!(
            hex.quality(ElemQuality::Stretch).unwrap(),
            3.0_f64.sqrt() / 18.0_f64.sqrt(),
            epsilon = 1e-12
        );
        assert_relative_eq!(hex.quality(ElemQuality::Diagonal).unwrap(), 1.0, epsilon = 1e-12);
        assert!(hex.quality(ElemQuality::Jacobian).is_none());
    }

    #[test]
    fn collapsed_shapes_compute_nothing() {
        let hex = crate::elem::Hex8::new(nodes_at(0, &[[1.0, 2.0, 3.0]; 8]).try_into().unwrap());
        assert!(hex.quality(ElemQuality::Diagonal).is_none());
        assert!(hex.quality(ElemQuality::Stretch).is_none());

        // a sliver keeps a finite diagonal ratio
        let mut coords = UNIT_CUBE;
        coords.iter_mut().for_each(|c| c[2] = 0.0);
        let sliver = crate::elem::Hex8::new(nodes_at(0, &coords).try_into().unwrap());
        assert_relative_eq!(sliver.quality(ElemQuality::Stretch).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn infinite_shapes_compute_nothing() {
        let inf_quad = &sample_elems()[4];
        assert!(ElemQuality::ALL.iter().all(|m| inf_quad.quality(*m).is_none()));
    }
}
