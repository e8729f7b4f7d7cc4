use super::Point;
use std::cmp::Ordering;

/// Resolution used to decide if two Points occupy the same location
pub const POINT_UNIQUENESS_ACCURACY: f64 = 1e-12;

/// A totally ordered key describing the location of a [Point]
///
/// Coordinates are rounded to [POINT_UNIQUENESS_ACCURACY] so midpoints computed from different parents map onto the same key
#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct PointKey([FloatRep; 3]);

impl From<&Point> for PointKey {
    fn from(point: &Point) -> Self {
        Self([
            FloatRep::from(point.x),
            FloatRep::from(point.y),
            FloatRep::from(point.z),
        ])
    }
}

#[derive(Hash, PartialEq, Eq, Clone, Copy, Debug)]
struct FloatRep {
    sign: bool,
    bits: u64,
}

impl FloatRep {
    fn from(value: f64) -> Self {
        let integer_part = value.abs().trunc();
        let fractional_rounded =
            (value.abs().fract() / POINT_UNIQUENESS_ACCURACY).round() * POINT_UNIQUENESS_ACCURACY;
        let total_rounded = integer_part + fractional_rounded;

        Self {
            // -0.0 and 0.0 describe the same location
            sign: value.is_sign_positive() || total_rounded == 0.0,
            bits: total_rounded.to_bits(),
        }
    }
}

impl Ord for FloatRep {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sign, other.sign) {
            (true, true) => self.bits.cmp(&other.bits),
            (false, true) => Ordering::Less,
            (true, false) => Ordering::Greater,
            (false, false) => self.bits.cmp(&other.bits).reverse(),
        }
    }
}

impl PartialOrd for FloatRep {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_points_share_a_key() {
        let a = Point::new(0.1 + 0.2, 1.0, -2.5);
        let b = Point::new(0.3, 1.0, -2.5);
        assert_eq!(PointKey::from(&a), PointKey::from(&b));
    }

    #[test]
    fn signed_zero() {
        assert_eq!(
            PointKey::from(&Point::new(-0.0, 0.0, 0.0)),
            PointKey::from(&Point::new(0.0, -0.0, 0.0))
        );
    }

    #[test]
    fn ordering() {
        let keys: Vec<PointKey> = [-2.0, -1.0, -0.5, 0.0, 0.5, 3.0]
            .iter()
            .map(|x| PointKey::from(&Point::new(*x, 0.0, 0.0)))
            .collect();

        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_ne!(
            PointKey::from(&Point::new(1.0, 0.0, 0.0)),
            PointKey::from(&Point::new(1.0 + 1e-9, 0.0, 0.0))
        );
    }
}
