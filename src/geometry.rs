//! Fundamental geometric types for planar truss modelling.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Position (or positional offset) in the plane of the truss.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis.
    pub x: f64,
    /// Distance along the global Y axis.
    pub y: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Return this point translated by `delta`.
    #[must_use]
    pub fn offset(self, delta: Point) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y)
    }

    /// Euclidean distance between two points.
    ///
    /// # Examples
    /// ```
    /// use trussopt::point;
    ///
    /// assert_eq!(point(0.0, 0.0).distance_to(point(3.0, 4.0)), 5.0);
    /// ```
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (other.to_vector() - self.to_vector()).norm()
    }

    /// Unit vector pointing from this point towards `other`.
    ///
    /// Returns `None` when the points coincide, since no direction exists.
    #[must_use]
    pub fn direction_to(self, other: Point) -> Option<Vector2<f64>> {
        let delta = other.to_vector() - self.to_vector();
        let length = delta.norm();
        if length == 0.0 || !length.is_finite() {
            return None;
        }
        Some(delta / length)
    }
}

impl From<Vector2<f64>> for Point {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use trussopt::point;
///
/// let origin = point(0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0);
        let vector: Vector2<f64> = origin.into();
        assert_eq!(vector, Vector2::new(1.0, 2.0));
        assert_eq!(Point::from(vector), origin);
    }

    #[test]
    fn direction_is_unit_length() {
        let direction = point(2.0, 3.0)
            .direction_to(point(0.0, 0.0))
            .expect("distinct points have a direction");
        assert_relative_eq!(direction.norm(), 1.0, epsilon = 1.0e-15);
        assert_relative_eq!(direction.x, -2.0 / 13.0_f64.sqrt(), epsilon = 1.0e-15);
        assert_relative_eq!(direction.y, -3.0 / 13.0_f64.sqrt(), epsilon = 1.0e-15);
    }

    #[test]
    fn coincident_points_have_no_direction() {
        assert!(point(1.5, 1.5).direction_to(point(1.5, 1.5)).is_none());
    }
}
