//! Positional validity rules applied to joints while the optimizer moves them.

use crate::geometry::Point;

/// Open rectangular region a joint must stay strictly inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    /// Exclusive lower bound on X.
    pub min_x: f64,
    /// Exclusive upper bound on X.
    pub max_x: f64,
    /// Exclusive lower bound on Y.
    pub min_y: f64,
    /// Exclusive upper bound on Y.
    pub max_y: f64,
}

impl Band {
    /// Return true when `position` lies strictly inside the band.
    #[must_use]
    pub fn contains(&self, position: Point) -> bool {
        position.x > self.min_x
            && position.x < self.max_x
            && position.y > self.min_y
            && position.y < self.max_y
    }
}

/// Band used for ordinary joints.
pub const DEFAULT_BAND: Band = Band {
    min_x: 0.0,
    max_x: 41.0,
    min_y: 0.0,
    max_y: 10.5,
};

/// Narrow band used for the joint designated as the highest of the truss.
pub const HIGHEST_BAND: Band = Band {
    min_x: 0.0,
    max_x: 41.0,
    min_y: 9.5,
    max_y: 10.5,
};

/// Per-joint rule deciding whether a candidate position is acceptable.
///
/// # Examples
/// ```
/// use trussopt::{point, ValidityPredicate};
///
/// assert!(ValidityPredicate::DefaultBand.is_valid(point(2.0, 3.0)));
/// assert!(!ValidityPredicate::HighestBand.is_valid(point(2.0, 3.0)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ValidityPredicate {
    /// `0 < x < 41` and `0 < y < 10.5`.
    #[default]
    DefaultBand,
    /// `0 < x < 41` and `9.5 < y < 10.5`.
    HighestBand,
}

impl ValidityPredicate {
    /// Select the predicate for a joint given whether it is the highest joint.
    #[must_use]
    pub fn for_joint(highest: bool) -> Self {
        if highest {
            Self::HighestBand
        } else {
            Self::DefaultBand
        }
    }

    /// The band enforced by this predicate.
    #[must_use]
    pub fn band(self) -> Band {
        match self {
            Self::DefaultBand => DEFAULT_BAND,
            Self::HighestBand => HIGHEST_BAND,
        }
    }

    /// Check a candidate absolute position.
    #[must_use]
    pub fn is_valid(self, position: Point) -> bool {
        self.band().contains(position)
    }
}
