//! Unordered joint pairs identifying truss members.

use std::fmt;

/// A member connecting two joints, identified by their indices.
///
/// The pair is unordered: `Member::new(0, 1)` and `Member::new(1, 0)` compare
/// and hash identically, so either orientation finds the same internal force.
///
/// # Examples
/// ```
/// use trussopt::Member;
///
/// assert_eq!(Member::new(3, 1), Member::new(1, 3));
/// assert_eq!(Member::new(3, 1).endpoints(), (1, 3));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Member {
    /// Smaller joint index.
    low: usize,
    /// Larger joint index.
    high: usize,
}

impl Member {
    /// Create a member between joints `a` and `b` in either order.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// Both joint indices, smaller first.
    #[must_use]
    pub const fn endpoints(&self) -> (usize, usize) {
        (self.low, self.high)
    }

    /// True when `joint` is one of the member's ends.
    #[must_use]
    pub const fn connects(&self, joint: usize) -> bool {
        self.low == joint || self.high == joint
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}
