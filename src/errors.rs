//! Error types produced while editing, analysing or optimizing trusses.

use thiserror::Error;

use crate::member::Member;

/// Error returned when the equilibrium solve cannot produce member forces.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Returned when a member joins two coincident joints and has no direction.
    #[error("member {0} has zero length")]
    ZeroLengthMember(Member),
    /// Returned when the joint worklist stalls with unknown forces remaining.
    ///
    /// The structure is statically indeterminate, disconnected or
    /// under-constrained for the current geometry.
    #[error("{unresolved} joint(s) still have unknown member forces; structure is indeterminate")]
    Indeterminate {
        /// Number of joints left holding unresolved member forces.
        unresolved: usize,
    },
}

impl AnalysisError {
    /// True for failures that only disqualify the current geometry.
    ///
    /// Degenerate members are input errors and abort the search instead.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Indeterminate { .. })
    }
}

/// Error returned when requesting an invalid set of candidate displacements.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum DisplacementError {
    /// Returned when fewer than three directions are requested.
    #[error("at least 3 displacement directions are required (received {0})")]
    TooFewDirections(usize),
    /// Returned when the displacement radius is zero, negative or not a number.
    #[error("displacement radius must be positive (received {0})")]
    NonPositiveRadius(f64),
}

/// Error returned when editing a [`Truss`](crate::Truss) with invalid input.
///
/// # Examples
///
/// ```
/// use trussopt::{Truss, TrussEditError};
///
/// let mut truss = Truss::new();
/// truss.add_joint(0.0, 0.0, false, false);
/// let error = truss.add_member(0, 5).expect_err("unknown joint is rejected");
/// assert_eq!(error, TrussEditError::UnknownJoint(5));
/// ```
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum TrussEditError {
    /// Returned when a joint index is out of range.
    #[error("joint {0} does not exist in this truss")]
    UnknownJoint(usize),
    /// Returned when a member would connect a joint to itself.
    #[error("member would connect joint {0} to itself")]
    SelfMember(usize),
    /// Returned when the requested displacement set is invalid.
    #[error(transparent)]
    InvalidDisplacements(#[from] DisplacementError),
}

/// Error returned while reading a truss problem from text.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProblemError {
    /// Returned when the input ends before a required token.
    #[error("unexpected end of input while reading {expected}")]
    UnexpectedEnd {
        /// Description of the missing value.
        expected: &'static str,
    },
    /// Returned when a token cannot be parsed as the expected number.
    #[error("could not read {expected} from {token:?}")]
    InvalidNumber {
        /// Description of the value being read.
        expected: &'static str,
        /// Offending token.
        token: String,
    },
    /// Returned when a joint flag is neither `T` nor `F`.
    #[error("expected a T/F flag for {expected}, found {token:?}")]
    InvalidFlag {
        /// Description of the flag being read.
        expected: &'static str,
        /// Offending token.
        token: String,
    },
    /// Returned when the described truss is itself invalid.
    #[error(transparent)]
    Edit(#[from] TrussEditError),
}

/// Error returned by the outer convergence loop.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum ConvergenceError {
    /// Returned when the driver settings cannot be applied to the truss.
    #[error(transparent)]
    Edit(#[from] TrussEditError),
    /// Returned when an optimization round hits degenerate geometry.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
