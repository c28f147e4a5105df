//! Backtracking search over small displacements of the free joints.
//!
//! Every free joint tries each offset of the [`DisplacementSet`] in turn, so
//! one round visits the Cartesian product of candidate positions, pruned by
//! each joint's [`ValidityPredicate`](crate::ValidityPredicate). Every complete
//! combination is solved and costed; the cheapest geometry is kept in a
//! [`BestSnapshot`] and committed once the round finishes.

use std::f64::consts::TAU;
use std::ops::{Deref, DerefMut};

use log::{debug, trace, warn};

use crate::errors::{AnalysisError, DisplacementError, TrussEditError};
use crate::geometry::Point;
use crate::truss::Truss;

/// Best cost reported before any geometry has been solved.
pub const UNSOLVED_COST: f64 = f64::MAX;

/// Candidate offsets tried for each free joint.
///
/// The zero offset always comes first, so the unmoved position is part of
/// every search.
///
/// # Examples
/// ```
/// use trussopt::DisplacementSet;
///
/// let set = DisplacementSet::circle(4, 0.5)?;
/// assert_eq!(set.len(), 5);
/// assert_eq!(set.offsets()[0], trussopt::point(0.0, 0.0));
/// assert_eq!(set.offsets()[1], trussopt::point(0.5, 0.0));
/// # Ok::<(), trussopt::DisplacementError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementSet {
    /// Offsets in generation order.
    offsets: Vec<Point>,
}

impl Default for DisplacementSet {
    fn default() -> Self {
        Self {
            offsets: vec![Point::default()],
        }
    }
}

impl DisplacementSet {
    /// Zero offset plus `directions` points evenly spaced on a circle of
    /// `radius`, starting at angle zero and turning counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns [`DisplacementError::TooFewDirections`] when `directions < 3`
    /// and [`DisplacementError::NonPositiveRadius`] when `radius` is not
    /// strictly positive.
    pub fn circle(directions: usize, radius: f64) -> Result<Self, DisplacementError> {
        if directions < 3 {
            return Err(DisplacementError::TooFewDirections(directions));
        }
        if radius.is_nan() || radius <= 0.0 {
            return Err(DisplacementError::NonPositiveRadius(radius));
        }
        #[allow(clippy::cast_precision_loss)]
        let step = TAU / directions as f64;
        let offsets = std::iter::once(Point::default())
            .chain((0..directions).map(|index| {
                #[allow(clippy::cast_precision_loss)]
                let theta = step * index as f64;
                Point::new(theta.cos() * radius, theta.sin() * radius)
            }))
            .collect();
        Ok(Self { offsets })
    }

    /// Offsets in the order they are tried.
    #[must_use]
    pub fn offsets(&self) -> &[Point] {
        &self.offsets
    }

    /// Number of offsets, the zero offset included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// True when the set holds no offsets at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// Cheapest solved geometry recorded so far.
#[derive(Clone, Debug, PartialEq)]
pub struct BestSnapshot {
    /// Cost of the recorded geometry, or [`UNSOLVED_COST`].
    pub(crate) cost: f64,
    /// Position of every joint, in index order.
    pub(crate) coordinates: Vec<Point>,
}

impl Default for BestSnapshot {
    fn default() -> Self {
        Self {
            cost: UNSOLVED_COST,
            coordinates: Vec::new(),
        }
    }
}

impl BestSnapshot {
    /// Recorded cost; never increases over the life of a truss.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Joint positions at the time the cost was recorded.
    #[must_use]
    pub fn coordinates(&self) -> &[Point] {
        &self.coordinates
    }

    /// True once at least one geometry has been solved and costed.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.cost < UNSOLVED_COST
    }
}

/// Counters collected over one optimization round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoundStats {
    /// Complete combinations of free joint positions that were evaluated.
    pub leaves: usize,
    /// Leaves whose geometry solved to a full set of member forces.
    pub solved: usize,
    /// Times the best cost dropped during the round.
    pub improvements: usize,
}

/// A joint moved by an offset for as long as the guard lives.
///
/// Dropping the guard puts back the exact original position, including when
/// the search unwinds with an error.
struct Shifted<'a> {
    /// Truss being searched.
    truss: &'a mut Truss,
    /// Joint that was moved.
    joint: usize,
    /// Position before the move.
    original: Point,
}

impl<'a> Shifted<'a> {
    /// Move `joint` by `delta`.
    fn new(truss: &'a mut Truss, joint: usize, delta: Point) -> Self {
        let original = truss.joints[joint].position;
        truss.joints[joint].position = original.offset(delta);
        Self {
            truss,
            joint,
            original,
        }
    }

    /// Whether the moved joint satisfies its validity rule.
    fn is_valid(&self) -> bool {
        let joint = &self.truss.joints[self.joint];
        joint.validity.is_valid(joint.position)
    }
}

impl Deref for Shifted<'_> {
    type Target = Truss;

    fn deref(&self) -> &Truss {
        self.truss
    }
}

impl DerefMut for Shifted<'_> {
    fn deref_mut(&mut self) -> &mut Truss {
        self.truss
    }
}

impl Drop for Shifted<'_> {
    fn drop(&mut self) {
        self.truss.joints[self.joint].position = self.original;
    }
}

impl Truss {
    /// Replace the candidate offsets with a circle of `directions` points.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::InvalidDisplacements`] when `directions < 3`
    /// or `radius` is not positive; the current set is kept in that case.
    pub fn set_displacements(
        &mut self,
        directions: usize,
        radius: f64,
    ) -> Result<(), TrussEditError> {
        self.displacements = DisplacementSet::circle(directions, radius)?;
        Ok(())
    }

    /// Candidate offsets tried for each free joint.
    #[must_use]
    pub fn displacements(&self) -> &DisplacementSet {
        &self.displacements
    }

    /// Cheapest geometry found so far.
    #[must_use]
    pub fn best(&self) -> &BestSnapshot {
        &self.best
    }

    /// Cost of the cheapest geometry found so far, or [`UNSOLVED_COST`].
    #[must_use]
    pub fn best_cost(&self) -> f64 {
        self.best.cost
    }

    /// Search every combination of free joint offsets once, then move all
    /// joints to the best geometry recorded so far.
    ///
    /// Geometries that cannot be solved are skipped. After the commit the
    /// member forces are re-solved so they describe the committed geometry.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ZeroLengthMember`] when a visited geometry
    /// makes two connected joints coincide. Joint positions are restored and
    /// nothing is committed in that case.
    pub fn run_optimization_round(&mut self) -> Result<RoundStats, AnalysisError> {
        let mut stats = RoundStats::default();
        if let Err(error) = self.explore(0, &mut stats) {
            warn!("optimization round aborted: {error}");
            return Err(error);
        }
        debug!(
            "round visited {} leaves ({} solved, {} improvements), best cost {}",
            stats.leaves, stats.solved, stats.improvements, self.best.cost
        );

        self.commit_best();
        match self.solve() {
            Err(error) if !error.is_recoverable() => Err(error),
            _ => Ok(stats),
        }
    }

    /// Try every offset for the free joint at `depth`, recursing to the next.
    fn explore(&mut self, depth: usize, stats: &mut RoundStats) -> Result<(), AnalysisError> {
        let Some(&joint) = self.free_joints.get(depth) else {
            return self.evaluate_leaf(stats);
        };

        for index in 0..self.displacements.len() {
            let delta = self.displacements.offsets[index];
            let mut shifted = Shifted::new(self, joint, delta);
            if shifted.is_valid() {
                shifted.explore(depth + 1, stats)?;
            }
        }
        Ok(())
    }

    /// Solve the current geometry and record it if it beats the best cost.
    fn evaluate_leaf(&mut self, stats: &mut RoundStats) -> Result<(), AnalysisError> {
        stats.leaves += 1;
        match self.solve() {
            Ok(sweeps) => trace!("leaf solved in {sweeps} sweep(s)"),
            Err(error) if error.is_recoverable() => {
                trace!("skipping unsolvable geometry: {error}");
                return Ok(());
            }
            Err(error) => return Err(error),
        }
        stats.solved += 1;

        let Some(cost) = self.total_cost() else {
            return Ok(());
        };
        if cost < self.best.cost {
            debug!("best cost improved from {} to {cost}", self.best.cost);
            self.best.cost = cost;
            self.best.coordinates.clear();
            self.best
                .coordinates
                .extend(self.joints.iter().map(|joint| joint.position));
            stats.improvements += 1;
        }
        Ok(())
    }

    /// Move every joint to its position in the best snapshot.
    fn commit_best(&mut self) {
        for (joint, &position) in self.joints.iter_mut().zip(&self.best.coordinates) {
            joint.position = position;
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;
    use crate::member::Member;

    fn triangle() -> Truss {
        let mut truss = Truss::new();
        truss.add_joint(0.0, 0.0, false, false);
        truss.add_joint(4.0, 0.0, false, false);
        truss.add_joint(2.0, 3.0, true, false);
        truss.add_member(0, 2).expect("member added");
        truss.add_member(1, 2).expect("member added");
        truss.add_load(2, -10.0).expect("load applied");
        truss
    }

    #[test]
    fn circle_starts_with_zero_offset() {
        let set = DisplacementSet::circle(4, 2.0).expect("valid set");
        let offsets = set.offsets();
        assert_eq!(offsets.len(), 5);
        assert_eq!(offsets[0], point(0.0, 0.0));
        assert_relative_eq!(offsets[1].x, 2.0, epsilon = 1.0e-12);
        assert_relative_eq!(offsets[2].y, 2.0, epsilon = 1.0e-12);
        assert_relative_eq!(offsets[3].x, -2.0, epsilon = 1.0e-12);
        assert_relative_eq!(offsets[4].y, -2.0, epsilon = 1.0e-12);
        for offset in &offsets[1..] {
            assert_relative_eq!(offset.to_vector().norm(), 2.0, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn invalid_displacement_requests_leave_set_unchanged() {
        let mut truss = triangle();
        truss.set_displacements(6, 0.25).expect("valid set");
        let before = truss.displacements().clone();

        assert_eq!(
            truss.set_displacements(2, 1.0).expect_err("too few directions"),
            TrussEditError::InvalidDisplacements(DisplacementError::TooFewDirections(2))
        );
        assert_eq!(
            truss.set_displacements(3, 0.0).expect_err("zero radius"),
            TrussEditError::InvalidDisplacements(DisplacementError::NonPositiveRadius(0.0))
        );
        assert!(truss.set_displacements(3, f64::NAN).is_err());
        assert_eq!(truss.displacements(), &before);
    }

    #[test]
    fn set_displacements_replaces_previous_set() {
        let mut truss = triangle();
        assert_eq!(truss.displacements().len(), 1);
        truss.set_displacements(4, 0.5).expect("valid set");
        truss.set_displacements(3, 0.5).expect("valid set");
        assert_eq!(truss.displacements().len(), 4);
    }

    #[test]
    fn shift_guard_restores_exact_bits() {
        let mut truss = Truss::new();
        truss.add_joint(0.1 + 0.2, 7.3, true, false);
        let original = truss.joint_position(0).expect("joint exists");
        let delta = point(0.7, -1.0e-3);
        {
            let shifted = Shifted::new(&mut truss, 0, delta);
            assert_eq!(shifted.joint_position(0), Some(original.offset(delta)));
        }
        let restored = truss.joint_position(0).expect("joint exists");
        assert_eq!(restored.x.to_bits(), original.x.to_bits());
        assert_eq!(restored.y.to_bits(), original.y.to_bits());
    }

    #[test]
    fn round_visits_every_valid_combination() {
        let mut truss = triangle();
        truss.add_joint(3.0, 5.0, true, false);
        truss.add_member(2, 3).expect("member added");
        truss.add_member(1, 3).expect("member added");
        truss.set_displacements(4, 0.5).expect("valid set");

        let stats = truss.run_optimization_round().expect("round completes");
        assert_eq!(stats.leaves, 25);
    }

    #[test]
    fn invalid_positions_are_pruned() {
        let mut truss = triangle();
        // Every offset of this radius leaves the default band.
        truss.set_displacements(4, 50.0).expect("valid set");
        let stats = truss.run_optimization_round().expect("round completes");
        assert_eq!(stats.leaves, 1);
        assert_eq!(stats.solved, 1);
        assert_eq!(truss.joint_position(2), Some(point(2.0, 3.0)));
        assert_relative_eq!(truss.best_cost(), 130.0 / 3.0, epsilon = 1.0e-10);
    }

    #[test]
    fn triangle_round_moves_apex_to_cheapest_candidate() {
        let mut truss = triangle();
        truss.set_displacements(4, 0.5).expect("valid set");
        let stats = truss.run_optimization_round().expect("round completes");

        // cost = |P| (a b + h^2) / h, lowest among the five candidates at (2, 2.5).
        assert_eq!(stats.leaves, 5);
        assert_eq!(stats.solved, 5);
        assert_relative_eq!(truss.best_cost(), 41.0, epsilon = 1.0e-9);
        let apex = truss.joint_position(2).expect("joint exists");
        assert_relative_eq!(apex.x, 2.0, epsilon = 1.0e-12);
        assert_relative_eq!(apex.y, 2.5, epsilon = 1.0e-12);
        assert_eq!(truss.joint_position(0), Some(point(0.0, 0.0)));
        assert_eq!(truss.best().coordinates().len(), 3);

        let cost = truss.total_cost().expect("forces describe committed geometry");
        assert_relative_eq!(cost, 41.0, epsilon = 1.0e-9);
    }

    #[test]
    fn unsolvable_rounds_leave_positions_untouched() {
        let mut truss = Truss::new();
        truss.add_joint(1.0, 1.0, false, false);
        truss.add_joint(5.0, 1.0, false, false);
        truss.add_joint(5.0, 4.0, true, false);
        truss.add_joint(1.0, 4.0, true, false);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0), (0, 2), (1, 3)] {
            truss.add_member(a, b).expect("member added");
        }
        truss.set_displacements(3, 0.1).expect("valid set");
        let before: Vec<Point> = (0..4).filter_map(|j| truss.joint_position(j)).collect();

        let stats = truss.run_optimization_round().expect("round completes");
        assert_eq!(stats.leaves, 16);
        assert_eq!(stats.solved, 0);
        assert_eq!(truss.best_cost(), UNSOLVED_COST);
        assert!(!truss.best().is_solved());
        let after: Vec<Point> = (0..4).filter_map(|j| truss.joint_position(j)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn degenerate_geometry_aborts_and_restores_positions() {
        let mut truss = Truss::new();
        truss.add_joint(1.0, 4.0, false, false);
        truss.add_joint(2.0, 4.0, true, false);
        truss.add_member(0, 1).expect("member added");
        // The offset at angle pi lands the free joint on its neighbour.
        truss.set_displacements(4, 1.0).expect("valid set");

        let error = truss
            .run_optimization_round()
            .expect_err("coincident joints detected");
        assert_eq!(error, AnalysisError::ZeroLengthMember(Member::new(0, 1)));
        assert_eq!(truss.joint_position(1), Some(point(2.0, 4.0)));
    }
}
