//! Truss model and the method-of-joints equilibrium solver.

use std::collections::HashMap;

use log::trace;
use nalgebra::{DMatrix, Vector2};

use crate::constraints::ValidityPredicate;
use crate::errors::{AnalysisError, TrussEditError};
use crate::geometry::Point;
use crate::matrix::LinearSystemSolver;
use crate::member::Member;
use crate::optimizer::{BestSnapshot, DisplacementSet};

/// Internal representation of a truss joint.
#[derive(Clone, Debug)]
pub(crate) struct Joint {
    /// Current position of the joint.
    pub(crate) position: Point,
    /// Accumulated external load along the vertical axis.
    pub(crate) load: f64,
    /// Indices of the joints connected to this one, in member insertion order.
    pub(crate) neighbours: Vec<usize>,
    /// Number of incident members whose force is currently unresolved.
    pub(crate) unknowns: usize,
    /// Rule the optimizer checks before accepting a new position.
    pub(crate) validity: ValidityPredicate,
    /// Whether a support reaction balances this joint.
    pub(crate) support: bool,
}

impl Joint {
    /// Create an unloaded, unconnected joint.
    fn new(position: Point, validity: ValidityPredicate, support: bool) -> Self {
        Self {
            position,
            load: 0.0,
            neighbours: Vec::new(),
            unknowns: 0,
            validity,
            support,
        }
    }
}

/// Container for a planar pin-jointed truss.
///
/// Joints and members are appended during a build phase. [`Truss::solve`]
/// then resolves every member force by enforcing equilibrium joint by joint,
/// and [`Truss::run_optimization_round`] searches nearby positions of the free
/// joints for a cheaper geometry.
///
/// Joints that are not free start out as supports. Their equations only join
/// the solve once the ordinary joints stop making progress, so member forces
/// are read from the loaded side first. Reactions enter a support's equations
/// as ordinary loads. [`Truss::set_support`] turns a fixed joint into an
/// ordinary one.
///
/// # Examples
/// ```
/// use trussopt::Truss;
///
/// let mut truss = Truss::new();
/// let left = truss.add_joint(0.0, 0.0, false, false);
/// let right = truss.add_joint(4.0, 0.0, false, false);
/// let apex = truss.add_joint(2.0, 3.0, true, false);
/// truss.add_member(left, apex)?;
/// truss.add_member(right, apex)?;
/// truss.add_load(apex, -10.0)?;
///
/// assert_eq!(truss.solve()?, 1);
/// let force = truss.member_force(left, apex).expect("member solved");
/// assert!((force + 10.0 * 13.0_f64.sqrt() / 6.0).abs() < 1.0e-9);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct Truss {
    /// Joints in index order.
    pub(crate) joints: Vec<Joint>,
    /// Members in insertion order.
    pub(crate) members: Vec<Member>,
    /// Internal force of each member; `None` while unresolved.
    pub(crate) internal_forces: HashMap<Member, Option<f64>>,
    /// Indices of the joints the optimizer may move.
    pub(crate) free_joints: Vec<usize>,
    /// Candidate offsets tried for each free joint.
    pub(crate) displacements: DisplacementSet,
    /// Cheapest solved geometry seen so far.
    pub(crate) best: BestSnapshot,
    /// Reducer for the per-joint equilibrium systems.
    pub(crate) solver: LinearSystemSolver,
}

impl Truss {
    /// Create an empty truss.
    ///
    /// # Examples
    /// ```
    /// use trussopt::Truss;
    ///
    /// let truss = Truss::new();
    /// assert_eq!(truss.joint_count(), 0);
    /// assert_eq!(truss.best_cost(), trussopt::UNSOLVED_COST);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of joints in the truss.
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Return the number of members in the truss.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Append a joint at `(x, y)` and return its index.
    ///
    /// `free` makes the joint eligible for repositioning by the optimizer;
    /// any other joint is a support. `highest` selects
    /// [`ValidityPredicate::HighestBand`] for it.
    pub fn add_joint(&mut self, x: f64, y: f64, free: bool, highest: bool) -> usize {
        let position = Point::new(x, y);
        let index = self.joints.len();
        self.joints.push(Joint::new(
            position,
            ValidityPredicate::for_joint(highest),
            !free,
        ));
        self.best.coordinates.push(position);
        if free {
            self.free_joints.push(index);
        }
        index
    }

    /// Connect joints `a` and `b` with a new member whose force is unresolved.
    ///
    /// Any previously solved forces are discarded. Connecting a pair twice
    /// adds a parallel member: both ends list each other twice, but the pair
    /// shares a single force entry, which the solver can never split between
    /// the two and so leaves unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when either index is out of
    /// range and [`TrussEditError::SelfMember`] when `a == b`. The truss is
    /// left untouched on error.
    pub fn add_member(&mut self, a: usize, b: usize) -> Result<Member, TrussEditError> {
        for joint in [a, b] {
            if joint >= self.joints.len() {
                return Err(TrussEditError::UnknownJoint(joint));
            }
        }
        if a == b {
            return Err(TrussEditError::SelfMember(a));
        }
        self.reset_internal_forces();

        let member = Member::new(a, b);
        self.joints[a].neighbours.push(b);
        self.joints[b].neighbours.push(a);
        self.joints[a].unknowns += 1;
        self.joints[b].unknowns += 1;
        if self.internal_forces.insert(member, None).is_none() {
            self.members.push(member);
        }
        Ok(member)
    }

    /// Mark whether a support reaction balances `joint`.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is out of range.
    pub fn set_support(&mut self, joint: usize, support: bool) -> Result<(), TrussEditError> {
        let node = self
            .joints
            .get_mut(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))?;
        node.support = support;
        Ok(())
    }

    /// Add `magnitude` to the vertical load on a joint.
    ///
    /// Loads accumulate; negative values point downwards.
    ///
    /// # Errors
    ///
    /// Returns [`TrussEditError::UnknownJoint`] when `joint` is out of range.
    pub fn add_load(&mut self, joint: usize, magnitude: f64) -> Result<(), TrussEditError> {
        let node = self
            .joints
            .get_mut(joint)
            .ok_or(TrussEditError::UnknownJoint(joint))?;
        node.load += magnitude;
        Ok(())
    }

    /// Current position of a joint.
    #[must_use]
    pub fn joint_position(&self, joint: usize) -> Option<Point> {
        self.joints.get(joint).map(|joint| joint.position)
    }

    /// Accumulated vertical load on a joint.
    #[must_use]
    pub fn joint_load(&self, joint: usize) -> Option<f64> {
        self.joints.get(joint).map(|joint| joint.load)
    }

    /// Validity rule attached to a joint.
    #[must_use]
    pub fn joint_validity(&self, joint: usize) -> Option<ValidityPredicate> {
        self.joints.get(joint).map(|joint| joint.validity)
    }

    /// Joints connected to `joint`, in member insertion order.
    #[must_use]
    pub fn neighbours(&self, joint: usize) -> Option<&[usize]> {
        self.joints.get(joint).map(|joint| joint.neighbours.as_slice())
    }

    /// Number of members at `joint` whose force is still unresolved.
    #[must_use]
    pub fn unknowns(&self, joint: usize) -> Option<usize> {
        self.joints.get(joint).map(|joint| joint.unknowns)
    }

    /// Whether `joint` is balanced by a support reaction.
    #[must_use]
    pub fn is_support(&self, joint: usize) -> bool {
        self.joints.get(joint).is_some_and(|joint| joint.support)
    }

    /// Whether the optimizer may move `joint`.
    #[must_use]
    pub fn is_free(&self, joint: usize) -> bool {
        self.free_joints.contains(&joint)
    }

    /// Indices of the free joints in the order they were added.
    #[must_use]
    pub fn free_joints(&self) -> &[usize] {
        &self.free_joints
    }

    /// Connected pairs in insertion order, one entry per pair.
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Resolved internal force of the member between `a` and `b`.
    ///
    /// Returns `None` when no such member exists or its force is unresolved.
    /// Positive values are tension, negative values compression.
    #[must_use]
    pub fn member_force(&self, a: usize, b: usize) -> Option<f64> {
        self.internal_forces
            .get(&Member::new(a, b))
            .copied()
            .flatten()
    }

    /// Length of a member under the current geometry.
    #[must_use]
    pub fn member_length(&self, member: Member) -> Option<f64> {
        let (a, b) = member.endpoints();
        let start = self.joint_position(a)?;
        let end = self.joint_position(b)?;
        Some(start.distance_to(end))
    }

    /// Structural cost of the current geometry: the sum of length times
    /// absolute force over every member.
    ///
    /// Returns `None` while any member force is unresolved.
    #[must_use]
    pub fn total_cost(&self) -> Option<f64> {
        self.members.iter().try_fold(0.0, |cost, &member| {
            let force = self.internal_forces.get(&member).copied().flatten()?;
            Some(cost + self.member_length(member)? * force.abs())
        })
    }

    /// Resolve every member force for the current geometry and return the
    /// number of sweeps it took.
    ///
    /// Previous results are discarded first, so the same truss can be solved
    /// repeatedly as its joints move. Joints are visited in sweeps ordered by
    /// ascending unknown count; a joint still holding unknowns after its turn
    /// is retried in the next sweep, since members resolved elsewhere may have
    /// reduced it to a solvable system. Supports sit out until a sweep makes no
    /// progress and take part in every sweep after that. Sweeps continue while
    /// any sweep makes progress.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Indeterminate`] when the sweeps stall with
    /// unknowns remaining and [`AnalysisError::ZeroLengthMember`] when a member
    /// joins coincident joints.
    pub fn solve(&mut self) -> Result<usize, AnalysisError> {
        if let Some(&member) = self
            .members
            .iter()
            .find(|&&member| self.member_length(member) == Some(0.0))
        {
            return Err(AnalysisError::ZeroLengthMember(member));
        }
        self.reset_internal_forces();

        let mut current: Vec<usize> = (0..self.joints.len()).collect();
        let mut with_supports = false;
        let mut sweeps = 0;
        loop {
            current.retain(|&joint| self.joints[joint].unknowns != 0);
            if current.is_empty() {
                return Ok(sweeps);
            }
            // Counts go stale as the sweep resolves members; this ordering is best effort.
            current.sort_by_key(|&joint| self.joints[joint].unknowns);

            let mut progress = false;
            let mut pending = Vec::new();
            for joint in current.drain(..) {
                if self.solve_joint(joint, with_supports)? {
                    progress = true;
                }
                if self.joints[joint].unknowns != 0 {
                    pending.push(joint);
                }
            }
            sweeps += 1;
            trace!(
                "sweep {sweeps}: progress = {progress}, {} joint(s) pending",
                pending.len()
            );

            current = pending;
            if !progress {
                if with_supports {
                    break;
                }
                trace!("sweep {sweeps}: ordinary joints stalled, adding supports");
                with_supports = true;
            }
        }

        Err(AnalysisError::Indeterminate {
            unresolved: current.len(),
        })
    }

    /// Set up and reduce the equilibrium equations of a single joint.
    ///
    /// Returns whether at least one previously unknown member force was
    /// resolved. Supports are skipped unless `with_supports` is set.
    fn solve_joint(&mut self, index: usize, with_supports: bool) -> Result<bool, AnalysisError> {
        let joint = &self.joints[index];
        if joint.unknowns == 0 || (joint.support && !with_supports) {
            return Ok(false);
        }

        let mut unknown_members = Vec::with_capacity(joint.unknowns);
        let mut known = Vector2::new(0.0, joint.load);
        let mut system = DMatrix::zeros(2, joint.unknowns + 1);

        for &neighbour in &joint.neighbours {
            let member = Member::new(index, neighbour);
            let direction = joint
                .position
                .direction_to(self.joints[neighbour].position)
                .ok_or(AnalysisError::ZeroLengthMember(member))?;
            match self.internal_forces.get(&member).copied().flatten() {
                Some(force) => known += direction * force,
                None => {
                    let column = unknown_members.len();
                    system[(0, column)] = direction.x;
                    system[(1, column)] = direction.y;
                    unknown_members.push(member);
                }
            }
        }

        // Known contributions move to the right-hand side.
        let rhs = unknown_members.len();
        system[(0, rhs)] = -known.x;
        system[(1, rhs)] = -known.y;

        let rank = self.solver.rref(&mut system);

        let mut progress = false;
        for row in 0..rank {
            let Some(column) = self.solver.leading_one_position(&system, row) else {
                continue;
            };
            let member = unknown_members[column];
            let previous = self
                .internal_forces
                .insert(member, Some(system[(row, rhs)]));
            if previous == Some(None) {
                let count = connections(&self.joints, member);
                let (a, b) = member.endpoints();
                self.joints[a].unknowns -= count;
                self.joints[b].unknowns -= count;
                progress = true;
            }
        }
        Ok(progress)
    }

    /// Mark every resolved member force as unknown again.
    fn reset_internal_forces(&mut self) {
        for (member, force) in &mut self.internal_forces {
            if force.take().is_some() {
                let count = connections(&self.joints, *member);
                let (a, b) = member.endpoints();
                self.joints[a].unknowns += count;
                self.joints[b].unknowns += count;
            }
        }
    }
}

/// Number of members joining the endpoints of `member`.
fn connections(joints: &[Joint], member: Member) -> usize {
    let (a, b) = member.endpoints();
    joints[a]
        .neighbours
        .iter()
        .filter(|&&neighbour| neighbour == b)
        .count()
}
