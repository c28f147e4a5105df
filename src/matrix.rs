//! Gauss-Jordan reduction of small augmented systems.
//!
//! Each joint of the truss contributes a two-row augmented matrix whose last
//! column is the right-hand side. The solver reduces such matrices to reduced
//! row-echelon form (see <https://en.wikipedia.org/wiki/Row_echelon_form>) and
//! reports which rows pin down a single unknown. Singular or inconsistent
//! systems are not errors here: they simply yield a lower rank or rows without
//! a determinable leading position, and the caller decides what that means.

use nalgebra::DMatrix;

/// Magnitude below which an entry is treated as exactly zero.
pub const TOLERANCE: f64 = 1.0e-11;

/// Row reducer for augmented matrices.
///
/// # Examples
/// ```
/// use nalgebra::DMatrix;
/// use trussopt::LinearSystemSolver;
///
/// let solver = LinearSystemSolver::default();
/// let mut system = DMatrix::from_row_slice(2, 3, &[2.0, 0.0, 4.0, 0.0, 4.0, 2.0]);
/// assert_eq!(solver.rref(&mut system), 2);
/// assert_eq!(solver.leading_one_position(&system, 0), Some(0));
/// assert_eq!(system[(0, 2)], 2.0);
/// assert_eq!(system[(1, 2)], 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearSystemSolver {
    /// Entries with a smaller magnitude are canonicalized to zero.
    tolerance: f64,
}

impl Default for LinearSystemSolver {
    fn default() -> Self {
        Self::new(TOLERANCE)
    }
}

impl LinearSystemSolver {
    /// Create a solver with a custom zero threshold.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// The zero threshold used by this solver.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Reduce `matrix` in place to reduced row-echelon form and return its rank.
    ///
    /// Every column, the augmented one included, is a pivot candidate, so an
    /// inconsistent system shows up as a pivot in the right-hand-side column.
    pub fn rref(&self, matrix: &mut DMatrix<f64>) -> usize {
        let (rows, cols) = matrix.shape();
        let mut pivot_row = 0;
        let mut rank = 0;

        for col in 0..cols {
            if pivot_row == rows {
                break;
            }
            let Some(found) =
                (pivot_row..rows).find(|&row| matrix[(row, col)].abs() >= self.tolerance)
            else {
                continue;
            };

            let pivot = matrix[(found, col)];
            self.scale_row(matrix, found, 1.0 / pivot);
            matrix[(found, col)] = 1.0;
            if found != pivot_row {
                matrix.swap_rows(found, pivot_row);
            }

            // Clear the pivot column both below and above the pivot.
            for row in 0..rows {
                if row == pivot_row {
                    continue;
                }
                let factor = matrix[(row, col)];
                if factor != 0.0 {
                    self.add_row_multiple(matrix, row, pivot_row, -factor);
                }
            }

            rank += 1;
            pivot_row += 1;
        }

        rank
    }

    /// Column of the single nonzero coefficient in `row`, if there is exactly one.
    ///
    /// Only coefficient columns are inspected; the trailing right-hand-side
    /// column is ignored. A row with no nonzero coefficient, or with more than
    /// one, is still entangled (or inconsistent) and yields `None`.
    #[must_use]
    pub fn leading_one_position(&self, matrix: &DMatrix<f64>, row: usize) -> Option<usize> {
        let coefficients = matrix.ncols().checked_sub(1)?;
        let mut nonzero = (0..coefficients).filter(|&col| matrix[(row, col)] != 0.0);
        let leading = nonzero.next()?;
        if nonzero.next().is_some() {
            None
        } else {
            Some(leading)
        }
    }

    /// Multiply a row by `factor`.
    fn scale_row(&self, matrix: &mut DMatrix<f64>, row: usize, factor: f64) {
        for col in 0..matrix.ncols() {
            let value = matrix[(row, col)] * factor;
            matrix[(row, col)] = self.canonicalize(value);
        }
    }

    /// Add `factor` times `source` onto `target`.
    fn add_row_multiple(
        &self,
        matrix: &mut DMatrix<f64>,
        target: usize,
        source: usize,
        factor: f64,
    ) {
        for col in 0..matrix.ncols() {
            let value = matrix[(target, col)] + factor * matrix[(source, col)];
            matrix[(target, col)] = self.canonicalize(value);
        }
    }

    /// Snap values below the tolerance to zero.
    fn canonicalize(&self, value: f64) -> f64 {
        if value.abs() < self.tolerance {
            0.0
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn solver() -> LinearSystemSolver {
        LinearSystemSolver::default()
    }

    #[test]
    fn solves_determined_system() {
        // x + 2y = 5, 3x - y = 1  =>  x = 1, y = 2
        let mut system = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 5.0, 3.0, -1.0, 1.0]);
        let rank = solver().rref(&mut system);
        assert_eq!(rank, 2);
        assert_eq!(solver().leading_one_position(&system, 0), Some(0));
        assert_eq!(solver().leading_one_position(&system, 1), Some(1));
        assert_relative_eq!(system[(0, 2)], 1.0, epsilon = 1.0e-12);
        assert_relative_eq!(system[(1, 2)], 2.0, epsilon = 1.0e-12);
    }

    #[test]
    fn rref_is_idempotent() {
        let mut system = DMatrix::from_row_slice(
            2,
            4,
            &[0.6, -0.8, 0.3, 1.5, 0.8, 0.6, -0.2, -4.0],
        );
        let rank = solver().rref(&mut system);
        let reduced = system.clone();
        let again = solver().rref(&mut system);
        assert_eq!(rank, again);
        assert_eq!(system, reduced);
    }

    #[test]
    fn rank_is_invariant_under_row_permutation() {
        let rows = [
            [0.0, 2.0, 4.0, 1.0],
            [1.0, 1.0, 0.0, 2.0],
            [2.0, 4.0, 4.0, 5.0],
        ];
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut ranks = Vec::new();
        for order in orders {
            let data: Vec<f64> = order.iter().flat_map(|&row| rows[row]).collect();
            let mut system = DMatrix::from_row_slice(3, 4, &data);
            ranks.push(solver().rref(&mut system));
        }
        assert!(ranks.iter().all(|&rank| rank == ranks[0]));
        assert_eq!(ranks[0], 2);
    }

    #[test]
    fn entangled_rows_have_no_leading_position() {
        // Three unknowns, two equations: nothing is pinned down.
        let mut system = DMatrix::from_row_slice(2, 4, &[1.0, 0.8, 0.0, 1.0, 0.0, 0.6, 1.0, 2.0]);
        let rank = solver().rref(&mut system);
        assert_eq!(rank, 2);
        assert_eq!(solver().leading_one_position(&system, 0), None);
        assert_eq!(solver().leading_one_position(&system, 1), None);
    }

    #[test]
    fn inconsistent_system_pivots_in_augmented_column() {
        // One unknown over-constrained by two equations.
        let mut system = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 0.0, 2.0]);
        let rank = solver().rref(&mut system);
        assert_eq!(rank, 2);
        assert_eq!(solver().leading_one_position(&system, 0), Some(0));
        assert_eq!(solver().leading_one_position(&system, 1), None);
    }

    #[test]
    fn columns_without_pivot_are_skipped() {
        let mut system = DMatrix::from_row_slice(2, 3, &[0.0, 2.0, 4.0, 0.0, 1.0, 2.0]);
        let rank = solver().rref(&mut system);
        assert_eq!(rank, 1);
        assert_eq!(solver().leading_one_position(&system, 0), Some(1));
        assert_eq!(system[(0, 2)], 2.0);
        assert_eq!(system[(1, 2)], 0.0);
    }

    #[test]
    fn tiny_entries_do_not_become_pivots() {
        let mut system = DMatrix::from_row_slice(2, 3, &[1.0e-13, 1.0, 2.0, 0.0, 0.0, 0.0]);
        let rank = solver().rref(&mut system);
        assert_eq!(rank, 1);
        assert_eq!(system[(0, 0)], 0.0);
        assert_eq!(solver().leading_one_position(&system, 0), Some(1));
    }

    #[test]
    fn coarser_tolerance_drops_small_coefficients() {
        let data = [1.0e-6, 1.0, 2.0, 0.0, 0.0, 0.0];
        let coarse = LinearSystemSolver::new(1.0e-3);
        assert_eq!(coarse.tolerance(), 1.0e-3);
        assert_eq!(solver().tolerance(), TOLERANCE);

        let mut system = DMatrix::from_row_slice(2, 3, &data);
        assert_eq!(coarse.rref(&mut system), 1);
        assert_eq!(coarse.leading_one_position(&system, 0), Some(1));

        let mut system = DMatrix::from_row_slice(2, 3, &data);
        assert_eq!(solver().rref(&mut system), 1);
        assert_eq!(solver().leading_one_position(&system, 0), None);
    }

    #[test]
    fn rhs_only_matrix_has_no_coefficients() {
        let system = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        assert_eq!(solver().leading_one_position(&system, 0), None);
    }
}
