//! Outer loop that repeats optimization rounds until the cost settles.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::ConvergenceError;
use crate::geometry::Point;
use crate::optimizer::{RoundStats, UNSOLVED_COST};
use crate::truss::Truss;

/// Knobs for [`optimize_until_converged`].
///
/// Missing fields fall back to their defaults when deserializing, so a JSON
/// file only needs to name the values it changes.
///
/// # Examples
/// ```
/// use trussopt::Settings;
///
/// let settings = Settings::from_json(r#"{ "radius": 0.25 }"#)?;
/// assert_eq!(settings.radius, 0.25);
/// assert_eq!(settings.directions, 4);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of points on the displacement circle.
    pub directions: usize,
    /// Radius of the displacement circle.
    pub radius: f64,
    /// A round must lower the best cost by more than this to continue.
    pub tolerance: f64,
    /// Hard cap on the number of rounds.
    pub max_rounds: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            directions: 4,
            radius: 0.5,
            tolerance: 5.0e-7,
            max_rounds: 1_000,
        }
    }
}

impl Settings {
    /// Read settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] raised for malformed documents.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// State of the truss after one round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundOutcome {
    /// One-based round number.
    pub round: usize,
    /// Best cost after the round.
    pub best_cost: f64,
    /// Committed joint positions after the round.
    pub coordinates: Vec<Point>,
    /// Search counters for the round.
    pub stats: RoundStats,
}

/// Summary of a complete run of [`optimize_until_converged`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvergenceReport {
    /// Every round that was run, in order.
    pub rounds: Vec<RoundOutcome>,
    /// False when the round cap stopped the loop first.
    pub converged: bool,
}

impl ConvergenceReport {
    /// Best cost reached, if any geometry was ever solved.
    #[must_use]
    pub fn final_cost(&self) -> Option<f64> {
        self.rounds
            .last()
            .map(|outcome| outcome.best_cost)
            .filter(|&cost| cost < UNSOLVED_COST)
    }
}

/// Run optimization rounds until a round no longer improves the best cost by
/// more than `settings.tolerance`.
///
/// The displacement set is configured once from `settings` before the first
/// round. Each round commits its best geometry, so later rounds search around
/// an ever cheaper baseline.
///
/// # Errors
///
/// Returns [`ConvergenceError::Edit`] when the displacement settings are
/// invalid and [`ConvergenceError::Analysis`] when a round hits degenerate
/// geometry.
pub fn optimize_until_converged(
    truss: &mut Truss,
    settings: &Settings,
) -> Result<ConvergenceReport, ConvergenceError> {
    truss.set_displacements(settings.directions, settings.radius)?;

    let mut report = ConvergenceReport::default();
    while report.rounds.len() < settings.max_rounds {
        let previous = truss.best_cost();
        let stats = truss.run_optimization_round()?;
        let best_cost = truss.best_cost();
        report.rounds.push(RoundOutcome {
            round: report.rounds.len() + 1,
            best_cost,
            coordinates: truss.best().coordinates().to_vec(),
            stats,
        });
        debug!("round {} finished with cost {best_cost}", report.rounds.len());

        if best_cost + settings.tolerance >= previous {
            report.converged = true;
            break;
        }
    }

    info!(
        "optimization stopped after {} round(s), converged = {}",
        report.rounds.len(),
        report.converged
    );
    Ok(report)
}
